//! Shared User-Agent string for all outgoing HTTP traffic.

/// Default User-Agent (identifies the tool and its version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("openaire-harvester/{version} (research-tool)")
}
