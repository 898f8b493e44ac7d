//! DOI candidate extraction and normalization for harvested records.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::trace;

/// Default DOI resolver used for content negotiation.
pub const DOI_RESOLVER: &str = "https://doi.org/";

/// Matches a DOI anywhere in a string: `10.XXXX/suffix`.
#[allow(clippy::expect_used)]
static DOI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"10\.\d{4,9}(?:\.\d+)*/[^\s<>"'\]]+"#).expect("DOI regex is valid") // Static pattern, safe to panic
});

/// Record fields probed for a DOI or URL, in order.
const LINK_FIELDS: [&str; 5] = ["id", "url", "doi", "source", "link"];

/// Picks the value of `record` most likely to resolve to a BibTeX entry.
///
/// Probes `id`, `url`, `doi`, `source`, `link`, then `pids` (an object with
/// `value` or a list of such objects). The first DOI-looking string wins;
/// failing that, the first `http(s)` URL.
#[must_use]
pub fn record_link_candidate(record: &Value) -> Option<String> {
    let mut candidates: Vec<&str> = LINK_FIELDS
        .iter()
        .filter_map(|field| record.get(*field).and_then(Value::as_str))
        .collect();

    match record.get("pids") {
        Some(Value::Object(pid)) => candidates.extend(pid.get("value").and_then(Value::as_str)),
        Some(Value::Array(pids)) => candidates.extend(
            pids.iter()
                .filter_map(|pid| pid.get("value").and_then(Value::as_str)),
        ),
        _ => {}
    }

    let candidates: Vec<&str> = candidates
        .into_iter()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .collect();

    let chosen = candidates
        .iter()
        .find(|value| looks_like_doi(value))
        .or_else(|| {
            candidates
                .iter()
                .find(|value| value.starts_with("http://") || value.starts_with("https://"))
        })
        .map(|value| (*value).to_string());
    trace!(candidate = ?chosen, "selected record link");
    chosen
}

/// Resolver links and `doi:` values count only when they carry a valid DOI.
fn looks_like_doi(value: &str) -> bool {
    is_valid_doi(&normalize_doi(value)) || DOI_PATTERN.is_match(value)
}

/// Strips resolver and `doi:` prefixes, URL-decodes, and trims.
#[must_use]
pub fn normalize_doi(input: &str) -> String {
    let mut doi = input.trim();

    for prefix in [
        "https://doi.org/",
        "http://doi.org/",
        "https://dx.doi.org/",
        "http://dx.doi.org/",
    ] {
        if let Some(stripped) = doi.strip_prefix(prefix) {
            doi = stripped;
            break;
        }
    }

    if doi.len() >= 4 && doi.is_char_boundary(4) && doi[..4].eq_ignore_ascii_case("doi:") {
        doi = doi[4..].trim_start();
    }

    match urlencoding::decode(doi) {
        Ok(decoded) => decoded.trim().to_string(),
        Err(_) => doi.trim().to_string(),
    }
}

/// Returns true when `doi` has a `10.` prefix, a registrant of 4+ digits,
/// and a non-empty suffix.
#[must_use]
pub fn is_valid_doi(doi: &str) -> bool {
    let Some(rest) = doi.strip_prefix("10.") else {
        return false;
    };
    let Some((registrant, suffix)) = rest.split_once('/') else {
        return false;
    };
    let first_segment = registrant.split('.').next().unwrap_or("");
    first_segment.len() >= 4
        && first_segment.chars().all(|c| c.is_ascii_digit())
        && !suffix.is_empty()
}

/// Builds the URL to request for `candidate`.
///
/// Values already pointing at a DOI resolver or any other `http(s)` URL are
/// used as-is; bare or `doi:`-prefixed DOIs are joined onto `resolver`.
#[must_use]
pub fn doi_url(candidate: &str, resolver: &str) -> String {
    let candidate = candidate.trim();
    if candidate.contains("doi.org")
        || candidate.starts_with("http://")
        || candidate.starts_with("https://")
    {
        return candidate.to_string();
    }
    format!(
        "{}/{}",
        resolver.trim_end_matches('/'),
        normalize_doi(candidate)
    )
}
