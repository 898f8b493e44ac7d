//! Config command handler: show effective configuration.

use anyhow::Result;

use crate::app_config::{EffectiveConfig, LoadedConfig};

pub fn run_config_show_command(loaded: &LoadedConfig, effective: &EffectiveConfig) -> Result<()> {
    let resolved_path = loaded.path.as_ref().map_or_else(
        || "<unresolved>".to_string(),
        |path| path.display().to_string(),
    );
    println!("config_path = {resolved_path}");
    println!(
        "config_file = {}",
        if loaded.loaded_from_file() {
            "loaded"
        } else {
            "not found (using defaults)"
        }
    );
    println!("base_url = {}", effective.base_url);
    println!("api_key = {}", effective.redacted_api_key());
    println!("page_size = {}", effective.page_size);
    println!("connect_timeout_secs = {}", effective.connect_timeout_secs);
    println!("request_timeout_secs = {}", effective.request_timeout_secs);
    println!("output_dir = {}", effective.output_dir.display());
    println!("request_delay_ms = {}", effective.request_delay_ms);

    Ok(())
}
