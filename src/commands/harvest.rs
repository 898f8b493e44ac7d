//! Harvest command handler: save a research-product query to a JSON file.

use anyhow::{Context, Result};
use openaire_core::{HarvestRequest, KeywordFilter, OpenAire, harvest_to_file};
use tracing::info;

use crate::app_config::EffectiveConfig;
use crate::cli::HarvestArgs;
use crate::exit_handler::ProcessExit;

pub async fn run_harvest_command(
    args: &HarvestArgs,
    config: &EffectiveConfig,
) -> Result<ProcessExit> {
    let openaire = OpenAire::with_config(config.client_config())?;
    let request = harvest_request(args, config);
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir.clone());
    let path = output_dir.join(request.file_name());
    let filter = KeywordFilter::new(&args.keywords);
    if !filter.is_empty() {
        info!(keywords = ?filter.keywords(), "Keeping records matching keywords");
    }

    let summary = harvest_to_file(request.to_query(&openaire), &filter, &path)
        .await
        .with_context(|| format!("Harvest of '{}' failed", request.query))?;

    println!("Total results fetched: {}", summary.fetched);
    if !filter.is_empty() {
        println!("Matching keywords: {}", summary.kept);
    }
    println!("Saved {} records to {}", summary.kept, summary.path.display());
    Ok(ProcessExit::Success)
}

fn harvest_request(args: &HarvestArgs, config: &EffectiveConfig) -> HarvestRequest {
    HarvestRequest {
        query: args.query.clone(),
        product_type: Some(args.product_type.into()),
        access_right: Some(args.access_right.into()),
        page_size: Some(args.page_size.unwrap_or(config.page_size)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;

    fn harvest_args(argv: &[&str]) -> HarvestArgs {
        let mut full = vec!["openaire", "harvest"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Command::Harvest(args) => args,
            other => panic!("expected harvest command, got {other:?}"),
        }
    }

    #[test]
    fn test_harvest_request_uses_flags_and_config_page_size() {
        let config = EffectiveConfig::resolve(None, None, None);
        let args = harvest_args(&["climate data", "--type", "dataset", "--access-right", "embargo"]);
        let request = harvest_request(&args, &config);
        let params = request
            .to_query(&OpenAire::new(None).unwrap())
            .build_params();
        assert_eq!(params["search"], "climate data");
        assert_eq!(params["type"], "dataset");
        assert_eq!(params["bestOpenAccessRightLabel"], "EMBARGO");
        assert_eq!(params["pageSize"], "10");
        assert_eq!(params["sortBy"], "publicationDate DESC");
        assert_eq!(request.file_name(), "climate_data.json");
    }
}
