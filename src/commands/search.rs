//! Search command handler: query one collection and print records.

use std::io::{self, BufWriter};

use anyhow::{Context, Result, bail};
use openaire_core::{EntityType, OpenAire, QueryBuilder};
use tracing::{error, info, warn};

use crate::app_config::EffectiveConfig;
use crate::cli::SearchArgs;
use crate::exit_handler::ProcessExit;
use crate::output::RecordWriter;

pub async fn run_search_command(args: &SearchArgs, config: &EffectiveConfig) -> Result<ProcessExit> {
    let openaire = OpenAire::with_config(config.client_config())?;
    let query = build_search_query(&openaire, args, config.page_size)?;

    let mut pages = query.cursor_iterator();
    let mut writer = RecordWriter::new(BufWriter::new(io::stdout()), args.output_format);
    let mut failure = None;

    'pages: loop {
        let page = match pages.next_page().await {
            Ok(Some(page)) => page,
            Ok(None) => break,
            Err(err) => {
                failure = Some(err);
                break;
            }
        };
        for record in page.items() {
            writer.write_record(record)?;
            if writer.written() >= args.max_results {
                info!(max_results = args.max_results, "Reached max results limit");
                break 'pages;
            }
        }
    }

    let written = writer.written();
    writer.finish().context("Failed to write search results")?;
    info!(records = written, "Search complete");

    match failure {
        None => Ok(ProcessExit::Success),
        Some(err) if written > 0 => {
            error!(error = %err, "API error after partial output");
            Ok(ProcessExit::Partial)
        }
        Some(err) => Err(err).context("Search failed"),
    }
}

/// Maps the generic search flags onto the selected collection's vocabulary.
fn build_search_query(
    openaire: &OpenAire,
    args: &SearchArgs,
    default_page_size: u32,
) -> Result<QueryBuilder> {
    let title = args.title.as_deref();
    let pid = args.pid.as_deref();
    let country = args.country.as_deref();

    let mut ignored = Vec::new();
    let builder = match args.entity {
        EntityType::ResearchProducts => {
            let mut query = openaire.research_products();
            if let Some(title) = title {
                query = query.main_title(title);
            }
            if let Some(author) = args.author.as_deref() {
                query = query.author_full_name(author);
            }
            if let Some(pid) = pid {
                query = query.pid(pid);
            }
            if let Some(country) = country {
                query = query.country_code(country);
            }
            ignored.extend(args.funder.as_ref().map(|_| "--funder"));
            query.into_builder()
        }
        EntityType::Organizations => {
            let mut query = openaire.organizations();
            if let Some(title) = title {
                query = query.legal_name(title);
            }
            if let Some(pid) = pid {
                query = query.pid(pid);
            }
            if let Some(country) = country {
                query = query.country_code(country);
            }
            ignored.extend(args.author.as_ref().map(|_| "--author"));
            ignored.extend(args.funder.as_ref().map(|_| "--funder"));
            query.into_builder()
        }
        EntityType::DataSources => {
            let mut query = openaire.data_sources();
            if let Some(title) = title {
                query = query.official_name(title);
            }
            if let Some(pid) = pid {
                query = query.pid(pid);
            }
            ignored.extend(args.author.as_ref().map(|_| "--author"));
            ignored.extend(args.funder.as_ref().map(|_| "--funder"));
            ignored.extend(args.country.as_ref().map(|_| "--country"));
            query.into_builder()
        }
        EntityType::Projects => {
            let mut query = openaire.projects();
            if let Some(title) = title {
                query = query.title(title);
            }
            if let Some(code) = pid {
                query = query.code(code);
            }
            if let Some(funder) = args.funder.as_deref() {
                query = query.funding_short_name(funder);
            }
            ignored.extend(args.author.as_ref().map(|_| "--author"));
            ignored.extend(args.country.as_ref().map(|_| "--country"));
            query.into_builder()
        }
    };
    for flag in ignored {
        warn!(flag, entity = %args.entity, "Flag does not apply to this entity; ignored");
    }

    let mut builder = match args.search.as_deref() {
        Some(search) => builder.filter("search", search),
        None => builder,
    };
    for raw in &args.sort {
        let (field, ascending) = parse_sort(raw)?;
        builder = builder.sort(field, ascending);
    }
    Ok(builder.size(args.page_size.unwrap_or(default_page_size)))
}

/// Parses `"field"` or `"field ASC|DESC"`; a missing direction means descending.
fn parse_sort(raw: &str) -> Result<(&str, bool)> {
    let mut tokens = raw.split_whitespace();
    match (tokens.next(), tokens.next(), tokens.next()) {
        (Some(field), None, None) => {
            warn!(sort = raw, "Sort direction not specified, defaulting to DESC");
            Ok((field, false))
        }
        (Some(field), Some(direction), None) => {
            if direction.eq_ignore_ascii_case("ASC") {
                Ok((field, true))
            } else if direction.eq_ignore_ascii_case("DESC") {
                Ok((field, false))
            } else {
                bail!("Invalid sort direction '{direction}' in '{raw}': expected ASC or DESC")
            }
        }
        _ => bail!("Invalid --sort value '{raw}': expected \"field [ASC|DESC]\""),
    }
}
