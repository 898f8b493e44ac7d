//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use openaire_core::{AccessRight, EntityType, ResearchProductType};

/// Query, page through, and harvest records from the OpenAIRE Graph API.
#[derive(Parser, Debug)]
#[command(name = "openaire")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// OpenAIRE API key (sent as a bearer token)
    #[arg(short = 'k', long, env = "OPENAIRE_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Custom base URL for the OpenAIRE Graph API
    #[arg(short = 'u', long, env = "OPENAIRE_BASE_URL", global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search one collection and print matching records to stdout
    Search(SearchArgs),
    /// Harvest open research products for a query into a JSON file
    Harvest(HarvestArgs),
    /// Fetch BibTeX entries for the records of a harvest file
    Bibtex(BibtexArgs),
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Entity type to search (researchProducts, organizations, dataSources, projects)
    #[arg(short = 'e', long, default_value = "researchProducts")]
    pub entity: EntityType,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Json)]
    pub output_format: OutputFormat,

    /// General search query string
    #[arg(short = 's', long)]
    pub search: Option<String>,

    /// Filter by title (mainTitle, legalName, officialName or title)
    #[arg(long)]
    pub title: Option<String>,

    /// Filter research products by author full name
    #[arg(long)]
    pub author: Option<String>,

    /// Filter by persistent identifier (DOI, ROR, grant code for projects)
    #[arg(long)]
    pub pid: Option<String>,

    /// Filter projects by funder short name
    #[arg(long)]
    pub funder: Option<String>,

    /// Filter research products or organizations by country code
    #[arg(long)]
    pub country: Option<String>,

    /// Sort criterion, e.g. "popularity DESC" (repeatable)
    #[arg(long)]
    pub sort: Vec<String>,

    /// Number of results per page (1-100; other values fall back to 10)
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Maximum total results to print
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_results: u64,
}

#[derive(Args, Debug, Clone)]
pub struct HarvestArgs {
    /// Full-text search query
    pub query: String,

    /// Research product type to keep
    #[arg(long = "type", value_enum, default_value_t = ProductTypeArg::Publication)]
    pub product_type: ProductTypeArg,

    /// Best open access right to require
    #[arg(long, value_enum, default_value_t = AccessRightArg::Open)]
    pub access_right: AccessRightArg,

    /// Keep only records whose title or description contains a keyword
    #[arg(long = "match", value_delimiter = ',')]
    pub keywords: Vec<String>,

    /// Directory for the harvest file
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Number of results per page (1-100; other values fall back to 10)
    #[arg(long)]
    pub page_size: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct BibtexArgs {
    /// Harvest file (JSON array of records)
    pub input: PathBuf,

    /// BibTeX output file
    #[arg(short = 'o', long, default_value = "doi_library.bib")]
    pub output: PathBuf,

    /// Pause between resolver requests in milliseconds (max 60000)
    #[arg(long, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub delay_ms: Option<u64>,

    /// DOI resolver that bare DOIs are joined onto
    #[arg(long, default_value = openaire_core::harvest::doi::DOI_RESOLVER)]
    pub doi_resolver: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One pretty-printed JSON array
    Json,
    /// One compact JSON record per line
    Jsonl,
    /// Comma-separated values with a header row
    Csv,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductTypeArg {
    Publication,
    Dataset,
    Software,
    Other,
}

impl From<ProductTypeArg> for ResearchProductType {
    fn from(value: ProductTypeArg) -> Self {
        match value {
            ProductTypeArg::Publication => Self::Publication,
            ProductTypeArg::Dataset => Self::Dataset,
            ProductTypeArg::Software => Self::Software,
            ProductTypeArg::Other => Self::Other,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRightArg {
    OpenSource,
    Open,
    Embargo,
    Restricted,
    Closed,
    Unknown,
}

impl From<AccessRightArg> for AccessRight {
    fn from(value: AccessRightArg) -> Self {
        match value {
            AccessRightArg::OpenSource => Self::OpenSource,
            AccessRightArg::Open => Self::Open,
            AccessRightArg::Embargo => Self::Embargo,
            AccessRightArg::Restricted => Self::Restricted,
            AccessRightArg::Closed => Self::Closed,
            AccessRightArg::Unknown => Self::Unknown,
        }
    }
}
