//! CLI command handlers.

mod bibtex;
mod config;
mod harvest;
mod search;

pub use bibtex::run_bibtex_command;
pub use config::run_config_show_command;
pub use harvest::run_harvest_command;
pub use search::run_search_command;
