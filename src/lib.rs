pub mod adjust;
pub mod cli;
pub mod config;
pub mod configure;
pub mod data;
pub mod error;
pub mod fields;
pub mod ingest;
pub mod io_utils;
pub mod map_cmd;
pub mod matcher;
pub mod normalize;
pub mod query;
pub mod resolver;
pub mod status;
pub mod store;
pub mod table;
pub mod vocabulary;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("roster_map", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    debug!("Parsed command line: {:?}", cli.command);
    match cli.command {
        Commands::Fields(args) => fields::execute(&args),
        Commands::Map(args) => map_cmd::execute(&args),
        Commands::Ingest(args) => ingest::execute(&args),
        Commands::Configure(args) => configure::execute(&args),
        Commands::Status(args) => status::execute(&args),
        Commands::Query(args) => query::execute(&args),
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
