pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod io_utils;
pub mod join;
pub mod layout;
pub mod model;
pub mod object_store;
pub mod reader;
pub mod show;
pub mod store;
pub mod table;
pub mod upload;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug};

use crate::{
    cli::{Cli, Commands},
    config::LakeConfig,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("crm_lake", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = LakeConfig::resolve(cli.config.as_deref())?;
    debug!("Lake root: {:?}", config.store);
    match &cli.command {
        Commands::Import(args) => import::execute(args, config),
        Commands::Export(args) => export::execute(args, config),
        Commands::Upload(args) => upload::execute(args, config),
        Commands::Show(args) => show::execute(args, config),
        Commands::Users(args) => show::execute_users(args, config),
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
