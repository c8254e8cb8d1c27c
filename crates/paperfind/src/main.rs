mod chat;
mod cli;
mod config;
mod logging;
mod prompt;
mod search;
mod turn;

use anyhow::Result;
use clap::Parser;

use crate::cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = if cli.verbose {
        true
    } else {
        logging::env_flag()
    };
    logging::init(verbose);
    match cli.command {
        Command::Chat => chat::run_chat(),
        Command::Ask { query } => chat::run_ask(&query),
        Command::Search {
            topic,
            comparator,
            year,
            min_citations,
            json,
        } => search::run(topic, comparator, year, min_citations, json),
    }
}
