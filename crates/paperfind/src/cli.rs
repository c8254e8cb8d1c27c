use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "paperfind", about = "research paper search agent")]
pub struct Cli {
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive agent loop (type 'exit' to quit, 'evaluate' to review the
    /// last turn)
    Chat,
    /// One question, one answer
    Ask { query: String },
    /// Query the dataset directly, bypassing the model
    Search {
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        comparator: String,
        #[arg(long)]
        year: i32,
        #[arg(long, default_value_t = 0)]
        min_citations: u32,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}
