mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{
    import::ImportArgs, register::RegisterDbcArgs, register::RegisterTypesArgs,
    schema::SchemaArgs, stats::StatsArgs,
};

#[derive(Parser)]
#[command(name = "segimport", about = "Import vehicle segments into a SQLite store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import one or more segments
    Import(ImportArgs),
    /// Register the signals of every topic in an event log's schemas
    RegisterTypes(RegisterTypesArgs),
    /// Register every signal of a DBC bus description
    RegisterDbc(RegisterDbcArgs),
    /// Print the decoded schema of an event-log topic
    Schema(SchemaArgs),
    /// Print row counts of a store
    Stats(StatsArgs),
}

fn main() -> Result<()> {
    let env = env_logger::Env::default().default_filter_or("warn");
    env_logger::init_from_env(env);
    let cli = Cli::parse();

    match cli.command {
        Commands::Import(args) => args.run(),
        Commands::RegisterTypes(args) => args.run(),
        Commands::RegisterDbc(args) => args.run(),
        Commands::Schema(args) => args.run(),
        Commands::Stats(args) => args.run(),
    }
}
