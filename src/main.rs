//! orthokit: comparative-genomics batch utilities
//!
//! Subcommands:
//! - `select-outgroups`: pick diverse outgroup hits per orthogroup from DIAMOND tables
//! - `length-filter`: filter FASTA files by sequence length
//! - `cat-filter`: concatenate FASTA files and subset by header keywords
//! - `extract`: extract sequences listed in hit files from a reference FASTA
//! - `hill-diversity`: Hill diversity of alignments and trees
//! - `standardize-headers`: rewrite NCBI protein headers into a fixed `|`-delimited layout

mod cat_filter;
mod diversity;
mod extract;
mod hits;
mod length_filter;
mod newick;
mod outgroups;
mod pattern;
mod seqio;
mod standardize;
mod taxon;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

/// orthokit CLI
#[derive(Parser, Debug)]
#[command(name = "orthokit")]
#[command(author, version, about = "Comparative-genomics batch utilities", long_about = None)]
struct Cli {
    /// Logging level (RUST_LOG overrides per module)
    #[arg(long = "log-level", value_enum, default_value_t = LogLevel::Info, global = true)]
    log_level: LogLevel,

    /// Subcommands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Top-level subcommands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Select outgroup sequences per orthogroup from DIAMOND results
    SelectOutgroups(outgroups::SelectOutgroupsArgs),
    /// Filter FASTA files by sequence length
    LengthFilter(length_filter::LengthFilterArgs),
    /// Concatenate FASTA files, then subset records by header keywords
    CatFilter(cat_filter::CatFilterArgs),
    /// Extract sequences listed in hit files from a reference FASTA
    Extract(extract::ExtractArgs),
    /// Hill diversity (q=1) of alignments and phylogenetic trees
    HillDiversity(diversity::HillDiversityArgs),
    /// Standardize protein FASTA headers of genome assemblies
    StandardizeHeaders(standardize::StandardizeArgs),
}

fn init_logging(level: LogLevel) {
    env_logger::Builder::new()
        .filter_level(level.into())
        .parse_default_env()
        .format_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);
    match cli.command {
        Commands::SelectOutgroups(args) => outgroups::run(args)?,
        Commands::LengthFilter(args) => length_filter::run(args)?,
        Commands::CatFilter(args) => cat_filter::run(args)?,
        Commands::Extract(args) => extract::run(args)?,
        Commands::HillDiversity(args) => diversity::run(args)?,
        Commands::StandardizeHeaders(args) => standardize::run(args)?,
    }
    Ok(())
}
