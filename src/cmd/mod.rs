mod generate;
mod order;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sql-synth")]
#[command(author = "Helge Sverre <helge.sverre@gmail.com>")]
#[command(version)]
#[command(about = "Generate reference-consistent dummy INSERT statements from a SQL schema", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate INSERT statements for every table in a schema file
    Generate {
        /// Input schema file (CREATE TABLE / ALTER TABLE statements)
        /// Supports .gz, .bz2, .xz, .zst compression
        file: PathBuf,

        /// Rows to generate per table (default: 10)
        #[arg(short = 'n', long)]
        rows: Option<usize>,

        /// Output SQL file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// SQL dialect of the output: mysql, postgres, or sqlite (default: mysql)
        #[arg(short, long)]
        dialect: Option<String>,

        /// Random seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// YAML config file with row count, seed and per-column strategies
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Tables to leave out of the output (comma-separated)
        #[arg(long)]
        skip: Option<String>,

        /// Show progress during generation
        #[arg(short, long)]
        progress: bool,

        /// Show statistics without writing statements
        #[arg(long)]
        dry_run: bool,

        /// Output statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the order in which columns are resolved
    Order {
        /// Input schema file
        /// Supports .gz, .bz2, .xz, .zst compression
        file: PathBuf,

        /// Only verify that the schema has no reference cycle
        #[arg(long)]
        check: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            file,
            rows,
            output,
            dialect,
            seed,
            config,
            skip,
            progress,
            dry_run,
            json,
        } => generate::run(
            file, rows, output, dialect, seed, config, skip, progress, dry_run, json,
        ),
        Commands::Order { file, check } => order::run(file, check),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "sql-synth", &mut io::stdout());
            Ok(())
        }
    }
}
