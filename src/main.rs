use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use xsec::config::Config;

mod cli_exec;

#[derive(Parser)]
#[command(name = "xsec")]
#[command(about = "Cross section database tools", long_about = None)]
struct Cli {
    /// Energy table to read and write, in TeV
    #[arg(long, env = "ENERGY", default_value_t = 13, global = true)]
    energy: u32,

    /// Configuration file (TOML); defaults to ~/.config/xsec/config.toml
    #[arg(long, env = "XSECCONF", value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the cross section tables for every supported energy
    Init,

    /// Print the cross sections of samples, one per line
    Get {
        #[arg(required = true, value_name = "SAMPLE")]
        samples: Vec<String>,
        /// Also print the absolute uncertainty
        #[arg(long)]
        uncertainty: bool,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },

    /// List samples matching SQL LIKE patterns, all samples by default
    List {
        /// Read the history table instead of the current values
        #[arg(long)]
        history: bool,
        #[arg(value_name = "PATTERN")]
        patterns: Vec<String>,
    },

    /// Store cross sections: SOURCE SAMPLE XSEC [SAMPLE XSEC ...]
    Put {
        /// Free-form comments stored with every value
        #[arg(long, default_value = "")]
        comments: String,
        /// Absolute uncertainty, once per sample in the same order
        #[arg(long = "uncertainty", value_name = "U")]
        uncertainties: Vec<f64>,
        /// Where the values come from
        source: String,
        #[arg(required = true, num_args = 2.., value_name = "SAMPLE XSEC")]
        pairs: Vec<String>,
    },

    /// Review sample history and revert or invalidate entries
    ///
    /// Exits with 1 when --like matches nothing, 4 when no sample has history and
    /// 3 when a write failed.
    Revert {
        /// Treat arguments as SQL LIKE patterns ('%' matches anything)
        #[arg(long)]
        like: bool,
        /// Answer prompts without a terminal, e.g. `--answers 1,,y`
        #[arg(long, value_delimiter = ',', value_name = "TOKENS")]
        answers: Option<Vec<String>>,
        #[arg(required = true, value_name = "SAMPLE")]
        samples: Vec<String>,
    },
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(xsec::error::exit_code_for(&err));
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("XSEC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load(cli.config.as_deref(), cli.energy)?;
    cli_exec::handle_command(&cfg, cli.command)
}
