mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "coderun-cli")]
#[command(about = "coderun CLI - Run code locally and inspect the language toolchains", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a source file through the execution engine
    Run {
        /// Language id (e.g., python, javascript, c, cpp, java)
        #[arg(short, long)]
        language: String,

        /// Source file to execute (use --code for inline source)
        #[arg(short, long, conflicts_with = "code")]
        file: Option<PathBuf>,

        /// Inline source code
        #[arg(short, long)]
        code: Option<String>,

        /// Print the full execution result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List all supported languages
    ListLangs,

    /// Check that every language toolchain is installed
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            language,
            file,
            code,
            json,
        } => {
            let code = commands::read_source(file.as_deref(), code)?;
            commands::run(&language, &code, json).await?;
        }
        Commands::ListLangs => {
            commands::list_languages();
        }
        Commands::Check => {
            let missing = commands::check_toolchains();
            if missing > 0 {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
