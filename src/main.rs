use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docvec::Result;
use docvec::commands::{init_schema, load_files, show_status};
use docvec::config::{Config, run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "docvec")]
#[command(about = "Loads JSONL embedding dumps into a pgvector-backed module catalog")]
#[command(version)]
struct Cli {
    /// Path to an alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure PostgreSQL connection and ingestion settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Create the catalog schema and vector indexes
    Init,
    /// Load JSONL embedding files into the catalog
    Load {
        /// JSONL file to load (requires --module)
        #[arg(long)]
        file: Option<PathBuf>,
        /// Module the chunks belong to
        #[arg(long)]
        module: Option<String>,
        /// Human-readable label for a newly created module
        #[arg(long)]
        label: Option<String>,
    },
    /// Show catalog contents and row counts
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    docvec::logging::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                let (config, config_path) = effective_config(cli.config)?;
                show_config(&config, &config_path)?;
            } else {
                run_interactive_config().await?;
            }
        }
        Commands::Init => {
            let (config, _) = effective_config(cli.config)?;
            init_schema(&config).await?;
        }
        Commands::Load {
            file,
            module,
            label,
        } => {
            let (config, _) = effective_config(cli.config)?;
            load_files(&config, file, module, label).await?;
        }
        Commands::Status => {
            let (config, _) = effective_config(cli.config)?;
            show_status(&config).await?;
        }
    }

    Ok(())
}

fn effective_config(flag: Option<PathBuf>) -> anyhow::Result<(Config, PathBuf)> {
    match flag {
        Some(path) => {
            let config = Config::load_from(&path)?;
            Ok((config, path))
        }
        None => {
            let config = Config::load()?;
            let path = Config::config_file_path().context("Failed to resolve config directory")?;
            Ok((config, path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["docvec", "status"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert!(matches!(parsed.command, Commands::Status));
        }
    }

    #[test]
    fn load_command_with_flags() {
        let cli = Cli::try_parse_from([
            "docvec",
            "load",
            "--file",
            "tracker.jsonl",
            "--module",
            "yandex_tracker",
        ]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Load { file, module, label } = parsed.command {
                assert_eq!(file, Some(PathBuf::from("tracker.jsonl")));
                assert_eq!(module, Some("yandex_tracker".to_string()));
                assert_eq!(label, None);
            }
        }
    }

    #[test]
    fn load_command_without_flags() {
        let cli = Cli::try_parse_from(["docvec", "load"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Load { file, module, label } = parsed.command {
                assert_eq!(file, None);
                assert_eq!(module, None);
                assert_eq!(label, None);
            }
        }
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["docvec", "init", "--config", "/tmp/alt.toml"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert_eq!(parsed.config, Some(PathBuf::from("/tmp/alt.toml")));
            assert!(matches!(parsed.command, Commands::Init));
        }
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["docvec", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["docvec", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["docvec", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
