use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Password, Select};
use sqlx::postgres::PgPoolOptions;
use std::path::Path;
use std::time::Duration;

use super::{Config, DatabaseConfig, IngestConfig};
use crate::database::Database;
use crate::ingest::DimensionPolicy;

#[inline]
pub async fn run_interactive_config() -> Result<()> {
    println!("{}", style("🔧 Docvec Configuration Setup").bold().cyan());
    println!();

    let mut config = load_existing_config()?;

    println!("{}", style("PostgreSQL Connection").bold().yellow());
    println!("Configure the pgvector-enabled database holding the module catalog.");
    println!();

    configure_database(&mut config.database)?;

    println!();
    println!("{}", style("Ingestion Settings").bold().yellow());
    println!();

    configure_ingest(&mut config.ingest)?;

    println!();
    println!("{}", style("Testing configuration...").yellow());

    if test_database_connection(&config.database).await {
        println!("{}", style("✓ Database connection successful!").green());
    } else {
        println!(
            "{}",
            style("⚠ Warning: Could not connect to PostgreSQL").yellow()
        );
        println!("You can continue, but make sure the database is reachable before loading.");
    }

    println!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        println!("{}", style("✓ Configuration saved successfully!").green());

        let config_path = Config::config_file_path().context("Failed to get config file path")?;
        println!(
            "Configuration saved to: {}",
            style(config_path.display()).cyan()
        );
    } else {
        println!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config(config: &Config, config_path: &Path) -> Result<()> {
    println!("{}", style("📋 Current Configuration").bold().cyan());
    println!();

    println!("{}", style("PostgreSQL Settings:").bold().yellow());
    println!("  Host: {}", style(&config.database.host).cyan());
    println!("  Port: {}", style(config.database.port).cyan());
    println!("  Database: {}", style(&config.database.dbname).cyan());
    println!("  User: {}", style(&config.database.user).cyan());
    let password_state = if config.database.password.is_empty() {
        "(not set)"
    } else {
        "(set)"
    };
    println!("  Password: {}", style(password_state).dim());
    println!(
        "  Max Connections: {}",
        style(config.database.max_connections).cyan()
    );

    println!();
    println!("{}", style("Ingestion Settings:").bold().yellow());
    println!("  Dimension: {}", style(config.ingest.dimension).cyan());
    println!("  Batch Size: {}", style(config.ingest.batch_size).cyan());
    println!(
        "  Dimension Policy: {}",
        style(config.ingest.dimension_policy).cyan()
    );

    println!();
    if config.sources.is_empty() {
        println!("{}", style("Sources: none configured").yellow());
    } else {
        println!("{}", style("Sources:").bold().yellow());
        for source in &config.sources {
            let label = source.label.as_deref().unwrap_or(&source.module);
            println!(
                "  {} -> {} ({})",
                style(source.file.display()).cyan(),
                style(&source.module).cyan(),
                label
            );
        }
    }

    println!();
    println!("Config file: {}", style(config_path.display()).dim());

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    Config::load().map_or_else(
        |_| {
            println!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(Config::default())
        },
        |config| {
            println!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_database(database: &mut DatabaseConfig) -> Result<()> {
    let host: String = Input::new()
        .with_prompt("PostgreSQL host")
        .default(database.host.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Host cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("PostgreSQL port")
        .default(database.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let dbname: String = Input::new()
        .with_prompt("Database name")
        .default(database.dbname.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Database name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let user: String = Input::new()
        .with_prompt("Database user")
        .default(database.user.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("User cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let password = Password::new()
        .with_prompt("Database password (leave empty for none)")
        .allow_empty_password(true)
        .interact()?;

    database.set_host(host)?;
    database.set_port(port)?;
    database.set_dbname(dbname)?;
    database.set_user(user)?;
    database.password = password;

    Ok(())
}

fn configure_ingest(ingest: &mut IngestConfig) -> Result<()> {
    let dimension: usize = Input::new()
        .with_prompt("Embedding dimension")
        .default(ingest.dimension)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if *input == 0 || *input > 16_000 {
                Err("Dimension must be between 1 and 16000")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let batch_size: usize = Input::new()
        .with_prompt("Records per commit batch")
        .default(ingest.batch_size)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if *input == 0 || *input > 10_000 {
                Err("Batch size must be between 1 and 10000")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let selected = Select::new()
        .with_prompt("Wrong-length embeddings")
        .items(&[
            "strict (skip the record)",
            "lenient (pad or truncate to the dimension)",
        ])
        .default(usize::from(
            ingest.dimension_policy == DimensionPolicy::Lenient,
        ))
        .interact()?;

    ingest.set_dimension(dimension)?;
    ingest.set_batch_size(batch_size)?;
    ingest.dimension_policy = if selected == 1 {
        DimensionPolicy::Lenient
    } else {
        DimensionPolicy::Strict
    };

    Ok(())
}

async fn test_database_connection(database: &DatabaseConfig) -> bool {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(Database::connect_options(database))
        .await;

    match pool {
        Ok(pool) => {
            pool.close().await;
            true
        }
        Err(_) => false,
    }
}
