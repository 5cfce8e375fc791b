use clap::Parser;
use payweb::cli::{self, Cli, Commands};
use payweb::config::{AppConfig, LoggingConfig};
use payweb::error::{PaywebError, Result};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config_dir)?;
    if let Err(errors) = config.validate() {
        return Err(PaywebError::Validation(errors.join("; ")));
    }

    match &cli.command {
        Commands::Checksum { fields } => {
            init_logging_simple();
            cli::compute_checksum(&config, fields)?;
        }
        Commands::Initiate {
            amount,
            currency,
            country,
            email,
        } => {
            init_logging(&config.logging);
            cli::run_initiate(&config, *amount, currency, country, email).await?;
        }
        Commands::Query {
            pay_request_id,
            reference,
        } => {
            init_logging(&config.logging);
            cli::run_query(&config, pay_request_id, reference).await?;
        }
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},payweb=debug", config.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if config.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn init_logging_simple() {
    // Minimal logging for plain CLI output
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .try_init();
}
