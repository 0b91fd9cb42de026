use anyhow::Context;
use clap::Parser;
use jsonconf::config::cli;
use jsonconf::utils::logger;
use jsonconf::utils::validation::Validate;
use jsonconf::{CliConfig, TypeRegistry};

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose, config.log_file.as_deref())
        .context("failed to initialise logging")?;

    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let registry = TypeRegistry::with_builtins();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if let Err(e) = cli::run(&config, &registry, &mut out) {
        tracing::error!("Command failed: {}", e);
        eprintln!("❌ {}", e);
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    Ok(())
}
