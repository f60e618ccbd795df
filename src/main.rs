use anyhow::{Context, Result};
use clap::Parser;
use techdebt_report::{cli, config, models, pipeline, reporter};
use tracing::Level;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    match cli.command {
        cli::Commands::Generate(args) => generate_command(args)?,
        cli::Commands::Init(args) => init_command(args)?,
    }

    Ok(())
}

fn generate_command(args: cli::GenerateArgs) -> Result<()> {
    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut config =
        config::load_config(args.config.as_deref()).context("Failed to load configuration")?;
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    args.apply(&mut config, &cwd);

    tracing::debug!("Using configuration: {:?}", config);

    let outcome = pipeline::run(&config).context("Failed to generate tech debt report")?;

    if !outcome.diagnostics.is_empty() {
        tracing::warn!("{} inputs were skipped", outcome.diagnostics.len());
    }

    println!("Tech debt report generated: file://{}", outcome.output.display());

    if args.summary {
        print!("{}", reporter::format_terminal_summary(&outcome.items));
    }

    Ok(())
}

fn init_command(args: cli::InitArgs) -> Result<()> {
    config::save_config(&models::ReportConfig::default(), &args.path)
        .with_context(|| format!("Failed to write config to {}", args.path.display()))?;
    println!("Config written to {}", args.path.display());
    Ok(())
}
