use clap::Parser;
use sitescan::{cli, config, errors};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(!cli.no_color)
            .with_writer(std::io::stderr)
            .init();
    }
    if cli.no_color {
        console::set_colors_enabled(false);
    }

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        cli::Commands::Scan(args) => cli::scan::handle_scan(args, config_path).await,
        cli::Commands::Probe(args) => cli::probe::handle_probe(args, config_path).await,
        cli::Commands::History(args) => cli::history::handle_history(args, config_path).await,
        cli::Commands::Serve(args) => cli::serve::handle_serve(args, config_path).await,
        cli::Commands::Validate(args) => handle_validate(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e.user_message());
        std::process::exit(cli::exit_code(&e));
    }
}

async fn handle_validate(args: cli::commands::ValidateArgs) -> Result<(), errors::ScanError> {
    let path = std::path::PathBuf::from(&args.config);
    let _config = config::parse_config(&path).await?;
    println!("Configuration is valid: {}", args.config);
    Ok(())
}
