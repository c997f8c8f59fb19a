use clap::Parser;
use log::{error, info};

use quoteshot::{App, Cli, Config, QuoteStore};

pub fn initialize_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    info!("Logger initialized");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> quoteshot::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.gallery_dir {
        config.gallery_dir = dir;
    }

    info!("Application starting up");
    let store = QuoteStore::from_config(&config).await?;
    let mut app = App::new(store, config, cli.config, cli.verbose);

    let outcome = app.run(cli.command).await;
    let shutdown = app.shutdown().await;
    info!("Application shutting down");

    outcome.and(shutdown)
}
