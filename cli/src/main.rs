use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use wpt_store::SqliteStore;
use wpt_sync::ScheduleSynchronizer;

fn init_tracing(default_level: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = wpt_cli::command().get_matches();
    let config = wpt_cli::load_config(&matches)?;
    init_tracing(&config.log_level, matches.get_flag("log-json"));

    let path = config.database_path.clone();
    let store = SqliteStore::open(&path)
        .with_context(|| format!("failed to open database {}", path.display()))?;
    tracing::debug!("Opened {}", path.display());

    let sync = ScheduleSynchronizer::from_config(Arc::new(store), config);
    let outcome = wpt_cli::execute(&matches, &sync).await?;

    println!("{}", outcome.json);
    std::process::exit(outcome.exit_code());
}
