#![cfg(not(tarpaulin_include))]

use tulong_admin::app;
use tulong_admin::config::AdminConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AdminConfig::load();
    log::info!(
        "Starting admin server for {} on port {}",
        config.data_file.display(),
        config.port
    );
    app::run(config).await
}
