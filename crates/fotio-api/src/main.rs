use fotio_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (telemetry, storage registry, routes)
    let (_state, router) = fotio_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    fotio_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
