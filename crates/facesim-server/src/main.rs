use anyhow::{Context, Result};
use facesim_server::{logging::init_logging, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment variables
    let config = ServerConfig::load().context("Failed to load configuration")?;

    init_logging(&config).context("Failed to initialize logging")?;

    // Run the server using the library's run function
    facesim_server::run(config).await.context("Server error")?;

    Ok(())
}
