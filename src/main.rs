use clap::Parser;
use log::{error, info};

use pieriandx_bridge::config::Config;
use pieriandx_bridge::handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    info!("pieriandx-bridge starting up");

    let config = Config::parse();
    let output = handler::run(&config).await.map_err(|err| {
        error!("{:?} failed: {err:#}", config.command);
        err
    })?;

    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}
