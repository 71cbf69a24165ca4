//! `oscopilot serve`: start the HTTP gateway.

use anyhow::Context;
use oscopilot_agent::Orchestrator;
use oscopilot_config::AppConfig;
use oscopilot_tools::DataSources;
use std::sync::Arc;

pub async fn run(mut config: AppConfig, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.gateway.host = host;
    }
    if let Some(port) = port {
        config.gateway.port = port;
    }
    config.validate()?;

    let sources = DataSources::from_config(&config.data_sources);
    let orchestrator = Orchestrator::from_config_with_sources(&config, sources.clone())
        .context("failed to build orchestrator")?;

    println!("🧭 OpenSource Copilot");
    println!("   Listening: http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {} ({})", orchestrator.model(), config.default_provider);
    println!("   Tools:     {}", orchestrator.tools().len());

    oscopilot_gateway::start(&config, Arc::new(orchestrator), sources).await?;
    Ok(())
}
