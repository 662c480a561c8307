use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, Method};
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use agentrt_gateway::bootstrap::build_app_state;
use agentrt_gateway::cli::{Cli, Command, ConfigCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => {
            init_tracing();
            let (config, _config_path) = agentrt_gateway::cli::load_config()?;
            run_server(Arc::new(config)).await
        }
        Some(Command::Doctor) => {
            let (config, config_path) = agentrt_gateway::cli::load_config()?;
            let passed = agentrt_gateway::cli::doctor::run(&config, &config_path).await?;
            if !passed {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let (config, config_path) = agentrt_gateway::cli::load_config()?;
            if !agentrt_gateway::cli::config::validate(&config, &config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let (config, _config_path) = agentrt_gateway::cli::load_config()?;
            agentrt_gateway::cli::config::show(&config);
            Ok(())
        }
        Some(Command::Version) => {
            println!("agentrt-gateway {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,agentrt_gateway=debug")))
        .json()
        .init();
}

async fn run_server(config: Arc<agentrt_domain::config::Config>) -> anyhow::Result<()> {
    tracing::info!("agent orchestration service starting");

    let state = build_app_state(config.clone())?;

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let app = agentrt_gateway::api::router(state).layer(cors).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("binding to {}", config.server.bind_addr))?;

    tracing::info!(addr = %config.server.bind_addr, "agent orchestration service listening");

    axum::serve(listener, app).await.context("axum server error")?;

    Ok(())
}
