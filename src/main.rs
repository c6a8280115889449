use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use walkthrough_sync::{
    create_router, identity, AgentRole, AppState, Config, HttpBackend, NatsRoomTransport,
    SessionParams, SessionSettings, WalkthroughSession,
};

#[derive(Parser, Debug)]
#[command(name = "walkthrough-sync", about = "Presentation walkthrough session service")]
struct Args {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/walkthrough-sync")]
    config: String,

    #[arg(long)]
    brdge_id: String,

    #[arg(long)]
    num_slides: u32,

    /// Base URL slide images are served from
    #[arg(long)]
    api_base_url: String,

    /// edit or view
    #[arg(long, default_value = "edit")]
    agent_type: AgentRole,

    /// Auth token; editing requires one
    #[arg(long, env = "WALKTHROUGH_TOKEN")]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Walkthrough Sync v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Backend: {}", cfg.backend.base_url);
    info!("Realtime: {} (prefix {})", cfg.realtime.nats_url, cfg.realtime.room_prefix);

    let transport = Arc::new(NatsRoomTransport::new(
        cfg.realtime.nats_url.clone(),
        cfg.realtime.room_prefix.clone(),
    ));
    let backend = Arc::new(HttpBackend::new(
        cfg.backend.base_url.clone(),
        cfg.backend.entity_path.clone(),
        cfg.backend.request_timeout(),
    )?);

    let user_id = identity::resolve_user_id(args.token.as_deref());
    let params = SessionParams::new(args.brdge_id, args.num_slides, args.api_base_url, user_id);

    let session = Arc::new(WalkthroughSession::new(
        params,
        args.agent_type,
        transport,
        backend,
        SessionSettings::from(&cfg),
    )?);
    if args.token.is_some() {
        session.set_auth_token(args.token).await;
    }
    session.start().await?;

    let app = create_router(AppState::new(Arc::clone(&session)));
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    session.teardown().await;
    Ok(())
}
