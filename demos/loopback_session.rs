// Drive a walkthrough session over the in-process loopback transport
//
// Joins as presenter, flips through a few slides quickly and prints the
// frames that actually went out: the debouncer collapses the burst into a
// single SLIDE_UPDATE.
//
// The backend URL defaults to http://localhost:5000/api; bootstrap errors are
// logged and do not stop the demo.

use anyhow::Result;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use walkthrough_sync::{
    AgentRole, Config, Envelope, HttpBackend, LoopbackTransport, SessionParams, SessionSettings,
    WalkthroughSession,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Loopback walkthrough session ===\n");

    let cfg = Config::load("config/walkthrough-sync")?;
    let transport = Arc::new(LoopbackTransport::new());
    let backend = Arc::new(HttpBackend::new(
        cfg.backend.base_url.clone(),
        cfg.backend.entity_path.clone(),
        cfg.backend.request_timeout(),
    )?);

    let params = SessionParams::new("demo", 8, "http://localhost:5000/api", "anon_demo");
    let session = Arc::new(WalkthroughSession::new(
        params,
        AgentRole::View,
        transport.clone(),
        backend,
        SessionSettings::from(&cfg),
    )?);
    session.start().await?;

    println!("▶️  Joining as viewer...");
    session.play().await?;
    sleep(Duration::from_millis(500)).await;
    transport.clear_sent().await;

    println!("⏩ Flipping through slides 2..5");
    for _ in 0..4 {
        session.next_slide().await;
        sleep(Duration::from_millis(50)).await;
    }
    sleep(cfg.sync.slide_debounce() + Duration::from_millis(100)).await;

    for envelope in transport.sent_envelopes().await {
        if let Envelope::SlideUpdate(update) = envelope {
            println!(
                "📤 SLIDE_UPDATE slide={} url={}",
                update.current_slide, update.slide_url
            );
        }
    }

    let status = session.status().await;
    println!("\n📊 Connection: {:?}", status.connection);
    println!("📊 Workflow: {:?}", status.workflow);
    println!("📊 Current slide: {}/{}", status.current_slide, status.num_slides);

    session.teardown().await;
    println!("\n✅ Done");
    Ok(())
}
