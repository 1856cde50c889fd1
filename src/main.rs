use clubledger::jobs::{self, HoldCleanupJob, ReminderJob};
use clubledger::{api, config::Config, db::init_db, BroadcastChannel, Orchestrator, Repository};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;
    if config.payment_hash_secret.is_none() {
        tracing::warn!("PAYMENT_HASH_SECRET not set, gateway callbacks will be rejected");
    }

    // Initialize database and services
    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Repository::new(pool);
    let channel = Arc::new(BroadcastChannel::default());
    let orchestrator = Arc::new(Orchestrator::new(repo.clone(), &config, channel));

    // Background jobs
    jobs::spawn(
        HoldCleanupJob::new(orchestrator.bookings.clone()),
        config.cleanup_interval,
    );
    jobs::spawn(
        ReminderJob::new(repo.clone(), orchestrator.notifier.clone()),
        config.reminder_interval,
    );

    // Create router
    let app = api::create_router(api::AppState::new(repo, config, orchestrator));

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
