use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sangeet_api::app::build_app;
use sangeet_api::config::ServerConfig;
use sangeet_api::state::AppState;
use sangeet_db::{GenerationStore, MemoryGenerationStore, PgGenerationStore};
use sangeet_orchestrator::{Orchestrator, OrchestratorConfig};
use sangeet_provider::{ProviderApi, ProviderConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    init_tracing();

    // --- Configuration ---
    let provider_config = ProviderConfig::from_env();
    if provider_config.api_key.is_empty() {
        tracing::warn!("PROVIDER_API_KEY is not set, submissions will be rejected");
    }
    let orchestrator_config = OrchestratorConfig::from_env(&provider_config);
    tracing::info!(
        base_url = %provider_config.base_url,
        status_paths = orchestrator_config.status_paths.len(),
        poll_max_attempts = orchestrator_config.poll_max_attempts,
        poll_interval_secs = orchestrator_config.poll_interval.as_secs(),
        "Loaded provider configuration",
    );

    let max_wait =
        orchestrator_config.max_wait(Duration::from_secs(provider_config.timeout_secs));
    let config = ServerConfig::from_env(max_wait);
    tracing::info!(
        host = %config.host,
        port = %config.port,
        request_timeout_secs = config.request_timeout_secs,
        "Loaded server configuration",
    );

    // --- Store ---
    let store = connect_store().await;

    // --- Provider ---
    let provider = ProviderApi::new(provider_config).expect("Failed to build provider client");

    // --- Orchestrator ---
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&store),
        Arc::new(provider),
        orchestrator_config,
    ));
    orchestrator
        .rebuild_registry()
        .await
        .expect("Failed to rebuild task registry");

    // --- App state ---
    let state = AppState {
        orchestrator: Arc::clone(&orchestrator),
        store,
        config: Arc::new(config.clone()),
    };
    let app = build_app(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    // Poll loops hold requests open; end them as soon as the signal arrives
    // so graceful shutdown does not wait out their budget.
    let on_signal = Arc::clone(&orchestrator);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            on_signal.shutdown();
        })
        .await
        .expect("Server error");

    tracing::info!(
        open_tasks = orchestrator.registry().len().await,
        "Graceful shutdown complete",
    );
}

/// Install the global subscriber. `LOG_FORMAT=json` selects JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "sangeet_api=debug,sangeet_orchestrator=debug,sangeet_provider=debug,tower_http=debug"
            .into()
    });
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

/// Postgres when `DATABASE_URL` is set, the in-memory store otherwise.
async fn connect_store() -> Arc<dyn GenerationStore> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        tracing::warn!("DATABASE_URL is not set, using the in-memory store (state is lost on restart)");
        return Arc::new(MemoryGenerationStore::new());
    };

    let pool = sangeet_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    sangeet_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    sangeet_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    Arc::new(PgGenerationStore::new(pool))
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
