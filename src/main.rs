use shams_academy::{
    AppState,
    AuthState, SessionContext, SupabaseAuthClient,
    config::{AppConfig, Env},
    create_router,
    repository::{PostgresRepository, RepositoryState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Startup sequence: configuration, logging, the Postgres pool, the Session Store
/// client, the session context and finally the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration (Fail-Fast)
    // A .env file, when present, is read before any variable lookup happens.
    dotenv::dotenv().ok();
    // In Production every store credential must be set or load() panics here.
    let config = AppConfig::load();

    // 2. Log Filtering
    // RUST_LOG wins when set; otherwise a chatty local default applies.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shams_academy=debug,tower_http=info,axum=trace".into());

    // 3. Log Output Format
    // Local runs print for humans; Production emits JSON lines for the aggregator.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Database Pool (the Supabase-hosted Postgres)
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    // Behind Arc so the one repository is shared by every request task.
    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 5. Session Store Client (Supabase auth facet)
    let auth_client = SupabaseAuthClient::new(&config.supabase_url, &config.supabase_anon_key);
    let auth = Arc::new(auth_client) as AuthState;

    // 6. Session Context Assembly
    // Constructed once; every guard and handler consults this same context. The
    // startup health ping is advisory, and the event logger subscribes for the
    // remaining process lifetime.
    let sessions = SessionContext::new(auth, repo.clone(), config.clone());
    sessions.initialize().await;
    sessions.spawn_event_logger();

    // 7. Unified State
    let app_state = AppState {
        repo,
        sessions,
        config,
    };

    // 8. Router & Server
    let app = create_router(app_state);

    let listener = TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("FATAL: Failed to bind 0.0.0.0:3000");

    tracing::info!("Listening on 0.0.0.0:3000");
    tracing::info!("Swagger UI available at http://localhost:3000/swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server crashed");
}
