use std::net::SocketAddr;
use std::sync::Arc;

use api_service::account::ports::AccountServicePort;
use api_service::account::service::AccountService;
use api_service::admission::RateLimitPolicy;
use api_service::config::Config;
use api_service::inbound::http::router::create_router;
use api_service::outbound::rate_limit::InMemoryRateLimiter;
use api_service::outbound::repositories::InMemoryCredentialStore;
use api_service::outbound::repositories::PostgresCredentialStore;
use auth::Authenticator;
use auth::PasswordHasher;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "api-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        database = config.database.is_some(),
        token_ttl_hours = config.jwt.expiration_hours,
        rate_limit_max_requests = config.rate_limit.max_requests,
        rate_limit_window_seconds = config.rate_limit.window_seconds,
        trust_forwarded_for = config.rate_limit.trust_forwarded_for,
        "Configuration loaded"
    );

    let password_hasher = PasswordHasher::with_cost(config.password.hash_cost())?;
    let authenticator = Arc::new(
        Authenticator::new(config.jwt.secret.as_bytes())?
            .with_password_hasher(password_hasher)
            .with_token_ttl(chrono::Duration::hours(config.jwt.expiration_hours)),
    );

    let account_service: Arc<dyn AccountServicePort> = match &config.database {
        Some(database) => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(database.max_connections)
                .connect(&database.url)
                .await?;
            tracing::info!(
                max_connections = database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            let store = Arc::new(PostgresCredentialStore::new(pg_pool));
            Arc::new(AccountService::new(store, Arc::clone(&authenticator)))
        }
        None => {
            tracing::warn!("No database configured, credentials are kept in memory");

            let store = Arc::new(InMemoryCredentialStore::new());
            Arc::new(AccountService::new(store, Arc::clone(&authenticator)))
        }
    };

    let admission = Arc::new(InMemoryRateLimiter::new(RateLimitPolicy::new(
        config.rate_limit.max_requests,
        config.rate_limit.window(),
    )));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(
        account_service,
        authenticator,
        admission,
        config.rate_limit.trust_forwarded_for,
    );

    axum::serve(
        http_listener,
        http_application.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    tracing::info!("Server exited");

    Ok(())
}
