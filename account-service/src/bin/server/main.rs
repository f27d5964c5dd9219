use std::sync::Arc;

use account_service::config::Config;
use account_service::domain::auth::service::AuthService;
use account_service::inbound::http::router::create_router;
use account_service::outbound::mailer::smtp::SmtpMailer;
use account_service::outbound::repositories::user::PostgresUserDirectory;
use account_service::outbound::session::redis::RedisSessionStore;
use chrono::Duration;
use security::TokenCodec;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "account_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "account-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        database_url = %config.database.url,
        redis_url = %config.redis.url,
        http_port = config.server.http_port,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let refresh_ttl = Duration::days(config.jwt.refresh_token_expire_days);

    let directory = Arc::new(PostgresUserDirectory::new(pg_pool));
    let sessions = Arc::new(
        RedisSessionStore::connect(&config.redis.url, refresh_ttl.num_seconds() as u64).await?,
    );
    tracing::info!(redis_url = %config.redis.url, "Session store connected");
    let mailer = Arc::new(SmtpMailer::new(&config.email)?);

    let auth_service = Arc::new(AuthService::new(
        directory,
        sessions,
        mailer,
        TokenCodec::new(config.jwt.secret.as_bytes()),
        Duration::minutes(config.jwt.access_token_expire_minutes),
        refresh_ttl,
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(auth_service);
    axum::serve(http_listener, http_application).await?;

    Ok(())
}
