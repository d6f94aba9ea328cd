use std::sync::Arc;

use account_service::config::Config;
use account_service::domain::user::ports::AuthServicePort;
use account_service::domain::user::ports::EmailSender;
use account_service::domain::user::service::AuthService;
use account_service::domain::user::service::AuthSettings;
use account_service::inbound::http::router::create_router;
use account_service::inbound::http::router::CookieSettings;
use account_service::outbound::clock::SystemClock;
use account_service::outbound::email::LogEmailSender;
use account_service::outbound::email::SmtpEmailSender;
use account_service::outbound::repositories::PostgresUserRepository;
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
        environment = %config.app.environment,
        http_port = config.server.http_port,
        token_ttl_hours = config.jwt.expiration_hours,
        smtp = config.email.smtp.is_some(),
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let hasher = PasswordHasher::with_params(
        config.password.memory_kib,
        config.password.iterations,
        config.password.parallelism,
    )?;
    let authenticator = Arc::new(Authenticator::with_hasher(
        hasher,
        config.jwt.secret.as_bytes(),
        config.jwt.ttl(),
    ));
    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool));
    let settings = AuthSettings {
        public_url: config.app.public_url.clone(),
        email_timeout: config.email.timeout(),
    };

    let auth_service: Arc<dyn AuthServicePort> = match &config.email.smtp {
        Some(smtp) => build_service(
            user_repository,
            Arc::new(SmtpEmailSender::new(&config.email, smtp)?),
            Arc::clone(&authenticator),
            settings,
        ),
        None => {
            tracing::warn!("No SMTP relay configured, outgoing email will only be logged");
            build_service(
                user_repository,
                Arc::new(LogEmailSender),
                Arc::clone(&authenticator),
                settings,
            )
        }
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(
        auth_service,
        CookieSettings {
            expiration_days: config.cookie.expiration_days,
            secure: config.app.is_production(),
        },
    );

    axum::serve(http_listener, http_application).await?;
    tracing::info!("Server exited successfully");

    Ok(())
}

fn build_service<ES: EmailSender>(
    repository: Arc<PostgresUserRepository>,
    email_sender: Arc<ES>,
    authenticator: Arc<Authenticator>,
    settings: AuthSettings,
) -> Arc<dyn AuthServicePort> {
    Arc::new(AuthService::new(
        repository,
        email_sender,
        Arc::new(SystemClock),
        authenticator,
        settings,
    ))
}
