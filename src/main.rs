// src/main.rs

use std::net::SocketAddr;
use std::str::FromStr;

use edu_eval::config::Config;
use edu_eval::routes;
use edu_eval::state::AppState;
use edu_eval::utils::hash::{generate_salt, hash_password};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load configuration from environment (.env supported)
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Initialize Database Pool. Schema faults here are unrecoverable, so they
    // abort startup.
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .expect("Invalid DATABASE_URL")
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    // Seed Admin Teacher Account
    if let Err(e) = seed_admin_teacher(&pool, &config).await {
        tracing::error!("Failed to seed admin teacher: {:?}", e);
    }

    // Create AppState
    let state = AppState::new(pool, config);

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listening address");

    // Start the server
    axum::serve(listener, app).await.expect("Server error");
}

/// Idempotent seed of the initial teacher account: an explicit existence check
/// guards the insert, never a swallowed constraint violation.
async fn seed_admin_teacher(
    pool: &SqlitePool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(login), Some(password)) = (&config.admin_login, &config.admin_password) {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE login = ?")
            .bind(login)
            .fetch_one(pool)
            .await?;

        if exists == 0 {
            tracing::info!("Seeding admin teacher: {}", login);
            let salt = generate_salt();
            let password_hash = hash_password(password, &salt);

            sqlx::query(
                r#"
                INSERT INTO users (name, login, password_hash, salt, role)
                VALUES ('Admin', ?, ?, ?, 'teacher')
                "#,
            )
            .bind(login)
            .bind(&password_hash)
            .bind(&salt)
            .execute(pool)
            .await?;
            tracing::info!("Admin teacher created successfully.");
        }
    }
    Ok(())
}
