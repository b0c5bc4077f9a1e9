use clap::{Parser, Subcommand};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use todo_backend::db::schema;
use todo_backend::server::config::ServerConfig;
use todo_backend::server::overdue_monitor::OverdueMonitor;
use todo_backend::services::auth_service;
use todo_backend::web::{self, AppState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a signed bearer token for the given subject and exit
    IssueToken {
        #[arg(long)]
        subject: String,
        #[arg(long, default_value_t = 24)]
        ttl_hours: i64,
    },
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "todo-server.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("info,sea_orm=warn,sqlx::query=warn,tower_http=info")
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler.");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler.");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received.");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let server_config = Arc::new(ServerConfig::load(args.config.as_deref())?);

    if let Some(Command::IssueToken { subject, ttl_hours }) = args.command {
        let token = auth_service::issue_token(
            &subject,
            &server_config.jwt_secret,
            chrono::Duration::hours(ttl_hours),
        )?;
        println!("{token}");
        return Ok(());
    }

    init_logging(&server_config.log_dir);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting todo server.");

    // --- Database Pool Setup ---
    let mut opt = ConnectOptions::new(server_config.database_url.to_owned());
    opt.max_connections(server_config.db_max_connections)
        .sqlx_logging(false);
    let db_pool: DatabaseConnection = Database::connect(opt).await?;
    schema::ensure_schema(&db_pool).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // --- Background tasks ---
    let monitor = OverdueMonitor::new(db_pool.clone(), server_config.overdue_poll_interval());
    let monitor_task = tokio::spawn(monitor.run(shutdown_rx.clone()));

    let app_state = Arc::new(AppState::new(db_pool, server_config.clone()));

    let limiter = app_state.rate_limiter.clone();
    let purge_period = server_config.rate_limit_window().max(Duration::from_secs(1));
    let mut purge_shutdown = shutdown_rx;
    let purge_task = tokio::spawn(async move {
        let mut ticker = interval(purge_period);
        loop {
            tokio::select! {
                _ = ticker.tick() => limiter.purge_expired(Instant::now()),
                _ = purge_shutdown.changed() => break,
            }
        }
    });

    let app = web::create_axum_router(app_state);

    let listener = tokio::net::TcpListener::bind(&server_config.listen_addr).await?;
    info!(addr = %server_config.listen_addr, "HTTP server listening.");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    let _ = shutdown_tx.send(true);
    let _ = monitor_task.await;
    let _ = purge_task.await;
    info!("Server stopped.");

    Ok(())
}
