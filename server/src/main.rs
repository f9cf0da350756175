use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::service::TowerToHyperService;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tower::Layer;

// Error tracing
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use server::AppState;
use server::database::open_database;
use server::handlers::http::{Router, build_api_router};
use server::tower_middle::TimeoutLayer;
use shared::config::{LiveConfig, load_config};

#[derive(Parser, Debug)]
#[command(name = "server", version, about = "Users, store items, stats and news service")]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Grant the admin flag to a user named by id, name or email
    Promote { identifier: String },
    /// Print a signed token with the service audience
    ServiceToken {
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 60)]
        ttl_minutes: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config))?;

    // RUST_LOG wins over the config file.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("Invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let db_url = config.database.resolved_url();
    let db = open_database(&db_url, config.database.max_connections)
        .await
        .with_context(|| format!("Failed to open database {}", db_url))?;
    info!("Database ready at {}", db_url);

    let state = AppState::build(config, db)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state, cli.config).await,
        Command::Promote { identifier } => {
            let user = state
                .users
                .promote(&identifier)
                .await
                .with_context(|| format!("Failed to promote {}", identifier))?;
            println!("{} ({}) is now an admin", user.name, user.id);
            Ok(())
        }
        Command::ServiceToken { name, ttl_minutes } => {
            let (token, expires_at) = state
                .users
                .service_token(&name, ttl_minutes.saturating_mul(60))
                .await
                .with_context(|| format!("Failed to issue a token for {}", name))?;
            info!("Service token for {} expires at {}", name, expires_at);
            println!("{}", token);
            Ok(())
        }
    }
}

async fn serve(state: AppState, config_path: String) -> Result<()> {
    let (addr, timeout, max_connections) = {
        let cfg = state.config.read().await;
        (
            cfg.server.addr(),
            Duration::from_secs(cfg.server.request_timeout_secs),
            cfg.server.max_connections,
        )
    };

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);

    spawn_reload_listener(state.config.clone(), config_path);

    let router = Arc::new(build_api_router());
    let limiter = Arc::new(Semaphore::new(max_connections));

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    continue;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
        };

        let Ok(permit) = limiter.clone().try_acquire_owned() else {
            warn!("Connection limit reached, dropping {}", peer);
            continue;
        };

        let router = router.clone();
        let state = state.clone();
        tokio::spawn(async move {
            let _permit = permit;
            serve_connection(stream, peer, router, state, timeout).await;
        });
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    router: Arc<Router>,
    state: AppState,
    timeout: Duration,
) {
    let svc = tower::service_fn(move |req: Request<Incoming>| {
        let router = router.clone();
        let state = state.clone();
        async move { router.handle(req, state).await }
    });
    let svc = TowerToHyperService::new(TimeoutLayer::new(timeout).layer(svc));

    if let Err(err) = http1::Builder::new()
        .timer(TokioTimer::new())
        .serve_connection(TokioIo::new(stream), svc)
        .await
    {
        debug!("Error serving connection from {}: {:?}", peer, err);
    }
}

/// Reload the config file on SIGHUP. A file that fails to load or validate
/// leaves the running config untouched.
#[cfg(unix)]
fn spawn_reload_listener(config: LiveConfig, path: String) {
    use tokio::signal::unix::{SignalKind, signal};

    tokio::spawn(async move {
        let mut hangups = match signal(SignalKind::hangup()) {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Could not listen for SIGHUP, hot reload disabled: {}", e);
                return;
            }
        };

        while hangups.recv().await.is_some() {
            info!("SIGHUP received, reloading {}", path);
            match load_config(&path) {
                Ok(new) => {
                    config.reload(new).await;
                    info!("Configuration reloaded");
                }
                Err(e) => error!("Reload failed, keeping current config: {}", e),
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_listener(_config: LiveConfig, _path: String) {}
