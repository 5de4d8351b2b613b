use adapter::database::{connect_database_with, ConnectionPool};
use adapter::redis::RedisClient;
use adapter::telegram::TelegramApi;
use anyhow::{Context, Result};
use bot::handler::BotState;
use bot::session::SessionStore;
use registry::AppRegistry;
use shared::config::AppConfig;
use shared::env::{which, Environment};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::process::Command;
use tokio::signal::unix::{signal, SignalKind};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const WEBHOOK_PORT: u16 = 8000;

#[tokio::main]
async fn main() -> Result<()> {
    init_logger()?;
    match std::env::args().nth(1).as_deref() {
        Some("subscriber") => run_subscriber().await,
        Some("scheduler") => run_scheduler().await,
        _ => run_interactive().await,
    }
}

fn init_logger() -> Result<()> {
    let log_level = match which() {
        Environment::Development => "debug",
        Environment::Production => "info",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| log_level.into());

    let subscriber = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_target(false);

    tracing_subscriber::registry()
        .with(subscriber)
        .with(env_filter)
        .try_init()?;

    Ok(())
}

fn build_registry(app_config: &AppConfig) -> Result<(ConnectionPool, Arc<RedisClient>, AppRegistry)> {
    let pool = connect_database_with(&app_config.database);
    let kv = Arc::new(RedisClient::new(&app_config.redis)?);
    let registry = AppRegistry::new(pool.clone(), kv.clone(), app_config.bot.clone());
    Ok((pool, kv, registry))
}

async fn run_subscriber() -> Result<()> {
    tracing::info!(pid = std::process::id(), "subscriber starting");
    let app_config = AppConfig::new()?;
    let (pool, kv, registry) = build_registry(&app_config)?;

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let exit_code = tokio::select! {
        _ = sigint.recv() => 130,
        _ = sigterm.recv() => 143,
        res = bot::subscriber::run(registry, kv) => {
            if let Err(e) = res {
                tracing::error!(error = %e, "subscriber stopped unexpectedly");
            }
            1
        }
    };

    pool.close().await;
    std::process::exit(exit_code);
}

async fn run_scheduler() -> Result<()> {
    tracing::info!(pid = std::process::id(), "scheduler starting");
    let app_config = AppConfig::new()?;
    let (pool, _kv, registry) = build_registry(&app_config)?;

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let exit_code = tokio::select! {
        _ = sigint.recv() => 130,
        _ = sigterm.recv() => 143,
        _ = bot::scheduler::run(registry) => 1,
    };

    pool.close().await;
    std::process::exit(exit_code);
}

async fn run_interactive() -> Result<()> {
    tracing::info!(pid = std::process::id(), "interactive handler starting");
    let app_config = AppConfig::new()?;
    let (pool, kv, registry) = build_registry(&app_config)?;
    let sessions = Arc::new(SessionStore::new());
    let state = BotState {
        registry,
        sessions,
    };
    let api = Arc::new(TelegramApi::new(app_config.bot.token.clone()));

    // 購読側とスケジューラーは同じ実行ファイルの別プロセスとして起動する
    let exe = std::env::current_exe().context("failed to resolve current executable")?;
    let mut subscriber = Command::new(&exe)
        .arg("subscriber")
        .spawn()
        .context("failed to spawn subscriber worker")?;
    let mut scheduler = Command::new(&exe)
        .arg("scheduler")
        .spawn()
        .context("failed to spawn scheduler worker")?;

    {
        let state = state.clone();
        let kv = kv.clone();
        tokio::spawn(async move {
            if let Err(e) = bot::interactive::listen_identity_refresh(state, kv).await {
                tracing::error!(error = %e, "identity refresh listener stopped");
            }
        });
    }

    let mut server = if let Some(url) = app_config.bot.webhook_url.clone() {
        api.set_webhook(&url).await?;
        tracing::info!(webhook = %url, "webhook registered");

        let app = bot::interactive::router(state.clone()).layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        );
        let addr = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), WEBHOOK_PORT);
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .context("Unexpected error happened in server")
        })
    } else {
        tracing::info!("long polling mode");
        let state = state.clone();
        let api = api.clone();
        tokio::spawn(async move {
            bot::interactive::poll_updates(state, api).await;
            Ok::<(), anyhow::Error>(())
        })
    };

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let exit_code = tokio::select! {
        _ = sigint.recv() => 130,
        _ = sigterm.recv() => 143,
        res = &mut server => {
            tracing::error!(result = ?res, "interactive surface stopped unexpectedly");
            1
        }
    };

    // 新規の受付を止め、子ワーカーを畳み、ストア接続を閉じてから抜ける
    server.abort();
    let shutdown: Result<()> = async {
        subscriber
            .start_kill()
            .context("failed to stop subscriber worker")?;
        scheduler
            .start_kill()
            .context("failed to stop scheduler worker")?;
        pool.close().await;
        Ok(())
    }
    .await;

    match shutdown {
        Ok(()) => std::process::exit(exit_code),
        Err(e) => {
            tracing::error!(error = %e, "shutdown failed");
            std::process::exit(1);
        }
    }
}
