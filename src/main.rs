use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser as _;

use serendib::cli::ServeArgs;
use serendib::content::ContentStore;
use serendib::http::AppState;
use serendib::{currency, db, weather};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    serendib::logging::init().context("init logging")?;

    let args = ServeArgs::parse();
    tracing::debug!(?args, "parsed args");

    let database_url = std::env::var("SERENDIB_DATABASE_URL")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let database_url_set = database_url.is_some();
    let database = database_url.map_or(args.database.clone(), PathBuf::from);

    let currency_feed = feed_url("SERENDIB_CURRENCY_FEED_URL", currency::DEFAULT_FEED_URL)?;
    let weather_feed = feed_url("SERENDIB_WEATHER_FEED_URL", weather::DEFAULT_FEED_URL)?;

    let content = Arc::new(
        ContentStore::open(&args.content_dir)
            .with_context(|| format!("load content dir: {}", args.content_dir.display()))?,
    );

    let pool = db::connect(&database, args.pool_size).await?;
    db::init_schema(&pool).await.context("init schema")?;

    let state = AppState {
        pool,
        content,
        http: currency::http_client()?,
        currency_feed,
        weather_feed,
        upload_dir: args.upload_dir.clone(),
        database_url_set,
    };

    let app = serendib::http::router(state);

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", args.addr))?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn feed_url(key: &str, default: &str) -> anyhow::Result<String> {
    let value = std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string());

    let parsed = url::Url::parse(&value).with_context(|| format!("parse {key}: {value}"))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("{key} must be http/https: {value}");
    }
    Ok(value)
}
