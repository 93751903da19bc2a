use anyhow::{bail, Context, Result};
use axum::http::HeaderValue;
use clap::{Parser, Subcommand};
use memory_journal::form::validation;
use memory_journal::{
    create_router, AppState, Catalog, Config, FormDraft, LocalStore, MediaValue, Upload,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "memory-journal", version, about = "Memory journal wizard service")]
struct Cli {
    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "config/memory-journal")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Check a draft JSON file against the memory schema
    Validate {
        path: PathBuf,
        #[arg(long)]
        locale: Option<String>,
    },
}

/// Draft as written by hand: media given as URLs or paths relative to the file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DraftFile {
    image: Option<String>,
    title: String,
    description: String,
    audio: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.service.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let catalog = match &cfg.locale.dir {
        Some(dir) => Catalog::load_dir(dir)?,
        None => Catalog::default(),
    };
    if !catalog.has_locale(&cfg.locale.default) {
        warn!(
            "Default locale {} has no message table, falling back to English",
            cfg.locale.default
        );
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cfg, catalog).await,
        Command::Validate { path, locale } => {
            let locale = locale.unwrap_or_else(|| cfg.locale.default.clone());
            validate(&path, &catalog, &locale).await
        }
    }
}

async fn serve(cfg: Config, catalog: Catalog) -> Result<()> {
    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Capture device: {:?}", cfg.capture.device);

    let store = LocalStore::new(cfg.storage.clone());
    let state = AppState::new(store, catalog, cfg.capture.clone(), cfg.locale.default.clone());

    let mut app = create_router(state);
    if let Some(origin) = &cfg.service.http.allowed_origin {
        let origin: HeaderValue = origin
            .parse()
            .with_context(|| format!("Invalid allowed_origin {}", origin))?;
        app = app.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        );
    }

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}

async fn validate(path: &Path, catalog: &Catalog, locale: &str) -> Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;
    let file: DraftFile =
        serde_json::from_str(&raw).with_context(|| format!("Invalid draft file {:?}", path))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let draft = FormDraft {
        image: load_media(base, file.image.as_deref()).await?,
        title: file.title,
        description: file.description,
        audio: load_media(base, file.audio.as_deref()).await?,
        record_id: None,
    };

    match validation::validate_draft(&draft) {
        Ok(()) => {
            println!("{}: ok", path.display());
            Ok(())
        }
        Err(errors) => {
            for (field, code) in errors.fields() {
                println!("{}: {} ({})", field, catalog.message(locale, code.as_str()), code);
            }
            bail!("{} has {} invalid field(s)", path.display(), errors.0.len())
        }
    }
}

async fn load_media(base: &Path, value: Option<&str>) -> Result<Option<MediaValue>> {
    let Some(value) = value else {
        return Ok(None);
    };

    if value.starts_with("http://") || value.starts_with("https://") {
        return Ok(Some(MediaValue::reference(value)));
    }

    let file = base.join(value);
    let bytes = tokio::fs::read(&file)
        .await
        .with_context(|| format!("Failed to read media file {:?}", file))?;
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| value.to_string());

    Ok(Some(MediaValue::Payload(Upload::new(
        name,
        "application/octet-stream",
        bytes,
    ))))
}
