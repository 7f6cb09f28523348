//! `solder` command line: serve the API, inspect blobs, sync releases.

use clap::{Parser, Subcommand, ValueEnum};
use derive_more::{Display, Error};
use exn::ResultExt;
use serde::Deserialize;
use solder_config::Config;
use solder_server::{AppState, create_router};
use solder_storage::backend::LocalBackend;
use solder_storage::{ArtifactStore, Category};
use solder_store::models::{ForgeRelease, MinecraftRelease};
use solder_store::repo::{Release, Releases, SyncOutcome};
use solder_store::{Database, Store};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type Error = exn::Exn<ErrorKind>;
type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open artifact storage")]
    Storage,
    #[display("could not open the database")]
    Database,
    #[display("HTTP server failed")]
    Server,
    #[display("could not read release feed {}", _0.display())]
    Feed(#[error(not(source))] PathBuf),
    #[display("could not sync release `{_0}`")]
    Sync(#[error(not(source))] String),
}

/// Mod pack manager serving pack manifests to launcher clients.
#[derive(Debug, Parser)]
#[command(name = "solder", version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON).
    #[arg(short, long, global = true, env = "SOLDER_CONFIG")]
    config: Option<PathBuf>,
    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve,
    /// List stored blobs of a category with their location on disk.
    Blobs {
        #[arg(value_enum)]
        category: CategoryArg,
    },
    /// Sync every release of a downloaded upstream feed.
    Sync {
        #[arg(value_enum)]
        kind: ReleaseKind,
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CategoryArg {
    Logo,
    File,
}
impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Logo => Category::Logo,
            CategoryArg::File => Category::File,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReleaseKind {
    Minecraft,
    Forge,
}

/// Mojang's version manifest, or a bare list of records.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Feed<R> {
    Manifest { versions: Vec<R> },
    List(Vec<R>),
}
impl<R> Feed<R> {
    fn into_records(self) -> Vec<R> {
        match self {
            Self::Manifest { versions } => versions,
            Self::List(records) => records,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_filter = if cli.debug { "debug" } else { "info,tower_http=info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = ?err, "{err}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).map_err(|err| err.raise(ErrorKind::Config))?;
    match cli.command {
        Command::Serve => serve(&config).await,
        Command::Blobs { category } => blobs(&config, category.into()).await,
        Command::Sync { kind: ReleaseKind::Minecraft, file } => {
            let store = open_store(&config, artifacts(&config)?).await?;
            sync::<solder_store::models::Minecraft, MinecraftRelease>(&store.minecrafts, &file).await
        },
        Command::Sync { kind: ReleaseKind::Forge, file } => {
            let store = open_store(&config, artifacts(&config)?).await?;
            sync::<solder_store::models::Forge, ForgeRelease>(&store.forges, &file).await
        },
    }
}

fn artifacts(config: &Config) -> Result<ArtifactStore> {
    let Some(root) = config.storage.root.as_deref() else {
        exn::bail!(ErrorKind::Storage);
    };
    let backend = LocalBackend::new("local", root).map_err(|err| err.raise(ErrorKind::Storage))?;
    Ok(ArtifactStore::new(Arc::new(backend)))
}

async fn open_store(config: &Config, artifacts: ArtifactStore) -> Result<Store> {
    let Some(path) = config.database.path.as_deref() else {
        exn::bail!(ErrorKind::Database);
    };
    let db = Database::connect(path, Some(config.database.max_connections))
        .await
        .map_err(|err| err.raise(ErrorKind::Database))?;
    Ok(Store::new(&db, artifacts))
}

async fn serve(config: &Config) -> Result<()> {
    tracing::info!("solder v{}", env!("CARGO_PKG_VERSION"));
    let artifacts = artifacts(config)?;
    let store = open_store(config, artifacts.clone()).await?;
    let state = AppState::new(store, artifacts, config.download_url());
    let addr = config.bind_addr().map_err(|err| err.raise(ErrorKind::Config))?;
    let listener = tokio::net::TcpListener::bind(addr).await.or_raise(|| ErrorKind::Server)?;
    tracing::info!(%addr, public_url = %config.server.public_url, "listening");
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .or_raise(|| ErrorKind::Server)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn blobs(config: &Config, category: Category) -> Result<()> {
    let store = artifacts(config)?;
    let files = store.list(category).await.map_err(|err| err.raise(ErrorKind::Storage))?;
    for file in files {
        let Some(hash) = file.file_name() else { continue };
        let path = solder_storage::artifact::absolute_path(config.storage.root.as_deref(), category, hash)
            .map_err(|err| err.raise(ErrorKind::Storage))?;
        println!("{hash}\t{}\t{}\t{}", file.size, file.modified, path.display());
    }
    Ok(())
}

fn read_feed<R: for<'de> Deserialize<'de>>(file: &Path) -> Result<Vec<R>> {
    let raw = std::fs::read(file).or_raise(|| ErrorKind::Feed(file.to_path_buf()))?;
    let feed: Feed<R> = serde_json::from_slice(&raw).or_raise(|| ErrorKind::Feed(file.to_path_buf()))?;
    Ok(feed.into_records())
}

async fn sync<E, R>(releases: &Releases<E>, file: &Path) -> Result<()>
where
    E: Release<Record = R>,
    R: for<'de> Deserialize<'de> + std::fmt::Debug + Send + Sync,
{
    let records: Vec<R> = read_feed(file)?;
    let (mut created, mut updated) = (0usize, 0usize);
    for record in &records {
        let (_, outcome) = releases
            .sync(record)
            .await
            .map_err(|err| err.raise(ErrorKind::Sync(E::record_name(record).to_string())))?;
        match outcome {
            SyncOutcome::Created => created += 1,
            SyncOutcome::Updated => updated += 1,
            SyncOutcome::Unchanged => {},
        }
    }
    tracing::info!(total = records.len(), created, updated, "synced release feed");
    Ok(())
}
