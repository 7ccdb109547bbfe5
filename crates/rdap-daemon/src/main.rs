// crates/rdap-daemon/src/main.rs
//
// Binary entrypoint for the resolution daemon.
//
// Parses CLI arguments, loads configuration, initializes tracing, loads the
// revision dump and builds the first range index, then either serves the
// line-oriented query protocol on stdin/stdout or answers a single lookup.

mod config;
mod engine;
mod legacy;
mod output;
mod scheduler;

use std::sync::Arc;

use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use config::DaemonConfig;
use engine::Engine;
use rdap_core::error::RdapError;
use rdap_core::object::{ObjectType, Source};
use rdap_resolver::{MatchMode, QueryKey, QueryKind};
use scheduler::RebuildScheduler;

/// Registration-data resolution daemon.
#[derive(Parser, Debug)]
#[command(
    name = "rdap-daemon",
    version = "0.1.0",
    about = "Resolves addresses, AS numbers, domains and handles to registration records"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "~/.rdap/config.toml")]
    config: String,

    /// Revision dump to load instead of the configured one.
    #[arg(long, global = true)]
    dump: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Answer queries read line by line from stdin, rebuilding the index on
    /// the configured schedule.
    Serve,

    /// Resolve one key and print the result.
    Lookup(LookupCmd),

    /// Print the revision of an object in effect at a point in time.
    Version(VersionCmd),
}

#[derive(Debug, Args)]
struct LookupCmd {
    /// Key kind: ip, autnum, domain or entity.
    kind: QueryKind,

    /// The key, e.g. 192.0.2.0/24, AS123, 2.0.192.in-addr.arpa, TP1-TEST.
    value: String,

    /// Match mode: most-specific, exact, exact-or-less-specific, less-specific.
    #[arg(long, default_value = "most-specific")]
    mode: MatchMode,
}

#[derive(Debug, Args)]
struct VersionCmd {
    /// Object type, e.g. inetnum, aut-num, person.
    object_type: String,

    /// Primary key of the object.
    key: String,

    /// Source the object belongs to.
    source: String,

    /// Point in time, e.g. 2013-01-01T12:00:00.
    timestamp: NaiveDateTime,

    /// List every revision up to the timestamp instead.
    #[arg(long)]
    history: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from TOML file, falling back to defaults if the file
    // is not found. Logging is set up afterwards so the configured level
    // applies; the outcome is logged once it is.
    let config_path = expand_tilde(&cli.config);
    let loaded = DaemonConfig::load(&config_path);
    let daemon_config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => DaemonConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&daemon_config.log_level)),
        )
        .init();

    match loaded {
        Ok(_) => tracing::info!("Loaded configuration from {}", config_path),
        Err(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            config_path,
            e
        ),
    }

    let dump_path = expand_tilde(cli.dump.as_deref().unwrap_or(&daemon_config.dump_path));
    tracing::info!("Local sources: {}", daemon_config.local_sources.join(", "));
    tracing::info!("Redirected sources: {}", daemon_config.redirects.len());
    tracing::info!("Dump: {}", dump_path);

    let engine = Arc::new(Engine::start(&daemon_config, &dump_path).await?);
    if engine.store.is_empty() {
        tracing::warn!("Store is empty; every lookup will miss");
    } else {
        tracing::info!("Store holds {} records", engine.store.len());
    }
    tracing::info!("Version grouping: {:?}", engine.versions.granularity());

    match cli.command {
        Commands::Serve => serve(engine, &daemon_config).await?,
        Commands::Lookup(cmd) => lookup(&engine, cmd).await?,
        Commands::Version(cmd) => version(&engine, cmd).await?,
    }

    Ok(())
}

/// Read queries from stdin until EOF or ctrl-c. Each query runs as its own
/// task; answers are written by a single writer task as they complete.
async fn serve(
    engine: Arc<Engine>,
    config: &DaemonConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if config.rebuild_interval_secs > 0 {
        let mut scheduler =
            RebuildScheduler::new(engine.index.clone(), config.rebuild_interval_secs);
        tokio::spawn(async move {
            if let Err(e) = scheduler.run().await {
                tracing::error!("Rebuild scheduler error: {}", e);
            }
        });
    } else {
        tracing::info!("Scheduled rebuilds disabled");
    }

    let (tx, mut rx) = mpsc::channel::<String>(256);
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = rx.recv().await {
            if stdout.write_all(line.as_bytes()).await.is_err()
                || stdout.write_all(b"\n").await.is_err()
            {
                break;
            }
            let _ = stdout.flush().await;
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut queries = JoinSet::new();
    tracing::info!("Serving queries on stdin");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Query loop received shutdown signal");
                break;
            }
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => break,
                };
                let line = line.trim().to_string();
                if line.is_empty() || line.starts_with('%') {
                    continue;
                }
                let engine = engine.clone();
                let tx = tx.clone();
                queries.spawn(async move {
                    let answer = legacy::answer(&engine, &line).await;
                    let _ = tx.send(output::format_line(&answer)).await;
                });
            }
        }
    }

    while queries.join_next().await.is_some() {}
    drop(tx);
    writer.await?;
    Ok(())
}

async fn lookup(engine: &Engine, cmd: LookupCmd) -> Result<(), Box<dyn std::error::Error>> {
    let key = QueryKey::parse(cmd.kind, &cmd.value)?;
    let resolution = engine.resolver.resolve(&key, cmd.mode).await?;
    println!("{}", output::format_json(&resolution));
    Ok(())
}

async fn version(engine: &Engine, cmd: VersionCmd) -> Result<(), Box<dyn std::error::Error>> {
    let object_type = ObjectType::from_name(&cmd.object_type).ok_or_else(|| {
        RdapError::BadRequest(format!("Unknown object type '{}'", cmd.object_type))
    })?;
    let source = Source::new(&cmd.source);

    if cmd.history {
        let revisions = engine
            .versions
            .history(object_type, &cmd.key, &source, cmd.timestamp)
            .await?;
        println!("{}", output::format_json(&revisions));
    } else {
        let lookup = engine
            .versions
            .resolve_at(object_type, &cmd.key, &source, cmd.timestamp)
            .await?;
        println!("{}", output::format_json(&lookup));
    }
    Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}
