use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use futures::future::join_all;
use gcp_adapters::adapter::{build_registry, make_adapters, DynamicAdapter, Linker};
use gcp_adapters::config::Config;
use gcp_adapters::gcp::auth::TokenSource;
use gcp_adapters::gcp::client::GcpClient;
use gcp_adapters::gcp::http::{format_gcp_error, HttpClientProvider};
use gcp_adapters::gcp::location::LocationLevel;
use gcp_adapters::sdp::{ItemType, MemoryCache, StreamEvent};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing::{Instrument, Level};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Query Google Cloud resources through dynamic adapters
#[derive(Parser, Debug)]
#[command(name = "gcp-adapters", version, about, long_about = None)]
struct Args {
    /// GCP project to use
    #[arg(short, long, global = true)]
    project: Option<String>,

    /// Region to query, repeatable
    #[arg(short, long = "region", global = true)]
    regions: Vec<String>,

    /// Zone to query, repeatable
    #[arg(short, long = "zone", global = true)]
    zones: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "yaml", global = true)]
    output: OutputFormat,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    /// Also register adapters still in development
    #[arg(long, global = true)]
    include_in_development: bool,

    /// Save project, regions and zones as defaults
    #[arg(long, global = true)]
    remember: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered item types
    Types,
    /// Show adapter metadata of an item type
    Describe { item_type: String },
    /// Check that every declared link target can be resolved
    Validate,
    /// Get one item by its unique attribute
    Get {
        item_type: String,
        query: String,
        /// Scope to query when the type exists in several
        #[arg(long)]
        scope: Option<String>,
    },
    /// List every item of a type, streamed as pages arrive
    List {
        item_type: String,
        #[arg(long)]
        scope: Option<String>,
    },
    /// Search items of a type
    Search {
        item_type: String,
        query: String,
        #[arg(long)]
        scope: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

/// Log to a file; RUST_LOG directives override `--log-level`
fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let rust_log = std::env::var("RUST_LOG").is_ok_and(|value| !value.is_empty());
    let default_level = match level.to_tracing_level() {
        Some(tracing_level) => tracing_level,
        None if rust_log => Level::WARN,
        None => return None,
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Cannot open log file {:?}: {}", log_path, err);
            return None;
        },
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(default_level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("gcp-adapters {} started with log level: {:?}", gcp_adapters::VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("gcp-adapters").join("gcp-adapters.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".gcp-adapters").join("gcp-adapters.log");
    }
    PathBuf::from("gcp-adapters.log")
}

fn query_span(item_type: ItemType, method: &str, scope: &str) -> tracing::Span {
    tracing::info_span!("query", id = %Uuid::new_v4(), item_type = %item_type, method, scope)
}

fn render<T: Serialize>(format: OutputFormat, value: &T) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    })
}

/// One record of a streamed result: a JSON line or a YAML document
fn render_streamed<T: Serialize>(format: OutputFormat, value: &T) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::Yaml => format!("---\n{}", serde_yaml::to_string(value)?.trim_end()),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TypeSummary {
    #[serde(rename = "type")]
    item_type: ItemType,
    location_level: LocationLevel,
    can_list: bool,
    can_search: bool,
    in_development: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let mut config = Config::load();
    if args.include_in_development {
        config.include_in_development = true;
    }

    let registry = Arc::new(build_registry(config.include_in_development)?);
    let linker = Arc::new(Linker::new(registry));
    // `validate` lists the dangling links itself
    if !matches!(args.command, Command::Validate) {
        linker.validate()?;
    }

    let ctx = CancellationToken::new();
    let cancel = ctx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, cancelling queries");
            cancel.cancel();
        }
    });

    match &args.command {
        Command::Types => {
            let summaries: Vec<TypeSummary> = linker
                .registry()
                .declarations()
                .map(|declaration| TypeSummary {
                    item_type: declaration.item_type,
                    location_level: declaration.meta.location_level,
                    can_list: declaration.meta.can_list(),
                    can_search: declaration.meta.can_search(),
                    in_development: declaration.meta.in_development,
                })
                .collect();
            println!("{}", render(args.output, &summaries)?);
        },
        Command::Validate => {
            for link in linker.dangling_links() {
                println!("{}.{} -> {}: no adapter resolves this target", link.source, link.field_path, link.target);
            }
            linker.validate()?;
            println!("{} item type(s), every link target resolves", linker.registry().len());
        },
        Command::Describe { item_type } => {
            let adapters = open_adapters(&args, &mut config, &linker, item_type, false).await?;
            let metadata: Vec<_> = adapters.iter().map(DynamicAdapter::metadata).collect();
            println!("{}", render(args.output, &metadata)?);
        },
        Command::Get {
            item_type,
            query,
            scope,
        } => {
            let adapters = open_adapters(&args, &mut config, &linker, item_type, true).await?;
            let targets = select_scope(&adapters, scope.as_deref())?;
            let [adapter] = targets.as_slice() else {
                let scopes: Vec<&str> = targets.iter().map(|adapter| adapter.scope()).collect();
                anyhow::bail!(
                    "{} exists in {} scopes, pick one with --scope: {}",
                    item_type,
                    scopes.len(),
                    scopes.join(", ")
                );
            };

            let span = query_span(adapter.item_type(), "GET", adapter.scope());
            let item = adapter
                .get(&ctx, adapter.scope(), query, false)
                .instrument(span)
                .await
                .map_err(|err| anyhow::anyhow!(format_gcp_error(&err)))?;
            println!("{}", render(args.output, &item)?);
        },
        Command::List { item_type, scope } => {
            let adapters = open_adapters(&args, &mut config, &linker, item_type, true).await?;
            let targets = select_scope(&adapters, scope.as_deref())?;
            list_streamed(&ctx, targets, args.output).await?;
        },
        Command::Search {
            item_type,
            query,
            scope,
        } => {
            let adapters = open_adapters(&args, &mut config, &linker, item_type, true).await?;
            let targets = select_scope(&adapters, scope.as_deref())?;
            let results = join_all(targets.iter().map(|adapter| {
                let span = query_span(adapter.item_type(), "SEARCH", adapter.scope());
                adapter
                    .search(&ctx, adapter.scope(), query, false)
                    .instrument(span)
            }))
            .await;

            let mut items = Vec::new();
            let mut failures = 0;
            for (adapter, result) in targets.iter().zip(results) {
                match result {
                    Ok(found) => items.extend(found),
                    Err(err) => {
                        failures += 1;
                        eprintln!("{}: {}", adapter.scope(), format_gcp_error(&err));
                    },
                }
            }
            println!("{}", render(args.output, &items)?);
            if failures > 0 {
                anyhow::bail!("search failed in {} of {} scope(s)", failures, targets.len());
            }
        },
    }

    Ok(())
}

/// Build the adapters of one item type for the configured locations
///
/// Offline commands use an anonymous client so no credentials are needed.
async fn open_adapters(
    args: &Args,
    config: &mut Config,
    linker: &Arc<Linker>,
    item_type: &str,
    authenticated: bool,
) -> Result<Vec<DynamicAdapter>> {
    let item_type = linker
        .registry()
        .find(item_type)
        .map(|declaration| declaration.item_type)
        .with_context(|| format!("Unknown item type {}, see 'gcp-adapters types'", item_type))?;

    let project = config.effective_project(args.project.as_deref())?;
    let zones = config.effective_zones(&args.zones);
    let regions = config.effective_regions(&args.regions, &zones);
    tracing::info!("Using project: {}, regions: {:?}, zones: {:?}", project, regions, zones);

    if args.remember {
        config.remember(&project, &regions, &zones);
        config.save()?;
    }

    let http: Arc<dyn HttpClientProvider> = if authenticated {
        Arc::new(GcpClient::new(config.request_timeout()).await?)
    } else {
        Arc::new(GcpClient::with_tokens(TokenSource::Anonymous, config.request_timeout())?)
    };
    let cache = Arc::new(MemoryCache::new(config.cache_ttl()));

    let adapters: Vec<DynamicAdapter> = make_adapters(linker, http, cache, &project, &regions, &zones)?
        .into_iter()
        .filter(|adapter| adapter.item_type() == item_type)
        .map(|adapter| adapter.with_max_pages(config.max_pages))
        .collect();

    if adapters.is_empty() {
        anyhow::bail!(
            "No location for {}: pass --region or --zone, or set a gcloud default",
            item_type
        );
    }
    Ok(adapters)
}

fn select_scope<'a>(adapters: &'a [DynamicAdapter], scope: Option<&str>) -> Result<Vec<&'a DynamicAdapter>> {
    let selected: Vec<&DynamicAdapter> = adapters
        .iter()
        .filter(|adapter| scope.map_or(true, |scope| adapter.scope() == scope))
        .collect();

    if selected.is_empty() {
        let available: Vec<&str> = adapters.iter().map(DynamicAdapter::scope).collect();
        anyhow::bail!(
            "No adapter for scope {}; available: {}",
            scope.unwrap_or_default(),
            available.join(", ")
        );
    }
    Ok(selected)
}

/// Stream every scope concurrently, printing items as they arrive
async fn list_streamed(
    ctx: &CancellationToken,
    targets: Vec<&DynamicAdapter>,
    format: OutputFormat,
) -> Result<()> {
    let scopes = targets.len();
    let (tx, mut rx) = mpsc::unbounded_channel::<StreamEvent>();

    let producer = async move {
        let tx = tx;
        join_all(targets.iter().map(|adapter| {
            let span = query_span(adapter.item_type(), "LIST", adapter.scope());
            adapter
                .list_stream(ctx, adapter.scope(), false, &tx)
                .instrument(span)
        }))
        .await;
    };

    let consumer = async {
        let mut items = 0usize;
        let mut failures = 0usize;
        while let Some(event) = rx.recv().await {
            match event {
                StreamEvent::Item(item) => {
                    println!("{}", render_streamed(format, &item)?);
                    items += 1;
                },
                StreamEvent::Error(err) => {
                    failures += 1;
                    eprintln!("{}", format_gcp_error(&err));
                },
            }
        }
        Ok::<_, anyhow::Error>((items, failures))
    };

    let ((), result) = tokio::join!(producer, consumer);
    let (items, failures) = result?;
    tracing::info!("listed {} item(s) from {} scope(s)", items, scopes);

    if failures > 0 {
        anyhow::bail!("{} error(s) while listing {} scope(s)", failures, scopes);
    }
    Ok(())
}
