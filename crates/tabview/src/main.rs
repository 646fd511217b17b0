//! tabview - Tabular analytics views from the terminal

mod cli;
mod demo;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use demo::DemoSupplier;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tabview_core::export::{export_records, ExportFormat};
use tabview_core::stats::{
    correlation_report, histogram, numeric_values, percent_change, percentile_rank, summarize,
    AggOp, FiveNumberSummary,
};
use tabview_core::{
    aggregate, build_summary, build_view, extract, view_from_extract, PageRequest, RecordStore,
    SearchQuery, Snapshot, SnapshotHub, StoreEvent, ViewConfig, ViewModel, ViewRequest,
};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tabview",
    version,
    about = "Filter, sort, page and summarize tabular analytics records",
    long_about = "Builds paginated views and summary statistics over a snapshot of flat records.\n\
                  \n\
                  Records come from a JSON array of objects (--input) or, without one, from a\n\
                  seeded demo generator of product performance data.\n\
                  \n\
                  Examples:\n\
                    tabview view                                   # First page of demo data\n\
                    tabview view -f 'product in kinetic,anzenn' --sort accuracy:desc\n\
                    tabview view --input records.json --search riskguru --page 2\n\
                    tabview stats --field accuracy --x responseTime --y accuracy\n\
                    tabview export --output out/extract.csv -f 'status=warning'\n\
                    tabview watch --interval 2 --ticks 10          # Timer-driven refresh\n\
                    tabview demo --records 500 --seed 7 > records.json\n\
                  \n\
                  Filter syntax:\n\
                    field=value   field~text   field>=n   field<=n   field in a,b,c\n\
                  \n\
                  Environment Variables:\n\
                    TABVIEW_CONFIG                   # Path to a TOML view config\n\
                    TABVIEW_FORMAT                   # Force output format: json|table\n\
                    TABVIEW_NO_COLOR                 # Disable ANSI colors (log-friendly)\n\
                    RUST_LOG                         # Log filter (overrides --verbose)"
)]
struct Cli {
    #[command(subcommand)]
    mode: Option<Mode>,

    /// Path to a TOML view config (page sizes, refresh interval)
    #[arg(long, global = true, env = "TABVIEW_CONFIG")]
    config: Option<PathBuf>,

    /// Force output format (json|table)
    #[arg(long, global = true, env = "TABVIEW_FORMAT", value_parser = ["json", "table"])]
    format: Option<String>,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, global = true, env = "TABVIEW_NO_COLOR")]
    no_color: bool,

    /// Debug logging for tabview crates
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Args, Clone)]
struct SourceArgs {
    /// JSON file holding an array of flat records (default: demo data)
    #[arg(long, short = 'i')]
    input: Option<PathBuf>,

    /// Demo records per snapshot
    #[arg(long, default_value = "200")]
    records: usize,

    /// Demo generator seed
    #[arg(long, default_value = "42")]
    seed: u64,
}

#[derive(Args, Clone)]
struct QueryArgs {
    /// Filter expression (repeatable, combined with AND)
    #[arg(long = "filter", short = 'f')]
    filters: Vec<String>,

    /// Case-insensitive search term
    #[arg(long, short = 's')]
    search: Option<String>,

    /// Restrict --search to these fields (repeatable)
    #[arg(long = "search-field", requires = "search")]
    search_fields: Vec<String>,

    /// Sort: field, field:asc, field:desc or -field
    #[arg(long)]
    sort: Option<String>,
}

#[derive(Args, Clone)]
struct PageArgs {
    /// Page number, starting at 1
    #[arg(long, short = 'p', default_value = "1")]
    page: usize,

    /// Rows per page (default from config)
    #[arg(long)]
    page_size: Option<usize>,
}

#[derive(Subcommand)]
enum Mode {
    /// Print one page of the filtered, sorted records (default)
    View {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        query: QueryArgs,
        #[command(flatten)]
        page: PageArgs,
        /// Also print count/sum/mean/min/max for these fields
        #[arg(long = "summary")]
        summary_fields: Vec<String>,
    },
    /// Descriptive statistics over the filtered records
    Stats {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        query: QueryArgs,
        /// Numeric field to summarize (repeatable)
        #[arg(long = "field")]
        fields: Vec<String>,
        /// Correlation x field
        #[arg(long, requires = "y")]
        x: Option<String>,
        /// Correlation y field
        #[arg(long, requires = "x")]
        y: Option<String>,
        /// Percentile rank of this value within the first --field
        #[arg(long)]
        percentile: Option<f64>,
        /// Histogram bucket width for the first --field
        #[arg(long)]
        bucket_width: Option<f64>,
    },
    /// Write the full filtered, sorted extract (no pagination) to a file
    Export {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        query: QueryArgs,
        /// Output file
        #[arg(long, short = 'o')]
        output: PathBuf,
        /// csv|json (default: from the output extension)
        #[arg(long = "as", value_parser = ["csv", "json"])]
        export_as: Option<String>,
    },
    /// Refresh the snapshot on a timer and re-render the view
    Watch {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        query: QueryArgs,
        #[command(flatten)]
        page: PageArgs,
        /// Seconds between refreshes (default from config)
        #[arg(long)]
        interval: Option<u64>,
        /// Stop after this many refreshes (default: until Ctrl-C)
        #[arg(long)]
        ticks: Option<u64>,
    },
    /// Print generated demo records as JSON
    Demo {
        /// Number of records
        #[arg(long, default_value = "200")]
        records: usize,
        /// Generator seed
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Write to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Print the effective view config
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.no_color);

    let config = ViewConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load view config")?;

    // Extract flags for command handlers
    let json = cli.format.as_deref() == Some("json");
    let no_color = cli.no_color;

    let mode = cli.mode.unwrap_or(Mode::View {
        source: SourceArgs {
            input: None,
            records: 200,
            seed: 42,
        },
        query: QueryArgs {
            filters: Vec::new(),
            search: None,
            search_fields: Vec::new(),
            sort: None,
        },
        page: PageArgs {
            page: 1,
            page_size: None,
        },
        summary_fields: Vec::new(),
    });

    match mode {
        Mode::View {
            source,
            query,
            page,
            summary_fields,
        } => run_view(&config, source, query, page, summary_fields, json, no_color)?,
        Mode::Stats {
            source,
            query,
            fields,
            x,
            y,
            percentile,
            bucket_width,
        } => run_stats(
            source,
            query,
            fields,
            x.zip(y),
            percentile,
            bucket_width,
            json,
            no_color,
        )?,
        Mode::Export {
            source,
            query,
            output,
            export_as,
        } => run_export(source, query, output, export_as)?,
        Mode::Watch {
            source,
            query,
            page,
            interval,
            ticks,
        } => run_watch(&config, source, query, page, interval, ticks, json, no_color).await?,
        Mode::Demo {
            records,
            seed,
            output,
        } => run_demo(records, seed, output)?,
        Mode::Config => println!("{}", config.to_toml()),
    }

    Ok(())
}

fn init_tracing(verbose: bool, no_color: bool) {
    let default_directive = if verbose {
        "tabview=debug,tabview_core=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .init();
}

// ============================================================================
// Data Supplier
// ============================================================================

/// Where snapshots come from: a JSON file re-read on every refresh, or the
/// seeded demo generator
enum Supplier {
    File(PathBuf),
    Demo(DemoSupplier),
}

impl Supplier {
    fn from_args(source: &SourceArgs) -> Self {
        match &source.input {
            Some(path) => Supplier::File(path.clone()),
            None => Supplier::Demo(DemoSupplier::new(source.seed, source.records)),
        }
    }

    fn next_store(&mut self) -> Result<RecordStore> {
        match self {
            Supplier::File(path) => RecordStore::from_json_file(path, None)
                .with_context(|| format!("Failed to load records from {}", path.display())),
            Supplier::Demo(demo) => Ok(demo.next_store(Utc::now())),
        }
    }
}

fn load_store(source: &SourceArgs) -> Result<RecordStore> {
    Supplier::from_args(source).next_store()
}

fn build_request(query: &QueryArgs, page: PageRequest) -> Result<ViewRequest> {
    let mut request = ViewRequest::new(page);
    for expr in &query.filters {
        request = request.with_filter(cli::parse_filter(expr)?);
    }
    if let Some(term) = &query.search {
        request = request.with_search(SearchQuery::new(term).in_fields(query.search_fields.clone()));
    }
    if let Some(expr) = &query.sort {
        request = request.with_sort(cli::parse_sort(expr)?);
    }
    Ok(request)
}

// ============================================================================
// Commands
// ============================================================================

fn run_view(
    config: &ViewConfig,
    source: SourceArgs,
    query: QueryArgs,
    page: PageArgs,
    summary_fields: Vec<String>,
    json: bool,
    no_color: bool,
) -> Result<()> {
    let store = load_store(&source)?;
    let request = build_request(&query, config.page_request(page.page, page.page_size))?;

    let view = build_view(&store, &request).context("Failed to build view")?;
    println!("{}", cli::format_view(&view, store.schema(), json, no_color));

    if !summary_fields.is_empty() {
        let fields: Vec<&str> = summary_fields.iter().map(String::as_str).collect();
        let summary = build_summary(&store, &request, &fields).context("Failed to summarize")?;
        println!("{}", cli::format_summary(&summary, json, no_color));
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_stats(
    source: SourceArgs,
    query: QueryArgs,
    fields: Vec<String>,
    pair: Option<(String, String)>,
    percentile: Option<f64>,
    bucket_width: Option<f64>,
    json: bool,
    no_color: bool,
) -> Result<()> {
    if fields.is_empty() && pair.is_none() {
        bail!("Nothing to compute: pass --field and/or --x/--y");
    }
    if (percentile.is_some() || bucket_width.is_some()) && fields.is_empty() {
        bail!("--percentile and --bucket-width need a --field");
    }

    let store = load_store(&source)?;
    // Ordering never changes statistics, so the extract is computed unsorted
    let query = QueryArgs { sort: None, ..query };
    let request = build_request(&query, PageRequest::first(1))?;
    let records = extract(&store, &request).context("Failed to filter records")?;

    if !fields.is_empty() {
        let summary: BTreeMap<_, _> = fields
            .iter()
            .map(|field| (field.clone(), summarize(&records, field)))
            .collect();
        println!("{}", cli::format_summary(&summary, json, no_color));

        for field in &fields {
            let values: Vec<f64> = numeric_values(&records, field).collect();
            let five = FiveNumberSummary::compute(values.iter().copied());
            println!("{}", cli::format_five_number(field, five.as_ref(), json));
        }
    }

    if let Some(field) = fields.first() {
        let values: Vec<f64> = numeric_values(&records, field).collect();

        if let Some(value) = percentile {
            let rank = percentile_rank(value, &values)
                .with_context(|| format!("No numeric values in '{}'", field))?;
            if json {
                println!("{}", serde_json::json!({ "field": field, "value": value, "percentile_rank": rank }));
            } else {
                println!("Percentile rank of {} in {}: {:.1}", value, field, rank);
            }
        }

        if let Some(width) = bucket_width {
            let buckets = histogram(&values, width).context("Failed to build histogram")?;
            println!("{}", cli::format_histogram(&buckets, json, no_color));
        }
    }

    if let Some((x, y)) = pair {
        let report = correlation_report(&records, &x, &y);
        println!("{}", cli::format_correlation(&x, &y, report.as_ref(), json));
    }

    Ok(())
}

fn run_export(
    source: SourceArgs,
    query: QueryArgs,
    output: PathBuf,
    export_as: Option<String>,
) -> Result<()> {
    let store = load_store(&source)?;
    let request = build_request(&query, PageRequest::first(1))?;
    let records = extract(&store, &request).context("Failed to build extract")?;

    let format = match export_as.as_deref() {
        Some("json") => ExportFormat::Json,
        Some(_) => ExportFormat::Csv,
        None => ExportFormat::from_path(&output),
    };
    export_records(&records, store.schema(), &output, format)?;

    eprintln!(
        "Exported {} of {} records to {}",
        records.len(),
        store.len(),
        output.display()
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_watch(
    config: &ViewConfig,
    source: SourceArgs,
    query: QueryArgs,
    page: PageArgs,
    interval: Option<u64>,
    ticks: Option<u64>,
    json: bool,
    no_color: bool,
) -> Result<()> {
    let request = build_request(&query, config.page_request(page.page, page.page_size))?;
    let refresh_every = interval
        .map(std::time::Duration::from_secs)
        .unwrap_or_else(|| config.refresh_interval());
    if refresh_every.is_zero() {
        bail!("--interval must be positive");
    }

    let mut supplier = Supplier::from_args(&source);
    let hub = Arc::new(SnapshotHub::new(supplier.next_store()?));
    let mut events = hub.event_bus().subscribe();

    let mut renderer = WatchRenderer::new(request, json, no_color);
    renderer.render_latest(&hub).await?;

    // Refreshes run on their own task so a slow render never holds back the next snapshot
    let mut refresher = {
        let hub = Arc::clone(&hub);
        tokio::spawn(async move {
            let mut timer = tokio::time::interval(refresh_every);
            // First tick completes immediately; the initial snapshot is already live
            timer.tick().await;
            let mut refreshes = 0u64;
            while ticks.map_or(true, |limit| refreshes < limit) {
                timer.tick().await;
                match supplier.next_store() {
                    Ok(store) => {
                        hub.publish(store);
                    }
                    Err(e) => hub.report_failure(format!("{:#}", e)),
                }
                refreshes += 1;
            }
        })
    };

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(StoreEvent::Refreshed { generation, record_count }) => {
                    tracing::debug!(generation, record_count, "Snapshot refreshed");
                    renderer.render_latest(&hub).await?;
                }
                Ok(StoreEvent::RefreshFailed(message)) => {
                    tracing::warn!(%message, "Refresh failed");
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Render fell behind, jumping to the latest snapshot");
                    renderer.render_latest(&hub).await?;
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut refresher => {
                // The last publish may finish before its event is seen
                renderer.render_latest(&hub).await?;
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Stopped at generation {}", hub.generation());
                break;
            }
        }
    }

    refresher.abort();
    Ok(())
}

/// One computed watch frame, tagged with the snapshot it was built from
struct WatchFrame {
    generation: u64,
    store: Arc<RecordStore>,
    view: ViewModel,
    volume: Option<f64>,
}

/// Page and total volume from a single filtered extract
fn compute_frame(snapshot: Snapshot, request: &ViewRequest) -> tabview_core::Result<WatchFrame> {
    let ordered = extract(&snapshot.store, request)?;
    let volume = aggregate(&ordered, "volume", AggOp::Sum);
    let view = view_from_extract(&ordered, request)?;
    Ok(WatchFrame {
        generation: snapshot.generation,
        store: snapshot.store,
        view,
        volume,
    })
}

struct WatchRenderer {
    request: ViewRequest,
    json: bool,
    no_color: bool,
    previous_volume: Option<f64>,
    last_generation: Option<u64>,
}

impl WatchRenderer {
    fn new(request: ViewRequest, json: bool, no_color: bool) -> Self {
        Self {
            request,
            json,
            no_color,
            previous_volume: None,
            last_generation: None,
        }
    }

    /// Build and print a frame for the current snapshot
    ///
    /// The view is computed off the async runtime, so a refresh can land
    /// meanwhile; such a frame is dropped and the newer snapshot's event
    /// renders instead.
    async fn render_latest(&mut self, hub: &SnapshotHub) -> Result<()> {
        if self.last_generation == Some(hub.generation()) {
            return Ok(());
        }

        let snapshot = hub.current();
        let request = self.request.clone();
        let frame = tokio::task::spawn_blocking(move || compute_frame(snapshot, &request))
            .await
            .context("View task failed")?;

        match frame {
            Ok(frame) => {
                if let Some(output) = self.accept(frame, hub) {
                    println!("{}", output);
                }
                Ok(())
            }
            Err(e) if e.is_request_error() => Err(e).context("Invalid view parameters"),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to build view");
                Ok(())
            }
        }
    }

    /// Format `frame`, or `None` when a newer snapshot superseded it
    fn accept(&mut self, frame: WatchFrame, hub: &SnapshotHub) -> Option<String> {
        if !hub.is_current(frame.generation) {
            tracing::debug!(
                generation = frame.generation,
                latest = hub.generation(),
                "Dropping stale view"
            );
            return None;
        }

        let change = frame
            .volume
            .zip(self.previous_volume)
            .and_then(|(current, baseline)| percent_change(current, baseline));
        self.previous_volume = frame.volume;
        self.last_generation = Some(frame.generation);

        let table = cli::format_view(&frame.view, frame.store.schema(), self.json, self.no_color);
        if self.json {
            return Some(table);
        }
        Some(format!(
            "\n[generation {} · {}] volume {}\n{}",
            frame.generation,
            Utc::now().format("%H:%M:%S"),
            cli::format_change(change.as_ref()),
            table
        ))
    }
}

fn run_demo(records: usize, seed: u64, output: Option<PathBuf>) -> Result<()> {
    let store = DemoSupplier::new(seed, records).next_store(Utc::now());

    match output {
        Some(path) => {
            export_records(store.records(), store.schema(), &path, ExportFormat::Json)?;
            eprintln!("Wrote {} demo records to {}", store.len(), path.display());
        }
        None => {
            let json = serde_json::to_string_pretty(store.records())
                .context("Failed to serialize demo records")?;
            println!("{}", json);
        }
    }
    Ok(())
}
