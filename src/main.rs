//! Finboard CLI - personal API dashboard

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use futures::stream::{select_all, StreamExt};
use tokio_stream::wrappers::WatchStream;
use tracing_subscriber::EnvFilter;

use finboard::error::{FetchError, FinboardError, FixSuggestion};
use finboard::fetch::FetchCache;
use finboard::format::{raw_text, DataFormat};
use finboard::path::{discover_lists, flatten_to_strings, infer_columns, resolve_path, DisplayKind, Path};
use finboard::store::{validate_endpoint, CardField, WidgetConfig, WidgetDraft, WidgetKind, WidgetStore};
use finboard::widget::{render, ChartView, PollHandle, TableView, WidgetPoller, WidgetState, WidgetView};
use finboard::{EventLog, FinboardConfig};

const VALUE_PREVIEW_LEN: usize = 60;

#[derive(Parser)]
#[command(name = "finboard")]
#[command(about = "Finboard - personal API dashboard")]
#[command(version)]
struct Cli {
    /// Directory holding finboard-storage.json (overrides config and FINBOARD_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured widgets
    List,

    /// Add a widget
    Add {
        #[command(flatten)]
        widget: WidgetArgs,
    },

    /// Change a widget in place (id and position are kept)
    Edit {
        id: String,

        #[command(flatten)]
        widget: WidgetArgs,
    },

    /// Remove a widget
    Remove { id: String },

    /// Move a widget to the position of another
    Move { id: String, over: String },

    /// Write all widgets to a JSON file
    Export { file: PathBuf },

    /// Replace all widgets with the contents of a JSON file
    Import { file: PathBuf },

    /// Fetch a URL and show its field paths and lists
    Inspect {
        url: String,

        /// Column inference mode (table, chart)
        #[arg(long, default_value = "table")]
        kind: WidgetKind,
    },

    /// Fetch once and render widgets
    Show { id: Option<String> },

    /// Poll widgets and reprint on every change (Ctrl-C to stop)
    Watch { id: Option<String> },
}

#[derive(Args)]
struct WidgetArgs {
    #[arg(long)]
    title: Option<String>,

    /// Absolute http(s) URL returning JSON
    #[arg(long)]
    endpoint: Option<String>,

    /// card, table or chart
    #[arg(long = "type")]
    kind: Option<WidgetKind>,

    /// Card field as PATH[=LABEL] (repeatable), e.g. data-->rates-->INR=INR
    #[arg(long = "field")]
    fields: Vec<String>,

    /// Path of the list shown by tables and charts
    #[arg(long)]
    data_key: Option<String>,

    /// Table/chart column (repeatable)
    #[arg(long = "column")]
    columns: Vec<String>,

    /// raw, currency, percentage or number
    #[arg(long)]
    format: Option<DataFormat>,

    /// Skip the preview fetch that seeds cached data and infers columns
    #[arg(long)]
    no_seed: bool,
}

impl WidgetArgs {
    fn apply(&self, draft: &mut WidgetDraft) {
        if let Some(title) = &self.title {
            draft.title = title.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            draft.api_endpoint = endpoint.clone();
        }
        if let Some(kind) = self.kind {
            draft.kind = kind;
        }
        if !self.fields.is_empty() {
            draft.card_fields = self.fields.iter().map(|f| parse_field(f)).collect();
        }
        if let Some(data_key) = &self.data_key {
            draft.data_key = Some(Path::parse(data_key));
        }
        if !self.columns.is_empty() {
            draft.columns = self.columns.clone();
        }
        if let Some(format) = self.format {
            draft.data_format = format;
        }
    }
}

fn parse_field(raw: &str) -> CardField {
    match raw.split_once('=') {
        Some((path, label)) => CardField::new(path, label),
        None => CardField::new(raw, ""),
    }
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    // Initialize tracing (stderr, quiet unless RUST_LOG says otherwise)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        if let Some(suggestion) = fix_suggestion(&e) {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn fix_suggestion(err: &anyhow::Error) -> Option<&str> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<FinboardError>() {
            e.fix_suggestion()
        } else {
            cause
                .downcast_ref::<FetchError>()
                .and_then(|e| e.fix_suggestion())
        }
    })
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = FinboardConfig::load()?;
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = Some(dir);
    }
    let storage = config.storage_path();
    let mut store = WidgetStore::open(&storage)
        .with_context(|| format!("failed to open widget store {}", storage.display()))?;

    match cli.command {
        Commands::List => list_widgets(&store),
        Commands::Add { widget } => add_widget(&mut store, &config, widget).await,
        Commands::Edit { id, widget } => edit_widget(&mut store, &config, &id, widget).await,
        Commands::Remove { id } => {
            let removed = store.remove(&id)?;
            println!("{} Removed '{}' ({})", "✓".green(), removed.title, id);
            Ok(())
        }
        Commands::Move { id, over } => {
            store.reorder(&id, &over)?;
            println!("{} Moved {} to the position of {}", "✓".green(), id, over);
            Ok(())
        }
        Commands::Export { file } => {
            let count = store.export(&file)?;
            println!("{} Exported {} widgets to {}", "✓".green(), count, file.display());
            Ok(())
        }
        Commands::Import { file } => {
            let count = store
                .import(&file)
                .with_context(|| format!("could not import {}", file.display()))?;
            println!("{} Imported {} widgets from {}", "✓".green(), count, file.display());
            Ok(())
        }
        Commands::Inspect { url, kind } => inspect(&config, &url, display_kind(kind)).await,
        Commands::Show { id } => show(&store, &config, id.as_deref()).await,
        Commands::Watch { id } => watch(&store, &config, id.as_deref()).await,
    }
}

fn build_cache(config: &FinboardConfig) -> Result<FetchCache> {
    let cache = FetchCache::from_config(config, EventLog::new())?;
    tracing::debug!(
        transport = cache.transport_name(),
        freshness_ms = cache.freshness_window().as_millis() as u64,
        "fetch cache ready"
    );
    Ok(cache)
}

fn display_kind(kind: WidgetKind) -> DisplayKind {
    match kind {
        WidgetKind::Chart => DisplayKind::Chart,
        WidgetKind::Card | WidgetKind::Table => DisplayKind::Table,
    }
}

// ============================================================================
// WIDGET MANAGEMENT
// ============================================================================

fn list_widgets(store: &WidgetStore) -> Result<()> {
    if store.is_empty() {
        println!("No widgets configured. Add one with `finboard add`.");
        return Ok(());
    }
    for (position, widget) in store.widgets().iter().enumerate() {
        println!(
            "{:>2}. {} {} {}",
            position + 1,
            widget.id.dimmed(),
            widget.title.bold(),
            format!("[{}]", widget.kind).cyan()
        );
        println!("    {}", widget.api_endpoint);
    }
    Ok(())
}

async fn add_widget(store: &mut WidgetStore, config: &FinboardConfig, args: WidgetArgs) -> Result<()> {
    let title = args.title.clone().context("--title is required")?;
    let endpoint = args.endpoint.clone().context("--endpoint is required")?;

    let mut draft = WidgetDraft::new(title, endpoint);
    args.apply(&mut draft);
    if !args.no_seed {
        seed(&mut draft, config).await?;
    }

    let id = store.add(draft)?;
    println!("{} Added widget {}", "✓".green(), id.bold());
    Ok(())
}

async fn edit_widget(
    store: &mut WidgetStore,
    config: &FinboardConfig,
    id: &str,
    args: WidgetArgs,
) -> Result<()> {
    let existing = store
        .get(id)
        .ok_or_else(|| FinboardError::WidgetNotFound { id: id.to_string() })?;
    let mut draft = WidgetDraft::from(existing);
    args.apply(&mut draft);
    if !args.no_seed {
        seed(&mut draft, config).await?;
    }

    store.update(id, draft)?;
    println!("{} Updated widget {}", "✓".green(), id.bold());
    Ok(())
}

/// Fetch a preview, store it as cached data and fill in missing columns
async fn seed(draft: &mut WidgetDraft, config: &FinboardConfig) -> Result<()> {
    validate_endpoint(&draft.api_endpoint)?;
    let payload = build_cache(config)?
        .get(&draft.api_endpoint)
        .await
        .with_context(|| {
            format!(
                "preview fetch of {} failed (pass --no-seed to skip it)",
                draft.api_endpoint
            )
        })?;

    if draft.kind != WidgetKind::Card && draft.columns.is_empty() {
        let kind = display_kind(draft.kind);
        match &draft.data_key {
            Some(path) => {
                if let Some(list) = resolve_path(&payload, path) {
                    draft.columns = infer_columns(list, kind);
                }
            }
            None => {
                // Longest list wins, first one on ties
                if let Some(best) = discover_lists(&payload, kind)
                    .into_iter()
                    .rev()
                    .max_by_key(|list| list.len)
                {
                    draft.data_key = Some(best.path);
                    draft.columns = best.columns;
                }
            }
        }
    }

    draft.initial_data = Some(payload);
    Ok(())
}

// ============================================================================
// FETCH + RENDER
// ============================================================================

async fn inspect(config: &FinboardConfig, url: &str, kind: DisplayKind) -> Result<()> {
    validate_endpoint(url)?;
    let payload = build_cache(config)?.get(url).await?;

    println!("{}", "Fields:".cyan().bold());
    for (path, value) in flatten_to_strings(&payload) {
        let path = if path.is_empty() { "(root)".to_string() } else { path };
        println!("  {} = {}", path, preview(&raw_text(value)));
    }

    let lists = discover_lists(&payload, kind);
    println!("{}", "Lists:".cyan().bold());
    if lists.is_empty() {
        println!("  {}", "none".dimmed());
    }
    for list in lists {
        let path = if list.path.is_root() {
            "(root)".to_string()
        } else {
            list.path.to_string()
        };
        println!("  {} {}", path.bold(), format!("({:?}, {} items)", list.shape, list.len).dimmed());
        println!("    columns: {}", list.columns.join(", "));
    }
    Ok(())
}

fn preview(text: &str) -> String {
    if text.chars().count() <= VALUE_PREVIEW_LEN {
        return text.to_string();
    }
    let cut: String = text.chars().take(VALUE_PREVIEW_LEN).collect();
    format!("{cut}…")
}

fn select_widgets(store: &WidgetStore, id: Option<&str>) -> Result<Vec<WidgetConfig>> {
    match id {
        Some(id) => {
            let widget = store
                .get(id)
                .ok_or_else(|| FinboardError::WidgetNotFound { id: id.to_string() })?;
            Ok(vec![widget.clone()])
        }
        None => Ok(store.widgets().to_vec()),
    }
}

async fn show(store: &WidgetStore, config: &FinboardConfig, id: Option<&str>) -> Result<()> {
    let widgets = select_widgets(store, id)?;
    if widgets.is_empty() {
        println!("No widgets configured. Add one with `finboard add`.");
        return Ok(());
    }

    // Widgets sharing an endpoint share one request
    let cache = build_cache(config)?;
    let results =
        futures::future::join_all(widgets.iter().map(|w| cache.get(&w.api_endpoint))).await;

    for (widget, result) in widgets.iter().zip(results) {
        let state = match result {
            Ok(data) => WidgetState {
                data: Some(data),
                ..Default::default()
            },
            Err(err) => WidgetState {
                data: widget.cached_data.clone(),
                error: Some(err),
                ..Default::default()
            },
        };
        print_widget(widget, &state);
    }
    Ok(())
}

async fn watch(store: &WidgetStore, config: &FinboardConfig, id: Option<&str>) -> Result<()> {
    let widgets = select_widgets(store, id)?;
    if widgets.is_empty() {
        println!("No widgets configured. Add one with `finboard add`.");
        return Ok(());
    }

    let poller = WidgetPoller::with_interval(build_cache(config)?, config.poll_interval());
    let handles: Vec<PollHandle> = widgets.iter().map(|w| poller.spawn(w)).collect();
    let mut updates = select_all(handles.iter().enumerate().map(|(index, handle)| {
        WatchStream::new(handle.subscribe()).map(move |state| (index, state))
    }));

    println!(
        "{} Watching {} widgets every {}s (Ctrl-C to stop)",
        "→".cyan(),
        widgets.len(),
        poller.interval().as_secs()
    );

    loop {
        tokio::select! {
            Some((index, state)) = updates.next() => {
                if !state.loading {
                    print_widget(&widgets[index], &state);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    drop(handles);
    println!("{} Stopped", "✓".green());
    Ok(())
}

fn print_widget(widget: &WidgetConfig, state: &WidgetState) {
    println!(
        "{} {} {}",
        "■".cyan(),
        widget.title.bold(),
        format!("[{}] {}", widget.kind, widget.id).dimmed()
    );
    if let Some(err) = &state.error {
        println!("  {} {}", "!".red().bold(), err);
    }

    let Some(data) = &state.data else {
        let text = if state.loading { "Loading..." } else { "No data" };
        println!("  {}", text.dimmed());
        return;
    };

    match render(widget, Some(data)) {
        WidgetView::Card(card) => {
            if let Some(message) = card.message() {
                println!("  {}", message.dimmed());
            }
            for line in card.lines {
                println!("  {}: {}", line.label, line.value.bold());
            }
        }
        WidgetView::Table(table) => print_table(&table),
        WidgetView::Chart(chart) => print_chart(&chart),
    }
    println!();
}

fn print_table(table: &TableView) {
    let page = table.page("", 1);
    if let Some(message) = &page.message {
        println!("  {}", message.dimmed());
        return;
    }

    let mut header = vec!["#".to_string()];
    header.extend(table.columns.iter().cloned());
    let mut lines = vec![header];
    for row in &page.rows {
        let mut line = vec![row.key.clone()];
        line.extend(row.cells.iter().cloned());
        lines.push(line);
    }

    let widths: Vec<usize> = (0..lines[0].len())
        .map(|col| {
            lines
                .iter()
                .map(|line| line.get(col).map_or(0, |cell| cell.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    for (n, line) in lines.iter().enumerate() {
        let text = line
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        if n == 0 {
            println!("  {}", text.bold());
        } else {
            println!("  {text}");
        }
    }
    if page.total_pages > 1 {
        println!(
            "  {}",
            format!("Page {} of {} ({} rows)", page.page, page.total_pages, page.matched).dimmed()
        );
    }
}

fn print_chart(chart: &ChartView) {
    if let Some(message) = chart.message() {
        println!("  {}", message.dimmed());
        return;
    }
    for (i, label) in chart.labels.iter().enumerate() {
        let points = chart
            .series
            .iter()
            .map(|s| {
                let value = s.points[i].map_or_else(|| "·".to_string(), |v| v.to_string());
                format!("{}={}", s.name, value)
            })
            .collect::<Vec<_>>()
            .join("  ");
        println!("  {:<12} {}", label, points);
    }
}
