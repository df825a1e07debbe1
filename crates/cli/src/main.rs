mod render;

use std::fs;
use std::io::{self, Read as _};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use zpl_labels_core::preview::{labelary_url, render_html};
use zpl_labels_core::{
    BatchSource, GeometrySpec, LabelRecord, RecordField, TextEncoding, assemble, batch_document,
    encode, frame, load_geometry_from_str, validate_records,
};
use zpl_labels_print_client::{
    GatewayClient, GatewayConfig, Orchestrator, OrchestratorConfig, PreviewError, PreviewSink,
    PrintPhase,
};
use zpl_labels_profile::{MAX_DPI, MIN_DPI, load_profile_from_str};

use crate::render::{
    Format, print_json, print_printer_status, print_progress, print_report, print_summary,
};

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "zpl_labels=info";

/// Geometry used when neither `--geometry` nor the profile names one.
const DEFAULT_GEOMETRY: &str = "standard";

/// Exit code of a print run where only some labels printed.
const EXIT_PARTIAL: i32 = 2;

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "zpl-labels",
    version,
    about = "Encode coupon labels as ZPL II and print them through a print gateway"
)]
struct Cli {
    /// Output mode: "pretty" for human-readable output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

/// Label layout and printer resolution.
#[derive(Args, Debug)]
struct LayoutArgs {
    /// Built-in geometry name or path to a geometry JSON file.
    #[arg(long, short)]
    geometry: Option<String>,
    /// Printer resolution in dots per inch (default 203).
    #[arg(long, conflicts_with = "profile")]
    dpi: Option<u32>,
    /// Printer profile JSON; sets resolution and darkness.
    #[arg(long)]
    profile: Option<String>,
    /// Override the geometry's text encoding directive.
    #[arg(long, value_parser = ["utf8", "none"])]
    text_encoding: Option<String>,
}

/// Print gateway connection.
#[derive(Args, Debug)]
struct GatewayArgs {
    /// Print gateway base URL, e.g. http://localhost:8000.
    #[arg(long, env = "ZPL_LABELS_GATEWAY")]
    gateway: String,
    /// Request timeout in seconds.
    #[arg(long, default_value_t = 60)]
    timeout: u64,
    /// Attempts for transient failures (1 disables retries).
    #[arg(long, default_value_t = 3)]
    attempts: u32,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    // ── Offline ─────────────────────────────────────────────────────────
    /// Encode label records into ZPL frames.
    ///
    /// FILE is a JSON list of records, a single record, or a batch-service
    /// payload. Use "-" to read stdin.
    Encode {
        file: String,
        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Check that records encode into well-formed frames.
    Validate {
        file: String,
        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Build the gateway batch request without sending it.
    Assemble {
        file: String,
        /// Batch identifier; taken from the input when it is a batch payload.
        #[arg(long)]
        batch_id: Option<u64>,
        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Render a human-viewable preview.
    Preview {
        file: String,
        #[command(flatten)]
        layout: LayoutArgs,
        /// Write an HTML print document to this path.
        #[arg(long, conflicts_with = "labelary")]
        html: Option<PathBuf>,
        /// Print a Labelary image URL per label.
        #[arg(long)]
        labelary: bool,
    },

    /// List the built-in geometries.
    Geometries {
        /// Resolution used for the dot dimensions.
        #[arg(long, default_value_t = 203)]
        dpi: u32,
    },

    // ── Gateway ─────────────────────────────────────────────────────────
    /// Print a batch through the gateway.
    ///
    /// Exits 0 when every label printed, 2 on partial success, 1 otherwise.
    Print {
        file: String,
        /// Batch identifier; taken from the input when it is a batch payload.
        #[arg(long)]
        batch_id: Option<u64>,
        #[command(flatten)]
        layout: LayoutArgs,
        #[command(flatten)]
        gateway: GatewayArgs,
        /// Also write an HTML preview of the printed labels.
        #[arg(long)]
        preview_html: Option<PathBuf>,
    },

    /// Query the gateway's printer status.
    Status {
        #[command(flatten)]
        gateway: GatewayArgs,
    },
}

// ── Main ────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let format = Format::resolve_or_detect(cli.output.as_deref());

    match cli.cmd {
        Cmd::Encode { file, layout } => cmd_encode(&file, &layout, format)?,
        Cmd::Validate { file, layout } => cmd_validate(&file, &layout, format)?,
        Cmd::Assemble {
            file,
            batch_id,
            layout,
        } => cmd_assemble(&file, batch_id, &layout)?,
        Cmd::Preview {
            file,
            layout,
            html,
            labelary,
        } => cmd_preview(&file, &layout, html.as_deref(), labelary, format)?,
        Cmd::Geometries { dpi } => cmd_geometries(dpi, format)?,
        Cmd::Print {
            file,
            batch_id,
            layout,
            gateway,
            preview_html,
        } => cmd_print(&file, batch_id, &layout, &gateway, preview_html, format).await?,
        Cmd::Status { gateway } => cmd_status(&gateway, format).await?,
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

// ── Commands ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct EncodedFrame<'a> {
    unique_num: &'a str,
    zpl: String,
}

fn cmd_encode(file: &str, layout: &LayoutArgs, format: Format) -> Result<()> {
    let input = read_input(file)?;
    let config = resolve_layout(layout)?;
    validate_records(&input.records)?;

    match format {
        Format::Json => {
            let frames: Vec<_> = input
                .records
                .iter()
                .map(|r| EncodedFrame {
                    unique_num: &r.id,
                    zpl: encode(r, &config.geometry, config.dpi).into_string(),
                })
                .collect();
            let out = serde_json::json!({
                "geometry": config.geometry.name,
                "dpi": config.dpi,
                "frames": frames,
            });
            print_json(&out)?;
        }
        Format::Pretty => {
            println!(
                "{}",
                batch_document(&input.records, &config.geometry, config.dpi)
            );
            print_summary(input.records.len(), "label", "encoded");
        }
    }
    Ok(())
}

fn cmd_validate(file: &str, layout: &LayoutArgs, format: Format) -> Result<()> {
    let input = read_input(file)?;
    let config = resolve_layout(layout)?;

    let mut issues = Vec::new();
    if let Err(e) = config.geometry.validate() {
        issues.push(e.to_string());
    }
    if let Err(e) = validate_records(&input.records) {
        issues.push(e.to_string());
    }
    if issues.is_empty() {
        for (i, record) in input.records.iter().enumerate() {
            let zpl = encode(record, &config.geometry, config.dpi);
            if !frame::validate(zpl.as_str()) {
                issues.push(format!(
                    "label #{} ({}) produced a malformed frame",
                    i + 1,
                    record.id
                ));
            }
        }
    }
    let ok = issues.is_empty();

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "ok": ok,
                "labels": input.records.len(),
                "geometry": config.geometry.name,
                "dpi": config.dpi,
                "issues": issues,
            });
            print_json(&out)?;
        }
        Format::Pretty => {
            for issue in &issues {
                eprintln!("error: {issue}");
            }
            if ok {
                print_summary(input.records.len(), "label", "ok");
            }
        }
    }

    if !ok {
        process::exit(1);
    }
    Ok(())
}

fn cmd_assemble(file: &str, batch_id: Option<u64>, layout: &LayoutArgs) -> Result<()> {
    let input = read_input(file)?;
    let batch_id = resolve_batch_id(batch_id, &input)?;
    let config = resolve_layout(layout)?;
    let request = assemble(batch_id, &input.records, &config.geometry, config.dpi)?;
    // The request body is the artifact: always JSON.
    print_json(&request)
}

fn cmd_preview(
    file: &str,
    layout: &LayoutArgs,
    html: Option<&Path>,
    labelary: bool,
    format: Format,
) -> Result<()> {
    let input = read_input(file)?;
    let config = resolve_layout(layout)?;
    validate_records(&input.records)?;

    if let Some(path) = html {
        fs::write(path, render_html(&input.records, &config.geometry))
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        match format {
            Format::Json => print_json(&serde_json::json!({
                "html": path,
                "labels": input.records.len(),
            }))?,
            Format::Pretty => eprintln!("wrote {}", path.display()),
        }
        return Ok(());
    }
    if !labelary {
        bail!("choose a preview: --html <PATH> or --labelary");
    }

    let urls: Vec<_> = input
        .records
        .iter()
        .map(|r| {
            let zpl = encode(r, &config.geometry, config.dpi);
            serde_json::json!({
                "unique_num": r.id,
                "url": labelary_url(&zpl, &config.geometry, config.dpi),
            })
        })
        .collect();
    match format {
        Format::Json => print_json(&urls)?,
        Format::Pretty => {
            for u in &urls {
                println!(
                    "{}  {}",
                    u["unique_num"].as_str().unwrap_or_default(),
                    u["url"].as_str().unwrap_or_default()
                );
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct GeometryInfo {
    name: String,
    width_cm: f64,
    height_cm: f64,
    width_dots: u32,
    height_dots: u32,
    fields: usize,
    record_fields: Vec<&'static str>,
    text_encoding: bool,
}

fn cmd_geometries(dpi: u32, format: Format) -> Result<()> {
    check_dpi(dpi)?;
    let infos = GeometrySpec::builtin_names()
        .iter()
        .map(|name| -> Result<GeometryInfo> {
            let g = GeometrySpec::builtin(name)?;
            Ok(GeometryInfo {
                width_cm: g.width.to_cm(),
                height_cm: g.height.to_cm(),
                width_dots: g.width_dots(dpi),
                height_dots: g.height_dots(dpi),
                fields: g.fields.len(),
                record_fields: g
                    .record_fields()
                    .into_iter()
                    .map(RecordField::placeholder)
                    .collect(),
                text_encoding: g.text_encoding.is_some(),
                name: g.name,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    match format {
        Format::Json => print_json(&infos)?,
        Format::Pretty => {
            for g in &infos {
                println!(
                    "{:<14} {:>5.2} x {:<5.2} cm  {:>4} x {:<4} dots @ {dpi} dpi  {} fields{}",
                    g.name,
                    g.width_cm,
                    g.height_cm,
                    g.width_dots,
                    g.height_dots,
                    g.fields,
                    if g.text_encoding { "  ^CI28" } else { "" }
                );
            }
        }
    }
    Ok(())
}

async fn cmd_print(
    file: &str,
    batch_id: Option<u64>,
    layout: &LayoutArgs,
    gateway: &GatewayArgs,
    preview_html: Option<PathBuf>,
    format: Format,
) -> Result<()> {
    let input = read_input(file)?;
    let batch_id = resolve_batch_id(batch_id, &input)?;
    let config = resolve_layout(layout)?;
    let client = GatewayClient::new(gateway_config(gateway))?;

    let mut orchestrator = Orchestrator::new(client, config);
    if let Some(path) = preview_html {
        orchestrator = orchestrator.with_preview(Arc::new(HtmlPreview { path }));
    }

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling dispatch");
                cancel.cancel();
            }
        })
    };
    let progress = (format == Format::Pretty).then(|| {
        let mut rx = orchestrator.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                print_progress(&rx.borrow_and_update());
            }
        })
    });

    let outcome = orchestrator
        .print_batch_with_cancel(batch_id, &input.records, &cancel)
        .await;
    interrupt.abort();
    if let Some(task) = progress {
        task.abort();
    }

    let report = outcome?;
    print_report(&report, format)?;
    match report.phase {
        PrintPhase::Completed => Ok(()),
        PrintPhase::PartialSuccess => process::exit(EXIT_PARTIAL),
        _ => process::exit(1),
    }
}

async fn cmd_status(gateway: &GatewayArgs, format: Format) -> Result<()> {
    let client = GatewayClient::new(gateway_config(gateway))?;
    let status = client
        .printer_status(&CancellationToken::new())
        .await
        .with_context(|| format!("failed to query {}", client.config().status_url()))?;
    print_printer_status(&status, format)
}

// ── Preview sink ────────────────────────────────────────────────────────

/// Writes the HTML print document after a dispatched batch.
struct HtmlPreview {
    path: PathBuf,
}

#[async_trait]
impl PreviewSink for HtmlPreview {
    async fn render(
        &self,
        records: &[LabelRecord],
        geometry: &GeometrySpec,
    ) -> Result<(), PreviewError> {
        tokio::fs::write(&self.path, render_html(records, geometry)).await?;
        info!(path = %self.path.display(), labels = records.len(), "preview written");
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Records to encode, plus the batch id when the input carried one.
struct Input {
    batch_id: Option<u64>,
    records: Vec<LabelRecord>,
}

/// Read `file` ("-" for stdin) as a record list, a single record, or a
/// batch-service payload.
fn read_input(file: &str) -> Result<Input> {
    let text = if file == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        fs::read_to_string(file).with_context(|| format!("failed to read '{file}'"))?
    };
    parse_input(&text).with_context(|| format!("'{file}' is not a label record list or batch"))
}

fn parse_input(text: &str) -> Result<Input> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if value.get("qr_codes").is_some() {
        let source: BatchSource = serde_json::from_value(value)?;
        return Ok(Input {
            batch_id: Some(source.batch_id),
            records: source.to_records(),
        });
    }
    let records = if value.is_object() {
        vec![serde_json::from_value(value)?]
    } else {
        serde_json::from_value(value)?
    };
    Ok(Input {
        batch_id: None,
        records,
    })
}

fn resolve_batch_id(explicit: Option<u64>, input: &Input) -> Result<u64> {
    explicit
        .or(input.batch_id)
        .context("--batch-id is required when the input is a plain record list")
}

/// Build the encoding settings from `--geometry`, `--dpi`, `--profile` and
/// `--text-encoding`.
fn resolve_layout(args: &LayoutArgs) -> Result<OrchestratorConfig> {
    let profile = match &args.profile {
        Some(path) => {
            let text =
                fs::read_to_string(path).with_context(|| format!("failed to read '{path}'"))?;
            Some(load_profile_from_str(&text).with_context(|| format!("invalid profile '{path}'"))?)
        }
        None => None,
    };

    let name = args
        .geometry
        .as_deref()
        .or_else(|| profile.as_ref().and_then(|p| p.default_geometry.as_deref()))
        .unwrap_or(DEFAULT_GEOMETRY);
    let mut geometry = load_geometry(name)?;
    match args.text_encoding.as_deref() {
        Some("utf8") => geometry = geometry.with_text_encoding(Some(TextEncoding::Utf8)),
        Some(_) => geometry = geometry.with_text_encoding(None),
        None => {}
    }

    let mut config = OrchestratorConfig::default().with_geometry(geometry);
    if let Some(dpi) = args.dpi {
        check_dpi(dpi)?;
        config.dpi = dpi;
    }
    if let Some(profile) = &profile {
        config = config.with_profile(profile)?;
    }
    Ok(config)
}

/// A built-in geometry by name, or a geometry JSON file.
fn load_geometry(name: &str) -> Result<GeometrySpec> {
    if GeometrySpec::builtin_names().contains(&name) {
        return Ok(GeometrySpec::builtin(name)?);
    }
    if !Path::new(name).exists() {
        bail!(
            "unknown geometry '{name}' (built-in: {})",
            GeometrySpec::builtin_names().join(", ")
        );
    }
    let text = fs::read_to_string(name).with_context(|| format!("failed to read '{name}'"))?;
    load_geometry_from_str(&text).with_context(|| format!("invalid geometry file '{name}'"))
}

fn check_dpi(dpi: u32) -> Result<()> {
    if !(MIN_DPI..=MAX_DPI).contains(&dpi) {
        bail!("dpi {dpi} is outside the supported range {MIN_DPI}-{MAX_DPI}");
    }
    Ok(())
}

fn gateway_config(args: &GatewayArgs) -> GatewayConfig {
    let mut config = GatewayConfig::new(args.gateway.clone());
    config.timeouts.request = Duration::from_secs(args.timeout);
    config.retry.max_attempts = args.attempts;
    config
}
