//! CLI entry point for datapub.
//!
//! Provides subcommands for inspecting scatter charts against live variable
//! data, exporting and publishing datasets, and editing tags through the
//! admin API.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use datapub::admin::tags::load_tag;
use datapub::admin::{AdminClient, TagEditor};
use datapub::config::Settings;
use datapub::export::DatasetDump;
use datapub::fetch::{BasicClient, VariableStore};
use datapub::output::{print_json, print_pretty, write_export};
use datapub::publish::publish_dataset;
use datapub::scatter::{AggregationCache, ChartConfig, Interaction, ScatterView};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "datapub")]
#[command(about = "Scatter chart data and dataset export tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a scatter chart's data and print the current frame
    Scatter {
        /// Chart definition (JSON)
        #[arg(short, long)]
        chart: PathBuf,

        /// First year of the window (defaults to the chart's range)
        #[arg(long, requires = "end")]
        start: Option<i32>,

        /// Last year of the window (defaults to the chart's range)
        #[arg(long, requires = "start")]
        end: Option<i32>,

        /// Highlight the series with this legend color
        #[arg(long)]
        focus_color: Option<String>,

        /// Show the tooltip for this entity
        #[arg(long)]
        hover: Option<String>,
    },
    /// Print the timeline years available for a scatter chart
    Years {
        /// Chart definition (JSON)
        #[arg(short, long)]
        chart: PathBuf,
    },
    /// Write a dataset's CSV and datapackage.json
    Export {
        /// Dataset dump (JSON)
        #[arg(short, long)]
        dump: PathBuf,

        /// Directory to write files into
        #[arg(short, long, default_value = "exports")]
        output_dir: PathBuf,
    },
    /// Upload a dataset's CSV and datapackage.json to S3
    Publish {
        /// Dataset dump (JSON)
        #[arg(short, long)]
        dump: PathBuf,

        /// S3 bucket name (e.g., "my-bucket")
        #[arg(long)]
        s3_bucket: String,

        /// Gzip compress the CSV before uploading
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Inspect or edit a tag
    Tag {
        #[command(subcommand)]
        action: TagAction,
    },
}

#[derive(Subcommand, Debug)]
enum TagAction {
    /// Show a tag and its datasets
    Show { id: i64 },
    /// Rename a tag
    Rename { id: i64, name: String },
    /// Delete a tag
    Delete {
        id: i64,

        /// Confirm the deletion
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/datapub.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("datapub.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    match cli.command {
        Commands::Scatter {
            chart,
            start,
            end,
            focus_color,
            hover,
        } => {
            let mut chart = load_chart(&chart)?;
            if let (Some(start), Some(end)) = (start, end) {
                chart.set_time_range(start, end);
            }

            let mut store = VariableStore::new(
                BasicClient::new()?,
                settings.data_endpoint(chart.cache_tag.as_deref()),
            );
            store.update(&chart.variable_ids()).await?;

            let mut cache = AggregationCache::new();
            let frame = ScatterView::new(&chart, store.data()).render(&mut cache);
            if frame.is_empty() {
                warn!(title = %chart.title, "No data for the selected time range");
            }
            print_pretty(&frame);
            print_json(&frame)?;

            let interaction = Interaction {
                focus_color,
                hover_key: hover,
            };
            let focus_keys = frame.focus_keys(&chart, &interaction);
            if let Some(shapes) = frame.shape_legend(&focus_keys, &interaction) {
                print_json(&shapes)?;
            }
            if let Some(tooltip) = frame.tooltip(&focus_keys, &interaction) {
                print_json(&tooltip)?;
            }
        }
        Commands::Years { chart } => {
            let chart = load_chart(&chart)?;
            let mut store = VariableStore::new(
                BasicClient::new()?,
                settings.data_endpoint(chart.cache_tag.as_deref()),
            );
            store.update(&chart.variable_ids()).await?;

            let years = ScatterView::new(&chart, store.data()).timeline_years();
            info!(
                count = years.len(),
                first = ?years.first(),
                last = ?years.last(),
                "Timeline years"
            );
            print_json(&years)?;
        }
        Commands::Export { dump, output_dir } => {
            let dump = DatasetDump::load(&dump)?;
            write_export(&output_dir, &dump)?;
        }
        Commands::Publish {
            dump,
            s3_bucket,
            gzip,
        } => {
            if s3_bucket.is_empty() {
                bail!("S3 bucket name must not be empty");
            }
            let dump = DatasetDump::load(&dump)?;
            let config = aws_config::load_from_env().await;
            let s3 = aws_sdk_s3::Client::new(&config);
            publish_dataset(&s3, &s3_bucket, &dump, gzip).await?;
        }
        Commands::Tag { action } => {
            let admin = AdminClient::new(BasicClient::new()?, settings.base_url.clone());
            run_tag_action(&admin, action).await?;
        }
    }

    Ok(())
}

fn load_chart(path: &Path) -> Result<ChartConfig> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read chart {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse chart {}", path.display()))
}

#[tracing::instrument(skip(admin))]
async fn run_tag_action(admin: &AdminClient<BasicClient>, action: TagAction) -> Result<()> {
    match action {
        TagAction::Show { id } => {
            let tag = load_tag(admin, id).await?;
            info!(tag_id = tag.id, name = %tag.name, updated_at = %tag.updated_at, "Tag");
            for dataset in &tag.datasets {
                info!(
                    dataset_id = dataset.id,
                    namespace = %dataset.namespace,
                    name = %dataset.name,
                    tags = ?dataset.tag_names(),
                    "Dataset"
                );
            }
        }
        TagAction::Rename { id, name } => {
            let mut editor = TagEditor::new(load_tag(admin, id).await?);
            editor.draft_mut().name = name;
            if !editor.is_modified() {
                info!("Name unchanged, nothing to save");
                return Ok(());
            }
            if !editor.save(admin).await? {
                bail!("Server did not accept the tag update");
            }
        }
        TagAction::Delete { id, yes } => {
            let mut editor = TagEditor::new(load_tag(admin, id).await?);
            if !yes {
                warn!("{} Re-run with --yes to confirm.", editor.delete_confirmation());
                return Ok(());
            }
            if !editor.delete(admin).await? {
                bail!("Server did not accept the tag deletion");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scatter_window_needs_both_bounds() {
        assert!(Cli::try_parse_from(["datapub", "scatter", "-c", "chart.json", "--start", "2001"]).is_err());
        assert!(Cli::try_parse_from(["datapub", "scatter", "-c", "chart.json", "--end", "2005"]).is_err());

        let cli = Cli::try_parse_from([
            "datapub", "scatter", "-c", "chart.json", "--start", "2001", "--end", "2005",
        ])
        .unwrap();
        match cli.command {
            Commands::Scatter { start, end, .. } => assert_eq!((start, end), (Some(2001), Some(2005))),
            _ => panic!("expected scatter command"),
        }
    }

    #[test]
    fn test_scatter_window_is_optional() {
        let cli = Cli::try_parse_from(["datapub", "scatter", "-c", "chart.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Scatter { start: None, end: None, .. }));
    }
}
