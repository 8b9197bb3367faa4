use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use vizbot::client::InsightClient;
use vizbot::config::InsightConfig;
use vizbot::data::Table;
use vizbot::insight::EXPORT_FILE_NAME;
use vizbot::runtime;
use vizbot::schema;
use vizbot::session::InsightSession;
use vizbot::spec::{ChartKind, ChartRequest};

/// User-facing chart names, mapped onto the closed set of marks.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Bar,
    Scatter,
    Line,
    Pie,
    Box,
}

impl From<KindArg> for ChartKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Bar => ChartKind::Bar,
            KindArg::Scatter => ChartKind::Point,
            KindArg::Line => ChartKind::Line,
            KindArg::Pie => ChartKind::Arc,
            KindArg::Box => ChartKind::Boxplot,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "vizbot")]
#[command(about = "Build declarative chart specs from CSV data, with optional AI insights", long_about = None)]
struct Args {
    /// Chart type to build
    #[arg(long, value_enum)]
    kind: KindArg,

    /// X-axis column
    #[arg(long)]
    x: String,

    /// Y-axis column (required for bar, scatter, line and box)
    #[arg(long)]
    y: Option<String>,

    /// Categorical column for color differentiation
    #[arg(long)]
    color: Option<String>,

    /// CSV file to read; stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,

    /// Print descriptive statistics for the numeric columns to stderr
    #[arg(long)]
    describe: bool,

    /// Also generate AI insights and write them next to the spec
    #[arg(long)]
    insights: bool,

    /// Where to write the insight artifact
    #[arg(long, default_value = EXPORT_FILE_NAME)]
    insights_out: PathBuf,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let args = Args::parse();

    let table = read_table(args.input.as_deref())?;

    if args.describe {
        let stats = schema::describe(&table).context("Failed to compute statistics")?;
        eprintln!("{}", serde_json::to_string_pretty(&stats)?);
    }

    let request = ChartRequest {
        kind: args.kind.into(),
        x_column: args.x.clone(),
        y_column: args.y.clone(),
        color_column: args.color.clone(),
    };

    let insight_client = if args.insights {
        let config = InsightConfig::from_env().context(
            "Insight generation requested but the service is not configured",
        )?;
        Some(InsightClient::new(config))
    } else {
        None
    };

    let spec = runtime::generate_chart(&table, &request)
        .context("Failed to generate chart spec")?;

    // Chart spec to stdout for the renderer.
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, &spec).context("Failed to write chart spec")?;
    handle.write_all(b"\n")?;
    handle.flush().context("Failed to flush stdout")?;

    // Insight outcome is reported separately; a failure here never undoes
    // the chart above. The session guard mirrors what an interactive front
    // end does around the blocking call.
    if let Some(client) = insight_client {
        let mut session = InsightSession::new();
        if let Some(ticket) = session.begin() {
            let outcome = runtime::generate_insights(&client, &spec, &table, &request);
            if session.finish(&ticket) {
                match outcome {
                    Ok(result) => {
                        std::fs::write(&args.insights_out, result.to_export_json())
                            .with_context(|| {
                                format!("Failed to write {}", args.insights_out.display())
                            })?;
                        eprintln!("Insights written to {}", args.insights_out.display());
                    }
                    Err(e) => eprintln!("Insight generation failed: {}", e),
                }
            }
        }
    }

    Ok(())
}

fn read_table(input: Option<&std::path::Path>) -> Result<Table> {
    match input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Table::from_csv(file).context("Failed to read CSV")
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read CSV from stdin")?;
            Table::from_csv(buf.as_bytes()).context("Failed to read CSV")
        }
    }
}
