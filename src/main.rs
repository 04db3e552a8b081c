use clap::{Parser, Subcommand};
use operator_kpi::{
    config::Settings,
    models::{KpiEngineError, KpiFilter, MetricKind, Period, ReportingWindow},
    scoring::TierCalculator,
    source::{JsonDatasetSource, JsonFileSink, KpiService, MemorySink, TierSink},
    telemetry,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[clap(name = "operator-kpi")]
#[clap(about = "KPI reports and customer tiers for gaming operators", long_about = None)]
struct Cli {
    /// Settings file, overrides config/default and config/local
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive KPIs for one month, optionally compared with the month before
    Report {
        /// JSON dataset of daily transaction rows
        #[clap(short, long)]
        data: PathBuf,

        #[clap(long)]
        currency: Option<String>,

        /// Brand line
        #[clap(long)]
        line: Option<String>,

        #[clap(short, long)]
        year: i32,

        #[clap(short, long)]
        month: u32,

        /// Include the prior month and a month-over-month comparison
        #[clap(long)]
        compare: bool,
    },

    /// Score and classify every customer active in a month
    Tiers {
        #[clap(short, long)]
        data: PathBuf,

        #[clap(long)]
        currency: Option<String>,

        #[clap(long)]
        line: Option<String>,

        #[clap(short, long)]
        year: i32,

        #[clap(short, long)]
        month: u32,

        /// Write the assignments here as JSON
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Look up the points for a single metric value
    Score {
        /// DA, GGR, PF, ATV or WIN_RATE
        #[clap(short, long)]
        metric: String,

        #[clap(short, long)]
        value: f64,
    },

    /// Map total and potential scores to tiers
    Classify {
        #[clap(short, long)]
        total: f64,

        #[clap(short, long, default_value_t = 0.0)]
        potential: f64,
    },

    /// Print the effective settings
    CheckConfig,
}

fn load_settings(path: Option<&PathBuf>) -> (Settings, Option<KpiEngineError>) {
    let loaded = match path {
        Some(path) => Settings::from_file(path),
        None => Settings::new(),
    };
    match loaded {
        Ok(settings) => (settings, None),
        Err(e) => (Settings::default(), Some(e)),
    }
}

fn build_filter(settings: &Settings, currency: Option<String>, line: Option<String>) -> KpiFilter {
    KpiFilter::new(
        currency.or_else(|| settings.source.default_currency.clone()),
        line.or_else(|| settings.source.default_line.clone()),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (settings, load_error) = load_settings(cli.config.as_ref());
    telemetry::init(&settings.app.log_level)?;

    if let Some(e) = load_error {
        if cli.config.is_some() {
            error!("Failed to load settings: {}", e);
            return Err(anyhow::anyhow!(e));
        }
        warn!("Using default settings: {}", e);
    }

    if let Err(e) = settings.validate() {
        error!("Invalid settings: {}", e);
        return Err(anyhow::anyhow!(e));
    }

    match cli.command {
        Commands::Report {
            data,
            currency,
            line,
            year,
            month,
            compare,
        } => {
            let filter = build_filter(&settings, currency, line);
            let window = ReportingWindow::month(year, month)?;

            let source = Arc::new(JsonDatasetSource::from_path(&data).await?);
            let service = KpiService::new(source, &settings)?;

            let report = service.period_report(&filter, &window, compare).await?;
            info!(
                "Report ready for {}/{} {}",
                filter.currency_label(),
                filter.line_label(),
                window
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Tiers {
            data,
            currency,
            line,
            year,
            month,
            output,
        } => {
            let filter = build_filter(&settings, currency, line);
            let period = Period::new(year, month)?;

            let source = Arc::new(JsonDatasetSource::from_path(&data).await?);
            let service = KpiService::new(source, &settings)?;

            let sink: Box<dyn TierSink> = match output {
                Some(path) => Box::new(JsonFileSink::new(path)),
                None => Box::new(MemorySink::new()),
            };

            let assignments = service.assign_tiers(&filter, period, sink.as_ref()).await?;
            println!("{}", serde_json::to_string_pretty(&assignments)?);
        }

        Commands::Score { metric, value } => {
            let kind: MetricKind = metric.parse()?;
            let calculator = TierCalculator::from_settings(&settings.scoring)?;

            let score = calculator.score_metric(kind, value);
            println!("{} {} -> {}", kind.as_str(), value, serde_json::to_string(&score)?);
        }

        Commands::Classify { total, potential } => {
            let calculator = TierCalculator::from_settings(&settings.scoring)?;
            let classification = calculator.classifier().classify(total, potential);
            println!("{}", serde_json::to_string_pretty(&classification)?);
        }

        Commands::CheckConfig => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}
