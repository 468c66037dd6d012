use crate::analyzers::DistanceKind;
use crate::readers::ColumnLayout;
use crate::utils::filename::ExportFormat;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "footfall-analytics")]
#[command(about = "Building foot-traffic and access-control analytics")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Settings file [default: footfall.toml when present]"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, help = "Visit CSV column layout")]
    pub layout: Option<ColumnLayout>,

    #[arg(long, global = true, help = "Print JSON instead of tables")]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TrafficView {
    /// Traffic per calendar day over a date window
    #[default]
    Daily,
    /// Foot traffic per reporting period, one line per building
    Series,
    /// Month-by-month heat grid per year for one building
    Yearly,
    /// Expected visitors per hour of the business day
    Hourly,
    /// Weekday-weighted calendar of one month for one building
    Calendar,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score buildings against their region and time-frame peers
    Score {
        #[arg(short, long, help = "Visit CSV or JSON export")]
        input: Option<PathBuf>,

        #[arg(short, long, help = "Score a single building by id")]
        building: Option<String>,

        #[arg(long, help = "Show score history per reporting period")]
        history: bool,

        #[arg(long)]
        max_workers: Option<usize>,
    },

    /// Latest score per building, best first
    Leaderboard {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short = 'n', long, default_value = "10")]
        top: usize,
    },

    /// Chart-ready foot-traffic aggregations
    Traffic {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = TrafficView::Daily)]
        view: TrafficView,

        #[arg(short, long)]
        building: Option<String>,

        #[arg(long, help = "Window start (YYYY-MM-DD) [default: earliest start date]")]
        from: Option<NaiveDate>,

        #[arg(long, help = "Window end (YYYY-MM-DD) [default: latest end date]")]
        to: Option<NaiveDate>,

        #[arg(long, help = "Calendar year")]
        year: Option<i32>,

        #[arg(long, help = "Calendar month (1-12)")]
        month: Option<u32>,
    },

    /// Visitors by distance from home or work
    Distance {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long)]
        building: Option<String>,

        #[arg(long, value_enum, default_value_t = DistanceKind::Home)]
        kind: DistanceKind,

        #[arg(long, help = "Scale home distances to long-stay visitors")]
        workers: bool,
    },

    /// Overall and market rank plus weekly statistics for one building
    Rankings {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long)]
        building: String,
    },

    /// Dataset profile and dashboard headline metrics
    Summary {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long)]
        to: Option<NaiveDate>,

        #[arg(long, help = "Drop periods starting on a weekend")]
        exclude_weekends: bool,
    },

    /// Report data-quality problems without modifying anything
    Validate {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(long, help = "Allowed weekday-sum drift in percentage points")]
        tolerance: Option<f64>,
    },

    /// Aggregated tenant badge activity
    Tenants {
        #[arg(short, long, help = "Tenant activity JSON export")]
        input: PathBuf,

        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long)]
        to: Option<NaiveDate>,

        #[arg(short, long)]
        tenant: Option<String>,

        #[arg(short, long, help = "Property summary for one building")]
        property: Option<String>,
    },

    /// Statistics over raw access-control events
    Events {
        #[arg(short, long, help = "Raw access event CSV")]
        input: PathBuf,

        #[arg(short = 'n', long, default_value = "5")]
        top: usize,
    },

    /// Score every record and write the result to disk
    Export {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(
            short,
            long,
            help = "Output file path [default: output/vibrancy-{YYMMDD}.{ext}]"
        )]
        output_file: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = ExportFormat::Parquet)]
        format: ExportFormat,

        #[arg(short, long, help = "Parquet compression [default: from settings]")]
        compression: Option<String>,

        #[arg(long)]
        max_workers: Option<usize>,
    },
}
