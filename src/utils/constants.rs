/// Vibrancy composite weights
pub const TRAFFIC_WEIGHT: f64 = 0.4;
pub const DWELL_WEIGHT: f64 = 0.3;
pub const SPREAD_WEIGHT: f64 = 0.3;

/// Dwell-time bucket labels and their weights, shortest stay first
pub const DWELL_BUCKETS: [(&str, f64); 8] = [
    ("10_15", 0.1),
    ("15_30", 0.2),
    ("30_45", 0.4),
    ("45_60", 0.6),
    ("60_75", 0.8),
    ("75_90", 0.9),
    ("90_105", 1.0),
    ("105_120", 1.0),
];

/// Weekday column suffixes, Sunday first
pub const WEEKDAY_FIELDS: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

/// Distance buckets: field suffix and display label
pub const DISTANCE_BUCKETS: [(&str, &str); 5] = [
    ("1", "0-1 km"),
    ("2", "1-2 km"),
    ("5", "2-5 km"),
    ("10", "5-10 km"),
    ("30", "10+ km"),
];

/// Positional export column contract
pub const COL_ID: usize = 2;
pub const COL_NAME: usize = 3;
pub const COL_START_DATE: usize = 6;
pub const COL_END_DATE: usize = 7;
pub const COL_ADDRESS_STREET: usize = 8;
pub const COL_ADDRESS_STATE: usize = 9;
pub const COL_ADDRESS_ZIP: usize = 10;
pub const COL_LAT: usize = 11;
pub const COL_LNG: usize = 12;
pub const COL_VISIT_DURATION: usize = 15;
pub const COL_FOOTTRAFFIC: usize = 16;
pub const COL_WEEKDAY_SUNDAY: usize = 161;

/// Average number of weeks in a month
pub const WEEKS_PER_MONTH: f64 = 4.345;

/// Business-day window used to spread monthly traffic over hours
pub const BUSINESS_HOURS_START: u32 = 8;
pub const BUSINESS_HOURS_END: u32 = 18;
pub const BUSINESS_HOURS: f64 = 10.0;
pub const SHOULDER_MORNING_FACTOR: f64 = 0.5;
pub const SHOULDER_EVENING_FACTOR: f64 = 0.3;

/// Integrity defaults
pub const DEFAULT_WEEKDAY_TOLERANCE: f64 = 5.0;
pub const PERCENTAGE_SUM_CEILING: f64 = 150.0;

/// Tenant size distribution bins (inclusive upper bounds)
pub const TENANT_BINS: [(u64, &str); 5] = [
    (10, "1-10"),
    (100, "11-100"),
    (1_000, "101-1000"),
    (10_000, "1001-10000"),
    (u64::MAX, "10000+"),
];

/// Output defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_CONFIG_FILE: &str = "footfall.toml";
pub const ENV_PREFIX: &str = "FOOTFALL";

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
