use serde::Serialize;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CopierSnapshot {
    pub enabled: bool,
    pub source_collection: String,
    pub recent_collection: String,
    pub interval_secs: u64,
    pub lookback_secs: u64,
    pub retention_secs: u64,
    pub runs: u64,
    pub failures: u64,
    pub skipped: u64,
    pub total_copied: u64,
    pub last_run_at: Option<String>, // ISO8601
    pub last_copied: Option<usize>,
    pub last_error: Option<String>,
}

/// Counters kept by the copier between runs.
#[derive(Debug, Clone, Default)]
pub struct CopierStats {
    pub runs: u64,
    pub failures: u64,
    pub skipped: u64,
    pub total_copied: u64,
    pub last_run_at: Option<u64>,
    pub last_copied: Option<usize>,
    pub last_error: Option<String>,
}
