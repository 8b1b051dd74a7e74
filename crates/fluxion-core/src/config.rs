use std::path::PathBuf;

/// Egress origins permitted when no override is configured.
pub const DEFAULT_EGRESS_ALLOWLIST: [&str; 3] = [
    "https://api.github.com/",
    "https://api.openai.com/",
    "https://generativelanguage.googleapis.com/",
];

/// Process-wide configuration, constructed once at startup and passed by
/// reference into the guard and store constructors. Nothing reads ambient
/// environment state at call time.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Root directory for persisted flows and run records
    pub data_dir: PathBuf,
    /// Allow-list entries: full origin prefixes or bare hostname suffixes
    pub egress_allowlist: Vec<String>,
}

impl EngineConfig {
    /// Read configuration from `FLUXION_DATA_DIR` and
    /// `FLUXION_HTTP_ALLOWLIST` (comma-separated), falling back to defaults.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("FLUXION_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        let egress_allowlist = match std::env::var("FLUXION_HTTP_ALLOWLIST") {
            Ok(raw) => {
                let entries: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .map(str::to_string)
                    .collect();
                if entries.is_empty() {
                    default_allowlist()
                } else {
                    entries
                }
            }
            Err(_) => default_allowlist(),
        };
        Self {
            data_dir,
            egress_allowlist,
        }
    }

    pub fn flows_dir(&self) -> PathBuf {
        self.data_dir.join("flows")
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.data_dir.join("runs")
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            egress_allowlist: default_allowlist(),
        }
    }
}

fn default_allowlist() -> Vec<String> {
    DEFAULT_EGRESS_ALLOWLIST.iter().map(|s| s.to_string()).collect()
}
