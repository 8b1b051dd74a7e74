use fluxion_core::{EngineConfig, FluxionError};

/// Decides allow/deny for any URL a step is about to fetch, before any
/// network I/O occurs. Performs no I/O itself.
///
/// Allow-list entries are either full origin prefixes (`scheme://host/`) or
/// bare hostname suffixes; a bare hostname also matches its subdomains.
#[derive(Debug, Clone)]
pub struct EgressPolicy {
    allow: Vec<String>,
}

impl EgressPolicy {
    pub fn new(allow: Vec<String>) -> Self {
        Self { allow }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.egress_allowlist.clone())
    }

    /// Check a URL against the allow-list. Must run synchronously before
    /// the request, with no partial request sent.
    pub fn allow_http(&self, url: &str) -> Result<(), FluxionError> {
        let trimmed = url.trim();
        if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
            return Err(FluxionError::BlockedEgress(format!(
                "invalid protocol for {}",
                url
            )));
        }
        let host = hostname_of(trimmed);
        let allowed = self.allow.iter().any(|entry| {
            if entry.contains("://") {
                trimmed.starts_with(entry.as_str())
            } else {
                host == *entry || host.ends_with(&format!(".{}", entry))
            }
        });
        if !allowed {
            return Err(FluxionError::BlockedEgress(format!(
                "{} not in allowlist",
                host
            )));
        }
        Ok(())
    }
}

impl Default for EgressPolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Extract the hostname from an HTTP(S) URL: strip the scheme, any
/// userinfo, the path, and any port. Hostnames are case-insensitive, so the
/// result is lowercased for comparison against allow-list entries.
fn hostname_of(url: &str) -> String {
    let after_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let authority = after_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or(after_scheme);
    let host_port = authority.rsplit_once('@').map(|(_, h)| h).unwrap_or(authority);
    host_port
        .split(':')
        .next()
        .unwrap_or(host_port)
        .to_ascii_lowercase()
}
