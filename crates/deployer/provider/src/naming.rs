use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Mints DNS-label-safe job names of the form `{prefix}-{millis}-{sequence}`.
#[derive(Debug, Default)]
pub struct NamingPolicy {
    sequence: AtomicU64,
}

impl NamingPolicy {
    /// Maximum length of a DNS label (RFC 1123).
    pub const MAX_LEN: usize = 63;

    const DEFAULT_PREFIX: &'static str = "job";

    pub fn new_name(&self, prefix: &str) -> String {
        let timestamp = Utc::now().timestamp_millis();
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let suffix = format!("{timestamp}-{sequence}");

        let mut prefix = sanitize(prefix);
        prefix.truncate(Self::MAX_LEN - suffix.len() - 1);
        let prefix = match prefix.trim_end_matches('-') {
            "" => Self::DEFAULT_PREFIX,
            prefix => prefix,
        };
        format!("{prefix}-{suffix}")
    }
}

fn sanitize(prefix: &str) -> String {
    let mut sanitized = String::with_capacity(prefix.len());
    for c in prefix.chars().map(|c| c.to_ascii_lowercase()) {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '-'
        };
        // collapse runs of separators
        if c == '-' && (sanitized.is_empty() || sanitized.ends_with('-')) {
            continue;
        }
        sanitized.push(c);
    }
    sanitized
}
