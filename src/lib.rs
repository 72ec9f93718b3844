pub mod analysis;
pub mod api;
pub mod config;
pub mod extract;
pub mod server;

pub use analysis::{Analyzer, EngagementMetrics, SentimentScorer, SentimentScores};
pub use config::ServiceConfig;
pub use extract::{ExtractError, ExtractionResult, Extractor, SourceKind};

/// Short stable content fingerprint for log correlation.
pub fn fingerprint(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    format!("{:016x}", u64::from_be_bytes(prefix))
}

pub fn format_float(value: f64, digits: usize) -> String {
    format!("{:.1$}", value, digits)
}

pub fn format_optional(value: Option<f64>, digits: usize) -> String {
    value
        .map(|value| format_float(value, digits))
        .unwrap_or_else(|| "n/a".to_string())
}
