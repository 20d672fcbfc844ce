//! Configuration for report loading and batch analysis.
//!
//! `AnalysisConfig` gathers the archive safety limits and the worker-pool size so
//! that callers can tune them from one place (or from a JSON file).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::container::ArchiveLimits;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Upper bound on concurrently analysed reports in a batch.
    pub max_workers: usize,
    pub max_entries: usize,
    #[serde(alias = "max_part_bytes")]
    pub max_part_uncompressed_bytes: u64,
    #[serde(alias = "max_total_bytes")]
    pub max_total_uncompressed_bytes: u64,
    /// Files above this size are skipped when reading a report folder.
    pub max_file_bytes: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            max_entries: 10_000,
            max_part_uncompressed_bytes: 100 * 1024 * 1024,
            max_total_uncompressed_bytes: 500 * 1024 * 1024,
            max_file_bytes: 10 * 1024 * 1024,
        }
    }
}

impl AnalysisConfig {
    /// Single worker and tighter archive limits, for untrusted uploads.
    pub fn strict() -> Self {
        Self {
            max_workers: 1,
            max_entries: 2_000,
            max_part_uncompressed_bytes: 32 * 1024 * 1024,
            max_total_uncompressed_bytes: 128 * 1024 * 1024,
            max_file_bytes: 4 * 1024 * 1024,
        }
    }

    pub fn balanced() -> Self {
        Self::default()
    }

    pub fn permissive() -> Self {
        Self {
            max_workers: 16,
            max_entries: 50_000,
            max_part_uncompressed_bytes: 512 * 1024 * 1024,
            max_total_uncompressed_bytes: 2 * 1024 * 1024 * 1024,
            max_file_bytes: 64 * 1024 * 1024,
        }
    }

    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            inner: AnalysisConfig::default(),
        }
    }

    pub fn archive_limits(&self) -> ArchiveLimits {
        ArchiveLimits {
            max_entries: self.max_entries,
            max_part_uncompressed_bytes: self.max_part_uncompressed_bytes,
            max_total_uncompressed_bytes: self.max_total_uncompressed_bytes,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_non_zero(self.max_workers as u64, "max_workers")?;
        ensure_non_zero(self.max_entries as u64, "max_entries")?;
        ensure_non_zero(self.max_part_uncompressed_bytes, "max_part_uncompressed_bytes")?;
        ensure_non_zero(self.max_total_uncompressed_bytes, "max_total_uncompressed_bytes")?;
        ensure_non_zero(self.max_file_bytes, "max_file_bytes")?;

        if self.max_part_uncompressed_bytes > self.max_total_uncompressed_bytes {
            return Err(ConfigError::PartExceedsTotal {
                part: self.max_part_uncompressed_bytes,
                total: self.max_total_uncompressed_bytes,
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero (got {value})")]
    NonPositiveLimit { field: &'static str, value: u64 },
    #[error("max_part_uncompressed_bytes ({part}) exceeds max_total_uncompressed_bytes ({total})")]
    PartExceedsTotal { part: u64, total: u64 },
}

fn ensure_non_zero(value: u64, field: &'static str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::NonPositiveLimit { field, value });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct AnalysisConfigBuilder {
    inner: AnalysisConfig,
}

impl Default for AnalysisConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisConfigBuilder {
    pub fn new() -> Self {
        AnalysisConfig::builder()
    }

    pub fn max_workers(mut self, value: usize) -> Self {
        self.inner.max_workers = value;
        self
    }

    pub fn max_entries(mut self, value: usize) -> Self {
        self.inner.max_entries = value;
        self
    }

    pub fn max_part_uncompressed_bytes(mut self, value: u64) -> Self {
        self.inner.max_part_uncompressed_bytes = value;
        self
    }

    pub fn max_total_uncompressed_bytes(mut self, value: u64) -> Self {
        self.inner.max_total_uncompressed_bytes = value;
        self
    }

    pub fn max_file_bytes(mut self, value: u64) -> Self {
        self.inner.max_file_bytes = value;
        self
    }

    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_archive_limits() {
        let cfg = AnalysisConfig::default();
        let limits = cfg.archive_limits();
        assert_eq!(limits.max_entries, 10_000);
        assert_eq!(limits.max_part_uncompressed_bytes, 100 * 1024 * 1024);
        assert_eq!(limits.max_total_uncompressed_bytes, 500 * 1024 * 1024);
        assert_eq!(cfg.max_workers, 4);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: AnalysisConfig =
            serde_json::from_str(r#"{ "max_workers": 2, "max_part_bytes": 1024 }"#)
                .expect("deserialize partial config");
        assert_eq!(cfg.max_workers, 2);
        assert_eq!(cfg.max_part_uncompressed_bytes, 1024);
        assert_eq!(cfg.max_entries, AnalysisConfig::default().max_entries);
    }

    #[test]
    fn builder_rejects_zero_workers() {
        let err = AnalysisConfig::builder()
            .max_workers(0)
            .build()
            .expect_err("zero workers should be rejected");
        assert_eq!(
            err,
            ConfigError::NonPositiveLimit {
                field: "max_workers",
                value: 0
            }
        );
    }

    #[test]
    fn builder_rejects_part_larger_than_total() {
        let err = AnalysisConfig::builder()
            .max_part_uncompressed_bytes(10)
            .max_total_uncompressed_bytes(5)
            .build()
            .expect_err("part limit above total should be rejected");
        assert!(matches!(err, ConfigError::PartExceedsTotal { part: 10, total: 5 }));
    }

    #[test]
    fn presets_differ_in_expected_directions() {
        let strict = AnalysisConfig::strict();
        let balanced = AnalysisConfig::balanced();
        let permissive = AnalysisConfig::permissive();

        assert!(strict.max_workers <= balanced.max_workers);
        assert!(permissive.max_workers >= balanced.max_workers);
        assert!(strict.max_total_uncompressed_bytes < permissive.max_total_uncompressed_bytes);
        for cfg in [strict, balanced, permissive] {
            assert!(cfg.validate().is_ok());
        }
    }
}
