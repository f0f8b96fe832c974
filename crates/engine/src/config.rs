//! Index configuration via `quarry.toml`
//!
//! A default `quarry.toml` can be written into the index directory; edit it
//! and rebuild to change settings. Every key is optional and falls back to
//! its default.

use quarry_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name placed in the index directory.
pub const CONFIG_FILE_NAME: &str = "quarry.toml";

/// Default dictionary slots per partition.
pub const DEFAULT_TABLE_SIZE: u64 = 611_953;

/// Default accumulator term ceiling that triggers a shard flush.
pub const DEFAULT_MAX_TERMS_PER_SHARD: usize = 250_000;

/// Weights applied when lexical and authority scores are combined.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RankingWeights {
    /// Multiplier of the tf-idf score
    #[serde(default = "default_lexical_weight")]
    pub lexical_weight: f64,
    /// Multiplier of the authority score
    #[serde(default = "default_authority_weight")]
    pub authority_weight: f64,
}

fn default_lexical_weight() -> f64 {
    1.0
}

fn default_authority_weight() -> f64 {
    500.0
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            lexical_weight: default_lexical_weight(),
            authority_weight: default_authority_weight(),
        }
    }
}

/// Build and ranking configuration loaded from `quarry.toml`.
///
/// # Example
///
/// ```toml
/// table_size = 611953
/// max_terms_per_shard = 250000
/// worker_threads = 4
///
/// [ranking]
/// authority_weight = 500.0
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuarryConfig {
    /// Dictionary slots per partition. Must exceed the number of distinct
    /// terms any partition (including the merged one) will hold.
    #[serde(default = "default_table_size")]
    pub table_size: u64,
    /// Distinct terms held in memory before a shard is flushed.
    #[serde(default = "default_max_terms_per_shard")]
    pub max_terms_per_shard: usize,
    /// Threads flushing and merging shards.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    /// Tasks queued before submissions run inline instead.
    #[serde(default = "default_max_queue_depth")]
    pub max_queue_depth: usize,
    /// Score combination weights.
    #[serde(default)]
    pub ranking: RankingWeights,
}

fn default_table_size() -> u64 {
    DEFAULT_TABLE_SIZE
}

fn default_max_terms_per_shard() -> usize {
    DEFAULT_MAX_TERMS_PER_SHARD
}

fn default_worker_threads() -> usize {
    4
}

fn default_max_queue_depth() -> usize {
    1024
}

impl Default for QuarryConfig {
    fn default() -> Self {
        Self {
            table_size: default_table_size(),
            max_terms_per_shard: default_max_terms_per_shard(),
            worker_threads: default_worker_threads(),
            max_queue_depth: default_max_queue_depth(),
            ranking: RankingWeights::default(),
        }
    }
}

impl QuarryConfig {
    /// Small tables and a tiny flush ceiling, so tests exercise sharding.
    pub fn for_testing() -> Self {
        Self {
            table_size: 1021,
            max_terms_per_shard: 8,
            worker_threads: 2,
            max_queue_depth: 64,
            ranking: RankingWeights::default(),
        }
    }

    /// Set the dictionary size.
    pub fn with_table_size(mut self, table_size: u64) -> Self {
        self.table_size = table_size;
        self
    }

    /// Set the flush ceiling.
    pub fn with_max_terms_per_shard(mut self, max_terms: usize) -> Self {
        self.max_terms_per_shard = max_terms;
        self
    }

    /// Set the worker count.
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    /// Set the pool queue limit.
    pub fn with_max_queue_depth(mut self, depth: usize) -> Self {
        self.max_queue_depth = depth;
        self
    }

    /// Set the ranking weights.
    pub fn with_ranking(mut self, ranking: RankingWeights) -> Self {
        self.ranking = ranking;
        self
    }

    /// Check that the values describe a buildable index.
    pub fn validate(&self) -> Result<()> {
        if self.table_size < 2 {
            return Err(Error::Config(format!(
                "table_size must be at least 2, got {}",
                self.table_size
            )));
        }
        if self.max_terms_per_shard == 0 {
            return Err(Error::Config("max_terms_per_shard must be at least 1".into()));
        }
        if self.max_terms_per_shard as u64 >= self.table_size {
            return Err(Error::Config(format!(
                "max_terms_per_shard ({}) must be below table_size ({})",
                self.max_terms_per_shard, self.table_size
            )));
        }
        if self.worker_threads == 0 {
            return Err(Error::Config("worker_threads must be at least 1".into()));
        }
        if self.max_queue_depth == 0 {
            return Err(Error::Config("max_queue_depth must be at least 1".into()));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Quarry index configuration
#
# Dictionary slots per partition. Must be larger than the number of distinct
# terms in the whole corpus, since the merged index uses the same size.
table_size = 611953

# Distinct terms kept in memory before a shard is flushed to disk.
max_terms_per_shard = 250000

# Threads that flush and merge shards during a build.
worker_threads = 4

# Queued flushes before the ingesting thread flushes inline instead.
max_queue_depth = 1024

# Score combination for ranked queries.
[ranking]
lexical_weight = 1.0
authority_weight = 500.0
"#
    }

    /// Read, parse and validate config from a file path.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: QuarryConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::Config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
