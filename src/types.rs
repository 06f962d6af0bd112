use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{ClientError, Result};

/// Identifier of an indexed vector, as assigned by the server (insertion order).
pub type VectorId = u64;

/// Distance metric of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Cosine similarity. Vectors are L2-normalized and compared by dot product.
    Angular,
    Euclidean,
}

impl Metric {
    /// Token sent in the `CREATE` command.
    pub fn wire_token(&self) -> &'static str {
        match self {
            Metric::Angular => "DOT_PRODUCT",
            Metric::Euclidean => "EUCLIDEAN",
        }
    }

    /// Whether vectors must be L2-normalized before they are sent.
    pub fn requires_normalization(&self) -> bool {
        matches!(self, Metric::Angular)
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Angular => write!(f, "angular"),
            Metric::Euclidean => write!(f, "euclidean"),
        }
    }
}

impl FromStr for Metric {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "angular" => Ok(Metric::Angular),
            "euclidean" => Ok(Metric::Euclidean),
            _ => Err(ClientError::UnknownMetric(s.to_string())),
        }
    }
}

/// How `fit` transfers vectors to the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// Write a binary file and send `BULKLOAD <path>`.
    #[default]
    Bulk,
    /// Send `WRITE` commands in fixed-size batches.
    Incremental,
}

impl FromStr for LoadMode {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bulk" => Ok(LoadMode::Bulk),
            "incremental" => Ok(LoadMode::Incremental),
            other => Err(ClientError::Config(format!("unknown load mode: {other}"))),
        }
    }
}

/// Parameters of the index created on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub dimension: usize,
    pub metric: Metric,
    /// Maximum graph degree.
    pub m: usize,
    pub ef_construction: usize,
}

impl IndexSpec {
    pub fn new(dimension: usize, metric: Metric, m: usize, ef_construction: usize) -> Result<Self> {
        let spec = Self {
            dimension,
            metric,
            m,
            ef_construction,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Build a spec from a metric name such as `"angular"`.
    pub fn parse(dimension: usize, metric: &str, m: usize, ef_construction: usize) -> Result<Self> {
        Self::new(dimension, metric.parse()?, m, ef_construction)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(ClientError::Validation("dimension must be > 0".into()));
        }
        if self.m == 0 {
            return Err(ClientError::Validation("M must be > 0".into()));
        }
        if self.ef_construction == 0 {
            return Err(ClientError::Validation(
                "efConstruction must be > 0".into(),
            ));
        }
        Ok(())
    }
}
