//! annwire: client for ANN index servers speaking a newline-framed text
//! protocol over a Unix socket.

pub mod bulk;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod metrics;
pub mod pool;
pub mod protocol;
pub mod types;
pub mod vector;

pub use client::{AnnClient, CycleState};
pub use config::Config;
pub use error::{ClientError, ErrorKind, Result};
pub use pool::{ClientPool, PooledClient};
pub use types::{IndexSpec, LoadMode, Metric, VectorId};
