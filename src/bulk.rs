//! Binary side channel for BULKLOAD.

use std::path::Path;

use bytes::{BufMut, BytesMut};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use crate::error::Result;

const ROWS_PER_CHUNK: usize = 4096;

/// Write `vectors` to `path` as one contiguous row-major array of
/// native-endian `f32`, with no header. Returns the number of bytes written.
///
/// Vectors must already be validated to a common dimension.
#[instrument(skip_all, fields(path = %path.display(), rows = vectors.len()))]
pub async fn write_vector_file(path: &Path, vectors: &[Vec<f32>]) -> Result<u64> {
    let mut file = File::create(path).await?;
    let mut written = 0u64;

    for rows in vectors.chunks(ROWS_PER_CHUNK) {
        let len: usize = rows.iter().map(|r| r.len() * 4).sum();
        let mut chunk = BytesMut::with_capacity(len);
        for row in rows {
            for &v in row {
                chunk.put_f32_ne(v);
            }
        }
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;

    debug!(bytes = written, "wrote vector file");
    Ok(written)
}
