use std::time::{Duration, Instant};

use bytes::BytesMut;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::UnixStream;
use tokio::sync::watch;
use tokio_util::codec::Framed;
use tracing::{debug, info, instrument, warn};

use crate::bulk::write_vector_file;
use crate::config::{Config, LoadingConfig};
use crate::connection;
use crate::error::{ClientError, Result};
use crate::protocol::{
    decode_batch, decode_ids, decode_memory, expect_ok, frame_text, Command, LineCodec,
};
use crate::types::{IndexSpec, LoadMode, VectorId};
use crate::vector::prepare;

/// Progress of the request/response cycle on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    /// No request outstanding; a new command may be sent.
    Idle,
    /// A command is being written.
    Sent,
    /// The command was written and its response frame is not fully read.
    AwaitingFrame,
}

/// Client for one connection to an ANN index server.
///
/// Every operation writes one command line and reads exactly one response
/// frame before returning. Operations take `&mut self`, so a connection can
/// never have two requests in flight. If an operation is abandoned midway
/// (its future dropped, or a transport error), the client stays out of
/// `Idle` and every later call fails with `Desynchronized`. The same holds
/// when the server sends more than one frame for a command.
pub struct AnnClient<S = UnixStream> {
    framed: Framed<S, LineCodec>,
    response_timeout: Option<Duration>,
    loading: LoadingConfig,
    index: Option<IndexSpec>,
    state: CycleState,
}

impl AnnClient<UnixStream> {
    /// Wait for the configured socket and connect to it.
    pub async fn connect(config: &Config) -> Result<Self> {
        let stream = connection::connect(&config.connection, None).await?;
        Ok(Self::from_stream(stream, config))
    }

    /// Like [`AnnClient::connect`], but the wait for the socket stops when
    /// `cancel` becomes `true`.
    pub async fn connect_with_cancel(
        config: &Config,
        cancel: watch::Receiver<bool>,
    ) -> Result<Self> {
        let stream = connection::connect(&config.connection, Some(cancel)).await?;
        Ok(Self::from_stream(stream, config))
    }
}

impl<S> AnnClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already-connected stream.
    pub fn from_stream(stream: S, config: &Config) -> Self {
        Self {
            framed: Framed::new(stream, LineCodec::new(config.connection.max_frame_bytes)),
            response_timeout: config.connection.response_timeout(),
            loading: config.loading.clone(),
            index: None,
            state: CycleState::Idle,
        }
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Spec of the index this client sends vectors for, if known.
    pub fn index(&self) -> Option<&IndexSpec> {
        self.index.as_ref()
    }

    /// Use an index that already exists on the server (for example one
    /// created through another connection) without sending CREATE.
    pub fn attach_index(&mut self, spec: IndexSpec) -> Result<()> {
        spec.validate()?;
        self.index = Some(spec);
        Ok(())
    }

    fn require_index(&self) -> Result<IndexSpec> {
        self.index.ok_or(ClientError::IndexNotCreated)
    }

    /// `CREATE <dim> <metric> <M> <efConstruction>`
    #[instrument(skip(self), fields(dimension = spec.dimension, metric = %spec.metric))]
    pub async fn create_index(&mut self, spec: IndexSpec) -> Result<()> {
        info!("creating index");
        self.execute(&Command::Create(&spec), expect_ok).await?;
        self.index = Some(spec);
        Ok(())
    }

    /// Write `vectors` to the configured bulk file, then `BULKLOAD <path>`.
    #[instrument(skip(self, vectors), fields(count = vectors.len()))]
    pub async fn bulk_load(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        let spec = self.require_index()?;
        let prepared = prepare(vectors, spec.dimension, spec.metric)?;
        let path = self.loading.bulk_file_path.clone();

        // Reject a bad path before the file is written.
        let command = Command::BulkLoad { path: &path };
        command.encode()?;

        info!(path = %path.display(), "bulk indexing {} vectors", prepared.len());
        write_vector_file(&path, &prepared).await?;
        self.execute(&command, expect_ok).await?;

        crate::metrics::VECTORS_SENT_TOTAL
            .with_label_values(&[command.verb()])
            .inc_by(prepared.len() as u64);
        Ok(())
    }

    /// Send vectors in `WRITE` commands of at most `write_batch_size`
    /// vectors each, waiting for `OK` after every command. Returns the
    /// number of vectors written.
    #[instrument(skip(self, vectors), fields(count = vectors.len()))]
    pub async fn write(&mut self, vectors: &[Vec<f32>]) -> Result<usize> {
        let spec = self.require_index()?;
        let prepared = prepare(vectors, spec.dimension, spec.metric)?;
        let batch_size = self.loading.write_batch_size.max(1);

        info!("indexing {} vectors", prepared.len());
        let mut written = 0;
        for batch in prepared.chunks(batch_size) {
            self.execute(&Command::Write { vectors: batch }, expect_ok)
                .await?;
            written += batch.len();
            crate::metrics::VECTORS_SENT_TOTAL
                .with_label_values(&["WRITE"])
                .inc_by(batch.len() as u64);
            debug!(written, "written");
        }
        Ok(written)
    }

    /// `OPTIMIZE`
    #[instrument(skip(self))]
    pub async fn optimize(&mut self) -> Result<()> {
        info!("optimizing index");
        self.execute(&Command::Optimize, expect_ok).await
    }

    /// Create the index, load `vectors` the configured way, and optimize.
    #[instrument(skip(self, vectors), fields(count = vectors.len(), mode = ?self.loading.mode))]
    pub async fn fit(&mut self, spec: IndexSpec, vectors: &[Vec<f32>]) -> Result<()> {
        // Validate everything up front so a bad vector or bulk path does not
        // leave a half-built index behind.
        prepare(vectors, spec.dimension, spec.metric)?;
        if self.loading.mode == LoadMode::Bulk {
            Command::BulkLoad {
                path: &self.loading.bulk_file_path,
            }
            .encode()?;
        }

        self.create_index(spec).await?;
        match self.loading.mode {
            LoadMode::Bulk => self.bulk_load(vectors).await?,
            LoadMode::Incremental => {
                self.write(vectors).await?;
            }
        }
        self.optimize().await?;
        info!("done");
        Ok(())
    }

    /// `SEARCH <efSearch> <k> [vec]`: ids of the `k` nearest neighbors.
    #[instrument(skip(self, query))]
    pub async fn search(
        &mut self,
        ef_search: usize,
        k: usize,
        query: &[f32],
    ) -> Result<Vec<VectorId>> {
        let spec = self.require_index()?;
        let queries = [query.to_vec()];
        let prepared = prepare(&queries, spec.dimension, spec.metric)?;
        let command = Command::Search {
            ef_search,
            k,
            queries: &prepared,
        };
        self.execute(&command, decode_ids).await
    }

    /// `SEARCH <efSearch> <k> [vec1] ... [vecN]`: one id list per query,
    /// in query order.
    #[instrument(skip(self, queries), fields(queries = queries.len()))]
    pub async fn batch_search(
        &mut self,
        ef_search: usize,
        k: usize,
        queries: &[Vec<f32>],
    ) -> Result<Vec<Vec<VectorId>>> {
        let spec = self.require_index()?;
        let prepared = prepare(queries, spec.dimension, spec.metric)?;
        let command = Command::Search {
            ef_search,
            k,
            queries: &prepared,
        };
        let expected = prepared.len();
        let results = self
            .execute(&command, |frame| decode_batch(frame, expected))
            .await?;
        debug!(batch = results.len(), "batch search complete");
        Ok(results)
    }

    /// `MEMORY`: server memory usage in kilobytes.
    #[instrument(skip(self))]
    pub async fn memory_usage(&mut self) -> Result<u64> {
        self.execute(&Command::Memory, decode_memory).await
    }

    /// Run one request/response cycle and decode the frame.
    async fn execute<T, F>(&mut self, command: &Command<'_>, decode: F) -> Result<T>
    where
        F: FnOnce(&str) -> Result<T>,
    {
        let verb = command.verb();
        let start = Instant::now();

        let result = match self.round_trip(command).await {
            Ok(frame) => decode(&frame),
            Err(e) => Err(e),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.outcome_label(),
        };
        crate::metrics::COMMANDS_TOTAL
            .with_label_values(&[verb, outcome])
            .inc();
        crate::metrics::COMMAND_DURATION
            .with_label_values(&[verb])
            .observe(start.elapsed().as_secs_f64());

        if let Err(e) = &result {
            warn!(verb, error = %e, "request failed");
        }
        result
    }

    async fn round_trip(&mut self, command: &Command<'_>) -> Result<String> {
        if self.state != CycleState::Idle {
            return Err(ClientError::Desynchronized);
        }

        // Encoding errors leave the connection untouched.
        let line = command.encode()?;
        crate::metrics::FRAME_BYTES
            .with_label_values(&["request"])
            .observe(line.len() as f64);

        self.state = CycleState::Sent;
        self.framed.send(line).await?;

        self.state = CycleState::AwaitingFrame;
        let frame = self.next_frame().await?;
        crate::metrics::FRAME_BYTES
            .with_label_values(&["response"])
            .observe(frame.len() as f64 + 1.0);

        // Every command gets exactly one frame. Anything after it would be
        // read as the reply to the next command.
        let trailing = self.framed.read_buffer().len();
        if trailing > 0 {
            warn!(trailing, "bytes received after response frame");
            return Err(ClientError::TrailingData { trailing });
        }

        // The frame was fully read, so the connection stays usable even
        // when the frame is not text.
        self.state = CycleState::Idle;
        frame_text(frame)
    }

    async fn next_frame(&mut self) -> Result<BytesMut> {
        let next = match self.response_timeout {
            Some(limit) => tokio::time::timeout(limit, self.framed.next())
                .await
                .map_err(|_| ClientError::ResponseTimeout(limit))?,
            None => self.framed.next().await,
        };
        next.unwrap_or(Err(ClientError::ConnectionClosed { buffered: 0 }))
    }
}

impl<S> std::fmt::Display for AnnClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.index {
            Some(spec) => write!(
                f,
                "AnnClient(metric={}, dimension={}, m={}, ef_construction={})",
                spec.metric, spec.dimension, spec.m, spec.ef_construction
            ),
            None => write!(f, "AnnClient(no index)"),
        }
    }
}
