use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;

use annwire::config::Config;

/// Produces the reply for one command line (without its newline).
/// `None` closes the connection without replying.
pub type Handler = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Scripted ANN server on a Unix socket inside a temp dir.
///
/// Every accepted connection is served on its own task; all received
/// command lines are recorded in arrival order.
pub struct MockServer {
    pub dir: tempfile::TempDir,
    pub socket: PathBuf,
    commands: Arc<Mutex<Vec<String>>>,
}

impl MockServer {
    /// Start a server that answers like a healthy index (see [`ann_reply`]).
    pub async fn start() -> Self {
        Self::start_with(Arc::new(ann_reply)).await
    }

    pub async fn start_with(handler: Handler) -> Self {
        let dir = tempfile::TempDir::new().unwrap();
        let socket = dir.path().join("ann.sock");
        let listener = UnixListener::bind(&socket).unwrap();
        let commands = Arc::new(Mutex::new(Vec::new()));

        let recorded = commands.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let handler = handler.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    let (read, mut write) = stream.into_split();
                    let mut reader = BufReader::new(read);
                    let mut line = String::new();
                    loop {
                        line.clear();
                        match reader.read_line(&mut line).await {
                            Ok(0) | Err(_) => break,
                            Ok(_) => {}
                        }
                        let command = line.trim_end_matches('\n').to_string();
                        recorded.lock().unwrap().push(command.clone());
                        match handler(&command) {
                            Some(reply) => {
                                if write.write_all(reply.as_bytes()).await.is_err() {
                                    break;
                                }
                            }
                            None => break,
                        }
                    }
                });
            }
        });

        Self {
            dir,
            socket,
            commands,
        }
    }

    /// Client config pointing at this server, with fast polling and a
    /// bulk file inside the temp dir.
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.connection.socket_path = self.socket.clone();
        config.connection.poll_interval_ms = 10;
        config.connection.connect_timeout_secs = Some(5);
        config.connection.response_timeout_secs = Some(5);
        config.loading.bulk_file_path = self.dir.path().join("data.bin");
        config
    }

    /// Command lines received so far.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Received command lines starting with `verb`.
    pub fn commands_with_verb(&self, verb: &str) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| c.split(' ').next() == Some(verb))
            .collect()
    }
}

/// Replies of a well-behaved server. SEARCH answers every query with ids
/// `0..k`.
pub fn ann_reply(command: &str) -> Option<String> {
    let mut tokens = command.split(' ');
    let reply = match tokens.next() {
        Some("CREATE" | "BULKLOAD" | "WRITE" | "OPTIMIZE") => "OK\n".to_string(),
        Some("MEMORY") => "RESULT 4096\n".to_string(),
        Some("SEARCH") => {
            let _ef = tokens.next();
            let k: u64 = tokens.next().and_then(|k| k.parse().ok()).unwrap_or(0);
            let queries = command.matches('[').count();
            let ids = (0..k).map(|i| i.to_string()).collect::<Vec<_>>().join(", ");
            let groups = vec![format!("[{ids}]"); queries].join(" ");
            format!("RESULT {groups}\n")
        }
        _ => format!("ERR unknown command: {command}\n"),
    };
    Some(reply)
}
