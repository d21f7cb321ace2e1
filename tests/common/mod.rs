//! Shared test utilities and fixtures
//!
//! An in-memory LSP client and a scripted analyzer for driving the server.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use nudge_config::ScanConfig;
use nudge_lsp::{Analyzer, AnalyzerError, FrameReader, FrameWriter, LanguageServer};
use tokio::io::{DuplexStream, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Analyzer answering from a per-root table; unknown roots produce no output.
#[derive(Clone, Default)]
pub struct ScriptedAnalyzer {
    outputs: Arc<Mutex<HashMap<PathBuf, Result<String, i32>>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedAnalyzer {
    pub fn succeed(&self, root: &Path, output: &str) {
        self.outputs
            .lock()
            .unwrap()
            .insert(root.to_path_buf(), Ok(output.to_string()));
    }

    pub fn fail(&self, root: &Path, code: i32) {
        self.outputs
            .lock()
            .unwrap()
            .insert(root.to_path_buf(), Err(code));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` invocations have started.
    pub async fn wait_for_calls(&self, n: usize) {
        tokio::time::timeout(RECV_TIMEOUT, async {
            while self.calls() < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("analyzer was not invoked in time");
    }
}

impl Analyzer for ScriptedAnalyzer {
    fn analyze(&self, root: &Path) -> impl Future<Output = Result<String, AnalyzerError>> + Send {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .outputs
            .lock()
            .unwrap()
            .get(root)
            .cloned()
            .unwrap_or_else(|| Ok(String::new()));
        async move {
            outcome.map_err(|code| AnalyzerError::Exit {
                code: Some(code),
                stderr: "scripted failure".to_string(),
            })
        }
    }
}

/// Client end of an in-memory LSP session.
pub struct TestClient {
    reader: FrameReader<ReadHalf<DuplexStream>>,
    writer: FrameWriter<WriteHalf<DuplexStream>>,
    next_id: i64,
}

impl TestClient {
    pub async fn request(&mut self, method: &str, params: serde_json::Value) -> i64 {
        self.next_id += 1;
        let id = self.next_id;
        self.writer
            .write_frame(&serde_json::json!({
                "jsonrpc": "2.0", "id": id, "method": method, "params": params
            }))
            .await
            .unwrap();
        id
    }

    pub async fn notify(&mut self, method: &str, params: serde_json::Value) {
        self.writer
            .write_frame(&serde_json::json!({
                "jsonrpc": "2.0", "method": method, "params": params
            }))
            .await
            .unwrap();
    }

    pub async fn recv(&mut self) -> serde_json::Value {
        tokio::time::timeout(RECV_TIMEOUT, self.reader.read_frame())
            .await
            .expect("timed out waiting for server")
            .unwrap()
            .expect("server closed the stream")
    }

    /// Next response, skipping notifications in between.
    pub async fn response(&mut self, id: i64) -> serde_json::Value {
        loop {
            let frame = self.recv().await;
            if frame.get("method").is_none() {
                assert_eq!(frame["id"], id, "unexpected response: {frame}");
                return frame;
            }
        }
    }

    /// Next `publishDiagnostics` params.
    pub async fn publication(&mut self) -> serde_json::Value {
        let frame = self.recv().await;
        assert_eq!(
            frame["method"], "textDocument/publishDiagnostics",
            "unexpected frame: {frame}"
        );
        frame["params"].clone()
    }

    /// Send `initialize` for `roots`, then `initialized`.
    pub async fn initialize(&mut self, roots: &[&Path]) -> serde_json::Value {
        let folders: Vec<serde_json::Value> = roots
            .iter()
            .map(|root| serde_json::json!({ "uri": uri(root), "name": "root" }))
            .collect();
        let id = self
            .request(
                "initialize",
                serde_json::json!({ "processId": null, "workspaceFolders": folders }),
            )
            .await;
        let response = self.response(id).await;
        self.notify("initialized", serde_json::json!({})).await;
        response
    }

    pub async fn toggle(&mut self) -> serde_json::Value {
        let id = self
            .request(
                "workspace/executeCommand",
                serde_json::json!({ "command": nudge_lsp::CHECK_WORKSPACE_COMMAND }),
            )
            .await;
        self.response(id).await
    }

    pub async fn save(&mut self, path: &Path) {
        self.notify(
            "textDocument/didSave",
            serde_json::json!({ "textDocument": { "uri": uri(path) } }),
        )
        .await;
    }

    pub async fn shutdown(mut self, server: JoinHandle<anyhow::Result<()>>) {
        let id = self.request("shutdown", serde_json::Value::Null).await;
        self.response(id).await;
        self.notify("exit", serde_json::Value::Null).await;
        tokio::time::timeout(RECV_TIMEOUT, server)
            .await
            .expect("server did not exit")
            .unwrap()
            .unwrap();
    }
}

/// Run a server over an in-memory pipe.
pub fn start_server(
    analyzer: ScriptedAnalyzer,
    config: ScanConfig,
) -> (TestClient, JoinHandle<anyhow::Result<()>>) {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_io);
    let (client_read, client_write) = tokio::io::split(client_io);

    let server = LanguageServer::new(analyzer, config);
    let handle = tokio::spawn(server.serve(server_read, server_write));

    let client = TestClient {
        reader: FrameReader::new(client_read),
        writer: FrameWriter::new(client_write),
        next_id: 0,
    };
    (client, handle)
}

pub fn uri(path: &Path) -> String {
    url::Url::from_file_path(path).unwrap().to_string()
}

/// Annotation line in the analyzer's output format.
pub fn notice(file: &str, line: u32, col: u32, end_line: u32, message: &str) -> String {
    format!("::notice file={file},line={line},col={col},endLine={end_line},endColumn=1::{message}\n")
}
