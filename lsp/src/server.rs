//! Language server loop: editor messages in, diagnostics out.
//!
//! A reader task decodes frames from the client into a channel so the main
//! loop can wait on client messages and scan completions at the same time.
//! All state lives in the loop; nothing here is shared across tasks.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use nudge_config::ScanConfig;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use crate::analyzer::Analyzer;
use crate::codec::{FrameReader, FrameWriter};
use crate::orchestrator::ScanOrchestrator;
use crate::protocol::{
    self, CHECK_WORKSPACE_COMMAND, DidChangeWorkspaceFoldersParams, DidOpenTextDocumentParams,
    ExecuteCommandParams, INVALID_PARAMS, INVALID_REQUEST, InitializeParams, METHOD_NOT_FOUND,
    Notification, TextDocumentParams,
};
use crate::types::Publication;

const FRAME_CHANNEL_CAPACITY: usize = 64;

enum IncomingFrame {
    Request {
        id: serde_json::Value,
        method: String,
        params: Option<serde_json::Value>,
    },
    Notification {
        method: String,
        params: Option<serde_json::Value>,
    },
    /// Responses to requests we never send; ignored.
    Response,
}

fn parse_incoming(frame: serde_json::Value) -> Option<IncomingFrame> {
    let serde_json::Value::Object(mut map) = frame else {
        return None;
    };
    let method = map
        .get("method")
        .and_then(|m| m.as_str())
        .map(String::from);
    let params = map.remove("params");

    match (map.remove("id"), method) {
        (Some(id), Some(method)) => Some(IncomingFrame::Request { id, method, params }),
        (None, Some(method)) => Some(IncomingFrame::Notification { method, params }),
        (Some(_), None) => Some(IncomingFrame::Response),
        (None, None) => None,
    }
}

/// Deserialize params, treating absent params as `null`.
fn parse_params<T: DeserializeOwned>(params: Option<serde_json::Value>) -> Option<T> {
    serde_json::from_value(params.unwrap_or(serde_json::Value::Null)).ok()
}

/// What the loop does after handling one frame.
enum Flow {
    Continue(Vec<serde_json::Value>),
    Exit,
}

pub struct LanguageServer<A: Analyzer> {
    orchestrator: ScanOrchestrator<A>,
    start_active: bool,
    /// Language ids of open documents, by URI.
    open_documents: HashMap<String, String>,
    shutdown_requested: bool,
}

impl<A: Analyzer> LanguageServer<A> {
    #[must_use]
    pub fn new(analyzer: A, config: ScanConfig) -> Self {
        let start_active = config.start_active;
        Self {
            orchestrator: ScanOrchestrator::new(analyzer, config),
            start_active,
            open_documents: HashMap::new(),
            shutdown_requested: false,
        }
    }

    #[must_use]
    pub fn orchestrator(&self) -> &ScanOrchestrator<A> {
        &self.orchestrator
    }

    /// Serve until the client sends `exit` or closes its end.
    pub async fn serve<R, W>(mut self, input: R, output: W) -> Result<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin,
    {
        let (frame_tx, mut frame_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let reader_handle = tokio::spawn(async move {
            let mut reader = FrameReader::new(input);
            loop {
                match reader.read_frame().await {
                    Ok(Some(frame)) => {
                        if frame_tx.send(frame).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        tracing::info!("Client closed input");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Client read error: {e:#}");
                        break;
                    }
                }
            }
        });

        let mut writer = FrameWriter::new(output);
        let result = loop {
            tokio::select! {
                frame = frame_rx.recv() => {
                    let Some(frame) = frame else {
                        break Ok(());
                    };
                    match self.handle_frame(frame) {
                        Flow::Continue(outgoing) => {
                            if let Err(e) = write_all(&mut writer, &outgoing).await {
                                break Err(e);
                            }
                        }
                        Flow::Exit => break Ok(()),
                    }
                }
                // The orchestrator keeps its own sender, so this never yields
                // `None` and the branch stays enabled.
                Some(completion) = self.orchestrator.next_completion() => {
                    let publications = self.orchestrator.apply(completion);
                    if !publications.is_empty() {
                        tracing::debug!("{}", self.orchestrator.snapshot().status_string());
                    }
                    let outgoing = publication_frames(&publications);
                    if let Err(e) = write_all(&mut writer, &outgoing).await {
                        break Err(e);
                    }
                }
            }
        };

        reader_handle.abort();
        result
    }

    fn handle_frame(&mut self, frame: serde_json::Value) -> Flow {
        match parse_incoming(frame) {
            Some(IncomingFrame::Request { id, method, params }) => {
                Flow::Continue(self.handle_request(&id, &method, params))
            }
            Some(IncomingFrame::Notification { method, params }) => {
                if method == "exit" {
                    if !self.shutdown_requested {
                        tracing::warn!("Client sent exit without shutdown");
                    }
                    return Flow::Exit;
                }
                Flow::Continue(self.handle_notification(&method, params))
            }
            Some(IncomingFrame::Response) => Flow::Continue(Vec::new()),
            None => {
                tracing::trace!("Ignoring malformed JSON-RPC frame");
                Flow::Continue(Vec::new())
            }
        }
    }

    fn handle_request(
        &mut self,
        id: &serde_json::Value,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Vec<serde_json::Value> {
        if self.shutdown_requested {
            return vec![protocol::error_response(
                id,
                INVALID_REQUEST,
                "server is shutting down",
            )];
        }

        match method {
            "initialize" => {
                let params: InitializeParams = parse_params(params).unwrap_or_default();
                for root in params.roots() {
                    self.orchestrator.add_root(root);
                }
                vec![protocol::response(id, protocol::initialize_result())]
            }
            "shutdown" => {
                self.shutdown_requested = true;
                vec![protocol::response(id, serde_json::Value::Null)]
            }
            "workspace/executeCommand" => {
                let Some(params) = parse_params::<ExecuteCommandParams>(params) else {
                    return vec![protocol::error_response(
                        id,
                        INVALID_PARAMS,
                        "missing command",
                    )];
                };
                if params.command != CHECK_WORKSPACE_COMMAND {
                    return vec![protocol::error_response(
                        id,
                        INVALID_PARAMS,
                        &format!("unknown command: {}", params.command),
                    )];
                }
                let publications = self.orchestrator.toggle();
                let mut outgoing = vec![protocol::response(id, serde_json::Value::Null)];
                outgoing.extend(publication_frames(&publications));
                outgoing
            }
            _ => {
                tracing::debug!("Unhandled request: {method}");
                vec![protocol::error_response(
                    id,
                    METHOD_NOT_FOUND,
                    &format!("Method not found: {method}"),
                )]
            }
        }
    }

    fn handle_notification(
        &mut self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Vec<serde_json::Value> {
        match method {
            "initialized" => {
                if self.start_active && !self.orchestrator.is_active() {
                    return publication_frames(&self.orchestrator.toggle());
                }
            }
            "textDocument/didOpen" => {
                if let Some(params) = parse_params::<DidOpenTextDocumentParams>(params) {
                    let doc = params.text_document;
                    self.open_documents.insert(doc.uri, doc.language_id);
                }
            }
            "textDocument/didClose" => {
                if let Some(params) = parse_params::<TextDocumentParams>(params) {
                    self.open_documents.remove(&params.text_document.uri);
                }
            }
            "textDocument/didSave" => {
                if let Some(params) = parse_params::<TextDocumentParams>(params) {
                    let uri = params.text_document.uri;
                    let language_id = self
                        .open_documents
                        .get(&uri)
                        .map(String::as_str)
                        .or_else(|| protocol::language_id_for_uri(&uri));
                    match language_id {
                        Some(language_id) => {
                            self.orchestrator.on_document_saved(language_id);
                        }
                        None => tracing::trace!(uri, "Save of document with unknown language"),
                    }
                }
            }
            "workspace/didChangeWorkspaceFolders" => {
                if let Some(params) = parse_params::<DidChangeWorkspaceFoldersParams>(params) {
                    return self.change_workspace_folders(&params);
                }
            }
            _ => {
                tracing::trace!("Ignoring notification: {method}");
            }
        }
        Vec::new()
    }

    fn change_workspace_folders(
        &mut self,
        params: &DidChangeWorkspaceFoldersParams,
    ) -> Vec<serde_json::Value> {
        let mut publications = Vec::new();
        for folder in &params.event.removed {
            if let Some(root) = protocol::file_uri_to_path(&folder.uri) {
                publications.extend(self.orchestrator.remove_root(&root));
            }
        }
        let added: Vec<PathBuf> = params
            .event
            .added
            .iter()
            .filter_map(|folder| protocol::file_uri_to_path(&folder.uri))
            .collect();
        for root in added {
            self.orchestrator.add_root(root);
        }
        publication_frames(&publications)
    }
}

/// `publishDiagnostics` notifications for `publications`.
///
/// Paths that cannot become file URIs are logged and skipped.
fn publication_frames(publications: &[Publication]) -> Vec<serde_json::Value> {
    publications
        .iter()
        .filter_map(|publication| {
            match protocol::publish_diagnostics_params(publication.path(), publication.items()) {
                Ok(params) => {
                    let notification =
                        Notification::new("textDocument/publishDiagnostics", Some(params));
                    serde_json::to_value(&notification).ok()
                }
                Err(e) => {
                    tracing::warn!("Skipping diagnostics publication: {e:#}");
                    None
                }
            }
        })
        .collect()
}

async fn write_all<W: AsyncWrite + Unpin>(
    writer: &mut FrameWriter<W>,
    frames: &[serde_json::Value],
) -> Result<()> {
    for frame in frames {
        writer.write_frame(frame).await?;
    }
    Ok(())
}
