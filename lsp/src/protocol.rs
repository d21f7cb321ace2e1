//! LSP message serde types for JSON-RPC communication with the editor.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use nudge_types::{Diagnostic, Range, SOURCE_TAG};

/// Command that toggles scanning on and off.
pub const CHECK_WORKSPACE_COMMAND: &str = "nudge.checkWorkspace";

pub(crate) const INVALID_REQUEST: i64 = -32600;
pub(crate) const METHOD_NOT_FOUND: i64 = -32601;
pub(crate) const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, thiserror::Error)]
#[error("cannot convert path to file URI: {}", path.display())]
pub(crate) struct PathToUriError {
    path: PathBuf,
}

#[derive(Debug, Serialize)]
pub(crate) struct Notification {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl Notification {
    pub fn new(method: &'static str, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
        }
    }
}

pub(crate) fn response(id: &serde_json::Value, result: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub(crate) fn error_response(id: &serde_json::Value, code: i64, message: &str) -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
}

pub(crate) fn initialize_result() -> serde_json::Value {
    serde_json::json!({
        "capabilities": {
            "textDocumentSync": {
                "openClose": true,
                "change": 0,
                "save": { "includeText": false }
            },
            "executeCommandProvider": {
                "commands": [CHECK_WORKSPACE_COMMAND]
            },
            "workspace": {
                "workspaceFolders": {
                    "supported": true,
                    "changeNotifications": true
                }
            }
        },
        "serverInfo": {
            "name": "nudge-ls",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

// ── Incoming params ────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InitializeParams {
    #[serde(default)]
    pub workspace_folders: Option<Vec<WorkspaceFolder>>,
    #[serde(default)]
    pub root_uri: Option<String>,
    #[serde(default)]
    pub root_path: Option<String>,
}

impl InitializeParams {
    /// Monitored roots: workspace folders, else `rootUri`, else `rootPath`.
    pub fn roots(&self) -> Vec<PathBuf> {
        if let Some(folders) = &self.workspace_folders
            && !folders.is_empty()
        {
            return folders
                .iter()
                .filter_map(|folder| file_uri_to_path(&folder.uri))
                .collect();
        }
        if let Some(path) = self.root_uri.as_deref().and_then(file_uri_to_path) {
            return vec![path];
        }
        self.root_path
            .as_deref()
            .map(PathBuf::from)
            .filter(|path| path.is_absolute())
            .into_iter()
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkspaceFolder {
    pub uri: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DidChangeWorkspaceFoldersParams {
    pub event: WorkspaceFoldersChangeEvent,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkspaceFoldersChangeEvent {
    #[serde(default)]
    pub added: Vec<WorkspaceFolder>,
    #[serde(default)]
    pub removed: Vec<WorkspaceFolder>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DidOpenTextDocumentParams {
    pub text_document: TextDocumentItem,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TextDocumentItem {
    pub uri: String,
    pub language_id: String,
}

/// Params of `didSave` and `didClose`; both carry just the identifier we need.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TextDocumentParams {
    pub text_document: TextDocumentIdentifier,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextDocumentIdentifier {
    pub uri: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExecuteCommandParams {
    pub command: String,
}

// ── Outgoing diagnostics ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct PublishDiagnosticsParams {
    pub uri: String,
    pub diagnostics: Vec<LspDiagnostic>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LspDiagnostic {
    pub range: Range,
    pub severity: u8,
    pub code: &'static str,
    pub source: &'static str,
    pub message: String,
}

impl LspDiagnostic {
    pub fn from_diagnostic(diagnostic: &Diagnostic) -> Self {
        Self {
            range: diagnostic.range(),
            severity: diagnostic.severity().to_lsp(),
            code: SOURCE_TAG,
            source: diagnostic.source(),
            message: diagnostic.message().to_string(),
        }
    }
}

pub(crate) fn publish_diagnostics_params(
    path: &Path,
    items: &[Diagnostic],
) -> Result<serde_json::Value> {
    let params = PublishDiagnosticsParams {
        uri: path_to_file_uri(path)?.to_string(),
        diagnostics: items.iter().map(LspDiagnostic::from_diagnostic).collect(),
    };
    serde_json::to_value(&params).context("serializing publishDiagnostics params")
}

pub(crate) fn path_to_file_uri(path: &Path) -> Result<url::Url, PathToUriError> {
    url::Url::from_file_path(path).map_err(|()| PathToUriError {
        path: path.to_path_buf(),
    })
}

pub(crate) fn file_uri_to_path(uri: &str) -> Option<PathBuf> {
    url::Url::parse(uri)
        .ok()
        .and_then(|u| u.to_file_path().ok())
}

/// Language id implied by a document URI's extension, for saves of
/// documents the client never opened with us.
pub(crate) fn language_id_for_uri(uri: &str) -> Option<&'static str> {
    let path = file_uri_to_path(uri)?;
    match path.extension()?.to_str()? {
        "go" => Some("go"),
        "rs" => Some("rust"),
        "c" | "h" => Some("c"),
        _ => None,
    }
}
