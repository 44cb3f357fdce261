//! Main event loop for the LSP server.
//!
//! Notifications are handled synchronously against the session;
//! requests are dispatched by method name and answered from an
//! immutable snapshot. An unknown method answers MethodNotFound and
//! malformed params fail only that call; neither kills the loop.

use crate::handlers::completion::handle_completion;
use crate::handlers::diagnostics::to_lsp_diagnostics;
use crate::handlers::hover::handle_hover;
use crate::session::Session;
use crossbeam_channel::{Receiver, Sender};
use lsp_types::notification::{
    DidChangeTextDocument, DidCloseTextDocument, DidOpenTextDocument, Notification,
    PublishDiagnostics,
};
use lsp_types::request::{
    Completion, DocumentDiagnosticRequest, HoverRequest, Request, Shutdown,
};
use lsp_types::{
    CompletionParams, DocumentDiagnosticParams, DocumentDiagnosticReport,
    DocumentDiagnosticReportResult, FullDocumentDiagnosticReport, HoverParams,
    PublishDiagnosticsParams, RelatedFullDocumentDiagnosticReport, Uri,
};

/// Why a request could not be answered.
enum DispatchError {
    /// No document has been opened yet.
    NoDocument,
    /// The params did not deserialize.
    InvalidParams(String),
    /// The method is not one we implement.
    Unhandled(String),
}

impl DispatchError {
    fn code(&self) -> lsp_server::ErrorCode {
        match self {
            Self::NoDocument => lsp_server::ErrorCode::InvalidRequest,
            Self::InvalidParams(_) => lsp_server::ErrorCode::InvalidParams,
            Self::Unhandled(_) => lsp_server::ErrorCode::MethodNotFound,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::NoDocument => "no document open".to_string(),
            Self::InvalidParams(e) => format!("invalid params: {e}"),
            Self::Unhandled(method) => format!("unhandled request: {method}"),
        }
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(
    params: serde_json::Value,
) -> Result<T, DispatchError> {
    serde_json::from_value(params).map_err(|e| DispatchError::InvalidParams(e.to_string()))
}

/// State managed by the main loop.
pub struct MainLoopState {
    /// The single-document session.
    session: Session,
    /// Sender for outgoing LSP messages.
    sender: Sender<lsp_server::Message>,
    /// Whether shutdown was requested.
    shutdown_requested: bool,
}

impl MainLoopState {
    /// Create a new main loop state.
    pub fn new(sender: Sender<lsp_server::Message>) -> Self {
        Self {
            session: Session::new(),
            sender,
            shutdown_requested: false,
        }
    }

    /// Handle one incoming LSP message.
    pub fn handle_message(&mut self, msg: lsp_server::Message) {
        match msg {
            lsp_server::Message::Request(req) => self.handle_request(req),
            lsp_server::Message::Notification(notif) => self.handle_notification(notif),
            // We never send requests to the client.
            lsp_server::Message::Response(_) => {}
        }
    }

    fn handle_request(&mut self, req: lsp_server::Request) {
        let id = req.id.clone();

        let result = match req.method.as_str() {
            Shutdown::METHOD => {
                self.shutdown_requested = true;
                Ok(serde_json::Value::Null)
            }
            Completion::METHOD => self.handle_completion_request(req),
            HoverRequest::METHOD => self.handle_hover_request(req),
            DocumentDiagnosticRequest::METHOD => self.handle_diagnostic_request(req),
            method => {
                tracing::warn!(method, "unhandled request");
                Err(DispatchError::Unhandled(method.to_string()))
            }
        };

        let response = match result {
            Ok(value) => lsp_server::Response::new_ok(id, value),
            Err(err) => lsp_server::Response::new_err(id, err.code() as i32, err.message()),
        };
        self.send(lsp_server::Message::Response(response));
    }

    /// Handle the textDocument/completion request.
    fn handle_completion_request(
        &mut self,
        req: lsp_server::Request,
    ) -> Result<serde_json::Value, DispatchError> {
        let params: CompletionParams = parse_params(req.params)?;
        let snapshot = self.session.snapshot().ok_or(DispatchError::NoDocument)?;
        let response = handle_completion(&params, &snapshot);
        serde_json::to_value(response).map_err(|e| DispatchError::InvalidParams(e.to_string()))
    }

    /// Handle the textDocument/hover request.
    fn handle_hover_request(
        &mut self,
        req: lsp_server::Request,
    ) -> Result<serde_json::Value, DispatchError> {
        let params: HoverParams = parse_params(req.params)?;
        let snapshot = self.session.snapshot().ok_or(DispatchError::NoDocument)?;
        let response = handle_hover(&params, &snapshot);
        serde_json::to_value(response).map_err(|e| DispatchError::InvalidParams(e.to_string()))
    }

    /// Handle the textDocument/diagnostic (pull diagnostics) request.
    fn handle_diagnostic_request(
        &mut self,
        req: lsp_server::Request,
    ) -> Result<serde_json::Value, DispatchError> {
        let _params: DocumentDiagnosticParams = parse_params(req.params)?;
        let snapshot = self.session.snapshot().ok_or(DispatchError::NoDocument)?;
        let items = to_lsp_diagnostics(&snapshot.analysis, &snapshot.file_name);

        let report = DocumentDiagnosticReportResult::Report(DocumentDiagnosticReport::Full(
            RelatedFullDocumentDiagnosticReport {
                related_documents: None,
                full_document_diagnostic_report: FullDocumentDiagnosticReport {
                    result_id: None,
                    items,
                },
            },
        ));
        serde_json::to_value(report).map_err(|e| DispatchError::InvalidParams(e.to_string()))
    }

    fn handle_notification(&mut self, notif: lsp_server::Notification) {
        match notif.method.as_str() {
            DidOpenTextDocument::METHOD => {
                if let Ok(params) =
                    serde_json::from_value::<lsp_types::DidOpenTextDocumentParams>(notif.params)
                {
                    self.on_did_open(params);
                }
            }
            DidChangeTextDocument::METHOD => {
                if let Ok(params) =
                    serde_json::from_value::<lsp_types::DidChangeTextDocumentParams>(notif.params)
                {
                    self.on_did_change(params);
                }
            }
            DidCloseTextDocument::METHOD => {
                if let Ok(params) =
                    serde_json::from_value::<lsp_types::DidCloseTextDocumentParams>(notif.params)
                {
                    self.on_did_close(params);
                }
            }
            "initialized" => {
                tracing::info!("client initialized");
            }
            "exit" => {
                tracing::info!("exit notification received");
                std::process::exit(if self.shutdown_requested { 0 } else { 1 });
            }
            method => {
                tracing::debug!(method, "unhandled notification");
            }
        }
    }

    fn on_did_open(&mut self, params: lsp_types::DidOpenTextDocumentParams) {
        let doc = params.text_document;
        tracing::info!("document opened: {}", doc.uri.as_str());
        self.session.open(doc.uri, doc.text, doc.version);
        self.publish_diagnostics();
    }

    fn on_did_change(&mut self, params: lsp_types::DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        // Full sync: the last change carries the complete content.
        if let Some(change) = params.content_changes.into_iter().last() {
            tracing::debug!("document changed: {}", uri.as_str());
            self.session.change(&uri, change.text, version);
            self.publish_diagnostics();
        }
    }

    fn on_did_close(&mut self, params: lsp_types::DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::info!("document closed: {}", uri.as_str());
        self.session.close(&uri);
        self.send_diagnostics(&uri, vec![]);
    }

    /// Compute and publish diagnostics for the open document.
    fn publish_diagnostics(&mut self) {
        let Some(snapshot) = self.session.snapshot() else {
            return;
        };
        let diagnostics = to_lsp_diagnostics(&snapshot.analysis, &snapshot.file_name);
        tracing::debug!(
            count = diagnostics.len(),
            "publishing diagnostics for {}",
            snapshot.uri.as_str()
        );
        self.send_diagnostics(&snapshot.uri, diagnostics);
    }

    fn send_diagnostics(&self, uri: &Uri, diagnostics: Vec<lsp_types::Diagnostic>) {
        let params = PublishDiagnosticsParams {
            uri: uri.clone(),
            diagnostics,
            version: None,
        };
        let notif = lsp_server::Notification::new(PublishDiagnostics::METHOD.to_string(), params);
        self.send(lsp_server::Message::Notification(notif));
    }

    fn send(&self, msg: lsp_server::Message) {
        if let Err(e) = self.sender.send(msg) {
            tracing::error!("failed to send message: {e}");
        }
    }
}

/// Run the main event loop until the client channel closes.
pub fn run_main_loop(receiver: Receiver<lsp_server::Message>, sender: Sender<lsp_server::Message>) {
    let mut state = MainLoopState::new(sender);
    tracing::info!("main loop started");
    for msg in receiver {
        state.handle_message(msg);
    }
    tracing::info!("main loop ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use serde_json::json;

    fn state() -> (MainLoopState, Receiver<lsp_server::Message>) {
        let (tx, rx) = unbounded();
        (MainLoopState::new(tx), rx)
    }

    fn open(state: &mut MainLoopState, text: &str) {
        state.handle_message(lsp_server::Message::Notification(
            lsp_server::Notification::new(
                DidOpenTextDocument::METHOD.to_string(),
                json!({
                    "textDocument": {
                        "uri": "file:///main.kiln",
                        "languageId": "kiln",
                        "version": 1,
                        "text": text,
                    }
                }),
            ),
        ));
    }

    fn request(state: &mut MainLoopState, method: &str, params: serde_json::Value) {
        state.handle_message(lsp_server::Message::Request(lsp_server::Request::new(
            lsp_server::RequestId::from(1),
            method.to_string(),
            params,
        )));
    }

    fn next_response(rx: &Receiver<lsp_server::Message>) -> lsp_server::Response {
        loop {
            match rx.try_recv().expect("a message") {
                lsp_server::Message::Response(resp) => return resp,
                // Skip published diagnostics.
                lsp_server::Message::Notification(_) => {}
                other => panic!("unexpected message: {other:?}"),
            }
        }
    }

    fn position_params() -> serde_json::Value {
        json!({
            "textDocument": { "uri": "file:///main.kiln" },
            "position": { "line": 0, "character": 12 },
        })
    }

    #[test]
    fn test_request_before_open_is_invalid() {
        let (mut state, rx) = state();
        request(&mut state, Completion::METHOD, position_params());
        let resp = next_response(&rx);
        let error = resp.error.expect("an error");
        assert_eq!(error.code, lsp_server::ErrorCode::InvalidRequest as i32);
        assert!(error.message.contains("no document open"));
    }

    #[test]
    fn test_unknown_method_is_method_not_found() {
        let (mut state, rx) = state();
        request(&mut state, "textDocument/frobnicate", json!({}));
        let error = next_response(&rx).error.expect("an error");
        assert_eq!(error.code, lsp_server::ErrorCode::MethodNotFound as i32);
    }

    #[test]
    fn test_open_publishes_diagnostics() {
        let (mut state, rx) = state();
        open(&mut state, "fn main() { println(x); }");
        let msg = rx.try_recv().expect("a notification");
        let lsp_server::Message::Notification(notif) = msg else {
            panic!("expected notification, got {msg:?}");
        };
        assert_eq!(notif.method, PublishDiagnostics::METHOD);
        let params: PublishDiagnosticsParams = serde_json::from_value(notif.params).unwrap();
        assert_eq!(params.diagnostics.len(), 1);
    }

    #[test]
    fn test_completion_after_open() {
        let (mut state, rx) = state();
        open(&mut state, "fn main() {  }");
        request(&mut state, Completion::METHOD, position_params());
        let resp = next_response(&rx);
        let items = resp.result.expect("a result");
        let labels: Vec<String> = items
            .as_array()
            .expect("an array")
            .iter()
            .map(|i| i["label"].as_str().unwrap().to_string())
            .collect();
        assert!(labels.contains(&"println".to_string()));
    }

    #[test]
    fn test_change_updates_diagnostics() {
        let (mut state, rx) = state();
        open(&mut state, "fn main() { }");
        state.handle_message(lsp_server::Message::Notification(
            lsp_server::Notification::new(
                DidChangeTextDocument::METHOD.to_string(),
                json!({
                    "textDocument": { "uri": "file:///main.kiln", "version": 2 },
                    "contentChanges": [ { "text": "fn main() { println(x); }" } ],
                }),
            ),
        ));
        // First publish (clean), then the one after the change.
        let mut published = Vec::new();
        while let Ok(lsp_server::Message::Notification(n)) = rx.try_recv() {
            let params: PublishDiagnosticsParams = serde_json::from_value(n.params).unwrap();
            published.push(params.diagnostics.len());
        }
        assert_eq!(published, vec![0, 1]);
    }

    #[test]
    fn test_malformed_params_fail_only_that_call() {
        let (mut state, rx) = state();
        open(&mut state, "fn main() { }");
        request(&mut state, Completion::METHOD, json!({ "bogus": true }));
        let error = next_response(&rx).error.expect("an error");
        assert_eq!(error.code, lsp_server::ErrorCode::InvalidParams as i32);

        // The loop is still alive and answers the next request.
        request(&mut state, Completion::METHOD, position_params());
        assert!(next_response(&rx).result.is_some());
    }
}
