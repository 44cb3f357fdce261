//! Server bootstrap: stdio transport and the initialize handshake.

use crate::main_loop::run_main_loop;
use lsp_server::Connection;

/// Start the LSP server using stdio transport.
pub fn start_stdio() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing::info!("starting LSP server on stdio");

    let (connection, io_threads) = Connection::stdio();

    // Wait for the initialize request.
    let (id, _params) = connection.initialize_start()?;

    let capabilities = lsp_types::ServerCapabilities {
        text_document_sync: Some(lsp_types::TextDocumentSyncCapability::Kind(
            lsp_types::TextDocumentSyncKind::FULL,
        )),
        completion_provider: Some(lsp_types::CompletionOptions::default()),
        hover_provider: Some(lsp_types::HoverProviderCapability::Simple(true)),
        diagnostic_provider: Some(lsp_types::DiagnosticServerCapabilities::Options(
            lsp_types::DiagnosticOptions::default(),
        )),
        ..Default::default()
    };

    let init_result = lsp_types::InitializeResult {
        capabilities,
        server_info: Some(lsp_types::ServerInfo {
            name: "kiln-lsp".to_string(),
            version: Some(crate::VERSION.to_string()),
        }),
    };

    // Complete the initialization handshake.
    connection.initialize_finish(id, serde_json::to_value(init_result)?)?;
    tracing::info!("LSP initialized");

    let (sender, receiver) = (connection.sender, connection.receiver);
    run_main_loop(receiver, sender);

    io_threads.join()?;
    Ok(())
}
