//! Kiln Language Server.
//!
//! Usage:
//!   kiln-lsp              # Start LSP server (stdio)
//!   kiln-lsp --version    # Print version
//!   kiln-lsp --help       # Print help

use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("kiln-lsp {}", kiln_lsp::VERSION);
        return ExitCode::SUCCESS;
    }

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Kiln Language Server");
        println!();
        println!("Usage: kiln-lsp [OPTIONS]");
        println!();
        println!("Options:");
        println!("  -h, --help     Print help");
        println!("  -V, --version  Print version");
        println!();
        println!("The server communicates via stdio using the Language Server Protocol.");
        println!();
        println!("Environment variables:");
        println!("  RUST_LOG       Set log level (e.g., RUST_LOG=kiln_lsp=debug)");
        return ExitCode::SUCCESS;
    }

    // Logs go to stderr; stdout belongs to the protocol.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kiln_lsp=info".parse().expect("valid directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    match kiln_lsp::start_stdio() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("server error: {e}");
            ExitCode::FAILURE
        }
    }
}
