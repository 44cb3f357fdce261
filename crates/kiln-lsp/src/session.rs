//! Single-document session state.
//!
//! The playground edits exactly one buffer at a time, so the session
//! holds at most one open document. `didOpen` replaces it
//! unconditionally and `didChange` swaps the full text; both invalidate
//! the cached analysis snapshot, which is recomputed lazily on the next
//! completion/hover/diagnostics call.

use kiln_compiler::{analyze, Analysis};
use kiln_core::Submission;
use lsp_types::Uri;
use ropey::Rope;
use std::sync::Arc;

/// The open document.
#[derive(Debug)]
pub struct Document {
    /// The document URI.
    uri: Uri,
    /// The document content as a rope for cheap cloning of edits.
    content: Rope,
    /// The document version (bumped on each change).
    version: i32,
    /// Cached analysis snapshot (lazily computed, invalidated on change).
    analysis_cache: Option<Arc<Analysis>>,
}

impl Document {
    fn new(uri: Uri, text: String, version: i32) -> Self {
        Self {
            uri,
            content: Rope::from_str(&text),
            version,
            analysis_cache: None,
        }
    }

    /// The file name used for diagnostics, derived from the URI.
    fn file_name(&self) -> String {
        self.uri
            .as_str()
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("main.kiln")
            .to_string()
    }
}

/// An immutable view of the session taken for one provider call.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// The document URI.
    pub uri: Uri,
    /// The file name diagnostics are reported against.
    pub file_name: String,
    /// The full document text.
    pub text: String,
    /// The analysis of that text.
    pub analysis: Arc<Analysis>,
}

/// Session state: at most one open document.
#[derive(Debug, Default)]
pub struct Session {
    document: Option<Document>,
}

impl Session {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a document, replacing any previously open one.
    pub fn open(&mut self, uri: Uri, text: String, version: i32) {
        if let Some(old) = &self.document {
            if old.uri != uri {
                tracing::info!("replacing open document {}", old.uri.as_str());
            }
        }
        self.document = Some(Document::new(uri, text, version));
    }

    /// Replace the document text in full.
    pub fn change(&mut self, uri: &Uri, text: String, version: i32) {
        match &mut self.document {
            Some(doc) if doc.uri == *uri => {
                doc.content = Rope::from_str(&text);
                doc.version = version;
                doc.analysis_cache = None;
            }
            _ => {
                tracing::warn!("change for a document that is not open: {}", uri.as_str());
                self.document = Some(Document::new(uri.clone(), text, version));
            }
        }
    }

    /// Close the document. A close for a different URI is ignored.
    pub fn close(&mut self, uri: &Uri) {
        if self.document.as_ref().is_some_and(|d| d.uri == *uri) {
            self.document = None;
        }
    }

    /// Whether a document is open.
    pub fn is_open(&self) -> bool {
        self.document.is_some()
    }

    /// The version of the open document.
    pub fn version(&self) -> Option<i32> {
        self.document.as_ref().map(|d| d.version)
    }

    /// Take a snapshot of the open document, computing the analysis if
    /// the cache was invalidated. Returns `None` when nothing is open.
    pub fn snapshot(&mut self) -> Option<Snapshot> {
        let doc = self.document.as_mut()?;
        let file_name = doc.file_name();
        let text = doc.content.to_string();
        let analysis = match &doc.analysis_cache {
            Some(cached) => Arc::clone(cached),
            None => {
                let analysis = Arc::new(analyze(&Submission::single(&file_name, &text)));
                doc.analysis_cache = Some(Arc::clone(&analysis));
                analysis
            }
        };
        Some(Snapshot {
            uri: doc.uri.clone(),
            file_name,
            text,
            analysis,
        })
    }
}
