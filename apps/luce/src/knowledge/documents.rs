//! Document Resolver: maps a project and a document kind to an embedded
//! excerpt and a downloadable file reference.

use serde::{Deserialize, Serialize};

/// Maximum characters of a document embedded into the model context.
pub const EXCERPT_MAX_CHARS: usize = 2200;
const EXCERPT_MARKER: &str = "\n[...]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocKind {
    Architecture,
    Readme,
}

impl DocKind {
    /// Canonical order used for excerpts and download lookups.
    pub const ORDER: [DocKind; 2] = [DocKind::Architecture, DocKind::Readme];

    pub fn display_name(&self) -> &'static str {
        match self {
            DocKind::Architecture => "Architecture",
            DocKind::Readme => "README",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "architecture" => Some(DocKind::Architecture),
            "readme" => Some(DocKind::Readme),
            _ => None,
        }
    }
}

/// Keyword phrases signalling a request for architecture notes.
pub const ARCHITECTURE_KEYWORDS: &[&str] = &[
    "architettura",
    "architecture",
    "design tecnico",
    "componenti interni",
    "diagramma",
    "pipeline tecnica",
    "struttura interna",
    "moduli interni",
];

/// Keyword phrases signalling a request for the readme.
pub const README_KEYWORDS: &[&str] = &[
    "readme",
    "setup",
    "installazione",
    "istruzioni",
    "come si usa",
    "come avviare",
    "run",
    "guida operativa",
];

/// Keyword phrases asking for an evaluation, which needs both documents.
pub const EVALUATION_KEYWORDS: &[&str] = &[
    "valutazione",
    "valuta",
    "pregi",
    "difetti",
    "pro e contro",
    "assessment",
    "analisi tecnica",
    "review",
];

/// A loaded project document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    pub kind: DocKind,
    pub label: String,
    pub filename: String,
    pub raw: String,
}

impl DocumentRecord {
    pub fn url(&self) -> String {
        format!("/documents/{}", self.filename)
    }

    /// The document text cut to `EXCERPT_MAX_CHARS` characters.
    pub fn excerpt(&self) -> String {
        truncate_with_marker(&self.raw, EXCERPT_MAX_CHARS, EXCERPT_MARKER)
    }

    pub fn download_info(&self) -> DownloadInfo {
        DownloadInfo {
            label: self.label.clone(),
            url: self.url(),
            filename: self.filename.clone(),
        }
    }
}

/// The documents attached to one project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSet {
    pub architecture: Option<DocumentRecord>,
    pub readme: Option<DocumentRecord>,
}

impl DocumentSet {
    pub fn get(&self, kind: DocKind) -> Option<&DocumentRecord> {
        match kind {
            DocKind::Architecture => self.architecture.as_ref(),
            DocKind::Readme => self.readme.as_ref(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentRecord> {
        self.architecture.iter().chain(self.readme.iter())
    }
}

/// What the client needs to trigger a browser download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadInfo {
    pub label: String,
    pub url: String,
    pub filename: String,
}

/// Cuts `text` to at most `max_chars` characters, appending `marker` when cut.
pub fn truncate_with_marker(text: &str, max_chars: usize, marker: &str) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{marker}", &text[..byte_idx]),
        None => text.to_string(),
    }
}
