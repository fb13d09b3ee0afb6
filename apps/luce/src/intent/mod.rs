//! Prompt Intent Router: classifies a user utterance against the static
//! knowledge store without any network I/O.
//!
//! The router and the Answer Composer share the `IntentResult` type below, so
//! the composer can only ever receive a shape the router is able to produce.

pub mod router;
pub mod rules;
pub mod text;

use crate::knowledge::{DocKind, Project, ProjectSummary};

pub use router::{IntentRouter, MIN_PROJECT_TOKEN_LEN};

/// Outcome of classifying one utterance. Produced once per user message and
/// consumed immediately.
#[derive(Debug, Clone, PartialEq)]
pub enum IntentResult {
    /// The router can answer (or must ask for confirmation) without the model.
    StopAndAnswerDirectly(StopReason),
    /// Defer to the model with the attached context.
    Continue(Intent),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    CvRequest,
    /// A project document was asked for; confirm before spending a model call.
    ProjectDocConfirm {
        project: Project,
        doc_preference: Vec<DocKind>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Project {
        project: Project,
        /// Documents to embed as excerpts. Empty unless the user confirmed.
        doc_preference: Vec<DocKind>,
    },
    About {
        subtype: String,
        data: AboutData,
    },
    ProjectsList(Vec<Project>),
    Unknown,
}

/// Biography fields picked for an `About` intent, in pick order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AboutData {
    pub fields: Vec<(String, String)>,
    pub projects_summary: Vec<ProjectSummary>,
    pub cv_available: bool,
}

impl AboutData {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl IntentResult {
    pub fn unknown() -> Self {
        IntentResult::Continue(Intent::Unknown)
    }

    /// Stable label used in logs and API responses.
    pub fn label(&self) -> &'static str {
        match self {
            IntentResult::StopAndAnswerDirectly(StopReason::CvRequest) => "cv_request",
            IntentResult::StopAndAnswerDirectly(StopReason::ProjectDocConfirm { .. }) => {
                "project_doc_confirm"
            }
            IntentResult::Continue(Intent::Project { .. }) => "project",
            IntentResult::Continue(Intent::About { .. }) => "about",
            IntentResult::Continue(Intent::ProjectsList(_)) => "projects_list",
            IntentResult::Continue(Intent::Unknown) => "unknown",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, IntentResult::Continue(Intent::Unknown))
    }
}
