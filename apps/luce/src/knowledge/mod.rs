//! Knowledge Store: the owner's profile, the project list and the project
//! documents, loaded once and shared read-only.

pub mod documents;
pub mod handlers;
pub mod models;
pub mod store;

pub use documents::{DocKind, DownloadInfo};
pub use models::{Profile, Project, ProjectSummary, TopicCategory};
pub use store::KnowledgeStore;
