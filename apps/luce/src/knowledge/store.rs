use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::knowledge::documents::{DocKind, DocumentRecord, DocumentSet, DownloadInfo};
use crate::knowledge::models::{DocumentSource, Profile, Project, ProjectSummary};

/// Number of projects attached to biography answers that ask for a summary.
pub const PROJECTS_SUMMARY_LIMIT: usize = 5;

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("duplicate project id '{0}'")]
    DuplicateProject(String),
}

/// Read-only profile, projects and documents, loaded once at startup.
///
/// Passed explicitly (usually as `Arc<KnowledgeStore>`) to everything that
/// needs it; there is no global instance.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeStore {
    profile: Profile,
    projects: Vec<Project>,
    documents: HashMap<String, DocumentSet>,
}

impl KnowledgeStore {
    /// Builds a store from already-parsed data. Rejects duplicate project ids.
    pub fn from_parts(
        profile: Profile,
        projects: Vec<Project>,
        documents: HashMap<String, DocumentSet>,
    ) -> Result<Self, KnowledgeError> {
        let mut seen = HashSet::new();
        for project in &projects {
            if !seen.insert(project.id.as_str()) {
                return Err(KnowledgeError::DuplicateProject(project.id.clone()));
            }
        }
        Ok(Self {
            profile,
            projects,
            documents,
        })
    }

    /// Loads `about.json`, `projects.json` and every referenced file under
    /// `documents/` from `data_dir`.
    pub fn load(data_dir: &Path) -> Result<Self, KnowledgeError> {
        let profile: Profile = read_json(&data_dir.join("about.json"))?;
        let projects: Vec<Project> = read_json(&data_dir.join("projects.json"))?;

        let docs_dir = data_dir.join("documents");
        let mut documents = HashMap::new();
        for project in &projects {
            let Some(sources) = &project.documents else {
                continue;
            };
            let set = DocumentSet {
                architecture: load_document(
                    &docs_dir,
                    project,
                    DocKind::Architecture,
                    sources.architecture.as_ref(),
                )?,
                readme: load_document(&docs_dir, project, DocKind::Readme, sources.readme.as_ref())?,
            };
            debug!(project = %project.id, count = set.iter().count(), "Loaded project documents");
            documents.insert(project.id.clone(), set);
        }

        let store = Self::from_parts(profile, projects, documents)?;
        info!(
            projects = store.projects.len(),
            categories = store.profile.categories.len(),
            "Knowledge store loaded from {}",
            data_dir.display()
        );
        Ok(store)
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// `{id, name, subtitle}` of the first `max` projects.
    pub fn projects_summary(&self, max: usize) -> Vec<ProjectSummary> {
        self.projects.iter().take(max).map(ProjectSummary::from).collect()
    }

    pub fn document(&self, project_id: &str, kind: DocKind) -> Option<&DocumentRecord> {
        self.documents.get(project_id).and_then(|set| set.get(kind))
    }

    pub fn document_by_filename(&self, filename: &str) -> Option<&DocumentRecord> {
        self.documents
            .values()
            .flat_map(DocumentSet::iter)
            .find(|doc| doc.filename == filename)
    }

    /// First available document for `project_id`, walking `prefs` in order
    /// (every kind when `prefs` is empty).
    pub fn download_info(&self, project_id: &str, prefs: &[DocKind]) -> Option<DownloadInfo> {
        let set = self.documents.get(project_id)?;
        let order: &[DocKind] = if prefs.is_empty() { &DocKind::ORDER } else { prefs };
        order
            .iter()
            .find_map(|kind| set.get(*kind))
            .map(DocumentRecord::download_info)
    }

    pub fn cv_download(&self) -> Option<DownloadInfo> {
        self.profile.cv.as_ref().map(|cv| DownloadInfo {
            label: cv.label.clone(),
            url: format!("/cv/{}", cv.filename),
            filename: cv.filename.clone(),
        })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, KnowledgeError> {
    let text = std::fs::read_to_string(path).map_err(|source| KnowledgeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| KnowledgeError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn load_document(
    docs_dir: &Path,
    project: &Project,
    kind: DocKind,
    source: Option<&DocumentSource>,
) -> Result<Option<DocumentRecord>, KnowledgeError> {
    let Some(source) = source else {
        return Ok(None);
    };
    let path = docs_dir.join(&source.file);
    let raw = std::fs::read_to_string(&path).map_err(|err| KnowledgeError::Io {
        path: path.clone(),
        source: err,
    })?;
    let label = source
        .label
        .clone()
        .unwrap_or_else(|| format!("{} · {}", kind.display_name(), project.name));
    Ok(Some(DocumentRecord {
        kind,
        label,
        filename: source.file.clone(),
        raw,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const ABOUT: &str = r#"{
        "name": "Giuseppe Rubino",
        "bio": "Sviluppatore appassionato di AI.",
        "cv": { "filename": "Giuseppe_Rubino_CV.pdf" },
        "categories": [
            { "id": "studies", "label": "studi", "keywords": ["dove ha studiato"], "fields": ["school"] }
        ]
    }"#;

    const PROJECTS: &str = r#"[
        {
            "id": "proj-6",
            "name": "Decod v2",
            "modules": ["Python", "FastAPI"],
            "documents": {
                "architecture": { "file": "ARCHITECTURE_decod.md", "label": "Architecture · Decod v2" },
                "readme": { "file": "README_decod.md" }
            }
        },
        { "id": "proj-7", "name": "Pixel-dei" }
    ]"#;

    fn write_data_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("about.json"), ABOUT).unwrap();
        fs::write(dir.path().join("projects.json"), PROJECTS).unwrap();
        fs::create_dir(dir.path().join("documents")).unwrap();
        fs::write(
            dir.path().join("documents/ARCHITECTURE_decod.md"),
            "# Architettura\nTre stadi.",
        )
        .unwrap();
        fs::write(dir.path().join("documents/README_decod.md"), "# README\nuv run decod").unwrap();
        dir
    }

    #[test]
    fn test_load_reads_profile_projects_and_documents() {
        let dir = write_data_dir();
        let store = KnowledgeStore::load(dir.path()).unwrap();

        assert_eq!(store.projects().len(), 2);
        assert_eq!(store.profile().categories[0].id, "studies");
        let arch = store.document("proj-6", DocKind::Architecture).unwrap();
        assert_eq!(arch.raw, "# Architettura\nTre stadi.");
        let readme = store.document("proj-6", DocKind::Readme).unwrap();
        assert_eq!(readme.label, "README · Decod v2");
    }

    #[test]
    fn test_load_fails_on_missing_document_file() {
        let dir = write_data_dir();
        fs::remove_file(dir.path().join("documents/README_decod.md")).unwrap();

        let err = KnowledgeStore::load(dir.path()).unwrap_err();
        assert!(matches!(err, KnowledgeError::Io { .. }));
    }

    #[test]
    fn test_from_parts_rejects_duplicate_ids() {
        let projects: Vec<Project> = serde_json::from_str(
            r#"[{"id": "p", "name": "A"}, {"id": "p", "name": "B"}]"#,
        )
        .unwrap();

        let err = KnowledgeStore::from_parts(Profile::default(), projects, HashMap::new()).unwrap_err();
        assert!(matches!(err, KnowledgeError::DuplicateProject(id) if id == "p"));
    }

    #[test]
    fn test_download_info_follows_preference_order() {
        let dir = write_data_dir();
        let store = KnowledgeStore::load(dir.path()).unwrap();

        let readme = store.download_info("proj-6", &[DocKind::Readme]).unwrap();
        assert_eq!(readme.filename, "README_decod.md");

        let default = store.download_info("proj-6", &[]).unwrap();
        assert_eq!(default.filename, "ARCHITECTURE_decod.md");

        assert!(store.download_info("proj-7", &[]).is_none());
        assert!(store.download_info("missing", &[]).is_none());
    }

    #[test]
    fn test_cv_download_uses_default_label() {
        let dir = write_data_dir();
        let store = KnowledgeStore::load(dir.path()).unwrap();

        let cv = store.cv_download().unwrap();
        assert_eq!(cv.label, "Scarica CV");
        assert_eq!(cv.url, "/cv/Giuseppe_Rubino_CV.pdf");
    }

    #[test]
    fn test_projects_summary_is_capped() {
        let projects: Vec<Project> = (0..8)
            .map(|i| serde_json::from_value(serde_json::json!({"id": format!("p{i}"), "name": format!("P{i}")})).unwrap())
            .collect();
        let store = KnowledgeStore::from_parts(Profile::default(), projects, HashMap::new()).unwrap();

        let summary = store.projects_summary(PROJECTS_SUMMARY_LIMIT);
        assert_eq!(summary.len(), 5);
        assert_eq!(summary[0].id, "p0");
    }
}
