use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ────────────────────────────────────────────────────────────────────────────
// Profile (about.json)
// ────────────────────────────────────────────────────────────────────────────

/// The portfolio owner's profile record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub university_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
    /// Stored as raw JSON because the data file uses both `"25"` and `25`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cv: Option<CvDocument>,
    /// Topic categories, matched in declaration order.
    #[serde(default)]
    pub categories: Vec<TopicCategory>,
    /// Any other scalar field a category may unlock by name.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Profile {
    /// Looks up a field by its data-file name, rendering scalars as text.
    pub fn field(&self, key: &str) -> Option<String> {
        let known = match key {
            "name" => self.name.clone(),
            "bio" => self.bio.clone(),
            "general_info" => self.general_info.clone(),
            "school_info" => self.school_info.clone(),
            "school" => self.school.clone(),
            "university_info" => self.university_info.clone(),
            "university" => self.university.clone(),
            "age" => self.age.as_ref().and_then(scalar_text),
            _ => return self.extra.get(key).and_then(scalar_text),
        };
        known.filter(|v| !v.trim().is_empty())
    }

    /// First word of the owner's name, lowercased (e.g. "giuseppe").
    pub fn first_name(&self) -> Option<String> {
        self.name
            .as_deref()
            .and_then(|n| n.split_whitespace().next())
            .map(|n| n.to_lowercase())
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reference to the downloadable CV stored in the data directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvDocument {
    pub filename: String,
    #[serde(default = "default_cv_label")]
    pub label: String,
}

fn default_cv_label() -> String {
    "Scarica CV".to_string()
}

/// A biography topic the router can recognise from keywords or tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicCategory {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    /// Phrases matched as substrings of the utterance.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Single words matched against the utterance's token set.
    #[serde(default)]
    pub tokens: Vec<String>,
    /// Profile field names this topic unlocks.
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub include_projects_summary: bool,
}

impl TopicCategory {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Projects (projects.json)
// ────────────────────────────────────────────────────────────────────────────

/// A single portfolio project. Immutable for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ProjectCategory>,
    /// Technologies / modules in display order.
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// Language name → percentage of the codebase.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub languages: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<DocumentSources>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<MediaItem>,
}

impl Project {
    pub fn categories(&self) -> Vec<&str> {
        match &self.category {
            Some(ProjectCategory::One(c)) => vec![c.as_str()],
            Some(ProjectCategory::Many(cs)) => cs.iter().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }
}

/// The slice of a project attached to biography answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

impl From<&Project> for ProjectSummary {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            subtitle: project.subtitle.clone(),
        }
    }
}

/// The data file stores either a single category or a list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProjectCategory {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<DocumentSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<DocumentSource>,
}

/// Points at a markdown file under `documents/` in the data directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSource {
    pub file: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}
