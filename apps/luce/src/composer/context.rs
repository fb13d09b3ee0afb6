//! Context payload builders: turn a classified intent into the system
//! messages that ground the model's reply.

use crate::composer::prompts;
use crate::intent::{AboutData, Intent};
use crate::knowledge::documents::truncate_with_marker;
use crate::knowledge::{DocKind, KnowledgeStore, Project};
use crate::llm_client::ChatMessage;

/// Modules listed per project before the rest collapse into a "+N" counter.
pub const MAX_LISTED_MODULES: usize = 8;
pub const DESCRIPTION_MAX_CHARS: usize = 220;

/// Fields rendered first, in this order, for an `about` context.
const ABOUT_KEY_ORDER: [&str; 7] = [
    "name",
    "summary",
    "bio",
    "general_info",
    "school",
    "university",
    "age",
];

pub fn context_messages(intent: &Intent, knowledge: &KnowledgeStore) -> Vec<ChatMessage> {
    match intent {
        Intent::Project {
            project,
            doc_preference,
        } => {
            let mut messages = vec![ChatMessage::system(project_context(project))];
            messages.extend(document_messages(project, doc_preference, knowledge));
            messages
        }
        Intent::About { data, .. } => vec![ChatMessage::system(format!(
            "{}\n{}\n\n{}",
            prompts::about_header(),
            about_lines(data),
            prompts::ABOUT_INSTRUCTIONS
        ))],
        Intent::ProjectsList(projects) => vec![ChatMessage::system(format!(
            "{}\n{}\n\n{}",
            prompts::PROJECTS_LIST_HEADER,
            projects_list_lines(projects),
            prompts::PROJECTS_LIST_INSTRUCTIONS
        ))],
        Intent::Unknown => vec![ChatMessage::system(prompts::UNKNOWN_INSTRUCTIONS)],
    }
}

/// Literal project fields. Nothing here is inferred.
pub fn project_context(project: &Project) -> String {
    let languages = project
        .languages
        .iter()
        .map(|(lang, pct)| format!("{lang} {pct:.1}%"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{header}\nID: {id}\nNome: {name}\nSottotitolo: {subtitle}\nCategoria: {category}\n\
        Descrizione: {description}\nModuli: {modules}\nCreato il: {created}\nLinguaggi: {languages}\n\n\
        {instructions}",
        header = prompts::project_header(),
        id = project.id,
        name = project.name,
        subtitle = project.subtitle.as_deref().unwrap_or_default(),
        category = project.categories().join(", "),
        description = project.description.as_deref().unwrap_or_default(),
        modules = project.modules.join(", "),
        created = project.created_at.as_deref().unwrap_or_default(),
        instructions = prompts::PROJECT_INSTRUCTIONS,
    )
}

/// One message per requested document that exists, architecture before readme.
pub fn document_messages(
    project: &Project,
    doc_preference: &[DocKind],
    knowledge: &KnowledgeStore,
) -> Vec<ChatMessage> {
    DocKind::ORDER
        .into_iter()
        .filter(|kind| doc_preference.contains(kind))
        .filter_map(|kind| {
            let doc = knowledge.document(&project.id, kind)?;
            Some(ChatMessage::system(format!(
                "{}\n{}",
                prompts::document_header(kind, project),
                doc.excerpt()
            )))
        })
        .collect()
}

pub fn about_lines(data: &AboutData) -> String {
    let mut lines = Vec::new();

    for key in ABOUT_KEY_ORDER {
        if let Some(value) = data.get(key) {
            lines.push(format!("{}: {value}", capitalize(key)));
        }
    }

    if !data.projects_summary.is_empty() {
        lines.push("Projects summary:".to_string());
        for p in &data.projects_summary {
            let subtitle = p
                .subtitle
                .as_deref()
                .map(|s| format!(": {s}"))
                .unwrap_or_default();
            lines.push(format!("- {}{subtitle} ({})", p.name, p.id));
        }
    }

    if data.cv_available {
        lines.push("CV available: yes".to_string());
    }

    for (key, value) in &data.fields {
        if !ABOUT_KEY_ORDER.contains(&key.as_str()) {
            lines.push(format!("{}: {value}", capitalize(key)));
        }
    }

    lines.join("\n")
}

pub fn projects_list_lines(projects: &[Project]) -> String {
    projects
        .iter()
        .map(|p| {
            let mut line = format!("- {}", p.name);
            let categories = p.categories();
            if !categories.is_empty() {
                line.push_str(&format!(" [{}]", categories.join(", ")));
            }
            if let Some(subtitle) = p.subtitle.as_deref() {
                line.push_str(&format!(": {subtitle}"));
            }
            if !p.modules.is_empty() {
                line.push_str(&format!(" | Moduli: {}", capped_modules(&p.modules)));
            }
            if let Some(desc) = p.description.as_deref().filter(|d| !d.trim().is_empty()) {
                line.push_str(&format!(
                    " | Descrizione: {}",
                    truncate_with_marker(desc.trim(), DESCRIPTION_MAX_CHARS, "...")
                ));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `A, B, C (+2)` once the list exceeds `MAX_LISTED_MODULES`.
pub fn capped_modules(modules: &[String]) -> String {
    let shown = modules
        .iter()
        .take(MAX_LISTED_MODULES)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    match modules.len().saturating_sub(MAX_LISTED_MODULES) {
        0 => shown,
        hidden => format!("{shown} (+{hidden})"),
    }
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
