//! The ordered classification rules. Each rule is a plain function that either
//! claims the utterance or passes; the router stops at the first claim.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::intent::text::{tokenize, NormalizedText};
use crate::intent::{AboutData, Intent, IntentResult, StopReason};
use crate::knowledge::documents::{ARCHITECTURE_KEYWORDS, EVALUATION_KEYWORDS, README_KEYWORDS};
use crate::knowledge::store::PROJECTS_SUMMARY_LIMIT;
use crate::knowledge::{DocKind, KnowledgeStore, Profile, Project};

/// Everything a rule may look at.
pub struct RuleContext<'a> {
    pub text: &'a NormalizedText,
    pub knowledge: &'a KnowledgeStore,
    /// Minimum characters for a project-name token to count as a match.
    pub min_token_len: usize,
}

pub type RuleFn = fn(&RuleContext<'_>) -> Option<IntentResult>;

#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub apply: RuleFn,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// Rules in priority order.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule { name: "cv_request", apply: cv_request },
        Rule { name: "project_match", apply: project_match },
        Rule { name: "about_category", apply: about_category },
        Rule { name: "owner", apply: owner },
        Rule { name: "technology", apply: technology },
        Rule { name: "generic_projects", apply: generic_projects },
        Rule { name: "vague_help", apply: vague_help },
    ]
}

// ────────────────────────────────────────────────────────────────────────────
// Keyword sets and patterns (matched on folded text)
// ────────────────────────────────────────────────────────────────────────────

pub const OWNER_KEYWORDS: &[&str] = &[
    "proprietario",
    "a chi appartiene",
    "chi ha creato",
    "chi ha fatto",
    "chi è il proprietario",
    "autore",
];

pub const TECH_KEYWORDS: &[&str] = &[
    "tecnologie",
    "tecnologia",
    "stack",
    "linguaggi",
    "linguaggio",
    "framework",
    "librerie",
    "libreria",
    "tools",
    "tool",
];

pub const GENERIC_PROJECT_KEYWORDS: &[&str] = &["progetto", "progetti"];

static CV_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(curriculum vitae|curriculum|cv)\b").expect("valid regex"));
static PROJECT_STEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bprogett").expect("valid regex"));
pub static VAGUE_HELP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(cosa puoi fare|mi aiuti|come funziona|come posso|voglio sapere|sto cercando|puoi aiutarmi)\b",
    )
    .expect("valid regex")
});

static WANTS_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(nome|come si chiama|chi e)\b").expect("valid regex"));
static WANTS_BIO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(bio|biografia|parlami|informazioni su|cosa sai)\b").expect("valid regex")
});
static WANTS_SCHOOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(scuola|liceo|istituto)\b").expect("valid regex"));
static WANTS_UNIVERSITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(universit\w*|laurea|unime|scienze e tecniche)\b").expect("valid regex")
});
static WANTS_AGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(eta|anni)\b").expect("valid regex"));
static WANTS_GENERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(cosa fai|che lavoro|mi occupo|cosa sai)\b").expect("valid regex")
});

// ────────────────────────────────────────────────────────────────────────────
// Rules
// ────────────────────────────────────────────────────────────────────────────

fn cv_request(ctx: &RuleContext<'_>) -> Option<IntentResult> {
    ctx.text
        .matches(&CV_PATTERN)
        .then_some(IntentResult::StopAndAnswerDirectly(StopReason::CvRequest))
}

fn project_match(ctx: &RuleContext<'_>) -> Option<IntentResult> {
    let project = match_project(ctx.text, ctx.knowledge.projects(), ctx.min_token_len)?;
    let doc_preference = detect_doc_preference(ctx.text);
    if doc_preference.is_empty() {
        return Some(IntentResult::Continue(Intent::Project {
            project: project.clone(),
            doc_preference,
        }));
    }
    Some(IntentResult::StopAndAnswerDirectly(
        StopReason::ProjectDocConfirm {
            project: project.clone(),
            doc_preference,
        },
    ))
}

fn about_category(ctx: &RuleContext<'_>) -> Option<IntentResult> {
    let profile = ctx.knowledge.profile();
    let category = profile
        .categories
        .iter()
        .find(|c| ctx.text.matches_category(c))?;

    let mut data = AboutData {
        fields: pick_about_fields(profile, &category.fields),
        projects_summary: Vec::new(),
        cv_available: true,
    };
    if category.include_projects_summary {
        data.projects_summary = ctx.knowledge.projects_summary(PROJECTS_SUMMARY_LIMIT);
    }
    Some(IntentResult::Continue(Intent::About {
        subtype: category.id.clone(),
        data,
    }))
}

fn owner(ctx: &RuleContext<'_>) -> Option<IntentResult> {
    let profile = ctx.knowledge.profile();
    let names_owner = profile
        .first_name()
        .is_some_and(|first| ctx.text.has_token(&first));
    if !names_owner && !ctx.text.contains_any(OWNER_KEYWORDS) {
        return None;
    }

    // A list request about the owner's work beats biography.
    if ctx.text.matches(&PROJECT_STEM) {
        return Some(projects_list(ctx.knowledge));
    }

    let wanted: Vec<&str> = [
        (&*WANTS_NAME, "name"),
        (&*WANTS_BIO, "bio"),
        (&*WANTS_SCHOOL, "school"),
        (&*WANTS_UNIVERSITY, "university"),
        (&*WANTS_AGE, "age"),
        (&*WANTS_GENERAL, "general"),
    ]
    .into_iter()
    .filter(|(pattern, _)| ctx.text.matches(pattern))
    .map(|(_, field)| field)
    .collect();

    let requested: Vec<String> = wanted.iter().map(|f| f.to_string()).collect();
    Some(IntentResult::Continue(Intent::About {
        subtype: "owner".to_string(),
        data: AboutData {
            fields: pick_about_fields(profile, &requested),
            projects_summary: Vec::new(),
            cv_available: true,
        },
    }))
}

fn technology(ctx: &RuleContext<'_>) -> Option<IntentResult> {
    ctx.text
        .contains_any(TECH_KEYWORDS)
        .then(|| projects_list(ctx.knowledge))
}

fn generic_projects(ctx: &RuleContext<'_>) -> Option<IntentResult> {
    ctx.text
        .contains_any(GENERIC_PROJECT_KEYWORDS)
        .then(|| projects_list(ctx.knowledge))
}

fn vague_help(ctx: &RuleContext<'_>) -> Option<IntentResult> {
    ctx.text.matches(&VAGUE_HELP).then(IntentResult::unknown)
}

fn projects_list(knowledge: &KnowledgeStore) -> IntentResult {
    IntentResult::Continue(Intent::ProjectsList(knowledge.projects().to_vec()))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Finds the project the utterance names.
///
/// A whole-word match of a full id / name / subtitle wins over a match on a
/// single token of one of them, so naming a project outright is never stolen
/// by another project sharing a word. Within each pass, list order decides.
pub fn match_project<'a>(
    text: &NormalizedText,
    projects: &'a [Project],
    min_token_len: usize,
) -> Option<&'a Project> {
    let all_tokens = text.padded_tokens(1);
    let long_tokens = text.padded_tokens(min_token_len);

    let full_hit = projects.iter().find(|project| {
        project_aliases(project).any(|alias| {
            let tokens = tokenize(alias);
            let phrase = tokens.join(" ");
            phrase.chars().count() >= min_token_len && all_tokens.contains(&format!(" {phrase} "))
        })
    });
    if full_hit.is_some() {
        return full_hit;
    }

    projects.iter().find(|project| {
        project_aliases(project)
            .flat_map(tokenize)
            .filter(|t| t.chars().count() >= min_token_len)
            .any(|t| long_tokens.contains(&format!(" {t} ")))
    })
}

fn project_aliases(project: &Project) -> impl Iterator<Item = &str> {
    [Some(project.id.as_str()), Some(project.name.as_str()), project.subtitle.as_deref()]
        .into_iter()
        .flatten()
}

/// Which documents the utterance asks for, in canonical order.
pub fn detect_doc_preference(text: &NormalizedText) -> Vec<DocKind> {
    let evaluation = text.contains_any(EVALUATION_KEYWORDS);
    let architecture = evaluation || text.contains_any(ARCHITECTURE_KEYWORDS);
    let readme = evaluation || text.contains_any(README_KEYWORDS);

    DocKind::ORDER
        .into_iter()
        .filter(|kind| match kind {
            DocKind::Architecture => architecture,
            DocKind::Readme => readme,
        })
        .collect()
}

/// Resolves requested field names (with their aliases) against the profile.
/// With no request, returns a short summary plus the name.
pub fn pick_about_fields(profile: &Profile, requested: &[String]) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    let mut push = |key: &str, value: Option<String>| {
        if let Some(value) = value {
            if !out.iter().any(|(k, _)| k == key) {
                out.push((key.to_string(), value));
            }
        }
    };

    if requested.is_empty() {
        push("summary", profile.field("bio").or_else(|| profile.field("general_info")));
        push("name", profile.field("name"));
        return out;
    }

    for field in requested {
        match field.as_str() {
            "" => {}
            "general" => push("general_info", profile.field("general_info")),
            "school" => push(
                "school",
                profile.field("school_info").or_else(|| profile.field("school")),
            ),
            "university" => push(
                "university",
                profile
                    .field("university_info")
                    .or_else(|| profile.field("university")),
            ),
            key => push(key, profile.field(key)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project(id: &str, name: &str, subtitle: Option<&str>) -> Project {
        serde_json::from_value(json!({ "id": id, "name": name, "subtitle": subtitle })).unwrap()
    }

    #[test]
    fn test_doc_preference_evaluation_implies_both() {
        let text = NormalizedText::new("mi fai una valutazione di decod?");
        assert_eq!(
            detect_doc_preference(&text),
            vec![DocKind::Architecture, DocKind::Readme]
        );
    }

    #[test]
    fn test_doc_preference_readme_only() {
        let text = NormalizedText::new("come avviare decod? serve il readme");
        assert_eq!(detect_doc_preference(&text), vec![DocKind::Readme]);
    }

    #[test]
    fn test_doc_preference_none() {
        let text = NormalizedText::new("parlami di decod");
        assert!(detect_doc_preference(&text).is_empty());
    }

    #[test]
    fn test_match_project_requires_whole_word() {
        let projects = vec![project("proj-1", "Art", None), project("proj-2", "Arte digitale", None)];
        let text = NormalizedText::new("ho letto un articolo");
        assert!(match_project(&text, &projects, 4).is_none());
    }

    #[test]
    fn test_match_project_full_name_beats_shared_token() {
        let projects = vec![
            project("proj-1", "Pixel Studio", Some("editor per pixel art")),
            project("proj-2", "Pixel-dèi", None),
        ];
        let text = NormalizedText::new("com'è fatto pixel-dei?");
        assert_eq!(match_project(&text, &projects, 4).unwrap().id, "proj-2");
    }

    #[test]
    fn test_match_project_by_subtitle_token() {
        let projects = vec![project("proj-1", "Decod", Some("Decodifica di segnali radio"))];
        let text = NormalizedText::new("hai fatto qualcosa con i segnali radio?");
        assert_eq!(match_project(&text, &projects, 4).unwrap().id, "proj-1");
    }

    #[test]
    fn test_match_project_min_token_len_is_tunable() {
        let projects = vec![project("proj-1", "Rex", None)];
        let text = NormalizedText::new("dimmi di rex");
        assert!(match_project(&text, &projects, 4).is_none());
        assert!(match_project(&text, &projects, 3).is_some());
    }

    #[test]
    fn test_pick_about_fields_resolves_aliases() {
        let profile: Profile = serde_json::from_value(json!({
            "name": "Giuseppe Rubino",
            "school_info": "Liceo scientifico",
            "university": "UniME",
            "general_info": "Sviluppatore"
        }))
        .unwrap();
        let requested: Vec<String> = ["school", "university", "general", "missing"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let fields = pick_about_fields(&profile, &requested);
        assert_eq!(
            fields,
            vec![
                ("school".to_string(), "Liceo scientifico".to_string()),
                ("university".to_string(), "UniME".to_string()),
                ("general_info".to_string(), "Sviluppatore".to_string()),
            ]
        );
    }

    #[test]
    fn test_pick_about_fields_default_summary() {
        let profile: Profile = serde_json::from_value(json!({
            "name": "Giuseppe Rubino",
            "general_info": "Sviluppatore"
        }))
        .unwrap();

        let fields = pick_about_fields(&profile, &[]);
        assert_eq!(fields[0], ("summary".to_string(), "Sviluppatore".to_string()));
        assert_eq!(fields[1], ("name".to_string(), "Giuseppe Rubino".to_string()));
    }
}
