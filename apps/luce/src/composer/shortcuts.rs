//! Deterministic answers that skip the model.
//!
//! Two kinds: canned clarification questions when the router found nothing to
//! ground a reply on, and enumerable answers computed straight from the
//! project list (favorites, per-project technologies, overview).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::composer::prompts;
use crate::intent::rules::{OWNER_KEYWORDS, TECH_KEYWORDS, VAGUE_HELP};
use crate::intent::text::NormalizedText;
use crate::knowledge::Project;

static FAVORITE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(preferit|favorit)\w*").expect("valid regex"));
static OVERVIEW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(tutti|panoramica|elenco|elenca|lista|riepilogo|ogni progetto)\b")
        .expect("valid regex")
});

/// A question about the project list that can be answered from data alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectsFollowUp {
    Favorite,
    TechBreakdown,
    Overview,
}

impl ProjectsFollowUp {
    /// First matching pattern wins: favorite, technologies, overview.
    pub fn detect(text: &NormalizedText) -> Option<Self> {
        if text.matches(&FAVORITE) {
            Some(Self::Favorite)
        } else if text.contains_any(TECH_KEYWORDS) {
            Some(Self::TechBreakdown)
        } else if text.matches(&OVERVIEW) {
            Some(Self::Overview)
        } else {
            None
        }
    }
}

/// Clarifying question for an utterance the router could not ground.
pub fn clarification(text: &NormalizedText, owner: &str) -> Option<String> {
    if text.contains_any(OWNER_KEYWORDS) {
        Some(prompts::owner_clarification(owner))
    } else if text.contains_any(TECH_KEYWORDS) {
        Some(prompts::TECH_CLARIFICATION.to_string())
    } else if text.matches(&VAGUE_HELP) {
        Some(prompts::VAGUE_CLARIFICATION.to_string())
    } else {
        None
    }
}

pub fn projects_answer(follow_up: ProjectsFollowUp, projects: &[Project]) -> String {
    if projects.is_empty() {
        return "Al momento non ci sono progetti da mostrare.".to_string();
    }

    match follow_up {
        ProjectsFollowUp::Favorite => {
            let favorites: Vec<&Project> = projects.iter().filter(|p| p.favorite).collect();
            match favorites.as_slice() {
                [] => "Al momento nessun progetto è segnato come preferito. \
                    Vuoi che ti mostri l'elenco completo dei progetti?"
                    .to_string(),
                [only] => format!("Il progetto preferito è {}.", describe(only)),
                many => format!(
                    "I progetti preferiti sono:\n{}",
                    many.iter()
                        .map(|p| format!("- {}", describe(p)))
                        .collect::<Vec<_>>()
                        .join("\n")
                ),
            }
        }
        ProjectsFollowUp::TechBreakdown => {
            let lines = projects
                .iter()
                .map(|p| {
                    let modules = if p.modules.is_empty() {
                        "nessuna tecnologia indicata".to_string()
                    } else {
                        p.modules.join(", ")
                    };
                    format!("- {}: {modules}", p.name)
                })
                .collect::<Vec<_>>()
                .join("\n");
            format!("Ecco le tecnologie usate in ciascun progetto:\n{lines}")
        }
        ProjectsFollowUp::Overview => {
            let lines = projects
                .iter()
                .map(|p| format!("- {}", describe(p)))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "Ecco una panoramica dei progetti:\n{lines}\n\
                Vuoi approfondirne uno in particolare?"
            )
        }
    }
}

fn describe(project: &Project) -> String {
    match project.subtitle.as_deref().filter(|s| !s.is_empty()) {
        Some(subtitle) => format!("{} ({subtitle})", project.name),
        None => project.name.clone(),
    }
}
