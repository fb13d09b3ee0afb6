//! Utterance normalization shared by the router and the composer.
//!
//! Both the token set and the phrase text are lowercased and diacritic-folded,
//! so "età", "eta" and "ETÀ" compare equal on every matching path.

use std::collections::HashSet;

use regex::Regex;

use crate::knowledge::TopicCategory;

/// Keywords up to this many characters are matched as whole tokens instead of
/// substrings, so "run" does not fire inside "brunch".
const SHORT_KEYWORD_MAX_CHARS: usize = 3;

/// A user utterance prepared for keyword, token and pattern matching.
#[derive(Debug, Clone)]
pub struct NormalizedText {
    folded: String,
    tokens: Vec<String>,
    token_set: HashSet<String>,
}

impl NormalizedText {
    pub fn new(utterance: &str) -> Self {
        let folded = fold(utterance);
        let tokens: Vec<String> = folded
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        let token_set = tokens.iter().cloned().collect();
        Self {
            folded,
            tokens,
            token_set,
        }
    }

    pub fn has_token(&self, token: &str) -> bool {
        self.token_set.contains(&fold(token))
    }

    /// Phrase containment. Short single-word keywords must match a whole token.
    pub fn contains_phrase(&self, phrase: &str) -> bool {
        let phrase = fold(phrase);
        let phrase = phrase.trim();
        if phrase.is_empty() {
            return false;
        }
        if !phrase.contains(' ') && phrase.chars().count() <= SHORT_KEYWORD_MAX_CHARS {
            return self.token_set.contains(phrase);
        }
        self.folded.contains(phrase)
    }

    pub fn contains_any(&self, phrases: &[&str]) -> bool {
        phrases.iter().any(|p| self.contains_phrase(p))
    }

    pub fn matches(&self, pattern: &Regex) -> bool {
        pattern.is_match(&self.folded)
    }

    /// Tokens of at least `min_len` characters joined and padded with spaces,
    /// ready for whole-word `contains` checks.
    pub fn padded_tokens(&self, min_len: usize) -> String {
        padded(self.tokens.iter().map(String::as_str), min_len)
    }

    /// Does this utterance hit any of the category's keyword phrases or tokens?
    pub fn matches_category(&self, category: &TopicCategory) -> bool {
        let phrase_hit = category
            .keywords
            .iter()
            .map(|k| fold(k))
            .any(|k| !k.trim().is_empty() && self.folded.contains(k.trim()));
        phrase_hit || category.tokens.iter().any(|t| self.has_token(t))
    }
}

/// Lowercases and strips the diacritics found in Italian and neighbouring
/// Latin alphabets, precomposed or written as combining marks.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| !is_combining_mark(*c))
        .map(fold_char)
        .collect()
}

fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}')
}

fn fold_char(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        '’' | '‘' | '`' => '\'',
        other => other,
    }
}

/// Splits `value` into folded alphanumeric tokens.
pub fn tokenize(value: &str) -> Vec<String> {
    fold(value)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn padded<'a>(tokens: impl Iterator<Item = &'a str>, min_len: usize) -> String {
    let kept: Vec<&str> = tokens.filter(|t| t.chars().count() >= min_len).collect();
    format!(" {} ", kept.join(" "))
}

#[cfg(test)]
impl NormalizedText {
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
