mod cascade;
#[cfg(test)]
mod tests;
mod word_sequence;

use std::fmt;

use tracing::debug;

use crate::model::SectionDescriptor;

pub use cascade::CascadeStrategy;
pub use word_sequence::WindowConfig;

use cascade::{build_pattern, flexible_whitespace_pattern, locate};
use word_sequence::{WordIndex, normalize_words, recover_heading_offset};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocatorConfig {
    pub windows: WindowConfig,
    pub fuzzy_threshold: f64,
    pub title_lookback: usize,
    pub min_sequence_words: usize,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            windows: WindowConfig::default(),
            fuzzy_threshold: 0.8,
            title_lookback: 500,
            min_sequence_words: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateMethod {
    ExactSequence,
    FuzzySequence,
    Cascade(CascadeStrategy),
    Title,
    IdToken,
}

impl fmt::Display for LocateMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactSequence => f.write_str("exact-sequence"),
            Self::FuzzySequence => f.write_str("fuzzy-sequence"),
            Self::Cascade(strategy) => write!(f, "cascade:{strategy}"),
            Self::Title => f.write_str("title"),
            Self::IdToken => f.write_str("id-token"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHit {
    pub offset: usize,
    pub method: LocateMethod,
}

pub struct SectionLocator<'a> {
    raw_text: &'a str,
    index: WordIndex,
    config: LocatorConfig,
}

impl<'a> SectionLocator<'a> {
    pub fn new(raw_text: &'a str, config: LocatorConfig) -> Self {
        let index = WordIndex::build(raw_text);
        debug!(words = index.len(), "built word index");

        Self {
            raw_text,
            index,
            config,
        }
    }

    pub fn locate_section(&self, section: &SectionDescriptor) -> Option<SectionHit> {
        let cue = section.cue.trim();

        if !cue.is_empty() {
            let words = normalize_words(cue);
            if words.len() >= self.config.min_sequence_words
                && let Some(hit) = self.locate_sequence(&words, &section.title)
            {
                return Some(hit);
            }

            if let Some(found) = locate(self.raw_text, cue, 0) {
                return Some(SectionHit {
                    offset: found.offset,
                    method: LocateMethod::Cascade(found.strategy),
                });
            }
        }

        if let Some(offset) = self.locate_title(&section.title) {
            return Some(SectionHit {
                offset,
                method: LocateMethod::Title,
            });
        }

        self.locate_id_token(&section.id).map(|offset| SectionHit {
            offset,
            method: LocateMethod::IdToken,
        })
    }

    fn locate_sequence(&self, words: &[String], title: &str) -> Option<SectionHit> {
        let (token_index, method) = match self.index.find_exact(words, self.config.windows) {
            Some(token_index) => (token_index, LocateMethod::ExactSequence),
            None => {
                let fuzzy =
                    self.index
                        .find_fuzzy(words, self.config.windows, self.config.fuzzy_threshold)?;
                debug!(ratio = fuzzy.ratio, "fuzzy word-sequence match");
                (fuzzy.token_index, LocateMethod::FuzzySequence)
            }
        };

        let hit = self.index.offset_of(token_index)?;
        let offset = recover_heading_offset(self.raw_text, title, hit, self.config.title_lookback)
            .unwrap_or(hit);

        Some(SectionHit { offset, method })
    }

    fn locate_title(&self, title: &str) -> Option<usize> {
        let pattern = flexible_whitespace_pattern(title);
        if pattern.is_empty() {
            return None;
        }

        match build_pattern(&pattern) {
            Ok(regex) => regex.find(self.raw_text).map(|found| found.start()),
            Err(err) => {
                debug!(error = %err, "skipping title search");
                None
            }
        }
    }

    fn locate_id_token(&self, id: &str) -> Option<usize> {
        if id.trim().is_empty() {
            return None;
        }

        match build_pattern(&format!(r"\b{}\b", regex::escape(id.trim()))) {
            Ok(regex) => regex.find(self.raw_text).map(|found| found.start()),
            Err(err) => {
                debug!(error = %err, "skipping id token search");
                None
            }
        }
    }
}
