use std::collections::HashSet;
use std::fmt;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::util::floor_char_boundary;

const PREFIX_WORDS: usize = 5;
const LOOSE_PREFIX_WORDS: usize = 3;
const SALIENT_WORDS: usize = 3;
const SALIENT_MIN_CHARS: usize = 5;
const SALIENT_GAP: usize = 50;
const PAIR_MIN_CHARS: usize = 4;
const PAIR_GAP: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeStrategy {
    FlexibleWhitespace,
    WordPrefix,
    LoosePrefix,
    SalientSkipGram,
    SalientPair,
}

impl CascadeStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FlexibleWhitespace => "flexible-whitespace",
            Self::WordPrefix => "word-prefix",
            Self::LoosePrefix => "loose-prefix",
            Self::SalientSkipGram => "salient-skip-gram",
            Self::SalientPair => "salient-pair",
        }
    }
}

impl fmt::Display for CascadeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueMatch {
    pub offset: usize,
    pub strategy: CascadeStrategy,
}

pub fn locate(raw_text: &str, cue: &str, search_start: usize) -> Option<CueMatch> {
    if cue.trim().is_empty() || search_start > raw_text.len() {
        return None;
    }

    let start = floor_char_boundary(raw_text, search_start);
    let mut tried = HashSet::<String>::new();

    for (strategy, pattern) in candidate_patterns(cue) {
        if pattern.is_empty() || !tried.insert(pattern.clone()) {
            continue;
        }

        let regex = match build_pattern(&pattern) {
            Ok(regex) => regex,
            Err(err) => {
                debug!(strategy = %strategy, error = %err, "skipping locate strategy");
                continue;
            }
        };

        if let Some(found) = regex.find_at(raw_text, start) {
            return Some(CueMatch {
                offset: found.start(),
                strategy,
            });
        }
    }

    None
}

pub fn flexible_whitespace_pattern(text: &str) -> String {
    join_escaped(text.split_whitespace(), r"\s+")
}

pub fn build_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
}

fn candidate_patterns(cue: &str) -> Vec<(CascadeStrategy, String)> {
    let words = cue.split_whitespace().collect::<Vec<&str>>();

    let mut patterns = vec![
        (
            CascadeStrategy::FlexibleWhitespace,
            flexible_whitespace_pattern(cue),
        ),
        (
            CascadeStrategy::WordPrefix,
            join_escaped(words.iter().copied().take(PREFIX_WORDS), r"\s+"),
        ),
        (
            CascadeStrategy::LoosePrefix,
            join_escaped(words.iter().copied().take(LOOSE_PREFIX_WORDS), r"\s*"),
        ),
        (
            CascadeStrategy::SalientSkipGram,
            join_escaped(
                words
                    .iter()
                    .copied()
                    .filter(|word| word.chars().count() >= SALIENT_MIN_CHARS)
                    .take(SALIENT_WORDS),
                &format!(".{{0,{SALIENT_GAP}}}"),
            ),
        ),
    ];

    let salient = words
        .iter()
        .copied()
        .filter(|word| word.chars().count() >= PAIR_MIN_CHARS)
        .collect::<Vec<&str>>();
    for pair in salient.windows(2) {
        patterns.push((
            CascadeStrategy::SalientPair,
            join_escaped(pair.iter().copied(), &format!(".{{0,{PAIR_GAP}}}")),
        ));
    }

    patterns
}

fn join_escaped<'a>(words: impl Iterator<Item = &'a str>, separator: &str) -> String {
    words
        .map(regex::escape)
        .collect::<Vec<String>>()
        .join(separator)
}
