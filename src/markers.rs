use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkerError {
    #[error("end marker for section {id} has no open start marker")]
    UnexpectedEnd { id: String },
    #[error("end marker for section {found} does not close open section {expected}")]
    Mismatched { expected: String, found: String },
    #[error("start marker for section {id} is never closed")]
    Unclosed { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedSection {
    pub id: String,
    pub title: String,
    pub depth: usize,
    pub text: String,
}

pub fn start_marker(id: &str, title: &str) -> String {
    format!("[START SECTION {id}: {}]", marker_title(title))
}

pub fn end_marker(id: &str, title: &str) -> String {
    format!("[END SECTION {id}: {}]", marker_title(title))
}

fn marker_title(title: &str) -> String {
    title
        .replace('[', "(")
        .replace(']', ")")
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

pub struct MarkerParser {
    marker: Regex,
}

impl MarkerParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            marker: RegexBuilder::new(r"\[(START|END)\s+SECTION\s+([^\]]+?):\s+([^\]]*)\]")
                .case_insensitive(true)
                .build()
                .context("failed to compile section marker regex")?,
        })
    }

    pub fn extract_section_text(&self, id: &str, tagged_text: &str) -> String {
        let mut start_end = None;
        let mut end_start = None;

        for captures in self.marker.captures_iter(tagged_text) {
            let (Some(whole), Some(kind), Some(marker_id)) =
                (captures.get(0), captures.get(1), captures.get(2))
            else {
                continue;
            };
            if !marker_id.as_str().eq_ignore_ascii_case(id) {
                continue;
            }

            if kind.as_str().eq_ignore_ascii_case("start") {
                start_end.get_or_insert(whole.end());
            } else {
                end_start.get_or_insert(whole.start());
            }
            if start_end.is_some() && end_start.is_some() {
                break;
            }
        }

        match (start_end, end_start) {
            (Some(from), Some(to)) if to > from => self.strip(&tagged_text[from..to]),
            _ => String::new(),
        }
    }

    pub fn parse_tagged_text(&self, tagged_text: &str) -> Result<Vec<TaggedSection>, MarkerError> {
        struct Open {
            id: String,
            slot: usize,
            content_start: usize,
        }

        let mut open = Vec::<Open>::new();
        let mut sections = Vec::<TaggedSection>::new();

        for captures in self.marker.captures_iter(tagged_text) {
            let (Some(whole), Some(kind), Some(id)) =
                (captures.get(0), captures.get(1), captures.get(2))
            else {
                continue;
            };
            let id = id.as_str().to_string();

            if kind.as_str().eq_ignore_ascii_case("start") {
                sections.push(TaggedSection {
                    id: id.clone(),
                    title: captures
                        .get(3)
                        .map(|title| title.as_str().trim().to_string())
                        .unwrap_or_default(),
                    depth: open.len(),
                    text: String::new(),
                });
                open.push(Open {
                    id,
                    slot: sections.len() - 1,
                    content_start: whole.end(),
                });
                continue;
            }

            let Some(top) = open.pop() else {
                return Err(MarkerError::UnexpectedEnd { id });
            };
            if !top.id.eq_ignore_ascii_case(&id) {
                return Err(MarkerError::Mismatched {
                    expected: top.id,
                    found: id,
                });
            }
            sections[top.slot].text = self.strip(&tagged_text[top.content_start..whole.start()]);
        }

        match open.pop() {
            Some(unclosed) => Err(MarkerError::Unclosed { id: unclosed.id }),
            None => Ok(sections),
        }
    }

    fn strip(&self, text: &str) -> String {
        self.marker.replace_all(text, "").trim().to_string()
    }
}
