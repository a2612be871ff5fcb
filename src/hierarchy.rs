use anyhow::{Context, Result};
use regex::Regex;

use crate::model::SectionDescriptor;

const CUE_MAX_CHARS: usize = 100;

pub struct HierarchyParser {
    level: Regex,
    anchor: Regex,
    title_prefix: Regex,
    title_anchor: Regex,
    quoted: Regex,
}

impl HierarchyParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            level: Regex::new(r"^(#{1,6})\s").context("failed to compile heading level regex")?,
            anchor: Regex::new(r"\{#([^}]+)\}").context("failed to compile anchor regex")?,
            title_prefix: Regex::new(r"^#+\s+").context("failed to compile title prefix regex")?,
            title_anchor: Regex::new(r"\s*\{#[^}]+\}$")
                .context("failed to compile title anchor regex")?,
            quoted: Regex::new(r#"["“]([^"”]+)["”]"#).context("failed to compile cue regex")?,
        })
    }

    pub fn parse(&self, markdown: &str) -> Vec<SectionDescriptor> {
        let lines = markdown.split('\n').collect::<Vec<&str>>();
        let mut sections = Vec::<SectionDescriptor>::new();

        for (index, raw_line) in lines.iter().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            let Some(level) = self.heading_level(line) else {
                continue;
            };
            let Some(id) = self.heading_id(line) else {
                continue;
            };

            let mut cue = self.quoted_cue(line);
            if cue.is_empty()
                && let Some(next_line) = lines.get(index + 1)
            {
                let next_line = next_line.trim();
                if self.heading_level(next_line).is_none() {
                    cue = self.quoted_cue(next_line);
                }
            }

            sections.push(SectionDescriptor {
                id,
                level,
                title: self.heading_title(line),
                cue,
                document_order: index,
            });
        }

        sections
    }

    fn heading_level(&self, line: &str) -> Option<u8> {
        self.level
            .captures(line)
            .and_then(|captures| captures.get(1))
            .map(|hashes| hashes.as_str().len() as u8)
    }

    fn heading_id(&self, line: &str) -> Option<String> {
        self.anchor
            .captures(line)
            .and_then(|captures| captures.get(1))
            .map(|id| id.as_str().to_string())
    }

    fn heading_title(&self, line: &str) -> String {
        let without_hashes = self.title_prefix.replace(line, "");
        self.title_anchor
            .replace(&without_hashes, "")
            .trim()
            .to_string()
    }

    fn quoted_cue(&self, line: &str) -> String {
        let Some(quoted) = self
            .quoted
            .captures(line)
            .and_then(|captures| captures.get(1))
        else {
            return String::new();
        };

        cue_from_quote(quoted.as_str())
    }
}

fn cue_from_quote(quoted: &str) -> String {
    if let Some((head, _)) = quoted.split_once('…') {
        return head.trim().to_string();
    }
    if let Some((head, _)) = quoted.split_once("...") {
        return head.trim().to_string();
    }

    quoted.chars().take(CUE_MAX_CHARS).collect()
}
