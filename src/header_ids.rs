use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use regex::Regex;

use crate::model::OutlineNode;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutlineMap {
    nodes: Vec<OutlineNode>,
    index: HashMap<String, usize>,
}

impl OutlineMap {
    pub fn insert(&mut self, node: OutlineNode) {
        match self.index.get(&node.id) {
            Some(&slot) => self.nodes[slot] = node,
            None => {
                self.index.insert(node.id.clone(), self.nodes.len());
                self.nodes.push(node);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&OutlineNode> {
        self.index.get(id).map(|&slot| &self.nodes[slot])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutlineNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct IdAssignment {
    pub markdown: String,
    pub outline: OutlineMap,
}

pub struct HeaderIdAssigner {
    heading: Regex,
}

impl HeaderIdAssigner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            heading: Regex::new(r"^(#{1,6})\s*(.+?)(?:\s*\{#([^}]+)\})?\s*$")
                .context("failed to compile heading regex")?,
        })
    }

    pub fn assign(&self, markdown: &str) -> IdAssignment {
        let used = self.explicit_anchors(markdown);
        let mut next_id = 1_usize;
        let mut lines = Vec::<String>::new();
        let mut outline = OutlineMap::default();

        for line in markdown.lines() {
            let Some(captures) = self.heading.captures(line) else {
                lines.push(line.to_string());
                continue;
            };

            let hashes = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            let title = captures.get(2).map(|m| m.as_str()).unwrap_or_default();

            let anchor = match captures.get(3) {
                Some(anchor) => {
                    lines.push(line.to_string());
                    anchor.as_str().to_string()
                }
                None => {
                    let anchor = loop {
                        let candidate = format!("h{next_id}");
                        next_id += 1;
                        if !used.contains(&candidate) {
                            break candidate;
                        }
                    };
                    lines.push(format!("{hashes} {title} {{#{anchor}}}"));
                    anchor
                }
            };

            outline.insert(OutlineNode {
                id: anchor,
                title: title.trim().to_string(),
                level: hashes.len() as u8,
            });
        }

        let mut rewritten = lines.join("\n");
        rewritten.push('\n');

        IdAssignment {
            markdown: rewritten,
            outline,
        }
    }

    pub fn collect(&self, markdown: &str) -> OutlineMap {
        let mut outline = OutlineMap::default();

        for line in markdown.lines() {
            let Some(captures) = self.heading.captures(line) else {
                continue;
            };
            let Some(anchor) = captures.get(3) else {
                continue;
            };

            let hashes = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            let title = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
            outline.insert(OutlineNode {
                id: anchor.as_str().to_string(),
                title: title.trim().to_string(),
                level: hashes.len() as u8,
            });
        }

        outline
    }

    fn explicit_anchors(&self, markdown: &str) -> HashSet<String> {
        markdown
            .lines()
            .filter_map(|line| self.heading.captures(line))
            .filter_map(|captures| captures.get(3).map(|m| m.as_str().to_string()))
            .collect()
    }
}
