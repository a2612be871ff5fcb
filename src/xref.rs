use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use tracing::debug;

use crate::extraction::ExtractionError;
use crate::header_ids::OutlineMap;
use crate::markers::MarkerParser;
use crate::model::{LevelBucket, ReferenceEdge, ReferencePayload, SectionChunk};

pub fn parse_reference_payload(content: &str) -> Result<Vec<ReferenceEdge>, ExtractionError> {
    let payload: ReferencePayload =
        serde_json::from_str(strip_code_fence(content)).map_err(ExtractionError::MalformedPayload)?;
    Ok(payload.refs)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(fenced) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let body = fenced.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

pub struct CrossReferenceAssembler {
    markers: MarkerParser,
}

impl CrossReferenceAssembler {
    pub fn new() -> Result<Self> {
        Ok(Self {
            markers: MarkerParser::new()?,
        })
    }

    pub fn assemble(
        &self,
        outline: &OutlineMap,
        tagged_text: &str,
        edges: &[ReferenceEdge],
    ) -> Vec<LevelBucket> {
        let mut references = HashMap::<&str, Vec<String>>::new();
        for edge in edges {
            if !outline.contains(&edge.from_id) {
                debug!(from = %edge.from_id, "dropping reference edge from unknown section");
                continue;
            }

            let targets = references.entry(edge.from_id.as_str()).or_default();
            for to_id in &edge.to_ids {
                if !targets.contains(to_id) {
                    targets.push(to_id.clone());
                }
            }
        }

        let mut buckets = BTreeMap::<u8, Vec<SectionChunk>>::new();
        for node in outline.iter() {
            buckets.entry(node.level).or_default().push(SectionChunk {
                section_title: node.title.clone(),
                section_id: node.id.clone(),
                references: references.get(node.id.as_str()).cloned().unwrap_or_default(),
                text: self.markers.extract_section_text(&node.id, tagged_text),
            });
        }

        buckets
            .into_iter()
            .map(|(level, chunks)| LevelBucket { level, chunks })
            .collect()
    }

    pub fn collect_refs_texts(
        &self,
        section_id: &str,
        levels: &[LevelBucket],
        tagged_text: Option<&str>,
    ) -> Vec<String> {
        let Some(chunk) = levels
            .iter()
            .flat_map(|bucket| bucket.chunks.iter())
            .find(|chunk| chunk.section_id == section_id)
        else {
            return Vec::new();
        };

        if let Some(tagged_text) = tagged_text {
            return chunk
                .references
                .iter()
                .map(|id| self.markers.extract_section_text(id, tagged_text))
                .collect();
        }

        let cached = levels
            .iter()
            .flat_map(|bucket| bucket.chunks.iter())
            .map(|chunk| (chunk.section_id.as_str(), chunk.text.as_str()))
            .collect::<HashMap<&str, &str>>();
        chunk
            .references
            .iter()
            .filter_map(|id| cached.get(id.as_str()).map(|text| text.to_string()))
            .collect()
    }

    pub fn collect_all_refs(
        &self,
        levels: &[LevelBucket],
        tagged_text: Option<&str>,
    ) -> BTreeMap<String, Vec<String>> {
        levels
            .iter()
            .flat_map(|bucket| bucket.chunks.iter())
            .map(|chunk| {
                (
                    chunk.section_id.clone(),
                    self.collect_refs_texts(&chunk.section_id, levels, tagged_text),
                )
            })
            .collect()
    }
}
