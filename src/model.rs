use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineNode {
    pub id: String,
    pub title: String,
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionDescriptor {
    pub id: String,
    pub level: u8,
    pub title: String,
    pub cue: String,
    pub document_order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEdge {
    #[serde(rename = "from")]
    pub from_id: String,
    #[serde(rename = "to", default)]
    pub to_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferencePayload {
    pub refs: Vec<ReferenceEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionChunk {
    pub section_title: String,
    pub section_id: String,
    pub references: Vec<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelBucket {
    pub level: u8,
    pub chunks: Vec<SectionChunk>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzePaths {
    pub document_path: String,
    pub output_dir: String,
    pub outline_path: String,
    pub outline_ids_path: String,
    pub tagged_path: String,
    pub smallest_chunks_path: String,
    pub levels_path: String,
    pub all_refs_path: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalyzeCounts {
    pub document_bytes: usize,
    pub outline_passes: usize,
    pub outline_sections: usize,
    pub located_sections: usize,
    pub unlocated_sections: usize,
    pub collapsed_sections: usize,
    pub duplicate_sections: usize,
    pub reference_edges: usize,
    pub leaf_chunks: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub model: String,
    pub max_passes: usize,
    pub outline_stop_reason: String,
    pub source_sha256: String,
    pub paths: AnalyzePaths,
    pub counts: AnalyzeCounts,
    pub warnings: Vec<String>,
}
