use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::{artifact_path, file_stem, output_dir_for};
use crate::cli::TagArgs;
use crate::header_ids::{HeaderIdAssigner, OutlineMap};
use crate::locate::LocatorConfig;
use crate::markers::MarkerParser;
use crate::tagger::{SectionTagger, TagDiagnostic, TaggedDocument, smallest_chunks};
use crate::util::{ensure_directory, read_text, require_input, write_json_pretty, write_text};

pub struct TagOutcome {
    pub outline_markdown: String,
    pub outline: OutlineMap,
    pub outline_sections: usize,
    pub document: TaggedDocument,
    pub chunks: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticCounts {
    pub unlocated: usize,
    pub duplicate: usize,
    pub collapsed: usize,
}

impl TagOutcome {
    pub fn diagnostic_counts(&self) -> DiagnosticCounts {
        let mut counts = DiagnosticCounts::default();
        for diagnostic in &self.document.diagnostics {
            match diagnostic {
                TagDiagnostic::Unlocated { .. } => counts.unlocated += 1,
                TagDiagnostic::DuplicateId { .. } => counts.duplicate += 1,
                TagDiagnostic::Collapsed { .. } => counts.collapsed += 1,
            }
        }
        counts
    }
}

pub fn run(args: TagArgs) -> Result<()> {
    require_input(&args.outline, "outline")?;
    require_input(&args.document, "input document")?;

    let output_dir = output_dir_for(&args.document, args.output_dir.as_deref());
    ensure_directory(&output_dir)?;
    let stem = file_stem(&args.document)?;

    let outline_markdown = read_text(&args.outline)?;
    let raw_text = read_text(&args.document)?;

    let outcome = tag_document(&outline_markdown, &raw_text, args.locator.to_config())?;

    let ids_path = artifact_path(&output_dir, &stem, "toc_ids.md");
    let tagged_path = artifact_path(&output_dir, &stem, "tagged.txt");
    let chunks_path = artifact_path(&output_dir, &stem, "smallest_chunks.json");
    write_text(&ids_path, &outcome.outline_markdown)?;
    write_text(&tagged_path, &outcome.document.text)?;
    write_json_pretty(&chunks_path, &outcome.chunks)?;

    info!(
        tagged = %tagged_path.display(),
        chunks = %chunks_path.display(),
        "wrote tagging artifacts"
    );
    Ok(())
}

pub fn tag_document(
    outline_markdown: &str,
    raw_text: &str,
    config: LocatorConfig,
) -> Result<TagOutcome> {
    let assigner = HeaderIdAssigner::new()?;
    let assignment = assigner.assign(outline_markdown);

    let tagger = SectionTagger::new(config)?;
    let sections = tagger.parse_outline(&assignment.markdown);
    let document = tagger.tag(&sections, raw_text);
    for located in &document.sections {
        debug!(
            section_id = %located.section.id,
            start = located.start,
            end = located.end,
            method = %located.method,
            "section located"
        );
    }
    report_diagnostics(&document.diagnostics);

    let markers = MarkerParser::new()?;
    let nested = markers
        .parse_tagged_text(&document.text)
        .context("tagged text failed the marker consistency check")?;
    for section in &nested {
        debug!(
            section_id = %section.id,
            title = %section.title,
            depth = section.depth,
            text_bytes = section.text.len(),
            "tagged section"
        );
    }
    let chunks = smallest_chunks(&markers, &document.text, &sections);

    info!(
        outline_sections = sections.len(),
        located = document.sections.len(),
        leaf_chunks = chunks.len(),
        "tagging complete"
    );

    Ok(TagOutcome {
        outline_markdown: assignment.markdown,
        outline: assignment.outline,
        outline_sections: sections.len(),
        document,
        chunks,
    })
}

fn report_diagnostics(diagnostics: &[TagDiagnostic]) {
    for diagnostic in diagnostics {
        match diagnostic {
            TagDiagnostic::Unlocated { id, title, cue } => warn!(
                section_id = %id,
                title = %title,
                cue = %cue,
                "section not located; left untagged"
            ),
            TagDiagnostic::DuplicateId { id, document_order } => warn!(
                section_id = %id,
                line = document_order,
                "duplicate section id; later entry ignored"
            ),
            TagDiagnostic::Collapsed { id, title, offset } => warn!(
                section_id = %id,
                title = %title,
                offset,
                "section span is empty; left untagged"
            ),
        }
    }
}
