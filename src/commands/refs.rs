use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::{artifact_path, file_stem, output_dir_for};
use crate::cli::RefsArgs;
use crate::extraction::{ExtractionService, OpenAiClient, ReferenceRequest};
use crate::header_ids::HeaderIdAssigner;
use crate::model::{LevelBucket, ReferenceEdge};
use crate::util::{ensure_directory, read_text, require_input, write_json_pretty};
use crate::xref::CrossReferenceAssembler;

pub struct RefsOutcome {
    pub edges: Vec<ReferenceEdge>,
    pub levels: Vec<LevelBucket>,
    pub all_refs: BTreeMap<String, Vec<String>>,
}

pub fn run(args: RefsArgs) -> Result<()> {
    require_input(&args.outline, "outline")?;
    require_input(&args.tagged, "tagged document")?;

    let output_dir = output_dir_for(&args.tagged, args.output_dir.as_deref());
    ensure_directory(&output_dir)?;
    let tagged_stem = file_stem(&args.tagged)?;
    let stem = tagged_stem
        .strip_suffix("_tagged")
        .unwrap_or(&tagged_stem)
        .to_string();

    let outline_markdown = read_text(&args.outline)?;
    let tagged_text = read_text(&args.tagged)?;
    let client = OpenAiClient::new(args.llm.to_config())?;

    let outcome = cross_reference(&client, &outline_markdown, &tagged_text)?;

    let levels_path = artifact_path(&output_dir, &stem, "levels.json");
    let all_refs_path = artifact_path(&output_dir, &stem, "all_refs.json");
    write_json_pretty(&levels_path, &outcome.levels)?;
    write_json_pretty(&all_refs_path, &outcome.all_refs)?;

    info!(
        edges = outcome.edges.len(),
        levels = %levels_path.display(),
        all_refs = %all_refs_path.display(),
        "wrote cross-reference artifacts"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.all_refs)?);
    }

    Ok(())
}

pub fn cross_reference<S>(
    service: &S,
    outline_markdown: &str,
    tagged_text: &str,
) -> Result<RefsOutcome>
where
    S: ExtractionService + ?Sized,
{
    let outline = HeaderIdAssigner::new()?.collect(outline_markdown);
    if outline.is_empty() {
        warn!("outline has no anchored headings; every edge will be dropped");
    }
    let edges = service
        .extract_references(&ReferenceRequest {
            outline_markdown,
            tagged_text,
        })
        .context("reference extraction failed")?;

    let assembler = CrossReferenceAssembler::new()?;
    let levels = assembler.assemble(&outline, tagged_text, &edges);
    let all_refs = assembler.collect_all_refs(&levels, Some(tagged_text));

    info!(
        sections = outline.len(),
        edges = edges.len(),
        levels = levels.len(),
        "cross-references assembled"
    );

    Ok(RefsOutcome {
        edges,
        levels,
        all_refs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{ExtractionError, OutlineRequest};

    struct FixedEdges(Vec<ReferenceEdge>);

    impl ExtractionService for FixedEdges {
        fn expand_outline(&self, _request: &OutlineRequest<'_>) -> Result<String, ExtractionError> {
            Ok(String::new())
        }

        fn extract_references(
            &self,
            request: &ReferenceRequest<'_>,
        ) -> Result<Vec<ReferenceEdge>, ExtractionError> {
            assert!(request.outline_markdown.contains("{#h2}"));
            Ok(self.0.clone())
        }
    }

    struct Unavailable;

    impl ExtractionService for Unavailable {
        fn expand_outline(&self, _request: &OutlineRequest<'_>) -> Result<String, ExtractionError> {
            Err(ExtractionError::MissingCompletion)
        }

        fn extract_references(
            &self,
            _request: &ReferenceRequest<'_>,
        ) -> Result<Vec<ReferenceEdge>, ExtractionError> {
            Err(ExtractionError::MissingCompletion)
        }
    }

    #[test]
    fn resolves_edges_to_section_text() {
        let outline = "# Definitions {#h1}\n# Scope {#h2}\n";
        let tagged = "[START SECTION h1: Definitions] terms [END SECTION h1: Definitions] \
                      [START SECTION h2: Scope] see Definitions [END SECTION h2: Scope]";
        let service = FixedEdges(vec![ReferenceEdge {
            from_id: "h2".to_string(),
            to_ids: vec!["h1".to_string()],
        }]);

        let outcome = cross_reference(&service, outline, tagged).expect("refs should resolve");

        assert_eq!(outcome.edges.len(), 1);
        assert_eq!(outcome.levels.len(), 1);
        assert_eq!(outcome.levels[0].chunks[1].references, vec!["h1"]);
        assert_eq!(outcome.all_refs["h2"], vec!["terms"]);
        assert!(outcome.all_refs["h1"].is_empty());
    }

    #[test]
    fn service_failure_is_reported_with_context() {
        let err = cross_reference(&Unavailable, "# A {#h1}\n", "")
            .err()
            .expect("service failure should surface");
        assert_eq!(err.to_string(), "reference extraction failed");
    }
}
