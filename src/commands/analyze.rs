use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use super::refs::cross_reference;
use super::tag::tag_document;
use super::{artifact_path, file_stem, output_dir_for};
use crate::cli::AnalyzeArgs;
use crate::extraction::OpenAiClient;
use crate::model::{AnalyzeCounts, AnalyzePaths, AnalyzeRunManifest};
use crate::outline_builder::build_outline;
use crate::util::{
    ensure_directory, now_utc_string, read_text, require_input, sha256_file, utc_compact_string,
    write_json_pretty, write_text,
};

pub fn run(args: AnalyzeArgs) -> Result<()> {
    require_input(&args.document, "input document")?;

    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let output_dir = output_dir_for(&args.document, args.output_dir.as_deref());
    ensure_directory(&output_dir)?;
    let stem = file_stem(&args.document)?;

    let outline_path = artifact_path(&output_dir, &stem, "toc.md");
    let outline_ids_path = artifact_path(&output_dir, &stem, "toc_ids.md");
    let tagged_path = artifact_path(&output_dir, &stem, "tagged.txt");
    let smallest_chunks_path = artifact_path(&output_dir, &stem, "smallest_chunks.json");
    let levels_path = artifact_path(&output_dir, &stem, "levels.json");
    let all_refs_path = artifact_path(&output_dir, &stem, "all_refs.json");
    let manifest_path = artifact_path(&output_dir, &stem, "run.json");

    info!(
        document = %args.document.display(),
        output_dir = %output_dir.display(),
        run_id = %run_id,
        "starting analysis"
    );

    let raw_text = read_text(&args.document)?;
    let source_sha256 = sha256_file(&args.document)?;
    let client = OpenAiClient::new(args.llm.to_config())?;

    let build = build_outline(&client, &raw_text, args.max_passes)
        .context("outline construction failed")?;
    write_text(&outline_path, &format!("{}\n", build.markdown))?;
    info!(
        passes = build.passes,
        stop_reason = %build.stop_reason,
        path = %outline_path.display(),
        "wrote outline"
    );

    let tagging = tag_document(&build.markdown, &raw_text, args.locator.to_config())?;
    write_text(&outline_ids_path, &tagging.outline_markdown)?;
    write_text(&tagged_path, &tagging.document.text)?;
    write_json_pretty(&smallest_chunks_path, &tagging.chunks)?;

    let refs = cross_reference(&client, &tagging.outline_markdown, &tagging.document.text)?;
    write_json_pretty(&levels_path, &refs.levels)?;
    write_json_pretty(&all_refs_path, &refs.all_refs)?;

    let diagnostics = tagging.diagnostic_counts();
    let manifest = AnalyzeRunManifest {
        manifest_version: 1,
        run_id,
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        model: client.model().to_string(),
        max_passes: args.max_passes,
        outline_stop_reason: build.stop_reason.to_string(),
        source_sha256,
        paths: AnalyzePaths {
            document_path: args.document.display().to_string(),
            output_dir: output_dir.display().to_string(),
            outline_path: outline_path.display().to_string(),
            outline_ids_path: outline_ids_path.display().to_string(),
            tagged_path: tagged_path.display().to_string(),
            smallest_chunks_path: smallest_chunks_path.display().to_string(),
            levels_path: levels_path.display().to_string(),
            all_refs_path: all_refs_path.display().to_string(),
        },
        counts: AnalyzeCounts {
            document_bytes: raw_text.len(),
            outline_passes: build.passes,
            outline_sections: tagging.outline_sections,
            located_sections: tagging.document.sections.len(),
            unlocated_sections: diagnostics.unlocated,
            collapsed_sections: diagnostics.collapsed,
            duplicate_sections: diagnostics.duplicate,
            reference_edges: refs.edges.len(),
            leaf_chunks: tagging.chunks.len(),
        },
        warnings: tagging
            .document
            .diagnostics
            .iter()
            .map(ToString::to_string)
            .collect(),
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(path = %manifest_path.display(), "wrote analysis run manifest");
    info!(
        sections = manifest.counts.outline_sections,
        located = manifest.counts.located_sections,
        edges = manifest.counts.reference_edges,
        "analysis completed"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&refs.all_refs)?);
    }

    Ok(())
}
