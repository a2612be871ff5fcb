use anyhow::{Context, Result};
use tracing::info;

use super::{artifact_path, file_stem, output_dir_for};
use crate::cli::OutlineArgs;
use crate::extraction::OpenAiClient;
use crate::outline_builder::build_outline;
use crate::util::{read_text, require_input, write_text};

pub fn run(args: OutlineArgs) -> Result<()> {
    require_input(&args.document, "input document")?;

    let output_path = match &args.output {
        Some(path) => path.clone(),
        None => artifact_path(
            &output_dir_for(&args.document, None),
            &file_stem(&args.document)?,
            "toc.md",
        ),
    };

    let document = read_text(&args.document)?;
    let client = OpenAiClient::new(args.llm.to_config())?;
    let build = build_outline(&client, &document, args.max_passes)
        .context("outline construction failed")?;

    write_text(&output_path, &format!("{}\n", build.markdown))?;

    info!(
        passes = build.passes,
        stop_reason = %build.stop_reason,
        output = %output_path.display(),
        "wrote outline"
    );
    Ok(())
}
