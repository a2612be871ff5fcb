use anyhow::Result;
use tracing::info;

use super::{artifact_path, file_stem, output_dir_for};
use crate::cli::IdsArgs;
use crate::header_ids::HeaderIdAssigner;
use crate::model::OutlineNode;
use crate::util::{read_text, require_input, write_json_pretty, write_text};

pub fn run(args: IdsArgs) -> Result<()> {
    require_input(&args.outline, "outline")?;

    let output_path = match &args.output {
        Some(path) => path.clone(),
        None => artifact_path(
            &output_dir_for(&args.outline, None),
            &file_stem(&args.outline)?,
            "ids.md",
        ),
    };

    let markdown = read_text(&args.outline)?;
    let assignment = HeaderIdAssigner::new()?.assign(&markdown);
    write_text(&output_path, &assignment.markdown)?;

    if let Some(map_path) = &args.map_output {
        let nodes = assignment.outline.iter().cloned().collect::<Vec<OutlineNode>>();
        write_json_pretty(map_path, &nodes)?;
        info!(map = %map_path.display(), "wrote outline map");
    }

    info!(
        headings = assignment.outline.len(),
        output = %output_path.display(),
        "wrote ID-stamped outline"
    );
    Ok(())
}
