pub mod analyze;
pub mod ids;
pub mod outline;
pub mod refs;
pub mod tag;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

fn output_dir_for(input: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(dir) => dir.to_path_buf(),
        None => input
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("invalid UTF-8 file name: {}", path.display()))
}

fn artifact_path(output_dir: &Path, stem: &str, suffix: &str) -> PathBuf {
    output_dir.join(format!("{stem}_{suffix}"))
}
