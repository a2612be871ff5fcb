use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::extraction::LlmConfig;
use crate::locate::{LocatorConfig, WindowConfig};

#[derive(Parser, Debug)]
#[command(
    name = "docxref",
    version,
    about = "Outline, section tagging and cross-reference extraction for long structured documents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Full pipeline: outline, ids, tagging, cross-references.")]
    Analyze(AnalyzeArgs),
    #[command(about = "Build the outline only.")]
    Outline(OutlineArgs),
    #[command(about = "Stamp {#hN} ids onto an outline.")]
    Ids(IdsArgs),
    #[command(about = "Tag a document with an outline; no network access.")]
    Tag(TagArgs),
    #[command(about = "Cross-reference an already tagged document.")]
    Refs(RefsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct LlmArgs {
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub base_url: String,

    #[arg(long, default_value = "gpt-4.1-mini")]
    pub model: String,

    #[arg(long, default_value_t = 32768)]
    pub max_tokens: u32,

    #[arg(long, default_value_t = 0.0)]
    pub temperature: f32,

    #[arg(long, default_value_t = 3)]
    pub max_retries: usize,

    #[arg(long, default_value_t = 300)]
    pub timeout_secs: u64,
}

impl LlmArgs {
    pub fn to_config(&self) -> LlmConfig {
        LlmConfig {
            api_key: self.api_key.clone().unwrap_or_default(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            max_retries: self.max_retries,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct LocatorArgs {
    #[arg(long, default_value_t = 2000)]
    pub window_words: usize,

    #[arg(long, default_value_t = 50)]
    pub window_overlap: usize,

    #[arg(long, default_value_t = 0.8)]
    pub fuzzy_threshold: f64,

    #[arg(long, default_value_t = 500)]
    pub title_lookback: usize,

    #[arg(long, default_value_t = 5)]
    pub min_sequence_words: usize,
}

impl LocatorArgs {
    pub fn to_config(&self) -> LocatorConfig {
        LocatorConfig {
            windows: WindowConfig {
                window_words: self.window_words,
                overlap_words: self.window_overlap,
            },
            fuzzy_threshold: self.fuzzy_threshold,
            title_lookback: self.title_lookback,
            min_sequence_words: self.min_sequence_words,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    #[arg(long)]
    pub document: PathBuf,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 3)]
    pub max_passes: usize,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[command(flatten)]
    pub llm: LlmArgs,

    #[command(flatten)]
    pub locator: LocatorArgs,
}

#[derive(Args, Debug, Clone)]
pub struct OutlineArgs {
    #[arg(long)]
    pub document: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long, default_value_t = 3)]
    pub max_passes: usize,

    #[command(flatten)]
    pub llm: LlmArgs,
}

#[derive(Args, Debug, Clone)]
pub struct IdsArgs {
    #[arg(long)]
    pub outline: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub map_output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct TagArgs {
    #[arg(long)]
    pub outline: PathBuf,

    #[arg(long)]
    pub document: PathBuf,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[command(flatten)]
    pub locator: LocatorArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RefsArgs {
    #[arg(long)]
    pub outline: PathBuf,

    #[arg(long)]
    pub tagged: PathBuf,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[command(flatten)]
    pub llm: LlmArgs,
}
