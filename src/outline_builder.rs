use std::fmt;

use tracing::{debug, info};

use crate::extraction::{ExtractionError, ExtractionService, OutlineRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineStopReason {
    Converged,
    EmptyResponse,
    PassBudgetExhausted,
}

impl fmt::Display for OutlineStopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Converged => "converged",
            Self::EmptyResponse => "empty-response",
            Self::PassBudgetExhausted => "pass-budget-exhausted",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineBuild {
    pub markdown: String,
    pub passes: usize,
    pub stop_reason: OutlineStopReason,
}

pub fn build_outline<S>(
    service: &S,
    document: &str,
    max_passes: usize,
) -> Result<OutlineBuild, ExtractionError>
where
    S: ExtractionService + ?Sized,
{
    let mut markdown = String::new();
    let mut passes = 0_usize;

    for pass_number in 1..=max_passes {
        passes = pass_number;
        let response = service.expand_outline(&OutlineRequest {
            pass_number,
            current_outline: &markdown,
            document,
        })?;
        let response = response.trim();

        if response.is_empty() {
            info!(pass = pass_number, "outline pass returned nothing; stopping");
            return Ok(OutlineBuild {
                markdown,
                passes,
                stop_reason: OutlineStopReason::EmptyResponse,
            });
        }
        if response == markdown {
            info!(pass = pass_number, "outline converged");
            return Ok(OutlineBuild {
                markdown,
                passes,
                stop_reason: OutlineStopReason::Converged,
            });
        }

        markdown = response.to_string();
        debug!(
            pass = pass_number,
            heading_lines = markdown.lines().filter(|line| line.starts_with('#')).count(),
            "outline pass expanded"
        );
    }

    Ok(OutlineBuild {
        markdown,
        passes,
        stop_reason: OutlineStopReason::PassBudgetExhausted,
    })
}
