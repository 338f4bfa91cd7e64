//! Explanation providers.
//!
//! An explanation is a short human-readable "why this film" text. Providers are
//! best effort: the recommendation pipeline ranks first and substitutes
//! [`fallback_explanation`] for any provider error or timeout.

use crate::{
    error::AppResult,
    models::{Film, UserQuery},
};

pub mod gemini;
pub mod template;

pub use gemini::GeminiExplainer;
pub use template::TemplateExplainer;

/// Trait for explanation providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ExplanationProvider: Send + Sync {
    /// Explain why `film` was recommended for `query` with the given final score
    async fn explain(&self, query: &UserQuery, film: &Film, final_score: f64) -> AppResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Formats a [0, 1] score as a whole percentage, e.g. `0.823` -> `82%`
pub fn format_percent(score: f64) -> String {
    format!("{:.0}%", score * 100.0)
}

/// Sentence used when the provider failed or timed out
pub fn fallback_explanation(final_score: f64) -> String {
    format!(
        "Ce film colle bien à tes goûts (score {}). Son genre et son ambiance sont proches de ce que tu as décrit.",
        format_percent(final_score)
    )
}

/// Collapses newlines and cuts to `max_chars` characters, ending with `...` when cut
pub fn truncate_explanation(text: &str, max_chars: usize) -> String {
    let flattened = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if flattened.chars().count() <= max_chars {
        return flattened;
    }

    // No room for an ellipsis
    if max_chars <= 3 {
        return flattened.chars().take(max_chars).collect();
    }

    let kept: String = flattened.chars().take(max_chars - 3).collect();
    format!("{}...", kept.trim_end())
}
