//! Scoring core: normalizer, feature scorers and aggregator.

mod aggregate;
pub mod features;
mod normalize;

pub use aggregate::{aggregate, Weights};
pub use features::{genre_score, language_score, people_bonus, period_score};
pub use normalize::{clamp, normalize};
