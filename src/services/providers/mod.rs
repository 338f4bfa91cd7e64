/// External collaborators of the recommendation core
///
/// Embedding providers turn text into vectors for the semantic signal.
/// Explanation providers write the short "why this film" text. Both come with
/// an offline implementation and an HTTP one.
pub mod embedding;
pub mod explanation;
