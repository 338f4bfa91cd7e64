pub mod providers;
pub mod ranker;
pub mod recommendations;
pub mod scoring;
pub mod similarity;
