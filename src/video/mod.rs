//! Video understanding: analysis records, the analyzer seam, and the summary cache.

mod analysis;
mod analyzer;
mod cache;

pub use analysis::{VideoAction, VideoAnalysis};
pub use analyzer::{OpenAIVideoAnalyzer, VideoAnalyzer};
pub use cache::SummaryCache;
