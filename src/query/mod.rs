pub mod engine;
pub mod explain;

pub use engine::QueryEngine;
pub use explain::{Explainer, Explanation, HttpSummarizer, Summarizer};
