//! The agentic retrieval-and-grading pipeline: cache, circuit breaking,
//! the main staged path, and the linear fallback path, behind one
//! `RagPipeline::query` entry point.

pub mod fallback;
pub mod generator;
pub mod main_path;
pub mod service;

pub use generator::Generator;
pub use service::RagPipeline;
