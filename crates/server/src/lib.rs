//! Server crate for the CineMatch recommendation engine.
//!
//! This crate contains the orchestrator that sits between callers (the CLI,
//! benchmarks) and the similarity engine: it owns the current catalog
//! snapshot and the shared feature-index cache.

pub mod orchestrator;

pub use orchestrator::{MovieRecommendation, RecommendationOrchestrator};
