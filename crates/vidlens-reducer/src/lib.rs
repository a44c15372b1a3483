//! Annotation reduction pipeline.
//!
//! This crate provides:
//! - Per-category normalization of raw annotations into timeline events
//! - Stable time-ordered merging and text rendering
//! - Aggregate confidence over label annotations
//! - Timeline and summary reduction strategies
//! - `VideoAnalyzer`, which drives an injected `AnnotationProvider`

pub mod analyzer;
pub mod confidence;
pub mod normalizer;
pub mod provider;
pub mod strategy;
pub mod timeline;

pub use analyzer::{analyze, AnalysisRequest, VideoAnalyzer};
pub use confidence::aggregate_confidence;
pub use normalizer::normalize;
pub use provider::{AnnotationProvider, ProviderError, ProviderResult, VideoUpload};
pub use strategy::{reduce, ReductionStrategy, UnknownStrategy};
pub use timeline::Timeline;
