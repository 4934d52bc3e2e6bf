//! Anistat core library: franchise graph construction and aggregate
//! statistics over an anime catalog and one user's watch progress.
//!
//! The main entry point is [`pipeline::AnalysisPipeline`], which runs the
//! Entry Store → Relation Graph → Franchise Assembler → Statistics Engine
//! pipeline over already-fetched [`types::CatalogRecord`] and
//! [`types::ProgressRecord`] sets.

pub mod analyze;
pub mod config;
pub mod error;
pub mod franchise;
pub mod pipeline;
pub mod progress;
pub mod store;
pub mod types;
