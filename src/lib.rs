//! # storyweave
//!
//! Branching-narrative StoryMaps: versioned graph storage, editor auto-layout, condition
//! evaluation, playback, and reach/selection analytics.
//!
//! ## Architecture
//!
//! - [store]: per-episode versioned StoryMaps with optimistic compare-and-swap commits,
//!   validated by [engine::validate] and linted by [engine::lint].
//! - [layout]: deterministic layered auto-layout that terminates on cyclic graphs.
//! - [condition]: the `conditionExpr` language, parsed by [condition_parser].
//! - [engine]: the playback state machine ([engine::PlaybackResolver]) and the async
//!   [engine::ReaderSession] that expires timed choices.
//! - [analytics] / [analytics_pipeline]: event aggregation, fed asynchronously from playback.
//! - [delivery] / [editor]: the player read path and the editor write path.
//! - [services]: the registry wiring the above together.

pub mod analytics;
pub mod analytics_pipeline;
#[cfg(test)]
mod analytics_pipeline_test;
pub mod condition;
#[cfg(test)]
mod condition_test;
pub mod condition_parser;
pub mod config;
#[cfg(test)]
mod config_test;
pub mod delivery;
pub mod editor;
pub mod engine;
pub mod error;
pub mod layout;
pub mod services;
pub mod session_io;
pub mod store;
pub mod store_io;
pub mod types;

pub use analytics::{AnalyticsAggregator, AnalyticsReport};
pub use analytics_pipeline::{AnalyticsHandle, AnalyticsPipeline, spawn_ingestor};
pub use condition::{ConditionExpr, ConditionOperator, evaluate};
pub use config::StoryConfig;
pub use engine::{LintWarning, PlaybackResolver, ReaderSession, lint, validate};
pub use layout::{LayoutAlgorithm, LayoutOptions, autolayout};
pub use services::StoryServices;
pub use store::{CommitReceipt, GraphStore, StoryMapVersion};
pub use types::{PlaybackEvent, PlaybackSession, PlaybackState, StoryEdge, StoryMap, StoryNode};
