//! Graph checks and the playback state machine.

pub mod apply_mutations;
pub mod lint;
pub mod resolver;
pub mod select_edge;
pub mod timed_choice;
pub mod validate_graph;

#[cfg(test)]
mod select_edge_test;
#[cfg(test)]
mod timed_choice_test;

pub use apply_mutations::apply_mutations;
pub use lint::{LintWarning, lint};
pub use resolver::{DEFAULT_MAX_AUTO_STEPS, PlaybackResolver};
pub use select_edge::select_edge;
pub use timed_choice::ReaderSession;
pub use validate_graph::validate;
