//! Plain tree construction from events, and event emission from a tree

pub mod builder;
pub mod emitter;

pub use builder::{build, BuildOptions, TreeBuilder};
pub use emitter::{emit_events, emit_events_into};
