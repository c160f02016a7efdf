pub mod compiler;
pub mod config;
pub mod escape;
pub mod eval;
pub mod r#gen;
pub mod graph;
mod paths;
pub mod shell;

// Re-exports for convenience
pub use config::GenConfig;
pub use eval::{AvoidIoScope, Command, Evaluator, MakefileCache};
pub use r#gen::{GenError, NinjaGenerator};
pub use graph::{DepGraph, DepNode, GraphBuilder, NodeId};
