//! The seam between the generator and its external collaborators.

use smol_str::SmolStr;

use crate::graph::{DepGraph, NodeId};

/// An already-evaluated recipe line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// The shell command.
    pub cmd: String,
    /// Whether Make would echo the line (false when prefixed with `@`).
    pub echo: bool,
    /// Whether Make would ignore its exit status (prefixed with `-`).
    pub ignore_error: bool,
}

impl Command {
    /// An echoed, error-checked command.
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            echo: true,
            ignore_error: false,
        }
    }
}

/// A trait that abstracts over the Make evaluation the generator sits
/// on top of.
///
/// All recipe and variable lookups go through this trait, so the
/// generator can be driven by a real evaluator or by a scripted mock in
/// tests. Results must be stable for the duration of one generator run.
pub trait Evaluator {
    /// Evaluate the recipe lines of `node` into concrete commands.
    fn evaluate(&self, graph: &DepGraph, node: NodeId) -> Vec<Command>;

    /// Look up a variable, returning the empty string when unset.
    fn eval_var(&self, name: &str) -> SmolStr;

    /// Exported (true) or explicitly unexported (false) variables, in
    /// declaration order.
    fn exports(&self) -> Vec<(SmolStr, bool)>;

    /// Environment variables consumed during evaluation.
    fn used_env_vars(&self) -> Vec<SmolStr>;

    /// Toggle whether the evaluator may perform side-effectful I/O.
    fn set_avoid_io(&self, avoid: bool);
}

/// Lists the makefiles that were read, for regeneration dependencies.
pub trait MakefileCache {
    fn all_filenames(&self) -> Vec<String>;
}

/// Keeps the evaluator's `avoid_io` flag set for the guard's lifetime.
///
/// The flag is reset on drop, on every exit path.
pub struct AvoidIoScope<'a> {
    ev: &'a dyn Evaluator,
}

impl<'a> AvoidIoScope<'a> {
    pub fn new(ev: &'a dyn Evaluator) -> Self {
        ev.set_avoid_io(true);
        Self { ev }
    }
}

impl Drop for AvoidIoScope<'_> {
    fn drop(&mut self) {
        self.ev.set_avoid_io(false);
    }
}
