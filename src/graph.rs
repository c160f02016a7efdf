//! The evaluated Make dependency graph handed to the generator.

use indexmap::IndexMap;
use smol_str::SmolStr;

/// An index that uniquely identifies a target node in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// The resolved dependency graph the generator walks.
///
/// This type is immutable. To build it, use [`GraphBuilder`].
#[derive(Default, Debug)]
pub struct DepGraph {
    nodes: Vec<DepNode>,
    targets: IndexMap<SmolStr, NodeId>,
}

impl DepGraph {
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &DepNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn lookup_target(&self, output: &str) -> Option<NodeId> {
        self.targets.get(output).copied()
    }

    pub fn lookup_node(&self, id: NodeId) -> Option<&DepNode> {
        self.nodes.get(id.0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// One target in the dependency graph.
#[derive(Debug, Default)]
pub struct DepNode {
    /// The target name.
    pub output: SmolStr,
    /// Normal prerequisites, in declaration order.
    pub deps: Vec<NodeId>,
    /// Prerequisites that order the build without triggering rebuilds.
    pub order_onlys: Vec<NodeId>,
    /// Unevaluated recipe lines. Only the evaluator interprets these;
    /// the generator looks at emptiness alone.
    pub cmds: Vec<String>,
    /// Whether Make declared the target phony.
    pub is_phony: bool,
}

/// The builder to build a [`DepGraph`].
///
/// This builder is append-only. Declaring the same output twice returns
/// the first node's id, so shared subgraphs and cycles can be expressed
/// one edge at a time.
#[derive(Default, Debug)]
pub struct GraphBuilder {
    graph: DepGraph,
}

impl GraphBuilder {
    /// Create a new, empty dependency graph.
    pub fn new() -> Self {
        Default::default()
    }

    /// Declare a target, returning its id.
    ///
    /// The node starts without prerequisites or recipe lines; wire those
    /// up with the `add_*` methods.
    pub fn declare(&mut self, output: impl Into<SmolStr>) -> NodeId {
        let output = output.into();
        if let Some(&id) = self.graph.targets.get(&output) {
            return id;
        }
        let id = NodeId(self.graph.nodes.len());
        self.graph.nodes.push(DepNode {
            output: output.clone(),
            ..Default::default()
        });
        self.graph.targets.insert(output, id);
        id
    }

    /// Add a normal prerequisite.
    pub fn add_dep(&mut self, node: NodeId, dep: NodeId) {
        self.graph.nodes[node.0].deps.push(dep);
    }

    /// Add an order-only prerequisite.
    pub fn add_order_only(&mut self, node: NodeId, dep: NodeId) {
        self.graph.nodes[node.0].order_onlys.push(dep);
    }

    /// Append an unevaluated recipe line.
    pub fn add_cmd(&mut self, node: NodeId, cmd: impl Into<String>) {
        self.graph.nodes[node.0].cmds.push(cmd.into());
    }

    /// Mark the target phony.
    pub fn set_phony(&mut self, node: NodeId) {
        self.graph.nodes[node.0].is_phony = true;
    }

    /// Lookup a node id by its output name.
    pub fn lookup_target(&self, output: &str) -> Option<NodeId> {
        self.graph.lookup_target(output)
    }

    /// Finish building the graph.
    pub fn build(self) -> DepGraph {
        self.graph
    }
}
