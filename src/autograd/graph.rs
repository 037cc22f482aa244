//! Arena-backed scalar graph: node storage, elementary ops, and backward.

use std::fmt;

/// Handle to a scalar node in a [`Graph`].
///
/// Handles are plain indices. A handle created after a [`GraphMark`] is
/// invalidated by [`Graph::rewind`] to that mark.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of this node in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Snapshot of the arena size, used to drop every node created afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GraphMark {
    nodes: usize,
    edges: usize,
}

impl GraphMark {
    /// Number of nodes alive at the time of the mark.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes
    }

    /// Returns `true` if the mark was taken on an empty graph.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes == 0
    }
}

/// One edge from a result node to an operand, with d(result)/d(operand).
#[derive(Clone, Copy, Debug)]
struct Edge {
    child: NodeId,
    local_grad: f64,
}

/// Internal node: forward value, its slice of the edge list, optional label.
#[derive(Clone, Debug)]
struct Node {
    /// Forward pass value.
    data: f64,
    /// First edge of this node in [`Graph::edges`].
    edge_start: usize,
    /// Number of children (and local grads).
    edge_len: usize,
    label: Option<String>,
}

/// Arena of scalar nodes.
///
/// Children always precede their parents in the arena, and gradients are kept
/// in a parallel array indexed by [`NodeId`].
#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    grads: Vec<f64>,
    edges: Vec<Edge>,
}

impl Graph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, data: f64, operands: &[(NodeId, f64)]) -> NodeId {
        let id = NodeId(self.nodes.len());
        let edge_start = self.edges.len();
        self.edges.extend(operands.iter().map(|&(child, local_grad)| Edge {
            child,
            local_grad,
        }));
        self.nodes.push(Node {
            data,
            edge_start,
            edge_len: operands.len(),
            label: None,
        });
        self.grads.push(0.0);
        id
    }

    /// Creates a leaf node (no children) with the given value and zero gradient.
    pub fn constant(&mut self, data: f64) -> NodeId {
        self.push(data, &[])
    }

    /// Forward pass value.
    #[must_use]
    pub fn value(&self, id: NodeId) -> f64 {
        self.nodes[id.0].data
    }

    /// Forward values of a slice of nodes.
    #[must_use]
    pub fn values(&self, ids: &[NodeId]) -> Vec<f64> {
        ids.iter().map(|&id| self.value(id)).collect()
    }

    /// Overwrites a node's value. Only meaningful for leaves (parameters).
    pub fn set_value(&mut self, id: NodeId, data: f64) {
        self.nodes[id.0].data = data;
    }

    /// Gradient of the last backward root with respect to this node.
    #[must_use]
    pub fn grad(&self, id: NodeId) -> f64 {
        self.grads[id.0]
    }

    /// Sets this node's gradient to 0 (e.g. after an optimizer step).
    pub fn zero_grad(&mut self, id: NodeId) {
        self.grads[id.0] = 0.0;
    }

    /// Children of a node, in operand order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.node_edges(id).iter().map(|e| e.child).collect()
    }

    /// Local partial derivatives of a node, parallel to [`Graph::children`].
    #[must_use]
    pub fn local_grads(&self, id: NodeId) -> Vec<f64> {
        self.node_edges(id).iter().map(|e| e.local_grad).collect()
    }

    fn node_edges(&self, id: NodeId) -> &[Edge] {
        let node = &self.nodes[id.0];
        &self.edges[node.edge_start..node.edge_start + node.edge_len]
    }

    /// Attaches a debug label to a node.
    pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) {
        self.nodes[id.0].label = Some(label.into());
    }

    /// Debug label of a node, if any.
    #[must_use]
    pub fn label(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].label.as_deref()
    }

    /// Records the current arena size.
    #[must_use]
    pub fn mark(&self) -> GraphMark {
        GraphMark {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
        }
    }

    /// Drops every node created after `mark`. Handles to those nodes become invalid.
    pub fn rewind(&mut self, mark: GraphMark) {
        self.nodes.truncate(mark.nodes);
        self.grads.truncate(mark.nodes);
        self.edges.truncate(mark.edges);
    }

    // -------------------------------------------------------------------------
    // Elementary ops
    // -------------------------------------------------------------------------

    /// Addition: `a + b`. Local grads are 1 and 1.
    pub fn add(&mut self, a: NodeId, b: NodeId) -> NodeId {
        let data = self.value(a) + self.value(b);
        self.push(data, &[(a, 1.0), (b, 1.0)])
    }

    /// Multiplication: `a * b`. Local grads are `b` and `a`.
    pub fn mul(&mut self, a: NodeId, b: NodeId) -> NodeId {
        let (x, y) = (self.value(a), self.value(b));
        self.push(x * y, &[(a, y), (b, x)])
    }

    /// Power: `a^exp`. Local grad is `exp * a^(exp-1)`.
    ///
    /// A non-integer exponent on a negative base yields NaN.
    pub fn pow(&mut self, a: NodeId, exp: f64) -> NodeId {
        let x = self.value(a);
        self.push(x.powf(exp), &[(a, exp * x.powf(exp - 1.0))])
    }

    /// Natural log. Local grad is `1/a`.
    ///
    /// Follows IEEE semantics instead of failing: `log(0)` is `-inf` and the
    /// log of a negative value is NaN.
    pub fn log(&mut self, a: NodeId) -> NodeId {
        let x = self.value(a);
        self.push(x.ln(), &[(a, 1.0 / x)])
    }

    /// Exponential. Local grad is `exp(a)`.
    pub fn exp(&mut self, a: NodeId) -> NodeId {
        let data = self.value(a).exp();
        self.push(data, &[(a, data)])
    }

    /// ReLU: `max(0, a)`. Local grad is 1 if `a > 0`, else 0.
    pub fn relu(&mut self, a: NodeId) -> NodeId {
        let x = self.value(a);
        let local_grad = if x > 0.0 { 1.0 } else { 0.0 };
        self.push(x.max(0.0), &[(a, local_grad)])
    }

    /// Negation: `a * -1`.
    pub fn neg(&mut self, a: NodeId) -> NodeId {
        let neg_one = self.constant(-1.0);
        self.mul(a, neg_one)
    }

    /// Subtraction: `a + (-b)`.
    pub fn sub(&mut self, a: NodeId, b: NodeId) -> NodeId {
        let neg_b = self.neg(b);
        self.add(a, neg_b)
    }

    /// Division: `a * b^(-1)`.
    pub fn div(&mut self, a: NodeId, b: NodeId) -> NodeId {
        let inv = self.pow(b, -1.0);
        self.mul(a, inv)
    }

    /// Left fold of `add` over `xs`. An empty slice sums to a fresh constant 0.
    pub fn sum(&mut self, xs: &[NodeId]) -> NodeId {
        match xs.split_first() {
            None => self.constant(0.0),
            Some((&first, rest)) => rest.iter().fold(first, |acc, &x| self.add(acc, x)),
        }
    }

    // -------------------------------------------------------------------------
    // Backward
    // -------------------------------------------------------------------------

    /// Post-order depth-first ordering of every node reachable from `root`.
    ///
    /// Each node appears once, after all of its children.
    #[must_use]
    pub fn topo_order(&self, root: NodeId) -> Vec<NodeId> {
        let mut topo = Vec::new();
        let mut visited = vec![false; root.0 + 1];
        // (node, index of the next child to visit)
        let mut stack = vec![(root, 0usize)];
        visited[root.0] = true;
        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            match self.node_edges(node).get(next) {
                Some(edge) => {
                    top.1 += 1;
                    let child = edge.child;
                    if !visited[child.0] {
                        visited[child.0] = true;
                        stack.push((child, 0));
                    }
                }
                None => {
                    topo.push(node);
                    stack.pop();
                }
            }
        }
        topo
    }

    /// Runs backprop: topological sort, then chain rule from `root` to all leaves.
    ///
    /// Gradients accumulate into whatever the nodes already hold, so parameter
    /// gradients must be zeroed between steps.
    pub fn backward(&mut self, root: NodeId) {
        let topo = self.topo_order(root);
        self.grads[root.0] = 1.0;
        for &v in topo.iter().rev() {
            let v_grad = self.grads[v.0];
            let node = &self.nodes[v.0];
            for edge in &self.edges[node.edge_start..node.edge_start + node.edge_len] {
                self.grads[edge.child.0] += edge.local_grad * v_grad;
            }
        }
    }
}
