//! Autograd: a scalar computation graph with reverse-mode differentiation.
//!
//! Nodes live in an arena ([`Graph`]) and are addressed by copyable [`NodeId`]
//! handles. The graph is built during forward operations; [`Graph::backward`]
//! propagates gradients from a loss node to every reachable node using the
//! chain rule in topological order. Sharing a node means sharing its handle, so
//! diamond dependencies accumulate their gradients.

mod graph;

pub use graph::{Graph, GraphMark, NodeId};
