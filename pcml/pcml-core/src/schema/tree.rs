use std::collections::HashMap;

use super::types::{FieldNode, NodeId, NodeKind, Usage};

/// Immutable arena holding every node of a loaded document.
///
/// Built once by [`SchemaTree::from_declaration`]; share it between calls
/// with an `Arc`. Runtime values live elsewhere.
#[derive(Debug, Clone)]
pub struct SchemaTree {
    pub(crate) nodes: Vec<FieldNode>,
    pub(crate) index: HashMap<String, NodeId>,
    /// Array nodes on the root→node path, outermost first, per node.
    pub(crate) array_paths: Vec<Vec<NodeId>>,
}

impl SchemaTree {
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &FieldNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &FieldNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Look up a node by its absolute qualified name.
    pub fn lookup(&self, qualified_name: &str) -> Option<NodeId> {
        self.index.get(qualified_name).copied()
    }

    /// Resolve `name` the way a reference attribute on `from` sees it.
    ///
    /// Each enclosing qualified prefix is tried from the innermost outwards
    /// (siblings first, then the siblings of every ancestor) before `name`
    /// is taken as absolute.
    pub fn resolve_relative(&self, from: NodeId, name: &str) -> Option<NodeId> {
        let mut scope = self.node(from).parent;
        while let Some(id) = scope {
            let prefix = &self.node(id).qualified_name;
            if !prefix.is_empty()
                && let Some(found) = self.lookup(&format!("{prefix}.{name}"))
            {
                return Some(found);
            }
            scope = self.node(id).parent;
        }
        self.lookup(name)
    }

    /// Array nodes on the path from the root to `id` (inclusive), outermost first.
    pub fn array_path(&self, id: NodeId) -> &[NodeId] {
        &self.array_paths[id.0]
    }

    /// Number of indices needed to address one element of `id`.
    pub fn dimension_depth(&self, id: NodeId) -> usize {
        self.array_paths[id.0].len()
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).parent, move |p| self.node(*p).parent)
    }

    /// Usage after `inherit` is replaced by the nearest explicit ancestor
    /// usage; parameters with nothing to inherit are input/output.
    pub fn effective_usage(&self, id: NodeId) -> Usage {
        let mut current = Some(id);
        while let Some(n) = current {
            let node = self.node(n);
            match (&node.kind, node.usage) {
                (NodeKind::Program(_) | NodeKind::Document, _) => break,
                (_, Usage::Inherit) => current = node.parent,
                (_, usage) => return usage,
            }
        }
        Usage::InputOutput
    }

    /// Program node declared with `name`.
    pub fn program(&self, name: &str) -> Option<NodeId> {
        self.lookup(name)
            .filter(|id| matches!(self.node(*id).kind, NodeKind::Program(_)))
    }

    pub fn programs(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.node(self.root())
            .children
            .iter()
            .copied()
            .filter(|id| matches!(self.node(*id).kind, NodeKind::Program(_)))
    }
}
