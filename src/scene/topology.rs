//! Precomputed traversal order for the node arena.
//!
//! The hierarchy is flattened once per document into a parent-before-child
//! visit order (level order, the batches the transform pass walks). Every
//! evaluation pass then runs the same flat loop — no recursion, no
//! per-frame tree walking.

use crate::asset::Document;
use crate::errors::{Result, RimeError};

/// One visit in parent-before-child order.
#[derive(Debug, Clone, Copy)]
pub struct TopoEntry {
    pub node: usize,
    /// `None` for roots.
    pub parent: Option<usize>,
}

/// Flattened scene-graph traversal order, built once per document.
#[derive(Debug, Clone, Default)]
pub struct SceneTopology {
    pub roots: Vec<usize>,
    /// Every reachable node exactly once, parents before children.
    pub order: Vec<TopoEntry>,
}

impl SceneTopology {
    /// Builds the level-order visit list from the document's roots.
    ///
    /// Fails with `MalformedAsset` when a node is reachable through two
    /// parents or through a cycle — either would make "parent before child"
    /// meaningless.
    pub fn build(doc: &Document) -> Result<Self> {
        let roots = doc.root_nodes();
        let mut order = Vec::with_capacity(doc.nodes.len());
        let mut seen = vec![false; doc.nodes.len()];

        let mut current: Vec<TopoEntry> = roots
            .iter()
            .map(|&node| TopoEntry { node, parent: None })
            .collect();

        while !current.is_empty() {
            let mut next = Vec::new();
            for entry in &current {
                if seen[entry.node] {
                    return Err(RimeError::MalformedAsset(format!(
                        "node {} is reachable through more than one path",
                        entry.node
                    )));
                }
                seen[entry.node] = true;

                for &child in &doc.nodes[entry.node].children {
                    next.push(TopoEntry {
                        node: child as usize,
                        parent: Some(entry.node),
                    });
                }
            }
            order.append(&mut current);
            current = next;
        }

        Ok(Self { roots, order })
    }
}
