//! Nodes of a k-d tree stored in preorder.

use serde::{Deserialize, Serialize};

use crate::types::point::PointType;

/// 1-based preorder identifier of a node in the global tree.
pub type NodeId = usize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Internal {
        split_dim: usize,
        split_value: PointType,
        left: NodeId,
        /// Only known once the whole left subtree has been numbered.
        right: Option<NodeId>,
    },
    Leaf,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Index of this node's bounding box in the global box numbering, always `id - 1`.
    pub box_idx: usize,
    pub npoints: usize,
    pub level: usize,
    pub kind: NodeKind,
}

impl Node {
    pub fn leaf(id: NodeId, npoints: usize, level: usize) -> Node {
        Node {
            id,
            box_idx: id - 1,
            npoints,
            level,
            kind: NodeKind::Leaf,
        }
    }

    /// An internal node, its left child follows it directly in preorder.
    pub fn internal(
        id: NodeId,
        split_dim: usize,
        split_value: PointType,
        npoints: usize,
        level: usize,
    ) -> Node {
        Node {
            id,
            box_idx: id - 1,
            npoints,
            level,
            kind: NodeKind::Internal {
                split_dim,
                split_value,
                left: id + 1,
                right: None,
            },
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf)
    }

    pub fn left(&self) -> Option<NodeId> {
        match self.kind {
            NodeKind::Internal { left, .. } => Some(left),
            NodeKind::Leaf => None,
        }
    }

    pub fn right(&self) -> Option<NodeId> {
        match self.kind {
            NodeKind::Internal { right, .. } => right,
            NodeKind::Leaf => None,
        }
    }

    pub fn split(&self) -> Option<(usize, PointType)> {
        match self.kind {
            NodeKind::Internal {
                split_dim,
                split_value,
                ..
            } => Some((split_dim, split_value)),
            NodeKind::Leaf => None,
        }
    }

    pub fn set_right(&mut self, id: NodeId) {
        if let NodeKind::Internal { right, .. } = &mut self.kind {
            *right = Some(id);
        }
    }

    /// Move the node, and the children it points to, `offset` places along the preorder.
    pub fn shift(&mut self, offset: usize) {
        self.id += offset;
        self.box_idx += offset;
        if let NodeKind::Internal { left, right, .. } = &mut self.kind {
            *left += offset;
            if let Some(right) = right {
                *right += offset;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_node_links() {
        let mut node = Node::internal(4, 1, 0.5, 100, 2);
        assert_eq!(node.left(), Some(5));
        assert_eq!(node.right(), None);
        assert_eq!(node.box_idx, 3);

        node.set_right(12);
        assert_eq!(node.right(), Some(12));
        assert_eq!(node.split(), Some((1, 0.5)));
    }

    #[test]
    fn test_shift() {
        let mut node = Node::internal(4, 0, 0., 10, 0);
        node.shift(10);
        assert_eq!((node.id, node.box_idx, node.left(), node.right()), (14, 13, Some(15), None));

        node.set_right(20);
        node.shift(1);
        assert_eq!(node.right(), Some(21));

        let mut leaf = Node::leaf(1, 3, 5);
        leaf.set_right(7);
        leaf.shift(2);
        assert_eq!((leaf.id, leaf.box_idx, leaf.right()), (3, 2, None));
        assert!(leaf.is_leaf());
    }
}
