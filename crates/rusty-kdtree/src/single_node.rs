//! Construction of a worker's subtree, on a single node.

use log::trace;

use crate::{
    helpers::initial_capacity,
    partition::{median_split, midpoint_split},
    types::{
        bounds::BoxTable,
        node::{Node, NodeId},
        point::{PointSet, Window},
    },
};

/// Parameters for building a subtree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildParams {
    pub leaf_size: usize,
    /// Levels up to and including this one are split at the median, deeper ones at the midpoint.
    pub median_cutoff: usize,
    /// Identifier of the subtree's root.
    pub first_id: NodeId,
    /// Level of the subtree's root.
    pub level: usize,
}

/// A subtree stored in preorder. `nodes[i]` has identifier `first_id + i` and its box in slot
/// `i` of `boxes`, until collation moves the identifiers into the global numbering.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocalTree {
    pub nodes: Vec<Node>,
    pub boxes: BoxTable,
    /// Leaf owning each point, by position in the point set.
    pub node_of_point: Vec<NodeId>,
    /// Identifier the root had when the subtree was built.
    pub first_id: NodeId,
}

struct Builder<'a> {
    points: &'a mut PointSet,
    params: BuildParams,
    tree: LocalTree,
}

impl LocalTree {
    /// Build a subtree over all of `points`, reordering them so that every node's points are
    /// contiguous.
    pub fn build(points: &mut PointSet, params: BuildParams) -> LocalTree {
        let npoints = points.len();
        let capacity = initial_capacity(npoints, params.leaf_size);

        let tree = LocalTree {
            nodes: Vec::with_capacity(capacity),
            boxes: BoxTable::with_capacity(points.dim(), capacity),
            node_of_point: vec![0; npoints],
            first_id: params.first_id,
        };

        if npoints == 0 {
            return tree;
        }

        let window = points.window();
        let mut builder = Builder {
            points,
            params,
            tree,
        };
        builder.build_recursive(window, params.level);
        builder.tree
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }
}

impl<'a> Builder<'a> {
    fn next_id(&self) -> NodeId {
        self.params.first_id + self.tree.nodes.len()
    }

    fn build_recursive(&mut self, window: Window, level: usize) {
        // Boxes are written in preorder, so slot i always belongs to nodes[i].
        let bounds = self.tree.boxes.push_window(self.points, window);

        if window.len <= self.params.leaf_size {
            self.push_leaf(window, level);
            return;
        }

        let (split_dim, _) = bounds.widest_dimension();

        let split = if level > self.params.median_cutoff {
            midpoint_split(self.points, window, split_dim, &bounds)
        } else {
            median_split(self.points, window, split_dim)
        };

        // Clustered or duplicated data, stop here instead of peeling off single points.
        if !split.is_usable(window) {
            self.push_leaf(window, level);
            return;
        }

        let index = self.tree.nodes.len();
        let id = self.next_id();
        self.tree
            .nodes
            .push(Node::internal(id, split_dim, split.value, window.len, level));

        let (left, right) = window.split_at(split.left_len);
        self.build_recursive(left, level + 1);

        let right_id = self.next_id();
        self.tree.nodes[index].set_right(right_id);
        self.build_recursive(right, level + 1);
    }

    fn push_leaf(&mut self, window: Window, level: usize) {
        let id = self.next_id();
        self.tree.nodes.push(Node::leaf(id, window.len, level));
        self.tree.node_of_point[window.range()].fill(id);
        trace!("leaf {} at level {} with {} points", id, level, window.len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use crate::helpers::uniform_points;

    fn params(leaf_size: usize) -> BuildParams {
        BuildParams {
            leaf_size,
            median_cutoff: 0,
            first_id: 1,
            level: 0,
        }
    }

    fn position(tree: &LocalTree, id: NodeId) -> usize {
        id - tree.first_id
    }

    fn subtree_size(tree: &LocalTree, id: NodeId) -> usize {
        let node = &tree.nodes[position(tree, id)];
        match (node.left(), node.right()) {
            (Some(left), Some(right)) => 1 + subtree_size(tree, left) + subtree_size(tree, right),
            _ => 1,
        }
    }

    /// Check preorder links, point counts and box containment for every internal node.
    fn assert_valid(tree: &LocalTree, points: &PointSet) {
        assert_eq!(tree.nodes.len(), tree.boxes.len());
        assert_eq!(subtree_size(tree, tree.first_id), tree.len());

        for (i, node) in tree.nodes.iter().enumerate() {
            assert_eq!(node.id, tree.first_id + i);
            assert_eq!(node.box_idx, node.id - 1);

            if let (Some(left), Some(right)) = (node.left(), node.right()) {
                assert_eq!(left, node.id + 1);
                assert_eq!(right, left + subtree_size(tree, left));

                let l = &tree.nodes[position(tree, left)];
                let r = &tree.nodes[position(tree, right)];
                assert_eq!(l.npoints + r.npoints, node.npoints);
                assert_eq!((l.level, r.level), (node.level + 1, node.level + 1));

                let parent = tree.boxes.get(i).unwrap();
                assert!(parent.contains(&tree.boxes.get(position(tree, left)).unwrap()));
                assert!(parent.contains(&tree.boxes.get(position(tree, right)).unwrap()));
            } else {
                assert!(node.is_leaf());
            }
        }

        // Every point maps to a leaf whose box holds it, and leaf counts add up
        let mut counts: HashMap<NodeId, usize> = HashMap::new();
        for (i, &id) in tree.node_of_point.iter().enumerate() {
            let node = &tree.nodes[position(tree, id)];
            assert!(node.is_leaf());
            assert!(tree
                .boxes
                .get(position(tree, id))
                .unwrap()
                .contains_point(points.point(i)));
            *counts.entry(id).or_insert(0) += 1;
        }
        for node in tree.nodes.iter().filter(|n| n.is_leaf()) {
            assert_eq!(counts.get(&node.id), Some(&node.npoints));
        }
        let total: usize = tree.nodes.iter().filter(|n| n.is_leaf()).map(|n| n.npoints).sum();
        assert_eq!(total, points.len());
    }

    #[test]
    fn test_build() {
        let mut points = uniform_points(10000, 3, 0).unwrap();
        let tree = LocalTree::build(&mut points, params(45));

        assert_valid(&tree, &points);
        assert_eq!(tree.root().unwrap().npoints, 10000);
        assert!(tree
            .nodes
            .iter()
            .filter(|n| n.is_leaf())
            .all(|n| n.npoints <= 45));
    }

    #[test]
    fn test_median_split_at_root() {
        let mut points = uniform_points(1001, 2, 1).unwrap();
        let tree = LocalTree::build(&mut points, params(10));

        let root = tree.root().unwrap();
        let left = &tree.nodes[position(&tree, root.left().unwrap())];
        assert_eq!(left.npoints, 501);
        assert_valid(&tree, &points);
    }

    #[test]
    fn test_median_split_down_to_cutoff() {
        let mut points = uniform_points(4096, 2, 2).unwrap();
        let p = BuildParams {
            leaf_size: 8,
            median_cutoff: 3,
            first_id: 1,
            level: 0,
        };
        let tree = LocalTree::build(&mut points, p);

        // Levels 0 to 3 halve the points exactly
        for node in tree.nodes.iter().filter(|n| n.level <= 4) {
            assert_eq!(node.npoints, 4096 >> node.level);
        }
        assert_valid(&tree, &points);
    }

    #[test]
    fn test_first_id_and_level() {
        let mut points = uniform_points(500, 3, 3).unwrap();
        let p = BuildParams {
            leaf_size: 20,
            median_cutoff: 2,
            first_id: 4,
            level: 2,
        };
        let tree = LocalTree::build(&mut points, p);

        let root = tree.root().unwrap();
        assert_eq!((root.id, root.box_idx, root.level), (4, 3, 2));
        assert!(tree.node_of_point.iter().all(|&id| id >= 4));
        assert_valid(&tree, &points);
    }

    #[test]
    fn test_duplicates_become_leaves() {
        let mut points = PointSet::new(2, vec![0.5; 200], (0..100).collect()).unwrap();
        let tree = LocalTree::build(&mut points, params(4));

        assert_eq!(tree.len(), 1);
        assert!(tree.nodes[0].is_leaf());
        assert_eq!(tree.nodes[0].npoints, 100);
        assert!(tree.node_of_point.iter().all(|&id| id == 1));
    }

    #[test]
    fn test_clustered_points() {
        // Two tight clusters far apart, with duplicates inside each
        let mut raw = Vec::new();
        for i in 0..60 {
            raw.push([0., (i % 3) as f64 * 1e-9]);
            raw.push([100., (i % 2) as f64]);
        }
        let mut points = PointSet::from_points(&raw).unwrap();
        let p = BuildParams {
            leaf_size: 5,
            median_cutoff: 0,
            first_id: 1,
            level: 1,
        };
        let tree = LocalTree::build(&mut points, p);
        assert_valid(&tree, &points);
    }

    #[test]
    fn test_eight_points() {
        let mut points = PointSet::from_points(&[
            [0., 0.],
            [1., 0.],
            [0., 1.],
            [1., 1.],
            [4., 0.],
            [5., 1.],
            [4., 2.],
            [5., 3.],
        ])
        .unwrap();
        let tree = LocalTree::build(&mut points, params(4));

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.nodes[0].right(), Some(3));
        assert_eq!((tree.nodes[1].npoints, tree.nodes[2].npoints), (4, 4));
        assert_valid(&tree, &points);
    }

    #[test]
    fn test_empty() {
        let mut points = PointSet::new(3, vec![], vec![]).unwrap();
        let tree = LocalTree::build(&mut points, params(4));
        assert!(tree.is_empty());
        assert!(tree.root().is_none());
    }
}
