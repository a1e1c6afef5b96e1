//! Parent-pointer hierarchies
//!
//! Categories, pages and comments form forests through a nullable
//! `parent_id`. The hierarchy is kept as an explicit adjacency map and every
//! walk below uses a work stack or a cursor, never recursion, so a corrupt
//! parent chain cannot blow the stack.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A record that sits in a parent-pointer tree
pub trait TreeItem {
    fn node_id(&self) -> i64;
    fn parent_node_id(&self) -> Option<i64>;
}

/// Adjacency map `id -> parent_id`
#[derive(Debug, Clone, Default)]
pub struct ParentMap {
    parents: HashMap<i64, Option<i64>>,
}

impl ParentMap {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (i64, Option<i64>)>) -> Self {
        Self {
            parents: pairs.into_iter().collect(),
        }
    }

    fn parent_of(&self, id: i64) -> Option<i64> {
        self.parents.get(&id).copied().flatten()
    }

    /// Ancestors of `id`, nearest first. Stops if the chain loops.
    pub fn ancestors(&self, id: i64) -> Vec<i64> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut cursor = self.parent_of(id);
        while let Some(current) = cursor {
            if !seen.insert(current) {
                break;
            }
            out.push(current);
            cursor = self.parent_of(current);
        }
        out
    }

    /// Would re-parenting `id` under `new_parent` close a loop?
    ///
    /// True when `new_parent` is `id` itself or any node whose ancestor chain
    /// passes through `id`.
    pub fn would_create_cycle(&self, id: i64, new_parent: i64) -> bool {
        new_parent == id || self.ancestors(new_parent).contains(&id)
    }
}

/// A node with its nested children, rendered with the item's own fields
/// flattened next to `children`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreeNode<T> {
    #[serde(flatten)]
    pub item: T,
    pub children: Vec<TreeNode<T>>,
}

impl<T> TreeNode<T> {
    /// Count of this node and every node below it
    pub fn total_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Convert every item in the subtree, keeping its shape
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> TreeNode<U> {
        // Pre-order flatten, remembering how many children each node had
        let mut flat: Vec<(T, usize)> = Vec::new();
        let mut stack = vec![self];
        while let Some(TreeNode { item, children }) = stack.pop() {
            flat.push((item, children.len()));
            stack.extend(children.into_iter().rev());
        }

        // Rebuild bottom-up; each node's children sit on top of `built`
        let mut built: Vec<TreeNode<U>> = Vec::new();
        for (item, child_count) in flat.into_iter().rev() {
            let mut children = built.split_off(built.len() - child_count);
            children.reverse();
            built.push(TreeNode {
                item: f(item),
                children,
            });
        }

        // The root came first in pre-order, so it is the only node left
        built.remove(0)
    }
}

/// Build a forest from a flat list.
///
/// Sibling order follows the input order. Items whose parent is not in the
/// list are treated as roots.
pub fn build_forest<T: TreeItem>(items: Vec<T>) -> Vec<TreeNode<T>> {
    let known: HashSet<i64> = items.iter().map(|i| i.node_id()).collect();

    let mut roots = Vec::new();
    let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
    for item in &items {
        match item.parent_node_id() {
            Some(parent) if known.contains(&parent) && parent != item.node_id() => {
                children.entry(parent).or_default().push(item.node_id());
            }
            _ => roots.push(item.node_id()),
        }
    }

    // Pre-order walk from the roots; nodes caught in a stored loop are never reached
    let mut order = Vec::with_capacity(items.len());
    let mut stack: Vec<i64> = roots.iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        order.push(id);
        if let Some(kids) = children.get(&id) {
            stack.extend(kids.iter().rev());
        }
    }

    let mut by_id: HashMap<i64, T> = items.into_iter().map(|i| (i.node_id(), i)).collect();
    let mut built: HashMap<i64, TreeNode<T>> = HashMap::new();

    // Reverse pre-order visits every child before its parent
    for id in order.iter().rev() {
        let Some(item) = by_id.remove(id) else {
            continue;
        };
        let kids = children
            .get(id)
            .map(|ids| ids.iter().filter_map(|c| built.remove(c)).collect())
            .unwrap_or_default();
        built.insert(*id, TreeNode { item, children: kids });
    }

    roots.iter().filter_map(|id| built.remove(id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Node {
        id: i64,
        parent_id: Option<i64>,
    }

    impl TreeItem for Node {
        fn node_id(&self) -> i64 {
            self.id
        }
        fn parent_node_id(&self) -> Option<i64> {
            self.parent_id
        }
    }

    fn node(id: i64, parent_id: Option<i64>) -> Node {
        Node { id, parent_id }
    }

    fn sample_map() -> ParentMap {
        // 1
        // ├── 2
        // │   └── 4
        // └── 3
        // 5
        ParentMap::from_pairs([(1, None), (2, Some(1)), (3, Some(1)), (4, Some(2)), (5, None)])
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let map = sample_map();
        assert_eq!(map.ancestors(4), vec![2, 1]);
        assert!(map.ancestors(1).is_empty());
    }

    #[test]
    fn test_would_create_cycle() {
        let map = sample_map();
        assert!(map.would_create_cycle(1, 1));
        assert!(map.would_create_cycle(1, 4));
        assert!(map.would_create_cycle(2, 4));
        assert!(!map.would_create_cycle(4, 3));
        assert!(!map.would_create_cycle(1, 5));
    }

    #[test]
    fn test_ancestors_stops_on_stored_loop() {
        let map = ParentMap::from_pairs([(1, Some(2)), (2, Some(1))]);
        assert_eq!(map.ancestors(1), vec![2]);
    }

    #[test]
    fn test_build_forest_shape() {
        let forest = build_forest(vec![
            node(1, None),
            node(2, Some(1)),
            node(3, Some(1)),
            node(4, Some(2)),
            node(5, None),
        ]);

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].item.id, 1);
        assert_eq!(forest[0].total_count(), 4);
        assert_eq!(forest[0].children[0].item.id, 2);
        assert_eq!(forest[0].children[0].children[0].item.id, 4);
        assert_eq!(forest[0].children[1].item.id, 3);
        assert_eq!(forest[1].item.id, 5);
    }

    #[test]
    fn test_build_forest_orphans_become_roots() {
        let forest = build_forest(vec![node(10, Some(99)), node(11, Some(10))]);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].item.id, 10);
        assert_eq!(forest[0].children.len(), 1);
    }

    #[test]
    fn test_build_forest_keeps_input_order() {
        let forest = build_forest(vec![node(1, None), node(9, Some(1)), node(3, Some(1))]);
        let ids: Vec<i64> = forest[0].children.iter().map(|c| c.item.id).collect();
        assert_eq!(ids, vec![9, 3]);
    }

    #[test]
    fn test_map_preserves_shape() {
        let forest = build_forest(vec![
            node(1, None),
            node(2, Some(1)),
            node(3, Some(2)),
            node(4, Some(1)),
        ]);
        let mapped = forest.into_iter().next().unwrap().map(|n| n.id * 10);

        assert_eq!(mapped.item, 10);
        assert_eq!(mapped.children[0].item, 20);
        assert_eq!(mapped.children[0].children[0].item, 30);
        assert_eq!(mapped.children[1].item, 40);
        assert_eq!(mapped.total_count(), 4);
    }

    #[test]
    fn test_tree_node_serializes_flat() {
        let tree = TreeNode {
            item: node(1, None),
            children: Vec::new(),
        };
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["id"], 1);
        assert!(json["children"].as_array().unwrap().is_empty());
    }
}
