use std::cmp;
use std::fmt;

use tracing::trace;

use crate::interval::Interval;

pub(crate) type Link = Option<Box<Node>>;

/// A node of the AVL tree, owning the interval `[start, end]`.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Node {
    pub start: u64,
    pub end: u64,
    /// Nodes on the longest path down to a leaf, this one included.
    pub height: u8,
    pub left: Link,
    pub right: Link,
}

/// Outcome of a join probe: the bound the caller should adopt, and the
/// probed subtree with the joined node (if any) detached.
pub(crate) struct Joined {
    pub bound: u64,
    pub subtree: Link,
}

/// Whether an interval ending at `end` is immediately followed by one
/// starting at `start`.
fn is_adjacent(end: u64, start: u64) -> bool {
    end.checked_add(1) == Some(start)
}

pub(crate) fn height(link: &Link) -> u8 {
    link.as_ref().map_or(0, |n| n.height)
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(ref left) = self.left {
            write!(f, "{}", left)?;
        }
        write!(f, "{}", self.interval())?;
        if let Some(ref right) = self.right {
            write!(f, "{}", right)?;
        }
        Ok(())
    }
}

impl Node {
    pub fn leaf(start: u64, end: u64) -> Box<Node> {
        Box::new(Node {
            start,
            end,
            height: 1,
            left: None,
            right: None,
        })
    }

    pub fn interval(&self) -> Interval {
        Interval::from_ordered(self.start, self.end)
    }

    pub fn size(&self) -> usize {
        1 + self.left.as_ref().map_or(0, |n| n.size())
            + self.right.as_ref().map_or(0, |n| n.size())
    }

    fn balance_factor(&self) -> i8 {
        height(&self.left) as i8 - height(&self.right) as i8
    }

    fn update_height(&mut self) {
        self.height = cmp::max(height(&self.left), height(&self.right)) + 1;
    }

    /// Inserts `[start, end]` below this node, fusing it with adjacent
    /// intervals, and returns the rebalanced subtree.
    ///
    /// The interval must not overlap anything stored in the subtree; callers
    /// check this with [`find_overlap`] first, which keeps this descent free
    /// of failure paths.
    pub fn insert(mut self: Box<Self>, start: u64, end: u64) -> Box<Node> {
        if end < self.start {
            if is_adjacent(end, self.start) {
                self.start = match self.left.take() {
                    None => {
                        trace!(start, end = self.end, "widened interval downwards");
                        start
                    }
                    Some(left) if is_adjacent(left.end, start) => {
                        debug_assert!(left.right.is_none(), "absorbed child has a greater sibling");
                        trace!(start = left.start, end = self.end, "absorbed left child");
                        let Node {
                            start: absorbed,
                            left: rest,
                            ..
                        } = *left;
                        self.left = rest;
                        absorbed
                    }
                    Some(left) => {
                        let joined = left.join_greatest(start);
                        self.left = joined.subtree;
                        joined.bound
                    }
                };
            } else {
                self.left = Some(match self.left.take() {
                    None => Node::leaf(start, end),
                    Some(left) => left.insert(start, end),
                });
            }
        } else {
            debug_assert!(start > self.end, "overlapping interval reached the insertion engine");
            if is_adjacent(self.end, start) {
                self.end = match self.right.take() {
                    None => {
                        trace!(start = self.start, end, "widened interval upwards");
                        end
                    }
                    Some(right) if is_adjacent(end, right.start) => {
                        debug_assert!(right.left.is_none(), "absorbed child has a lesser sibling");
                        trace!(start = self.start, end = right.end, "absorbed right child");
                        let Node {
                            end: absorbed,
                            right: rest,
                            ..
                        } = *right;
                        self.right = rest;
                        absorbed
                    }
                    Some(right) => {
                        let joined = right.join_least(end);
                        self.right = joined.subtree;
                        joined.bound
                    }
                };
            } else {
                self.right = Some(match self.right.take() {
                    None => Node::leaf(start, end),
                    Some(right) => right.insert(start, end),
                });
            }
        }

        rebalance(self)
    }

    /// Walks the right spine looking for the greatest interval. If it ends
    /// right before `start` it is detached and its lower bound returned,
    /// otherwise `start` comes back unchanged.
    fn join_greatest(mut self: Box<Self>, start: u64) -> Joined {
        debug_assert!(self.end < start);
        match self.right.take() {
            None if is_adjacent(self.end, start) => {
                trace!(start = self.start, end = self.end, "joined greatest descendant");
                Joined {
                    bound: self.start,
                    subtree: self.left.take(),
                }
            }
            None => Joined {
                bound: start,
                subtree: Some(self),
            },
            Some(right) => {
                let joined = right.join_greatest(start);
                self.right = joined.subtree;
                Joined {
                    bound: joined.bound,
                    subtree: Some(rebalance(self)),
                }
            }
        }
    }

    /// Mirror of [`Node::join_greatest`] along the left spine, returning the
    /// upper bound of a least interval starting right after `end`.
    fn join_least(mut self: Box<Self>, end: u64) -> Joined {
        debug_assert!(end < self.start);
        match self.left.take() {
            None if is_adjacent(end, self.start) => {
                trace!(start = self.start, end = self.end, "joined least descendant");
                Joined {
                    bound: self.end,
                    subtree: self.right.take(),
                }
            }
            None => Joined {
                bound: end,
                subtree: Some(self),
            },
            Some(left) => {
                let joined = left.join_least(end);
                self.left = joined.subtree;
                Joined {
                    bound: joined.bound,
                    subtree: Some(rebalance(self)),
                }
            }
        }
    }
}

/// Promotes the left child into the place of `node`.
fn rotate_right(mut node: Box<Node>) -> Box<Node> {
    let Some(mut pivot) = node.left.take() else {
        return node;
    };
    node.left = pivot.right.take();
    node.update_height();
    pivot.right = Some(node);
    pivot.update_height();
    pivot
}

/// Promotes the right child into the place of `node`.
fn rotate_left(mut node: Box<Node>) -> Box<Node> {
    let Some(mut pivot) = node.right.take() else {
        return node;
    };
    node.right = pivot.left.take();
    node.update_height();
    pivot.left = Some(node);
    pivot.update_height();
    pivot
}

/// Restores the AVL invariant at `node`, assuming both children already
/// satisfy it, and returns the new subtree root.
pub(crate) fn rebalance(mut node: Box<Node>) -> Box<Node> {
    node.update_height();
    match node.balance_factor() {
        bf if bf > 1 => {
            if node.left.as_ref().is_some_and(|l| l.balance_factor() < 0) {
                node.left = node.left.take().map(rotate_left);
            }
            rotate_right(node)
        }
        bf if bf < -1 => {
            if node.right.as_ref().is_some_and(|r| r.balance_factor() > 0) {
                node.right = node.right.take().map(rotate_right);
            }
            rotate_left(node)
        }
        _ => node,
    }
}

/// Returns the node whose interval contains `x`.
pub(crate) fn containing(link: &Link, x: u64) -> Option<&Node> {
    let mut curr = link.as_deref();
    while let Some(node) = curr {
        if x < node.start {
            curr = node.left.as_deref();
        } else if x > node.end {
            curr = node.right.as_deref();
        } else {
            return Some(node);
        }
    }
    None
}

/// Looks for a stored interval intersecting `[start, end]` and returns the
/// boundary value in conflict: the stored lower bound if it falls inside the
/// new interval, `start` otherwise.
pub(crate) fn find_overlap(link: &Link, start: u64, end: u64) -> Option<u64> {
    let mut curr = link.as_deref();
    while let Some(node) = curr {
        if end < node.start {
            curr = node.left.as_deref();
        } else if start > node.end {
            curr = node.right.as_deref();
        } else if start < node.start {
            return Some(node.start);
        } else {
            return Some(start);
        }
    }
    None
}

/// An inorder iterator through the nodes of a subtree.
pub(crate) struct Iter<'a> {
    to_visit: Vec<&'a Node>,
    curr: Option<&'a Node>,
}

impl<'a> Iter<'a> {
    pub fn new(link: &'a Link) -> Iter<'a> {
        Iter {
            to_visit: vec![],
            curr: link.as_deref(),
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.curr {
            self.to_visit.push(node);
            self.curr = node.left.as_deref();
        }

        let visited = self.to_visit.pop()?;
        self.curr = visited.right.as_deref();
        Some(visited)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Checks ordering and minimality (a gap of at least one uncovered value
    /// between in-order neighbours), AVL balance and cached heights.
    pub(crate) fn check_invariants(link: &Link) {
        fn check_node(node: &Node) -> u8 {
            assert!(node.start <= node.end, "invalid interval in {:?}", node.interval());
            let left = node.left.as_deref().map_or(0, check_node);
            let right = node.right.as_deref().map_or(0, check_node);
            assert_eq!(
                node.height,
                cmp::max(left, right) + 1,
                "wrong height at {}",
                node.interval()
            );
            assert!(
                (left as i8 - right as i8).abs() <= 1,
                "unbalanced at {}: left {} right {}",
                node.interval(),
                left,
                right
            );
            node.height
        }

        if let Some(ref root) = link {
            check_node(root);
        }

        let nodes: Vec<_> = Iter::new(link).collect();
        for pair in nodes.windows(2) {
            assert!(
                pair[0].end.checked_add(1).is_some_and(|next| next < pair[1].start),
                "{} and {} are out of order, overlapping or adjacent",
                pair[0].interval(),
                pair[1].interval()
            );
        }
    }

    fn insert(link: Link, start: u64, end: u64) -> Link {
        assert_eq!(find_overlap(&link, start, end), None);
        Some(match link {
            None => Node::leaf(start, end),
            Some(root) => root.insert(start, end),
        })
    }

    fn bounds(link: &Link) -> Vec<(u64, u64)> {
        Iter::new(link).map(|n| (n.start, n.end)).collect()
    }

    fn root(link: &Link) -> (u64, u64) {
        let node = link.as_deref().unwrap();
        (node.start, node.end)
    }

    #[test]
    fn leaf_has_height_one() {
        let leaf = Node::leaf(3, 4);
        assert_eq!(leaf.height, 1);
        assert_eq!(height(&None), 0);
        assert_eq!(leaf.balance_factor(), 0);
    }

    #[test]
    fn rotations_only_relink() {
        let mut node = Node::leaf(10, 10);
        node.left = Some(Node::leaf(5, 5));
        node.update_height();

        let rotated = rotate_right(node);
        assert_eq!((rotated.start, rotated.end), (5, 5));
        assert_eq!(rotated.height, 2);
        assert_eq!(rotated.right.as_ref().unwrap().start, 10);
        assert_eq!(rotated.right.as_ref().unwrap().height, 1);

        let back = rotate_left(rotated);
        assert_eq!(back.start, 10);
        assert_eq!(back.left.as_ref().unwrap().start, 5);
        assert!(back.right.is_none());
    }

    #[test]
    fn rotation_without_pivot_is_identity() {
        let leaf = Node::leaf(1, 2);
        assert_eq!(rotate_left(rotate_right(leaf.clone())), leaf);
    }

    #[test]
    fn single_rotations() {
        // Ascending inserts force left rotations at the root.
        let mut tree = None;
        for i in 0..3 {
            tree = insert(tree, i * 10, i * 10 + 1);
        }
        check_invariants(&tree);
        assert_eq!(root(&tree), (10, 11));

        // Descending inserts force right rotations.
        let mut tree = None;
        for i in (0..3).rev() {
            tree = insert(tree, i * 10, i * 10 + 1);
        }
        check_invariants(&tree);
        assert_eq!(root(&tree), (10, 11));
    }

    #[test]
    fn double_rotations() {
        // Left-right case.
        let mut tree = None;
        for (start, end) in [(30, 31), (10, 11), (20, 21)] {
            tree = insert(tree, start, end);
        }
        check_invariants(&tree);
        assert_eq!(root(&tree), (20, 21));

        // Right-left case.
        let mut tree = None;
        for (start, end) in [(10, 11), (30, 31), (20, 21)] {
            tree = insert(tree, start, end);
        }
        check_invariants(&tree);
        assert_eq!(root(&tree), (20, 21));
    }

    #[test]
    fn widens_leaf_bounds() {
        let mut tree = insert(None, 10, 20);
        tree = insert(tree, 5, 9);
        tree = insert(tree, 21, 30);
        check_invariants(&tree);
        assert_eq!(bounds(&tree), vec![(5, 30)]);
        assert_eq!(root(&tree), (5, 30));
    }

    #[test]
    fn absorbs_adjacent_children() {
        let mut tree = None;
        for (start, end) in [(10, 20), (0, 5), (30, 40)] {
            tree = insert(tree, start, end);
        }
        // Fills the gap between the root and its left child.
        tree = insert(tree, 6, 9);
        check_invariants(&tree);
        assert_eq!(bounds(&tree), vec![(0, 20), (30, 40)]);

        // Fills the gap between the root and its right child.
        tree = insert(tree, 21, 29);
        check_invariants(&tree);
        assert_eq!(bounds(&tree), vec![(0, 40)]);
        assert_eq!(tree.as_ref().unwrap().size(), 1);
    }

    #[test]
    fn join_greatest_detaches_rightmost() {
        let mut tree = None;
        for (start, end) in [(100, 110), (50, 60), (200, 210), (20, 30), (70, 80)] {
            tree = insert(tree, start, end);
        }
        check_invariants(&tree);

        // Adjacent to the root, and to the rightmost node of its left subtree.
        tree = insert(tree, 81, 99);
        check_invariants(&tree);
        assert_eq!(bounds(&tree), vec![(20, 30), (50, 60), (70, 110), (200, 210)]);
    }

    #[test]
    fn join_greatest_without_match_keeps_probe_value() {
        let left = {
            let mut node = Node::leaf(10, 10);
            node.right = Some(Node::leaf(20, 20));
            node.update_height();
            node
        };
        let joined = left.join_greatest(30);
        assert_eq!(joined.bound, 30);
        assert_eq!(bounds(&joined.subtree), vec![(10, 10), (20, 20)]);

        let left = {
            let mut node = Node::leaf(10, 10);
            node.right = Some(Node::leaf(20, 29));
            node.update_height();
            node
        };
        let joined = left.join_greatest(30);
        assert_eq!(joined.bound, 20);
        assert_eq!(bounds(&joined.subtree), vec![(10, 10)]);
        assert_eq!(height(&joined.subtree), 1);
    }

    #[test]
    fn join_least_detaches_leftmost() {
        let mut tree = None;
        for (start, end) in [(100, 110), (50, 60), (200, 210), (150, 160), (250, 260)] {
            tree = insert(tree, start, end);
        }
        check_invariants(&tree);

        tree = insert(tree, 111, 149);
        check_invariants(&tree);
        assert_eq!(bounds(&tree), vec![(50, 60), (100, 160), (200, 210), (250, 260)]);
    }

    #[test]
    fn join_rebalances_spine() {
        // A left subtree whose right spine loses its deepest node has to be
        // rebalanced on the way up.
        let mut tree = None;
        for i in 0..32 {
            tree = insert(tree, i * 4, i * 4 + 1);
        }
        check_invariants(&tree);
        for i in 0..31 {
            tree = insert(tree, i * 4 + 2, i * 4 + 3);
            check_invariants(&tree);
        }
        assert_eq!(bounds(&tree), vec![(0, 125)]);
    }

    #[test]
    fn bounds_at_domain_edges() {
        let mut tree = insert(None, u64::MAX, u64::MAX);
        tree = insert(tree, 0, 0);
        tree = insert(tree, u64::MAX - 5, u64::MAX - 1);
        tree = insert(tree, 1, u64::MAX - 7);
        check_invariants(&tree);
        assert_eq!(bounds(&tree), vec![(0, u64::MAX - 7), (u64::MAX - 5, u64::MAX)]);
        tree = insert(tree, u64::MAX - 6, u64::MAX - 6);
        check_invariants(&tree);
        assert_eq!(bounds(&tree), vec![(0, u64::MAX)]);
    }

    #[test]
    fn overlap_boundaries() {
        let tree = insert(None, 10, 20);
        assert_eq!(find_overlap(&tree, 5, 10), Some(10));
        assert_eq!(find_overlap(&tree, 5, 30), Some(10));
        assert_eq!(find_overlap(&tree, 15, 30), Some(15));
        assert_eq!(find_overlap(&tree, 20, 20), Some(20));
        assert_eq!(find_overlap(&tree, 0, 9), None);
        assert_eq!(find_overlap(&tree, 21, 21), None);
    }

    #[test]
    fn containing_finds_covering_node() {
        let mut tree = None;
        for (start, end) in [(10, 20), (30, 40), (50, 60)] {
            tree = insert(tree, start, end);
        }
        assert_eq!(containing(&tree, 35).map(Node::interval), Interval::new(30, 40).ok());
        assert!(containing(&tree, 25).is_none());
        assert!(containing(&None, 25).is_none());
    }

    #[test]
    fn display_is_inorder() {
        let mut tree = None;
        for (start, end) in [(10, 20), (30, 40), (0, 1)] {
            tree = insert(tree, start, end);
        }
        assert_eq!(
            tree.unwrap().to_string(),
            "[0 -- 1][10 -- 20][30 -- 40]"
        );
    }
}
