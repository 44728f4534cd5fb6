use std::fmt;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::interval::Interval;
use crate::node::{self, Link, Node};

/// A set of disjoint `u64` intervals stored in an AVL tree.
///
/// Adjacent intervals are fused on insertion, so the tree always holds the
/// fewest intervals covering the inserted values. A single reader/writer
/// lock guards the whole tree: queries run concurrently, insertions are
/// exclusive.
///
/// See [the crate documentation](crate) for more information.
pub struct IntervalTree {
    root: RwLock<Link>,
}

impl Default for IntervalTree {
    fn default() -> IntervalTree {
        IntervalTree {
            root: RwLock::new(None),
        }
    }
}

impl fmt::Display for IntervalTree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.root.read() {
            Some(ref root) => write!(f, "{}", root),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for IntervalTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.intervals()).finish()
    }
}

impl IntervalTree {
    /// Creates an empty tree.
    pub fn new() -> IntervalTree {
        IntervalTree::default()
    }

    /// Inserts the interval `[start, end]`, fusing it with any stored
    /// interval it is adjacent to.
    ///
    /// Fails with [`Error::InvalidInterval`] if `start > end`, and with
    /// [`Error::Overlap`] if any value in `[start, end]` is already covered.
    /// A failed insertion leaves the tree untouched.
    ///
    /// # Examples
    ///
    /// ```
    /// use disjoint_interval_tree::{Error, IntervalTree};
    ///
    /// let tree = IntervalTree::new();
    ///
    /// tree.insert(0, 1).unwrap();
    /// tree.insert(5, 15).unwrap();
    /// tree.insert(2, 3).unwrap();
    /// assert_eq!(tree.to_string(), "[0 -- 3][5 -- 15]");
    ///
    /// assert_eq!(tree.insert(4, 5), Err(Error::Overlap { value: 5 }));
    /// assert_eq!(tree.insert(9, 4), Err(Error::InvalidInterval { start: 9, end: 4 }));
    /// ```
    pub fn insert(&self, start: u64, end: u64) -> Result<()> {
        let interval = Interval::new(start, end)?;

        let mut root = self.root.write();
        if let Some(value) = node::find_overlap(&root, interval.start(), interval.end()) {
            debug!(start, end, value, "rejected overlapping interval");
            return Err(Error::Overlap { value });
        }

        trace!(start, end, "inserting interval");
        *root = Some(match root.take() {
            None => Node::leaf(start, end),
            Some(node) => node.insert(start, end),
        });
        Ok(())
    }

    /// Inserts the single value `point`.
    ///
    /// # Examples
    ///
    /// ```
    /// let tree = disjoint_interval_tree::IntervalTree::new();
    ///
    /// tree.insert_point(1).unwrap();
    /// tree.insert_point(2).unwrap();
    /// assert!(tree.contains(1));
    /// assert_eq!(tree.len(), 1);
    /// ```
    pub fn insert_point(&self, point: u64) -> Result<()> {
        self.insert(point, point)
    }

    /// A "stabbing query": returns whether `x` is covered by any interval
    /// stored in the tree.
    ///
    /// # Examples
    ///
    /// ```
    /// let tree = disjoint_interval_tree::IntervalTree::new();
    ///
    /// tree.insert(1, 10).unwrap();
    ///
    /// assert!(tree.contains(1));
    /// assert!(tree.contains(10));
    /// assert!(!tree.contains(11));
    /// ```
    pub fn contains(&self, x: u64) -> bool {
        node::containing(&self.root.read(), x).is_some()
    }

    /// Returns the smallest value not covered by the tree that is greater or
    /// equal to `x`: `x` itself when uncovered, otherwise the value right
    /// after the interval covering it. Returns `None` when that interval
    /// ends at [`u64::MAX`].
    ///
    /// Adjacent intervals are always fused, so the value following a
    /// covering interval is never covered itself.
    ///
    /// # Examples
    ///
    /// ```
    /// let tree = disjoint_interval_tree::IntervalTree::new();
    ///
    /// tree.insert(5, 9).unwrap();
    /// tree.insert(10, 20).unwrap();
    ///
    /// assert_eq!(tree.next(3), Some(3));
    /// assert_eq!(tree.next(7), Some(21));
    ///
    /// tree.insert(30, u64::MAX).unwrap();
    /// assert_eq!(tree.next(40), None);
    /// ```
    pub fn next(&self, x: u64) -> Option<u64> {
        match node::containing(&self.root.read(), x) {
            None => Some(x),
            Some(node) => node.end.checked_add(1),
        }
    }

    /// Returns the number of intervals stored in the tree, after fusion.
    pub fn len(&self) -> usize {
        self.root.read().as_ref().map_or(0, |n| n.size())
    }

    /// Returns `true` if the tree covers no value.
    pub fn is_empty(&self) -> bool {
        self.root.read().is_none()
    }

    /// Returns the inorder list of intervals stored in the tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use disjoint_interval_tree::{Interval, IntervalTree};
    ///
    /// let tree = IntervalTree::new();
    ///
    /// tree.insert(20, 30).unwrap();
    /// tree.insert(0, 10).unwrap();
    /// tree.insert(11, 12).unwrap();
    ///
    /// assert_eq!(
    ///     tree.intervals(),
    ///     vec![Interval::new(0, 12).unwrap(), Interval::new(20, 30).unwrap()]
    /// );
    /// ```
    pub fn intervals(&self) -> Vec<Interval> {
        node::Iter::new(&self.root.read())
            .map(Node::interval)
            .collect()
    }
}
