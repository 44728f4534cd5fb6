//! Implementation of a thread-safe interval tree ([`IntervalTree`]) storing disjoint, closed
//! intervals of `u64` values. Intervals inserted next to each other are fused, so the tree
//! always holds the smallest number of intervals covering the inserted values, while
//! inserting an interval that overlaps a stored one is rejected. It provides "stabbing
//! queries" (as in "is point `p` covered by any interval in the tree?"), as well as a helper
//! returning the next value not covered by the tree.
//!
//! # Implementation
//!
//! The tree is an AVL tree ordered by interval. A single insertion walks down to the
//! insertion point, fuses the new interval with its neighbours (deleting a node when two
//! stored intervals become contiguous), and rebalances every node on the way back up.
//!
//! ## Invariants
//!
//! - Every stored interval's lower bound is less than or equal to its upper bound
//! - No two stored intervals overlap or are adjacent: at least one uncovered value separates
//!   an interval from its inorder successor
//! - Every node's subtree heights differ by at most one, and its cached height is one more
//!   than the height of its tallest child
//!
//! The whole tree is guarded by a single reader/writer lock: queries share it, insertions
//! hold it exclusively.
//!
//! # Examples
//!
//! ```
//! use disjoint_interval_tree::IntervalTree;
//!
//! let tree = IntervalTree::new();
//!
//! tree.insert(25, 29).unwrap();
//! tree.insert(40, 50).unwrap();
//! tree.insert(30, 39).unwrap();
//!
//! assert_eq!(tree.len(), 1);
//! assert!(tree.contains(26));
//! assert!(!tree.contains(24));
//! assert_eq!(tree.next(26), Some(51));
//! ```

mod error;
mod interval;
/// A self-balancing tree of disjoint intervals behind a reader/writer lock.
pub mod interval_tree;
mod node;

pub use error::{Error, Result};
pub use interval::Interval;
pub use interval_tree::IntervalTree;
