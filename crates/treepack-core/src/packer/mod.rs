//! Binary-tree packer and the growth loop that drives it.

pub mod driver;
pub mod tree;

pub use driver::{next_canvas_size, pack, PackOutcome};
pub use tree::{Insertion, Node, NodeId, PackTree, TraversalOrder};
