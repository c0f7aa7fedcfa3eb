//! Binary packing tree.
//!
//! Every node covers a rectangle of the canvas. A leaf without an image is
//! free space; placing an image into a free leaf shrinks that leaf to the
//! padded image size and gives it two free children covering what is left:
//!
//! ```text
//!  dw <= dh               dw > dh
//!  +-----+------+         +-----+------+
//!  | img | left |         | img |      |
//!  +-----+------+         +-----+right |
//!  |   right    |         |left |      |
//!  +------------+         +-----+------+
//! ```
//!
//! Nodes live in an arena owned by the tree and refer to each other by
//! [`NodeId`]. Node 0 is the root and covers the whole canvas.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Result, TreePackError};
use crate::list::{Container, NodeRef, Payload};
use crate::model::{Image, Placement, Rect, Region};

/// Index of a node inside its [`PackTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Depth-first visiting order. Left children are always visited before right.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalOrder {
    /// Node, left, right.
    #[default]
    PreOrder,
    /// Left, node, right.
    InOrder,
    /// Left, right, node.
    PostOrder,
}

impl FromStr for TraversalOrder {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pre" | "preorder" | "pre_order" => Ok(Self::PreOrder),
            "in" | "inorder" | "in_order" => Ok(Self::InOrder),
            "post" | "postorder" | "post_order" => Ok(Self::PostOrder),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node<K = String> {
    rect: Rect,
    padding: u32,
    image: Option<Image<K>>,
    children: Option<(NodeId, NodeId)>,
}

impl<K> Node<K> {
    fn free(rect: Rect) -> Self {
        Self {
            rect,
            padding: 0,
            image: None,
            children: None,
        }
    }

    /// Canvas area covered by the node. For a placed node this is the image
    /// plus padding on every side.
    pub fn rect(&self) -> Rect {
        self.rect
    }
    pub fn padding(&self) -> u32 {
        self.padding
    }
    pub fn image(&self) -> Option<&Image<K>> {
        self.image.as_ref()
    }
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        self.children
    }
    pub fn left(&self) -> Option<NodeId> {
        self.children.map(|(left, _)| left)
    }
    pub fn right(&self) -> Option<NodeId> {
        self.children.map(|(_, right)| right)
    }
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
    /// A leaf that can still receive an image.
    pub fn is_free(&self) -> bool {
        self.children.is_none() && self.image.is_none()
    }

    pub fn to_ref(&self, id: NodeId) -> NodeRef {
        NodeRef {
            id,
            rect: self.rect,
            padding: self.padding,
            placed: self.image.is_some(),
        }
    }
}

/// Pending work of an iterative traversal.
enum Step {
    /// Expand the node into its own visit and its children.
    Enter(NodeId),
    Visit(NodeId),
}

/// Result of [`PackTree::insert`].
#[derive(Debug)]
pub enum Insertion<K = String> {
    /// The image now lives in this node.
    Placed(NodeId),
    /// No free leaf was large enough; the image is handed back and the tree
    /// is unchanged.
    Miss(Image<K>),
}

impl<K> Insertion<K> {
    pub fn is_placed(&self) -> bool {
        matches!(self, Insertion::Placed(_))
    }
    pub fn placed(&self) -> Option<NodeId> {
        match self {
            Insertion::Placed(id) => Some(*id),
            Insertion::Miss(_) => None,
        }
    }
}

/// Square canvas partitioned by binary splits.
#[derive(Debug, Clone)]
pub struct PackTree<K = String> {
    size: u32,
    nodes: Vec<Node<K>>,
    /// Placed nodes in insertion order.
    placed: Vec<NodeId>,
}

impl<K> PackTree<K> {
    pub const ROOT: NodeId = NodeId(0);

    /// Empty tree whose root is a free `size x size` leaf.
    pub fn new(size: u32) -> Result<Self> {
        Self::with_capacity(size, 0)
    }

    /// Like [`PackTree::new`], reserving room for `images` insertions up front.
    pub fn with_capacity(size: u32, images: usize) -> Result<Self> {
        if size == 0 {
            return Err(TreePackError::InvalidDimensions {
                width: size,
                height: size,
            });
        }
        let mut nodes = Vec::new();
        nodes.try_reserve(images.saturating_mul(2).saturating_add(1))?;
        let mut placed = Vec::new();
        placed.try_reserve(images)?;
        nodes.push(Node::free(Rect::new(0, 0, size, size)));
        Ok(Self {
            size,
            nodes,
            placed,
        })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn root(&self) -> &Node<K> {
        &self.nodes[Self::ROOT.0]
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<K>> {
        self.nodes.get(id.0)
    }

    /// Total node count, free and placed.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True while no image has been placed.
    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }

    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }

    /// Places `image` with `padding` pixels on each side into the first free
    /// leaf, searching depth-first and left before right.
    ///
    /// The chosen leaf keeps the padded image at its top-left corner. Its
    /// leftover width `dw` and height `dh` become two free children: when
    /// `dw <= dh` the left child is the strip beside the image and the right
    /// child spans the full width below it; otherwise the left child is the
    /// strip below the image and the right child spans the full height beside
    /// it.
    ///
    /// An allocation failure leaves the tree unchanged.
    pub fn insert(&mut self, image: Image<K>, padding: u32) -> Result<Insertion<K>> {
        let (pw, ph) = image.padded_size(padding);
        let Some(id) = self.find_leaf(pw, ph) else {
            trace!(
                width = image.width(),
                height = image.height(),
                size = self.size,
                "no free leaf"
            );
            return Ok(Insertion::Miss(image));
        };
        // a leaf held them, so they fit in u32
        let (pw, ph) = (pw as u32, ph as u32);

        self.nodes.try_reserve(2)?;
        self.placed.try_reserve(1)?;

        let leaf = self.nodes[id.0].rect;
        let dw = leaf.w - pw;
        let dh = leaf.h - ph;
        let (left, right) = if dw <= dh {
            (
                Rect::new(leaf.x + pw, leaf.y, dw, ph),
                Rect::new(leaf.x, leaf.y + ph, leaf.w, dh),
            )
        } else {
            (
                Rect::new(leaf.x, leaf.y + ph, pw, dh),
                Rect::new(leaf.x + pw, leaf.y, dw, leaf.h),
            )
        };
        let left = self.push_node(left);
        let right = self.push_node(right);

        let node = &mut self.nodes[id.0];
        node.rect = Rect::new(leaf.x, leaf.y, pw, ph);
        node.padding = padding;
        node.image = Some(image);
        node.children = Some((left, right));
        self.placed.push(id);

        trace!(node = id.0, x = leaf.x, y = leaf.y, w = pw, h = ph, "placed");
        Ok(Insertion::Placed(id))
    }

    fn push_node(&mut self, rect: Rect) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::free(rect));
        id
    }

    /// First free leaf, depth-first and left before right, that holds a
    /// `pw x ph` slot.
    fn find_leaf(&self, pw: u64, ph: u64) -> Option<NodeId> {
        let mut stack = vec![Self::ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            match node.children {
                Some((left, right)) => {
                    stack.push(right);
                    stack.push(left);
                }
                None if pw <= node.rect.w as u64 && ph <= node.rect.h as u64 => return Some(id),
                None => {}
            }
        }
        None
    }

    /// Calls `visit` once for every node, in `order`.
    pub fn traverse<'a, F>(&'a self, order: TraversalOrder, mut visit: F)
    where
        F: FnMut(NodeId, &'a Node<K>),
    {
        let mut stack = vec![Step::Enter(Self::ROOT)];
        while let Some(step) = stack.pop() {
            let id = match step {
                Step::Visit(id) => {
                    visit(id, &self.nodes[id.0]);
                    continue;
                }
                Step::Enter(id) => id,
            };
            let (left, right) = match self.nodes[id.0].children {
                Some((left, right)) => (Some(Step::Enter(left)), Some(Step::Enter(right))),
                None => (None, None),
            };
            let here = Some(Step::Visit(id));
            // pushed last to first
            let steps = match order {
                TraversalOrder::PreOrder => [right, left, here],
                TraversalOrder::InOrder => [right, here, left],
                TraversalOrder::PostOrder => [here, right, left],
            };
            stack.extend(steps.into_iter().flatten());
        }
    }

    /// One [`Payload::Node`] reference per node, in `order`. The references do
    /// not own the nodes.
    pub fn dump_to_list(&self, order: TraversalOrder) -> Container<K> {
        let mut refs = Vec::with_capacity(self.nodes.len());
        self.traverse(order, |id, node| refs.push(Payload::Node(node.to_ref(id))));
        refs.into_iter().collect()
    }

    /// Placed node ids in `order`.
    pub fn placed_ids(&self, order: TraversalOrder) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(self.placed.len());
        self.traverse(order, |id, node| {
            if node.image.is_some() {
                ids.push(id);
            }
        });
        ids
    }

    /// Borrowed placement records for every placed image, in `order`.
    pub fn placements(&self, order: TraversalOrder) -> Vec<Placement<&K>> {
        let mut out = Vec::with_capacity(self.placed.len());
        self.traverse(order, |_, node| {
            if let Some(image) = &node.image {
                out.push(placement(&image.key, node));
            }
        });
        out
    }

    /// Consumes the tree into owned placement records, in `order`.
    pub fn into_placements(mut self, order: TraversalOrder) -> Vec<Placement<K>> {
        let ids = self.placed_ids(order);
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let node = &mut self.nodes[id.0];
            if let Some(image) = node.image.take() {
                out.push(placement(image.key, node));
            }
        }
        out
    }

    /// Consumes the tree into a container of placed regions, in `order`.
    pub fn into_regions(mut self, order: TraversalOrder) -> Container<K> {
        let ids = self.placed_ids(order);
        let mut regions = Container::new();
        for id in ids {
            let node = &mut self.nodes[id.0];
            let image = node.image.take();
            regions.push_back(Payload::Region(Region {
                rect: node.rect,
                padding: node.padding,
                image,
            }));
        }
        regions
    }

    /// Tears the tree down and hands every placed image back, in the order
    /// the images were inserted.
    pub fn reclaim(mut self) -> Container<K> {
        let mut images = Container::new();
        for id in self.placed.iter().rev() {
            if let Some(image) = self.nodes[id.0].image.take() {
                images.push_front(Payload::Image(image));
            }
        }
        images
    }

    /// Releases every node together with the image it owns. Children go
    /// before their parent. Returns the number of images released.
    pub fn destroy(mut self) -> usize {
        let mut order = self.dump_to_list(TraversalOrder::PostOrder);
        let mut released = 0;
        while let Some(payload) = order.pop_front() {
            if let Payload::Node(node) = payload {
                if let Some(slot) = self.nodes.get_mut(node.id.0) {
                    released += usize::from(slot.image.take().is_some());
                }
            }
        }
        released
    }
}

fn placement<K, T>(key: T, node: &Node<K>) -> Placement<T> {
    Placement {
        key,
        x: node.rect.x,
        y: node.rect.y,
        width: node.rect.w,
        height: node.rect.h,
        padding: node.padding,
    }
}
