//! Ordered, singly-linked container of tagged payloads.
//!
//! The container feeds images into the packer in order and carries flattened
//! results (placed regions, tree node references) back out. Insertion order is
//! the iteration order; an empty container has no head entry at all.

use std::fmt;

use bitflags::bitflags;
use tracing::debug;

use crate::model::{Image, Rect, Region};
use crate::packer::tree::NodeId;

mod sort;

/// Tag of a [`Payload`], used in diagnostics and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Image,
    Region,
    Node,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PayloadKind::Image => "image",
            PayloadKind::Region => "region",
            PayloadKind::Node => "tree node",
        })
    }
}

/// Non-owning snapshot of a packing-tree node.
///
/// Holding a `NodeRef` never keeps a node alive and releasing one never frees
/// the node; the tree owns its nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef {
    pub id: NodeId,
    pub rect: Rect,
    pub padding: u32,
    /// Whether the node held an image when the snapshot was taken.
    pub placed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload<K = String> {
    Image(Image<K>),
    Region(Region<K>),
    Node(NodeRef),
}

impl<K> Payload<K> {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Image(_) => PayloadKind::Image,
            Payload::Region(_) => PayloadKind::Region,
            Payload::Node(_) => PayloadKind::Node,
        }
    }

    /// Sort key: pixel area of whatever the payload describes.
    pub fn area(&self) -> u64 {
        match self {
            Payload::Image(image) => image.area(),
            Payload::Region(region) => region.rect.area(),
            Payload::Node(node) => node.rect.area(),
        }
    }

    /// Drops the payload and returns how many image identities went with it.
    fn release(self) -> usize {
        match self {
            Payload::Image(_) => 1,
            Payload::Region(region) => usize::from(region.image.is_some()),
            Payload::Node(_) => 0,
        }
    }
}

impl<K: fmt::Display> fmt::Display for Payload<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Image(image) => write!(
                f,
                "Image w:{:5} h:{:5} key:{}",
                image.width(),
                image.height(),
                image.key
            ),
            Payload::Region(region) => {
                write_rect(f, "Region", &region.rect)?;
                match &region.image {
                    Some(image) => write!(f, " image:{}", image.key),
                    None => f.write_str(" image:null"),
                }
            }
            Payload::Node(node) => {
                write_rect(f, "Node", &node.rect)?;
                write!(f, " id:{} placed:{}", node.id.index(), node.placed)
            }
        }
    }
}

fn write_rect(f: &mut fmt::Formatter<'_>, label: &str, r: &Rect) -> fmt::Result {
    write!(f, "{label} x:{:5} y:{:5} w:{:5} h:{:5}", r.x, r.y, r.w, r.h)
}

bitflags! {
    /// What [`Container::destroy`] releases.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct DestroyMode: u8 {
        /// Drop payloads instead of handing them back.
        const PAYLOADS = 0b01;
        /// Walk the whole chain instead of releasing only the head entry.
        const ENTRIES  = 0b10;
    }
}

/// Outcome of [`Container::destroy`].
#[derive(Debug)]
pub struct Released<K = String> {
    /// Entries unlinked from the container.
    pub entries: usize,
    /// Image identities dropped along with their payloads.
    pub images: usize,
    /// Payloads handed back because `PAYLOADS` was not set.
    pub retained: Vec<Payload<K>>,
}

impl<K> Default for Released<K> {
    fn default() -> Self {
        Self {
            entries: 0,
            images: 0,
            retained: Vec::new(),
        }
    }
}

type Link<K> = Option<Box<Entry<K>>>;

struct Entry<K> {
    payload: Payload<K>,
    next: Link<K>,
}

/// Singly-linked sequence of [`Payload`]s.
pub struct Container<K = String> {
    head: Link<K>,
}

impl<K> Container<K> {
    pub fn new() -> Self {
        Self { head: None }
    }

    pub fn from_images<I: IntoIterator<Item = Image<K>>>(images: I) -> Self {
        images.into_iter().map(Payload::Image).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Number of entries. Walks the chain.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            next: self.head.as_deref(),
        }
    }

    pub fn head(&self) -> Option<&Payload<K>> {
        self.head.as_ref().map(|entry| &entry.payload)
    }

    /// Last entry, or `None` for an empty container.
    pub fn tail(&self) -> Option<&Payload<K>> {
        self.iter().last()
    }

    /// Appends an entry or a whole chain after the current tail.
    pub fn push_back(&mut self, chain: impl Into<Container<K>>) {
        let mut chain: Container<K> = chain.into();
        let Some(first) = chain.head.take() else {
            return;
        };
        let mut cursor = &mut self.head;
        while let Some(entry) = cursor {
            cursor = &mut entry.next;
        }
        *cursor = Some(first);
    }

    /// Splices an entry or a whole chain in front of the current head.
    /// Cost is linear in the length of `chain`, not of `self`.
    pub fn push_front(&mut self, chain: impl Into<Container<K>>) {
        let mut chain: Container<K> = chain.into();
        if chain.head.is_none() {
            return;
        }
        let mut cursor = &mut chain.head;
        while let Some(entry) = cursor {
            cursor = &mut entry.next;
        }
        *cursor = self.head.take();
        self.head = chain.head.take();
    }

    pub fn pop_front(&mut self) -> Option<Payload<K>> {
        let mut entry = self.head.take()?;
        self.head = entry.next.take();
        Some(entry.payload)
    }

    /// Releases entries according to `mode`.
    ///
    /// - empty mode: nothing happens;
    /// - `PAYLOADS` alone: only the head entry is released, with its payload;
    /// - `ENTRIES` alone: every entry is released and the payloads are returned
    ///   in [`Released::retained`];
    /// - both: every entry and payload is released.
    ///
    /// Node references are never owners, so releasing one frees no tree node.
    pub fn destroy(&mut self, mode: DestroyMode) -> Released<K> {
        let mut released = Released::default();
        if mode.is_empty() {
            return released;
        }
        while let Some(payload) = self.pop_front() {
            released.entries += 1;
            if mode.contains(DestroyMode::PAYLOADS) {
                released.images += payload.release();
            } else {
                released.retained.push(payload);
            }
            if !mode.contains(DestroyMode::ENTRIES) {
                break;
            }
        }
        released
    }
}

impl<K: fmt::Display> Container<K> {
    /// Emits one `debug` event per entry.
    pub fn log_entries(&self) {
        for (index, payload) in self.iter().enumerate() {
            debug!(index, kind = %payload.kind(), "{payload}");
        }
    }
}

impl<K> Default for Container<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Drop for Container<K> {
    fn drop(&mut self) {
        let mut link = self.head.take();
        while let Some(mut entry) = link {
            link = entry.next.take();
        }
    }
}

impl<K> From<Payload<K>> for Container<K> {
    fn from(payload: Payload<K>) -> Self {
        Self {
            head: Some(Box::new(Entry {
                payload,
                next: None,
            })),
        }
    }
}

impl<K> FromIterator<Payload<K>> for Container<K> {
    fn from_iter<I: IntoIterator<Item = Payload<K>>>(iter: I) -> Self {
        let mut head: Link<K> = None;
        let mut cursor = &mut head;
        for payload in iter {
            let entry = cursor.insert(Box::new(Entry {
                payload,
                next: None,
            }));
            cursor = &mut entry.next;
        }
        Self { head }
    }
}

impl<K> Extend<Payload<K>> for Container<K> {
    fn extend<I: IntoIterator<Item = Payload<K>>>(&mut self, iter: I) {
        self.push_back(iter.into_iter().collect::<Container<K>>());
    }
}

impl<K: Clone> Clone for Container<K> {
    fn clone(&self) -> Self {
        self.iter().cloned().collect()
    }
}

impl<K: PartialEq> PartialEq for Container<K> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<K: fmt::Debug> fmt::Debug for Container<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display> fmt::Display for Container<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, payload) in self.iter().enumerate() {
            writeln!(f, "{index:4}: {payload}")?;
        }
        Ok(())
    }
}

pub struct Iter<'a, K> {
    next: Option<&'a Entry<K>>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a Payload<K>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.next?;
        self.next = entry.next.as_deref();
        Some(&entry.payload)
    }
}

impl<'a, K> IntoIterator for &'a Container<K> {
    type Item = &'a Payload<K>;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Consuming iterator; yields payloads front to back.
pub struct IntoIter<K>(Container<K>);

impl<K> Iterator for IntoIter<K> {
    type Item = Payload<K>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.pop_front()
    }
}

impl<K> IntoIterator for Container<K> {
    type Item = Payload<K>;
    type IntoIter = IntoIter<K>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter(self)
    }
}
