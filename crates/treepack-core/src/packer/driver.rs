//! Growth loop: pack the whole batch into one canvas, and when something does
//! not fit, throw the tree away and start over on a bigger canvas.

use tracing::{debug, instrument};

use super::tree::{Insertion, PackTree, TraversalOrder};
use crate::config::PackerConfig;
use crate::error::{Result, TreePackError};
use crate::list::{Container, Payload};
use crate::model::{Image, Layout, Meta, Placement};

/// A successful packing: every image of the batch lives in `tree`.
#[derive(Debug)]
pub struct PackOutcome<K = String> {
    /// Side of the square canvas that held the batch.
    pub size: u32,
    /// Passes run, the successful one included.
    pub attempts: u32,
    pub padding: u32,
    pub tree: PackTree<K>,
    /// Keys of images left out for exceeding `max_size`, largest first. Only
    /// ever filled when `ignore_large_images` is set.
    pub skipped: Vec<K>,
}

impl<K> PackOutcome<K> {
    pub fn placements(&self, order: TraversalOrder) -> Vec<Placement<&K>> {
        self.tree.placements(order)
    }

    pub fn into_placements(self, order: TraversalOrder) -> Vec<Placement<K>> {
        self.tree.into_placements(order)
    }

    pub fn into_regions(self, order: TraversalOrder) -> Container<K> {
        self.tree.into_regions(order)
    }

    pub fn into_layout(self, order: TraversalOrder) -> Layout<K> {
        let (size, attempts, padding) = (self.size, self.attempts, self.padding);
        Layout {
            size,
            attempts,
            padding,
            placements: self.tree.into_placements(order),
            skipped: self.skipped,
            meta: Meta::new(size, padding),
        }
    }
}

/// Next canvas side after a failed pass: the smallest power of two strictly
/// greater than `size`. `None` past `u32`.
pub fn next_canvas_size(size: u32) -> Option<u32> {
    size.checked_add(1)?.checked_next_power_of_two()
}

/// Packs `images` into the smallest power-of-two canvas reachable from
/// `cfg.initial_size`.
///
/// The batch is sorted by area, largest first, then inserted in that order.
/// A pass stops at the first image that finds no room; its placed images are
/// taken back out of the tree and the next pass runs on a canvas of
/// [`next_canvas_size`]. Fails with [`TreePackError::SizingFailure`] once that
/// would exceed `cfg.max_size`.
///
/// An image too large for `cfg.max_size` fails the batch before any pass, or
/// is dropped and reported in [`PackOutcome::skipped`] with
/// `cfg.ignore_large_images`.
#[instrument(skip_all, fields(images = images.len(), initial_size = cfg.initial_size, padding = cfg.padding))]
pub fn pack<K>(mut images: Container<K>, cfg: &PackerConfig) -> Result<PackOutcome<K>> {
    cfg.validate()?;
    images.sort()?;
    let (mut images, skipped) = check_max_size(images, cfg)?;
    let total = images.len();

    let mut size = cfg.initial_size;
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let mut tree = PackTree::with_capacity(size, total)?;
        match run_pass(&mut tree, &mut images, cfg.padding)? {
            None => {
                debug!(size, attempts, placed = tree.placed_count(), "pass complete");
                return Ok(PackOutcome {
                    size,
                    attempts,
                    padding: cfg.padding,
                    tree,
                    skipped,
                });
            }
            Some(missed) => {
                debug!(
                    size,
                    attempts,
                    placed = tree.placed_count(),
                    total,
                    "pass aborted"
                );
                // placed images, then the miss, then the untried rest
                images.push_front(Payload::Image(missed));
                images.push_front(tree.reclaim());
                size = match next_canvas_size(size) {
                    Some(next) if next <= cfg.max_size => next,
                    _ => {
                        return Err(TreePackError::SizingFailure {
                            size,
                            max_size: cfg.max_size,
                        });
                    }
                };
            }
        }
    }
}

/// Inserts images front to back until one misses. Returns the missed image.
fn run_pass<K>(
    tree: &mut PackTree<K>,
    images: &mut Container<K>,
    padding: u32,
) -> Result<Option<Image<K>>> {
    let mut index = 0;
    while let Some(payload) = images.pop_front() {
        let image = match payload {
            Payload::Image(image) => image,
            other => {
                return Err(TreePackError::UnsortablePayload {
                    index,
                    kind: other.kind(),
                });
            }
        };
        if let Insertion::Miss(image) = tree.insert(image, padding)? {
            return Ok(Some(image));
        }
        index += 1;
    }
    Ok(None)
}

/// An image wider or taller than `max_size` once padded can never be placed.
/// Such images either fail the batch before any pass or, when
/// `cfg.ignore_large_images` is set, are taken out and their keys returned.
fn check_max_size<K>(
    images: Container<K>,
    cfg: &PackerConfig,
) -> Result<(Container<K>, Vec<K>)> {
    let max = cfg.max_size as u64;
    let fits = |image: &Image<K>| {
        let (w, h) = image.padded_size(cfg.padding);
        w <= max && h <= max
    };
    let all_fit = images.iter().all(|payload| match payload {
        Payload::Image(image) => fits(image),
        _ => true,
    });
    if all_fit {
        return Ok((images, Vec::new()));
    }
    if !cfg.ignore_large_images {
        return Err(TreePackError::SizingFailure {
            size: cfg.initial_size,
            max_size: cfg.max_size,
        });
    }

    let mut skipped = Vec::new();
    let kept: Container<K> = images
        .into_iter()
        .filter_map(|payload| match payload {
            Payload::Image(image) if !fits(&image) => {
                debug!(
                    width = image.width(),
                    height = image.height(),
                    max_size = cfg.max_size,
                    "ignoring oversized image"
                );
                skipped.push(image.key);
                None
            }
            other => Some(other),
        })
        .collect();
    Ok((kept, skipped))
}
