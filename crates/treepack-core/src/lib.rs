//! Core library for packing images into a single square texture atlas.
//!
//! - Container: ordered, singly-linked list of tagged payloads with an
//!   in-place descending-area sort
//! - Packer: binary-tree packer plus a growth loop that retries on
//!   the next power-of-two canvas until the whole batch fits
//! - Pipeline: `pack_images` composites decoded images; `pack_layout` only
//!   computes placements
//! - Exporters: JSON (array and hash) and Lua manifests
//!
//! Quick example:
//! ```ignore
//! use image::ImageReader;
//! use treepack_core::{InputImage, PackerConfig, pack_images};
//! # fn main() -> anyhow::Result<()> {
//! let img1 = ImageReader::open("a.png")?.decode()?;
//! let img2 = ImageReader::open("b.png")?.decode()?;
//! let inputs = vec![
//!   InputImage { key: "a".into(), image: img1 },
//!   InputImage { key: "b".into(), image: img2 },
//! ];
//! let cfg = PackerConfig { initial_size: 256, ..Default::default() };
//! let out = pack_images(inputs, cfg)?;
//! println!("canvas: {}x{}", out.layout.size, out.layout.size);
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod export_lua;
pub mod list;
pub mod model;
pub mod packer;
pub mod pipeline;

pub use config::*;
pub use error::*;
pub use export::*;
pub use export_lua::*;
pub use list::{Container, DestroyMode, NodeRef, Payload, PayloadKind, Released};
pub use model::*;
pub use packer::*;
pub use pipeline::*;

/// Convenience prelude for common types and functions.
/// Importing `treepack_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{PackerConfig, PackerConfigBuilder};
    pub use crate::error::{Result, TreePackError};
    pub use crate::export::{ManifestFormat, ManifestWriter, writer_for};
    pub use crate::list::{Container, DestroyMode, Payload};
    pub use crate::model::{Image, Layout, Meta, PackStats, Placement, Rect, Region};
    pub use crate::packer::{Insertion, PackOutcome, PackTree, TraversalOrder, pack};
    pub use crate::{InputImage, PackOutput, pack_images, pack_layout};
}
