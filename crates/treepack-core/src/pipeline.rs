use image::{DynamicImage, GenericImageView, RgbaImage};
use tracing::instrument;

use crate::compositing::blit_rgba;
use crate::config::PackerConfig;
use crate::error::Result;
use crate::list::{Container, Payload};
use crate::model::{Image, Layout, PackStats};
use crate::packer::pack;

/// In-memory image to pack (key + decoded image).
pub struct InputImage {
    pub key: String,
    pub image: DynamicImage,
}

/// Output of a packing run: the layout and the composited square canvas.
pub struct PackOutput {
    pub layout: Layout,
    pub rgba: RgbaImage,
}

impl PackOutput {
    /// Computes packing statistics for this output.
    /// This is a convenience method that delegates to `layout.stats()`.
    pub fn stats(&self) -> PackStats {
        self.layout.stats()
    }
}

/// Packs decoded images and composites them into one RGBA canvas.
///
/// Each image is copied at its placement plus `padding` on both axes; padding
/// pixels stay transparent. Placements follow `cfg.export_order`.
#[instrument(skip_all, fields(inputs = inputs.len()))]
pub fn pack_images(inputs: Vec<InputImage>, cfg: PackerConfig) -> Result<PackOutput> {
    // pack by index so the decoded pixels stay in `inputs`
    let images = inputs
        .iter()
        .enumerate()
        .map(|(i, inp)| {
            let (w, h) = inp.image.dimensions();
            Image::new(i, w, h).map(Payload::Image)
        })
        .collect::<Result<Container<usize>>>()?;
    let layout = pack(images, &cfg)?.into_layout(cfg.export_order);

    let mut canvas = RgbaImage::new(layout.size, layout.size);
    for p in &layout.placements {
        let src = inputs[p.key].image.to_rgba8();
        let content = p.content_rect();
        blit_rgba(&src, &mut canvas, content.x, content.y, cfg.texture_outlines);
    }

    let layout = layout.map_keys(|i| inputs[i].key.clone());
    Ok(PackOutput {
        layout,
        rgba: canvas,
    })
}

/// Layout-only packing: computes placements from `(key, width, height)`
/// tuples without touching pixels.
///
/// ```
/// use treepack_core::{pack_layout, PackerConfig};
///
/// let cfg = PackerConfig::builder().initial_size(16).padding(0).build();
/// let layout = pack_layout(vec![("big", 10, 10), ("small", 5, 5)], cfg).unwrap();
/// assert_eq!(layout.size, 16);
/// assert_eq!(layout.placements.len(), 2);
/// ```
#[instrument(skip_all, fields(items = inputs.len()))]
pub fn pack_layout<K: Into<String>>(
    inputs: Vec<(K, u32, u32)>,
    cfg: PackerConfig,
) -> Result<Layout> {
    let images = inputs
        .into_iter()
        .map(|(k, w, h)| Image::new(k.into(), w, h).map(Payload::Image))
        .collect::<Result<Container>>()?;
    Ok(pack(images, &cfg)?.into_layout(cfg.export_order))
}
