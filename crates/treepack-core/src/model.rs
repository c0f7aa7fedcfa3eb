use serde::{Deserialize, Serialize};

use crate::error::{Result, TreePackError};

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the two rectangles share at least one pixel.
    /// Empty rectangles never overlap anything.
    pub fn overlaps(&self, r: &Rect) -> bool {
        if self.is_empty() || r.is_empty() {
            return false;
        }
        let (ax2, ay2) = (self.x as u64 + self.w as u64, self.y as u64 + self.h as u64);
        let (bx2, by2) = (r.x as u64 + r.w as u64, r.y as u64 + r.h as u64);
        !(self.x as u64 >= bx2 || r.x as u64 >= ax2 || self.y as u64 >= by2 || r.y as u64 >= ay2)
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

/// An image descriptor: size plus an owned identity (file path, asset name, ...).
///
/// Pixel data is not part of the descriptor; the packer only needs dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image<K = String> {
    pub key: K,
    width: u32,
    height: u32,
}

impl<K> Image<K> {
    /// Creates a descriptor. Zero width or height is rejected.
    pub fn new(key: K, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(TreePackError::InvalidDimensions { width, height });
        }
        Ok(Self { key, width, height })
    }
    pub fn width(&self) -> u32 {
        self.width
    }
    pub fn height(&self) -> u32 {
        self.height
    }
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
    /// Size of the slot this image needs once `padding` is added on every side.
    /// Computed in `u64` so oversized padding can never wrap.
    pub fn padded_size(&self, padding: u32) -> (u64, u64) {
        let p = 2 * padding as u64;
        (self.width as u64 + p, self.height as u64 + p)
    }
}

/// A rectangle in canvas space with an optional placed image.
///
/// Without an image it describes free space; with one, `rect` covers the image
/// plus `padding` on all four sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region<K = String> {
    pub rect: Rect,
    pub padding: u32,
    pub image: Option<Image<K>>,
}

impl<K> Region<K> {
    pub fn free(rect: Rect) -> Self {
        Self {
            rect,
            padding: 0,
            image: None,
        }
    }
    pub fn is_placed(&self) -> bool {
        self.image.is_some()
    }
    /// Sub-rectangle holding the image pixels (`rect` minus padding).
    pub fn content_rect(&self) -> Rect {
        inset(self.rect, self.padding)
    }
}

/// Flattened placement record: everything a compositor or manifest writer needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement<K = String> {
    pub key: K,
    /// Top-left of the padded slot.
    pub x: u32,
    pub y: u32,
    /// Padded slot size (`image + 2 * padding`).
    pub width: u32,
    pub height: u32,
    pub padding: u32,
}

impl<K> Placement<K> {
    pub fn padded_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
    /// Where the image pixels go.
    pub fn content_rect(&self) -> Rect {
        inset(self.padded_rect(), self.padding)
    }
    pub fn map_key<T>(self, f: impl FnOnce(K) -> T) -> Placement<T> {
        Placement {
            key: f(self.key),
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            padding: self.padding,
        }
    }
}

fn inset(r: Rect, padding: u32) -> Rect {
    Rect::new(
        r.x + padding,
        r.y + padding,
        r.w.saturating_sub(2 * padding),
        r.h.saturating_sub(2 * padding),
    )
}

/// Layout-level metadata (common fields used by manifest writers).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    /// Schema version of the JSON manifests. Current: "1".
    pub schema_version: String,
    pub app: String,
    pub version: String,
    pub format: String,
    pub size: u32,
    pub padding: u32,
}

impl Meta {
    pub fn new(size: u32, padding: u32) -> Self {
        Self {
            schema_version: "1".into(),
            app: "treepack".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            format: "RGBA8888".into(),
            size,
            padding,
        }
    }
}

/// Final layout of a batch: a square canvas and one placement per image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layout<K = String> {
    /// Side of the square canvas.
    pub size: u32,
    /// Number of packing passes it took to reach `size`.
    pub attempts: u32,
    pub padding: u32,
    pub placements: Vec<Placement<K>>,
    /// Images left out because they exceed `max_size` even on their own.
    #[serde(default)]
    pub skipped: Vec<K>,
    pub meta: Meta,
}

/// Statistics about packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    pub num_placements: usize,
    pub attempts: u32,
    /// `size * size`.
    pub canvas_area: u64,
    /// Sum of padded slot areas.
    pub padded_area: u64,
    /// Sum of image areas (padding excluded).
    pub content_area: u64,
    /// content_area / canvas_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl<K> Layout<K> {
    /// Computes packing statistics for this layout.
    pub fn stats(&self) -> PackStats {
        let canvas_area = self.size as u64 * self.size as u64;
        let mut padded_area = 0u64;
        let mut content_area = 0u64;
        for p in &self.placements {
            padded_area += p.padded_rect().area();
            content_area += p.content_rect().area();
        }
        let occupancy = if canvas_area > 0 {
            content_area as f64 / canvas_area as f64
        } else {
            0.0
        };
        PackStats {
            num_placements: self.placements.len(),
            attempts: self.attempts,
            canvas_area,
            padded_area,
            content_area,
            occupancy,
        }
    }

    /// Rewrites every placement key, keeping order and geometry.
    pub fn map_keys<T>(self, mut f: impl FnMut(K) -> T) -> Layout<T> {
        Layout {
            size: self.size,
            attempts: self.attempts,
            padding: self.padding,
            placements: self
                .placements
                .into_iter()
                .map(|p| p.map_key(&mut f))
                .collect(),
            skipped: self.skipped.into_iter().map(&mut f).collect(),
            meta: self.meta,
        }
    }
}

impl PackStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Placements: {}, Attempts: {}, Occupancy: {:.2}%, Canvas: {} px², Used: {} px² ({} px² with padding)",
            self.num_placements,
            self.attempts,
            self.occupancy * 100.0,
            self.canvas_area,
            self.content_area,
            self.padded_area,
        )
    }

    /// Canvas pixels not covered by any image.
    pub fn wasted_area(&self) -> u64 {
        self.canvas_area.saturating_sub(self.content_area)
    }
}
