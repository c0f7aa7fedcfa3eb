use serde::{Deserialize, Serialize};

use crate::error::{Result, TreePackError};
use crate::packer::TraversalOrder;

/// Packing configuration.
/// Key notes:
///   - canvases are always square; `initial_size` is the first side tried and
///     each failed pass moves to the next power of two
///   - `padding` is reserved on all four sides of every image
///   - `export_order` decides the order placements are flattened in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackerConfig {
    /// Side of the first canvas tried. Need not be a power of two.
    #[serde(default = "default_initial_size")]
    pub initial_size: u32,
    /// Pixels kept clear around each image.
    #[serde(default = "default_padding")]
    pub padding: u32,
    /// Largest canvas side the growth loop may reach.
    #[serde(default = "default_max_size")]
    pub max_size: u32,
    /// Tree traversal used when exporting placements.
    #[serde(default)]
    pub export_order: TraversalOrder,
    /// Draw red outlines around composited images (debug).
    #[serde(default)]
    pub texture_outlines: bool,
    /// Leave out images that cannot fit even a `max_size` canvas instead of
    /// failing the batch. Skipped keys are reported on the layout.
    #[serde(default)]
    pub ignore_large_images: bool,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            initial_size: default_initial_size(),
            padding: default_padding(),
            max_size: default_max_size(),
            export_order: TraversalOrder::default(),
            texture_outlines: false,
            ignore_large_images: false,
        }
    }
}

impl PackerConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - `initial_size` or `max_size` is zero
    /// - `initial_size` is larger than `max_size`
    /// - padding alone would fill a `max_size` canvas
    pub fn validate(&self) -> Result<()> {
        if self.initial_size == 0 || self.max_size == 0 {
            return Err(TreePackError::InvalidDimensions {
                width: self.initial_size,
                height: self.max_size,
            });
        }
        if self.initial_size > self.max_size {
            return Err(TreePackError::InvalidConfig(format!(
                "initial_size ({}) exceeds max_size ({})",
                self.initial_size, self.max_size
            )));
        }
        if 2 * self.padding as u64 >= self.max_size as u64 {
            return Err(TreePackError::InvalidConfig(format!(
                "padding ({}) * 2 leaves no room in a {}x{} canvas",
                self.padding, self.max_size, self.max_size
            )));
        }
        Ok(())
    }

    /// Create a fluent builder for `PackerConfig`.
    pub fn builder() -> PackerConfigBuilder {
        PackerConfigBuilder::new()
    }
}

fn default_initial_size() -> u32 {
    512
}
fn default_padding() -> u32 {
    1
}
fn default_max_size() -> u32 {
    16384
}

/// Builder for `PackerConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct PackerConfigBuilder {
    cfg: PackerConfig,
}

impl PackerConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: PackerConfig::default(),
        }
    }
    pub fn initial_size(mut self, v: u32) -> Self {
        self.cfg.initial_size = v;
        self
    }
    pub fn padding(mut self, v: u32) -> Self {
        self.cfg.padding = v;
        self
    }
    pub fn max_size(mut self, v: u32) -> Self {
        self.cfg.max_size = v;
        self
    }
    pub fn export_order(mut self, v: TraversalOrder) -> Self {
        self.cfg.export_order = v;
        self
    }
    pub fn outlines(mut self, v: bool) -> Self {
        self.cfg.texture_outlines = v;
        self
    }
    pub fn ignore_large_images(mut self, v: bool) -> Self {
        self.cfg.ignore_large_images = v;
        self
    }
    pub fn build(self) -> PackerConfig {
        self.cfg
    }
}
