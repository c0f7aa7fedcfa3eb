use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{Result, TreePackError};
use crate::export_lua::to_lua_table;
use crate::model::{Layout, Placement};

fn frame_value<K>(p: &Placement<K>) -> Value {
    let content = p.content_rect();
    json!({
        "frame": {"x": content.x, "y": content.y, "w": content.w, "h": content.h},
        "slot": {"x": p.x, "y": p.y, "w": p.width, "h": p.height},
        "padding": p.padding,
    })
}

/// Serialize the layout as `{ size, attempts, frames: [...], meta }`, frames in
/// layout order. `frame` is where the image pixels are; `slot` includes padding.
pub fn to_json_array<K: ToString>(layout: &Layout<K>) -> Value {
    let frames = layout
        .placements
        .iter()
        .map(|p| {
            let mut v = frame_value(p);
            v["key"] = Value::String(p.key.to_string());
            v
        })
        .collect::<Vec<_>>();
    json!({
        "size": layout.size,
        "attempts": layout.attempts,
        "frames": frames,
        "meta": &layout.meta,
    })
}

/// Frames keyed by name: `{ frames: { name: { frame, slot, padding } }, meta }`.
/// A repeated key keeps its last placement.
pub fn to_json_hash<K: ToString>(layout: &Layout<K>) -> Value {
    let mut frames = serde_json::Map::new();
    for p in &layout.placements {
        frames.insert(p.key.to_string(), frame_value(p));
    }
    json!({ "frames": frames, "meta": &layout.meta })
}

/// Manifest flavours the writers can produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManifestFormat {
    #[default]
    Json,
    JsonHash,
    Lua,
}

impl FromStr for ManifestFormat {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" | "json-array" => Ok(Self::Json),
            "json-hash" | "hash" => Ok(Self::JsonHash),
            "lua" => Ok(Self::Lua),
            _ => Err(()),
        }
    }
}

/// Renders a [`Layout`] into the text of one manifest file.
pub trait ManifestWriter {
    /// File extension without the dot.
    fn extension(&self) -> &str;
    /// `texture` is the file name of the composited canvas, as the manifest
    /// should refer to it.
    fn render(&self, layout: &Layout, texture: &str) -> Result<String>;
}

struct JsonArrayWriter;
struct JsonHashWriter;
struct LuaWriter;

fn pretty(mut value: Value, texture: &str) -> Result<String> {
    value["meta"]["image"] = Value::String(texture.to_string());
    serde_json::to_string_pretty(&value).map_err(|e| TreePackError::Encode(e.to_string()))
}

impl ManifestWriter for JsonArrayWriter {
    fn extension(&self) -> &str {
        "json"
    }
    fn render(&self, layout: &Layout, texture: &str) -> Result<String> {
        pretty(to_json_array(layout), texture)
    }
}

impl ManifestWriter for JsonHashWriter {
    fn extension(&self) -> &str {
        "json"
    }
    fn render(&self, layout: &Layout, texture: &str) -> Result<String> {
        pretty(to_json_hash(layout), texture)
    }
}

impl ManifestWriter for LuaWriter {
    fn extension(&self) -> &str {
        "lua"
    }
    fn render(&self, layout: &Layout, texture: &str) -> Result<String> {
        Ok(to_lua_table(layout, texture))
    }
}

pub fn writer_for(format: ManifestFormat) -> Box<dyn ManifestWriter> {
    match format {
        ManifestFormat::Json => Box::new(JsonArrayWriter),
        ManifestFormat::JsonHash => Box::new(JsonHashWriter),
        ManifestFormat::Lua => Box::new(LuaWriter),
    }
}
