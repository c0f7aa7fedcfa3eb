use std::fmt::Write as _;

use crate::model::Layout;

/// Build a Lua module describing the layout:
///
/// ```lua
/// return {
///   texture = "atlas.png",
///   size = 512,
///   padding = 1,
///   frames = {
///     ["hero"] = { x = 1, y = 1, w = 32, h = 48 },
///   },
/// }
/// ```
///
/// Frame rectangles are the image pixels, padding excluded.
pub fn to_lua_table<K: ToString>(layout: &Layout<K>, texture: &str) -> String {
    let mut s = String::new();
    let _ = write!(
        s,
        "--\n-- {}\n--\n-- generated by {} {}\n--\n\n",
        texture, layout.meta.app, layout.meta.version
    );
    s.push_str("return {\n");
    let _ = writeln!(s, "  texture = \"{}\",", lua_escape(texture));
    let _ = writeln!(s, "  size = {},", layout.size);
    let _ = writeln!(s, "  padding = {},", layout.padding);
    s.push_str("  frames = {\n");
    for p in &layout.placements {
        let r = p.content_rect();
        let _ = writeln!(
            s,
            "    [\"{}\"] = {{ x = {}, y = {}, w = {}, h = {} }},",
            lua_escape(&p.key.to_string()),
            r.x,
            r.y,
            r.w,
            r.h
        );
    }
    s.push_str("  },\n}\n");
    s
}

fn lua_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}
