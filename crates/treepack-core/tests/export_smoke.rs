use treepack_core::prelude::*;

fn sample() -> Layout {
    let cfg = PackerConfig::builder().initial_size(64).padding(1).build();
    pack_layout(vec![("a", 32, 16), ("b", 10, 10)], cfg).expect("pack")
}

#[test]
fn export_json_array_smoke() {
    let layout = sample();
    let ja = treepack_core::to_json_array(&layout);
    let obj = ja.as_object().expect("object");
    assert!(obj.contains_key("frames"));
    assert!(obj.contains_key("meta"));
    assert_eq!(ja["size"], 64);
    let frames = ja["frames"].as_array().expect("frames");
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0]["key"], "a");
    // content rect sits one pixel inside the slot
    assert_eq!(frames[0]["frame"]["x"], 1);
    assert_eq!(frames[0]["slot"]["w"], 34);
    assert_eq!(ja["meta"]["app"], "treepack");
}

#[test]
fn export_json_hash_smoke() {
    let layout = sample();
    let jh = treepack_core::to_json_hash(&layout);
    let frames = jh["frames"].as_object().expect("frames");
    assert_eq!(frames.len(), 2);
    assert_eq!(frames["b"]["frame"]["w"], 10);
    assert_eq!(jh["meta"]["size"], 64);
}

#[test]
fn export_lua_smoke() {
    let layout = sample();
    let lua = treepack_core::to_lua_table(&layout, "atlas.png");
    assert!(lua.starts_with("--\n-- atlas.png\n"));
    assert!(lua.contains("return {"));
    assert!(lua.contains("texture = \"atlas.png\","));
    assert!(lua.contains("size = 64,"));
    assert!(lua.contains("[\"a\"] = { x = 1, y = 1, w = 32, h = 16 },"));
}

#[test]
fn lua_keys_are_escaped() {
    let cfg = PackerConfig::builder().initial_size(16).padding(0).build();
    let layout = pack_layout(vec![("say \"hi\"\\", 2, 2)], cfg).expect("pack");
    let lua = treepack_core::to_lua_table(&layout, "t.png");
    assert!(lua.contains(r#"["say \"hi\"\\"] = { x = 0, y = 0, w = 2, h = 2 },"#));
}

#[test]
fn writers_by_format() {
    let layout = sample();
    for (name, ext, marker) in [
        ("json", "json", "\"frames\""),
        ("json-hash", "json", "\"frames\""),
        ("lua", "lua", "return {"),
    ] {
        let format: ManifestFormat = name.parse().expect("format");
        let writer = writer_for(format);
        assert_eq!(writer.extension(), ext);
        let text = writer.render(&layout, "atlas.png").expect("render");
        assert!(text.contains(marker), "{name}: {text}");
        assert!(text.contains("atlas.png"));
    }
    assert!("plist".parse::<ManifestFormat>().is_err());
}
