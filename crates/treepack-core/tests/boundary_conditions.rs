use treepack_core::config::PackerConfig;
use treepack_core::error::TreePackError;
use treepack_core::{Image, TraversalOrder, pack_layout};

#[test]
fn defaults_are_valid() {
    let cfg = PackerConfig::default();
    assert_eq!(cfg.initial_size, 512);
    assert_eq!(cfg.padding, 1);
    assert_eq!(cfg.max_size, 16384);
    assert_eq!(cfg.export_order, TraversalOrder::PreOrder);
    assert!(!cfg.texture_outlines);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_zero_initial_size() {
    let cfg = PackerConfig {
        initial_size: 0,
        ..Default::default()
    };
    match cfg.validate() {
        Err(TreePackError::InvalidDimensions { width, height }) => {
            assert_eq!(width, 0);
            assert_eq!(height, 16384);
        }
        other => panic!("Expected InvalidDimensions error, got {:?}", other),
    }
}

#[test]
fn test_zero_max_size() {
    let cfg = PackerConfig {
        max_size: 0,
        ..Default::default()
    };
    assert!(matches!(
        cfg.validate(),
        Err(TreePackError::InvalidDimensions { .. })
    ));
}

#[test]
fn test_initial_size_above_max() {
    let cfg = PackerConfig {
        initial_size: 4096,
        max_size: 1024,
        ..Default::default()
    };
    match cfg.validate() {
        Err(TreePackError::InvalidConfig(msg)) => assert!(msg.contains("initial_size")),
        other => panic!("Expected InvalidConfig error, got {:?}", other),
    }
}

#[test]
fn test_padding_fills_canvas() {
    let cfg = PackerConfig {
        initial_size: 64,
        max_size: 100,
        padding: 50,
        ..Default::default()
    };
    assert!(matches!(cfg.validate(), Err(TreePackError::InvalidConfig(_))));

    let cfg = PackerConfig {
        padding: 49,
        ..cfg
    };
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_huge_padding_does_not_overflow() {
    let cfg = PackerConfig {
        padding: u32::MAX,
        ..Default::default()
    };
    assert!(matches!(cfg.validate(), Err(TreePackError::InvalidConfig(_))));
}

#[test]
fn test_zero_sized_image() {
    assert!(matches!(
        Image::new("a".to_string(), 0, 5),
        Err(TreePackError::InvalidDimensions { width: 0, height: 5 })
    ));
    assert!(Image::new("a".to_string(), 5, 0).is_err());
}

#[test]
fn test_single_pixel_images() {
    let cfg = PackerConfig::builder().initial_size(1).padding(0).build();
    let layout = pack_layout(vec![("a", 1, 1), ("b", 1, 1)], cfg).expect("pack");
    assert_eq!(layout.size, 2);
    assert_eq!(layout.attempts, 2);
}

#[test]
fn test_image_exactly_max_size() {
    let cfg = PackerConfig::builder()
        .initial_size(256)
        .max_size(256)
        .padding(0)
        .build();
    let layout = pack_layout(vec![("full", 256, 256)], cfg.clone()).expect("pack");
    assert_eq!(layout.size, 256);

    let padded = PackerConfig { padding: 1, ..cfg };
    assert!(matches!(
        pack_layout(vec![("full", 256, 256)], padded),
        Err(TreePackError::SizingFailure { .. })
    ));
}

#[test]
fn config_deserializes_with_defaults() {
    let cfg: PackerConfig =
        serde_json::from_str(r#"{ "initial_size": 128, "export_order": "post_order" }"#)
            .expect("config");
    assert_eq!(cfg.initial_size, 128);
    assert_eq!(cfg.padding, 1);
    assert_eq!(cfg.max_size, 16384);
    assert_eq!(cfg.export_order, TraversalOrder::PostOrder);

    let round: PackerConfig =
        serde_json::from_str(&serde_json::to_string(&cfg).expect("ser")).expect("de");
    assert_eq!(round, cfg);
}
