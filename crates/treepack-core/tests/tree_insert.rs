use treepack_core::prelude::*;
use treepack_core::NodeId;

fn img(key: &str, w: u32, h: u32) -> Image {
    Image::new(key.to_string(), w, h).expect("image")
}

fn placed(tree: &mut PackTree, image: Image, padding: u32) -> NodeId {
    match tree.insert(image, padding).expect("insert") {
        Insertion::Placed(id) => id,
        Insertion::Miss(image) => panic!("{} did not fit", image.key),
    }
}

fn rect_of(tree: &PackTree, id: NodeId) -> Rect {
    tree.node(id).expect("node").rect()
}

fn order(tree: &PackTree, order: TraversalOrder) -> Vec<usize> {
    let mut ids = Vec::new();
    tree.traverse(order, |id, _| ids.push(id.index()));
    ids
}

#[test]
fn zero_size_tree_is_rejected() {
    assert!(matches!(
        PackTree::<String>::new(0),
        Err(TreePackError::InvalidDimensions { width: 0, height: 0 })
    ));
}

#[test]
fn fresh_tree_is_one_free_leaf() {
    let tree: PackTree = PackTree::new(64).expect("tree");
    assert_eq!(tree.size(), 64);
    assert_eq!(tree.len(), 1);
    assert!(tree.is_empty());
    assert!(tree.root().is_free());
    assert_eq!(tree.root().rect(), Rect::new(0, 0, 64, 64));
}

#[test]
fn big_then_small_at_sixteen() {
    let mut tree = PackTree::new(16).expect("tree");
    let big = placed(&mut tree, img("big", 10, 10), 0);
    assert_eq!(big, PackTree::<String>::ROOT);
    assert_eq!(rect_of(&tree, big), Rect::new(0, 0, 10, 10));

    // dw == dh == 6: strip beside the image on the left, full-width band below on the right
    let (left, right) = tree.node(big).and_then(|n| n.children()).expect("split");
    assert_eq!(rect_of(&tree, left), Rect::new(10, 0, 6, 10));
    assert_eq!(rect_of(&tree, right), Rect::new(0, 10, 16, 6));

    // left-first search: the 6x10 strip takes the 5x5
    let small = placed(&mut tree, img("small", 5, 5), 0);
    assert_eq!(small, left);
    assert_eq!(rect_of(&tree, small), Rect::new(10, 0, 5, 5));
    let (l2, r2) = tree.node(small).and_then(|n| n.children()).expect("split");
    assert_eq!(rect_of(&tree, l2), Rect::new(15, 0, 1, 5));
    assert_eq!(rect_of(&tree, r2), Rect::new(10, 5, 6, 5));

    assert_eq!(tree.placed_count(), 2);
    assert_eq!(tree.len(), 5);
}

#[test]
fn wide_leftover_splits_the_other_way() {
    let mut tree = PackTree::new(16).expect("tree");
    // dw = 12 > dh = 4
    let id = placed(&mut tree, img("tall", 4, 12), 0);
    let node = tree.node(id).expect("node");
    let (left, right) = node.children().expect("split");
    assert_eq!(node.rect(), Rect::new(0, 0, 4, 12));
    assert_eq!(rect_of(&tree, left), Rect::new(0, 12, 4, 4));
    assert_eq!(rect_of(&tree, right), Rect::new(4, 0, 12, 16));
}

#[test]
fn padding_grows_the_slot_on_every_side() {
    let mut tree = PackTree::new(16).expect("tree");
    let id = placed(&mut tree, img("p", 4, 4), 2);
    let node = tree.node(id).expect("node");
    assert_eq!(node.rect(), Rect::new(0, 0, 8, 8));
    assert_eq!(node.padding(), 2);

    let placements = tree.placements(TraversalOrder::PreOrder);
    assert_eq!(placements.len(), 1);
    assert_eq!(placements[0].content_rect(), Rect::new(2, 2, 4, 4));
    assert_eq!(placements[0].padded_rect(), Rect::new(0, 0, 8, 8));
}

#[test]
fn miss_returns_the_image_and_changes_nothing() {
    let mut tree = PackTree::new(8).expect("tree");
    match tree.insert(img("huge", 9, 9), 0).expect("insert") {
        Insertion::Miss(image) => assert_eq!(image.key, "huge"),
        Insertion::Placed(_) => panic!("9x9 cannot fit in 8x8"),
    }
    assert_eq!(tree.len(), 1);
    assert!(tree.root().is_free());

    // padded size alone decides: 6x6 + 1 on each side is exactly 8x8
    let id = placed(&mut tree, img("snug", 6, 6), 1);
    let (left, right) = tree.node(id).and_then(|n| n.children()).expect("split");
    assert!(tree.node(left).expect("left").rect().is_empty());
    assert!(tree.node(right).expect("right").rect().is_empty());

    let before = tree.len();
    let miss = tree.insert(img("dot", 1, 1), 0).expect("insert");
    assert!(!miss.is_placed());
    assert_eq!(miss.placed(), None);
    assert_eq!(tree.len(), before);
}

#[test]
fn huge_padding_is_a_miss_not_an_overflow() {
    let mut tree = PackTree::new(1024).expect("tree");
    let out = tree.insert(img("x", 1, 1), u32::MAX).expect("insert");
    assert!(matches!(out, Insertion::Miss(_)));
}

#[test]
fn traversal_orders() {
    let mut tree = PackTree::new(16).expect("tree");
    placed(&mut tree, img("big", 10, 10), 0);
    placed(&mut tree, img("small", 5, 5), 0);
    // 0: root(big), 1: strip(small), 2: bottom band, 3 and 4: children of 1
    assert_eq!(order(&tree, TraversalOrder::PreOrder), [0, 1, 3, 4, 2]);
    assert_eq!(order(&tree, TraversalOrder::InOrder), [3, 1, 4, 0, 2]);
    assert_eq!(order(&tree, TraversalOrder::PostOrder), [3, 4, 1, 2, 0]);
}

#[test]
fn full_height_strips_build_a_deep_chain() {
    const N: u32 = 3_000;
    let mut tree: PackTree<u32> = PackTree::new(N).expect("tree");
    for i in 0..N {
        let image = Image::new(i, 1, N).expect("image");
        assert!(tree.insert(image, 0).expect("insert").is_placed());
    }
    assert_eq!(tree.len(), 1 + 2 * N as usize);

    let xs = |order: TraversalOrder| -> Vec<u32> {
        tree.placements(order).iter().map(|p| p.x).collect()
    };
    assert!(xs(TraversalOrder::PreOrder).into_iter().eq(0..N));
    assert!(xs(TraversalOrder::InOrder).into_iter().eq(0..N));
    assert!(xs(TraversalOrder::PostOrder).into_iter().eq((0..N).rev()));
    assert_eq!(tree.destroy(), N as usize);
}

#[test]
fn dump_to_list_holds_node_references() {
    let mut tree = PackTree::new(16).expect("tree");
    placed(&mut tree, img("big", 10, 10), 0);
    placed(&mut tree, img("small", 5, 5), 0);

    let refs = tree.dump_to_list(TraversalOrder::PostOrder);
    assert_eq!(refs.len(), 5);
    let mut placed_refs = 0;
    let mut ids = Vec::new();
    for payload in &refs {
        match payload {
            Payload::Node(node) => {
                ids.push(node.id.index());
                if node.placed {
                    placed_refs += 1;
                }
            }
            other => panic!("unexpected {:?}", other.kind()),
        }
    }
    assert_eq!(placed_refs, 2);
    assert_eq!(ids, [3, 4, 1, 2, 0]);
    drop(refs);
    assert_eq!(tree.placed_count(), 2);
}

#[test]
fn placements_follow_the_requested_order() {
    let mut tree = PackTree::new(16).expect("tree");
    placed(&mut tree, img("big", 10, 10), 0);
    placed(&mut tree, img("small", 5, 5), 0);

    let pre: Vec<&str> = tree
        .placements(TraversalOrder::PreOrder)
        .iter()
        .map(|p| p.key.as_str())
        .collect();
    assert_eq!(pre, ["big", "small"]);
    let post: Vec<&str> = tree
        .placements(TraversalOrder::PostOrder)
        .iter()
        .map(|p| p.key.as_str())
        .collect();
    assert_eq!(post, ["small", "big"]);

    let owned = tree.into_placements(TraversalOrder::PreOrder);
    assert_eq!(owned[1].key, "small");
    assert_eq!((owned[1].x, owned[1].y), (10, 0));
}

#[test]
fn into_regions_carries_the_images() {
    let mut tree = PackTree::new(16).expect("tree");
    placed(&mut tree, img("big", 10, 10), 0);
    placed(&mut tree, img("small", 5, 5), 0);
    let regions = tree.into_regions(TraversalOrder::PreOrder);
    assert_eq!(regions.len(), 2);
    for payload in &regions {
        match payload {
            Payload::Region(r) => {
                let image = r.image.as_ref().expect("placed region");
                assert_eq!(r.rect.w, image.width());
                assert_eq!(r.content_rect(), r.rect);
            }
            other => panic!("unexpected {:?}", other.kind()),
        }
    }
}

#[test]
fn reclaim_returns_images_in_insertion_order() {
    let mut tree = PackTree::new(16).expect("tree");
    placed(&mut tree, img("small", 5, 5), 0);
    placed(&mut tree, img("big", 10, 10), 0);
    placed(&mut tree, img("tiny", 1, 1), 0);
    let back = tree.reclaim();
    let keys: Vec<String> = back
        .into_iter()
        .filter_map(|p| match p {
            Payload::Image(i) => Some(i.key),
            _ => None,
        })
        .collect();
    assert_eq!(keys, ["small", "big", "tiny"]);
}

#[test]
fn destroy_counts_released_images() {
    let mut tree = PackTree::new(64).expect("tree");
    for i in 0..10 {
        placed(&mut tree, img(&format!("i{i}"), 8, 8), 0);
    }
    assert_eq!(tree.destroy(), 10);

    let empty: PackTree = PackTree::new(4).expect("tree");
    assert_eq!(empty.destroy(), 0);
}

#[test]
fn traversal_order_parses() {
    assert_eq!("pre".parse::<TraversalOrder>(), Ok(TraversalOrder::PreOrder));
    assert_eq!("InOrder".parse::<TraversalOrder>(), Ok(TraversalOrder::InOrder));
    assert_eq!("post_order".parse::<TraversalOrder>(), Ok(TraversalOrder::PostOrder));
    assert!("sideways".parse::<TraversalOrder>().is_err());
}
