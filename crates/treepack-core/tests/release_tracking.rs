use std::cell::Cell;
use std::rc::Rc;

use treepack_core::prelude::*;

/// Identity that counts how many times it has been dropped.
#[derive(Debug)]
struct Tracked(Rc<Cell<usize>>);

impl Drop for Tracked {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

fn tracked_batch(drops: &Rc<Cell<usize>>, sizes: &[(u32, u32)]) -> Container<Tracked> {
    Container::from_images(
        sizes
            .iter()
            .map(|&(w, h)| Image::new(Tracked(drops.clone()), w, h).expect("image")),
    )
}

#[test]
fn tree_destroy_releases_each_image_once() {
    let drops = Rc::new(Cell::new(0));
    let mut tree = PackTree::new(256).expect("tree");
    for _ in 0..20 {
        let image = Image::new(Tracked(drops.clone()), 16, 16).expect("image");
        assert!(tree.insert(image, 0).expect("insert").is_placed());
    }
    assert_eq!(drops.get(), 0);
    assert_eq!(tree.destroy(), 20);
    assert_eq!(drops.get(), 20);
}

#[test]
fn container_destroy_all_releases_each_image_once() {
    let drops = Rc::new(Cell::new(0));
    let mut c = tracked_batch(&drops, &[(1, 1), (2, 2), (3, 3), (4, 4)]);
    let released = c.destroy(DestroyMode::all());
    assert_eq!(released.entries, 4);
    assert_eq!(released.images, 4);
    assert_eq!(drops.get(), 4);
    drop(c);
    assert_eq!(drops.get(), 4);
}

#[test]
fn entries_only_keeps_payloads_alive() {
    let drops = Rc::new(Cell::new(0));
    let mut c = tracked_batch(&drops, &[(1, 1), (2, 2), (3, 3)]);
    let released = c.destroy(DestroyMode::ENTRIES);
    assert_eq!(drops.get(), 0);
    assert_eq!(released.retained.len(), 3);
    drop(released);
    assert_eq!(drops.get(), 3);
}

#[test]
fn retries_move_images_without_dropping_them() {
    let drops = Rc::new(Cell::new(0));
    // 64 tiles of 32x32 cannot fit in 128, need 256
    let sizes = vec![(32, 32); 64];
    let images = tracked_batch(&drops, &sizes);
    let cfg = PackerConfig::builder()
        .initial_size(128)
        .padding(0)
        .build();
    let out = pack(images, &cfg).expect("pack");
    assert_eq!(out.size, 256);
    assert_eq!(out.attempts, 2);
    assert_eq!(drops.get(), 0);
    assert_eq!(out.tree.placed_count(), 64);
    drop(out);
    assert_eq!(drops.get(), 64);
}

#[test]
fn sizing_failure_releases_the_whole_batch() {
    let drops = Rc::new(Cell::new(0));
    let images = tracked_batch(&drops, &[(600, 600), (600, 600), (600, 600)]);
    let cfg = PackerConfig::builder()
        .initial_size(512)
        .max_size(1024)
        .padding(0)
        .build();
    assert!(matches!(
        pack(images, &cfg),
        Err(TreePackError::SizingFailure { .. })
    ));
    assert_eq!(drops.get(), 3);
}

#[test]
fn reclaimed_images_survive_the_tree() {
    let drops = Rc::new(Cell::new(0));
    let mut tree = PackTree::new(64).expect("tree");
    for _ in 0..3 {
        let image = Image::new(Tracked(drops.clone()), 8, 8).expect("image");
        assert!(tree.insert(image, 1).expect("insert").is_placed());
    }
    let back = tree.reclaim();
    assert_eq!(drops.get(), 0);
    assert_eq!(back.len(), 3);
    drop(back);
    assert_eq!(drops.get(), 3);
}
