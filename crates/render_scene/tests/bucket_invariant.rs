//! Randomized change streams must leave every bucket consistent with item keys

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use render_scene::prelude::*;
use render_scene::{ItemBucketMap, ItemKeyFlags};

struct Tagged(ItemKey);

impl Payload for Tagged {
    fn key(&self) -> ItemKey {
        self.0
    }
}

fn random_key(rng: &mut StdRng) -> ItemKey {
    ItemKey::new(ItemKeyFlags::from_bits_truncate(rng.gen::<u32>() & 0x7ff))
}

fn check_invariant(scene: &Scene) {
    let items: Vec<(ItemID, bool, ItemKey)> = scene.with_items(|items| {
        items
            .iter()
            .enumerate()
            .skip(1)
            .map(|(index, item)| {
                let id = ItemID::new(u32::try_from(index).expect("index fits u32"));
                (id, item.is_live(), item.key())
            })
            .collect()
    });

    scene.with_buckets(|buckets: &ItemBucketMap| {
        for (filter, bucket) in buckets.iter() {
            for &(id, live, key) in &items {
                assert_eq!(
                    bucket.contains(&id),
                    live && filter.test(&key),
                    "bucket {filter:?} disagrees on {id} (live {live}, key {key:?})"
                );
            }
        }
    });
}

#[test]
fn test_bucket_invariant_holds_after_every_cycle() {
    let config = SceneConfig::default()
        .with_bucket(ItemFilter::light())
        .with_bucket(ItemFilter::everything())
        .with_bucket(ItemFilter::builder().with_type_shape().with_dynamic().build());
    let scene = Scene::with_config(config).expect("valid config");
    let mut rng = StdRng::seed_from_u64(0x5ce7e);
    let mut ids = Vec::new();

    for _cycle in 0..40 {
        for _batch in 0..rng.gen_range(1..4) {
            let mut changes = PendingChanges::new();
            for _ in 0..rng.gen_range(0..12) {
                let new_item = ids.is_empty() || rng.gen_bool(0.3);
                let id = if new_item {
                    let id = scene.allocate_id();
                    ids.push(id);
                    id
                } else {
                    ids[rng.gen_range(0..ids.len())]
                };

                match rng.gen_range(0..10) {
                    0..=5 => {
                        let payload: PayloadPointer = Arc::new(Tagged(random_key(&mut rng)));
                        changes.reset_item(id, payload);
                    }
                    6 => changes.clear_item(id),
                    7 | 8 => changes.remove_item(id),
                    _ => changes.move_item(id),
                }
            }
            scene.enqueue_pending_changes(changes);
        }

        scene.process_pending_changes_queue();
        check_invariant(&scene);
    }

    assert!(!ids.is_empty());
}

#[test]
fn test_standard_buckets_never_overlap() {
    let scene = Scene::new();
    let mut rng = StdRng::seed_from_u64(7);

    let mut changes = PendingChanges::new();
    for _ in 0..200 {
        let id = scene.allocate_id();
        let key = if rng.gen_bool(0.5) {
            ItemKey::opaque_shape()
        } else {
            ItemKey::transparent_shape()
        };
        changes.reset_item(id, Arc::new(Tagged(key)) as PayloadPointer);
    }
    scene.enqueue_pending_changes(changes);
    scene.process_pending_changes_queue();

    let opaque = scene.bucket_items(&ItemFilter::opaque_shape()).expect("bucket");
    let transparent = scene.bucket_items(&ItemFilter::transparent_shape()).expect("bucket");

    assert_eq!(opaque.len() + transparent.len(), 200);
    assert!(opaque.iter().all(|id| !transparent.contains(id)));
}
