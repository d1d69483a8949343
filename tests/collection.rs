use cutout::collection::{EntryId, ImageCollection, ImageStatus, RemoteObject, MAX_IMAGES};
use cutout::error::CollectionError;
use cutout::previews::PreviewRegistry;

mod common;
use common::new_image;

fn filled(count: usize) -> (ImageCollection, PreviewRegistry, Vec<EntryId>) {
    let mut collection = ImageCollection::new();
    let mut previews = PreviewRegistry::new();
    let ids = (0..count)
        .map(|i| collection.admit(new_image(&format!("{i}.png"), 8, 8), &mut previews).unwrap())
        .collect();
    (collection, previews, ids)
}

#[test]
fn admit_refuses_beyond_quota_without_allocating() {
    let (mut collection, mut previews, _) = filled(MAX_IMAGES);
    assert_eq!(collection.remaining_capacity(), 0);
    let err = collection.admit(new_image("extra.png", 8, 8), &mut previews).unwrap_err();
    assert_eq!(err, CollectionError::Full { max: MAX_IMAGES });
    assert_eq!(collection.len(), MAX_IMAGES);
    assert_eq!(previews.allocated(), MAX_IMAGES);
}

#[test]
fn remove_keeps_order_and_revokes_preview() {
    let (mut collection, mut previews, ids) = filled(3);
    let removed = collection.remove(&ids[1], &mut previews).unwrap();
    assert!(!previews.is_live(removed.preview));
    let remaining: Vec<_> = collection.entries().iter().map(|e| e.id.clone()).collect();
    assert_eq!(remaining, vec![ids[0].clone(), ids[2].clone()]);
    assert!(matches!(
        collection.remove(&ids[1], &mut previews),
        Err(CollectionError::NotFound(_))
    ));
}

#[test]
fn replace_resets_done_entry_to_pending() {
    let (mut collection, mut previews, ids) = filled(2);
    collection.begin_processing();
    collection.complete_processing(&ids);
    collection
        .set_remote(
            &ids[0],
            RemoteObject {
                storage_key: "a.png".into(),
                remote_url: "https://cdn.example/a.png".into(),
            },
        )
        .unwrap();
    let old_preview = collection.get(&ids[0]).unwrap().preview;

    collection
        .replace(&ids[0], new_image("edited.png", 4, 2), &mut previews)
        .unwrap();

    let entry = &collection.entries()[0];
    assert_eq!(entry.id, ids[0]);
    assert_eq!(entry.status, ImageStatus::Pending);
    assert_eq!((entry.width, entry.height), (4, 2));
    assert_eq!(entry.name, "edited.png");
    assert!(entry.remote.is_none());
    assert!(!previews.is_live(old_preview));
    assert!(previews.is_live(entry.preview));
    assert_eq!(collection.entries()[1].status, ImageStatus::Done);
}

#[test]
fn batch_transition_is_all_pending_entries() {
    let (mut collection, _previews, ids) = filled(3);
    collection.set_status(&ids[2], ImageStatus::Processing).unwrap();
    collection.set_status(&ids[2], ImageStatus::Done).unwrap();

    let batch = collection.begin_processing();
    assert_eq!(batch, vec![ids[0].clone(), ids[1].clone()]);
    assert_eq!(collection.count_with(ImageStatus::Processing), 2);
    assert_eq!(collection.pending_count(), 0);
    assert!(collection.has_active_work());

    assert_eq!(collection.complete_processing(&batch), 2);
    assert_eq!(collection.count_with(ImageStatus::Done), 3);
    assert!(!collection.has_active_work());
}

#[test]
fn revert_only_touches_processing_members_of_the_batch() {
    let (mut collection, mut previews, ids) = filled(3);
    let batch = collection.begin_processing();
    collection.replace(&ids[1], new_image("edit.png", 8, 8), &mut previews).unwrap();
    assert_eq!(collection.revert_processing(&batch), 2);
    assert_eq!(collection.pending_count(), 3);
}

#[test]
fn status_moves_forward_only() {
    let (mut collection, _previews, ids) = filled(1);
    let err = collection.set_status(&ids[0], ImageStatus::Done).unwrap_err();
    assert!(matches!(err, CollectionError::InvalidTransition { .. }));
    collection.set_status(&ids[0], ImageStatus::Processing).unwrap();
    collection.set_status(&ids[0], ImageStatus::Pending).unwrap();
}

#[test]
fn clear_balances_every_allocation() {
    let (mut collection, mut previews, ids) = filled(5);
    collection.remove(&ids[0], &mut previews).unwrap();
    collection.replace(&ids[1], new_image("edit.png", 8, 8), &mut previews).unwrap();
    assert_eq!(collection.clear(&mut previews), 4);
    assert!(collection.is_empty());
    assert_eq!(previews.live_count(), 0);
    assert_eq!(previews.allocated(), previews.revoked());
}

#[test]
fn generated_ids_are_distinct() {
    let ids: std::collections::HashSet<_> = (0..100).map(|_| EntryId::generate()).collect();
    assert_eq!(ids.len(), 100);
}
