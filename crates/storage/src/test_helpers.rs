//! Behaviour checks shared by every backend's tests

use roster_core::{MemberDraft, MemberId};
use std::collections::HashSet;

use crate::trait_::{MemberStore, SharedMemberStore};

pub(crate) fn ann() -> MemberDraft {
    MemberDraft::new("Ann", "a@x.com", "Eng", "bio").with_image(vec![0x89, 0x50, 0x4e, 0x47])
}

pub(crate) fn bo() -> MemberDraft {
    MemberDraft::new("Bo", "b@x.com", "PM", "bio2").with_image(vec![0xff, 0xd8])
}

pub(crate) async fn check_create_and_get(store: &dyn MemberStore) {
    let created = store.create(ann()).await.unwrap();
    assert_eq!(created.id, MemberId(1));

    let fetched = store.get(created.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.to_draft(), ann());

    assert!(store.get(MemberId(99)).await.unwrap().is_none());
}

pub(crate) async fn check_sequential_ids(store: &dyn MemberStore) {
    let mut last = MemberId(0);
    for i in 0..10 {
        let draft = MemberDraft::new(format!("Member {i}"), "m@x.com", "Eng", "");
        let member = store.create(draft).await.unwrap();
        assert!(member.id > last, "{} should follow {}", member.id, last);
        last = member.id;
    }
    assert_eq!(store.count().await.unwrap(), 10);
    assert_eq!(store.max_id().await.unwrap(), Some(last));
}

pub(crate) async fn check_delete(store: &dyn MemberStore) {
    let member = store.create(ann()).await.unwrap();
    assert!(store.delete(member.id).await.unwrap());
    assert!(store.get(member.id).await.unwrap().is_none());
    assert!(!store.delete(member.id).await.unwrap());
}

pub(crate) async fn check_delete_all(store: &dyn MemberStore) {
    assert_eq!(store.delete_all().await.unwrap(), 0);

    store.create(ann()).await.unwrap();
    store.create(bo()).await.unwrap();
    assert_eq!(store.delete_all().await.unwrap(), 2);
    assert!(store.list_all().await.unwrap().is_empty());
    assert_eq!(store.max_id().await.unwrap(), None);
}

pub(crate) async fn check_update(store: &dyn MemberStore) {
    let member = store.create(ann()).await.unwrap();

    let updated = store.update(member.id, bo()).await.unwrap().unwrap();
    assert_eq!(updated.id, member.id);
    assert_eq!(updated.to_draft(), bo());

    let fetched = store.get(member.id).await.unwrap().unwrap();
    assert_eq!(fetched, updated);
}

pub(crate) async fn check_update_missing(store: &dyn MemberStore) {
    let member = store.create(ann()).await.unwrap();
    let before = store.list_all().await.unwrap();

    assert!(store.update(MemberId(42), bo()).await.unwrap().is_none());

    assert_eq!(store.list_all().await.unwrap(), before);
    assert_eq!(store.get(member.id).await.unwrap().unwrap().name, "Ann");
}

pub(crate) async fn check_ids_not_reused(store: &dyn MemberStore) {
    store.create(ann()).await.unwrap();
    let second = store.create(bo()).await.unwrap();

    store.delete(second.id).await.unwrap();
    let third = store.create(bo()).await.unwrap();
    assert_eq!(third.id, MemberId(3));

    store.delete_all().await.unwrap();
    let fourth = store.create(ann()).await.unwrap();
    assert_eq!(fourth.id, MemberId(4));
}

pub(crate) async fn check_example_scenario(store: &dyn MemberStore) {
    let first = store.create(ann()).await.unwrap();
    let second = store.create(bo()).await.unwrap();
    assert_eq!(first.id, MemberId(1));
    assert_eq!(second.id, MemberId(2));

    store.delete(first.id).await.unwrap();

    let all = store.list_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, MemberId(2));
    assert_eq!(all[0].name, "Bo");
}

pub(crate) async fn check_concurrent_creates(store: SharedMemberStore) {
    let mut handles = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let draft = MemberDraft::new(format!("Member {i}"), "m@x.com", "Eng", "");
            store.create(draft).await.unwrap().id
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        assert!(ids.insert(handle.await.unwrap()), "duplicate id assigned");
    }
    assert_eq!(ids.len(), 16);
    assert_eq!(store.count().await.unwrap(), 16);
    assert_eq!(store.max_id().await.unwrap(), Some(MemberId(16)));
}

fn writer(i: u8) -> MemberDraft {
    MemberDraft::new(
        format!("Writer {i}"),
        format!("w{i}@x.com"),
        format!("Profession {i}"),
        format!("About {i}"),
    )
    .with_image(vec![i])
}

pub(crate) async fn check_concurrent_updates(store: SharedMemberStore) {
    let id = store.create(ann()).await.unwrap().id;

    let mut handles = Vec::new();
    for i in 0..8u8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.update(id, writer(i)).await.unwrap()
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_some());
    }

    // Exactly one writer's record survives whole, never a mix of fields
    let stored = store.get(id).await.unwrap().unwrap();
    assert_eq!(stored.image.len(), 1);
    assert_eq!(stored.to_draft(), writer(stored.image[0]));
    assert_eq!(store.count().await.unwrap(), 1);

    // A later update replaces it
    store.update(id, bo()).await.unwrap().unwrap();
    assert_eq!(store.get(id).await.unwrap().unwrap().to_draft(), bo());
}
