//! ItemStore contract tests, run against whichever store TEST_BACKEND selects.

use stratum::{
    Error,
    backend::{BackendError, DepthShift, ItemStore, ItemWrite, WriteBatch, database::InMemory},
    item::{ItemId, ItemPatch},
};

use crate::helpers::{placed, test_backend};

#[tokio::test]
async fn create_get_and_count() {
    let store = test_backend().await;
    assert_eq!(store.count().await.unwrap(), 0);
    assert_eq!(store.max_by_depth().await.unwrap(), None);

    let item = store.create(placed("a", 4)).await.unwrap();
    assert_eq!(store.get(&item.id).await.unwrap(), Some(item.clone()));
    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(store.get(&ItemId::generate()).await.unwrap(), None);
}

#[tokio::test]
async fn create_rejects_duplicate_id_and_depth() {
    let store = test_backend().await;
    let item = store.create(placed("a", 1)).await.unwrap();

    let err = store.create(item.at_depth(2)).await.unwrap_err();
    assert!(matches!(err, Error::Backend(BackendError::DuplicateItem { .. })));

    let err = store.create(placed("b", 1)).await.unwrap_err();
    assert!(err.is_store_failure());
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn list_from_and_max_by_depth() {
    let store = test_backend().await;
    for depth in [7, -2, 3, 10] {
        store.create(placed(&format!("d{depth}"), depth)).await.unwrap();
    }

    let depths: Vec<i64> = store
        .list_from(3)
        .await
        .unwrap()
        .iter()
        .map(|i| i.depth)
        .collect();
    assert_eq!(depths, vec![3, 7, 10]);
    assert_eq!(store.list().await.unwrap().len(), 4);
    assert_eq!(store.max_by_depth().await.unwrap().unwrap().depth, 10);
}

#[tokio::test]
async fn update_merges_present_fields() {
    let store = test_backend().await;
    let item = store.create(placed("a", 1)).await.unwrap();

    let patch = ItemPatch {
        name: Some("renamed".into()),
        x: Some(42),
        ..Default::default()
    };
    let updated = store.update(&item.id, &patch, 5_000).await.unwrap();

    assert_eq!(updated.name, "renamed");
    assert_eq!(updated.position.x, 42);
    assert_eq!(updated.position.y, item.position.y);
    assert_eq!(updated.size, item.size);
    assert_eq!(updated.created_at, item.created_at);
    assert_eq!(updated.updated_at, 5_000);
    assert_eq!(store.get(&item.id).await.unwrap(), Some(updated));
}

#[tokio::test]
async fn update_and_delete_unknown_ids() {
    let store = test_backend().await;
    let id = ItemId::generate();

    let err = store
        .update(&id, &ItemPatch::default(), 0)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(store.delete(&id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn update_refuses_taken_depth() {
    let store = test_backend().await;
    let a = store.create(placed("a", 1)).await.unwrap();
    store.create(placed("b", 2)).await.unwrap();

    let patch = ItemPatch {
        depth: Some(2),
        ..Default::default()
    };
    let err = store.update(&a.id, &patch, 0).await.unwrap_err();
    assert!(err.is_integrity_error());
    assert_eq!(store.get(&a.id).await.unwrap().unwrap().depth, 1);
}

#[tokio::test]
async fn delete_removes_item() {
    let store = test_backend().await;
    let a = store.create(placed("a", 1)).await.unwrap();
    store.delete(&a.id).await.unwrap();
    assert_eq!(store.get(&a.id).await.unwrap(), None);
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn commit_applies_whole_cascade() {
    let store = test_backend().await;
    let two = store.create(placed("two", 2)).await.unwrap();
    let three = store.create(placed("three", 3)).await.unwrap();

    let batch = WriteBatch {
        shifts: vec![
            DepthShift {
                id: two.id,
                from: 2,
                to: 3,
            },
            DepthShift {
                id: three.id,
                from: 3,
                to: 4,
            },
        ],
        write: ItemWrite::Insert(placed("new", 2)),
    };
    let new = store.commit(batch).await.unwrap();

    assert_eq!(new.depth, 2);
    assert_eq!(store.get(&two.id).await.unwrap().unwrap().depth, 3);
    assert_eq!(store.get(&three.id).await.unwrap().unwrap().depth, 4);
    // Shifted items keep their timestamps
    assert_eq!(
        store.get(&two.id).await.unwrap().unwrap().updated_at,
        two.updated_at
    );
}

#[tokio::test]
async fn commit_replace_moves_item_down_a_run() {
    let store = test_backend().await;
    let six = store.create(placed("six", 6)).await.unwrap();
    let seven = store.create(placed("seven", 7)).await.unwrap();
    let eight = store.create(placed("eight", 8)).await.unwrap();

    let batch = WriteBatch {
        shifts: vec![DepthShift {
            id: six.id,
            from: 6,
            to: 7,
        }],
        write: ItemWrite::Replace(seven.at_depth(6)),
    };
    store.commit(batch).await.unwrap();

    assert_eq!(store.get(&seven.id).await.unwrap().unwrap().depth, 6);
    assert_eq!(store.get(&six.id).await.unwrap().unwrap().depth, 7);
    assert_eq!(store.get(&eight.id).await.unwrap().unwrap().depth, 8);
}

#[tokio::test]
async fn stale_commit_changes_nothing() {
    let store = test_backend().await;
    let one = store.create(placed("one", 1)).await.unwrap();
    let two = store.create(placed("two", 2)).await.unwrap();

    let batch = WriteBatch {
        shifts: vec![
            DepthShift {
                id: one.id,
                from: 1,
                to: 2,
            },
            DepthShift {
                id: two.id,
                from: 5,
                to: 6,
            },
        ],
        write: ItemWrite::Insert(placed("new", 1)),
    };
    let err = store.commit(batch).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Backend(BackendError::StaleBatch {
            expected: 5,
            found: Some(2),
            ..
        })
    ));

    assert_eq!(store.get(&one.id).await.unwrap().unwrap().depth, 1);
    assert_eq!(store.get(&two.id).await.unwrap().unwrap().depth, 2);
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn commit_without_room_is_rejected() {
    let store = test_backend().await;
    store.create(placed("one", 1)).await.unwrap();

    let err = store
        .commit(WriteBatch::single(ItemWrite::Insert(placed("new", 1))))
        .await
        .unwrap_err();
    assert!(err.is_integrity_error());
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn commit_replace_of_unknown_item() {
    let store = test_backend().await;
    let err = store
        .commit(WriteBatch::single(ItemWrite::Replace(placed("ghost", 0))))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn in_memory_snapshot_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stratum.json");

    let store = InMemory::new();
    let a = store.create(placed("a", 0)).await.unwrap();
    let b = store.create(placed("b", 9)).await.unwrap();
    store.save_to_file(&path).await.unwrap();

    let loaded = InMemory::load_from_file(&path).await.unwrap();
    assert_eq!(loaded.get(&a.id).await.unwrap(), Some(a));
    assert_eq!(loaded.max_by_depth().await.unwrap(), Some(b));
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn sqlite_file_persists_across_reopen() {
    use stratum::backend::database::Sqlite;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stratum.db");

    let id = {
        let store = Sqlite::open_sqlite(&path).await.unwrap();
        assert!(store.is_sqlite());
        let item = store.create(placed("kept", 3)).await.unwrap();
        store.pool().close().await;
        item.id
    };

    let store = Sqlite::open_sqlite(&path).await.unwrap();
    let item = store.get(&id).await.unwrap().unwrap();
    assert_eq!(item.name, "kept");
    assert_eq!(item.depth, 3);
}
