//! Engine tests: depth assignment, cascades, guard behavior and error kinds.

use std::collections::HashSet;

use stratum::filter::ListQuery;
use stratum::item::{CreateItemRequest, ItemId, ItemPatch, UpdateItemRequest};

use crate::helpers::{assert_unique_depths, create_at_depths, depth_of, new_item, test_engine};

#[tokio::test]
async fn first_auto_depth_is_zero() {
    let engine = test_engine().await;
    let item = engine.create(new_item("first", 0, 0)).await.unwrap();
    assert_eq!(item.depth, 0);
}

#[tokio::test]
async fn auto_depth_is_max_plus_one() {
    let engine = test_engine().await;
    create_at_depths(&engine, &[-4, 17, 3]).await;
    let item = engine.create(new_item("top", 0, 0)).await.unwrap();
    assert_eq!(item.depth, 18);
}

#[tokio::test]
async fn contiguous_run_shift() {
    let engine = test_engine().await;
    let existing = create_at_depths(&engine, &[1, 2, 3]).await;

    let new = engine
        .create(new_item("new", 0, 0).with_depth(2))
        .await
        .unwrap();

    assert_eq!(new.depth, 2);
    assert_eq!(depth_of(&engine, &existing[0].id).await, 1);
    assert_eq!(depth_of(&engine, &existing[1].id).await, 3);
    assert_eq!(depth_of(&engine, &existing[2].id).await, 4);
    assert_eq!(assert_unique_depths(&engine).await, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn gap_stopped_shift() {
    let engine = test_engine().await;
    let existing = create_at_depths(&engine, &[1, 2, 4]).await;

    engine
        .create(new_item("new", 0, 0).with_depth(2))
        .await
        .unwrap();

    assert_eq!(depth_of(&engine, &existing[1].id).await, 3);
    assert_eq!(depth_of(&engine, &existing[2].id).await, 4);
    assert_eq!(assert_unique_depths(&engine).await, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn update_cascade_excludes_the_moving_item() {
    let engine = test_engine().await;
    let existing = create_at_depths(&engine, &[1, 2, 6, 7, 8]).await;

    let request = UpdateItemRequest {
        depth: Some(6),
        ..Default::default()
    };
    let moved = engine.update_item(&existing[3].id, request).await.unwrap();

    assert_eq!(moved.depth, 6);
    assert_eq!(depth_of(&engine, &existing[2].id).await, 7);
    assert_eq!(depth_of(&engine, &existing[4].id).await, 8);
    assert_eq!(assert_unique_depths(&engine).await, vec![1, 2, 6, 7, 8]);
}

#[tokio::test]
async fn update_moving_up_into_a_run() {
    let engine = test_engine().await;
    let existing = create_at_depths(&engine, &[0, 5, 6]).await;

    let patch = ItemPatch {
        depth: Some(5),
        ..Default::default()
    };
    engine.update(&existing[0].id, patch).await.unwrap();

    assert_eq!(depth_of(&engine, &existing[0].id).await, 5);
    assert_eq!(depth_of(&engine, &existing[1].id).await, 6);
    assert_eq!(depth_of(&engine, &existing[2].id).await, 7);
    assert_unique_depths(&engine).await;
}

#[tokio::test]
async fn round_trip_create_get() {
    let engine = test_engine().await;
    let created = engine
        .create_item(CreateItemRequest {
            name: Some("round".into()),
            position_x: Some(-5),
            position_y: Some(12),
            depth: None,
            width: Some(3),
            height: Some(9),
        })
        .await
        .unwrap();

    assert_eq!(engine.get(&created.id).await.unwrap(), created);
}

#[tokio::test]
async fn repeated_identical_update_is_idempotent_apart_from_timestamp() {
    let engine = test_engine().await;
    let existing = create_at_depths(&engine, &[3, 4]).await;

    let patch = ItemPatch {
        depth: Some(3),
        ..Default::default()
    };
    let first = engine.update(&existing[0].id, patch.clone()).await.unwrap();
    let second = engine.update(&existing[0].id, patch).await.unwrap();

    assert_eq!(first.depth, 3);
    assert_eq!(second.depth, 3);
    assert_eq!(second.name, first.name);
    assert_eq!(depth_of(&engine, &existing[1].id).await, 4);
}

#[tokio::test]
async fn error_kinds() {
    let engine = test_engine().await;
    let unknown = ItemId::generate();

    assert!(engine.get(&unknown).await.unwrap_err().is_not_found());
    assert!(engine.delete(&unknown).await.unwrap_err().is_not_found());
    assert!(
        engine
            .update_item(&unknown, UpdateItemRequest::default())
            .await
            .unwrap_err()
            .is_not_found()
    );

    let err = engine
        .create_item(CreateItemRequest {
            name: Some("no size".into()),
            position_x: Some(0),
            position_y: Some(0),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(err.is_validation_error());

    let item = engine.create(new_item("a", 0, 0)).await.unwrap();
    let err = engine
        .update_item(
            &item.id,
            UpdateItemRequest {
                height: Some(-3),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_validation_error());
    assert_eq!(engine.get(&item.id).await.unwrap(), item);
}

#[tokio::test]
async fn auto_depth_overflow_is_rejected() {
    let engine = test_engine().await;
    create_at_depths(&engine, &[i64::MAX]).await;
    let err = engine.create(new_item("over", 0, 0)).await.unwrap_err();
    assert!(err.is_validation_error());
    assert_eq!(engine.count().await.unwrap(), 1);
}

#[tokio::test]
async fn delete_never_cascades() {
    let engine = test_engine().await;
    let existing = create_at_depths(&engine, &[1, 2, 3]).await;
    engine.delete(&existing[1].id).await.unwrap();
    assert_eq!(assert_unique_depths(&engine).await, vec![1, 3]);
}

#[tokio::test]
async fn separate_engines_do_not_share_state() {
    let a = test_engine().await;
    let b = test_engine().await;
    a.create(new_item("only-in-a", 0, 0)).await.unwrap();
    assert_eq!(a.count().await.unwrap(), 1);
    assert_eq!(b.count().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_inserts_and_reads_never_see_duplicates() {
    let engine = test_engine().await;
    create_at_depths(&engine, &[0, 1, 2, 3, 4]).await;

    let mut writers = Vec::new();
    for i in 0..20 {
        let engine = engine.clone();
        writers.push(tokio::spawn(async move {
            engine
                .create(new_item(&format!("w{i}"), i, i).with_depth(i % 3))
                .await
                .unwrap();
        }));
    }

    let mut readers = Vec::new();
    for _ in 0..10 {
        let engine = engine.clone();
        readers.push(tokio::spawn(async move {
            for _ in 0..5 {
                let items = engine
                    .list(ListQuery::new().with_limit(500))
                    .await
                    .unwrap();
                let depths: HashSet<i64> = items.iter().map(|i| i.depth).collect();
                assert_eq!(depths.len(), items.len());
                tokio::task::yield_now().await;
            }
        }));
    }

    for handle in writers.into_iter().chain(readers) {
        handle.await.unwrap();
    }

    assert_eq!(assert_unique_depths(&engine).await.len(), 25);
}
