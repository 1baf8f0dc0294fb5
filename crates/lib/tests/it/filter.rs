//! List queries through the engine: bounds, size filters, ordering and limits.

use stratum::{
    Engine,
    filter::{ListParams, ListQuery},
    item::{NewItem, Position, Size},
};

use crate::helpers::{new_item, test_engine};

async fn six_widgets(engine: &Engine) {
    let placements = [(50, 50), (50, 100), (100, 100), (50, 150), (100, 150), (150, 150)];
    for (i, (x, y)) in placements.into_iter().enumerate() {
        let depth = i as i64 + 1;
        engine
            .create(new_item(&format!("w{depth}"), x, y).with_depth(depth))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn six_item_bounds_scenario() {
    let engine = test_engine().await;
    six_widgets(&engine).await;

    let query = ListQuery::new()
        .with_max_x(100)
        .with_max_y(150)
        .with_width(100)
        .with_height(100);
    let names: Vec<String> = engine
        .list(query)
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(names, vec!["w1", "w2"]);
}

#[tokio::test]
async fn bounds_without_size_filter_use_plain_check() {
    let engine = test_engine().await;
    six_widgets(&engine).await;

    let depths: Vec<i64> = engine
        .list(ListQuery::new().with_max_x(100).with_max_y(150))
        .await
        .unwrap()
        .iter()
        .map(|i| i.depth)
        .collect();
    assert_eq!(depths, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn raw_params_go_through_the_same_path() {
    let engine = test_engine().await;
    six_widgets(&engine).await;

    let params = ListParams {
        limit: Some("1".into()),
        max_y: Some("100".into()),
        ..Default::default()
    };
    let items = engine.list_items(&params).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "w1");

    let params = ListParams {
        limit: Some("ten".into()),
        ..Default::default()
    };
    assert!(engine.list_items(&params).await.unwrap_err().is_validation_error());
}

#[tokio::test]
async fn negative_bound_returns_empty_list() {
    let engine = test_engine().await;
    six_widgets(&engine).await;

    let params = ListParams {
        max_x: Some("-5".into()),
        ..Default::default()
    };
    assert!(engine.list_items(&params).await.unwrap().is_empty());

    let params = ListParams {
        max_y: Some("150".into()),
        height: Some("-100".into()),
        ..Default::default()
    };
    assert!(engine.list_items(&params).await.unwrap().is_empty());

    let params = ListParams {
        limit: Some("-1".into()),
        ..Default::default()
    };
    assert!(engine.list_items(&params).await.unwrap_err().is_validation_error());
}

#[tokio::test]
async fn limit_default_and_clamp() {
    let engine = test_engine().await;
    for i in 0..520 {
        let item = NewItem::new(
            format!("n{i}"),
            Position { x: i, y: 0 },
            Size {
                width: 1,
                height: 1,
            },
        )
        .unwrap();
        engine.create(item).await.unwrap();
    }

    let items = engine.list(ListQuery::new().with_limit(0)).await.unwrap();
    assert_eq!(items.len(), 10);
    let depths: Vec<i64> = items.iter().map(|i| i.depth).collect();
    assert_eq!(depths, (0..10).collect::<Vec<i64>>());

    let items = engine.list(ListQuery::new().with_limit(10_000)).await.unwrap();
    assert_eq!(items.len(), 500);
    assert!(items.windows(2).all(|w| w[0].depth < w[1].depth));
}
