//! Tests for lazily fetched children.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use arbor::prelude::*;
use serde_json::{Value, json};

fn remote_root() -> Value {
    json!({"children": [
        {"label": "Remote", "value": "remote"},
        {"label": "Local", "value": "local", "children": [{"label": "x", "value": "x"}]}
    ]})
}

/// A source that answers with two children and counts its calls.
fn counting_source(calls: Arc<AtomicUsize>) -> impl ChildrenSource {
    source_fn(move |node: Value, _depth| {
        let calls = Arc::clone(&calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            let parent = node["value"].as_str().unwrap_or_default().to_string();
            Ok(Some(vec![
                json!({"label": "first", "value": format!("{parent}-1"), "children": []}),
                json!({"label": "second", "value": format!("{parent}-2"), "children": []}),
            ]))
        }
    })
}

#[tokio::test]
async fn test_first_expansion_fetches_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let tree = Tree::new(
        remote_root(),
        TreeConfig::default().with_children_source(counting_source(Arc::clone(&calls))),
    );
    let remote = tree.key_at(&[0]).unwrap();

    let pass = tree.render();
    assert!(pass.fetches.is_empty());
    assert_eq!(pass.find(&remote).unwrap().children, ChildrenStatus::Unloaded);

    let task = tree.toggle(&remote).into_fetch().expect("expansion should fetch");
    assert_eq!(task.key(), &remote);
    assert_eq!(task.depth(), 0);
    assert!(tree.is_pending(&remote));

    let pass = tree.render();
    assert!(pass.fetches.is_empty());
    assert!(matches!(pass.rows[1], Row::Pending { depth: 1, .. }));

    assert_eq!(task.run().await.unwrap(), 2);
    assert!(!tree.is_pending(&remote));
    assert!(tree.is_dirty());

    let pass = tree.render();
    let labels: Vec<&str> = pass.nodes().map(|row| row.label.as_str()).collect();
    assert_eq!(labels, ["Remote", "first", "second", "Local"]);
    assert_eq!(pass.at_path(&[0, 1]).unwrap().depth, 1);

    tree.toggle(&remote);
    assert!(tree.toggle(&remote).into_fetch().is_none());
    assert!(tree.render().fetches.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rapid_toggles_share_one_request() {
    let calls = Arc::new(AtomicUsize::new(0));
    let tree = Tree::new(
        remote_root(),
        TreeConfig::default().with_children_source(counting_source(Arc::clone(&calls))),
    );
    let remote = tree.key_at(&[0]).unwrap();

    let task = tree.toggle(&remote).into_fetch().unwrap();
    for _ in 0..3 {
        assert!(tree.toggle(&remote).into_fetch().is_none());
        assert!(tree.toggle(&remote).into_fetch().is_none());
        assert!(tree.render().fetches.is_empty());
    }
    task.run().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_result_after_collapse_is_kept() {
    let calls = Arc::new(AtomicUsize::new(0));
    let tree = Tree::new(
        remote_root(),
        TreeConfig::default().with_children_source(counting_source(Arc::clone(&calls))),
    );
    let remote = tree.key_at(&[0]).unwrap();

    let task = tree.toggle(&remote).into_fetch().unwrap();
    tree.toggle(&remote);
    task.run().await.unwrap();

    assert_eq!(tree.render().nodes().count(), 2);
    assert!(tree.toggle(&remote).into_fetch().is_none());
    assert_eq!(tree.render().nodes().count(), 4);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_expand_all_fetches_each_level() {
    let depths = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&depths);
    let source = source_fn(move |node: Value, depth| {
        seen.lock().unwrap().push(depth);
        async move {
            let value = node["value"].as_u64().unwrap_or_default();
            let result: FetchResult = if value >= 100 {
                Ok(None)
            } else {
                Ok(Some(vec![json!({"label": "kid", "value": value * 10 + 10})]))
            };
            result
        }
    });
    let tree = Tree::new(
        json!({"children": [{"label": "top", "value": 1}]}),
        TreeConfig::default()
            .with_expand_all(true)
            .with_children_source(source),
    );

    loop {
        let fetches = tree.render().fetches;
        if fetches.is_empty() {
            break;
        }
        for result in futures::future::join_all(fetches.into_iter().map(|t| t.run())).await {
            result.unwrap();
        }
    }

    assert_eq!(*depths.lock().unwrap(), [0, 1, 2]);
    let pass = tree.render();
    assert_eq!(pass.nodes().count(), 3);
    assert!(pass.nodes().last().unwrap().is_leaf());
    assert_eq!(tree.node_at(&[0, 0, 0]).unwrap()["children"], json!([]));
}

#[tokio::test]
async fn test_failure_is_reported_and_not_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(Mutex::new(Vec::new()));
    let counter = Arc::clone(&calls);
    let sink = Arc::clone(&errors);
    let tree = Tree::new(
        remote_root(),
        TreeConfig::default()
            .with_children_source(source_fn(move |_node, _depth| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(FetchError::new("connection refused")) }
            }))
            .with_error_handler(move |err| sink.lock().unwrap().push(err.to_string())),
    );
    let remote = tree.key_at(&[0]).unwrap();

    let task = tree.toggle(&remote).into_fetch().unwrap();
    let err = task.run().await.unwrap_err();
    assert_eq!(err.fetch_error().unwrap().message, "connection refused");
    assert_eq!(errors.lock().unwrap().len(), 1);
    assert!(errors.lock().unwrap()[0].contains("connection refused"));

    let pass = tree.render();
    assert!(pass.fetches.is_empty());
    assert!(tree.is_expanded(&remote));
    assert!(matches!(
        pass.find(&remote).unwrap().children,
        ChildrenStatus::Failed(_)
    ));
    assert!(matches!(&pass.rows[1], Row::Failed { error, .. } if error.message == "connection refused"));
    assert!(tree.render().fetches.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tree.toggle(&remote);
    let retry = tree.toggle(&remote).into_fetch();
    assert!(retry.is_some());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    retry.unwrap().run().await.unwrap_err();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_task_carries_node_snapshot() {
    let tree = Tree::new(
        remote_root(),
        TreeConfig::default().with_children_source(source_fn(|_node, _depth| async { Ok(None) })),
    );
    let task = tree.toggle(&tree.key_at(&[0]).unwrap()).into_fetch().unwrap();
    assert_eq!(task.node()["label"], "Remote");
    assert_eq!(task.run().await.unwrap(), 0);
    assert!(tree.render().at_path(&[0]).unwrap().is_leaf());
}

#[tokio::test]
async fn test_spawned_fetch_leaves_tree_interactive() {
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let rx = Arc::new(Mutex::new(Some(rx)));
    let tree = Tree::new(
        remote_root(),
        TreeConfig::default().with_children_source(source_fn(move |_node, _depth| {
            let rx = rx.lock().unwrap().take();
            async move {
                if let Some(rx) = rx {
                    let _ = rx.await;
                }
                Ok(Some(vec![json!({"label": "late", "value": "late"})]))
            }
        })),
    );
    let remote = tree.key_at(&[0]).unwrap();
    let local = tree.key_at(&[1]).unwrap();

    let task = tree.toggle(&remote).into_fetch().unwrap();
    let handle = tokio::spawn(task.run());

    assert!(tree.toggle(&local).is_handled());
    assert!(tree.render().find(&local).unwrap().expanded);
    assert!(tree.is_pending(&remote));

    tx.send(()).unwrap();
    assert_eq!(handle.await.unwrap().unwrap(), 1);
    assert_eq!(tree.render().nodes().count(), 4);
}

#[test]
fn test_without_source_missing_children_means_leaf() {
    let tree = Tree::new(remote_root(), TreeConfig::default());
    let remote = tree.key_at(&[0]).unwrap();
    assert!(matches!(tree.toggle(&remote), EventResult::Consumed));
    let pass = tree.render();
    assert!(pass.fetches.is_empty());
    assert!(pass.find(&remote).unwrap().is_leaf());
}

/// Renders and runs every issued fetch, `passes` times.
async fn drive(tree: &Tree, passes: usize) {
    for _ in 0..passes {
        let fetches = tree.render().fetches;
        futures::future::join_all(fetches.into_iter().map(|t| t.run())).await;
    }
}

#[tokio::test]
async fn test_unmergeable_children_fetched_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let tree = Tree::new(
        json!({"children": ["just a string"]}),
        TreeConfig::default()
            .with_expand_all(true)
            .with_children_source(counting_source(Arc::clone(&calls)))
            .with_error_handler(move |err| sink.lock().unwrap().push(err.to_string())),
    );

    drive(&tree, 5).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*errors.lock().unwrap(), ["node /#0 cannot hold children"]);

    let pass = tree.render();
    assert!(pass.fetches.is_empty());
    assert!(matches!(pass.rows[0].as_node().unwrap().children, ChildrenStatus::Failed(_)));
    assert_eq!(tree.data(), json!({"children": ["just a string"]}));
}

#[tokio::test]
async fn test_duplicate_values_fetched_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let tree = Tree::new(
        json!({"children": [
            {"label": "one", "value": "x"},
            {"label": "two", "value": "x"}
        ]}),
        TreeConfig::default()
            .with_expand_all(true)
            .with_children_source(counting_source(Arc::clone(&calls))),
    );

    drive(&tree, 5).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(tree.render().fetches.is_empty());
    assert_eq!(tree.node_at(&[0]).unwrap()["children"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_repeated_fetch_keeps_window() {
    let children: Vec<Value> = (0..45).map(|i| json!({"label": format!("c{i}"), "value": i})).collect();
    let answer = children.clone();
    let tree = Tree::new(
        remote_root(),
        TreeConfig::default().with_children_source(source_fn(move |_node, _depth| {
            let answer = answer.clone();
            async move { Ok(Some(answer)) }
        })),
    );
    let remote = tree.key_at(&[0]).unwrap();

    let task = tree.toggle(&remote).into_fetch().unwrap();
    tree.set_children_at(&[0], children).unwrap();
    tree.render();
    assert!(tree.load_more(&remote).is_handled());
    assert_eq!(tree.cursor(&remote), Some(40));

    assert_eq!(task.run().await.unwrap(), 45);
    assert_eq!(tree.cursor(&remote), Some(40));
    assert!(tree.is_expanded(&remote));

    let pass = tree.render();
    assert!(pass.fetches.is_empty());
    assert_eq!(pass.find(&remote).unwrap().children, ChildrenStatus::Resident { shown: 40, total: 45 });
    assert!(!pass.rows.iter().any(|row| matches!(row, Row::Failed { .. })));
}

#[tokio::test]
async fn test_label_renderer_may_read_tree() {
    let tree = Tree::new(remote_root(), TreeConfig::default());
    let handle = tree.clone();
    tree.set_config(
        TreeConfig::default()
            .with_children_source(source_fn(|_node, _depth| async { Ok(None) }))
            .with_label_renderer(move |node| {
                let label = node["label"].as_str()?;
                let key = handle.key_at(&[0]).ok()?;
                (node["value"] == "remote" && handle.is_pending(&key))
                    .then(|| format!("{label} (loading)"))
            }),
    );
    let remote = tree.key_at(&[0]).unwrap();
    let task = tree.toggle(&remote).into_fetch().unwrap();

    assert_eq!(tree.render().find(&remote).unwrap().label, "Remote (loading)");
    task.run().await.unwrap();
    assert_eq!(tree.render().find(&remote).unwrap().label, "Remote");

    // The renderer holds a handle to its own tree; replacing the config frees it.
    tree.set_config(TreeConfig::default());
}
