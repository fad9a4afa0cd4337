use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uphone_storage::prelude::*;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
struct Doc {
    id: String,
    title: String,
    state: String,
    rank: u32,
}

impl Entity for Doc {
    const TABLE: &'static str = "doc";

    fn id(&self) -> &str {
        &self.id
    }
}

fn doc(id: &str, state: &str, rank: u32) -> Doc {
    Doc {
        id: id.into(),
        title: format!("title {id}"),
        state: state.into(),
        rank,
    }
}

#[tokio::test]
async fn crud_and_select() {
    let datastore = MemoryDatastore::new();
    let repo: InMemoryRepository<Doc> = InMemoryRepository::new(&datastore);

    repo.create(&doc("d1", "open", 2)).await.unwrap();
    repo.create(&doc("d2", "closed", 1)).await.unwrap();
    repo.create(&doc("d3", "open", 3)).await.unwrap();

    let fetched = repo.get("d1").await.unwrap().unwrap();
    assert_eq!(fetched.title, "title d1");

    let open = repo
        .select(QueryParams::filter(json!({ "state": "open" })).order_by("rank", SortOrder::Desc))
        .await
        .unwrap();
    let ids: Vec<_> = open.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["d3", "d1"]);

    let updated = repo.update("d2", json!({ "title": "renamed" })).await.unwrap();
    assert_eq!(updated.title, "renamed");
    assert_eq!(updated.state, "closed");

    repo.delete("d2").await.unwrap();
    assert!(repo.get("d2").await.unwrap().is_none());
    assert!(repo.delete("d2").await.is_err());
}

#[tokio::test]
async fn duplicate_create_is_a_conflict() {
    let datastore = MemoryDatastore::new();
    let repo: InMemoryRepository<Doc> = InMemoryRepository::new(&datastore);
    repo.create(&doc("d1", "open", 1)).await.unwrap();
    let err = repo.create(&doc("d1", "open", 1)).await.unwrap_err();
    assert_eq!(err.kind(), uphone_errors::kind::ErrorKind::Conflict);
}

#[tokio::test]
async fn compare_and_swap_only_applies_on_match() {
    let datastore = MemoryDatastore::new();
    let repo: InMemoryRepository<Doc> = InMemoryRepository::new(&datastore);
    repo.create(&doc("d1", "open", 1)).await.unwrap();

    let won = repo
        .compare_and_swap("d1", json!({ "state": "open" }), json!({ "state": "held" }))
        .await
        .unwrap();
    assert_eq!(won.map(|d| d.state), Some("held".to_string()));

    let lost = repo
        .compare_and_swap("d1", json!({ "state": "open" }), json!({ "state": "held" }))
        .await
        .unwrap();
    assert!(lost.is_none());

    let missing = repo
        .compare_and_swap("nope", json!({ "state": "open" }), json!({ "state": "held" }))
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn invalid_patch_leaves_document_untouched() {
    let datastore = MemoryDatastore::new();
    let repo: InMemoryRepository<Doc> = InMemoryRepository::new(&datastore);
    repo.create(&doc("d1", "open", 1)).await.unwrap();

    assert!(repo.update("d1", json!({ "rank": "high" })).await.is_err());
    assert_eq!(repo.get("d1").await.unwrap().unwrap().rank, 1);
}

#[tokio::test]
async fn delete_if_checks_expected_fields() {
    let datastore = MemoryDatastore::new();
    let repo: InMemoryRepository<Doc> = InMemoryRepository::new(&datastore);
    repo.create(&doc("d1", "held", 1)).await.unwrap();

    assert!(!repo.delete_if("d1", json!({ "state": "open" })).await.unwrap());
    assert!(repo.get("d1").await.unwrap().is_some());
    assert!(repo.delete_if("d1", json!({ "state": "held" })).await.unwrap());
    assert!(repo.get("d1").await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_swaps_have_a_single_winner() {
    let datastore = MemoryDatastore::new();
    let repo = Arc::new(InMemoryRepository::<Doc>::new(&datastore));
    repo.create(&doc("d1", "open", 1)).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.compare_and_swap("d1", json!({ "state": "open" }), json!({ "state": "held" }))
                .await
                .unwrap()
                .is_some()
        }));
    }
    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}
