#![allow(missing_docs)]

//! Executor-level integration tests over a scripted session.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use redify::engine::{GraphSession, Row};
use redify::model::{RelationshipRef, RelationshipRemoveItem, RelationshipUpdateItem};
use redify::ops::{nodes, relationships};
use redify::query::{FilterSpec, Statement};
use redify::{GraphValue, RedifyError};
use serde_json::json;

/// In-memory session: records every statement and replays canned
/// replies in order. An empty queue answers with "no rows".
#[derive(Default)]
struct ScriptedSession {
    calls: Mutex<Vec<Statement>>,
    replies: Mutex<VecDeque<Result<Vec<Row>, String>>>,
}

impl ScriptedSession {
    fn new() -> Self {
        Self::default()
    }

    fn push_rows(&self, rows: Vec<Row>) {
        self.replies.lock().unwrap().push_back(Ok(rows));
    }

    fn push_row(&self, row: Row) {
        self.push_rows(vec![row]);
    }

    fn push_empty(&self) {
        self.push_rows(Vec::new());
    }

    fn push_failure(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(message.to_owned()));
    }

    fn calls(&self) -> Vec<Statement> {
        self.calls.lock().unwrap().clone()
    }

    fn next_reply(&self) -> Result<Vec<Row>, RedifyError> {
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(message)) => Err(RedifyError::Decode(message)),
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl GraphSession for ScriptedSession {
    async fn run(&self, statement: &Statement) -> Result<(), RedifyError> {
        self.calls.lock().unwrap().push(statement.clone());
        self.next_reply().map(|_| ())
    }

    async fn fetch_one(&self, statement: &Statement) -> Result<Option<Row>, RedifyError> {
        self.calls.lock().unwrap().push(statement.clone());
        Ok(self.next_reply()?.into_iter().next())
    }

    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Row>, RedifyError> {
        self.calls.lock().unwrap().push(statement.clone());
        self.next_reply()
    }
}

fn row(columns: &[(&str, GraphValue)]) -> Row {
    columns
        .iter()
        .map(|(alias, value)| (alias.to_string(), value.clone()))
        .collect()
}

fn count_row(alias: &str, count: i64) -> Row {
    row(&[(alias, GraphValue::Int(count))])
}

fn check_row(rel_count: i64) -> Row {
    row(&[
        ("node_id", GraphValue::Text("4:abc:0".into())),
        ("rel_count", GraphValue::Int(rel_count)),
    ])
}

fn rel_items(payloads: &[serde_json::Value]) -> Vec<RelationshipUpdateItem> {
    payloads
        .iter()
        .map(|p| serde_json::from_value(p.clone()).unwrap())
        .collect()
}

fn friend_item(node1: i64, node2: i64) -> serde_json::Value {
    json!({
        "label1": "Person", "node1_id": node1,
        "label2": "Person", "node2_id": node2,
        "rel_type": "FRIENDS",
        "friendship_kind": "close",
    })
}

// ---------------------------------------------------------------------------
// Validation happens before anything executes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn relationship_create_with_two_properties_never_executes() {
    let session = ScriptedSession::new();
    let rel = RelationshipRef {
        label1: "Person".into(),
        node1_id: "1".into(),
        label2: "Company".into(),
        node2_id: "100".into(),
        rel_type: "WORKS_AT".into(),
    };
    let props: serde_json::Map<String, serde_json::Value> =
        [("role", json!("dev")), ("since", json!(2018))]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

    let err = relationships::create_relationship(&session, &rel, &props)
        .await
        .unwrap_err();
    assert!(matches!(err, RedifyError::Validation(_)));
    assert!(session.calls().is_empty());
}

#[tokio::test]
async fn node_create_with_four_properties_never_executes() {
    let session = ScriptedSession::new();
    let props: serde_json::Map<String, serde_json::Value> = (0..4)
        .map(|i| (format!("p{i}"), json!(i)))
        .collect();

    let err = nodes::create_node_with_properties(&session, "User", &props)
        .await
        .unwrap_err();
    assert!(matches!(err, RedifyError::Validation(_)));
    assert!(session.calls().is_empty());
}

#[tokio::test]
async fn multi_label_create_requires_two_labels() {
    let session = ScriptedSession::new();
    let err = nodes::create_node_multi(&session, &["Person".into()])
        .await
        .unwrap_err();
    assert!(matches!(err, RedifyError::Validation(_)));
    assert!(session.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Bulk executor accounting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bulk_update_reports_missing_item_without_stopping() {
    let session = ScriptedSession::new();
    session.push_row(count_row("updatedCount", 1));
    session.push_row(count_row("updatedCount", 0)); // item 2: endpoint missing
    session.push_row(count_row("updatedCount", 1));

    let items = rel_items(&[friend_item(1, 2), friend_item(2, 999), friend_item(3, 4)]);
    let report = relationships::update_relationships_bulk(&session, &items).await;

    assert_eq!(report.applied_count(), 2);
    let errors = report.error_messages();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Person with id 2"));
    assert!(errors[0].contains("Person with id 999"));
    assert!(errors[0].contains("not found"));
    // All three items executed despite the middle failure.
    assert_eq!(session.calls().len(), 3);
}

#[tokio::test]
async fn bulk_update_records_engine_failure_and_continues() {
    let session = ScriptedSession::new();
    session.push_row(count_row("updatedCount", 1));
    session.push_failure("simulated engine failure");
    session.push_row(count_row("updatedCount", 1));

    let items = rel_items(&[friend_item(1, 2), friend_item(2, 3), friend_item(3, 4)]);
    let report = relationships::update_relationships_bulk(&session, &items).await;

    assert_eq!(report.applied_count(), 2);
    let errors = report.error_messages();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("simulated engine failure"));
    assert_eq!(session.calls().len(), 3);
}

#[tokio::test]
async fn bulk_item_with_bad_identifier_fails_alone() {
    let session = ScriptedSession::new();
    session.push_row(count_row("updatedCount", 1));

    let mut bad = friend_item(2, 3);
    bad["rel_type"] = json!("FRIENDS]->(x) DELETE x //");
    let items = rel_items(&[friend_item(1, 2), bad]);
    let report = relationships::update_relationships_bulk(&session, &items).await;

    assert_eq!(report.applied_count(), 1);
    assert_eq!(report.error_messages().len(), 1);
    // The poisoned item never reached the session.
    assert_eq!(session.calls().len(), 1);
}

#[tokio::test]
async fn bulk_removal_is_idempotent_over_matched_targets() {
    let session = ScriptedSession::new();
    // Both relationships still match even though the property is already
    // gone; removal of an absent property counts as an update.
    session.push_row(count_row("updatedCount", 1));
    session.push_row(count_row("updatedCount", 1));

    let items: Vec<RelationshipRemoveItem> = [
        json!({
            "label1": "Person", "node1_id": 1, "label2": "Company", "node2_id": 100,
            "rel_type": "WORKS_AT", "properties": ["role"]
        }),
        json!({
            "label1": "Person", "node1_id": 2, "label2": "Company", "node2_id": 101,
            "rel_type": "WORKS_AT", "properties": ["role"]
        }),
    ]
    .iter()
    .map(|p| serde_json::from_value(p.clone()).unwrap())
    .collect();

    let report = relationships::remove_relationships_bulk(&session, &items).await;
    assert_eq!(report.applied_count(), 2);
    assert!(report.error_messages().is_empty());
}

#[tokio::test]
async fn bulk_delete_counts_and_names_missing_relationships() {
    let session = ScriptedSession::new();
    session.push_row(count_row("deletedCount", 1));
    session.push_row(count_row("deletedCount", 0));

    let rels: Vec<RelationshipRef> = vec![
        serde_json::from_value(json!({
            "label1": "Person", "node1_id": 1, "label2": "Person", "node2_id": 2,
            "rel_type": "FRIENDS"
        }))
        .unwrap(),
        serde_json::from_value(json!({
            "label1": "Person", "node1_id": 2, "label2": "Company", "node2_id": 100,
            "rel_type": "WORKS_AT"
        }))
        .unwrap(),
    ];

    let report = relationships::delete_relationships_bulk(&session, &rels).await;
    assert_eq!(report.applied_count(), 1);
    let errors = report.error_messages();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("WORKS_AT"));
}

// ---------------------------------------------------------------------------
// Existence/relationship guard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_runs_only_after_a_clean_check() {
    let session = ScriptedSession::new();
    session.push_row(check_row(0));
    session.push_empty(); // the DELETE itself

    nodes::delete_node(&session, "Person", "7").await.unwrap();

    let calls = session.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].text().contains("OPTIONAL MATCH (n)-[r]-()"));
    assert!(calls[1].text().contains("DELETE n"));
    assert_eq!(calls[1].parameters()["node_id"], GraphValue::Int(7));
}

#[tokio::test]
async fn blocked_node_issues_no_delete_statement() {
    let session = ScriptedSession::new();
    session.push_row(check_row(3));

    let err = nodes::delete_node(&session, "Person", "7").await.unwrap_err();
    assert!(matches!(
        err,
        RedifyError::HasRelationships { count: 3, .. }
    ));
    assert_eq!(session.calls().len(), 1);
}

#[tokio::test]
async fn missing_node_reports_not_found() {
    let session = ScriptedSession::new();
    session.push_empty();

    let err = nodes::delete_node(&session, "Person", "7").await.unwrap_err();
    assert!(matches!(err, RedifyError::NotFound(_)));
    assert_eq!(session.calls().len(), 1);
}

#[tokio::test]
async fn bulk_delete_with_checks_accumulates_mixed_outcomes() {
    let session = ScriptedSession::new();
    session.push_row(check_row(0));
    session.push_empty(); // delete for key 1
    session.push_empty(); // check for key 2: missing
    session.push_row(check_row(2)); // check for key 3: blocked

    let report = nodes::delete_nodes_with_checks(
        &session,
        "Person",
        &["1".into(), "2".into(), "3".into()],
    )
    .await
    .unwrap();

    assert_eq!(report.applied_count(), 1);
    let errors = report.error_messages();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("id 2"));
    assert!(errors[0].contains("not found"));
    assert!(errors[1].contains("id 3"));
    assert!(errors[1].contains("incident relationship"));
}

#[tokio::test]
async fn mixed_key_list_stays_string_typed_per_item() {
    let session = ScriptedSession::new();
    session.push_empty();
    session.push_empty();

    nodes::delete_nodes_with_checks(&session, "Person", &["1".into(), "x".into()])
        .await
        .unwrap();

    let calls = session.calls();
    // All-or-nothing: "1" must not become an integer when a sibling key
    // fails to parse.
    assert_eq!(calls[0].parameters()["node_id"], GraphValue::Text("1".into()));
    assert_eq!(calls[1].parameters()["node_id"], GraphValue::Text("x".into()));
}

// ---------------------------------------------------------------------------
// Bulk node property mutations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bulk_property_update_passes_bag_and_typed_keys() {
    let session = ScriptedSession::new();
    session.push_row(count_row("updatedCount", 3));

    let props: serde_json::Map<String, serde_json::Value> =
        [("age", json!(35)), ("active", json!(true))]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
    let updated = nodes::update_nodes_properties(
        &session,
        "User",
        &["1".into(), "2".into(), "3".into()],
        &props,
    )
    .await
    .unwrap();

    assert_eq!(updated, 3);
    let calls = session.calls();
    assert!(calls[0].text().contains("WHERE n.id IN $node_ids"));
    assert!(calls[0].text().contains("SET n += $props"));
    assert_eq!(
        calls[0].parameters()["node_ids"],
        GraphValue::from(vec![1i64, 2, 3])
    );
}

#[tokio::test]
async fn repeated_property_removal_still_counts_matches() {
    let session = ScriptedSession::new();
    session.push_row(count_row("updatedCount", 2));
    session.push_row(count_row("updatedCount", 2));

    for _ in 0..2 {
        let updated = nodes::remove_nodes_properties(
            &session,
            "Person",
            &["1".into(), "2".into()],
            &["age".into(), "occupation".into()],
        )
        .await
        .unwrap();
        assert_eq!(updated, 2);
    }
}

// ---------------------------------------------------------------------------
// Create → search scenario
// ---------------------------------------------------------------------------

#[tokio::test]
async fn created_node_comes_back_from_search_with_types_preserved() {
    let session = ScriptedSession::new();

    let stored_properties: Vec<(&str, GraphValue)> = vec![
        ("id", GraphValue::Int(1)),
        ("name", GraphValue::Text("Ada".into())),
        ("age", GraphValue::Int(36)),
        (
            "date_joined",
            GraphValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
        ),
        ("active", GraphValue::Bool(true)),
    ];
    let node_bag = GraphValue::Map(
        stored_properties
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
    );
    let person_row = row(&[
        ("node_id", GraphValue::Text("4:abc:1".into())),
        (
            "labels",
            GraphValue::List(vec![GraphValue::Text("Person".into())]),
        ),
        ("node", node_bag),
    ]);

    session.push_row(person_row.clone());
    let props: serde_json::Map<String, serde_json::Value> = [
        ("id", json!(1)),
        ("name", json!("Ada")),
        ("age", json!(36)),
        ("date_joined", json!("2024-01-01")),
        ("active", json!(true)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    let created = nodes::create_node_with_properties(&session, "Person", &props)
        .await
        .unwrap();
    assert_eq!(created.labels, vec!["Person"]);

    session.push_row(person_row);
    let filters: FilterSpec = serde_json::from_value(json!({
        "age": { "operator": ">=", "value": 18 }
    }))
    .unwrap();
    let found = nodes::search_nodes(&session, &["Person".into()], &filters, None)
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    let record = &found[0];
    assert_eq!(record.properties["age"], GraphValue::Int(36));
    assert_eq!(
        record.properties["date_joined"].to_json(),
        json!("2024-01-01")
    );

    let calls = session.calls();
    let search = &calls[1];
    assert!(search.text().contains("MATCH (n:Person) WHERE n.age >= $age"));
    assert_eq!(search.parameters()["age"], GraphValue::Int(18));
    assert_eq!(search.parameters()["limit"], GraphValue::Int(100));
}

#[tokio::test]
async fn aggregate_over_empty_label_yields_nulls() {
    let session = ScriptedSession::new();
    session.push_row(row(&[
        ("count", GraphValue::Int(0)),
        ("avg", GraphValue::Null),
        ("max", GraphValue::Null),
        ("min", GraphValue::Null),
        ("sum", GraphValue::Int(0)),
    ]));

    let report = nodes::aggregate_nodes(&session, "Person", "age").await.unwrap();
    assert_eq!(report.count, 0);
    assert_eq!(report.avg, GraphValue::Null);
    assert_eq!(serde_json::to_value(&report.max).unwrap(), json!(null));
}

#[tokio::test]
async fn single_relationship_update_maps_absence_to_not_found() {
    let session = ScriptedSession::new();
    session.push_empty();

    let rel: RelationshipRef = serde_json::from_value(json!({
        "label1": "Person", "node1_id": 1, "label2": "Company", "node2_id": 100,
        "rel_type": "WORKS_AT"
    }))
    .unwrap();
    let props: serde_json::Map<String, serde_json::Value> =
        [("role".to_string(), json!("dev"))].into_iter().collect();

    let err = relationships::update_relationship(&session, &rel, &props)
        .await
        .unwrap_err();
    assert!(matches!(err, RedifyError::NotFound(_)));
}
