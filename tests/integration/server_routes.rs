#![allow(missing_docs)]

//! Route-level tests: the full router mounted over a scripted session.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use chrono::NaiveDate;
use redify::engine::{GraphSession, Row};
use redify::query::Statement;
use redify::server::build_router;
use redify::{GraphValue, RedifyError};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

#[derive(Default)]
struct ScriptedSession {
    calls: Mutex<Vec<Statement>>,
    replies: Mutex<VecDeque<Result<Vec<Row>, String>>>,
}

impl ScriptedSession {
    fn push_rows(&self, rows: Vec<Row>) {
        self.replies.lock().unwrap().push_back(Ok(rows));
    }

    fn push_row(&self, row: Row) {
        self.push_rows(vec![row]);
    }

    fn push_empty(&self) {
        self.push_rows(Vec::new());
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

fn request(method: &str, uri: &str, body: JsonValue) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> JsonValue {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn router_over(session: Arc<ScriptedSession>) -> axum::Router {
    build_router(session, &[])
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = router_over(Arc::new(ScriptedSession::default()));
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = router_over(Arc::new(ScriptedSession::default()));
    let response = app
        .oneshot(request("POST", "/api/nodes/no-such-op", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn too_few_properties_is_a_bad_request() {
    let session = Arc::new(ScriptedSession::default());
    let app = router_over(session.clone());
    let response = app
        .oneshot(request(
            "POST",
            "/api/nodes/create-with-properties",
            json!({"label": "User", "properties": {"a": 1, "b": 2, "c": 3, "d": 4}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("at least 5"));
    assert!(session.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn injection_shaped_label_is_a_bad_request() {
    let app = router_over(Arc::new(ScriptedSession::default()));
    let response = app
        .oneshot(request(
            "POST",
            "/api/nodes/create-single-label",
            json!({"label": "Person) DETACH DELETE (m"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_operator_is_rejected_client_side() {
    let app = router_over(Arc::new(ScriptedSession::default()));
    let response = app
        .oneshot(request(
            "POST",
            "/api/nodes/search",
            json!({"filters": {"age": {"operator": "~", "value": 1}}}),
        ))
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn search_preserves_property_types_in_json() {
    let session = Arc::new(ScriptedSession::default());
    session.push_row(row(&[
        ("node_id", GraphValue::Text("4:abc:1".into())),
        (
            "labels",
            GraphValue::List(vec![GraphValue::Text("Person".into())]),
        ),
        (
            "node",
            GraphValue::Map(
                [
                    ("age".to_string(), GraphValue::Int(36)),
                    (
                        "date_joined".to_string(),
                        GraphValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
                    ),
                    ("score".to_string(), GraphValue::Float(3.5)),
                ]
                .into_iter()
                .collect(),
            ),
        ),
    ]));

    let app = router_over(session);
    let response = app
        .oneshot(request(
            "POST",
            "/api/nodes/search",
            json!({
                "labels": ["Person"],
                "filters": {"age": {"operator": ">=", "value": 18}},
                "limit": 50
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["message"], json!("found 1 node(s)"));
    let node = &body["nodes"][0];
    assert_eq!(node["properties"]["age"], json!(36));
    assert_eq!(node["properties"]["score"], json!(3.5));
    assert_eq!(node["properties"]["date_joined"], json!("2024-01-01"));
}

#[tokio::test]
async fn blocked_delete_maps_to_conflict() {
    let session = Arc::new(ScriptedSession::default());
    session.push_row(row(&[
        ("node_id", GraphValue::Text("4:abc:0".into())),
        ("rel_count", GraphValue::Int(2)),
    ]));

    let app = router_over(session.clone());
    let response = app
        .oneshot(request(
            "DELETE",
            "/api/nodes/delete-single",
            json!({"label": "Person", "node_id": "7"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    // Only the guard query ran; no delete statement was issued.
    assert_eq!(session.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_node_maps_to_not_found() {
    let session = Arc::new(ScriptedSession::default());
    session.push_empty();

    let app = router_over(session);
    let response = app
        .oneshot(request(
            "POST",
            "/api/nodes/get-single",
            json!({"label": "Person", "node_id": 7}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bulk_update_reports_partial_failure_in_body() {
    let session = Arc::new(ScriptedSession::default());
    session.push_row(row(&[("updatedCount", GraphValue::Int(1))]));
    session.push_row(row(&[("updatedCount", GraphValue::Int(0))]));
    session.push_row(row(&[("updatedCount", GraphValue::Int(1))]));

    let item = |a: i64, b: i64| {
        json!({
            "label1": "Person", "node1_id": a,
            "label2": "Person", "node2_id": b,
            "rel_type": "FRIENDS",
            "friendship_kind": "close"
        })
    };
    let app = router_over(session);
    let response = app
        .oneshot(request(
            "PUT",
            "/api/relationships/update-bulk",
            json!({"relationships": [item(1, 2), item(2, 999), item(3, 4)]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["updatedCount"], json!(2));
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].as_str().unwrap().contains("Person with id 999"));
}

#[tokio::test]
async fn bulk_response_omits_errors_when_clean() {
    let session = Arc::new(ScriptedSession::default());
    session.push_row(row(&[("deletedCount", GraphValue::Int(1))]));

    let app = router_over(session);
    let response = app
        .oneshot(request(
            "DELETE",
            "/api/relationships/delete-bulk",
            json!({"relationships": [{
                "label1": "Person", "node1_id": 1,
                "label2": "Person", "node2_id": 2,
                "rel_type": "FRIENDS"
            }]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["deletedCount"], json!(1));
    assert!(body.get("errors").is_none());
}

#[tokio::test]
async fn engine_failure_maps_to_internal_error() {
    let session = Arc::new(ScriptedSession::default());
    session
        .replies
        .lock()
        .unwrap()
        .push_back(Err("connection reset".into()));

    let app = router_over(session);
    let response = app
        .oneshot(request(
            "POST",
            "/api/nodes/aggregate",
            json!({"label": "Person", "property": "age"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
