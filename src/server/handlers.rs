//! Request handlers and their payload shapes.
//!
//! Payload structs mirror the operation inputs one-to-one; handlers do
//! not build queries or inspect rows. Response messages keep the
//! original API's "message plus payload" shape.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::model::{
    key_string, AggregateReport, CreatedNode, NodeRecord, RelationshipRecord, RelationshipRef,
    RelationshipRemoveItem, RelationshipUpdateItem,
};
use crate::ops::{bulk::BulkReport, nodes, relationships};
use crate::query::filter::FilterSpec;
use crate::server::{AppError, SharedSession};

type HandlerResult<T> = Result<Json<T>, AppError>;

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct HealthResponse {
    status: &'static str,
}

pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// ---------------------------------------------------------------------------
// Node creation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct CreateSingleLabelRequest {
    label: String,
}

#[derive(Debug, Serialize)]
pub(super) struct CreatedNodeResponse {
    message: &'static str,
    node: CreatedNode,
}

pub(super) async fn create_node_single_label(
    State(session): State<SharedSession>,
    Json(payload): Json<CreateSingleLabelRequest>,
) -> HandlerResult<CreatedNodeResponse> {
    let node = nodes::create_node(session.as_ref(), &payload.label).await?;
    Ok(Json(CreatedNodeResponse {
        message: "node created",
        node,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateMultipleLabelsRequest {
    #[serde(default)]
    labels: Vec<String>,
}

pub(super) async fn create_node_multiple_labels(
    State(session): State<SharedSession>,
    Json(payload): Json<CreateMultipleLabelsRequest>,
) -> HandlerResult<CreatedNodeResponse> {
    let node = nodes::create_node_multi(session.as_ref(), &payload.labels).await?;
    Ok(Json(CreatedNodeResponse {
        message: "node with multiple labels created",
        node,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateWithPropertiesRequest {
    label: String,
    properties: serde_json::Map<String, JsonValue>,
}

#[derive(Debug, Serialize)]
pub(super) struct NodeResponse {
    message: &'static str,
    node: NodeRecord,
}

pub(super) async fn create_node_with_properties(
    State(session): State<SharedSession>,
    Json(payload): Json<CreateWithPropertiesRequest>,
) -> HandlerResult<NodeResponse> {
    let node =
        nodes::create_node_with_properties(session.as_ref(), &payload.label, &payload.properties)
            .await?;
    Ok(Json(NodeResponse {
        message: "node with properties created",
        node,
    }))
}

// ---------------------------------------------------------------------------
// Node retrieval
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct GetSingleNodeRequest {
    label: String,
    #[serde(deserialize_with = "key_string")]
    node_id: String,
}

pub(super) async fn get_single_node(
    State(session): State<SharedSession>,
    Json(payload): Json<GetSingleNodeRequest>,
) -> HandlerResult<NodeResponse> {
    let node = nodes::get_node(session.as_ref(), &payload.label, &payload.node_id).await?;
    Ok(Json(NodeResponse {
        message: "node found",
        node,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchNodesRequest {
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    filters: FilterSpec,
    #[serde(default)]
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct SearchNodesResponse {
    message: String,
    nodes: Vec<NodeRecord>,
}

pub(super) async fn search_nodes(
    State(session): State<SharedSession>,
    Json(payload): Json<SearchNodesRequest>,
) -> HandlerResult<SearchNodesResponse> {
    let found = nodes::search_nodes(
        session.as_ref(),
        &payload.labels,
        &payload.filters,
        payload.limit,
    )
    .await?;
    Ok(Json(SearchNodesResponse {
        message: format!("found {} node(s)", found.len()),
        nodes: found,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct AggregateRequest {
    label: String,
    property: String,
}

#[derive(Debug, Serialize)]
pub(super) struct AggregateResponse {
    message: String,
    #[serde(flatten)]
    report: AggregateReport,
}

pub(super) async fn aggregate_nodes(
    State(session): State<SharedSession>,
    Json(payload): Json<AggregateRequest>,
) -> HandlerResult<AggregateResponse> {
    let report =
        nodes::aggregate_nodes(session.as_ref(), &payload.label, &payload.property).await?;
    Ok(Json(AggregateResponse {
        message: format!(
            "aggregates for label '{}' over property '{}'",
            payload.label, payload.property
        ),
        report,
    }))
}

// ---------------------------------------------------------------------------
// Node property updates
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct UpdateNodeRequest {
    label: String,
    #[serde(deserialize_with = "key_string")]
    node_id: String,
    properties: serde_json::Map<String, JsonValue>,
}

pub(super) async fn update_node_properties(
    State(session): State<SharedSession>,
    Json(payload): Json<UpdateNodeRequest>,
) -> HandlerResult<NodeResponse> {
    let node = nodes::update_node_properties(
        session.as_ref(),
        &payload.label,
        &payload.node_id,
        &payload.properties,
    )
    .await?;
    Ok(Json(NodeResponse {
        message: "node updated",
        node,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateMultipleNodesRequest {
    node_ids: Vec<String>,
    label: String,
    properties: serde_json::Map<String, JsonValue>,
}

#[derive(Debug, Serialize)]
pub(super) struct UpdatedCountResponse {
    message: &'static str,
    #[serde(rename = "updatedCount")]
    updated_count: u64,
}

pub(super) async fn update_multiple_nodes_properties(
    State(session): State<SharedSession>,
    Json(payload): Json<UpdateMultipleNodesRequest>,
) -> HandlerResult<UpdatedCountResponse> {
    let updated = nodes::update_nodes_properties(
        session.as_ref(),
        &payload.label,
        &payload.node_ids,
        &payload.properties,
    )
    .await?;
    Ok(Json(UpdatedCountResponse {
        message: "nodes updated",
        updated_count: updated,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct RemoveNodePropertiesRequest {
    label: String,
    #[serde(deserialize_with = "key_string")]
    node_id: String,
    properties: Vec<String>,
}

pub(super) async fn remove_node_properties(
    State(session): State<SharedSession>,
    Json(payload): Json<RemoveNodePropertiesRequest>,
) -> HandlerResult<NodeResponse> {
    let node = nodes::remove_node_properties(
        session.as_ref(),
        &payload.label,
        &payload.node_id,
        &payload.properties,
    )
    .await?;
    Ok(Json(NodeResponse {
        message: "properties removed",
        node,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct RemoveMultipleNodesPropertiesRequest {
    node_ids: Vec<String>,
    label: String,
    properties: Vec<String>,
}

pub(super) async fn remove_multiple_nodes_properties(
    State(session): State<SharedSession>,
    Json(payload): Json<RemoveMultipleNodesPropertiesRequest>,
) -> HandlerResult<UpdatedCountResponse> {
    let updated = nodes::remove_nodes_properties(
        session.as_ref(),
        &payload.label,
        &payload.node_ids,
        &payload.properties,
    )
    .await?;
    Ok(Json(UpdatedCountResponse {
        message: "properties removed from nodes",
        updated_count: updated,
    }))
}

// ---------------------------------------------------------------------------
// Node deletion
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct DeleteSingleNodeRequest {
    label: String,
    #[serde(deserialize_with = "key_string")]
    node_id: String,
}

#[derive(Debug, Serialize)]
pub(super) struct DeletedCountResponse {
    message: &'static str,
    #[serde(rename = "deletedCount")]
    deleted_count: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

pub(super) async fn delete_single_node(
    State(session): State<SharedSession>,
    Json(payload): Json<DeleteSingleNodeRequest>,
) -> HandlerResult<DeletedCountResponse> {
    nodes::delete_node(session.as_ref(), &payload.label, &payload.node_id).await?;
    Ok(Json(DeletedCountResponse {
        message: "node deleted",
        deleted_count: 1,
        errors: Vec::new(),
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct DeleteMultipleNodesRequest {
    label: String,
    node_ids: Vec<String>,
}

pub(super) async fn delete_multiple_nodes(
    State(session): State<SharedSession>,
    Json(payload): Json<DeleteMultipleNodesRequest>,
) -> HandlerResult<DeletedCountResponse> {
    let report =
        nodes::delete_nodes_with_checks(session.as_ref(), &payload.label, &payload.node_ids)
            .await?;
    Ok(Json(DeletedCountResponse {
        message: "delete pass completed",
        deleted_count: report.applied_count(),
        errors: report.error_messages(),
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct DeleteByLabelRequest {
    label: String,
}

pub(super) async fn delete_nodes_by_label(
    State(session): State<SharedSession>,
    Json(payload): Json<DeleteByLabelRequest>,
) -> HandlerResult<DeletedCountResponse> {
    let deleted = nodes::delete_nodes_by_label(session.as_ref(), &payload.label).await?;
    Ok(Json(DeletedCountResponse {
        message: "nodes deleted",
        deleted_count: deleted,
        errors: Vec::new(),
    }))
}

// ---------------------------------------------------------------------------
// Relationships
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct CreateRelationshipRequest {
    #[serde(flatten)]
    rel: RelationshipRef,
    properties: serde_json::Map<String, JsonValue>,
}

#[derive(Debug, Serialize)]
pub(super) struct RelationshipResponse {
    message: &'static str,
    relationship: RelationshipRecord,
}

pub(super) async fn create_relationship(
    State(session): State<SharedSession>,
    Json(payload): Json<CreateRelationshipRequest>,
) -> HandlerResult<RelationshipResponse> {
    let relationship =
        relationships::create_relationship(session.as_ref(), &payload.rel, &payload.properties)
            .await?;
    Ok(Json(RelationshipResponse {
        message: "relationship created",
        relationship,
    }))
}

pub(super) async fn update_single_relationship(
    State(session): State<SharedSession>,
    Json(payload): Json<CreateRelationshipRequest>,
) -> HandlerResult<RelationshipResponse> {
    let relationship =
        relationships::update_relationship(session.as_ref(), &payload.rel, &payload.properties)
            .await?;
    Ok(Json(RelationshipResponse {
        message: "relationship updated",
        relationship,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct RelationshipsByTypeUpdateRequest {
    rel_type: String,
    properties: serde_json::Map<String, JsonValue>,
}

pub(super) async fn update_relationships_by_type(
    State(session): State<SharedSession>,
    Json(payload): Json<RelationshipsByTypeUpdateRequest>,
) -> HandlerResult<UpdatedCountResponse> {
    let updated = relationships::update_relationships_by_type(
        session.as_ref(),
        &payload.rel_type,
        &payload.properties,
    )
    .await?;
    Ok(Json(UpdatedCountResponse {
        message: "relationships updated",
        updated_count: updated,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct RemoveRelationshipPropertiesRequest {
    #[serde(flatten)]
    rel: RelationshipRef,
    properties: Vec<String>,
}

pub(super) async fn remove_single_relationship_properties(
    State(session): State<SharedSession>,
    Json(payload): Json<RemoveRelationshipPropertiesRequest>,
) -> HandlerResult<RelationshipResponse> {
    let relationship = relationships::remove_relationship_properties(
        session.as_ref(),
        &payload.rel,
        &payload.properties,
    )
    .await?;
    Ok(Json(RelationshipResponse {
        message: "relationship properties removed",
        relationship,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct RelationshipsByTypeRemoveRequest {
    rel_type: String,
    properties: Vec<String>,
}

pub(super) async fn remove_relationships_by_type(
    State(session): State<SharedSession>,
    Json(payload): Json<RelationshipsByTypeRemoveRequest>,
) -> HandlerResult<UpdatedCountResponse> {
    let updated = relationships::remove_relationships_by_type(
        session.as_ref(),
        &payload.rel_type,
        &payload.properties,
    )
    .await?;
    Ok(Json(UpdatedCountResponse {
        message: "relationship properties removed",
        updated_count: updated,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct BulkUpdateRelationshipsRequest {
    relationships: Vec<RelationshipUpdateItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct BulkCountResponse {
    message: &'static str,
    #[serde(rename = "updatedCount")]
    updated_count: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

impl BulkCountResponse {
    fn from_report(report: &BulkReport) -> Self {
        Self {
            message: "batch completed",
            updated_count: report.applied_count(),
            errors: report.error_messages(),
        }
    }
}

pub(super) async fn update_relationships_bulk(
    State(session): State<SharedSession>,
    Json(payload): Json<BulkUpdateRelationshipsRequest>,
) -> HandlerResult<BulkCountResponse> {
    let report =
        relationships::update_relationships_bulk(session.as_ref(), &payload.relationships).await;
    Ok(Json(BulkCountResponse::from_report(&report)))
}

#[derive(Debug, Deserialize)]
pub(super) struct BulkRemoveRelationshipsRequest {
    relationships: Vec<RelationshipRemoveItem>,
}

pub(super) async fn remove_relationships_bulk(
    State(session): State<SharedSession>,
    Json(payload): Json<BulkRemoveRelationshipsRequest>,
) -> HandlerResult<BulkCountResponse> {
    let report =
        relationships::remove_relationships_bulk(session.as_ref(), &payload.relationships).await;
    Ok(Json(BulkCountResponse::from_report(&report)))
}

#[derive(Debug, Deserialize)]
pub(super) struct BulkDeleteRelationshipsRequest {
    relationships: Vec<RelationshipRef>,
}

pub(super) async fn delete_relationships_bulk(
    State(session): State<SharedSession>,
    Json(payload): Json<BulkDeleteRelationshipsRequest>,
) -> HandlerResult<DeletedCountResponse> {
    let report =
        relationships::delete_relationships_bulk(session.as_ref(), &payload.relationships).await;
    Ok(Json(DeletedCountResponse {
        message: "batch completed",
        deleted_count: report.applied_count(),
        errors: report.error_messages(),
    }))
}
