//! Reservation HTTP handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Serialize;

use super::AppState;
use super::error::{ApiError, ApiResult, MessageBody, Op};
use crate::model::{Reservation, Status};
use crate::service::{CustomerQuery, ReservationPayload, SlotQuery};

pub const MSG_DELETED: &str = "Reserva deletada e a mesa foi liberada.";

#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub status: Status,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload.map(|Json(p)| p).map_err(ApiError::invalid_body)
}

fn query<T>(params: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    params.map(|Query(q)| q).map_err(ApiError::invalid_query)
}

/// POST /reserva
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<ReservationPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Reservation>)> {
    let reservation = state
        .service
        .create(body(payload)?)
        .await
        .map_err(|e| ApiError::from_service(Op::Create, e))?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// GET /reserva
pub async fn list(State(state): State<AppState>) -> Json<Vec<Reservation>> {
    Json(state.service.list().await)
}

/// GET /reserva/cliente?name=
pub async fn list_by_customer(
    State(state): State<AppState>,
    params: Result<Query<CustomerQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Reservation>>> {
    let found = state
        .service
        .list_by_customer(&query(params)?)
        .await
        .map_err(|e| ApiError::from_service(Op::ListByCustomer, e))?;
    Ok(Json(found))
}

/// GET /reserva/mesa?table=&date=&time=
pub async fn status_by_table(
    State(state): State<AppState>,
    params: Result<Query<SlotQuery>, QueryRejection>,
) -> ApiResult<Json<StatusBody>> {
    let status = state
        .service
        .status_by_table(&query(params)?)
        .await
        .map_err(|e| ApiError::from_service(Op::StatusByTable, e))?;
    Ok(Json(StatusBody { status }))
}

/// GET /reserva/disponibilidade?table=&date=&time=
pub async fn availability(
    State(state): State<AppState>,
    params: Result<Query<SlotQuery>, QueryRejection>,
) -> ApiResult<Json<StatusBody>> {
    let status = state
        .service
        .availability(&query(params)?)
        .await
        .map_err(|e| ApiError::from_service(Op::Availability, e))?;
    Ok(Json(StatusBody { status }))
}

/// PUT /reserva/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ReservationPayload>, JsonRejection>,
) -> ApiResult<Json<Reservation>> {
    update_inner(state, Some(id), payload).await
}

/// PUT /reserva/ with the id left out
pub async fn update_without_id(
    State(state): State<AppState>,
    payload: Result<Json<ReservationPayload>, JsonRejection>,
) -> ApiResult<Json<Reservation>> {
    update_inner(state, None, payload).await
}

async fn update_inner(
    state: AppState,
    id: Option<String>,
    payload: Result<Json<ReservationPayload>, JsonRejection>,
) -> ApiResult<Json<Reservation>> {
    let reservation = state
        .service
        .update(id.as_deref(), body(payload)?)
        .await
        .map_err(|e| ApiError::from_service(Op::Update, e))?;
    Ok(Json(reservation))
}

/// DELETE /reserva/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageBody>> {
    delete_inner(state, Some(id)).await
}

/// DELETE /reserva/ with the id left out
pub async fn delete_without_id(State(state): State<AppState>) -> ApiResult<Json<MessageBody>> {
    delete_inner(state, None).await
}

async fn delete_inner(state: AppState, id: Option<String>) -> ApiResult<Json<MessageBody>> {
    state
        .service
        .delete(id.as_deref())
        .await
        .map_err(|e| ApiError::from_service(Op::Delete, e))?;
    Ok(Json(MessageBody {
        message: MSG_DELETED.to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
}

/// GET /health
pub async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}
