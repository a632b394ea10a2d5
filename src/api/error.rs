use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::service::ServiceError;

pub const MSG_MISSING_FIELDS: &str = "Todos os campos são obrigatórios.";
pub const MSG_SLOT_NOT_ALLOWED: &str =
    "O horário informado não está dentro do intervalo permitido pelo restaurante (08:00 - 22:00).";
pub const MSG_CONFLICT: &str = "A mesa já está reservada em um horário próximo.";
pub const MSG_MISSING_NAME: &str = "Nome do cliente é obrigatório.";
pub const MSG_MISSING_SLOT: &str = "Mesa, data e horário são obrigatórios.";
pub const MSG_MISSING_ID: &str = "ID da reserva é obrigatório.";
pub const MSG_NOT_FOUND: &str = "Reserva não encontrada.";
pub const MSG_INVALID_TABLE: &str = "Mesa inválida.";
pub const MSG_INVALID_DATE: &str = "Data inválida.";
pub const MSG_INVALID_BODY: &str = "Corpo da requisição inválido.";
pub const MSG_INVALID_QUERY: &str = "Parâmetros da consulta inválidos.";

/// The operation a request performs. Picks the generic 500 message and
/// labels metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Create,
    List,
    ListByCustomer,
    StatusByTable,
    Availability,
    Update,
    Delete,
}

impl Op {
    pub fn label(self) -> &'static str {
        match self {
            Op::Create => "create",
            Op::List => "list",
            Op::ListByCustomer => "list_by_customer",
            Op::StatusByTable => "status_by_table",
            Op::Availability => "availability",
            Op::Update => "update",
            Op::Delete => "delete",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            Op::Create => "Erro ao criar reserva.",
            Op::List => "Erro ao buscar reservas.",
            Op::ListByCustomer => "Erro ao buscar reservas do cliente.",
            Op::StatusByTable => "Erro ao buscar reservas da mesa.",
            Op::Availability => "Erro ao verificar disponibilidade.",
            Op::Update => "Erro ao atualizar reserva.",
            Op::Delete => "Erro ao deletar reserva.",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Map a service failure for `op`. Storage failures are logged here and
    /// reported with the operation's generic message only.
    pub fn from_service(op: Op, err: ServiceError) -> Self {
        match err {
            ServiceError::MissingFields => Self::bad_request(MSG_MISSING_FIELDS),
            ServiceError::MissingName => Self::bad_request(MSG_MISSING_NAME),
            ServiceError::MissingSlot => Self::bad_request(MSG_MISSING_SLOT),
            ServiceError::MissingId => Self::bad_request(MSG_MISSING_ID),
            ServiceError::SlotNotAllowed(_) => Self::bad_request(MSG_SLOT_NOT_ALLOWED),
            ServiceError::InvalidTable(_) => Self::bad_request(MSG_INVALID_TABLE),
            ServiceError::InvalidDate(_) => Self::bad_request(MSG_INVALID_DATE),
            ServiceError::InvalidField(field) => Self::bad_request(field_message(field)),
            ServiceError::Conflict { .. } => Self::bad_request(MSG_CONFLICT),
            ServiceError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, MSG_NOT_FOUND),
            ServiceError::Storage(e) => {
                tracing::error!(op = op.label(), error = %e, "reservation storage failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, op.failure_message())
            }
        }
    }

    pub fn invalid_body(rejection: JsonRejection) -> Self {
        tracing::debug!("rejected request body: {rejection}");
        Self::bad_request(MSG_INVALID_BODY)
    }

    pub fn invalid_query(rejection: QueryRejection) -> Self {
        tracing::debug!("rejected query string: {rejection}");
        Self::bad_request(MSG_INVALID_QUERY)
    }
}

fn field_message(field: &str) -> String {
    match field {
        "name" => "O nome deve ter entre 3 e 200 caracteres.".into(),
        "table" => MSG_INVALID_TABLE.into(),
        "contact" => "Contato inválido.".into(),
        "time" => "Horário inválido, use o formato HH:mm.".into(),
        other => format!("Campo inválido: {other}."),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(MessageBody {
                message: self.message,
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
