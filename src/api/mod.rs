//! HTTP surface for reservations.
//!
//! | Path | Method | Operation |
//! |------|--------|-----------|
//! | /reserva | POST | create |
//! | /reserva | GET | list all |
//! | /reserva/cliente | GET | list by customer name |
//! | /reserva/mesa | GET | status of a table slot |
//! | /reserva/disponibilidade | GET | availability of a table slot |
//! | /reserva/{id} | PUT | update |
//! | /reserva/{id} | DELETE | delete |
//! | /health | GET | liveness |

pub mod error;
pub mod handler;

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::http::Method;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::engine::Engine;
use crate::observability;
use crate::service::ReservationService;

use error::Op;

#[derive(Clone)]
pub struct AppState {
    pub service: ReservationService,
}

impl AppState {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            service: ReservationService::new(engine),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(reservation_routes())
        .route("/health", get(handler::health))
        .layer(middleware::from_fn(track_request))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn reservation_routes() -> Router<AppState> {
    Router::new()
        .route("/reserva", get(handler::list).post(handler::create))
        .route(
            "/reserva/",
            put(handler::update_without_id).delete(handler::delete_without_id),
        )
        .route("/reserva/cliente", get(handler::list_by_customer))
        .route("/reserva/mesa", get(handler::status_by_table))
        .route("/reserva/disponibilidade", get(handler::availability))
        .route("/reserva/{id}", put(handler::update).delete(handler::delete))
}

fn op_for(method: &Method, path: &str) -> Option<Op> {
    let op = match (method.as_str(), path) {
        ("POST", "/reserva") => Op::Create,
        ("GET", "/reserva") => Op::List,
        ("GET", "/reserva/cliente") => Op::ListByCustomer,
        ("GET", "/reserva/mesa") => Op::StatusByTable,
        ("GET", "/reserva/disponibilidade") => Op::Availability,
        ("PUT", "/reserva/{id}" | "/reserva/") => Op::Update,
        ("DELETE", "/reserva/{id}" | "/reserva/") => Op::Delete,
        _ => return None,
    };
    Some(op)
}

/// Request count and latency per reservation operation.
async fn track_request(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let op = req
        .extensions()
        .get::<MatchedPath>()
        .and_then(|p| op_for(req.method(), p.as_str()));
    let response = next.run(req).await;
    if let Some(op) = op {
        observability::record_request(op.label(), response.status().as_u16(), started);
    }
    response
}
