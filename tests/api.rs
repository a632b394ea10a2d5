use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use mesas::api::{self, AppState};
use mesas::engine::Engine;

fn test_wal_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("mesas_test_api");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let _ = std::fs::remove_file(&path);
    path
}

fn app(name: &str) -> Router {
    let engine = Arc::new(Engine::new(test_wal_path(name)).unwrap());
    api::router(AppState::new(engine))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn reservation(table: u32, date: &str, time: &str) -> Value {
    json!({
        "nome": "Maria Silva",
        "mesa": table,
        "status": "Reservado",
        "data": date,
        "contato": "maria@example.com",
        "horario": time,
    })
}

#[tokio::test]
async fn lunch_scenario() {
    let app = app("lunch.wal");

    let (status, first) = send(&app, Method::POST, "/reserva", Some(reservation(5, "2025-01-10", "12:00"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["status"], "Reservado");
    assert_eq!(first["table"], 5);
    assert_eq!(first["date"], "2025-01-10");

    let (status, body) = send(&app, Method::POST, "/reserva", Some(reservation(5, "2025-01-10", "12:30"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "O horário informado não está dentro do intervalo permitido pelo restaurante (08:00 - 22:00)."
    );

    let (status, body) = send(&app, Method::POST, "/reserva", Some(reservation(5, "2025-01-10", "13:00"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "A mesa já está reservada em um horário próximo.");

    let (status, _) = send(&app, Method::POST, "/reserva", Some(reservation(5, "2025-01-10", "14:00"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::GET,
        "/reserva/disponibilidade?mesa=5&data=2025-01-10&horario=13:00",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "Disponível" }));

    let (status, body) = send(
        &app,
        Method::GET,
        "/reserva/mesa?table=5&date=2025-01-10&time=12:00",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "Reservado" }));

    let (status, list) = send(&app, Method::GET, "/reserva", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn off_hours_are_rejected() {
    let app = app("off_hours.wal");
    for time in ["07:30", "23:00"] {
        let (status, body) = send(&app, Method::POST, "/reserva", Some(reservation(3, "2025-01-10", time))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{time}");
        assert!(body["message"].as_str().unwrap().contains("08:00 - 22:00"));
    }
    let (_, list) = send(&app, Method::GET, "/reserva", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn missing_fields_and_bad_bodies() {
    let app = app("missing.wal");
    let mut body = reservation(3, "2025-01-10", "12:00");
    body.as_object_mut().unwrap().remove("contato");
    let (status, resp) = send(&app, Method::POST, "/reserva", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], "Todos os campos são obrigatórios.");

    let req = Request::builder()
        .method(Method::POST)
        .uri("/reserva")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "Corpo da requisição inválido.");

    let (status, resp) = send(&app, Method::GET, "/reserva/mesa?mesa=5&data=2025-01-10", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], "Mesa, data e horário são obrigatórios.");

    let (status, resp) = send(&app, Method::GET, "/reserva/cliente", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["message"], "Nome do cliente é obrigatório.");
}

#[tokio::test]
async fn undecodable_query_gets_a_message_body() {
    let app = app("bad_query.wal");
    for uri in [
        "/reserva/cliente?nome=Ana&name=Ana",
        "/reserva/mesa?mesa=5&table=5&data=2025-01-10&horario=12:00",
        "/reserva/disponibilidade?mesa=5&table=5&data=2025-01-10&horario=12:00",
    ] {
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["message"], "Parâmetros da consulta inválidos.", "{uri}");
    }
}

#[tokio::test]
async fn list_by_customer_matches_exact_name() {
    let app = app("customer.wal");
    send(&app, Method::POST, "/reserva", Some(reservation(1, "2025-01-10", "12:00"))).await;
    let mut other = reservation(2, "2025-01-10", "12:00");
    other["nome"] = json!("João Pereira");
    send(&app, Method::POST, "/reserva", Some(other)).await;

    let (status, found) = send(&app, Method::GET, "/reserva/cliente?nome=Maria%20Silva", None).await;
    assert_eq!(status, StatusCode::OK);
    let found = found.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["name"], "Maria Silva");
}

#[tokio::test]
async fn update_and_delete_lifecycle() {
    let app = app("lifecycle.wal");
    let (_, created) = send(&app, Method::POST, "/reserva", Some(reservation(7, "2025-01-10", "19:00"))).await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/reserva/{id}"),
        Some(reservation(8, "2025-01-11", "20:00")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], id.as_str());
    assert_eq!(updated["table"], 8);
    assert_eq!(updated["time"], "20:00");

    let (status, body) = send(&app, Method::DELETE, &format!("/reserva/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Reserva deletada e a mesa foi liberada.");

    let (status, body) = send(
        &app,
        Method::GET,
        "/reserva/disponibilidade?mesa=8&data=2025-01-11&horario=20:00",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Disponível");

    let (status, body) = send(&app, Method::DELETE, &format!("/reserva/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Reserva não encontrada.");

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/reserva/{id}"),
        Some(reservation(8, "2025-01-11", "20:00")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_id_is_a_bad_request() {
    let app = app("missing_id.wal");
    let (status, body) = send(&app, Method::DELETE, "/reserva/", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "ID da reserva é obrigatório.");

    let (status, body) = send(&app, Method::PUT, "/reserva/", Some(reservation(1, "2025-01-10", "12:00"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "ID da reserva é obrigatório.");
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app("health.wal");
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}
