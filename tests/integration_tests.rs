use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceExt;

use esmalteria_bot::config::AppConfig;
use esmalteria_bot::db;
use esmalteria_bot::db::queries;
use esmalteria_bot::handlers;
use esmalteria_bot::services::messaging::MessagingProvider;
use esmalteria_bot::state::AppState;

// ── Mock messaging ──

struct MockMessaging {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

#[async_trait]
impl MessagingProvider for MockMessaging {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(())
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
        twilio_account_sid: "".to_string(),
        twilio_auth_token: "".to_string(), // empty = skip signature validation
        twilio_whatsapp_number: "+15551234567".to_string(),
        owner_phone: "+15559999999".to_string(),
        utc_offset_hours: -3,
    }
}

fn test_state() -> (Arc<AppState>, Arc<Mutex<Vec<(String, String)>>>) {
    let conn = db::init_db(":memory:").unwrap();
    let sent = Arc::new(Mutex::new(vec![]));
    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
        messaging: Box::new(MockMessaging {
            sent: Arc::clone(&sent),
        }),
    });
    (state, sent)
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/webhook/whatsapp", post(handlers::webhook::whatsapp_webhook))
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .with_state(state)
}

/// Build a webhook POST for a customer message.
fn webhook_request(body_text: &str, from: &str, profile_name: &str) -> Request<Body> {
    let encoded = form_encode(body_text);
    let from_encoded = form_encode(from);
    let name_encoded = form_encode(profile_name);
    Request::builder()
        .method("POST")
        .uri("/webhook/whatsapp")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "Body={encoded}&From={from_encoded}&ProfileName={name_encoded}"
        )))
        .unwrap()
}

fn form_encode(s: &str) -> String {
    s.replace('%', "%25")
        .replace('&', "%26")
        .replace('=', "%3D")
        .replace('+', "%2B")
        .replace(' ', "+")
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, String) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

const CUSTOMER: &str = "whatsapp:+5511999990000";

// ── Webhook tests ──

#[tokio::test]
async fn test_health() {
    let (state, _) = test_state();
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(test_app(state), req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ok"));
}

#[tokio::test]
async fn test_greeting_returns_main_menu_twiml() {
    let (state, _) = test_state();
    let res = test_app(state)
        .oneshot(webhook_request("Oi", CUSTOMER, "Maria"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get("content-type").unwrap().to_str().unwrap(),
        "text/xml"
    );
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(body.starts_with("<?xml"));
    assert!(body.contains("<Response>"));
    assert!(body.contains("Ola Maria!"));
}

#[tokio::test]
async fn test_full_booking_flow_persists_and_notifies() {
    let (state, sent) = test_state();

    // Turn 1: enter the booking flow.
    let (status, body) = send(
        test_app(Arc::clone(&state)),
        webhook_request("1", CUSTOMER, "Maria"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("AGENDAMENTO"));
    assert!(body.contains("Data"));

    // Turn 2: send the details.
    let (status, body) = send(
        test_app(Arc::clone(&state)),
        webhook_request("25/03 14h - Manicure completa", CUSTOMER, "Maria"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("AGENDAMENTO CONFIRMADO"));
    assert!(body.contains("25/03"));
    assert!(body.contains("14:00"));
    assert!(body.contains("Manicure"));

    // Booking row landed in the sink.
    let bookings = {
        let db = state.db.lock().unwrap();
        queries::list_bookings(&db).unwrap()
    };
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].customer_phone, CUSTOMER);
    assert_eq!(bookings[0].customer_name, "Maria");
    assert_eq!(bookings[0].service, "Manicure");
    assert_eq!(bookings[0].status.as_str(), "pending_confirmation");

    // Owner got a notification.
    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "+15559999999");
    assert!(sent[0].1.contains("Manicure"));
}

#[tokio::test]
async fn test_booking_flow_interrupted_by_menu_command() {
    let (state, _) = test_state();

    let (_, body) = send(
        test_app(Arc::clone(&state)),
        webhook_request("agendar", CUSTOMER, "Maria"),
    )
    .await;
    assert!(body.contains("AGENDAMENTO"));

    // "3" while awaiting details shows the price table, no booking made.
    let (_, body) = send(
        test_app(Arc::clone(&state)),
        webhook_request("3", CUSTOMER, "Maria"),
    )
    .await;
    assert!(body.contains("TABELA DE PRECOS"));

    let bookings = {
        let db = state.db.lock().unwrap();
        queries::list_bookings(&db).unwrap()
    };
    assert!(bookings.is_empty());
}

#[tokio::test]
async fn test_details_while_awaiting_without_cues_get_help_text() {
    let (state, _) = test_state();

    send(
        test_app(Arc::clone(&state)),
        webhook_request("agendar", CUSTOMER, "Maria"),
    )
    .await;

    let (_, body) = send(
        test_app(Arc::clone(&state)),
        webhook_request("pode ser qualquer dia", CUSTOMER, "Maria"),
    )
    .await;
    assert!(body.contains("nao entendi"));
}

#[tokio::test]
async fn test_empty_body_falls_back_to_help() {
    let (state, _) = test_state();
    let req = Request::builder()
        .method("POST")
        .uri("/webhook/whatsapp")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from(format!("From={}", form_encode(CUSTOMER))))
        .unwrap();

    let (status, body) = send(test_app(state), req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("nao entendi"));
}

#[tokio::test]
async fn test_malformed_pairs_are_skipped() {
    let (state, _) = test_state();
    let req = Request::builder()
        .method("POST")
        .uri("/webhook/whatsapp")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from("garbage-no-equals&Body=oi&From=x"))
        .unwrap();

    let (status, body) = send(test_app(state), req).await;
    assert_eq!(status, StatusCode::OK);
    // "oi" still parsed: the main menu comes back with the default name.
    assert!(body.contains("Ola Cliente!"));
}

#[tokio::test]
async fn test_signature_required_when_token_configured() {
    let mut config = test_config();
    config.twilio_auth_token = "secret".to_string();
    let conn = db::init_db(":memory:").unwrap();
    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config,
        messaging: Box::new(MockMessaging {
            sent: Arc::new(Mutex::new(vec![])),
        }),
    });

    let (status, _) = send(test_app(state), webhook_request("oi", CUSTOMER, "Maria")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ── Admin API tests ──

#[tokio::test]
async fn test_admin_requires_auth() {
    let (state, _) = test_state();
    let req = Request::builder()
        .uri("/api/admin/bookings")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(test_app(state), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_wrong_token() {
    let (state, _) = test_state();
    let req = Request::builder()
        .uri("/api/admin/bookings")
        .header("Authorization", "Bearer wrong-token")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(test_app(state), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_lists_persisted_bookings() {
    let (state, _) = test_state();

    send(
        test_app(Arc::clone(&state)),
        webhook_request("1", CUSTOMER, "Maria"),
    )
    .await;
    send(
        test_app(Arc::clone(&state)),
        webhook_request("amanha 15h - Pedicure", CUSTOMER, "Maria"),
    )
    .await;

    let req = Request::builder()
        .uri("/api/admin/bookings")
        .header("Authorization", "Bearer test-token")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(test_app(state), req).await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["service"], "Pedicure");
    assert_eq!(list[0]["time"], "15:00");
    assert_eq!(list[0]["status"], "pending_confirmation");
    assert_eq!(list[0]["customer_name"], "Maria");
}
