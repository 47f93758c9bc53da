use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::models::InboundMessage;
use crate::services::conversation;
use crate::state::AppState;

const APOLOGY_TEXT: &str = "Erro no processamento. Tente novamente.";

/// POST /webhook/whatsapp — Twilio delivers inbound WhatsApp messages as an
/// URL-encoded form. The reply travels back in the TwiML envelope, always
/// with a 200 status: an error status here would make Twilio retry-storm.
pub async fn whatsapp_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let form = parse_webhook_form(&body);

    // Validate Twilio signature (skip if auth token is empty — dev mode)
    if !state.config.twilio_auth_token.is_empty() {
        let signature = headers
            .get("x-twilio-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if signature.is_empty() {
            tracing::warn!("missing X-Twilio-Signature header");
            return (StatusCode::FORBIDDEN, "Missing signature").into_response();
        }

        let url = webhook_url(&headers);
        if !validate_twilio_signature(&state.config.twilio_auth_token, signature, &url, &form) {
            tracing::warn!("invalid Twilio signature");
            return (StatusCode::FORBIDDEN, "Invalid signature").into_response();
        }
    }

    let msg = inbound_from_form(&form);
    tracing::info!(from = %msg.from, body = %msg.body, "incoming WhatsApp message");

    let reply = match conversation::process_message(&state, &msg).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(error = %e, from = %msg.from, "message processing failed");
            APOLOGY_TEXT.to_string()
        }
    };

    twiml_response(&reply)
}

/// Tolerant form decoding: pairs without "=" or with an empty key are
/// skipped, the rest of the body still parses. "+" means space in values;
/// undecodable percent-sequences keep the raw text.
fn parse_webhook_form(body: &str) -> Vec<(String, String)> {
    body.split('&')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            if key.is_empty() {
                return None;
            }
            Some((decode_component(key), decode_component(&value.replace('+', " "))))
        })
        .collect()
}

fn decode_component(s: &str) -> String {
    urlencoding::decode(s)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

fn form_value<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
    form.iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn inbound_from_form(form: &[(String, String)]) -> InboundMessage {
    let profile_name = form_value(form, "ProfileName")
        .filter(|name| !name.trim().is_empty())
        .unwrap_or("Cliente");

    InboundMessage {
        body: form_value(form, "Body").unwrap_or_default().trim().to_string(),
        from: form_value(form, "From").unwrap_or_default().trim().to_string(),
        profile_name: profile_name.trim().to_string(),
    }
}

/// Reconstruct the public webhook URL — use X-Forwarded-Proto/Host when
/// behind a proxy, which is how Twilio saw it when signing.
fn webhook_url(headers: &HeaderMap) -> String {
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("https");
    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get("host"))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{proto}://{host}/webhook/whatsapp")
}

fn validate_twilio_signature(
    auth_token: &str,
    signature: &str,
    url: &str,
    params: &[(String, String)],
) -> bool {
    // Twilio signs URL + params concatenated in key order
    let mut data = url.to_string();
    let mut sorted_params: Vec<_> = params.iter().collect();
    sorted_params.sort_by(|a, b| a.0.cmp(&b.0));
    for (key, value) in sorted_params {
        data.push_str(key);
        data.push_str(value);
    }

    let mut mac = match Hmac::<Sha1>::new_from_slice(auth_token.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(data.as_bytes());
    let expected = base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

    expected == signature
}

fn twiml_response(message: &str) -> Response {
    let body = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>\n    <Message>{}</Message>\n</Response>",
        xml_escape(message)
    );
    ([(header::CONTENT_TYPE, "text/xml")], body).into_response()
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
