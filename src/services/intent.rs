use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::ConversationState;

/// What the engine should do with a message, decided from the current state
/// and the normalized text alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Message in the booking flow that carries extractable details.
    ExtractBooking,
    /// User asked to schedule; switch to collecting details.
    EnterBookingFlow,
    /// Everything else routes through the menu responder.
    ShowMenuReply,
}

static DATE_CUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{1,2}/\d{1,2}").unwrap());
static HOUR_CUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{1,2}h").unwrap());

const DAY_CUES: &[&str] = &[
    "amanha", "hoje", "segunda", "terca", "quarta", "quinta", "sexta", "sabado",
];
const SERVICE_CUES: &[&str] = &["manicure", "pedicure", "alongamento", "spa"];

/// First match wins. State only gates the extraction path; the booking and
/// menu keywords are recognized in any state, so a user can always interrupt
/// a booking flow with a menu command instead of hitting a dead-end.
pub fn classify(state: ConversationState, normalized: &str) -> Action {
    if state == ConversationState::AwaitingBookingDetails && has_booking_details(normalized) {
        Action::ExtractBooking
    } else if normalized.contains('1') || normalized.contains("agendar") {
        Action::EnterBookingFlow
    } else {
        Action::ShowMenuReply
    }
}

/// A message counts as booking details when it has both a date cue (D/D
/// token or a day word) and a service/time cue (known service or an "Nh"
/// hour token).
fn has_booking_details(normalized: &str) -> bool {
    let has_date = DATE_CUE_RE.is_match(normalized)
        || DAY_CUES.iter().any(|cue| normalized.contains(cue));
    let has_service_or_time = SERVICE_CUES.iter().any(|cue| normalized.contains(cue))
        || HOUR_CUE_RE.is_match(normalized);
    has_date && has_service_or_time
}
