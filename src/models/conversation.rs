use serde::{Deserialize, Serialize};

use crate::models::Booking;

/// Where a given sender is in the scripted dialogue. There is no terminal
/// state: every turn lands back in one of these two.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    MainMenu,
    AwaitingBookingDetails,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::MainMenu => "main_menu",
            ConversationState::AwaitingBookingDetails => "awaiting_booking_details",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "awaiting_booking_details" => ConversationState::AwaitingBookingDetails,
            _ => ConversationState::MainMenu,
        }
    }
}

/// A decoded inbound WhatsApp message. Immutable once parsed from the
/// webhook form.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub body: String,
    pub from: String,
    pub profile_name: String,
}

/// Outcome of one conversation turn: the reply to send back, the state the
/// sender moves to, and (for a completed scheduling request) the booking
/// to persist.
#[derive(Debug, Clone)]
pub struct ConversationResult {
    pub reply: String,
    pub next_state: ConversationState,
    pub booking: Option<Booking>,
}
