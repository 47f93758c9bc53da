use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Utc};

use crate::db::queries;
use crate::models::{Booking, ConversationResult, ConversationState, InboundMessage};
use crate::services::intent::{self, Action};
use crate::services::{extract, menu, text};
use crate::state::AppState;

const BOOKING_PROMPT: &str = "*AGENDAMENTO* 📅

Por favor, me envie os dados do agendamento no formato:

*Data* + *Horario* + *Servico*

*Exemplos:*
\"25/03 14h - Manicure completa\"
\"amanha 15h - Pedicure\"";

/// One conversation turn. Pure: no I/O, no clock reads ("today" comes in as
/// a parameter), and it cannot fail for any input text, so the surrounding
/// handler never has to translate a panic into a reply.
pub fn handle_message(
    state: ConversationState,
    msg: &InboundMessage,
    today: NaiveDate,
    utc_offset_hours: i32,
) -> ConversationResult {
    let normalized = text::normalize(&msg.body);

    match intent::classify(state, &normalized) {
        Action::ExtractBooking => {
            // Extraction runs on the original body: case and accents matter
            // for the echoed-back service text.
            let fields = extract::extract_fields(&msg.body, today);
            let reply = confirmation_text(&fields);
            let booking = Booking::new(
                &msg.from,
                &msg.profile_name,
                fields.date,
                fields.time,
                fields.service,
                &msg.body,
                utc_offset_hours,
            );
            ConversationResult {
                reply,
                next_state: ConversationState::MainMenu,
                booking: Some(booking),
            }
        }
        Action::EnterBookingFlow => ConversationResult {
            reply: BOOKING_PROMPT.to_string(),
            next_state: ConversationState::AwaitingBookingDetails,
            booking: None,
        },
        Action::ShowMenuReply => ConversationResult {
            reply: menu::menu_reply(&normalized, &msg.profile_name),
            next_state: ConversationState::MainMenu,
            booking: None,
        },
    }
}

fn confirmation_text(fields: &extract::BookingFields) -> String {
    format!(
        "✅ *AGENDAMENTO CONFIRMADO!*

📆 Data: {}
🕒 Horario: {}
💅 Servico: {}

📋 Status: Aguardando confirmacao final

💬 Entraremos em contato em breve para confirmacao!

Obrigada por agendar conosco! ✨",
        fields.date, fields.time, fields.service
    )
}

/// Orchestrate a full turn against the session store and booking sink:
/// load state, run the engine, save state, then persist/notify. A failed
/// booking insert is logged and reported to the owner channel but does not
/// change the reply or the already-saved state transition.
pub async fn process_message(
    state: &Arc<AppState>,
    msg: &InboundMessage,
) -> anyhow::Result<String> {
    let session_state = {
        let db = state.db.lock().unwrap();
        queries::get_session(&db, &msg.from)?
    }
    .unwrap_or(ConversationState::MainMenu);

    let today = local_today(state.config.utc_offset_hours);
    let result = handle_message(session_state, msg, today, state.config.utc_offset_hours);

    tracing::info!(
        from = %msg.from,
        state = session_state.as_str(),
        next_state = result.next_state.as_str(),
        booking = result.booking.is_some(),
        "processed message"
    );

    {
        let db = state.db.lock().unwrap();
        queries::save_session(&db, &msg.from, result.next_state)?;
        let _ = queries::expire_old_sessions(&db);
    }

    if let Some(booking) = &result.booking {
        let inserted = {
            let db = state.db.lock().unwrap();
            queries::create_booking(&db, booking)
        };
        match inserted {
            Ok(()) => {
                tracing::info!(id = %booking.id, "booking recorded");
                let summary = format!(
                    "Novo agendamento: {} - {} {} ({}) de {}",
                    booking.service, booking.date, booking.time, booking.customer_name,
                    booking.customer_phone,
                );
                notify_owner(state, &summary).await;
            }
            Err(e) => {
                // Reply text was decided before the insert; the customer
                // still gets the confirmation.
                tracing::error!(error = %e, id = %booking.id, "failed to persist booking");
            }
        }
    }

    Ok(result.reply)
}

/// Today's date at the salon, not at the server.
fn local_today(utc_offset_hours: i32) -> NaiveDate {
    FixedOffset::east_opt(utc_offset_hours * 3600)
        .map(|off| Utc::now().with_timezone(&off).date_naive())
        .unwrap_or_else(|| Utc::now().date_naive())
}

async fn notify_owner(state: &Arc<AppState>, message: &str) {
    if state.config.owner_phone.is_empty() {
        tracing::warn!("owner_phone not configured, skipping notification");
        return;
    }

    if let Err(e) = state
        .messaging
        .send_message(&state.config.owner_phone, message)
        .await
    {
        tracing::error!(error = %e, "failed to notify owner");
    }
}
