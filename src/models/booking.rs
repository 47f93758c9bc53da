use chrono::{FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded scheduling request. Created by the conversation engine when
/// a message in the booking flow carries extractable details; never mutated
/// by the bot afterwards (confirmation happens out-of-band).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub customer_phone: String,
    pub customer_name: String,
    /// Display date, e.g. "25/03/2026" or the "Data a confirmar" sentinel.
    pub date: String,
    /// Display time, e.g. "14:00" or the "Horario a confirmar" sentinel.
    pub time: String,
    pub service: String,
    pub raw_message: String,
    pub status: BookingStatus,
    /// UTC, sortable ("%Y-%m-%d %H:%M:%S").
    pub created_at: NaiveDateTime,
    /// Salon-local wall clock, for humans reading the table directly.
    pub created_at_local: String,
}

impl Booking {
    pub fn new(
        customer_phone: &str,
        customer_name: &str,
        date: String,
        time: String,
        service: String,
        raw_message: &str,
        utc_offset_hours: i32,
    ) -> Self {
        let now = Utc::now();
        let local = FixedOffset::east_opt(utc_offset_hours * 3600)
            .map(|off| now.with_timezone(&off).format("%d/%m/%Y %H:%M:%S").to_string())
            .unwrap_or_else(|| now.format("%d/%m/%Y %H:%M:%S").to_string());

        Booking {
            id: uuid::Uuid::new_v4().to_string(),
            customer_phone: customer_phone.to_string(),
            customer_name: customer_name.to_string(),
            date,
            time,
            service,
            raw_message: raw_message.to_string(),
            status: BookingStatus::PendingConfirmation,
            created_at: now.naive_utc(),
            created_at_local: local,
        }
    }
}

/// The bot only ever writes `pending_confirmation`; the other variants exist
/// so the admin listing tolerates rows updated out-of-band.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    PendingConfirmation,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::PendingConfirmation => "pending_confirmation",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::PendingConfirmation,
        }
    }
}
