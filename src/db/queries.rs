use chrono::{Duration, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{Booking, BookingStatus, ConversationState};

const TIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Idle sessions expire after this long; an expired row reads as "no
/// session", which the engine treats as the main menu.
const SESSION_TTL_MINUTES: i64 = 30;

// ── Sessions ──

pub fn get_session(conn: &Connection, phone: &str) -> anyhow::Result<Option<ConversationState>> {
    let now = Utc::now().naive_utc().format(TIME_FMT).to_string();
    let result = conn.query_row(
        "SELECT state FROM sessions WHERE phone = ?1 AND expires_at > ?2",
        params![phone, now],
        |row| row.get::<_, String>(0),
    );

    match result {
        Ok(state) => Ok(Some(ConversationState::parse(&state))),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_session(
    conn: &Connection,
    phone: &str,
    state: ConversationState,
) -> anyhow::Result<()> {
    let now = Utc::now().naive_utc();
    let expires_at = now + Duration::minutes(SESSION_TTL_MINUTES);

    conn.execute(
        "INSERT INTO sessions (phone, state, updated_at, expires_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(phone) DO UPDATE SET
           state = excluded.state,
           updated_at = excluded.updated_at,
           expires_at = excluded.expires_at",
        params![
            phone,
            state.as_str(),
            now.format(TIME_FMT).to_string(),
            expires_at.format(TIME_FMT).to_string()
        ],
    )?;
    Ok(())
}

pub fn expire_old_sessions(conn: &Connection) -> anyhow::Result<usize> {
    let now = Utc::now().naive_utc().format(TIME_FMT).to_string();
    let count = conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?;
    Ok(count)
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, customer_phone, customer_name, booking_date, booking_time,
                               service, raw_message, status, created_at, created_at_local)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            booking.id,
            booking.customer_phone,
            booking.customer_name,
            booking.date,
            booking.time,
            booking.service,
            booking.raw_message,
            booking.status.as_str(),
            booking.created_at.format(TIME_FMT).to_string(),
            booking.created_at_local,
        ],
    )?;
    Ok(())
}

pub fn list_bookings(conn: &Connection) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(
        "SELECT id, customer_phone, customer_name, booking_date, booking_time,
                service, raw_message, status, created_at, created_at_local
         FROM bookings
         ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        let status: String = row.get(7)?;
        let created_at: String = row.get(8)?;
        Ok(Booking {
            id: row.get(0)?,
            customer_phone: row.get(1)?,
            customer_name: row.get(2)?,
            date: row.get(3)?,
            time: row.get(4)?,
            service: row.get(5)?,
            raw_message: row.get(6)?,
            status: BookingStatus::parse(&status),
            created_at: NaiveDateTime::parse_from_str(&created_at, TIME_FMT)
                .unwrap_or_else(|_| Utc::now().naive_utc()),
            created_at_local: row.get(9)?,
        })
    })?;

    let mut bookings = Vec::new();
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}
