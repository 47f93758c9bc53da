pub mod booking;
pub mod conversation;

pub use booking::{Booking, BookingStatus};
pub use conversation::{ConversationResult, ConversationState, InboundMessage};
