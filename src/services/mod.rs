pub mod conversation;
pub mod extract;
pub mod intent;
pub mod menu;
pub mod messaging;
pub mod text;
