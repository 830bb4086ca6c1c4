pub mod admin;
pub mod comments;
pub mod messages;
pub mod rooms;
pub mod sse;
