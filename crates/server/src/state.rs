use std::sync::Arc;
use storage::Db;

use crate::auth::TokenSigner;
use crate::services::{Moderation, Relay, Rooms};

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub moderation: Moderation,
    pub rooms: Rooms,
    pub relay: Relay,
    pub signer: TokenSigner,
    pub admin_token: Arc<str>,
    pub history_page_size: i64,
}

