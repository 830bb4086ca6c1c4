mod commands;
mod error;
mod events;
mod filter;
mod models;
pub mod protocol;

pub use commands::NotifyCommand;
pub use error::{CoreError, FilterError};
pub use events::LiveEvent;
pub use filter::{normalize_word, parse_word_list, Filtered, MaskCase, SlangFilter};
pub use models::{BlogId, Comment, Flags, HistoryPage, Message, Room, UserStanding};
