//! Services shared by notesync clients.

mod store;

pub use store::{LocalStore, StoreEvent, AUTH_TOKEN_KEY, GITHUB_CONFIG_KEY};
