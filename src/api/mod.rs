pub mod error;
mod handlers;
mod helpers;
mod router;
pub mod types;

pub use router::handle_request;
pub use types::{AppState, Request};
