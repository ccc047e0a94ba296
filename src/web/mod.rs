pub mod api;
pub mod api_doc;
mod server;

pub use server::{router, run_server, AppState};
