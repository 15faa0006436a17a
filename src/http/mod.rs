pub mod dto;
pub mod routes;

pub use routes::{configure, AppState};
