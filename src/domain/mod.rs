pub mod factory;
pub mod models;
