pub mod caption;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm_client;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod state;
