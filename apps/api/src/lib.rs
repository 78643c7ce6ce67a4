pub mod config;
pub mod db;
pub mod errors;
pub mod export;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod survey;
