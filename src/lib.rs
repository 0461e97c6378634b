pub mod activity;
pub mod analytics;
pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod models;
pub mod routes;
pub mod schema;
pub mod state;
