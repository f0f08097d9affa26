pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod database;
pub mod error;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod services;
