pub mod analytics;
pub mod assistant;
pub mod cli;
pub mod config;
pub mod database;
pub mod market;
pub mod web;

pub use config::AppConfig;
pub use web::start_web_server;
