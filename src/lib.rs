pub mod catalog;
pub mod chat;
pub mod config;
pub mod models;
pub mod normalize;
pub mod provider;
pub mod server;
pub mod taxonomy;
pub mod tmdb;

#[cfg(test)]
mod fixtures;

pub use config::AppConfig;
pub use server::run_server;
