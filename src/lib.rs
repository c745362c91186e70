pub mod api_doc;
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod health;
pub mod models;
pub mod repository;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;
