pub mod activities;
pub mod api;
pub mod clients;
pub mod config;
pub mod coordinator;
pub mod models;
pub mod utils;
