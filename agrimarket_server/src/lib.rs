pub mod auth;
#[cfg(test)]
mod endpoint_tests;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod notify;
pub mod routes;
pub mod server;
