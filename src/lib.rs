// Library exports for builderboard
// This allows integration tests and the binary to share modules

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod ranking;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;
