//! Tutor Service - Core Library
//!
//! CRUD REST endpoint for tutors over a transactional persistence gateway.

pub mod cli;
pub mod error;
pub mod headers;
pub mod middleware;
pub mod repository;
pub mod server;
pub mod settings;
pub mod telemetry;
pub mod tutor;
pub mod tutor_resource;

pub use tutor::Tutor;
