//! Domain layer for the hierarchos reasoning loop
//!
//! This module contains core models, collaborator ports, and domain errors.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
