//! Configuration, shared records and the collaborator interfaces.

pub mod collaborators;
pub mod config;
pub mod models;
