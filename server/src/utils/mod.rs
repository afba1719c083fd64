//! Utility functions for the application

pub mod avatar;
pub mod crypto;
pub mod file;
pub mod sql;
