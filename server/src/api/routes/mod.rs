//! API route handlers

pub mod account;
pub mod actions;
pub mod health;
pub mod login;
