//! Route modules for the Text Scanner server

pub mod health;
pub mod recognize;
