//! Command handlers.

pub mod catalog;
