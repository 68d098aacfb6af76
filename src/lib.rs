//! Content backend for a small restaurant site.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
