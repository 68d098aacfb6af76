//! Domain layer types and invariants.

pub mod collections;
pub mod content_path;
pub mod entities;
pub mod error;
pub mod merge;
pub mod pages;
pub mod slug;
pub mod uploads;
