//! Application services layer.

pub mod content;
pub mod error;
pub mod menu;
pub mod posts;
pub mod repos;
pub mod sessions;
pub mod site;
pub mod uploads;
