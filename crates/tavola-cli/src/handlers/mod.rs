pub mod collections;
pub mod menu;
pub mod pages;
pub mod posts;
