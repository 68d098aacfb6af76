//! tavola-cli: admin client for the Tavola content API.
//!
//! The [`editor`] module holds the optimistic collection editor; [`transport`]
//! connects it to the server's reorder and delete routes.

pub mod args;
pub mod client;
pub mod editor;
pub mod handlers;
pub mod io;
pub mod print;
pub mod transport;

#[cfg(test)]
mod tests;
