#![warn(clippy::unwrap_used)]

pub mod history;
pub mod rest;
pub mod server;

pub use history::OutcomeHistory;
pub use server::ApiServer;
