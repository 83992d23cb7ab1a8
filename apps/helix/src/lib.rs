//! # HyperHelix Application Library
//!
//! The server and CLI around `helix-core`. Exposed as a library so the
//! integration tests can build routers without binding a socket.

pub mod api;
pub mod cli;
pub mod config;
pub mod payload;

pub use payload::Payload;
