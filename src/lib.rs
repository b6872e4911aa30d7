//! Courier - a small HTTP/1.1 server over raw TCP streams
//!
//! Core library for request parsing, routing, and response framing.

pub mod config;
pub mod files;
pub mod http;
pub mod server;
