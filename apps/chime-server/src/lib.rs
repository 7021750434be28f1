//! Chime Server
//!
//! HTTP front door for the chime interaction engine. Verifies and dispatches
//! signed webhook calls through [`chime_core::Dispatcher`], registers the
//! built-in commands with the platform, and drains background
//! continuations on shutdown.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod http;
pub mod register;
pub mod state;
