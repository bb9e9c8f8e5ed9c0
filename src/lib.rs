//! mmpctl — terminal administration client for the Multi-Management
//! Platform backend.
//!
//! The backend exposes named "systems", each holding loosely-typed
//! resource records and aggregate analytics. mmpctl authenticates a
//! user, lets them browse/filter/create records within a chosen system,
//! and renders analytics as terminal charts — either interactively
//! (`mmpctl console`) or through one-shot subcommands for scripting.

pub mod analytics;
pub mod api;
pub mod cache;
pub mod charts;
pub mod cli;
pub mod config;
pub mod console;
pub mod resources;
pub mod session;
