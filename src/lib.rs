// ABOUTME: Library root for deckhand - exposes the pipeline components for testing.
// ABOUTME: The main binary is in main.rs.

pub mod cli;
pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod exec;
pub mod health;
pub mod image;
pub mod orchestrator;
pub mod output;
pub mod prereq;
pub mod target;
pub mod types;
