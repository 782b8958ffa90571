//! imgtree engine - orchestration core
//!
//! This crate drives a full run:
//! - [`assemble`] - stage a self-contained build context per image
//! - [`executor`] - walk the build plan, resolve versions, render, build

pub mod assemble;
pub mod executor;

pub use assemble::{assemble, DOCKERFILE};
pub use executor::{ExecutionMode, Orchestrator, RunError, RunOptions};
