//! Shared test utilities for http-spider integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated spiders backed by temp directories
//! - `ScriptedExecutor`, a request executor replaying canned outcomes

pub mod harness;
pub mod scripted;

pub use harness::TestHarness;
pub use scripted::{RecordedCall, Reply, ScriptedExecutor};
