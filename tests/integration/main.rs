//! Integration tests for contact-assist
//!
//! These tests drive the mention engine end to end: typing into the
//! assistant box, candidate search against an in-memory directory or a
//! mocked backend, confirmation, composition and dispatch.

// Test utilities and common setup
mod common;

mod client_tests;
mod engine_tests;
mod palette_tests;

// Re-export common utilities for use by test modules
pub use common::*;
