//! Test Fixtures Module
//!
//! Shared fixtures for the call relay integration tests:
//! - Server configuration fixtures
//! - Telephony media stream frames

// Not every test binary uses every fixture
#![allow(dead_code)]

pub mod config_fixtures;
pub mod telephony_fixtures;

pub use config_fixtures::*;
pub use telephony_fixtures::*;
