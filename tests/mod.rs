//! Test suite for PixelCollab
//!
//! This module organizes all tests

#[cfg(feature = "ssr")]
pub mod integration;
