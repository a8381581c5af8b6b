//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the text engine:
//! - Math types and screen-space rectangles
//! - Logging utilities

pub mod math;
pub mod logging;
