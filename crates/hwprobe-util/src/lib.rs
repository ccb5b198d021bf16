#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Shared utilities for hwprobe.
//!
//! Pure helper functions with no logging/tracing dependencies.

pub mod fs;
pub mod hash;
