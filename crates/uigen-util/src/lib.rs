#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Shared utilities for uigen.
//!
//! This crate provides pure helper functions with no logging/tracing dependencies.
//! Logging is handled by the core crate's `logging` module.

pub mod hash;
pub mod path;
