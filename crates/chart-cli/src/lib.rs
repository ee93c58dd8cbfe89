//! Command-line front-end for `chart_core`: decode JSON requests, inspect
//! settings.

pub mod commands;
pub mod input;
pub mod trace_init;
