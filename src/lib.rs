//! Sound effect host
//!
//! Glue between a UI and the `sfx-audio` engine: settings loading and the
//! request bridge that carries play requests and user interactions.

pub mod config;
pub mod soundbridge;
