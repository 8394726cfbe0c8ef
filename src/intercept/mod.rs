//! Request interception: classification and the two fixed caching strategies.
//!
//! Every outbound GET is run through this module. Requests to the story API
//! origin are served network-first with a cached fallback; everything else is
//! served cache-first against the pre-populated shell.

mod classify;
mod engine;
mod service;
pub mod types;

pub use classify::{classify, RequestClass};
pub use engine::InterceptEngine;
pub use service::InterceptService;
