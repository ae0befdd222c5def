//! Shared test infrastructure.
//!
//! Tests only import from this module.
//!
//! - [`MockUpstream`] stands in for every HTTP service the proxy talks to
//! - [`test_config`] points a [`Config`](predictify::config::Config) at it

#![allow(dead_code)]

mod config;
mod upstream;

pub use config::{
    CLIENT_ID, CLIENT_SECRET, REDIRECT_URI, test_config, test_config_with, unreachable_url,
};
pub use upstream::{MockUpstream, RecordedRequest, form_pairs};
