//! Internal modules for the bet relay client.
//!
//! This library provides configuration loading used by the br_client binary.

pub mod config;
