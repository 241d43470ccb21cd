//! Integration tests, exercised only through `matching_core`'s public API.

mod integration;
mod properties;
