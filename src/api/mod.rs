//! OpenAlgo API module
//!
//! The single endpoint used by the shell: API key validation, which also
//! returns the user's chart preferences.

mod client;
mod constants;

pub use client::{ApiError, ChartClient, ChartEndpoint, ChartResponse, ResponseClass};
pub use constants::*;
