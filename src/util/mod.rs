//! Utilities Module - shared infrastructure (v0.1)
//!
//! - `constants`: Centralized timeouts, limits and names

pub mod constants;

pub use constants::{
    CONNECT_TIMEOUT, FETCH_TIMEOUT, FRESHNESS_WINDOW, MAX_EVENTS, POLL_INTERVAL, REDIRECT_LIMIT,
    STORAGE_NAME, USER_AGENT,
};
