//! Centralized constants for Finboard runtime configuration
//!
//! All timeout, limit and naming values in one place for easy tuning.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════
// Cache & Polling
// ═══════════════════════════════════════════════════════════════

/// How long a successful response is served from cache without new I/O
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(10);

/// Period of each widget's refresh timer
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

// ═══════════════════════════════════════════════════════════════
// HTTP Transport
// ═══════════════════════════════════════════════════════════════

/// Timeout for a whole widget endpoint request
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for establishing HTTP connections
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of HTTP redirects to follow
pub const REDIRECT_LIMIT: usize = 5;

pub const USER_AGENT: &str = "finboard/0.1";

// ═══════════════════════════════════════════════════════════════
// Data Shaping
// ═══════════════════════════════════════════════════════════════

/// Items sampled when inferring list columns
pub const COLUMN_SAMPLE_SIZE: usize = 10;

/// Rows materialized for an object-of-records table (arrays are kept whole)
pub const TABLE_ROW_LIMIT: usize = 100;

/// Rows shown per table page
pub const TABLE_PAGE_SIZE: usize = 10;

/// Points plotted by a chart widget
pub const CHART_POINT_LIMIT: usize = 20;

// ═══════════════════════════════════════════════════════════════
// Storage
// ═══════════════════════════════════════════════════════════════

/// Fixed name of the persisted widget list
pub const STORAGE_NAME: &str = "finboard-storage";

// ═══════════════════════════════════════════════════════════════
// Diagnostics
// ═══════════════════════════════════════════════════════════════

/// Events retained by an `EventLog` before the oldest are dropped
pub const MAX_EVENTS: usize = 10_000;

// ═══════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════
