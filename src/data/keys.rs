//! Storage Keys

/// OpenAlgo server base URL
pub const HOST_URL: &str = "oa_host_url";

/// Validated API key
pub const API_KEY: &str = "oa_apikey";

/// Set once preferences were hydrated from the validation response
pub const CLOUD_SYNC_DONE: &str = "_cloud_sync_done";

/// Floating toolbar position, JSON `{"x":..,"y":..}`
pub const FLOATING_TOOLBAR_POS: &str = "tv_floating_toolbar_pos";

/// Theme name applied to the document at startup
pub const THEME: &str = "tv_theme";
