//! OpenAlgo API Constants

/// Host used when none is stored or configured
pub const DEFAULT_HOST: &str = "http://127.0.0.1:5000";

/// Chart preferences endpoint, doubles as API key validation
pub const CHART_PATH: &str = "/api/v1/chart";

/// Query parameter carrying the API key
pub const API_KEY_PARAM: &str = "apikey";

/// Dashboard page listing the user's API keys
pub const API_KEY_PAGE_PATH: &str = "/apikey";

/// Login page
pub const LOGIN_PATH: &str = "/auth/login";
