/// Prefix for all JSON API routes
pub const API_PREFIX: &str = "/api";

/// URL path the thumbnail assets directory is served under
pub const ASSETS_PATH: &str = "/assets";

/// Issuer claim carried by access tokens
pub const TOKEN_ISSUER: &str = "tubely-access";

/// Upper bound on in-flight requests when HTTP_CONCURRENCY_LIMIT is unset
pub const DEFAULT_HTTP_CONCURRENCY_LIMIT: usize = 1_000;
