/// API path prefix for all versioned routes.
pub const API_PREFIX: &str = "/api/v1";

/// Slack added on top of the configured file-size limit so multipart framing
/// overhead does not reject a file that is itself within the limit.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Default page size for file listings.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Hard cap on page size.
pub const MAX_PAGE_SIZE: usize = 100;
