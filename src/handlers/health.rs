//! Health check endpoint

/// Body returned on `GET /`
pub const IDENTIFICATION: &str = "drainwatch";

/// Returns a static identification string for load balancers and humans
pub async fn handler() -> &'static str {
    IDENTIFICATION
}
