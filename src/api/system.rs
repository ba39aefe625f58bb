/// GET /test
/// Reachability check for the frontend.
pub async fn test_connection() -> &'static str {
    "Server is working!"
}
