/// Trim whitespace and trailing slashes so paths can be appended with one `/`.
pub fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

/// Join a normalized base URL and an endpoint path.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base, path.trim_start_matches('/'))
}
