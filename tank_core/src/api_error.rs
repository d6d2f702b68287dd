//! Maps `Box<dyn Error>` from the `DashboardApi` boundary to typed `ApiError`.
//!
//! The traits in `tank_traits` use `Box<dyn Error + Send + Sync>` so any
//! transport can plug in; this module converts those to the core taxonomy,
//! with an optional feature-gated path for `tank_http::HttpError` downcasting.

use crate::error::ApiError;

/// Map a trait-boundary error to a typed `ApiError`.
///
/// Attempts to downcast known transport error types first, then falls back
/// to string-based heuristics.
pub fn map_api_error(e: &(dyn std::error::Error + 'static)) -> ApiError {
    if let Some(api) = e.downcast_ref::<ApiError>() {
        return api.clone();
    }

    // Feature-gated: try to downcast to HttpError for precise mapping
    #[cfg(feature = "http-errors")]
    {
        if let Some(http) = e.downcast_ref::<tank_http::HttpError>() {
            return match http {
                tank_http::HttpError::Status { code, message } => ApiError::Rejected {
                    status: *code,
                    message: message.clone(),
                },
                tank_http::HttpError::Malformed(m) => ApiError::Malformed(m.clone()),
                other => ApiError::Transport(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    let lower = s.to_lowercase();
    if lower.contains("malformed") || lower.contains("parse") || lower.contains("json") {
        ApiError::Malformed(s)
    } else {
        ApiError::Transport(s)
    }
}

/// Convenience for results coming straight off the trait boundary.
pub fn map_result<T>(r: tank_traits::ApiResult<T>) -> Result<T, ApiError> {
    r.map_err(|e| map_api_error(e.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_errors_pass_through() {
        let e = ApiError::Rejected {
            status: 400,
            message: "invalid range".into(),
        };
        let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(e.clone());
        assert_eq!(map_api_error(boxed.as_ref()), e);
    }

    #[test]
    fn unknown_errors_fall_back_on_message() {
        let boxed: Box<dyn std::error::Error + Send + Sync> = "connection refused".into();
        assert!(matches!(
            map_api_error(boxed.as_ref()),
            ApiError::Transport(_)
        ));
        let boxed: Box<dyn std::error::Error + Send + Sync> = "could not parse body".into();
        assert!(matches!(
            map_api_error(boxed.as_ref()),
            ApiError::Malformed(_)
        ));
    }

    #[cfg(feature = "http-errors")]
    #[test]
    fn http_status_maps_to_rejection() {
        let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(tank_http::HttpError::Status {
            code: 400,
            message: "Opening must be 0-100".into(),
        });
        assert_eq!(
            map_api_error(boxed.as_ref()),
            ApiError::Rejected {
                status: 400,
                message: "Opening must be 0-100".into()
            }
        );
    }
}
