//! Classification of remote API call outcomes.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;

/// Rate limit information from response headers.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitInfo {
    pub remaining: usize,
    pub reset_at: DateTime<Utc>,
}

/// Outcome of one remote API call, classified by response status.
///
/// Classification happens once, at the client boundary, so callers never
/// inspect raw status codes: a `MissingAccess` result is the signal to record
/// a permission finding, a `Failed` result is transient and absorbed locally.
#[derive(Debug)]
pub enum ApiResult<T> {
    /// The call succeeded.
    Success(T),

    /// The credential cannot see the resource (404, or a 403 that is not a
    /// rate-limit response).
    MissingAccess(StatusCode),

    /// The call failed for any other reason (network, server error,
    /// cancellation, exhausted rate-limit quota).
    Failed(ohno::AppError),
}

impl<T> ApiResult<T> {
    /// Convert the non-success remainder into an [`ApiFailure`], or `None` if
    /// the call succeeded.
    pub fn failure(self) -> Option<ApiFailure> {
        match self {
            Self::Success(_) => None,
            Self::MissingAccess(status) => Some(ApiFailure::MissingAccess(status)),
            Self::Failed(e) => Some(ApiFailure::Failed(e)),
        }
    }
}

/// The non-success portion of an [`ApiResult`], carried alongside partial
/// results by [`PageResult`](super::PageResult).
#[derive(Debug)]
pub enum ApiFailure {
    /// The credential cannot see the resource.
    MissingAccess(StatusCode),

    /// Any other failure.
    Failed(ohno::AppError),
}

impl ApiFailure {
    /// Returns `true` when the failure indicates an authorization/visibility
    /// gap rather than a transient problem.
    #[must_use]
    pub const fn is_missing_access(&self) -> bool {
        matches!(self, Self::MissingAccess(_))
    }

    /// Flatten the failure into an opaque error for logging/reporting.
    #[must_use]
    pub fn into_error(self) -> ohno::AppError {
        match self {
            Self::MissingAccess(status) => ohno::app_err!("missing access ({status})"),
            Self::Failed(e) => e,
        }
    }
}

impl<T> From<ApiFailure> for ApiResult<T> {
    fn from(failure: ApiFailure) -> Self {
        match failure {
            ApiFailure::MissingAccess(status) => Self::MissingAccess(status),
            ApiFailure::Failed(e) => Self::Failed(e),
        }
    }
}

/// Classify an HTTP status code together with its response headers.
///
/// GitHub reports both "forbidden" and "rate limit exhausted" as 403; the
/// `x-ratelimit-remaining` header disambiguates. An exhausted quota is a
/// transient failure, not a permission gap.
pub(crate) fn classify_status(status: StatusCode, headers: &HeaderMap) -> Option<ApiFailure> {
    if status.is_success() {
        return None;
    }

    let rate_limit = extract_rate_limit_from_headers(headers);

    if status == StatusCode::FORBIDDEN
        && rate_limit.is_some_and(|rl| rl.remaining == 0)
    {
        let reset = rate_limit.map_or_else(String::new, |rl| format!(", resets at {}", rl.reset_at));
        return Some(ApiFailure::Failed(ohno::app_err!("rate limit exhausted{reset}")));
    }

    if matches!(status, StatusCode::NOT_FOUND | StatusCode::FORBIDDEN) {
        return Some(ApiFailure::MissingAccess(status));
    }

    Some(ApiFailure::Failed(ohno::app_err!("unexpected response status {status}")))
}

/// Extract rate limit information from API response headers.
pub(crate) fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<usize>().ok()?;

    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;

    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn rate_limit_headers(remaining: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-ratelimit-remaining", HeaderValue::from_static(remaining));
        let _ = headers.insert("x-ratelimit-reset", HeaderValue::from_static("1704067200"));
        headers
    }

    #[test]
    fn success_status_classifies_as_none() {
        assert!(classify_status(StatusCode::OK, &HeaderMap::new()).is_none());
        assert!(classify_status(StatusCode::CREATED, &HeaderMap::new()).is_none());
    }

    #[test]
    fn not_found_is_missing_access() {
        let failure = classify_status(StatusCode::NOT_FOUND, &HeaderMap::new()).unwrap();
        assert!(failure.is_missing_access());
    }

    #[test]
    fn forbidden_without_rate_limit_headers_is_missing_access() {
        let failure = classify_status(StatusCode::FORBIDDEN, &HeaderMap::new()).unwrap();
        assert!(failure.is_missing_access());
    }

    #[test]
    fn forbidden_with_remaining_quota_is_missing_access() {
        let failure = classify_status(StatusCode::FORBIDDEN, &rate_limit_headers("42")).unwrap();
        assert!(failure.is_missing_access());
    }

    #[test]
    fn forbidden_with_exhausted_quota_is_transient() {
        let failure = classify_status(StatusCode::FORBIDDEN, &rate_limit_headers("0")).unwrap();
        assert!(!failure.is_missing_access());
    }

    #[test]
    fn server_error_is_transient() {
        let failure = classify_status(StatusCode::INTERNAL_SERVER_ERROR, &HeaderMap::new()).unwrap();
        assert!(!failure.is_missing_access());
    }

    #[test]
    fn extract_rate_limit() {
        let rate_limit = extract_rate_limit_from_headers(&rate_limit_headers("4999")).unwrap();
        assert_eq!(rate_limit.remaining, 4999);
        assert_eq!(rate_limit.reset_at.timestamp(), 1_704_067_200);
    }

    #[test]
    fn extract_rate_limit_missing_headers() {
        assert!(extract_rate_limit_from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn extract_rate_limit_invalid_remaining() {
        let mut headers = rate_limit_headers("4999");
        let _ = headers.insert("x-ratelimit-remaining", HeaderValue::from_static("invalid"));
        assert!(extract_rate_limit_from_headers(&headers).is_none());
    }

    #[test]
    fn api_result_failure_conversion() {
        assert!(ApiResult::Success(1).failure().is_none());

        let missing = ApiResult::<i32>::MissingAccess(StatusCode::NOT_FOUND).failure().unwrap();
        assert!(missing.is_missing_access());

        let failed = ApiResult::<i32>::Failed(ohno::app_err!("boom")).failure().unwrap();
        assert!(!failed.is_missing_access());
    }
}
