//! GitHub API client
//!
//! Minimal REST + GraphQL client for the collection engine. Every call is
//! classified into an [`ApiResult`] at this boundary; callers never inspect
//! raw status codes.

use crate::Result;
use crate::collect::api::{self, ApiResult};
use crate::collect::pagination::Page;
use compact_str::CompactString;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, LINK};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "github";

/// GitHub API client.
///
/// The base URL is overridable so tests can point the client at a mock
/// server; production callers use `https://api.github.com`.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct GraphQlRequest<'a, V> {
    query: &'a str,
    variables: V,
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

/// GraphQL errors arrive with HTTP 200; the `type` field carries the
/// `NOT_FOUND`/`FORBIDDEN` classification.
#[derive(Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl Client {
    /// Create a new client with an optional authentication token.
    pub fn new(token: Option<&str>, base_url: impl Into<String>) -> Result<Self> {
        use reqwest::header::{AUTHORIZATION, HeaderValue};

        let mut builder = reqwest::Client::builder().user_agent("orgprobe");

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("token {t}"))?;
            auth_val.set_sensitive(true);

            let mut headers = HeaderMap::new();
            let _ = headers.insert(AUTHORIZATION, auth_val);

            builder = builder.default_headers(headers);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: base_url.into(),
        })
    }

    /// Get the base URL for this client.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one page of a paged REST listing.
    ///
    /// The returned cursor is the absolute `rel="next"` URL from the `Link`
    /// response header, or `None` on the final page.
    pub async fn get_page<T: DeserializeOwned>(&self, url: &str) -> ApiResult<Page<T>> {
        log::debug!(target: LOG_TARGET, "GET {url}");

        let resp = match self.http.get(url).send().await {
            Ok(r) => r,
            Err(e) => return ApiResult::Failed(e.into()),
        };

        if let Some(failure) = api::classify_status(resp.status(), resp.headers()) {
            return failure.into();
        }

        let next = next_cursor(resp.headers());

        match resp.json::<Vec<T>>().await {
            Ok(items) => ApiResult::Success(Page { items, next }),
            Err(e) => ApiResult::Failed(e.into()),
        }
    }

    /// Execute one GraphQL query.
    ///
    /// The query/variable pair is supplied per call; nothing about the
    /// request is shared between concurrent callers.
    pub async fn graphql<V: Serialize, T: DeserializeOwned>(&self, query: &str, variables: V) -> ApiResult<T> {
        let url = format!("{}/graphql", self.base_url);
        log::debug!(target: LOG_TARGET, "POST {url}");

        let resp = match self.http.post(&url).json(&GraphQlRequest { query, variables }).send().await {
            Ok(r) => r,
            Err(e) => return ApiResult::Failed(e.into()),
        };

        if let Some(failure) = api::classify_status(resp.status(), resp.headers()) {
            return failure.into();
        }

        let body: GraphQlResponse<T> = match resp.json().await {
            Ok(b) => b,
            Err(e) => return ApiResult::Failed(e.into()),
        };

        if !body.errors.is_empty() {
            return classify_graphql_errors(&body.errors);
        }

        match body.data {
            Some(data) => ApiResult::Success(data),
            None => ApiResult::Failed(ohno::app_err!("graphql response carried no data")),
        }
    }
}

/// Map GraphQL error types onto the call classification: `NOT_FOUND` and
/// `FORBIDDEN` indicate a visibility gap, everything else is transient.
fn classify_graphql_errors<T>(errors: &[GraphQlError]) -> ApiResult<T> {
    if errors.iter().any(|e| e.kind.as_deref() == Some("NOT_FOUND")) {
        return ApiResult::MissingAccess(StatusCode::NOT_FOUND);
    }
    if errors.iter().any(|e| e.kind.as_deref() == Some("FORBIDDEN")) {
        return ApiResult::MissingAccess(StatusCode::FORBIDDEN);
    }

    let messages = errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join("; ");
    ApiResult::Failed(ohno::app_err!("graphql query failed: {messages}"))
}

/// Extract the `rel="next"` URL from a `Link` response header.
fn next_cursor(headers: &HeaderMap) -> Option<CompactString> {
    let link = headers.get(LINK)?.to_str().ok()?;

    link.split(',').find_map(|part| {
        let (url_part, params) = part.split_once(';')?;
        params
            .contains(r#"rel="next""#)
            .then(|| url_part.trim().trim_start_matches('<').trim_end_matches('>').into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn next_cursor_from_link_header() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(
            LINK,
            HeaderValue::from_static(
                r#"<https://api.github.com/user/memberships/orgs?page=2>; rel="next", <https://api.github.com/user/memberships/orgs?page=5>; rel="last""#,
            ),
        );

        assert_eq!(
            next_cursor(&headers).unwrap(),
            "https://api.github.com/user/memberships/orgs?page=2"
        );
    }

    #[test]
    fn next_cursor_absent_on_final_page() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(
            LINK,
            HeaderValue::from_static(r#"<https://api.github.com/user/memberships/orgs?page=1>; rel="prev""#),
        );

        assert!(next_cursor(&headers).is_none());
        assert!(next_cursor(&HeaderMap::new()).is_none());
    }

    #[test]
    fn graphql_response_with_data() {
        let json = r#"{"data": {"value": 3}}"#;

        #[derive(Deserialize)]
        struct Payload {
            value: u32,
        }

        let resp: GraphQlResponse<Payload> = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data.unwrap().value, 3);
        assert!(resp.errors.is_empty());
    }

    #[test]
    fn graphql_not_found_error_is_missing_access() {
        let json = r#"{"data": null, "errors": [{"message": "Could not resolve to an Organization", "type": "NOT_FOUND"}]}"#;

        let resp: GraphQlResponse<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert!(matches!(
            classify_graphql_errors::<()>(&resp.errors),
            ApiResult::MissingAccess(StatusCode::NOT_FOUND)
        ));
    }

    #[test]
    fn graphql_untyped_error_is_transient() {
        let json = r#"{"errors": [{"message": "Something went wrong"}]}"#;

        let resp: GraphQlResponse<serde_json::Value> = serde_json::from_str(json).unwrap();
        assert!(matches!(classify_graphql_errors::<()>(&resp.errors), ApiResult::Failed(_)));
    }

    #[test]
    fn client_new_with_and_without_token() {
        let client = Client::new(None, "https://api.github.com").unwrap();
        assert_eq!(client.base_url(), "https://api.github.com");

        let client = Client::new(Some("test_token"), "http://127.0.0.1:9999").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9999");
    }
}
