use thiserror::Error;
use crate::combine::Combine;

const MISSING_FIELD: &str = "MissingField";

/// A failure reported by the remote API.
///
/// Network, auth, validation and throttling failures all land here; this
/// crate only cares whether a request succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: Option<String>,
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { code: None, message: message.into() }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: Some(code.into()), message: message.into() }
    }

    /// A successful reply that lacks a field this crate needs.
    pub fn missing_field(field: &str) -> Self {
        Self::with_code(MISSING_FIELD, format!("response is missing {field}"))
    }

    pub fn is_missing_field(&self) -> bool {
        self.code.as_deref() == Some(MISSING_FIELD)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetadata {
    pub operation: &'static str,
    pub request_id: Option<String>,
}

/// Per-request metadata in the order the requests were issued.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub requests: Vec<RequestMetadata>,
}

impl Metadata {
    pub fn single(operation: &'static str, request_id: Option<String>) -> Self {
        Self {
            requests: vec![RequestMetadata { operation, request_id }],
        }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl Combine for Metadata {
    fn combine(self, later: Self) -> Self {
        Self { requests: self.requests.combine(later.requests) }
    }
}

/// The outcome of one or more remote requests together with their metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<T, M = Metadata> {
    pub metadata: M,
    pub outcome: Result<T, ApiError>,
}

impl<T, M> Response<T, M> {
    pub fn ok(metadata: M, value: T) -> Self {
        Self { metadata, outcome: Ok(value) }
    }

    pub fn fail(metadata: M, error: ApiError) -> Self {
        Self { metadata, outcome: Err(error) }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn value(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        self.outcome
    }
}

impl<T> Response<T, Metadata> {
    /// Number of remote requests folded into this response.
    pub fn pages(&self) -> usize {
        self.metadata.len()
    }
}

/// Metadata always concatenates. Outcomes combine payloads when both sides
/// succeeded; otherwise the earliest failure wins and any later payload is
/// dropped.
impl<T: Combine, M: Combine> Combine for Response<T, M> {
    fn combine(self, later: Self) -> Self {
        let metadata = self.metadata.combine(later.metadata);
        let outcome = match (self.outcome, later.outcome) {
            (Ok(a), Ok(b)) => Ok(a.combine(b)),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), _) => Err(e),
        };

        Self { metadata, outcome }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(id: &str, values: &[u32]) -> Response<Vec<u32>> {
        Response::ok(Metadata::single("Test", Some(id.to_owned())), values.to_vec())
    }

    fn failed(id: &str, message: &str) -> Response<Vec<u32>> {
        Response::fail(Metadata::single("Test", Some(id.to_owned())), ApiError::new(message))
    }

    fn ids(response: &Response<Vec<u32>>) -> Vec<&str> {
        response.metadata.requests.iter()
            .filter_map(|r| r.request_id.as_deref())
            .collect()
    }

    #[test]
    fn success_with_success_merges_payloads() {
        let merged = page("a", &[1, 2]).combine(page("b", &[3]));
        assert_eq!(merged.outcome, Ok(vec![1, 2, 3]));
        assert_eq!(ids(&merged), ["a", "b"]);
    }

    #[test]
    fn success_with_failure_takes_the_failure() {
        let merged = page("a", &[1]).combine(failed("b", "Throttled"));
        assert_eq!(merged.outcome, Err(ApiError::new("Throttled")));
        assert_eq!(ids(&merged), ["a", "b"]);
    }

    #[test]
    fn first_failure_wins() {
        let merged = failed("a", "AccessDenied").combine(failed("b", "Throttled"));
        assert_eq!(merged.outcome, Err(ApiError::new("AccessDenied")));

        let merged = failed("a", "AccessDenied").combine(page("b", &[7]));
        assert_eq!(merged.outcome, Err(ApiError::new("AccessDenied")));
        assert_eq!(ids(&merged), ["a", "b"]);
    }

    #[test]
    fn combine_is_associative() {
        let left = page("a", &[1]).combine(page("b", &[2, 3])).combine(page("c", &[]));
        let right = page("a", &[1]).combine(page("b", &[2, 3]).combine(page("c", &[])));
        assert_eq!(left, right);
        assert_eq!(left.pages(), 3);
    }

    #[test]
    fn missing_field_is_recognisable() {
        let err = ApiError::missing_field("ChangeInfo");
        assert!(err.is_missing_field());
        assert_eq!(err.to_string(), "response is missing ChangeInfo");
        assert!(!ApiError::new("Throttled").is_missing_field());
    }

    #[test]
    fn api_error_displays_message() {
        let err = ApiError::with_code("Throttling", "Rate exceeded");
        assert_eq!(err.to_string(), "Rate exceeded");
    }
}
