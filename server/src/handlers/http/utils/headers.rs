use hyper::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

/// Extract a header value as a string
pub fn get_header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(|s| {
        debug!("Retrieved header: {}", name);
        s.to_string()
    })
}

/// Extract the bearer credential from `Authorization: Bearer <token>`.
/// The scheme is matched case-insensitively.
pub fn extract_bearer_credential(headers: &HeaderMap) -> Option<String> {
    let auth = get_header_value(headers, "authorization")?;
    let (scheme, token) = auth.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        warn!("Unsupported authorization scheme: {}", scheme);
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        warn!("Empty bearer token");
        return None;
    }
    debug!("Bearer token extracted");
    Some(token.to_string())
}

/// Add no-cache headers. Every API response carries them.
pub fn add_no_cache_headers<T>(mut res: hyper::Response<T>) -> hyper::Response<T> {
    let headers = res.headers_mut();

    headers.insert(
        "cache-control",
        HeaderValue::from_static("no-cache, no-store, max-age=0, must-revalidate"),
    );
    headers.insert("pragma", HeaderValue::from_static("no-cache"));
    headers.insert("expires", HeaderValue::from_static("0"));
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );

    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(
            extract_bearer_credential(&with_auth("Bearer abc.def.ghi")).as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(
            extract_bearer_credential(&with_auth("bearer tok")).as_deref(),
            Some("tok")
        );
    }

    #[test]
    fn other_schemes_are_rejected() {
        assert!(extract_bearer_credential(&with_auth("Basic dXNlcjpwYXNz")).is_none());
    }

    #[test]
    fn missing_or_empty_token_is_rejected() {
        assert!(extract_bearer_credential(&HeaderMap::new()).is_none());
        assert!(extract_bearer_credential(&with_auth("Bearer ")).is_none());
        assert!(extract_bearer_credential(&with_auth("Bearer")).is_none());
    }

    #[test]
    fn no_cache_headers_are_set() {
        let res = add_no_cache_headers(hyper::Response::new(()));
        assert_eq!(
            res.headers().get("cache-control").unwrap(),
            "no-cache, no-store, max-age=0, must-revalidate"
        );
        assert_eq!(res.headers().get("pragma").unwrap(), "no-cache");
    }
}
