use bytes::Bytes;
use hyper::Request;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{ServiceError, ServiceResult};

/// Parse a collected JSON body. An empty body reads as `{}` so requests
/// whose fields all have defaults may omit it.
pub fn parse_json<T: DeserializeOwned>(req: &Request<Bytes>) -> ServiceResult<T> {
    let body = req.body();
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };

    serde_json::from_slice(raw).map_err(|e| {
        warn!("Malformed JSON body on {}: {}", req.uri().path(), e);
        ServiceError::InvalidArgument(format!("Malformed request body: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::types::{CreateUserRequest, GrantCurrenciesRequest};

    fn request(body: &'static str) -> Request<Bytes> {
        Request::builder()
            .uri("/v1/test")
            .body(Bytes::from_static(body.as_bytes()))
            .unwrap()
    }

    #[test]
    fn empty_body_uses_defaults() {
        let grant: GrantCurrenciesRequest = parse_json(&request("")).unwrap();
        assert_eq!(grant.add_coins, 0);
        assert_eq!(grant.add_gems, 0);
    }

    #[test]
    fn missing_required_field_is_invalid_argument() {
        let err = parse_json::<CreateUserRequest>(&request(r#"{"name":"bob"}"#)).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }

    #[test]
    fn garbage_is_invalid_argument() {
        let err = parse_json::<GrantCurrenciesRequest>(&request("not json")).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }
}
