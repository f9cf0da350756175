/// Integration-level tests for the `shared` crate.
///
/// Each section tests one module; unit tests that are tightly coupled to
/// private helpers live inside the modules themselves (see `#[cfg(test)]`
/// blocks in `claims.rs` and `server_config.rs`).
// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------
#[cfg(test)]
mod claims_tests {
    use shared::types::*;

    fn sample_claims() -> GameClaims {
        GameClaims {
            user_id: "7c9e6679-7425-40de-944b-e07fc1f90ae7".to_string(),
            username: "Prothean".to_string(),
            user_email: "prothean@example.com".to_string(),
            is_admin: false,
            aud: USER_AUDIENCE.to_string(),
            exp: 9_999_999_999,
            jti: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            iat: 1_700_000_000,
            iss: TOKEN_ISSUER.to_string(),
            nbf: 1_700_000_000,
            sub: String::new(),
        }
    }

    #[test]
    fn claims_json_uses_token_field_names() {
        let json = serde_json::to_value(sample_claims()).unwrap();
        for key in &[
            "user_id",
            "username",
            "user_email",
            "aud",
            "exp",
            "jti",
            "iat",
            "iss",
            "nbf",
        ] {
            assert!(json.get(key).is_some(), "missing key: {}", key);
        }
    }

    #[test]
    fn false_admin_flag_and_empty_subject_are_omitted() {
        let json = serde_json::to_value(sample_claims()).unwrap();
        assert!(json.get("is_admin").is_none());
        assert!(json.get("sub").is_none());
    }

    #[test]
    fn service_audience_is_privileged() {
        let mut c = sample_claims();
        c.aud = SERVICE_AUDIENCE.to_string();
        assert!(c.is_service());
        assert!(c.is_privileged());
    }

    #[test]
    fn admin_is_privileged_without_service_audience() {
        let mut c = sample_claims();
        c.is_admin = true;
        assert!(!c.is_service());
        assert!(c.is_privileged());
    }

    #[test]
    fn plain_user_is_not_privileged() {
        assert!(!sample_claims().is_privileged());
    }

    #[test]
    fn expiry_compares_against_now() {
        let c = sample_claims();
        assert!(!c.is_expired(1_700_000_000));
        assert!(c.is_expired(10_000_000_000));
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------
#[cfg(test)]
mod wire_tests {
    use shared::types::*;

    #[test]
    fn login_accepts_username_or_email_alias() {
        let by_name: LoginData =
            serde_json::from_str(r#"{"username":"Prothean","password":"pw"}"#).unwrap();
        let by_email: LoginData =
            serde_json::from_str(r#"{"email":"p@example.com","password":"pw"}"#).unwrap();
        assert_eq!(by_name.id, "Prothean");
        assert_eq!(by_email.id, "p@example.com");
    }

    #[test]
    fn store_item_type_serializes_as_type() {
        let req: CreateStoreItemRequest = serde_json::from_str(
            r#"{"name":"Sword","type":1,"coins_price":100,"image_id":"img-1"}"#,
        )
        .unwrap();
        assert_eq!(req.item_type, 1);
        assert_eq!(req.gems_price, 0);
        assert_eq!(req.description, "");
    }

    #[test]
    fn update_item_without_on_sale_leaves_it_unset() {
        let req: UpdateStoreItemRequest = serde_json::from_str(r#"{"name":"Axe"}"#).unwrap();
        assert_eq!(req.on_sale, None);
        assert_eq!(req.sale_coins_price, 0);
    }

    #[test]
    fn grant_defaults_missing_deltas_to_zero() {
        let req: GrantCurrenciesRequest = serde_json::from_str(r#"{"add_gems":5}"#).unwrap();
        assert_eq!(req.add_coins, 0);
        assert_eq!(req.add_gems, 5);
    }

    #[test]
    fn error_response_has_error_status() {
        let err = ErrorResponse::new("NOT_FOUND", "Item not found");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "NOT_FOUND");
    }

    #[test]
    fn success_response_skips_missing_data() {
        let ok: SuccessResponse<UserItemsResponse> = SuccessResponse::new(None);
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "success");
        assert!(json.get("data").is_none());
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------
#[cfg(test)]
mod config_tests {
    use std::io::Write;

    use shared::config::load_config;
    use shared::types::ConfigError;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn valid_file_loads() {
        let file = write_config(
            r#"
            [server]
            bind = "0.0.0.0"
            port = 9000

            [database]
            url = "sqlite::memory:"

            [auth]
            jwt_secret = "0123456789abcdef0123456789abcdef"
            token_expiry_minutes = 60
            "#,
        );
        let cfg = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.auth.token_expiry_minutes, 60);
    }

    #[test]
    fn empty_file_is_rejected() {
        let file = write_config("   \n");
        let err = load_config(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig(_)));
    }

    #[test]
    fn zero_token_expiry_is_rejected() {
        let file = write_config(
            r#"
            [server]
            bind = "0.0.0.0"

            [auth]
            jwt_secret = "0123456789abcdef0123456789abcdef"
            token_expiry_minutes = 0
            "#,
        );
        let err = load_config(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfig(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let file = write_config("[server\nbind = ");
        let err = load_config(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_config("/definitely/not/here/config.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
