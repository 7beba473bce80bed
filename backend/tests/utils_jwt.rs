use catalog_backend::utils::jwt::{
    create_access_token, create_refresh_token, decode_token_allow_expired, verify_token, Claims,
    TOKEN_TYPE_ACCESS,
};

fn make_access(secret: &str) -> (String, Claims) {
    create_access_token(
        "user-123".into(),
        "tester@example.com".into(),
        Some("company-1".into()),
        "manager".into(),
        secret,
        30,
    )
    .expect("create token")
}

#[test]
fn jwt_create_and_verify_access_token() {
    let (token, claims) = make_access("testsecret");

    assert!(!token.is_empty());
    assert_eq!(claims.sub, "user-123");
    assert_eq!(claims.tenant_id.as_deref(), Some("company-1"));
    assert_eq!(claims.role, "manager");
    assert_eq!(claims.token_type, TOKEN_TYPE_ACCESS);

    let verified = verify_token(&token, "testsecret").expect("verify token");
    assert_eq!(verified.jti, claims.jti);
}

#[test]
fn jwt_verify_with_wrong_secret_fails() {
    let (token, _) = make_access("secret1");
    assert!(verify_token(&token, "secret2").is_err());
}

#[test]
fn jwt_expired_token_fails_verification_but_decodes_leniently() {
    let expired_claims = Claims {
        sub: "user-123".into(),
        email: "tester@example.com".into(),
        tenant_id: None,
        role: "user".into(),
        token_type: "refresh".into(),
        exp: chrono::Utc::now().timestamp() - 3600,
        iat: chrono::Utc::now().timestamp() - 7200,
        jti: uuid::Uuid::new_v4().to_string(),
    };

    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &expired_claims,
        &jsonwebtoken::EncodingKey::from_secret("secret".as_ref()),
    )
    .expect("encode token");

    assert!(verify_token(&token, "secret").is_err());

    let decoded = decode_token_allow_expired(&token, "secret").expect("lenient decode");
    assert_eq!(decoded.jti, expired_claims.jti);
}

#[test]
fn jwt_malformed_token_fails() {
    assert!(verify_token("invalid.token.here", "secret").is_err());
}

#[test]
fn jwt_refresh_token_carries_type_and_tenant() {
    let (token, claims) = create_refresh_token(
        "user-9".into(),
        "nine@example.com".into(),
        Some("company-9".into()),
        "admin".into(),
        "secret",
        7,
    )
    .expect("create refresh token");

    assert!(claims.is_refresh());
    let verified = verify_token(&token, "secret").expect("verify token");
    assert!(verified.is_refresh());
    assert_eq!(verified.tenant_id.as_deref(), Some("company-9"));
}

#[test]
fn jwt_claims_have_unique_jti() {
    let (_, claims1) = make_access("secret");
    let (_, claims2) = make_access("secret");
    assert_ne!(claims1.jti, claims2.jti);
}

#[test]
fn jwt_access_expiration_set_from_minutes() {
    let (_, claims) = create_access_token(
        "user".into(),
        "u@example.com".into(),
        None,
        "user".into(),
        "secret",
        45,
    )
    .unwrap();

    let expected_exp = claims.iat + 45 * 60;
    assert!((claims.exp - expected_exp).abs() <= 1);
}

#[test]
fn jwt_tenantless_token_omits_claim() {
    let (token, _) = create_access_token(
        "root".into(),
        "root@example.com".into(),
        None,
        "admin".into(),
        "secret",
        30,
    )
    .unwrap();
    let claims = verify_token(&token, "secret").expect("verify token");
    assert!(claims.tenant_id.is_none());
}
