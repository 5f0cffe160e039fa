use std::time::Duration;

use jwx::jose::{
    EcPrivateKey, EllipticCurve, Key, KeySet, NumericDate, SignatureAlgorithm, Token,
    VerifyOptions, jws, jwt,
};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use crate::jws::{RFC_7515_A1_JWS, RFC_7515_A1_KEY};

#[test]
fn rfc_7515_example_is_a_token() {
    let key = Key::parse(RFC_7515_A1_KEY).unwrap();
    let token = assert_ok!(jwt::parse_verify(
        RFC_7515_A1_JWS,
        SignatureAlgorithm::HS256,
        &key
    ));

    assert_eq!(token.issuer(), Some("joe"));
    assert_eq!(token.expiration(), Some(NumericDate::from_unix_seconds(1_300_819_380)));
    assert_eq!(token.get("http://example.com/is_root"), Some(json!(true)));

    let before = VerifyOptions::new().with_clock(|| NumericDate::from_unix_seconds(1_300_819_379));
    assert_ok!(token.verify(&before));

    let at = VerifyOptions::new().with_clock(|| NumericDate::from_unix_seconds(1_300_819_380));
    let err = assert_err!(token.verify(&at));
    assert!(err.is_verification_failed());

    let tolerant = at.with_acceptable_skew(Duration::from_secs(30));
    assert_ok!(token.verify(&tolerant));

    // expired, yet the signature itself still verifies
    assert_eq!(assert_ok!(jwt::parse(RFC_7515_A1_JWS)), token);
}

#[test]
fn issue_and_accept_with_key_set() {
    let now = NumericDate::from_unix_seconds(1_700_000_000);
    let signing: Key = EcPrivateKey::generate(EllipticCurve::P521)
        .unwrap()
        .into();
    let signing = signing.try_with_header("kid", "2023-11").unwrap();

    let token = Token::new()
        .with_issuer("https://issuer.example".to_owned())
        .with_subject("user-1".to_owned())
        .with_audience(vec!["api".to_owned()])
        .with_issued_at(now)
        .with_not_before(now)
        .with_expiration(NumericDate::from_unix_seconds(1_700_000_600))
        .try_with_header("scope", "read write")
        .unwrap();
    let compact = token.sign(SignatureAlgorithm::ES512, &signing).unwrap();

    let keys: KeySet = [signing.public_key()].into_iter().collect();
    let payload = assert_ok!(jws::verify_with_key_set(compact.as_str(), &keys));
    let received: Token = serde_json::from_slice(&payload).unwrap();
    assert_eq!(received, token);

    let options = VerifyOptions::new()
        .with_clock(move || now)
        .with_issuer("https://issuer.example".to_owned())
        .with_audience("api".to_owned());
    assert_ok!(received.verify(&options));

    let wrong_audience = options.clone().with_audience("admin".to_owned());
    assert!(assert_err!(received.verify(&wrong_audience)).is_verification_failed());

    let too_early = options.with_clock(|| NumericDate::from_unix_seconds(1_699_999_999));
    assert!(assert_err!(received.verify(&too_early)).is_verification_failed());
}

#[test]
fn unsigned_tokens_are_never_accepted() {
    let token = Token::new().with_subject("nobody".to_owned());
    let key: Key = EcPrivateKey::generate(EllipticCurve::P256).unwrap().into();

    let compact = jws::JWSBuilder::new()
        .with_payload(serde_json::to_vec(&token).unwrap())
        .build_compact(&jws::KeySigner::unsecured())
        .unwrap();
    assert!(compact.as_str().ends_with('.'));
    assert_eq!(assert_ok!(jwt::parse(compact.as_str())), token);

    for alg in [SignatureAlgorithm::NoSignature, SignatureAlgorithm::ES256] {
        let err = assert_err!(jwt::parse_verify(compact.as_str(), alg, &key));
        assert!(err.is_verification_failed());
    }
}
