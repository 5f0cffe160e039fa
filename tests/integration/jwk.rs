use jwx::error::ErrorKind;
use jwx::jose::{
    EllipticCurve, Key, KeySet, KeyType, RawKey, SignatureAlgorithm, jwk::RsaKeySize,
    jwk::RsaPrivateKey,
};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

const RFC_7517_A1: &str = r#"{"keys":
  [
    {"kty":"EC",
     "crv":"P-256",
     "x":"MKBCTNIcKUSDii11ySs3526iDZ8AiTo7Tu6KPAqv7D4",
     "y":"4Etl6SRW2YiLUrN5vfvVHuhp7x8PxltmWWlbbM4IFyM",
     "use":"enc",
     "kid":"1"},

    {"kty":"RSA",
     "n": "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw",
     "e":"AQAB",
     "alg":"RS256",
     "kid":"2011-04-29"}
  ]
}"#;

#[test]
fn rfc_7517_public_key_set() {
    let keys = assert_ok!(KeySet::parse(RFC_7517_A1));
    assert_eq!(keys.len(), 2);

    let ec = keys.lookup_key_id("1");
    assert_eq!(ec.len(), 1);
    assert_eq!(ec[0].key_type(), KeyType::Ec);
    assert_eq!(ec[0].headers().key_use(), Some("enc"));
    assert!(!ec[0].is_secret());
    match ec[0] {
        Key::EcPublic(key) => assert_eq!(key.curve(), EllipticCurve::P256),
        other => panic!("unexpected key: {other:?}"),
    }

    let rsa = keys.lookup_key_id("2011-04-29");
    assert_eq!(rsa[0].headers().signature_algorithm(), Some(SignatureAlgorithm::RS256));
    assert_ok!(rsa[0].materialize());

    let thumbprint = assert_ok!(rsa[0].thumbprint_sha256());
    let thumbprint: &[u8] = thumbprint.as_ref();
    assert_eq!(
        thumbprint,
        base64_url(b"NzbLsXh8uDCcd-6MNwXF4W_7noWXFZAfHkxZsRGC9Xs").as_slice()
    );

    let written = serde_json::to_value(&keys).unwrap();
    let read: KeySet = serde_json::from_value(written).unwrap();
    assert_eq!(read, keys);
}

fn base64_url(encoded: &[u8]) -> Vec<u8> {
    use base64::Engine as _;
    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(encoded)
        .unwrap()
}

#[test]
fn one_bad_member_fails_the_whole_set() {
    let err = assert_err!(KeySet::parse(
        &json!({"keys": [
            {"kty": "oct", "k": "AyM1SysPpbyDfgZld3umj1qzKObwVMkoqQ"},
            {"kty": "EC", "crv": "P-256", "x": "MKBCTNIcKUSDii11ySs3526iDZ8AiTo7Tu6KPAqv7D4"},
        ]})
        .to_string()
    ));
    assert_eq!(err.kind(), ErrorKind::SchemaViolation);

    let err = assert_err!(KeySet::parse(r#"{"keys": [{"kty": "OKP"}]}"#));
    assert_eq!(err.kind(), ErrorKind::UnknownSymbol);

    let err = assert_err!(KeySet::parse("[]"));
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[test]
fn private_keys_publish_only_public_members() {
    let private: Key = RsaPrivateKey::generate(RsaKeySize::Rsa2048)
        .unwrap()
        .into();
    let private = private.try_with_header("kid", "signing").unwrap();
    assert!(private.is_secret());
    assert!(private.to_json_map().contains_key("d"));

    let public = private.public_key();
    let map = public.to_json_map();
    for member in ["d", "p", "q", "dp", "dq", "qi"] {
        assert!(!map.contains_key(member), "{member}");
    }
    assert_eq!(map["kid"], json!("signing"));
    let public_thumbprint = assert_ok!(public.thumbprint_sha256());
    let private_thumbprint = assert_ok!(private.thumbprint_sha256());
    let public_thumbprint: &[u8] = public_thumbprint.as_ref();
    let private_thumbprint: &[u8] = private_thumbprint.as_ref();
    assert_eq!(public_thumbprint, private_thumbprint);

    let raw = assert_ok!(RawKey::from_json_map(private.to_json_map()));
    assert_eq!(assert_ok!(raw.into_key()), private);
}
