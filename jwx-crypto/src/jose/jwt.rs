//! [`JWT`] or JSON Web Token as defined in [`rfc7519`]
//!
//! A [`Token`] is the claims set: an attribute container with typed slots
//! for the registered claims and an open bag for private ones. It is carried
//! as the payload of a compact JWS, see [`Token::sign`] and [`parse_verify`].
//!
//! Checking a signature and checking the claims are separate steps:
//! [`parse_verify`] only does the former, [`Token::verify`] the latter.
//!
//! [`JWT`]: https://datatracker.ietf.org/doc/html/rfc7519
//! [`rfc7519`]: https://datatracker.ietf.org/doc/html/rfc7519

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jwx_error::ErrorContext as _;
use jwx_utils::macros::generate_set_and_with;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};
use serde_json::{Map, Number, Value};

use super::header::{HeaderValue, Headers, describe, header_fields, type_mismatch};
use super::jwa::SignatureAlgorithm;
use super::jwk::Key;
use super::jws::{self, JWSBuilder, JWSCompact, KeySigner, Message};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Seconds since the unix epoch, with optional sub-second precision.
///
/// Read from a json integer or a non-negative finite fraction, written
/// back as an integer whenever it has no fractional part.
pub struct NumericDate(Duration);

impl NumericDate {
    /// The moment `secs` seconds after the unix epoch.
    #[must_use]
    pub const fn from_unix_seconds(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    /// The moment `duration` after the unix epoch.
    #[must_use]
    pub const fn from_duration(duration: Duration) -> Self {
        Self(duration)
    }

    /// Time since the unix epoch.
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        self.0
    }

    /// Whole seconds since the unix epoch.
    #[must_use]
    pub const fn as_unix_seconds(self) -> u64 {
        self.0.as_secs()
    }

    /// The current time according to the [`SystemClock`].
    #[must_use]
    pub fn now() -> Self {
        SystemClock.now()
    }
}

impl From<SystemTime> for NumericDate {
    /// Moments before the unix epoch are clamped to the epoch.
    fn from(time: SystemTime) -> Self {
        Self(time.duration_since(UNIX_EPOCH).unwrap_or_default())
    }
}

impl HeaderValue for NumericDate {
    fn from_header_value(name: &str, value: Value) -> Result<Self> {
        if let Some(secs) = value.as_u64() {
            return Ok(Self::from_unix_seconds(secs));
        }
        value
            .as_f64()
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .map(Self)
            .ok_or_else(|| type_mismatch(name, "a non-negative number of seconds", &value))
    }

    fn to_header_value(&self) -> Value {
        if self.0.subsec_nanos() == 0 {
            return Value::from(self.0.as_secs());
        }
        Number::from_f64(self.0.as_secs_f64())
            .map_or_else(|| Value::from(self.0.as_secs()), Value::Number)
    }
}

impl Serialize for NumericDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_header_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NumericDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_header_value("numeric date", value).map_err(|err| D::Error::custom(describe(&err)))
    }
}

header_fields! {
    /// Registered claims of a JWT, see section 4.1 of [`rfc7519`].
    ///
    /// [`rfc7519`]: https://datatracker.ietf.org/doc/html/rfc7519#section-4.1
    pub struct ClaimFields {
        aud: Vec<String> => "aud",
        exp: NumericDate => "exp",
        iat: NumericDate => "iat",
        iss: String => "iss",
        jti: String => "jti",
        nbf: NumericDate => "nbf",
        sub: String => "sub",
    }
}

/// The claims set of a JWT.
pub type Token = Headers<ClaimFields>;

impl Headers<ClaimFields> {
    /// The "aud" (audience) claim.
    ///
    /// A single string on the wire is read as a list of one.
    pub fn audience(&self) -> Option<&[String]> {
        self.fields.aud.as_deref()
    }

    /// The "exp" (expiration time) claim.
    pub fn expiration(&self) -> Option<NumericDate> {
        self.fields.exp
    }

    /// The "iat" (issued at) claim.
    pub fn issued_at(&self) -> Option<NumericDate> {
        self.fields.iat
    }

    /// The "iss" (issuer) claim.
    pub fn issuer(&self) -> Option<&str> {
        self.fields.iss.as_deref()
    }

    /// The "jti" (jwt id) claim.
    pub fn jwt_id(&self) -> Option<&str> {
        self.fields.jti.as_deref()
    }

    /// The "nbf" (not before) claim.
    pub fn not_before(&self) -> Option<NumericDate> {
        self.fields.nbf
    }

    /// The "sub" (subject) claim.
    pub fn subject(&self) -> Option<&str> {
        self.fields.sub.as_deref()
    }

    generate_set_and_with! {
        /// Set the "aud" claim
        pub fn audience(mut self, aud: Option<Vec<String>>) -> Self {
            self.fields.aud = aud;
            self
        }
    }

    generate_set_and_with! {
        /// Set the "exp" claim
        pub fn expiration(mut self, exp: Option<NumericDate>) -> Self {
            self.fields.exp = exp;
            self
        }
    }

    generate_set_and_with! {
        /// Set the "iat" claim
        pub fn issued_at(mut self, iat: Option<NumericDate>) -> Self {
            self.fields.iat = iat;
            self
        }
    }

    generate_set_and_with! {
        /// Set the "iss" claim
        pub fn issuer(mut self, iss: Option<String>) -> Self {
            self.fields.iss = iss;
            self
        }
    }

    generate_set_and_with! {
        /// Set the "jti" claim
        pub fn jwt_id(mut self, jti: Option<String>) -> Self {
            self.fields.jti = jti;
            self
        }
    }

    generate_set_and_with! {
        /// Set the "nbf" claim
        pub fn not_before(mut self, nbf: Option<NumericDate>) -> Self {
            self.fields.nbf = nbf;
            self
        }
    }

    generate_set_and_with! {
        /// Set the "sub" claim
        pub fn subject(mut self, sub: Option<String>) -> Self {
            self.fields.sub = sub;
            self
        }
    }

    /// Sign these claims with `alg` and `key` into a compact JWS.
    ///
    /// The protected header gets "alg" and `"typ": "JWT"`.
    pub fn sign(&self, alg: SignatureAlgorithm, key: &Key) -> Result<JWSCompact> {
        let payload = Value::Object(self.to_json_map()).to_string();
        let mut builder = JWSBuilder::new().with_payload(payload);
        builder.protected_headers_mut().set_typ("JWT".to_owned());
        builder.build_compact(&KeySigner::new(alg, key.clone()))
    }

    /// Check the time claims and the expected values of `options`.
    ///
    /// * "exp": fails once now is at or past it, plus the acceptable skew;
    /// * "nbf" and "iat": fail while now plus the acceptable skew is before them;
    /// * "iss", "sub" and "jti": must equal the expected value, if one is set;
    /// * "aud": must contain the expected value, if one is set.
    ///
    /// Absent time claims are not checked. Any failure is a
    /// [`ErrorKind::VerificationFailed`] error.
    ///
    /// [`ErrorKind::VerificationFailed`]: crate::error::ErrorKind::VerificationFailed
    pub fn verify(&self, options: &VerifyOptions) -> Result<()> {
        let now = options.clock.now().as_duration();
        let skew = options.acceptable_skew;
        let ahead = now.saturating_add(skew);

        if self
            .expiration()
            .is_some_and(|exp| now >= exp.as_duration().saturating_add(skew))
        {
            return Err(claim_rejected("exp"));
        }
        if self.issued_at().is_some_and(|iat| ahead < iat.as_duration()) {
            return Err(claim_rejected("iat"));
        }
        if self.not_before().is_some_and(|nbf| ahead < nbf.as_duration()) {
            return Err(claim_rejected("nbf"));
        }

        if !expect(options.issuer.as_deref(), self.issuer()) {
            return Err(claim_rejected("iss"));
        }
        if !expect(options.subject.as_deref(), self.subject()) {
            return Err(claim_rejected("sub"));
        }
        if !expect(options.jwt_id.as_deref(), self.jwt_id()) {
            return Err(claim_rejected("jti"));
        }
        if let Some(expected) = options.audience.as_deref() {
            let found = self
                .audience()
                .is_some_and(|aud| aud.iter().any(|aud| aud == expected));
            if !found {
                return Err(claim_rejected("aud"));
            }
        }

        Ok(())
    }
}

fn expect(expected: Option<&str>, found: Option<&str>) -> bool {
    expected.is_none_or(|expected| found == Some(expected))
}

fn claim_rejected(claim: &'static str) -> Error {
    tracing::debug!(claim, "jwt claim check failed");
    Error::verification_failed()
}

/// Parse a JWT without verifying its signature.
///
/// The JWS may be in any serialization. Do not trust the result
/// for anything but picking the key to verify it with.
pub fn parse(src: &str) -> Result<Token> {
    let message = Message::parse(src)?;
    claims_from_payload(message.payload())
}

/// Parse a JWT and verify its signature with `alg` and `key`.
///
/// The claims are not checked, see [`Token::verify`].
pub fn parse_verify(src: &str, alg: SignatureAlgorithm, key: &Key) -> Result<Token> {
    let payload = jws::verify(src, alg, key)?;
    claims_from_payload(&payload)
}

fn claims_from_payload(payload: &[u8]) -> Result<Token> {
    let map: Map<String, Value> = serde_json::from_slice(payload)
        .context("parse jwt claims json object")
        .map_err(Error::malformed_input)?;
    Token::from_json_map(map)
}

/// Source of the current time for [`Token::verify`].
pub trait Clock: Send + Sync + 'static {
    /// The current time.
    fn now(&self) -> NumericDate;
}

#[derive(Debug, Clone, Copy, Default)]
/// [`Clock`] reading the system time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NumericDate {
        SystemTime::now().into()
    }
}

impl<F> Clock for F
where
    F: Fn() -> NumericDate + Send + Sync + 'static,
{
    fn now(&self) -> NumericDate {
        self()
    }
}

#[derive(Clone)]
/// Options for [`Token::verify`].
///
/// By default the [`SystemClock`] is used without any skew,
/// and no claim values are expected.
pub struct VerifyOptions {
    clock: Arc<dyn Clock>,
    clock_name: &'static str,
    acceptable_skew: Duration,
    issuer: Option<String>,
    subject: Option<String>,
    audience: Option<String>,
    jwt_id: Option<String>,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            clock_name: std::any::type_name::<SystemClock>(),
            acceptable_skew: Duration::ZERO,
            issuer: None,
            subject: None,
            audience: None,
            jwt_id: None,
        }
    }
}

impl fmt::Debug for VerifyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyOptions")
            .field("clock", &self.clock_name)
            .field("acceptable_skew", &self.acceptable_skew)
            .field("issuer", &self.issuer)
            .field("subject", &self.subject)
            .field("audience", &self.audience)
            .field("jwt_id", &self.jwt_id)
            .finish()
    }
}

impl VerifyOptions {
    /// Create options with the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The acceptable clock skew.
    pub fn acceptable_skew(&self) -> Duration {
        self.acceptable_skew
    }

    generate_set_and_with! {
        /// Set the [`Clock`] used to get the current time
        pub fn clock(mut self, clock: impl Clock) -> Self {
            self.clock_name = std::any::type_name_of_val(&clock);
            self.clock = Arc::new(clock);
            self
        }
    }

    generate_set_and_with! {
        /// Set the clock skew tolerated on each time claim
        pub fn acceptable_skew(mut self, skew: Duration) -> Self {
            self.acceptable_skew = skew;
            self
        }
    }

    generate_set_and_with! {
        /// Expect this "iss" claim
        pub fn issuer(mut self, iss: Option<String>) -> Self {
            self.issuer = iss;
            self
        }
    }

    generate_set_and_with! {
        /// Expect this "sub" claim
        pub fn subject(mut self, sub: Option<String>) -> Self {
            self.subject = sub;
            self
        }
    }

    generate_set_and_with! {
        /// Expect this value among the "aud" claim
        pub fn audience(mut self, aud: Option<String>) -> Self {
            self.audience = aud;
            self
        }
    }

    generate_set_and_with! {
        /// Expect this "jti" claim
        pub fn jwt_id(mut self, jti: Option<String>) -> Self {
            self.jwt_id = jti;
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::jose::jwk::{RsaKeySize, RsaPrivateKey, SymmetricKey};

    const A_LONG_LONG_TIME_AGO: u64 = 233_431_200;

    fn fixed(secs: u64) -> impl Fn() -> NumericDate + Send + Sync + 'static {
        move || NumericDate::from_unix_seconds(secs)
    }

    #[test]
    fn issued_now_is_valid_without_skew() {
        let now = NumericDate::now();
        let token = Token::new().with_issued_at(now);
        let options = VerifyOptions::new()
            .with_clock(move || now)
            .with_acceptable_skew(Duration::ZERO);
        assert_ok!(token.verify(&options));
    }

    #[test]
    fn debug_does_not_read_the_clock() {
        let reads = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = reads.clone();
        let options = VerifyOptions::new()
            .with_clock(move || {
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                NumericDate::from_unix_seconds(A_LONG_LONG_TIME_AGO)
            })
            .with_issuer("joe".to_owned());

        let debug = format!("{options:?}");
        assert!(debug.contains("clock"));
        assert!(debug.contains("joe"));
        assert_eq!(reads.load(std::sync::atomic::Ordering::SeqCst), 0);

        assert!(format!("{:?}", VerifyOptions::new()).contains("SystemClock"));
    }

    #[test]
    fn single_audience_serializes_as_list() {
        let token: Token = serde_json::from_str(r#"{"aud":"foo"}"#).unwrap();
        assert_eq!(token.audience(), Some(&["foo".to_owned()][..]));
        assert_eq!(serde_json::to_string(&token).unwrap(), r#"{"aud":["foo"]}"#);
    }

    #[test]
    fn numeric_dates() {
        let token: Token =
            serde_json::from_value(json!({"iat": A_LONG_LONG_TIME_AGO, "nbf": 1.5})).unwrap();
        assert_eq!(
            token.issued_at(),
            Some(NumericDate::from_unix_seconds(A_LONG_LONG_TIME_AGO))
        );
        assert_eq!(
            token.not_before(),
            Some(NumericDate::from_duration(Duration::from_millis(1500)))
        );
        assert_eq!(
            serde_json::to_value(&token).unwrap(),
            json!({"iat": A_LONG_LONG_TIME_AGO, "nbf": 1.5})
        );

        for value in [json!(-1), json!("233431200"), json!(null)] {
            let err = assert_err!(Token::new().try_with_header("exp", value));
            assert!(err.is_type_mismatch());
        }
    }

    #[test]
    fn time_claims_respect_skew() {
        let token = Token::new()
            .with_not_before(NumericDate::from_unix_seconds(100))
            .with_expiration(NumericDate::from_unix_seconds(200));

        for (now, skew, valid) in [
            (150, 0, true),
            (100, 0, true),
            (99, 0, false),
            (95, 5, true),
            (200, 0, false),
            (199, 0, true),
            (204, 5, true),
            (205, 5, false),
        ] {
            let options = VerifyOptions::new()
                .with_clock(fixed(now))
                .with_acceptable_skew(Duration::from_secs(skew));
            assert_eq!(token.verify(&options).is_ok(), valid, "now = {now}, skew = {skew}");
        }

        let future = Token::new().with_issued_at(NumericDate::from_unix_seconds(100));
        let err = assert_err!(future.verify(&VerifyOptions::new().with_clock(fixed(90))));
        assert!(err.is_verification_failed());
    }

    #[test]
    fn expected_claim_values() {
        let token = Token::new()
            .with_issuer("https://issuer.example".to_owned())
            .with_subject("alice".to_owned())
            .with_audience(vec!["api".to_owned(), "web".to_owned()])
            .with_jwt_id("1".to_owned());

        assert_ok!(token.verify(&VerifyOptions::new()));
        assert_ok!(token.verify(
            &VerifyOptions::new()
                .with_issuer("https://issuer.example".to_owned())
                .with_subject("alice".to_owned())
                .with_audience("web".to_owned())
                .with_jwt_id("1".to_owned())
        ));

        for options in [
            VerifyOptions::new().with_issuer("https://other.example".to_owned()),
            VerifyOptions::new().with_subject("bob".to_owned()),
            VerifyOptions::new().with_audience("mobile".to_owned()),
            VerifyOptions::new().with_jwt_id("2".to_owned()),
        ] {
            let err = assert_err!(token.verify(&options));
            assert!(err.is_verification_failed(), "{options:?}");
        }

        let err = assert_err!(
            Token::new().verify(&VerifyOptions::new().with_audience("api".to_owned()))
        );
        assert!(err.is_verification_failed());
    }

    #[test]
    fn sign_and_parse_verify() {
        let key: Key = RsaPrivateKey::generate(RsaKeySize::Rsa2048).unwrap().into();
        let token = Token::new()
            .with_issued_at(NumericDate::from_unix_seconds(A_LONG_LONG_TIME_AGO))
            .try_with_header("admin", true)
            .unwrap();

        let jws = token.sign(SignatureAlgorithm::RS256, &key).unwrap();
        let message = Message::parse(jws.as_str()).unwrap();
        let headers = message.signatures()[0].protected_headers();
        assert_eq!(headers.algorithm(), Some(SignatureAlgorithm::RS256));
        assert_eq!(headers.typ(), Some("JWT"));

        let parsed = assert_ok!(parse_verify(
            jws.as_str(),
            SignatureAlgorithm::RS256,
            &key.public_key()
        ));
        assert_eq!(parsed, token);
        assert_eq!(assert_ok!(parse(jws.as_str())), token);

        let err = assert_err!(parse_verify(
            jws.as_str(),
            SignatureAlgorithm::RS512,
            &key.public_key()
        ));
        assert!(err.is_verification_failed());

        let other: Key = RsaPrivateKey::generate(RsaKeySize::Rsa2048).unwrap().into();
        let err = assert_err!(parse_verify(
            jws.as_str(),
            SignatureAlgorithm::RS256,
            &other.public_key()
        ));
        assert!(err.is_verification_failed());
    }

    #[test]
    fn payload_must_be_a_json_object() {
        let key: Key = SymmetricKey::new(vec![9; 32]).into();
        let jws = jws::sign("[1, 2]", SignatureAlgorithm::HS256, &key).unwrap();
        let err = assert_err!(parse(jws.as_str()));
        assert!(err.is_malformed_input());
        let err = assert_err!(parse_verify(jws.as_str(), SignatureAlgorithm::HS256, &key));
        assert!(err.is_malformed_input());
    }
}
