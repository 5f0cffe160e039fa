//! Error and Result module.

use std::error::Error as StdError;
use std::fmt;

use jwx_error::{BoxError, OpaqueError};

/// Result type returned by the jose APIs.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type Cause = BoxError;

/// Represents errors that can occur while parsing keys, signing or verifying.
///
/// # Formatting
///
/// The `Display` implementation of this type only prints the kind of failure,
/// even though it may have been caused by another error and contain that
/// error in its source. Walk the source chain (for example with
/// [`jwx_error::ErrorExt::chain`]) to see which field or step failed.
///
/// Verification failures never carry a cause.
pub struct Error {
    inner: Box<ErrorImpl>,
}

struct ErrorImpl {
    kind: ErrorKind,
    cause: Option<Cause>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
/// The category of an [`Error`].
pub enum ErrorKind {
    /// Invalid JSON, invalid base64 or an invalid big-integer encoding.
    MalformedInput,
    /// A field required for the resolved key type or message is missing.
    SchemaViolation,
    /// An unrecognized `kty`, `crv`, `alg` or `key_ops` literal.
    UnknownSymbol,
    /// A value of the wrong shape was given to a typed attribute,
    /// or a key does not fit the requested algorithm.
    TypeMismatch,
    /// A signature or token did not verify.
    VerificationFailed,
    /// The algorithm has no implementation for the requested operation.
    UnsupportedAlgorithm,
    /// The cryptographic provider rejected the key material or failed.
    Crypto,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self {
            inner: Box::new(ErrorImpl { kind, cause: None }),
        }
    }

    pub(crate) fn with<C: Into<Cause>>(mut self, cause: C) -> Self {
        self.inner.cause = Some(cause.into());
        self
    }

    pub(crate) fn malformed_input<C: Into<Cause>>(cause: C) -> Self {
        Self::new(ErrorKind::MalformedInput).with(cause)
    }

    pub(crate) fn schema_violation(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::SchemaViolation).with(OpaqueError::from_display(msg.into()))
    }

    pub(crate) fn unknown_symbol(kind: &'static str, value: &str) -> Self {
        Self::new(ErrorKind::UnknownSymbol).with(OpaqueError::from_display(format!(
            "unknown {kind}: {value:?}"
        )))
    }

    pub(crate) fn type_mismatch<C: Into<Cause>>(cause: C) -> Self {
        Self::new(ErrorKind::TypeMismatch).with(cause)
    }

    pub(crate) fn verification_failed() -> Self {
        Self::new(ErrorKind::VerificationFailed)
    }

    pub(crate) fn unsupported_algorithm<C: Into<Cause>>(cause: C) -> Self {
        Self::new(ErrorKind::UnsupportedAlgorithm).with(cause)
    }

    pub(crate) fn crypto<C: Into<Cause>>(cause: C) -> Self {
        Self::new(ErrorKind::Crypto).with(cause)
    }

    /// The [`ErrorKind`] of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.inner.kind
    }

    /// Returns true if the input could not be decoded.
    #[must_use]
    pub fn is_malformed_input(&self) -> bool {
        self.inner.kind == ErrorKind::MalformedInput
    }

    /// Returns true if a required field was missing.
    #[must_use]
    pub fn is_schema_violation(&self) -> bool {
        self.inner.kind == ErrorKind::SchemaViolation
    }

    /// Returns true if an unrecognized symbol was encountered.
    #[must_use]
    pub fn is_unknown_symbol(&self) -> bool {
        self.inner.kind == ErrorKind::UnknownSymbol
    }

    /// Returns true if a value or key had the wrong type.
    #[must_use]
    pub fn is_type_mismatch(&self) -> bool {
        self.inner.kind == ErrorKind::TypeMismatch
    }

    /// Returns true if verification failed.
    #[must_use]
    pub fn is_verification_failed(&self) -> bool {
        self.inner.kind == ErrorKind::VerificationFailed
    }

    /// Returns true if the algorithm is not supported for the operation.
    #[must_use]
    pub fn is_unsupported_algorithm(&self) -> bool {
        self.inner.kind == ErrorKind::UnsupportedAlgorithm
    }

    /// Returns true if the crypto provider reported the failure.
    #[must_use]
    pub fn is_crypto(&self) -> bool {
        self.inner.kind == ErrorKind::Crypto
    }

    fn description(&self) -> &'static str {
        match self.inner.kind {
            ErrorKind::MalformedInput => "malformed input",
            ErrorKind::SchemaViolation => "schema violation",
            ErrorKind::UnknownSymbol => "unknown symbol",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::VerificationFailed => "verification failed",
            ErrorKind::UnsupportedAlgorithm => "unsupported algorithm",
            ErrorKind::Crypto => "crypto provider error",
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_tuple("jwx_crypto::Error");
        f.field(&self.inner.kind);
        if let Some(ref cause) = self.inner.cause {
            f.field(cause);
        }
        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .cause
            .as_ref()
            .map(|cause| &**cause as &(dyn StdError + 'static))
    }
}
