//! [`JWA`] or JSON Web Algorithms as defined in [`rfc7518`]
//!
//! Every value in this module is a closed, string-backed symbol.
//! `accept` is the only way an externally supplied string becomes one of them:
//! the match is exact and case-sensitive, and anything else is rejected
//! with an [`ErrorKind::UnknownSymbol`] error.
//!
//! [`JWA`]: https://datatracker.ietf.org/doc/html/rfc7518
//! [`rfc7518`]: https://datatracker.ietf.org/doc/html/rfc7518
//! [`ErrorKind::UnknownSymbol`]: crate::error::ErrorKind::UnknownSymbol

use std::borrow::Cow;

use aws_lc_rs::signature::{
    ECDSA_P256_SHA256_FIXED, ECDSA_P256_SHA256_FIXED_SIGNING, ECDSA_P384_SHA384_FIXED,
    ECDSA_P384_SHA384_FIXED_SIGNING, ECDSA_P521_SHA512_FIXED, ECDSA_P521_SHA512_FIXED_SIGNING,
    EcdsaSigningAlgorithm, EcdsaVerificationAlgorithm,
};
use jwx_utils::macros::enums::enum_builder;
use serde::{Deserialize, Deserializer, de::Error as _};

use crate::error::{Error, Result};
use crate::jose::header::describe;

enum_builder! {
    /// The "kty" (key type) parameter identifies the cryptographic algorithm
    /// family used with a key.
    ///
    /// A key without a (valid) key type is represented by the absence
    /// of a [`KeyType`], there is no "invalid" variant.
    @String
    pub enum KeyType {
        /// Elliptic curve
        Ec => "EC",
        /// RSA
        Rsa => "RSA",
        /// Octet sequence, used to represent symmetric keys
        OctetSeq => "oct",
    }
}

enum_builder! {
    /// Named curves usable with `"kty": "EC"` keys.
    @String
    pub enum EllipticCurve {
        /// NIST P-256
        P256 => "P-256",
        /// NIST P-384
        P384 => "P-384",
        /// NIST P-521
        P521 => "P-521",
    }
}

enum_builder! {
    /// Digital signature and MAC algorithms for JWS, see section 3.1 of [`rfc7518`].
    ///
    /// [`rfc7518`]: https://datatracker.ietf.org/doc/html/rfc7518#section-3.1
    @String
    pub enum SignatureAlgorithm {
        /// No digital signature or MAC performed
        NoSignature => "none",
        /// HMAC using SHA-256 (Required)
        HS256 => "HS256",
        /// HMAC using SHA-384 (Optional)
        HS384 => "HS384",
        /// HMAC using SHA-512 (Optional)
        HS512 => "HS512",
        /// RSASSA-PKCS1-v1_5 using SHA-256 (Recommended)
        RS256 => "RS256",
        /// RSASSA-PKCS1-v1_5 using SHA-384 (Optional)
        RS384 => "RS384",
        /// RSASSA-PKCS1-v1_5 using SHA-512 (Optional)
        RS512 => "RS512",
        /// ECDSA using P-256 and SHA-256 (Recommended+)
        ES256 => "ES256",
        /// ECDSA using P-384 and SHA-384 (Optional)
        ES384 => "ES384",
        /// ECDSA using P-521 and SHA-512 (Optional)
        ES512 => "ES512",
        /// RSASSA-PSS using SHA-256 and MGF1 with SHA-256 (Optional)
        PS256 => "PS256",
        /// RSASSA-PSS using SHA-384 and MGF1 with SHA-384 (Optional)
        PS384 => "PS384",
        /// RSASSA-PSS using SHA-512 and MGF1 with SHA-512 (Optional)
        PS512 => "PS512",
    }
}

enum_builder! {
    /// Values of the "key_ops" (key operations) parameter, see section 4.3 of [`rfc7517`].
    ///
    /// [`rfc7517`]: https://datatracker.ietf.org/doc/html/rfc7517#section-4.3
    @String
    pub enum KeyOperation {
        /// compute digital signature or MAC
        Sign => "sign",
        /// verify digital signature or MAC
        Verify => "verify",
        /// encrypt content
        Encrypt => "encrypt",
        /// decrypt content and validate decryption, if applicable
        Decrypt => "decrypt",
        /// encrypt key
        WrapKey => "wrapKey",
        /// decrypt key and validate decryption, if applicable
        UnwrapKey => "unwrapKey",
        /// derive key
        DeriveKey => "deriveKey",
        /// derive bits not to be used as a key
        DeriveBits => "deriveBits",
    }
}

macro_rules! impl_accept {
    ($ty:ident, $what:literal) => {
        impl $ty {
            #[doc = concat!("Accept a ", $what, " from its literal symbol or an already typed value.")]
            ///
            /// Fails with an unknown symbol error for anything
            /// but an exact match of one of the defined literals.
            pub fn accept(value: impl AsRef<str>) -> Result<Self> {
                let value = value.as_ref();
                Self::strict_parse(value).ok_or_else(|| Error::unknown_symbol($what, value))
            }
        }

        impl TryFrom<&str> for $ty {
            type Error = Error;

            fn try_from(value: &str) -> Result<Self> {
                Self::accept(value)
            }
        }

        impl TryFrom<String> for $ty {
            type Error = Error;

            fn try_from(value: String) -> Result<Self> {
                Self::accept(value)
            }
        }

        impl std::str::FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::accept(s)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let value = <Cow<'de, str>>::deserialize(deserializer)?;
                Self::accept(value).map_err(|err| D::Error::custom(describe(&err)))
            }
        }
    };
}

impl_accept!(KeyType, "key type");
impl_accept!(EllipticCurve, "elliptic curve");
impl_accept!(SignatureAlgorithm, "signature algorithm");
impl_accept!(KeyOperation, "key operation");

impl EllipticCurve {
    /// Size in bytes of a coordinate or private scalar on this curve.
    #[must_use]
    pub const fn coordinate_size(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }

    /// The ECDSA [`SignatureAlgorithm`] bound to this curve.
    #[must_use]
    pub const fn signature_algorithm(self) -> SignatureAlgorithm {
        match self {
            Self::P256 => SignatureAlgorithm::ES256,
            Self::P384 => SignatureAlgorithm::ES384,
            Self::P521 => SignatureAlgorithm::ES512,
        }
    }

    pub(crate) fn signing_algorithm(self) -> &'static EcdsaSigningAlgorithm {
        match self {
            Self::P256 => &ECDSA_P256_SHA256_FIXED_SIGNING,
            Self::P384 => &ECDSA_P384_SHA384_FIXED_SIGNING,
            Self::P521 => &ECDSA_P521_SHA512_FIXED_SIGNING,
        }
    }

    pub(crate) fn verification_algorithm(self) -> &'static EcdsaVerificationAlgorithm {
        match self {
            Self::P256 => &ECDSA_P256_SHA256_FIXED,
            Self::P384 => &ECDSA_P384_SHA384_FIXED,
            Self::P521 => &ECDSA_P521_SHA512_FIXED,
        }
    }
}

impl SignatureAlgorithm {
    /// The [`KeyType`] a key must have to be used with this algorithm,
    /// `None` for [`SignatureAlgorithm::NoSignature`].
    #[must_use]
    pub const fn key_type(self) -> Option<KeyType> {
        match self {
            Self::NoSignature => None,
            Self::HS256 | Self::HS384 | Self::HS512 => Some(KeyType::OctetSeq),
            Self::RS256
            | Self::RS384
            | Self::RS512
            | Self::PS256
            | Self::PS384
            | Self::PS512 => Some(KeyType::Rsa),
            Self::ES256 | Self::ES384 | Self::ES512 => Some(KeyType::Ec),
        }
    }

    /// The curve an ECDSA algorithm is bound to, `None` for other families.
    #[must_use]
    pub const fn curve(self) -> Option<EllipticCurve> {
        match self {
            Self::ES256 => Some(EllipticCurve::P256),
            Self::ES384 => Some(EllipticCurve::P384),
            Self::ES512 => Some(EllipticCurve::P521),
            Self::NoSignature
            | Self::HS256
            | Self::HS384
            | Self::HS512
            | Self::RS256
            | Self::RS384
            | Self::RS512
            | Self::PS256
            | Self::PS384
            | Self::PS512 => None,
        }
    }
}
