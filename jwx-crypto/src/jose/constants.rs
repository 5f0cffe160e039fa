pub(super) use der_encoding_tags::*;
pub(super) use object_identifiers::*;
pub(super) use rsa_algorithm_identifier::RSA_ALGORITHM_IDENTIFIER;

mod der_encoding_tags {
    /// Identifier tag for a DER encoded integer.
    /// Defined in [ITU X.680](https://www.itu.int/ITU-T/studygroups/com17/languages/X.680-0207.pdf).
    pub(crate) const DER_TAG_INTEGER: u8 = 0x02;
    /// Identifier tag for a DER encoded bit string.
    pub(crate) const DER_TAG_BIT_STRING: u8 = 0x03;
    /// Identifier tag for a DER encoded octet string.
    pub(crate) const DER_TAG_OCTET_STRING: u8 = 0x04;
    /// Identifier tag for a DER encoded object identifier.
    pub(crate) const DER_TAG_OBJECT_IDENTIFIER: u8 = 0x06;
    /// Identifier tag for a DER encoded sequence.
    pub(crate) const DER_TAG_SEQUENCE: u8 = 0x30;
    /// Constructed, context specific tag `[1]`, used for the public key of an `ECPrivateKey`.
    pub(crate) const DER_TAG_CONTEXT_1: u8 = 0xa1;
    /// Maximum length of a DER encoded length in short form.
    /// Defined in [ITU X.690](https://www.itu.int/ITU-T/studygroups/com17/languages/X.690-0207.pdf).
    pub(crate) const DER_LENGTH_SHORT_FORM_MAX: usize = 127;
    /// Octet that indicates that no unused bits are present in a bit string.
    /// Defined in section 8.6 of [ITU X.690](https://www.itu.int/ITU-T/studygroups/com17/languages/X.690-0207.pdf).
    pub(crate) const BIT_STRING_NO_UNUSED_BITS: u8 = 0x00;
}

/// DER encoded byte representation of RSA encryption algorithm identifier.
///
/// The identifier oid: `1.2.840.113549.1.1.1` defined in appendix C of
/// [RFC 8017](https://datatracker.ietf.org/doc/rfc8017/), with a NULL parameter
/// as required by section 2.3.1 of [RFC 3279](https://www.rfc-editor.org/rfc/rfc3279.html).
mod rsa_algorithm_identifier {
    const SEQUENCE_TAG: u8 = 0x30;
    const LENGTH: u8 = 0x0d;
    const OBJECT_IDENTIFIER_TAG: u8 = 0x06;
    const LENGTH_OID: u8 = 0x09;
    const NULL_TAG: u8 = 0x05;
    const LENGTH_NULL: u8 = 0x00;

    pub(crate) const RSA_ALGORITHM_IDENTIFIER: [u8; 15] = [
        SEQUENCE_TAG,
        LENGTH,
        OBJECT_IDENTIFIER_TAG,
        LENGTH_OID,
        // OID: 1.2.840.113549.1.1.1
        0x2a,
        0x86,
        0x48,
        0x86,
        0xf7,
        0x0d,
        0x01,
        0x01,
        0x01,
        NULL_TAG,
        LENGTH_NULL,
    ];
}

/// Content bytes (without tag and length) of the object identifiers we read and write.
mod object_identifiers {
    /// rsaEncryption, `1.2.840.113549.1.1.1`
    pub(crate) const OID_RSA_ENCRYPTION: &[u8] =
        &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01];
    /// id-ecPublicKey, `1.2.840.10045.2.1` ([RFC 5480](https://datatracker.ietf.org/doc/html/rfc5480))
    pub(crate) const OID_EC_PUBLIC_KEY: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01];
    /// secp256r1, `1.2.840.10045.3.1.7`
    pub(crate) const OID_CURVE_P256: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07];
    /// secp384r1, `1.3.132.0.34`
    pub(crate) const OID_CURVE_P384: &[u8] = &[0x2b, 0x81, 0x04, 0x00, 0x22];
    /// secp521r1, `1.3.132.0.35`
    pub(crate) const OID_CURVE_P521: &[u8] = &[0x2b, 0x81, 0x04, 0x00, 0x23];
}

// Integer encoding constants
pub(super) const INTEGER_SIGN_BIT_MASK: u8 = 0x80;
