#![doc = include_str!("../README.md")]
#![cfg_attr(not(any(test, feature = "std")), no_std)]
extern crate alloc;

use alloc::{boxed::Box, string::String, vec::Vec};
use core::fmt::Debug;

use bytes::Bytes;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod backend;
mod certificate;
mod decode;
mod encode;
pub mod length;
mod payload;
mod recipient_info;
pub mod runtime;
mod secured_message;
pub mod sign_service;
pub(crate) mod util;
mod verify;

pub use certificate::add_psid_group_permission;
pub use decode::{Decode, DecodeError, Decoded};
pub use encode::{Encode, EncodeError, Encoder};
pub use verify::{verify_message, ValidationError, ValidationResult};

//**************************************************************************
//                         Limits and Identifiers
//**************************************************************************

/// Default ceiling for the declared length of [`Payload::data`].
///
/// Deployed stacks reject payloads beyond this length, so the default must not change.
pub const PAYLOAD_DATA_LENGTH_LIMIT: usize = 4096;

/// Default cap for the declared length of an [`OpaqueKey`].
pub const OPAQUE_KEY_LENGTH_LIMIT: usize = 512;

/// Length of the authentication tag of an [`EciesEncryptedKey`]
pub const ECIES_TAG_LENGTH: usize = 16;

/// Length of the nonce carried in [`EncryptionParameters`]
pub const NONCE_LENGTH: usize = 12;

/// Protocol version written by this crate into a [`SecuredMessage`]
pub const SECURED_MESSAGE_VERSION: u8 = 2;

/// Safety ceilings applied while decoding untrusted input.
///
/// The [`Default`] values match deployed implementations. Tightening them is
/// safe; loosening them breaks the guarantee that oversized input is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct DecodeLimits {
    /// maximum declared length of a payload's data, exceeding it fails the decode
    pub payload_data: usize,
    /// maximum declared length of an opaque recipient key, exceeding it yields an empty key
    pub opaque_key: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            payload_data: PAYLOAD_DATA_LENGTH_LIMIT,
            opaque_key: OPAQUE_KEY_LENGTH_LIMIT,
        }
    }
}

impl DecodeLimits {
    /// Reads decode limits from a JSON object. Missing members fall back to the defaults.
    /// ### Usage
    /// ```
    /// # use its_security::*;
    /// let limits = DecodeLimits::from_json(r#"{"opaque_key":256}"#).unwrap();
    /// assert_eq!(limits.payload_data, PAYLOAD_DATA_LENGTH_LIMIT);
    /// assert_eq!(limits.opaque_key, 256);
    /// ```
    #[cfg(feature = "json")]
    pub fn from_json(json: &str) -> Result<Self, DecodeError<&str>> {
        serde_json::from_str(json).map_err(|e| DecodeError::Json(alloc::format!("{e:?}")))
    }
}

/// ITS Application Object Identifier
pub type ItsAid = u32;

/// Well-known ITS-AIDs
pub mod aid {
    use super::ItsAid;

    pub const CA: ItsAid = 36;
    pub const DEN: ItsAid = 37;
    pub const TLM: ItsAid = 137;
    pub const RLT: ItsAid = 138;
    pub const IVI: ItsAid = 139;
    pub const TLC_REQUEST: ItsAid = 140;
    pub const GN_MGMT: ItsAid = 141;
    pub const CRL: ItsAid = 622;
    pub const SECURED_CERT_REQUEST: ItsAid = 623;
    pub const CTL: ItsAid = 624;
}

/// Microseconds since 2004-01-01 00:00:00 TAI
pub type Time64 = u64;

/// Seconds since 2004-01-01 00:00:00 TAI
pub type Time32 = u32;

/// Low-order eight bytes of a hash, used as a compact certificate reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HashedId8(pub [u8; 8]);

impl From<[u8; 8]> for HashedId8 {
    fn from(value: [u8; 8]) -> Self {
        Self(value)
    }
}

//**************************************************************************
//                              Algorithms
//**************************************************************************

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum PublicKeyAlgorithm {
    EcdsaNistP256WithSha256 = 0,
    EciesNistP256 = 1,
}

impl PublicKeyAlgorithm {
    /// Byte length of a single coordinate for this algorithm's curve
    #[must_use]
    pub fn field_size(self) -> usize {
        match self {
            Self::EcdsaNistP256WithSha256 | Self::EciesNistP256 => 32,
        }
    }
}

impl TryFrom<u8> for PublicKeyAlgorithm {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::EcdsaNistP256WithSha256),
            1 => Ok(Self::EciesNistP256),
            x => Err(x),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum SymmetricAlgorithm {
    Aes128Ccm = 0,
}

impl SymmetricAlgorithm {
    /// Byte length of a symmetric key (and of its ECIES ciphertext) for this algorithm
    #[must_use]
    pub fn field_size(self) -> usize {
        match self {
            Self::Aes128Ccm => 16,
        }
    }
}

impl TryFrom<u8> for SymmetricAlgorithm {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Aes128Ccm),
            x => Err(x),
        }
    }
}

/// Elliptic curve point of the secured message format.
///
/// Coordinates are [`PublicKeyAlgorithm::field_size`] bytes long, which is 32 for every supported algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EccPoint {
    XCoordinateOnly([u8; 32]),
    CompressedLsbY0([u8; 32]),
    CompressedLsbY1([u8; 32]),
    Uncompressed { x: [u8; 32], y: [u8; 32] },
}

impl EccPoint {
    /// Wire discriminator of the point form
    #[must_use]
    pub fn point_type(&self) -> u8 {
        match self {
            EccPoint::XCoordinateOnly(_) => 0,
            EccPoint::CompressedLsbY0(_) => 2,
            EccPoint::CompressedLsbY1(_) => 3,
            EccPoint::Uncompressed { .. } => 4,
        }
    }

    #[must_use]
    pub fn x(&self) -> &[u8; 32] {
        match self {
            EccPoint::XCoordinateOnly(x)
            | EccPoint::CompressedLsbY0(x)
            | EccPoint::CompressedLsbY1(x)
            | EccPoint::Uncompressed { x, .. } => x,
        }
    }
}

/// ECDSA signature carried in a [`TrailerField`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EcdsaSignature {
    pub r: EccPoint,
    pub s: [u8; 32],
}

impl EcdsaSignature {
    /// A well-formed signature without any cryptographic meaning
    #[must_use]
    pub fn zero() -> Self {
        Self {
            r: EccPoint::XCoordinateOnly([0; 32]),
            s: [0; 32],
        }
    }
}

//**************************************************************************
//                                Payload
//**************************************************************************

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum PayloadType {
    Unsecured = 0,
    Signed = 1,
    Encrypted = 2,
    SignedExternal = 3,
    SignedAndEncrypted = 4,
}

impl TryFrom<u8> for PayloadType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Unsecured),
            1 => Ok(Self::Signed),
            2 => Ok(Self::Encrypted),
            3 => Ok(Self::SignedExternal),
            4 => Ok(Self::SignedAndEncrypted),
            x => Err(x),
        }
    }
}

/// Payload of a secured message
///
/// `data` spans all network layers above the secured header, or the ciphertext of those
/// layers for encrypted payload types.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Payload {
    pub payload_type: PayloadType,
    pub data: Bytes,
}

//**************************************************************************
//                            Recipient Info
//**************************************************************************

/// Symmetric key encrypted for one recipient with ECIES
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EciesEncryptedKey {
    /// ephemeral sender public key
    pub v: EccPoint,
    /// encrypted symmetric key, [`SymmetricAlgorithm::field_size`] bytes long
    pub c: Vec<u8>,
    /// authentication tag
    pub t: [u8; ECIES_TAG_LENGTH],
}

/// Key material of an algorithm this crate does not interpret
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OpaqueKey {
    pub data: Vec<u8>,
}

/// Encrypted key of a [`RecipientInfo`].
///
/// The public key algorithm on the wire is derived from the variant, see [`Key::public_key_algorithm`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Key {
    Ecies(EciesEncryptedKey),
    Opaque(OpaqueKey),
}

/// Key exchange material addressed to a single recipient certificate
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RecipientInfo {
    /// digest of the recipient's certificate
    pub cert_id: HashedId8,
    pub enc_key: Key,
}

//**************************************************************************
//                           Secured Message
//**************************************************************************

/// Identity material attached by a signer
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SignerInfo {
    SelfSigned,
    CertificateDigestWithSha256(HashedId8),
    Certificate(Box<Certificate>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EncryptionParameters {
    pub symmetric_algorithm: SymmetricAlgorithm,
    pub nonce: [u8; NONCE_LENGTH],
}

/// Header field of a [`SecuredMessage`]
///
/// A `RecipientInfo` field can only be encoded and decoded after an
/// `EncryptionParameters` field in the same header.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum HeaderField {
    GenerationTime(Time64),
    Expiration(Time32),
    ItsAid(ItsAid),
    SignerInfo(SignerInfo),
    EncryptionParameters(EncryptionParameters),
    RecipientInfo(Vec<RecipientInfo>),
}

impl HeaderField {
    /// Wire discriminator of the header field
    #[must_use]
    pub fn field_type(&self) -> u8 {
        match self {
            HeaderField::GenerationTime(_) => 0,
            HeaderField::Expiration(_) => 2,
            HeaderField::ItsAid(_) => 5,
            HeaderField::SignerInfo(_) => 128,
            HeaderField::EncryptionParameters(_) => 129,
            HeaderField::RecipientInfo(_) => 130,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TrailerField {
    Signature(EcdsaSignature),
}

/// Secured message envelope
///
/// Wire layout: protocol version, length-prefixed header fields, [`Payload`],
/// length-prefixed trailer fields.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SecuredMessage {
    pub protocol_version: u8,
    pub header_fields: Vec<HeaderField>,
    pub payload: Payload,
    pub trailer_fields: Vec<TrailerField>,
}

//**************************************************************************
//                Certificates and other Security Management
//**************************************************************************

/// Certificate as specified by ETSI TS 103 097 V2.1.1 on top of IEEE 1609.2
///
/// Note: Canonicalization: This data structure is subject to canonicalization
/// before it is hashed. The canonicalization applies to the verification key
/// of the `ToBeSignedCertificate` and to the R value of the signature.
///
/// Note: Whole-certificate hash: If the entirety of a certificate is hashed
/// to calculate a `HashedId8`, the algorithm used for this purpose is determined
/// by the issuer identifier.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Certificate {
    /// contains the version of the certificate format. In this version of the data structures, this field is set to 3
    pub version: u8,

    /// states whether the certificate is implicit or explicit.
    pub r_type: CertificateType,

    /// identifies the issuer of the certificate
    pub issuer: IssuerIdentifier,

    /// is the certificate contents.
    pub to_be_signed: ToBeSignedCertificate,

    /// is the signature, calculated by the signer identified in the issuer field, over the
    /// encoding of this certificate without the signature.
    pub signature: Option<CertificateSignature>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum CertificateType {
    Explicit = 0,
    Implicit = 1,
}

impl TryFrom<i128> for CertificateType {
    type Error = ();

    fn try_from(value: i128) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Explicit),
            1 => Ok(Self::Implicit),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum HashAlgorithm {
    Sha256 = 0,
    Sha384 = 1,
    Sm3 = 2,
}

impl TryFrom<i128> for HashAlgorithm {
    type Error = ();

    fn try_from(value: i128) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Sha256),
            1 => Ok(Self::Sha384),
            2 => Ok(Self::Sm3),
            _ => Err(()),
        }
    }
}

/// allows the recipient of a certificate to identify the
/// certificate that was used to sign it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IssuerIdentifier {
    /// the issuing certificate is identified by the low-order eight bytes of its SHA-256 hash
    Sha256AndDigest(HashedId8),
    /// the certificate is self-signed, the hash algorithm is the one used to hash this certificate
    SelfSigned(HashAlgorithm),
    /// the issuing certificate is identified by the low-order eight bytes of its SHA-384 hash
    Sha384AndDigest(HashedId8),
}

/// The fields in the `ToBeSignedCertificate` structure have the following meaning:
/// - `id` contains information that is used to identify the certificate holder if necessary.
/// - `craca_id` identifies the Certificate Revocation Authorization CA
///   (CRACA) responsible for certificate revocation lists (CRLs) on which
///   this certificate might appear.
/// - `crl_series` represents the CRL series relevant to a particular CRACA
///   on which the certificate might appear.
/// - `validity_period` contains the validity period of the certificate.
/// - `region`, if present, indicates the validity region of the certificate.
/// - `assurance_level` indicates the assurance level of the certificate holder.
/// - `app_permissions` indicates the permissions that the certificate holder has to
///   sign application data with this certificate.
/// - `cert_issue_permissions` indicates the permissions that the certificate
///   holder has to sign certificates with this certificate.
/// - `cert_request_permissions` indicates the permissions that the
///   certificate holder can request in its certificate.
/// - `can_request_rollover` indicates that the certificate may be used to sign a
///   request for another certificate with the same permissions.
/// - `encryption_key` contains a public key for encryption for which the
///   certificate holder holds the corresponding private key.
/// - `verify_key_indicator` contains either a public key to be used to verify
///   signatures, or the reconstruction value for an implicit certificate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ToBeSignedCertificate {
    pub id: CertificateId,
    pub craca_id: [u8; 3],
    pub crl_series: u16,
    pub validity_period: ValidityPeriod,
    pub region: Option<GeographicRegion>,
    pub assurance_level: Option<u8>,
    pub app_permissions: Option<Vec<PsidSsp>>,
    pub cert_issue_permissions: Option<Vec<PsidGroupPermissions>>,
    pub cert_request_permissions: Option<Vec<PsidGroupPermissions>>,
    pub can_request_rollover: bool,
    pub encryption_key: Option<PublicEncryptionKey>,
    pub verify_key_indicator: VerificationKeyIndicator,
}

/// contains information that is used to identify the certificate holder if necessary.
///
/// Linkage data is not supported.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CertificateId {
    /// human-readable name, at most 255 bytes
    Name(String),
    /// binary identifier, 1 to 64 bytes
    BinaryId(Vec<u8>),
    None,
}

/// gives the validity period of a certificate. The start of the validity period is given by start and the end is given by start + duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValidityPeriod {
    pub start: Time32,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Duration {
    Microseconds(u16),
    Milliseconds(u16),
    Seconds(u16),
    Minutes(u16),
    Hours(u16),
    SixtyHours(u16),
    Years(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TwoDLocation {
    /// tenths of a microdegree
    pub latitude: i32,
    /// tenths of a microdegree
    pub longitude: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RectangularRegion {
    pub north_west: TwoDLocation,
    pub south_east: TwoDLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IdentifiedRegion {
    /// UN country code
    CountryOnly(u16),
    CountryAndRegions { country: u16, regions: Vec<u8> },
}

/// represents a geographic region of a specified form
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GeographicRegion {
    /// center and radius in meters
    Circular { center: TwoDLocation, radius: u16 },
    Rectangular(Vec<RectangularRegion>),
    /// at least three vertices
    Polygonal(Vec<TwoDLocation>),
    Identified(Vec<IdentifiedRegion>),
}

/// represents the permissions that the certificate holder has with respect to data for a single application area, identified by a Psid.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PsidSsp {
    pub psid: ItsAid,
    pub ssp: Option<ServiceSpecificPermissions>,
}

/// represents the Service Specific Permissions (SSP) relevant to a given entry in a PsidSsp.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ServiceSpecificPermissions {
    Opaque(Vec<u8>),
    /// at most 31 bytes
    BitmapSsp(Vec<u8>),
}

impl ServiceSpecificPermissions {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Opaque(bytes) | Self::BitmapSsp(bytes) => bytes,
        }
    }
}

/// states the permissions that a certificate holder has with respect to issuing and requesting certificates.
///
/// `min_chain_length`, `chain_length_range` and `ee_type` are ASN.1 DEFAULT members,
/// they are only written to the wire when they differ from [`PsidGroupPermissions::default`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PsidGroupPermissions {
    pub subject_permissions: SubjectPermissions,
    pub min_chain_length: i64,
    pub chain_length_range: i64,
    pub ee_type: EndEntityType,
}

impl Default for PsidGroupPermissions {
    fn default() -> Self {
        Self {
            subject_permissions: SubjectPermissions::Explicit(Vec::new()),
            min_chain_length: 1,
            chain_length_range: 0,
            ee_type: EndEntityType::APP,
        }
    }
}

/// indicates the PSIDs and associated SSPs for which certificate issuance or request permissions are granted by a `PsidGroupPermissions` structure.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SubjectPermissions {
    Explicit(Vec<PsidSspRange>),
    All,
}

/// indicates the type of entity that may be the subject of a certificate, as a bit string {app(0), enrol(1)}.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EndEntityType(pub u8);

impl EndEntityType {
    pub const APP: Self = Self(0b1000_0000);
    pub const ENROL: Self = Self(0b0100_0000);
}

/// represents the certificate issuing or requesting permissions of the certificate holder with respect to one particular set of application permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PsidSspRange {
    pub psid: ItsAid,
    pub ssp_range: Option<SspRange>,
}

/// identifies the SSPs associated with a PSID for which the holder may issue or request certificates.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SspRange {
    Opaque(Vec<Vec<u8>>),
    All,
    /// value and bitmask, each 1 to 32 bytes and of equal length
    BitmapSspRange {
        ssp_value: Vec<u8>,
        ssp_bitmask: Vec<u8>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum SymmAlgorithm {
    Aes128Ccm = 0,
    Sm4Ccm = 1,
}

impl TryFrom<i128> for SymmAlgorithm {
    type Error = ();

    fn try_from(value: i128) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Aes128Ccm),
            1 => Ok(Self::Sm4Ccm),
            _ => Err(()),
        }
    }
}

/// specifies a public encryption key and the associated symmetric algorithm which is used for bulk data encryption when encrypting for that public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PublicEncryptionKey {
    pub supported_symm_alg: SymmAlgorithm,
    pub public_key: BasePublicEncryptionKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BasePublicEncryptionKey {
    EciesNistP256(EccP256CurvePoint),
    EciesBrainpoolP256r1(EccP256CurvePoint),
}

/// contains either the verification key or the reconstruction value, depending on whether the certificate is explicit or implicit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VerificationKeyIndicator {
    VerificationKey(PublicVerificationKey),
    ReconstructionValue(EccP256CurvePoint),
}

/// represents a public key and states with what algorithm the public key is to be used.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PublicVerificationKey {
    EcdsaNistP256(EccP256CurvePoint),
    EcdsaBrainpoolP256r1(EccP256CurvePoint),
    EcdsaBrainpoolP384r1(EccP384CurvePoint),
    EcdsaNistP384(EccP384CurvePoint),
}

/// specifies a point on an elliptic curve in Weierstrass form defined over a 256-bit prime number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EccP256CurvePoint {
    XOnly([u8; 32]),
    Fill,
    CompressedY0([u8; 32]),
    CompressedY1([u8; 32]),
    UncompressedP256 { x: [u8; 32], y: [u8; 32] },
}

/// specifies a point on an elliptic curve in Weierstrass form defined over a 384-bit prime number.
///
/// Every coordinate is exactly 48 bytes long.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EccP384CurvePoint {
    XOnly(Vec<u8>),
    Fill,
    CompressedY0(Vec<u8>),
    CompressedY1(Vec<u8>),
    UncompressedP384 { x: Vec<u8>, y: Vec<u8> },
}

/// represents an ECDSA signature over a 256-bit curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EcdsaP256Signature {
    pub r_sig: EccP256CurvePoint,
    pub s_sig: [u8; 32],
}

/// represents an ECDSA signature over a 384-bit curve, `s_sig` is 48 bytes long.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EcdsaP384Signature {
    pub r_sig: EccP384CurvePoint,
    pub s_sig: Vec<u8>,
}

/// signature of a [`Certificate`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CertificateSignature {
    EcdsaNistP256(EcdsaP256Signature),
    EcdsaBrainpoolP256r1(EcdsaP256Signature),
    EcdsaBrainpoolP384r1(EcdsaP384Signature),
    EcdsaNistP384(EcdsaP384Signature),
}

//**************************************************************************
//                            Extracted Keys
//**************************************************************************

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum KeyType {
    NistP256,
    BrainpoolP256r1,
    BrainpoolP384r1,
    NistP384,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum KeyCompression {
    NoCompression,
    Y0,
    Y1,
}

/// Verification key extracted from a [`Certificate`]
///
/// `y` is empty unless `compression` is [`KeyCompression::NoCompression`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PublicKey {
    pub key_type: KeyType,
    pub compression: KeyCompression,
    pub x: Vec<u8>,
    pub y: Vec<u8>,
}
