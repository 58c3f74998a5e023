use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use bitvec::prelude::*;
use num_traits::ToBytes;

use crate::util::{bitstring_padding_bits, strip_leading_zeros, strip_sign_extension};

use super::*;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("Unsupported: {0}")]
    Unsupported(String),
    #[error("{0}")]
    Common(String),
    /// The caller handed over key material that does not match the negotiated algorithm
    #[error("Field size mismatch: expected {expected} bytes, found {actual} bytes")]
    FieldSize { expected: usize, actual: usize },
    #[cfg(feature = "json")]
    #[error("Error encoding JSON: {0}")]
    Json(String),
}

impl EncodeError {
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Default)]
pub struct Encoder {
    bits: BitVec<u8, Msb0>,
}

impl Encoder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bits: bitvec![u8, Msb0;],
        }
    }

    pub(crate) fn append(&mut self, bytes: &[u8]) {
        self.bits.extend_from_raw_slice(bytes);
    }
}

impl From<Encoder> for Vec<u8> {
    fn from(mut val: Encoder) -> Self {
        let padding = bitstring_padding_bits(val.bits.len());
        val.bits.extend(core::iter::repeat(false).take(padding));
        val.bits.into_vec()
    }
}

impl From<Encoder> for bytes::Bytes {
    fn from(val: Encoder) -> Self {
        <Encoder as core::convert::Into<Vec<u8>>>::into(val).into()
    }
}

pub trait Encode {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError>;

    fn encode_to_vec(&self) -> Result<Vec<u8>, EncodeError> {
        let mut encoder = Encoder::new();
        self.encode(&mut encoder)?;
        Ok(encoder.into())
    }

    #[cfg(feature = "json")]
    fn encode_to_json(&self) -> Result<String, EncodeError>
    where
        Self: Sized + Serialize,
    {
        serde_json::to_string(self).map_err(|e| EncodeError::Json(alloc::format!("{e:?}")))
    }
}

// =====================================================
// Length prefix
// =====================================================

pub(crate) fn encode_length(length: usize, output: &mut Encoder) -> Result<(), EncodeError> {
    if length > u32::MAX as usize {
        return Err(EncodeError::Common(alloc::format!(
            "Length {length} exceeds 32 bits!"
        )));
    }
    output.append(&crate::length::serialize_length(length));
    Ok(())
}

/// Writes the length of `content` followed by `content`
pub(crate) fn encode_length_prefixed(
    content: &[u8],
    output: &mut Encoder,
) -> Result<(), EncodeError> {
    encode_length(content.len(), output)?;
    output.append(content);
    Ok(())
}

// =====================================================
// ETSI TS 103 102 secured message
// =====================================================

impl Encode for EccPoint {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        output.append(&[self.point_type()]);
        output.append(self.x());
        if let EccPoint::Uncompressed { y, .. } = self {
            output.append(y);
        }
        Ok(())
    }
}

impl Encode for EcdsaSignature {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        output.append(&[PublicKeyAlgorithm::EcdsaNistP256WithSha256 as u8]);
        self.r.encode(output)?;
        output.append(&self.s);
        Ok(())
    }
}

impl Encode for Payload {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        output.append(&[self.payload_type as u8]);
        encode_length_prefixed(&self.data, output)
    }
}

pub(crate) fn encode_recipient_info(
    info: &RecipientInfo,
    symmetric_algorithm: SymmetricAlgorithm,
    output: &mut Encoder,
) -> Result<(), EncodeError> {
    if let Key::Ecies(key) = &info.enc_key {
        let expected = symmetric_algorithm.field_size();
        if key.c.len() != expected {
            return Err(EncodeError::FieldSize {
                expected,
                actual: key.c.len(),
            });
        }
    }

    output.append(&info.cert_id.0);
    output.append(&[info.enc_key.public_key_algorithm() as u8]);
    match &info.enc_key {
        Key::Ecies(key) => {
            key.v.encode(output)?;
            output.append(&key.c);
            output.append(&key.t);
            Ok(())
        }
        Key::Opaque(key) => encode_length_prefixed(&key.data, output),
    }
}

impl Encode for SignerInfo {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        match self {
            SignerInfo::SelfSigned => {
                output.append(&[0]);
                Ok(())
            }
            SignerInfo::CertificateDigestWithSha256(digest) => {
                output.append(&[1]);
                output.append(&digest.0);
                Ok(())
            }
            SignerInfo::Certificate(certificate) => {
                output.append(&[2]);
                certificate.encode(output)
            }
        }
    }
}

/// Encodes header fields without their length prefix
pub(crate) fn encode_header_fields(fields: &[HeaderField]) -> Result<Vec<u8>, EncodeError> {
    let mut output = Encoder::new();
    let mut symmetric_algorithm = None;
    for field in fields {
        output.append(&[field.field_type()]);
        match field {
            HeaderField::GenerationTime(time) => output.append(&time.to_be_bytes()),
            HeaderField::Expiration(time) => output.append(&time.to_be_bytes()),
            HeaderField::ItsAid(aid) => encode_length(*aid as usize, &mut output)?,
            HeaderField::SignerInfo(signer) => signer.encode(&mut output)?,
            HeaderField::EncryptionParameters(parameters) => {
                output.append(&[parameters.symmetric_algorithm as u8]);
                output.append(&parameters.nonce);
                symmetric_algorithm = Some(parameters.symmetric_algorithm);
            }
            HeaderField::RecipientInfo(recipients) => {
                let algorithm = symmetric_algorithm.ok_or_else(|| {
                    EncodeError::Common(
                        "Recipient info requires preceding encryption parameters!".into(),
                    )
                })?;
                let mut block = Encoder::new();
                for recipient in recipients {
                    encode_recipient_info(recipient, algorithm, &mut block)?;
                }
                let block: Vec<u8> = block.into();
                encode_length_prefixed(&block, &mut output)?;
            }
        }
    }
    Ok(output.into())
}

impl Encode for TrailerField {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        match self {
            TrailerField::Signature(signature) => {
                output.append(&[1]);
                signature.encode(output)
            }
        }
    }
}

/// Encodes trailer fields without their length prefix
pub(crate) fn encode_trailer_fields(fields: &[TrailerField]) -> Result<Vec<u8>, EncodeError> {
    let mut output = Encoder::new();
    for field in fields {
        field.encode(&mut output)?;
    }
    Ok(output.into())
}

impl Encode for SecuredMessage {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        output.append(&[self.protocol_version]);
        encode_length_prefixed(&encode_header_fields(&self.header_fields)?, output)?;
        self.payload.encode(output)?;
        encode_length_prefixed(&encode_trailer_fields(&self.trailer_fields)?, output)
    }
}

// =====================================================
// ETSI TS 103 097/ IEEE 1609.2 (canonical OER)
// =====================================================

fn encode_oer_integer<I: num::Integer + ToBytes>(
    min: Option<i128>,
    max: Option<i128>,
    value: &I,
    output: &mut Encoder,
) -> Result<(), EncodeError> {
    match (min, max) {
        (Some(_), Some(_)) => {
            output.append(value.to_be_bytes().as_ref());
            Ok(())
        }
        (Some(min), _) if min >= 0 => {
            let raw = value.to_be_bytes();
            encode_length_prefixed(strip_leading_zeros(raw.as_ref()), output)
        }
        _ => {
            let raw = value.to_be_bytes();
            encode_length_prefixed(strip_sign_extension(raw.as_ref()), output)
        }
    }
}

fn encode_oer_enumerated(value: u8, output: &mut Encoder) -> Result<(), EncodeError> {
    encode_oer_integer(Some(0), Some(255), &value, output)
}

fn encode_oer_octetstring(
    min: Option<usize>,
    max: Option<usize>,
    value: &[u8],
    output: &mut Encoder,
) -> Result<(), EncodeError> {
    if min.is_some_and(|min| value.len() < min) || max.is_some_and(|max| value.len() > max) {
        return Err(EncodeError::Common(alloc::format!(
            "Octet string of {} bytes violates size constraint {min:?}..{max:?}!",
            value.len()
        )));
    }
    match (min, max) {
        (Some(min), Some(max)) if min == max => {
            output.append(value);
            Ok(())
        }
        _ => encode_length_prefixed(value, output),
    }
}

/// Build ASN.1 SEQUENCE preamble
///
/// Extension bit is optional
#[allow(clippy::unnecessary_wraps, reason = "common interface")]
fn encode_extension_and_optional_bitmap(
    extension: Option<bool>,
    bitmap: &[bool],
    output: &mut Encoder,
) -> Result<(), EncodeError> {
    if let Some(is_extended) = extension {
        output.bits.push(is_extended);
    }

    for bit in bitmap {
        output.bits.push(*bit);
    }

    // determine required padding bits
    let padding_bits = bitstring_padding_bits(output.bits.len());

    for _ in 0..padding_bits {
        output.bits.push(false);
    }

    Ok(())
}

fn encode_oer_tag(tag: u8, output: &mut Encoder) -> Result<(), EncodeError> {
    match tag {
        t if t < 63 => encode_oer_integer(Some(0), Some(255), &(t + 128), output),
        _ => Err(EncodeError::Unsupported(
            "Tag larger than 62 are unsupported!".into(),
        )),
    }
}

fn encode_oer_open_type<T: Encode>(value: &T, output: &mut Encoder) -> Result<(), EncodeError> {
    let bytes = value.encode_to_vec()?;
    encode_length_prefixed(&bytes, output)
}

fn encode_sequence_of<T: Encode>(items: &[T], output: &mut Encoder) -> Result<(), EncodeError> {
    encode_oer_integer(Some(0), None, &items.len(), output)?;
    for item in items {
        item.encode(output)?;
    }
    Ok(())
}

fn encode_psid(psid: ItsAid, output: &mut Encoder) -> Result<(), EncodeError> {
    encode_oer_integer(Some(0), None, &psid, output)
}

impl Encode for Certificate {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        let bitmap = [self.signature.is_some()];
        encode_extension_and_optional_bitmap(None, &bitmap, output)?;

        encode_oer_integer(Some(0), Some(255), &self.version, output)?;
        encode_oer_enumerated(self.r_type as u8, output)?;
        self.issuer.encode(output)?;
        self.to_be_signed.encode(output)?;
        if let Some(sig) = &self.signature {
            sig.encode(output)?;
        }
        Ok(())
    }
}

impl Encode for IssuerIdentifier {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        match self {
            IssuerIdentifier::Sha256AndDigest(inner) => {
                encode_oer_tag(0, output)?;
                output.append(&inner.0);
                Ok(())
            }
            IssuerIdentifier::SelfSigned(inner) => {
                encode_oer_tag(1, output)?;
                encode_oer_enumerated(*inner as u8, output)
            }
            IssuerIdentifier::Sha384AndDigest(inner) => {
                encode_oer_tag(2, output)?;
                encode_length_prefixed(&inner.0, output)
            }
        }
    }
}

impl Encode for ToBeSignedCertificate {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        let bitmap = [
            self.region.is_some(),
            self.assurance_level.is_some(),
            self.app_permissions.is_some(),
            self.cert_issue_permissions.is_some(),
            self.cert_request_permissions.is_some(),
            self.can_request_rollover,
            self.encryption_key.is_some(),
        ];
        encode_extension_and_optional_bitmap(Some(false), &bitmap, output)?;

        self.id.encode(output)?;
        output.append(&self.craca_id);
        encode_oer_integer(Some(0), Some(65535), &self.crl_series, output)?;
        self.validity_period.encode(output)?;
        if let Some(region) = &self.region {
            region.encode(output)?;
        }
        if let Some(assurance_level) = self.assurance_level {
            encode_oer_octetstring(Some(1), Some(1), &[assurance_level], output)?;
        }
        if let Some(app_permissions) = &self.app_permissions {
            encode_sequence_of(app_permissions, output)?;
        }
        if let Some(cert_issue_permissions) = &self.cert_issue_permissions {
            encode_sequence_of(cert_issue_permissions, output)?;
        }
        if let Some(cert_request_permissions) = &self.cert_request_permissions {
            encode_sequence_of(cert_request_permissions, output)?;
        }
        if let Some(encryption_key) = &self.encryption_key {
            encryption_key.encode(output)?;
        }
        self.verify_key_indicator.encode(output)
    }
}

impl Encode for CertificateId {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        match self {
            CertificateId::Name(inner) => {
                encode_oer_tag(1, output)?;
                encode_oer_octetstring(Some(0), Some(255), inner.as_bytes(), output)
            }
            CertificateId::BinaryId(inner) => {
                encode_oer_tag(2, output)?;
                encode_oer_octetstring(Some(1), Some(64), inner, output)
            }
            CertificateId::None => encode_oer_tag(3, output),
        }
    }
}

impl Encode for ValidityPeriod {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        encode_oer_integer(Some(0), Some(4_294_967_295), &self.start, output)?;
        self.duration.encode(output)
    }
}

impl Encode for Duration {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        let (tag, value) = match self {
            Duration::Microseconds(inner) => (0, inner),
            Duration::Milliseconds(inner) => (1, inner),
            Duration::Seconds(inner) => (2, inner),
            Duration::Minutes(inner) => (3, inner),
            Duration::Hours(inner) => (4, inner),
            Duration::SixtyHours(inner) => (5, inner),
            Duration::Years(inner) => (6, inner),
        };
        encode_oer_tag(tag, output)?;
        encode_oer_integer(Some(0), Some(65535), value, output)
    }
}

impl Encode for TwoDLocation {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        encode_oer_integer(Some(-900_000_000), Some(900_000_001), &self.latitude, output)?;
        encode_oer_integer(Some(-1_799_999_999), Some(1_800_000_001), &self.longitude, output)
    }
}

impl Encode for RectangularRegion {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        self.north_west.encode(output)?;
        self.south_east.encode(output)
    }
}

impl Encode for u8 {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        encode_oer_integer(Some(0), Some(255), self, output)
    }
}

impl Encode for IdentifiedRegion {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        match self {
            IdentifiedRegion::CountryOnly(country) => {
                encode_oer_tag(0, output)?;
                encode_oer_integer(Some(0), Some(65535), country, output)
            }
            IdentifiedRegion::CountryAndRegions { country, regions } => {
                encode_oer_tag(1, output)?;
                encode_oer_integer(Some(0), Some(65535), country, output)?;
                encode_sequence_of(regions, output)
            }
        }
    }
}

impl Encode for GeographicRegion {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        match self {
            GeographicRegion::Circular { center, radius } => {
                encode_oer_tag(0, output)?;
                center.encode(output)?;
                encode_oer_integer(Some(0), Some(65535), radius, output)
            }
            GeographicRegion::Rectangular(inner) => {
                encode_oer_tag(1, output)?;
                encode_sequence_of(inner, output)
            }
            GeographicRegion::Polygonal(inner) => {
                if inner.len() < 3 {
                    return Err(EncodeError::Common(
                        "Polygonal region needs at least three vertices!".into(),
                    ));
                }
                encode_oer_tag(2, output)?;
                encode_sequence_of(inner, output)
            }
            GeographicRegion::Identified(inner) => {
                encode_oer_tag(3, output)?;
                encode_sequence_of(inner, output)
            }
        }
    }
}

impl Encode for PsidSsp {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        let bitmap = [self.ssp.is_some()];
        encode_extension_and_optional_bitmap(None, &bitmap, output)?;

        encode_psid(self.psid, output)?;
        self.ssp.as_ref().map_or(Ok(()), |ssp| ssp.encode(output))
    }
}

struct BitmapSsp<'a>(&'a [u8]);

impl Encode for BitmapSsp<'_> {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        encode_oer_octetstring(Some(0), Some(31), self.0, output)
    }
}

impl Encode for ServiceSpecificPermissions {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        match self {
            ServiceSpecificPermissions::Opaque(inner) => {
                encode_oer_tag(0, output)?;
                encode_oer_octetstring(Some(0), None, inner, output)
            }
            ServiceSpecificPermissions::BitmapSsp(inner) => {
                encode_oer_tag(1, output)?;
                encode_oer_open_type(&BitmapSsp(inner), output)
            }
        }
    }
}

impl Encode for PsidGroupPermissions {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        let defaults = PsidGroupPermissions::default();
        let bitmap = [
            self.min_chain_length != defaults.min_chain_length,
            self.chain_length_range != defaults.chain_length_range,
            self.ee_type != defaults.ee_type,
        ];
        encode_extension_and_optional_bitmap(None, &bitmap, output)?;

        self.subject_permissions.encode(output)?;
        if bitmap[0] {
            encode_oer_integer(None, None, &self.min_chain_length, output)?;
        }
        if bitmap[1] {
            encode_oer_integer(None, None, &self.chain_length_range, output)?;
        }
        if bitmap[2] {
            output.append(&[self.ee_type.0]);
        }
        Ok(())
    }
}

impl Encode for SubjectPermissions {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        match self {
            SubjectPermissions::Explicit(inner) => {
                encode_oer_tag(0, output)?;
                encode_sequence_of(inner, output)
            }
            SubjectPermissions::All => encode_oer_tag(1, output),
        }
    }
}

impl Encode for PsidSspRange {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        let bitmap = [self.ssp_range.is_some()];
        encode_extension_and_optional_bitmap(None, &bitmap, output)?;

        encode_psid(self.psid, output)?;
        self.ssp_range
            .as_ref()
            .map_or(Ok(()), |ssp| ssp.encode(output))
    }
}

struct BitmapSspRange<'a> {
    ssp_value: &'a [u8],
    ssp_bitmask: &'a [u8],
}

impl Encode for BitmapSspRange<'_> {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        encode_oer_octetstring(Some(1), Some(32), self.ssp_value, output)?;
        encode_oer_octetstring(Some(1), Some(32), self.ssp_bitmask, output)
    }
}

struct OctetString<'a>(&'a [u8]);

impl Encode for OctetString<'_> {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        encode_oer_octetstring(Some(0), None, self.0, output)
    }
}

impl Encode for SspRange {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        match self {
            SspRange::Opaque(inner) => {
                encode_oer_tag(0, output)?;
                let strings: Vec<OctetString<'_>> =
                    inner.iter().map(|s| OctetString(s)).collect();
                encode_sequence_of(&strings, output)
            }
            SspRange::All => encode_oer_tag(1, output),
            SspRange::BitmapSspRange {
                ssp_value,
                ssp_bitmask,
            } => {
                encode_oer_tag(2, output)?;
                encode_oer_open_type(
                    &BitmapSspRange {
                        ssp_value,
                        ssp_bitmask,
                    },
                    output,
                )
            }
        }
    }
}

impl Encode for PublicEncryptionKey {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        encode_oer_enumerated(self.supported_symm_alg as u8, output)?;
        match &self.public_key {
            BasePublicEncryptionKey::EciesNistP256(inner) => {
                encode_oer_tag(0, output)?;
                inner.encode(output)
            }
            BasePublicEncryptionKey::EciesBrainpoolP256r1(inner) => {
                encode_oer_tag(1, output)?;
                inner.encode(output)
            }
        }
    }
}

impl Encode for VerificationKeyIndicator {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        match self {
            VerificationKeyIndicator::VerificationKey(inner) => {
                encode_oer_tag(0, output)?;
                inner.encode(output)
            }
            VerificationKeyIndicator::ReconstructionValue(inner) => {
                encode_oer_tag(1, output)?;
                inner.encode(output)
            }
        }
    }
}

impl Encode for PublicVerificationKey {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        match self {
            PublicVerificationKey::EcdsaNistP256(inner) => {
                encode_oer_tag(0, output)?;
                inner.encode(output)
            }
            PublicVerificationKey::EcdsaBrainpoolP256r1(inner) => {
                encode_oer_tag(1, output)?;
                inner.encode(output)
            }
            PublicVerificationKey::EcdsaBrainpoolP384r1(inner) => {
                encode_oer_tag(2, output)?;
                encode_oer_open_type(inner, output)
            }
            PublicVerificationKey::EcdsaNistP384(inner) => {
                encode_oer_tag(3, output)?;
                encode_oer_open_type(inner, output)
            }
        }
    }
}

impl Encode for EccP256CurvePoint {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        match self {
            EccP256CurvePoint::XOnly(inner) => {
                encode_oer_tag(0, output)?;
                output.append(inner);
                Ok(())
            }
            EccP256CurvePoint::Fill => encode_oer_tag(1, output),
            EccP256CurvePoint::CompressedY0(inner) => {
                encode_oer_tag(2, output)?;
                output.append(inner);
                Ok(())
            }
            EccP256CurvePoint::CompressedY1(inner) => {
                encode_oer_tag(3, output)?;
                output.append(inner);
                Ok(())
            }
            EccP256CurvePoint::UncompressedP256 { x, y } => {
                encode_oer_tag(4, output)?;
                output.append(x);
                output.append(y);
                Ok(())
            }
        }
    }
}

impl Encode for EccP384CurvePoint {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        match self {
            EccP384CurvePoint::XOnly(inner) => {
                encode_oer_tag(0, output)?;
                encode_oer_octetstring(Some(48), Some(48), inner, output)
            }
            EccP384CurvePoint::Fill => encode_oer_tag(1, output),
            EccP384CurvePoint::CompressedY0(inner) => {
                encode_oer_tag(2, output)?;
                encode_oer_octetstring(Some(48), Some(48), inner, output)
            }
            EccP384CurvePoint::CompressedY1(inner) => {
                encode_oer_tag(3, output)?;
                encode_oer_octetstring(Some(48), Some(48), inner, output)
            }
            EccP384CurvePoint::UncompressedP384 { x, y } => {
                encode_oer_tag(4, output)?;
                encode_oer_octetstring(Some(48), Some(48), x, output)?;
                encode_oer_octetstring(Some(48), Some(48), y, output)
            }
        }
    }
}

impl Encode for EcdsaP256Signature {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        self.r_sig.encode(output)?;
        output.append(&self.s_sig);
        Ok(())
    }
}

impl Encode for EcdsaP384Signature {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        self.r_sig.encode(output)?;
        encode_oer_octetstring(Some(48), Some(48), &self.s_sig, output)
    }
}

impl Encode for CertificateSignature {
    fn encode(&self, output: &mut Encoder) -> Result<(), EncodeError> {
        match self {
            CertificateSignature::EcdsaNistP256(inner) => {
                encode_oer_tag(0, output)?;
                inner.encode(output)
            }
            CertificateSignature::EcdsaBrainpoolP256r1(inner) => {
                encode_oer_tag(1, output)?;
                inner.encode(output)
            }
            CertificateSignature::EcdsaBrainpoolP384r1(inner) => {
                encode_oer_tag(2, output)?;
                encode_oer_open_type(inner, output)
            }
            CertificateSignature::EcdsaNistP384(inner) => {
                encode_oer_tag(3, output)?;
                encode_oer_open_type(inner, output)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_oer_integers() {
        let mut encoder = Encoder::new();
        encode_oer_integer(Some(0), None, &36u32, &mut encoder).unwrap();
        encode_oer_integer(Some(0), None, &0usize, &mut encoder).unwrap();
        encode_oer_integer(None, None, &128i64, &mut encoder).unwrap();
        encode_oer_integer(None, None, &-1i64, &mut encoder).unwrap();
        encode_oer_integer(Some(0), Some(65535), &0x0102u16, &mut encoder).unwrap();
        assert_eq!(
            Vec::<u8>::from(encoder),
            [0x01, 0x24, 0x01, 0x00, 0x02, 0x00, 0x80, 0x01, 0xff, 0x01, 0x02]
        );
    }

    #[test]
    fn pads_sequence_preamble() {
        let mut encoder = Encoder::new();
        encode_extension_and_optional_bitmap(Some(false), &[true, false, true], &mut encoder)
            .unwrap();
        encode_extension_and_optional_bitmap(None, &[true], &mut encoder).unwrap();
        assert_eq!(Vec::<u8>::from(encoder), [0b0101_0000, 0b1000_0000]);
    }

    #[test]
    fn rejects_octet_strings_outside_constraints() {
        let mut encoder = Encoder::new();
        assert!(encode_oer_octetstring(Some(1), Some(64), &[], &mut encoder).is_err());
        assert!(encode_oer_octetstring(Some(48), Some(48), &[0; 47], &mut encoder).is_err());
        assert!(BitmapSsp(&[0; 32]).encode_to_vec().is_err());
    }

    #[test]
    fn omits_default_group_permission_members() {
        let default = PsidGroupPermissions {
            subject_permissions: SubjectPermissions::All,
            ..Default::default()
        };
        assert_eq!(default.encode_to_vec().unwrap(), [0x00, 0x81]);

        let enrol = PsidGroupPermissions {
            subject_permissions: SubjectPermissions::All,
            min_chain_length: 2,
            chain_length_range: 0,
            ee_type: EndEntityType::ENROL,
        };
        assert_eq!(
            enrol.encode_to_vec().unwrap(),
            [0b1010_0000, 0x81, 0x01, 0x02, 0x40]
        );
    }

    #[test]
    fn refuses_recipient_info_without_encryption_parameters() {
        let fields = [HeaderField::RecipientInfo(alloc::vec![])];
        assert!(matches!(
            encode_header_fields(&fields),
            Err(EncodeError::Common(_))
        ));
    }
}
