use alloc::{string::String, vec, vec::Vec};

use nom::{
    bytes::streaming::take,
    combinator::map,
    error::{ErrorKind, FromExternalError, ParseError},
    number::streaming::{be_u16, be_u32, be_u64, be_u8},
    Needed, Parser,
};
use tracing::{debug, warn};

use crate::*;

/// Returns the value of a decoding attempt
#[derive(Debug, PartialEq)]
pub struct Decoded<T: Debug + PartialEq> {
    /// indicates the number of bytes that were consumed by the decoder
    pub bytes_consumed: usize,
    /// the decoded return value
    pub decoded: T,
}

pub trait Decode: Sized + Debug + PartialEq {
    /// Decodes a value from binary data, applying the default [`DecodeLimits`].
    ///
    /// The `Decode` trait is implemented for the self-delimiting wire types:
    ///  - `SecuredMessage`
    ///  - `Payload`
    ///  - `Certificate`
    ///  - `EccPoint`
    ///
    /// A `RecipientInfo` depends on the symmetric algorithm negotiated in the
    /// surrounding message, see [`RecipientInfo::decode`].
    /// ### Usage
    /// ```rust
    /// # use its_security::*;
    /// let data: &'static [u8] = &[0x00, 0x03, 0xaa, 0xbb, 0xcc, 0xff];
    /// let result = Payload::decode(data).unwrap();
    /// assert_eq!(result.bytes_consumed, 5);
    /// assert_eq!(result.decoded.payload_type, PayloadType::Unsecured);
    /// assert_eq!(&result.decoded.data[..], &[0xaa, 0xbb, 0xcc]);
    /// ```
    fn decode<'input, I: Into<&'input [u8]>>(
        input: I,
    ) -> Result<Decoded<Self>, DecodeError<&'input [u8]>>;
}

pub(crate) fn finish<'input, T: Debug + PartialEq>(
    input: &'input [u8],
    result: IResult<&'input [u8], T>,
) -> Result<Decoded<T>, DecodeError<&'input [u8]>> {
    let (remaining, decoded) = result?;
    Ok(Decoded {
        bytes_consumed: input.len() - remaining.len(),
        decoded,
    })
}

macro_rules! decode {
    ($typ:ty) => {
        impl Decode for $typ {
            fn decode<'input, I: Into<&'input [u8]>>(
                input: I,
            ) -> Result<Decoded<Self>, DecodeError<&'input [u8]>> {
                let input = input.into();
                finish(input, <$typ>::decode_bytewise(input))
            }
        }
    };
}

decode!(SecuredMessage);
decode!(Payload);
decode!(Certificate);
decode!(EccPoint);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError<I> {
    #[error("Integer error: {0}")]
    IntegerError(String),
    #[error("Enum error: {0}")]
    EnumError(String),
    #[error("String error: {0}")]
    StringError(String),
    /// A length prefix that is not the minimal encoding of its value
    #[error("Non-canonical length prefix: {0}")]
    NonCanonicalLength(String),
    /// A declared length beyond the configured [`DecodeLimits`]
    #[error("Declared length of {length} bytes exceeds the limit of {limit} bytes")]
    ExcessiveLength { length: usize, limit: usize },
    #[error("Unsupported: {0}")]
    Unsupported(String),
    #[error("Parser error: {0}")]
    ParserError(String),
    #[error("Parser error: {1:?}")]
    Nom(I, ErrorKind),
    #[cfg(feature = "json")]
    #[error("JSON error: {0}")]
    Json(String),
}

impl<T> From<nom::Err<DecodeError<T>>> for DecodeError<T> {
    fn from(value: nom::Err<DecodeError<T>>) -> Self {
        match value {
            nom::Err::Incomplete(Needed::Size(n)) => DecodeError::ParserError(alloc::format!(
                "Unexpected end of input: Needs at least other {n} bytes!"
            )),
            nom::Err::Incomplete(_) => DecodeError::ParserError("Unexpected end of input!".into()),
            nom::Err::Error(e) | nom::Err::Failure(e) => e,
        }
    }
}

impl<I> ParseError<I> for DecodeError<I> {
    fn from_error_kind(input: I, kind: ErrorKind) -> Self {
        DecodeError::Nom(input, kind)
    }

    fn append(_: I, _: ErrorKind, other: Self) -> Self {
        other
    }
}

impl<I, E> FromExternalError<I, E> for DecodeError<I> {
    fn from_external_error(input: I, kind: ErrorKind, _: E) -> Self {
        DecodeError::Nom(input, kind)
    }
}

pub type IResult<I, T> = nom::IResult<I, T, DecodeError<I>>;

pub(crate) trait InternalDecode: Sized {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self>;
}

fn error<T>(error: DecodeError<&[u8]>) -> IResult<&[u8], T> {
    Err(nom::Err::Error(error))
}

// =====================================================
// Length prefix
// =====================================================

/// Upper bound for the number of magnitude bytes of a long form length prefix
pub const MAX_LENGTH_MAGNITUDE_BYTES: usize = 4;

pub(crate) fn decode_length(input: &[u8]) -> IResult<&[u8], usize> {
    let (input, first) = be_u8(input)?;
    if first < 128 {
        return Ok((input, first.into()));
    }

    let count = usize::from(first & 0b0111_1111);
    if count == 0 {
        return error(DecodeError::NonCanonicalLength(
            "Long form without magnitude bytes!".into(),
        ));
    }
    if count > MAX_LENGTH_MAGNITUDE_BYTES {
        return error(DecodeError::IntegerError(alloc::format!(
            "Length prefix with {count} magnitude bytes exceeds 32 bits!"
        )));
    }
    let (input, bytes) = take(count)(input)?;
    if bytes[0] == 0 {
        return error(DecodeError::NonCanonicalLength(
            "Magnitude starts with a zero byte!".into(),
        ));
    }
    let length = bytes
        .iter()
        .fold(0usize, |acc, byte| acc << 8 | usize::from(*byte));
    if length < 128 {
        return error(DecodeError::NonCanonicalLength(alloc::format!(
            "Long form used for short value {length}!"
        )));
    }
    Ok((input, length))
}

fn decode_length_prefixed(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (input, length) = decode_length(input)?;
    take(length)(input)
}

fn decode_array<const N: usize>(input: &[u8]) -> IResult<&[u8], [u8; N]> {
    let (input, bytes) = take(N)(input)?;
    let mut array = [0u8; N];
    array.copy_from_slice(bytes);
    Ok((input, array))
}

fn decode_discriminator<'input, E: TryFrom<u8, Error = u8>>(
    what: &str,
    input: &'input [u8],
) -> IResult<&'input [u8], E> {
    let (input, byte) = be_u8(input)?;
    match E::try_from(byte) {
        Ok(value) => Ok((input, value)),
        Err(unknown) => error(DecodeError::EnumError(alloc::format!(
            "Invalid {what} {unknown}!"
        ))),
    }
}

// =====================================================
// ETSI TS 103 102 secured message
// =====================================================

impl InternalDecode for EccPoint {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, point_type) = be_u8(input)?;
        match point_type {
            0 => map(decode_array::<32>, EccPoint::XCoordinateOnly)(input),
            2 => map(decode_array::<32>, EccPoint::CompressedLsbY0)(input),
            3 => map(decode_array::<32>, EccPoint::CompressedLsbY1)(input),
            4 => {
                let (input, x) = decode_array::<32>(input)?;
                let (input, y) = decode_array::<32>(input)?;
                Ok((input, EccPoint::Uncompressed { x, y }))
            }
            x => error(DecodeError::EnumError(alloc::format!(
                "Invalid elliptic curve point type {x}!"
            ))),
        }
    }
}

impl InternalDecode for EcdsaSignature {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, algorithm) =
            decode_discriminator::<PublicKeyAlgorithm>("public key algorithm", input)?;
        if algorithm != PublicKeyAlgorithm::EcdsaNistP256WithSha256 {
            return error(DecodeError::Unsupported(alloc::format!(
                "Signatures of {algorithm:?} are unsupported!"
            )));
        }
        let (input, r) = EccPoint::decode_bytewise(input)?;
        let (input, s) = decode_array::<32>(input)?;
        Ok((input, EcdsaSignature { r, s }))
    }
}

pub(crate) fn decode_payload<'input>(
    input: &'input [u8],
    limits: &DecodeLimits,
) -> IResult<&'input [u8], Payload> {
    let (input, payload_type) = decode_discriminator::<PayloadType>("payload type", input)?;
    let (input, length) = decode_length(input)?;
    if length > limits.payload_data {
        debug!(
            length,
            limit = limits.payload_data,
            "Rejecting payload exceeding length limit"
        );
        return Err(nom::Err::Failure(DecodeError::ExcessiveLength {
            length,
            limit: limits.payload_data,
        }));
    }
    let (input, data) = take(length)(input)?;
    Ok((
        input,
        Payload {
            payload_type,
            data: Bytes::copy_from_slice(data),
        },
    ))
}

impl InternalDecode for Payload {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        decode_payload(input, &DecodeLimits::default())
    }
}

pub(crate) fn decode_recipient_info<'input>(
    input: &'input [u8],
    symmetric_algorithm: SymmetricAlgorithm,
    limits: &DecodeLimits,
) -> IResult<&'input [u8], RecipientInfo> {
    let (input, cert_id) = map(decode_array::<8>, HashedId8)(input)?;
    let (input, algorithm) = be_u8(input)?;
    if algorithm == PublicKeyAlgorithm::EciesNistP256 as u8 {
        let (input, v) = EccPoint::decode_bytewise(input)?;
        let (input, c) = take(symmetric_algorithm.field_size())(input)?;
        let (input, t) = decode_array::<ECIES_TAG_LENGTH>(input)?;
        return Ok((
            input,
            RecipientInfo {
                cert_id,
                enc_key: Key::Ecies(EciesEncryptedKey { v, c: c.to_vec(), t }),
            },
        ));
    }

    let (input, length) = decode_length(input)?;
    if length > limits.opaque_key {
        warn!(
            length,
            limit = limits.opaque_key,
            algorithm,
            "Opaque recipient key exceeds length limit, continuing with an empty key"
        );
        return Ok((
            input,
            RecipientInfo {
                cert_id,
                enc_key: Key::Opaque(OpaqueKey::default()),
            },
        ));
    }
    let (input, data) = take(length)(input)?;
    Ok((
        input,
        RecipientInfo {
            cert_id,
            enc_key: Key::Opaque(OpaqueKey {
                data: data.to_vec(),
            }),
        },
    ))
}

impl InternalDecode for SignerInfo {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, signer_type) = be_u8(input)?;
        match signer_type {
            0 => Ok((input, SignerInfo::SelfSigned)),
            1 => map(
                map(decode_array::<8>, HashedId8),
                SignerInfo::CertificateDigestWithSha256,
            )(input),
            2 => {
                let (input, certificate) = Certificate::decode_bytewise(input)?;
                Ok((input, SignerInfo::Certificate(Box::new(certificate))))
            }
            x => error(DecodeError::EnumError(alloc::format!(
                "Invalid signer info type {x}!"
            ))),
        }
    }
}

fn decode_header_field<'input>(
    input: &'input [u8],
    symmetric_algorithm: Option<SymmetricAlgorithm>,
    limits: &DecodeLimits,
) -> IResult<&'input [u8], HeaderField> {
    let (input, field_type) = be_u8(input)?;
    match field_type {
        0 => map(be_u64, HeaderField::GenerationTime)(input),
        2 => map(be_u32, HeaderField::Expiration)(input),
        5 => {
            let (input, aid) = decode_length(input)?;
            match ItsAid::try_from(aid) {
                Ok(aid) => Ok((input, HeaderField::ItsAid(aid))),
                Err(_) => error(DecodeError::IntegerError(alloc::format!(
                    "ITS-AID {aid} out of range!"
                ))),
            }
        }
        128 => map(SignerInfo::decode_bytewise, HeaderField::SignerInfo)(input),
        129 => {
            let (input, symmetric_algorithm) =
                decode_discriminator::<SymmetricAlgorithm>("symmetric algorithm", input)?;
            let (input, nonce) = decode_array::<NONCE_LENGTH>(input)?;
            Ok((
                input,
                HeaderField::EncryptionParameters(EncryptionParameters {
                    symmetric_algorithm,
                    nonce,
                }),
            ))
        }
        130 => {
            let Some(symmetric_algorithm) = symmetric_algorithm else {
                return error(DecodeError::ParserError(
                    "Recipient info requires preceding encryption parameters!".into(),
                ));
            };
            let (input, mut block) = decode_length_prefixed(input)?;
            let mut recipients = vec![];
            while !block.is_empty() {
                let (rem, recipient) = decode_recipient_info(block, symmetric_algorithm, limits)?;
                block = rem;
                recipients.push(recipient);
            }
            Ok((input, HeaderField::RecipientInfo(recipients)))
        }
        x => error(DecodeError::EnumError(alloc::format!(
            "Invalid header field type {x}!"
        ))),
    }
}

fn decode_header_fields<'input>(
    input: &'input [u8],
    limits: &DecodeLimits,
) -> IResult<&'input [u8], Vec<HeaderField>> {
    let (input, mut block) = decode_length_prefixed(input)?;
    let mut fields = vec![];
    let mut symmetric_algorithm = None;
    while !block.is_empty() {
        let (rem, field) = decode_header_field(block, symmetric_algorithm, limits)?;
        if let HeaderField::EncryptionParameters(parameters) = &field {
            symmetric_algorithm = Some(parameters.symmetric_algorithm);
        }
        block = rem;
        fields.push(field);
    }
    Ok((input, fields))
}

fn decode_trailer_fields(input: &[u8]) -> IResult<&[u8], Vec<TrailerField>> {
    let (input, mut block) = decode_length_prefixed(input)?;
    let mut fields = vec![];
    while !block.is_empty() {
        let (rem, field_type) = be_u8(block)?;
        let (rem, field) = match field_type {
            1 => map(EcdsaSignature::decode_bytewise, TrailerField::Signature)(rem)?,
            x => {
                return error(DecodeError::EnumError(alloc::format!(
                    "Invalid trailer field type {x}!"
                )))
            }
        };
        block = rem;
        fields.push(field);
    }
    Ok((input, fields))
}

pub(crate) fn decode_secured_message<'input>(
    input: &'input [u8],
    limits: &DecodeLimits,
) -> IResult<&'input [u8], SecuredMessage> {
    let (input, protocol_version) = be_u8(input)?;
    if protocol_version != SECURED_MESSAGE_VERSION {
        return error(DecodeError::Unsupported(alloc::format!(
            "Secured message protocol version {protocol_version}!"
        )));
    }
    let (input, header_fields) = decode_header_fields(input, limits)?;
    let (input, payload) = decode_payload(input, limits)?;
    let (input, trailer_fields) = decode_trailer_fields(input)?;
    Ok((
        input,
        SecuredMessage {
            protocol_version,
            header_fields,
            payload,
            trailer_fields,
        },
    ))
}

impl InternalDecode for SecuredMessage {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        decode_secured_message(input, &DecodeLimits::default())
    }
}

// =====================================================
// ETSI TS 103 097/ IEEE 1609.2 (canonical OER)
// =====================================================

fn decode_oer_unsigned(input: &[u8]) -> IResult<&[u8], u64> {
    let (input, bytes) = decode_length_prefixed(input)?;
    if bytes.is_empty() || bytes.len() > 8 {
        return error(DecodeError::IntegerError(alloc::format!(
            "Unsigned integer of {} bytes is unsupported!",
            bytes.len()
        )));
    }
    let value = bytes
        .iter()
        .fold(0u64, |acc, byte| acc << 8 | u64::from(*byte));
    Ok((input, value))
}

fn decode_oer_signed(input: &[u8]) -> IResult<&[u8], i64> {
    let (input, bytes) = decode_length_prefixed(input)?;
    if bytes.is_empty() || bytes.len() > 8 {
        return error(DecodeError::IntegerError(alloc::format!(
            "Signed integer of {} bytes is unsupported!",
            bytes.len()
        )));
    }
    let fill = if bytes[0] & 0x80 == 0 { 0x00 } else { 0xff };
    let mut raw = [fill; 8];
    raw[8 - bytes.len()..].copy_from_slice(bytes);
    Ok((input, i64::from_be_bytes(raw)))
}

fn decode_oer_count(input: &[u8]) -> IResult<&[u8], usize> {
    let (remaining, count) = decode_oer_unsigned(input)?;
    // every item occupies at least one byte
    match usize::try_from(count) {
        Ok(count) if count <= remaining.len() => Ok((remaining, count)),
        _ => error(DecodeError::IntegerError(alloc::format!(
            "Sequence of {count} items exceeds the input!"
        ))),
    }
}

fn decode_psid(input: &[u8]) -> IResult<&[u8], ItsAid> {
    let (input, psid) = decode_oer_unsigned(input)?;
    match ItsAid::try_from(psid) {
        Ok(psid) => Ok((input, psid)),
        Err(_) => error(DecodeError::IntegerError(alloc::format!(
            "PSID {psid} exceeds 32 bits!"
        ))),
    }
}

fn decode_bytewise_enumerated<E: TryFrom<i128>>(input: &[u8]) -> IResult<&[u8], E> {
    let (input, byte) = be_u8(input)?;
    if byte >= 128 {
        return error(DecodeError::EnumError(
            "Enumerated values beyond 127 are unsupported!".into(),
        ));
    }
    i128::from(byte)
        .try_into()
        .map(|variant| (input, variant))
        .map_err(|_| nom::Err::Error(DecodeError::EnumError("Invalid enum index!".into())))
}

/// Extracts bits from ASN.1 buffer
///
/// First bit is the MSB of the first byte in ASN.1
fn bitslice_to_bitvec(buffer: &[u8], offset: usize, count: usize) -> Vec<bool> {
    (offset..offset + count)
        .map(|i| (buffer[i / 8] >> (7 - i % 8) & 0x01) > 0)
        .collect()
}

/// Decodes ASN.1 SEQUENCE preamble
///
/// Note: Only execute, if there is either an extension bit or optional values present!
/// (Otherwise the sequence preamble will be omitted.)
fn decode_bytewise_sequence_preamble(
    has_extension: bool,
    presence_bits: usize,
    input: &[u8],
) -> IResult<&[u8], (bool, Vec<bool>)> {
    let total_bits = presence_bits + usize::from(has_extension);
    let (input, preamble) = take(util::bitstring_buffer_size(total_bits))(input)?;

    let (ext, bitmap) = if has_extension {
        let extension = (preamble[0] & 0b1000_0000) > 0;
        (extension, bitslice_to_bitvec(preamble, 1, presence_bits))
    } else {
        (false, bitslice_to_bitvec(preamble, 0, presence_bits))
    };

    Ok((input, (ext, bitmap)))
}

fn decode_bytewise_octetstring(
    min: Option<usize>,
    max: Option<usize>,
    input: &[u8],
) -> IResult<&[u8], &[u8]> {
    let (input, bytes) = match (min, max) {
        (Some(min), Some(max)) if min == max => take(max)(input)?,
        _ => decode_length_prefixed(input)?,
    };
    if min.is_some_and(|min| bytes.len() < min) || max.is_some_and(|max| bytes.len() > max) {
        return error(DecodeError::ParserError(alloc::format!(
            "Octet string of {} bytes violates size constraint {min:?}..{max:?}!",
            bytes.len()
        )));
    }
    Ok((input, bytes))
}

fn decode_bytewise_tag(input: &[u8]) -> IResult<&[u8], u8> {
    let (input, byte) = be_u8(input)?;
    match byte & 0b0011_1111 {
        tag if tag < 63 => Ok((input, tag)),
        _ => error(DecodeError::Unsupported(
            "Tags larger than 62 are unsupported!".into(),
        )),
    }
}

fn decode_bytewise_open_type<'input, T, F>(
    decoder: F,
    input: &'input [u8],
) -> IResult<&'input [u8], T>
where
    F: Fn(&'input [u8]) -> IResult<&'input [u8], T>,
{
    let (input, length) = decode_length(input)?;
    take(length).and_then(decoder).parse(input)
}

fn decode_sequence_of<'input, T, F>(
    decoder: F,
    input: &'input [u8],
) -> IResult<&'input [u8], Vec<T>>
where
    F: Fn(&'input [u8]) -> IResult<&'input [u8], T>,
{
    let (mut input, count) = decode_oer_count(input)?;
    let mut sequence_of = Vec::with_capacity(count);
    for _ in 0..count {
        let (rem, item) = decoder(input)?;
        input = rem;
        sequence_of.push(item);
    }
    Ok((input, sequence_of))
}

fn invalid_choice<T>() -> IResult<&'static [u8], T> {
    Err(nom::Err::Error(DecodeError::EnumError(
        "Invalid choice index!".into(),
    )))
}

fn unsupported_choice<T>(what: &str) -> IResult<&'static [u8], T> {
    Err(nom::Err::Error(DecodeError::Unsupported(alloc::format!(
        "{what} is unsupported!"
    ))))
}

impl InternalDecode for Certificate {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, (_, bitmap)) = decode_bytewise_sequence_preamble(false, 1, input)?;

        let (input, version) = be_u8(input)?;
        let (input, r_type) = decode_bytewise_enumerated::<CertificateType>(input)?;
        let (input, issuer) = IssuerIdentifier::decode_bytewise(input)?;
        let (input, to_be_signed) = ToBeSignedCertificate::decode_bytewise(input)?;
        let (input, signature) = if bitmap[0] {
            map(CertificateSignature::decode_bytewise, Some)(input)?
        } else {
            (input, None)
        };
        Ok((
            input,
            Self {
                version,
                r_type,
                issuer,
                to_be_signed,
                signature,
            },
        ))
    }
}

impl InternalDecode for IssuerIdentifier {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, tag) = decode_bytewise_tag(input)?;
        match tag {
            0 => map(
                map(decode_array::<8>, HashedId8),
                IssuerIdentifier::Sha256AndDigest,
            )(input),
            1 => map(
                decode_bytewise_enumerated::<HashAlgorithm>,
                IssuerIdentifier::SelfSigned,
            )(input),
            2 => {
                let (input, id) = decode_bytewise_open_type(decode_array::<8>, input)?;
                Ok((input, IssuerIdentifier::Sha384AndDigest(HashedId8(id))))
            }
            3 => unsupported_choice("SM3 issuer digest"),
            _ => invalid_choice(),
        }
    }
}

impl InternalDecode for ToBeSignedCertificate {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, (extended, bitmap)) = decode_bytewise_sequence_preamble(true, 7, input)?;
        if extended {
            return error(DecodeError::Unsupported(
                "Certificate extensions are unsupported!".into(),
            ));
        }

        let (input, id) = CertificateId::decode_bytewise(input)?;
        let (input, craca_id) = decode_array::<3>(input)?;
        let (input, crl_series) = be_u16(input)?;
        let (input, validity_period) = ValidityPeriod::decode_bytewise(input)?;
        let (input, region) = if bitmap[0] {
            map(GeographicRegion::decode_bytewise, Some)(input)?
        } else {
            (input, None)
        };
        let (input, assurance_level) = if bitmap[1] {
            map(be_u8, Some)(input)?
        } else {
            (input, None)
        };
        let (input, app_permissions) = if bitmap[2] {
            let (input, permissions) = decode_sequence_of(PsidSsp::decode_bytewise, input)?;
            (input, Some(permissions))
        } else {
            (input, None)
        };
        let (input, cert_issue_permissions) = if bitmap[3] {
            let (input, permissions) =
                decode_sequence_of(PsidGroupPermissions::decode_bytewise, input)?;
            (input, Some(permissions))
        } else {
            (input, None)
        };
        let (input, cert_request_permissions) = if bitmap[4] {
            let (input, permissions) =
                decode_sequence_of(PsidGroupPermissions::decode_bytewise, input)?;
            (input, Some(permissions))
        } else {
            (input, None)
        };
        let can_request_rollover = bitmap[5];
        let (input, encryption_key) = if bitmap[6] {
            map(PublicEncryptionKey::decode_bytewise, Some)(input)?
        } else {
            (input, None)
        };
        let (input, verify_key_indicator) = VerificationKeyIndicator::decode_bytewise(input)?;
        Ok((
            input,
            Self {
                id,
                craca_id,
                crl_series,
                validity_period,
                region,
                assurance_level,
                app_permissions,
                cert_issue_permissions,
                cert_request_permissions,
                can_request_rollover,
                encryption_key,
                verify_key_indicator,
            },
        ))
    }
}

impl InternalDecode for CertificateId {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, tag) = decode_bytewise_tag(input)?;
        match tag {
            0 => unsupported_choice("Linkage data certificate id"),
            1 => {
                let (input, name) = decode_bytewise_octetstring(Some(0), Some(255), input)?;
                match String::from_utf8(name.to_vec()) {
                    Ok(name) => Ok((input, CertificateId::Name(name))),
                    Err(e) => error(DecodeError::StringError(alloc::format!("{e:?}"))),
                }
            }
            2 => {
                let (input, id) = decode_bytewise_octetstring(Some(1), Some(64), input)?;
                Ok((input, CertificateId::BinaryId(id.to_vec())))
            }
            3 => Ok((input, CertificateId::None)),
            _ => invalid_choice(),
        }
    }
}

impl InternalDecode for ValidityPeriod {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, start) = be_u32(input)?;
        let (input, duration) = Duration::decode_bytewise(input)?;
        Ok((input, ValidityPeriod { start, duration }))
    }
}

impl InternalDecode for Duration {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, tag) = decode_bytewise_tag(input)?;
        let (input, value) = be_u16(input)?;
        let duration = match tag {
            0 => Duration::Microseconds(value),
            1 => Duration::Milliseconds(value),
            2 => Duration::Seconds(value),
            3 => Duration::Minutes(value),
            4 => Duration::Hours(value),
            5 => Duration::SixtyHours(value),
            6 => Duration::Years(value),
            _ => return invalid_choice(),
        };
        Ok((input, duration))
    }
}

impl InternalDecode for TwoDLocation {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, latitude) = map(be_u32, |raw| raw as i32)(input)?;
        let (input, longitude) = map(be_u32, |raw| raw as i32)(input)?;
        Ok((
            input,
            TwoDLocation {
                latitude,
                longitude,
            },
        ))
    }
}

impl InternalDecode for RectangularRegion {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, north_west) = TwoDLocation::decode_bytewise(input)?;
        let (input, south_east) = TwoDLocation::decode_bytewise(input)?;
        Ok((
            input,
            RectangularRegion {
                north_west,
                south_east,
            },
        ))
    }
}

impl InternalDecode for IdentifiedRegion {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, tag) = decode_bytewise_tag(input)?;
        match tag {
            0 => map(be_u16, IdentifiedRegion::CountryOnly)(input),
            1 => {
                let (input, country) = be_u16(input)?;
                let (input, regions) = decode_sequence_of(be_u8, input)?;
                Ok((input, IdentifiedRegion::CountryAndRegions { country, regions }))
            }
            2 => unsupported_choice("Country and subregions"),
            _ => invalid_choice(),
        }
    }
}

impl InternalDecode for GeographicRegion {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, tag) = decode_bytewise_tag(input)?;
        match tag {
            0 => {
                let (input, center) = TwoDLocation::decode_bytewise(input)?;
                let (input, radius) = be_u16(input)?;
                Ok((input, GeographicRegion::Circular { center, radius }))
            }
            1 => {
                let (input, rectangles) =
                    decode_sequence_of(RectangularRegion::decode_bytewise, input)?;
                Ok((input, GeographicRegion::Rectangular(rectangles)))
            }
            2 => {
                let (input, vertices) = decode_sequence_of(TwoDLocation::decode_bytewise, input)?;
                if vertices.len() < 3 {
                    return error(DecodeError::ParserError(
                        "Polygonal region needs at least three vertices!".into(),
                    ));
                }
                Ok((input, GeographicRegion::Polygonal(vertices)))
            }
            3 => {
                let (input, regions) =
                    decode_sequence_of(IdentifiedRegion::decode_bytewise, input)?;
                Ok((input, GeographicRegion::Identified(regions)))
            }
            _ => invalid_choice(),
        }
    }
}

impl InternalDecode for PsidSsp {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, (_, bitmap)) = decode_bytewise_sequence_preamble(false, 1, input)?;
        let (input, psid) = decode_psid(input)?;
        let (input, ssp) = if bitmap[0] {
            map(ServiceSpecificPermissions::decode_bytewise, Some)(input)?
        } else {
            (input, None)
        };
        Ok((input, PsidSsp { psid, ssp }))
    }
}

impl InternalDecode for ServiceSpecificPermissions {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, tag) = decode_bytewise_tag(input)?;
        match tag {
            0 => {
                let (input, opaque) = decode_bytewise_octetstring(Some(0), None, input)?;
                Ok((input, ServiceSpecificPermissions::Opaque(opaque.to_vec())))
            }
            1 => {
                let (input, bitmap) = decode_bytewise_open_type(
                    |i| decode_bytewise_octetstring(Some(0), Some(31), i),
                    input,
                )?;
                Ok((input, ServiceSpecificPermissions::BitmapSsp(bitmap.to_vec())))
            }
            _ => invalid_choice(),
        }
    }
}

impl InternalDecode for PsidGroupPermissions {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let defaults = PsidGroupPermissions::default();
        let (input, (_, bitmap)) = decode_bytewise_sequence_preamble(false, 3, input)?;

        let (input, subject_permissions) = SubjectPermissions::decode_bytewise(input)?;
        let (input, min_chain_length) = if bitmap[0] {
            decode_oer_signed(input)?
        } else {
            (input, defaults.min_chain_length)
        };
        let (input, chain_length_range) = if bitmap[1] {
            decode_oer_signed(input)?
        } else {
            (input, defaults.chain_length_range)
        };
        let (input, ee_type) = if bitmap[2] {
            map(be_u8, EndEntityType)(input)?
        } else {
            (input, defaults.ee_type)
        };
        Ok((
            input,
            PsidGroupPermissions {
                subject_permissions,
                min_chain_length,
                chain_length_range,
                ee_type,
            },
        ))
    }
}

impl InternalDecode for SubjectPermissions {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, tag) = decode_bytewise_tag(input)?;
        match tag {
            0 => {
                let (input, ranges) = decode_sequence_of(PsidSspRange::decode_bytewise, input)?;
                Ok((input, SubjectPermissions::Explicit(ranges)))
            }
            1 => Ok((input, SubjectPermissions::All)),
            _ => invalid_choice(),
        }
    }
}

impl InternalDecode for PsidSspRange {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, (_, bitmap)) = decode_bytewise_sequence_preamble(false, 1, input)?;
        let (input, psid) = decode_psid(input)?;
        let (input, ssp_range) = if bitmap[0] {
            map(SspRange::decode_bytewise, Some)(input)?
        } else {
            (input, None)
        };
        Ok((input, PsidSspRange { psid, ssp_range }))
    }
}

impl InternalDecode for SspRange {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, tag) = decode_bytewise_tag(input)?;
        match tag {
            0 => {
                let (input, ranges) = decode_sequence_of(
                    |i| {
                        let (i, range) = decode_bytewise_octetstring(Some(0), None, i)?;
                        Ok((i, range.to_vec()))
                    },
                    input,
                )?;
                Ok((input, SspRange::Opaque(ranges)))
            }
            1 => Ok((input, SspRange::All)),
            2 => {
                let (input, (ssp_value, ssp_bitmask)) = decode_bytewise_open_type(
                    |i| {
                        let (i, value) = decode_bytewise_octetstring(Some(1), Some(32), i)?;
                        let (i, bitmask) = decode_bytewise_octetstring(Some(1), Some(32), i)?;
                        Ok((i, (value.to_vec(), bitmask.to_vec())))
                    },
                    input,
                )?;
                Ok((
                    input,
                    SspRange::BitmapSspRange {
                        ssp_value,
                        ssp_bitmask,
                    },
                ))
            }
            _ => invalid_choice(),
        }
    }
}

impl InternalDecode for PublicEncryptionKey {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, supported_symm_alg) = decode_bytewise_enumerated::<SymmAlgorithm>(input)?;
        let (input, tag) = decode_bytewise_tag(input)?;
        let (input, public_key) = match tag {
            0 => map(
                EccP256CurvePoint::decode_bytewise,
                BasePublicEncryptionKey::EciesNistP256,
            )(input)?,
            1 => map(
                EccP256CurvePoint::decode_bytewise,
                BasePublicEncryptionKey::EciesBrainpoolP256r1,
            )(input)?,
            2 => return unsupported_choice("SM2 encryption key"),
            _ => return invalid_choice(),
        };
        Ok((
            input,
            PublicEncryptionKey {
                supported_symm_alg,
                public_key,
            },
        ))
    }
}

impl InternalDecode for VerificationKeyIndicator {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, tag) = decode_bytewise_tag(input)?;
        match tag {
            0 => map(
                PublicVerificationKey::decode_bytewise,
                VerificationKeyIndicator::VerificationKey,
            )(input),
            1 => map(
                EccP256CurvePoint::decode_bytewise,
                VerificationKeyIndicator::ReconstructionValue,
            )(input),
            _ => invalid_choice(),
        }
    }
}

impl InternalDecode for PublicVerificationKey {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, tag) = decode_bytewise_tag(input)?;
        match tag {
            0 => map(
                EccP256CurvePoint::decode_bytewise,
                PublicVerificationKey::EcdsaNistP256,
            )(input),
            1 => map(
                EccP256CurvePoint::decode_bytewise,
                PublicVerificationKey::EcdsaBrainpoolP256r1,
            )(input),
            2 => {
                let (input, point) =
                    decode_bytewise_open_type(EccP384CurvePoint::decode_bytewise, input)?;
                Ok((input, PublicVerificationKey::EcdsaBrainpoolP384r1(point)))
            }
            3 => {
                let (input, point) =
                    decode_bytewise_open_type(EccP384CurvePoint::decode_bytewise, input)?;
                Ok((input, PublicVerificationKey::EcdsaNistP384(point)))
            }
            4 => unsupported_choice("SM2 verification key"),
            _ => invalid_choice(),
        }
    }
}

impl InternalDecode for EccP256CurvePoint {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, tag) = decode_bytewise_tag(input)?;
        match tag {
            0 => map(decode_array::<32>, EccP256CurvePoint::XOnly)(input),
            1 => Ok((input, EccP256CurvePoint::Fill)),
            2 => map(decode_array::<32>, EccP256CurvePoint::CompressedY0)(input),
            3 => map(decode_array::<32>, EccP256CurvePoint::CompressedY1)(input),
            4 => {
                let (input, x) = decode_array::<32>(input)?;
                let (input, y) = decode_array::<32>(input)?;
                Ok((input, EccP256CurvePoint::UncompressedP256 { x, y }))
            }
            _ => invalid_choice(),
        }
    }
}

fn decode_p384_coordinate(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    map(decode_array::<48>, |coordinate| coordinate.to_vec())(input)
}

impl InternalDecode for EccP384CurvePoint {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, tag) = decode_bytewise_tag(input)?;
        match tag {
            0 => map(decode_p384_coordinate, EccP384CurvePoint::XOnly)(input),
            1 => Ok((input, EccP384CurvePoint::Fill)),
            2 => map(decode_p384_coordinate, EccP384CurvePoint::CompressedY0)(input),
            3 => map(decode_p384_coordinate, EccP384CurvePoint::CompressedY1)(input),
            4 => {
                let (input, x) = decode_p384_coordinate(input)?;
                let (input, y) = decode_p384_coordinate(input)?;
                Ok((input, EccP384CurvePoint::UncompressedP384 { x, y }))
            }
            _ => invalid_choice(),
        }
    }
}

impl InternalDecode for EcdsaP256Signature {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, r_sig) = EccP256CurvePoint::decode_bytewise(input)?;
        let (input, s_sig) = decode_array::<32>(input)?;
        Ok((input, EcdsaP256Signature { r_sig, s_sig }))
    }
}

impl InternalDecode for EcdsaP384Signature {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, r_sig) = EccP384CurvePoint::decode_bytewise(input)?;
        let (input, s_sig) = decode_p384_coordinate(input)?;
        Ok((input, EcdsaP384Signature { r_sig, s_sig }))
    }
}

impl InternalDecode for CertificateSignature {
    fn decode_bytewise(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, tag) = decode_bytewise_tag(input)?;
        match tag {
            0 => map(
                EcdsaP256Signature::decode_bytewise,
                CertificateSignature::EcdsaNistP256,
            )(input),
            1 => map(
                EcdsaP256Signature::decode_bytewise,
                CertificateSignature::EcdsaBrainpoolP256r1,
            )(input),
            2 => {
                let (input, signature) =
                    decode_bytewise_open_type(EcdsaP384Signature::decode_bytewise, input)?;
                Ok((input, CertificateSignature::EcdsaBrainpoolP384r1(signature)))
            }
            3 => {
                let (input, signature) =
                    decode_bytewise_open_type(EcdsaP384Signature::decode_bytewise, input)?;
                Ok((input, CertificateSignature::EcdsaNistP384(signature)))
            }
            4 => unsupported_choice("SM2 signature"),
            _ => invalid_choice(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_sequence_preamble() {
        let (rest, (extended, bitmap)) =
            decode_bytewise_sequence_preamble(true, 7, &[0b0101_0001, 0xff]).unwrap();
        assert!(!extended);
        assert_eq!(bitmap, [true, false, true, false, false, false, true]);
        assert_eq!(rest, &[0xff]);

        let (_, (_, bitmap)) = decode_bytewise_sequence_preamble(false, 3, &[0b1010_0000]).unwrap();
        assert_eq!(bitmap, [true, false, true]);
    }

    #[test]
    fn decodes_oer_integers() {
        assert_eq!(decode_oer_unsigned(&[0x02, 0x01, 0x00]).unwrap().1, 256);
        assert_eq!(decode_oer_signed(&[0x01, 0xff]).unwrap().1, -1);
        assert_eq!(decode_oer_signed(&[0x02, 0x00, 0x80]).unwrap().1, 128);
        assert!(decode_oer_unsigned(&[0x00]).is_err());
    }

    #[test]
    fn rejects_sequence_count_beyond_input() {
        assert!(matches!(
            decode_oer_count(&[0x01, 0x05, 0x00]),
            Err(nom::Err::Error(DecodeError::IntegerError(_)))
        ));
    }

    #[test]
    fn rejects_unknown_header_field() {
        let data: &[u8] = &[0x02, 0x02, 0x07, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(
            SecuredMessage::decode(data),
            Err(DecodeError::EnumError(_))
        ));
    }

    #[test]
    fn rejects_recipient_info_without_encryption_parameters() {
        let data: &[u8] = &[0x02, 0x02, 0x82, 0x00, 0x00, 0x00, 0x00];
        assert!(matches!(
            SecuredMessage::decode(data),
            Err(DecodeError::ParserError(_))
        ));
    }

    #[test]
    fn reports_truncated_input() {
        let data: &[u8] = &[0x01, 0x05, 0xaa];
        assert!(matches!(
            Payload::decode(data),
            Err(DecodeError::ParserError(msg)) if msg.starts_with("Unexpected end of input")
        ));
    }
}
