use crate::decode::{decode_secured_message, finish};
use crate::encode::{encode_header_fields, encode_length_prefixed, encode_trailer_fields};
use crate::*;

/// Wire type of the signature trailer field
const SIGNATURE_TRAILER_TYPE: u8 = 1;

impl SecuredMessage {
    /// Message of the current protocol version without header and trailer fields
    #[must_use]
    pub fn new(payload: Payload) -> Self {
        Self {
            protocol_version: SECURED_MESSAGE_VERSION,
            header_fields: Vec::new(),
            payload,
            trailer_fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn signer_info(&self) -> Option<&SignerInfo> {
        self.header_fields.iter().find_map(|field| match field {
            HeaderField::SignerInfo(signer) => Some(signer),
            _ => None,
        })
    }

    #[must_use]
    pub fn generation_time(&self) -> Option<Time64> {
        self.header_fields.iter().find_map(|field| match field {
            HeaderField::GenerationTime(time) => Some(*time),
            _ => None,
        })
    }

    #[must_use]
    pub fn its_aid(&self) -> Option<ItsAid> {
        self.header_fields.iter().find_map(|field| match field {
            HeaderField::ItsAid(aid) => Some(*aid),
            _ => None,
        })
    }

    #[must_use]
    pub fn encryption_parameters(&self) -> Option<&EncryptionParameters> {
        self.header_fields.iter().find_map(|field| match field {
            HeaderField::EncryptionParameters(parameters) => Some(parameters),
            _ => None,
        })
    }

    /// Recipients of an encrypted message, empty for messages without recipient info
    #[must_use]
    pub fn recipients(&self) -> &[RecipientInfo] {
        self.header_fields
            .iter()
            .find_map(|field| match field {
                HeaderField::RecipientInfo(recipients) => Some(recipients.as_slice()),
                _ => None,
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn signature(&self) -> Option<&EcdsaSignature> {
        self.trailer_fields.iter().find_map(|field| match field {
            TrailerField::Signature(signature) => Some(signature),
        })
    }

    /// Replaces the signature trailer field, or appends one if there is none
    pub fn set_signature(&mut self, signature: EcdsaSignature) {
        self.trailer_fields
            .retain(|field| !matches!(field, TrailerField::Signature(_)));
        self.trailer_fields.push(TrailerField::Signature(signature));
    }

    pub fn serialize(&self) -> Result<Vec<u8>, EncodeError> {
        self.encode_to_vec()
    }

    /// Bytes covered by the signature
    ///
    /// Version, header fields and payload as on the wire, followed by the length prefix
    /// of the trailer fields and the type of the signature trailer field. The trailer length
    /// depends on the signature's encoded size, hence a placeholder signature of the final
    /// size has to be in place before calling this.
    pub fn convert_for_signing(&self) -> Result<Vec<u8>, EncodeError> {
        let mut output = Encoder::new();
        output.append(&[self.protocol_version]);
        encode_length_prefixed(&encode_header_fields(&self.header_fields)?, &mut output)?;
        self.payload.encode(&mut output)?;
        let trailer = encode_trailer_fields(&self.trailer_fields)?;
        crate::encode::encode_length(trailer.len(), &mut output)?;
        if self.signature().is_some() {
            output.append(&[SIGNATURE_TRAILER_TYPE]);
        }
        Ok(output.into())
    }

    pub fn decode_with_limits<'input>(
        input: &'input [u8],
        limits: &DecodeLimits,
    ) -> Result<Decoded<Self>, DecodeError<&'input [u8]>> {
        finish(input, decode_secured_message(input, limits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encrypted_message() -> SecuredMessage {
        let mut message = SecuredMessage::new(Payload::new(
            PayloadType::SignedAndEncrypted,
            vec![0xc0, 0xff, 0xee],
        ));
        message.header_fields = vec![
            HeaderField::SignerInfo(SignerInfo::CertificateDigestWithSha256(HashedId8([7; 8]))),
            HeaderField::GenerationTime(0x0102_0304_0506_0708),
            HeaderField::ItsAid(aid::DEN),
            HeaderField::EncryptionParameters(EncryptionParameters {
                symmetric_algorithm: SymmetricAlgorithm::Aes128Ccm,
                nonce: [9; NONCE_LENGTH],
            }),
            HeaderField::RecipientInfo(vec![
                RecipientInfo {
                    cert_id: HashedId8([1; 8]),
                    enc_key: Key::Ecies(EciesEncryptedKey {
                        v: EccPoint::CompressedLsbY0([2; 32]),
                        c: vec![3; 16],
                        t: [4; ECIES_TAG_LENGTH],
                    }),
                },
                RecipientInfo {
                    cert_id: HashedId8([5; 8]),
                    enc_key: Key::Opaque(OpaqueKey { data: vec![6; 20] }),
                },
            ]),
        ];
        message.set_signature(EcdsaSignature::zero());
        message
    }

    #[test]
    fn encodes_unsigned_message() {
        let mut message = SecuredMessage::new(Payload::new(PayloadType::Unsecured, vec![0xaa]));
        message.header_fields = vec![
            HeaderField::GenerationTime(1),
            HeaderField::ItsAid(aid::CA),
        ];
        assert_eq!(
            message.serialize().unwrap(),
            [
                0x02, // version
                0x0b, 0x00, 0, 0, 0, 0, 0, 0, 0, 1, 0x05, 0x24, // header fields
                0x00, 0x01, 0xaa, // payload
                0x00, // trailer fields
            ]
        );
    }

    #[test]
    fn round_trips_encrypted_message() {
        let message = encrypted_message();
        let encoded = message.serialize().unwrap();
        let decoded = SecuredMessage::decode(&encoded[..]).unwrap();
        assert_eq!(decoded.bytes_consumed, encoded.len());
        assert_eq!(decoded.decoded, message);
        assert_eq!(decoded.decoded.recipients().len(), 2);
        assert_eq!(decoded.decoded.its_aid(), Some(aid::DEN));
        assert_eq!(
            decoded.decoded.generation_time(),
            Some(0x0102_0304_0506_0708)
        );
    }

    #[test]
    fn signing_view_ends_with_signature_type() {
        let message = encrypted_message();
        let encoded = message.serialize().unwrap();
        let to_sign = message.convert_for_signing().unwrap();
        // trailer: type, algorithm, 33 bytes of R and 32 bytes of S
        let signature_size = 1 + 1 + 33 + 32;
        assert_eq!(to_sign.len(), encoded.len() - signature_size + 1);
        assert_eq!(to_sign[..to_sign.len() - 1], encoded[..to_sign.len() - 1]);
        assert_eq!(to_sign.last(), Some(&SIGNATURE_TRAILER_TYPE));
    }

    #[test]
    fn signing_view_ignores_signature_value() {
        let mut message = encrypted_message();
        let before = message.convert_for_signing().unwrap();
        message.set_signature(EcdsaSignature {
            r: EccPoint::XCoordinateOnly([0xab; 32]),
            s: [0xcd; 32],
        });
        assert_eq!(message.trailer_fields.len(), 1);
        assert_eq!(message.convert_for_signing().unwrap(), before);
    }

    #[test]
    fn applies_limits_to_nested_structures() {
        let encoded = encrypted_message().serialize().unwrap();
        let limits = DecodeLimits {
            opaque_key: 10,
            ..DecodeLimits::default()
        };
        // the degraded key leaves its content in the recipient block, which then fails to parse
        assert!(SecuredMessage::decode_with_limits(&encoded, &limits).is_err());

        let limits = DecodeLimits {
            payload_data: 2,
            ..DecodeLimits::default()
        };
        assert!(matches!(
            SecuredMessage::decode_with_limits(&encoded, &limits),
            Err(DecodeError::ExcessiveLength {
                length: 3,
                limit: 2
            })
        ));
    }

    #[test]
    fn rejects_other_protocol_versions() {
        let mut encoded = encrypted_message().serialize().unwrap();
        encoded[0] = 3;
        assert!(matches!(
            SecuredMessage::decode(&encoded[..]),
            Err(DecodeError::Unsupported(_))
        ));
    }
}
