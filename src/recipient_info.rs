use crate::decode::{decode_recipient_info, finish};
use crate::encode::encode_recipient_info;
use crate::length::length_prefixed_size;
use crate::*;

impl Key {
    /// Wire discriminator of the key.
    ///
    /// Opaque keys are written as [`PublicKeyAlgorithm::EcdsaNistP256WithSha256`],
    /// since the algorithm they were created for is unknown after decoding.
    #[must_use]
    pub fn public_key_algorithm(&self) -> PublicKeyAlgorithm {
        match self {
            Key::Ecies(_) => PublicKeyAlgorithm::EciesNistP256,
            Key::Opaque(_) => PublicKeyAlgorithm::EcdsaNistP256WithSha256,
        }
    }

    fn encoded_size(&self) -> usize {
        match self {
            Key::Ecies(key) => key.v.encoded_size() + key.c.len() + key.t.len(),
            Key::Opaque(key) => length_prefixed_size(key.data.len()),
        }
    }
}

impl EccPoint {
    #[must_use]
    pub fn encoded_size(&self) -> usize {
        match self {
            EccPoint::Uncompressed { x, y } => 1 + x.len() + y.len(),
            point => 1 + point.x().len(),
        }
    }
}

impl RecipientInfo {
    #[must_use]
    pub fn public_key_algorithm(&self) -> PublicKeyAlgorithm {
        self.enc_key.public_key_algorithm()
    }

    /// Number of bytes written by [`RecipientInfo::serialize`]
    #[must_use]
    pub fn encoded_size(&self) -> usize {
        self.cert_id.0.len() + 1 + self.enc_key.encoded_size()
    }

    /// Writes the recipient info for a message encrypted with `symmetric_algorithm`.
    ///
    /// Fails with [`EncodeError::FieldSize`] before writing anything if an ECIES
    /// ciphertext does not match the field size of `symmetric_algorithm`.
    pub fn serialize(
        &self,
        symmetric_algorithm: SymmetricAlgorithm,
    ) -> Result<Vec<u8>, EncodeError> {
        let mut encoder = Encoder::new();
        encode_recipient_info(self, symmetric_algorithm, &mut encoder)?;
        Ok(encoder.into())
    }

    /// Decodes a recipient info of a message encrypted with `symmetric_algorithm`,
    /// applying the default [`DecodeLimits`]
    pub fn decode(
        input: &[u8],
        symmetric_algorithm: SymmetricAlgorithm,
    ) -> Result<Decoded<Self>, DecodeError<&[u8]>> {
        Self::decode_with_limits(input, symmetric_algorithm, &DecodeLimits::default())
    }

    /// Decodes a recipient info.
    ///
    /// Every discriminator other than [`PublicKeyAlgorithm::EciesNistP256`] yields an opaque key.
    /// An opaque key declared longer than `limits.opaque_key` decodes as an empty key; its
    /// content is not consumed.
    pub fn decode_with_limits<'input>(
        input: &'input [u8],
        symmetric_algorithm: SymmetricAlgorithm,
        limits: &DecodeLimits,
    ) -> Result<Decoded<Self>, DecodeError<&'input [u8]>> {
        finish(input, decode_recipient_info(input, symmetric_algorithm, limits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CERT_ID: [u8; 8] = [0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17];

    fn ecies_recipient() -> RecipientInfo {
        RecipientInfo {
            cert_id: HashedId8(CERT_ID),
            enc_key: Key::Ecies(EciesEncryptedKey {
                v: EccPoint::CompressedLsbY1([0x42; 32]),
                c: (0..16).collect(),
                t: [0xee; ECIES_TAG_LENGTH],
            }),
        }
    }

    fn opaque_wire(discriminator: u8, declared: usize, content: usize) -> Vec<u8> {
        let mut data = CERT_ID.to_vec();
        data.push(discriminator);
        data.extend(length::serialize_length(declared));
        data.extend(core::iter::repeat(0x77).take(content));
        data
    }

    #[test]
    fn round_trips_ecies_key() {
        let info = ecies_recipient();
        assert_eq!(
            info.public_key_algorithm(),
            PublicKeyAlgorithm::EciesNistP256
        );
        let encoded = info.serialize(SymmetricAlgorithm::Aes128Ccm).unwrap();
        assert_eq!(encoded.len(), info.encoded_size());
        assert_eq!(encoded.len(), 8 + 1 + 33 + 16 + 16);
        assert_eq!(encoded[8], 1);

        let decoded = RecipientInfo::decode(&encoded, SymmetricAlgorithm::Aes128Ccm).unwrap();
        assert_eq!(decoded.bytes_consumed, encoded.len());
        assert_eq!(decoded.decoded, info);
    }

    #[test]
    fn refuses_ciphertext_of_wrong_field_size() {
        let mut info = ecies_recipient();
        if let Key::Ecies(key) = &mut info.enc_key {
            key.c.truncate(15);
        }
        assert_eq!(
            info.serialize(SymmetricAlgorithm::Aes128Ccm),
            Err(EncodeError::FieldSize {
                expected: 16,
                actual: 15
            })
        );
    }

    #[test]
    fn maps_every_other_discriminator_to_opaque() {
        for discriminator in [0u8, 2, 3, 0x7f, 0xff] {
            let data = opaque_wire(discriminator, 3, 3);
            let decoded = RecipientInfo::decode(&data, SymmetricAlgorithm::Aes128Ccm).unwrap();
            assert_eq!(decoded.bytes_consumed, data.len());
            assert_eq!(
                decoded.decoded.enc_key,
                Key::Opaque(OpaqueKey {
                    data: vec![0x77; 3]
                })
            );
            assert_eq!(
                decoded.decoded.public_key_algorithm(),
                PublicKeyAlgorithm::EcdsaNistP256WithSha256
            );
        }
    }

    #[test]
    fn keeps_opaque_key_at_limit() {
        let data = opaque_wire(0, 512, 512);
        let decoded = RecipientInfo::decode(&data, SymmetricAlgorithm::Aes128Ccm).unwrap();
        assert_eq!(decoded.bytes_consumed, data.len());
        assert_eq!(
            decoded.decoded.enc_key,
            Key::Opaque(OpaqueKey {
                data: vec![0x77; 512]
            })
        );
        assert_eq!(decoded.decoded.encoded_size(), data.len());
    }

    #[test]
    fn degrades_oversized_opaque_key_to_empty() {
        let data = opaque_wire(0, 513, 513);
        let decoded = RecipientInfo::decode(&data, SymmetricAlgorithm::Aes128Ccm).unwrap();
        assert_eq!(decoded.decoded.cert_id, HashedId8(CERT_ID));
        assert_eq!(decoded.decoded.enc_key, Key::Opaque(OpaqueKey::default()));
        // cert id, discriminator and a three byte length prefix
        assert_eq!(decoded.bytes_consumed, 8 + 1 + 3);
    }

    #[test]
    fn round_trips_opaque_key() {
        let info = RecipientInfo {
            cert_id: HashedId8(CERT_ID),
            enc_key: Key::Opaque(OpaqueKey {
                data: vec![1, 2, 3, 4],
            }),
        };
        let encoded = info.serialize(SymmetricAlgorithm::Aes128Ccm).unwrap();
        assert_eq!(encoded, [&CERT_ID[..], &[0x00, 0x04, 1, 2, 3, 4]].concat());
        let decoded = RecipientInfo::decode(&encoded, SymmetricAlgorithm::Aes128Ccm).unwrap();
        assert_eq!(decoded.decoded, info);
    }

    #[test]
    fn reports_truncated_ciphertext() {
        let encoded = ecies_recipient()
            .serialize(SymmetricAlgorithm::Aes128Ccm)
            .unwrap();
        assert!(matches!(
            RecipientInfo::decode(&encoded[..encoded.len() - 1], SymmetricAlgorithm::Aes128Ccm),
            Err(DecodeError::ParserError(_))
        ));
    }
}
