use crate::decode::{decode_payload, finish};
use crate::length::length_prefixed_size;
use crate::*;

impl Payload {
    pub fn new(payload_type: PayloadType, data: impl Into<Bytes>) -> Self {
        Self {
            payload_type,
            data: data.into(),
        }
    }

    #[must_use]
    pub fn payload_type(&self) -> PayloadType {
        self.payload_type
    }

    /// Number of bytes written by [`Payload::serialize`]
    #[must_use]
    pub fn encoded_size(&self) -> usize {
        1 + Self::data_size(&self.data)
    }

    /// Encoded size of `data` as length prefixed payload content, without the type discriminator
    #[must_use]
    pub fn data_size(data: &[u8]) -> usize {
        length_prefixed_size(data.len())
    }

    /// Type discriminator, length prefix and data, without padding
    pub fn serialize(&self) -> Result<Vec<u8>, EncodeError> {
        self.encode_to_vec()
    }

    /// Decodes a payload, refusing declared data lengths beyond `limits.payload_data`
    /// with [`DecodeError::ExcessiveLength`]
    pub fn decode_with_limits<'input>(
        input: &'input [u8],
        limits: &DecodeLimits,
    ) -> Result<Decoded<Self>, DecodeError<&'input [u8]>> {
        finish(input, decode_payload(input, limits))
    }
}
