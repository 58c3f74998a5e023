//! Cryptographic primitives behind signing and verification
//!
//! The [`Backend`] trait is the seam between message assembly and the elliptic curve
//! implementation. [`P256Backend`] implements ECDSA over NIST P-256 with SHA-256 on top of
//! the `ecdsa` and `p256` crates (feature `crypto`).

use alloc::string::String;
use core::fmt;

use crate::{EcdsaSignature, PublicKey};

/// Scalar of an ECDSA NIST P-256 private key, big-endian
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(pub [u8; 32]);

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Unsupported public key: {0}")]
    UnsupportedKey(String),
    #[error("Signing failed: {0}")]
    Signing(String),
}

pub trait Backend {
    /// Signs `data` with `private_key`
    fn sign_data(
        &self,
        private_key: &PrivateKey,
        data: &[u8],
    ) -> Result<EcdsaSignature, BackendError>;

    /// Checks `signature` over `data` against `public_key`, any failure yields `false`
    fn verify_data(&self, public_key: &PublicKey, data: &[u8], signature: &EcdsaSignature) -> bool;
}

#[cfg(feature = "crypto")]
pub use p256_backend::P256Backend;

#[cfg(feature = "crypto")]
mod p256_backend {
    use alloc::vec::Vec;

    use ecdsa::{
        elliptic_curve::{point::DecompressPoint, subtle::Choice},
        signature::{Signer, Verifier},
        Signature, SigningKey, VerifyingKey,
    };
    use p256::{AffinePoint, EncodedPoint, NistP256};
    use tracing::debug;

    use super::{Backend, BackendError, PrivateKey};
    use crate::{EccPoint, EcdsaSignature, KeyCompression, KeyType, PublicKey};

    /// ECDSA NIST P-256 with SHA-256 and deterministic nonces (RFC 6979)
    #[derive(Debug, Clone, Copy, Default)]
    pub struct P256Backend;

    impl P256Backend {
        /// Compressed public key belonging to `private_key`
        pub fn public_key(&self, private_key: &PrivateKey) -> Result<PublicKey, BackendError> {
            let point = signing_key(private_key)?
                .verifying_key()
                .to_encoded_point(true);
            let (tag, x) = point
                .as_bytes()
                .split_first()
                .ok_or(BackendError::InvalidPrivateKey)?;
            let compression = if *tag == 0x03 {
                KeyCompression::Y1
            } else {
                KeyCompression::Y0
            };
            Ok(PublicKey {
                key_type: KeyType::NistP256,
                compression,
                x: x.to_vec(),
                y: Vec::new(),
            })
        }
    }

    fn signing_key(private_key: &PrivateKey) -> Result<SigningKey<NistP256>, BackendError> {
        SigningKey::from_slice(&private_key.0).map_err(|_| BackendError::InvalidPrivateKey)
    }

    fn coordinate(bytes: &[u8]) -> Result<[u8; 32], BackendError> {
        bytes.try_into().map_err(|_| {
            BackendError::UnsupportedKey(alloc::format!(
                "Coordinate of {} bytes, expected 32",
                bytes.len()
            ))
        })
    }

    fn verifying_key(public_key: &PublicKey) -> Result<VerifyingKey<NistP256>, BackendError> {
        if public_key.key_type != KeyType::NistP256 {
            return Err(BackendError::UnsupportedKey(alloc::format!(
                "{:?}",
                public_key.key_type
            )));
        }
        let x = coordinate(&public_key.x)?;
        match public_key.compression {
            KeyCompression::Y0 | KeyCompression::Y1 => {
                let y_is_odd = Choice::from(u8::from(public_key.compression == KeyCompression::Y1));
                let affine: Option<AffinePoint> =
                    AffinePoint::decompress(&x.into(), y_is_odd).into();
                let affine = affine.ok_or_else(|| {
                    BackendError::UnsupportedKey("Not a point on NIST P-256".into())
                })?;
                VerifyingKey::from_affine(affine)
                    .map_err(|e| BackendError::UnsupportedKey(alloc::format!("{e:?}")))
            }
            KeyCompression::NoCompression => {
                let y = coordinate(&public_key.y)?;
                let encoded = EncodedPoint::from_affine_coordinates(&x.into(), &y.into(), false);
                VerifyingKey::from_encoded_point(&encoded)
                    .map_err(|e| BackendError::UnsupportedKey(alloc::format!("{e:?}")))
            }
        }
    }

    impl Backend for P256Backend {
        fn sign_data(
            &self,
            private_key: &PrivateKey,
            data: &[u8],
        ) -> Result<EcdsaSignature, BackendError> {
            let signature: Signature<NistP256> = signing_key(private_key)?
                .try_sign(data)
                .map_err(|e| BackendError::Signing(alloc::format!("{e}")))?;
            let (r, s) = signature.split_bytes();
            let mut signature = EcdsaSignature::zero();
            let mut r_bytes = [0u8; 32];
            r_bytes.copy_from_slice(&r);
            signature.r = EccPoint::XCoordinateOnly(r_bytes);
            signature.s.copy_from_slice(&s);
            Ok(signature)
        }

        fn verify_data(
            &self,
            public_key: &PublicKey,
            data: &[u8],
            signature: &EcdsaSignature,
        ) -> bool {
            let verifying_key = match verifying_key(public_key) {
                Ok(key) => key,
                Err(e) => {
                    debug!(error = %e, "Cannot verify with public key");
                    return false;
                }
            };
            let Ok(signature) = Signature::<NistP256>::from_scalars(*signature.r.x(), signature.s)
            else {
                debug!("Signature scalars out of range");
                return false;
            };
            verifying_key.verify(data, &signature).is_ok()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        const KEY: PrivateKey = PrivateKey([
            0xc9, 0xaf, 0xa9, 0xd8, 0x45, 0xba, 0x75, 0x16, 0x6b, 0x5c, 0x21, 0x57, 0x67, 0xb1,
            0xd6, 0x93, 0x4e, 0x50, 0xc3, 0xdb, 0x36, 0xe8, 0x9b, 0x12, 0x7b, 0x8a, 0x62, 0x2b,
            0x12, 0x0f, 0x67, 0x21,
        ]);

        #[test]
        fn signs_deterministically() {
            let backend = P256Backend;
            let first = backend.sign_data(&KEY, b"sample").unwrap();
            let second = backend.sign_data(&KEY, b"sample").unwrap();
            assert_eq!(first, second);
            assert!(matches!(first.r, EccPoint::XCoordinateOnly(_)));
        }

        #[test]
        fn verifies_own_signature() {
            let backend = P256Backend;
            let public_key = backend.public_key(&KEY).unwrap();
            assert_eq!(public_key.x.len(), 32);
            let signature = backend.sign_data(&KEY, b"sample").unwrap();
            assert!(backend.verify_data(&public_key, b"sample", &signature));
            assert!(!backend.verify_data(&public_key, b"samplf", &signature));
        }

        #[test]
        fn refuses_foreign_key_types() {
            let backend = P256Backend;
            let mut public_key = backend.public_key(&KEY).unwrap();
            let signature = backend.sign_data(&KEY, b"sample").unwrap();
            public_key.key_type = KeyType::BrainpoolP256r1;
            assert!(!backend.verify_data(&public_key, b"sample", &signature));
        }

        #[test]
        fn rejects_zero_private_key() {
            assert_eq!(
                P256Backend.sign_data(&PrivateKey([0; 32]), b"sample"),
                Err(BackendError::InvalidPrivateKey)
            );
        }

        #[test]
        fn redacts_private_key() {
            assert_eq!(format!("{KEY:?}"), "PrivateKey(..)");
        }
    }
}
