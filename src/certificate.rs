use sha2::Digest;
use tracing::trace;

use crate::*;

/// Longest service specific permission stored as `BitmapSsp`, longer ones are stored opaque
const BITMAP_SSP_MAX_LENGTH: usize = 31;

impl Default for Certificate {
    fn default() -> Self {
        Self {
            version: 3,
            r_type: CertificateType::Explicit,
            issuer: IssuerIdentifier::SelfSigned(HashAlgorithm::Sha256),
            to_be_signed: ToBeSignedCertificate {
                id: CertificateId::None,
                craca_id: [0; 3],
                crl_series: 0,
                validity_period: ValidityPeriod {
                    start: 0,
                    duration: Duration::Hours(0),
                },
                region: None,
                assurance_level: None,
                app_permissions: None,
                cert_issue_permissions: None,
                cert_request_permissions: None,
                can_request_rollover: false,
                encryption_key: None,
                verify_key_indicator: VerificationKeyIndicator::VerificationKey(
                    PublicVerificationKey::EcdsaNistP256(EccP256CurvePoint::Fill),
                ),
            },
            signature: None,
        }
    }
}

impl Certificate {
    /// Explicit, self-signed version 3 certificate without permissions, key or signature
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Certificate that has the shape of an authorization ticket, but carries zeroed key material
    #[must_use]
    pub fn fake() -> Self {
        let mut certificate = Self {
            issuer: IssuerIdentifier::Sha256AndDigest(HashedId8::default()),
            ..Self::default()
        };
        certificate.to_be_signed.verify_key_indicator = VerificationKeyIndicator::VerificationKey(
            PublicVerificationKey::EcdsaNistP256(EccP256CurvePoint::CompressedY0([0; 32])),
        );
        certificate.set_signature(EcdsaSignature::zero());
        certificate
    }

    /// Grants `ssp` for `aid`.
    ///
    /// Grants are appended, an existing grant for `aid` is neither replaced nor merged.
    pub fn add_permission(&mut self, aid: ItsAid, ssp: impl Into<Vec<u8>>) {
        let ssp = ssp.into();
        let ssp = if ssp.len() <= BITMAP_SSP_MAX_LENGTH {
            ServiceSpecificPermissions::BitmapSsp(ssp)
        } else {
            ServiceSpecificPermissions::Opaque(ssp)
        };
        self.to_be_signed
            .app_permissions
            .get_or_insert_with(Vec::new)
            .push(PsidSsp {
                psid: aid,
                ssp: Some(ssp),
            });
    }

    /// Grants permissions for issuing certificates
    pub fn add_cert_permission(&mut self, group_permission: PsidGroupPermissions) {
        self.to_be_signed
            .cert_issue_permissions
            .get_or_insert_with(Vec::new)
            .push(group_permission);
    }

    /// Stores `signature` without verifying it
    pub fn set_signature(&mut self, signature: impl Into<CertificateSignature>) {
        self.signature = Some(signature.into());
    }

    /// Canonical encoding including the signature
    pub fn serialize(&self) -> Result<Vec<u8>, EncodeError> {
        self.encode_to_vec()
    }

    /// Canonical encoding with the signature omitted, i.e. the bytes covered by the signature
    pub fn convert_for_signing(&self) -> Result<Vec<u8>, EncodeError> {
        let mut unsigned = self.clone();
        unsigned.signature = None;
        unsigned.encode_to_vec()
    }

    /// Digest identifying this certificate.
    ///
    /// The canonicalized certificate is hashed with the algorithm named by its issuer,
    /// the low-order eight bytes form the id. `None` for certificates other than version 3,
    /// SM3 issuers and certificates that cannot be encoded.
    #[must_use]
    pub fn calculate_hash(&self) -> Option<HashedId8> {
        if self.version != 3 {
            return None;
        }
        let algorithm = match self.issuer {
            IssuerIdentifier::Sha256AndDigest(_) => HashAlgorithm::Sha256,
            IssuerIdentifier::SelfSigned(algorithm) => algorithm,
            IssuerIdentifier::Sha384AndDigest(_) => HashAlgorithm::Sha384,
        };
        let encoded = match self.canonicalized().encode_to_vec() {
            Ok(encoded) => encoded,
            Err(e) => {
                trace!(error = %e, "Certificate cannot be encoded for hashing");
                return None;
            }
        };
        let digest = match algorithm {
            HashAlgorithm::Sha256 => sha2::Sha256::digest(&encoded).to_vec(),
            HashAlgorithm::Sha384 => sha2::Sha384::digest(&encoded).to_vec(),
            HashAlgorithm::Sm3 => return None,
        };
        let mut id = [0u8; 8];
        id.copy_from_slice(&digest[digest.len() - 8..]);
        Some(HashedId8(id))
    }

    /// Copy with the signature's R value reduced to its x-coordinate
    /// and the verification key in compressed form
    fn canonicalized(&self) -> Self {
        let mut canonical = self.clone();
        if let VerificationKeyIndicator::VerificationKey(key) =
            &mut canonical.to_be_signed.verify_key_indicator
        {
            match key {
                PublicVerificationKey::EcdsaNistP256(point)
                | PublicVerificationKey::EcdsaBrainpoolP256r1(point) => {
                    *point = point.compressed();
                }
                PublicVerificationKey::EcdsaBrainpoolP384r1(point)
                | PublicVerificationKey::EcdsaNistP384(point) => {
                    *point = point.compressed();
                }
            }
        }
        match &mut canonical.signature {
            Some(
                CertificateSignature::EcdsaNistP256(signature)
                | CertificateSignature::EcdsaBrainpoolP256r1(signature),
            ) => signature.r_sig = signature.r_sig.x_only(),
            Some(
                CertificateSignature::EcdsaBrainpoolP384r1(signature)
                | CertificateSignature::EcdsaNistP384(signature),
            ) => signature.r_sig = signature.r_sig.x_only(),
            None => (),
        }
        canonical
    }

    /// Verification key of an explicit certificate
    ///
    /// Reconstruction values, x-only points and fill points yield `None`.
    #[must_use]
    pub fn public_key(&self) -> Option<PublicKey> {
        let VerificationKeyIndicator::VerificationKey(key) = &self.to_be_signed.verify_key_indicator
        else {
            return None;
        };
        match key {
            PublicVerificationKey::EcdsaNistP256(point) => point.to_public_key(KeyType::NistP256),
            PublicVerificationKey::EcdsaBrainpoolP256r1(point) => {
                point.to_public_key(KeyType::BrainpoolP256r1)
            }
            PublicVerificationKey::EcdsaBrainpoolP384r1(point) => {
                point.to_public_key(KeyType::BrainpoolP384r1)
            }
            PublicVerificationKey::EcdsaNistP384(point) => point.to_public_key(KeyType::NistP384),
        }
    }

    /// Service specific permissions of the first grant for `aid`, empty if there is none
    #[must_use]
    pub fn app_permissions(&self, aid: ItsAid) -> &[u8] {
        self.to_be_signed
            .app_permissions
            .iter()
            .flatten()
            .find(|grant| grant.psid == aid)
            .and_then(|grant| grant.ssp.as_ref())
            .map(ServiceSpecificPermissions::as_bytes)
            .unwrap_or_default()
    }
}

/// Allows issuing certificates for `aid` with SSPs matching `ssp` under `bitmask`.
///
/// An empty `ssp` grants every SSP of `aid`. Groups already covering all subjects stay unchanged.
pub fn add_psid_group_permission(
    group_permission: &mut PsidGroupPermissions,
    aid: ItsAid,
    ssp: &[u8],
    bitmask: &[u8],
) {
    let SubjectPermissions::Explicit(ranges) = &mut group_permission.subject_permissions else {
        return;
    };
    let ssp_range = if ssp.is_empty() {
        None
    } else {
        Some(SspRange::BitmapSspRange {
            ssp_value: ssp.to_vec(),
            ssp_bitmask: bitmask.to_vec(),
        })
    };
    ranges.push(PsidSspRange {
        psid: aid,
        ssp_range,
    });
}

impl From<EccPoint> for EccP256CurvePoint {
    fn from(value: EccPoint) -> Self {
        match value {
            EccPoint::XCoordinateOnly(x) => EccP256CurvePoint::XOnly(x),
            EccPoint::CompressedLsbY0(x) => EccP256CurvePoint::CompressedY0(x),
            EccPoint::CompressedLsbY1(x) => EccP256CurvePoint::CompressedY1(x),
            EccPoint::Uncompressed { x, y } => EccP256CurvePoint::UncompressedP256 { x, y },
        }
    }
}

impl From<EcdsaSignature> for CertificateSignature {
    fn from(value: EcdsaSignature) -> Self {
        CertificateSignature::EcdsaNistP256(EcdsaP256Signature {
            r_sig: value.r.into(),
            s_sig: value.s,
        })
    }
}

impl EccP256CurvePoint {
    fn x_only(self) -> Self {
        match self {
            EccP256CurvePoint::CompressedY0(x)
            | EccP256CurvePoint::CompressedY1(x)
            | EccP256CurvePoint::UncompressedP256 { x, .. } => EccP256CurvePoint::XOnly(x),
            point => point,
        }
    }

    fn compressed(self) -> Self {
        match self {
            EccP256CurvePoint::UncompressedP256 { x, y } if y[31] & 1 == 0 => {
                EccP256CurvePoint::CompressedY0(x)
            }
            EccP256CurvePoint::UncompressedP256 { x, .. } => EccP256CurvePoint::CompressedY1(x),
            point => point,
        }
    }

    fn to_public_key(self, key_type: KeyType) -> Option<PublicKey> {
        let (compression, x, y) = match self {
            EccP256CurvePoint::XOnly(_) | EccP256CurvePoint::Fill => return None,
            EccP256CurvePoint::CompressedY0(x) => (KeyCompression::Y0, x, Vec::new()),
            EccP256CurvePoint::CompressedY1(x) => (KeyCompression::Y1, x, Vec::new()),
            EccP256CurvePoint::UncompressedP256 { x, y } => {
                (KeyCompression::NoCompression, x, y.to_vec())
            }
        };
        Some(PublicKey {
            key_type,
            compression,
            x: x.to_vec(),
            y,
        })
    }
}

impl EccP384CurvePoint {
    fn x_only(&self) -> Self {
        match self {
            EccP384CurvePoint::CompressedY0(x)
            | EccP384CurvePoint::CompressedY1(x)
            | EccP384CurvePoint::UncompressedP384 { x, .. } => EccP384CurvePoint::XOnly(x.clone()),
            point => point.clone(),
        }
    }

    fn compressed(&self) -> Self {
        match self {
            EccP384CurvePoint::UncompressedP384 { x, y } => {
                if y.last().is_some_and(|last| last & 1 == 1) {
                    EccP384CurvePoint::CompressedY1(x.clone())
                } else {
                    EccP384CurvePoint::CompressedY0(x.clone())
                }
            }
            point => point.clone(),
        }
    }

    fn to_public_key(&self, key_type: KeyType) -> Option<PublicKey> {
        let (compression, x, y) = match self {
            EccP384CurvePoint::XOnly(_) | EccP384CurvePoint::Fill => return None,
            EccP384CurvePoint::CompressedY0(x) => (KeyCompression::Y0, x, Vec::new()),
            EccP384CurvePoint::CompressedY1(x) => (KeyCompression::Y1, x, Vec::new()),
            EccP384CurvePoint::UncompressedP384 { x, y } => {
                (KeyCompression::NoCompression, x, y.clone())
            }
        };
        Some(PublicKey {
            key_type,
            compression,
            x: x.clone(),
            y,
        })
    }
}
