//! Assembly of signed secured messages
//!
//! A [`SignService`] turns a [`SignRequest`] into a complete [`SecuredMessage`].
//! [`StraightSignService`] signs with the station's own certificate and key through a
//! [`Backend`], while [`DummySignService`] produces structurally identical messages
//! carrying a meaningless signature.

use alloc::{boxed::Box, vec, vec::Vec};

use bytes::Bytes;
use tracing::{debug, trace, warn};

use crate::backend::{Backend, BackendError, PrivateKey};
use crate::runtime::Runtime;
use crate::{
    aid, Certificate, DecodeLimits, EcdsaSignature, EncodeError, EncryptionParameters, HashedId8,
    HeaderField, ItsAid, Key, Payload, PayloadType, RecipientInfo, SecuredMessage, SignerInfo,
    Time64,
};

/// Default interval between two CA messages carrying the full certificate, in microseconds
pub const DEFAULT_CERTIFICATE_INTERVAL: u64 = 1_000_000;

/// Encryption material attached to a message by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct EncryptionRequest {
    pub parameters: EncryptionParameters,
    pub recipients: Vec<RecipientInfo>,
}

/// Request to sign a message
///
/// `plain_message` becomes the payload data unchanged. For requests carrying
/// [`EncryptionRequest`] material it is expected to be the ciphertext already.
#[derive(Debug, Clone, PartialEq)]
pub struct SignRequest {
    pub plain_message: Bytes,
    pub its_aid: ItsAid,
    /// service specific permissions the message is sent under, empty if none are required
    pub permissions: Bytes,
    pub encryption: Option<EncryptionRequest>,
}

impl SignRequest {
    #[must_use]
    pub fn new(its_aid: ItsAid, plain_message: impl Into<Bytes>) -> Self {
        Self {
            plain_message: plain_message.into(),
            its_aid,
            permissions: Bytes::new(),
            encryption: None,
        }
    }

    #[must_use]
    pub fn with_permissions(mut self, permissions: impl Into<Bytes>) -> Self {
        self.permissions = permissions.into();
        self
    }

    #[must_use]
    pub fn with_encryption(mut self, encryption: EncryptionRequest) -> Self {
        self.encryption = Some(encryption);
        self
    }

    fn payload_type(&self) -> PayloadType {
        match self.encryption {
            Some(_) => PayloadType::SignedAndEncrypted,
            None => PayloadType::Signed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("No certificate available for signing")]
    MissingCertificate,
    #[error("No private key available for signing")]
    MissingPrivateKey,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("Certificate does not grant the requested permissions for ITS-AID {0}")]
    MissingPermission(ItsAid),
    #[error("Digest of the signing certificate cannot be calculated")]
    CertificateDigest,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("Signature of {actual} bytes does not replace placeholder of {expected} bytes")]
    SignatureSize { expected: usize, actual: usize },
    /// Receivers applying the default [`crate::DecodeLimits`] would reject the message
    #[error("{what} of {length} bytes exceeds the limit of {limit} bytes")]
    ExcessiveLength {
        what: &'static str,
        length: usize,
        limit: usize,
    },
}

/// Outcome of [`SignService::sign`]
#[derive(Debug, Clone, PartialEq)]
pub enum SignConfirm {
    Success(SecuredMessage),
    Failure(SignError),
}

impl SignConfirm {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, SignConfirm::Success(_))
    }

    pub fn into_result(self) -> Result<SecuredMessage, SignError> {
        match self {
            SignConfirm::Success(message) => Ok(message),
            SignConfirm::Failure(error) => Err(error),
        }
    }
}

impl From<Result<SecuredMessage, SignError>> for SignConfirm {
    fn from(value: Result<SecuredMessage, SignError>) -> Self {
        match value {
            Ok(message) => SignConfirm::Success(message),
            Err(error) => SignConfirm::Failure(error),
        }
    }
}

pub trait SignService {
    /// Builds the secured message for `request`. A failed confirm never carries a partial message.
    fn sign(&mut self, request: SignRequest) -> SignConfirm;
}

/// Source of the station's own signing material
pub trait CertificateProvider {
    fn own_certificate(&self) -> Result<&Certificate, ProviderError>;

    fn own_private_key(&self) -> Result<&PrivateKey, ProviderError>;
}

/// Provider of a fixed certificate and key pair
#[derive(Debug, Clone)]
pub struct StaticCertificateProvider {
    certificate: Certificate,
    private_key: PrivateKey,
}

impl StaticCertificateProvider {
    #[must_use]
    pub fn new(certificate: Certificate, private_key: PrivateKey) -> Self {
        Self {
            certificate,
            private_key,
        }
    }
}

impl CertificateProvider for StaticCertificateProvider {
    fn own_certificate(&self) -> Result<&Certificate, ProviderError> {
        Ok(&self.certificate)
    }

    fn own_private_key(&self) -> Result<&PrivateKey, ProviderError> {
        Ok(&self.private_key)
    }
}

/// Decides which header fields accompany a signed message
pub trait SignHeaderPolicy {
    /// Decides the header fields for `request`, see [`SignHeaderPolicy::commit_header`]
    fn prepare_header(
        &mut self,
        request: &SignRequest,
        certificate: &Certificate,
    ) -> Result<Vec<HeaderField>, PolicyError>;

    /// Records that a message with `header_fields` has been signed and handed out.
    ///
    /// Only called for messages that were signed successfully.
    fn commit_header(&mut self, _header_fields: &[HeaderField]) {}

    /// Makes the next message carry the full certificate
    fn request_certificate(&mut self);

    /// Notes that a neighbour does not know the certificate identified by `id`
    fn request_unrecognized_certificate(&mut self, id: HashedId8);
}

/// Header policy for ETSI ITS stations
///
/// Fields are emitted in the order signer info, generation time, ITS-AID, followed by
/// encryption parameters and recipient info for encrypted requests. CA messages carry the
/// full certificate at most once per interval, or right after it has been requested, and
/// refer to it by digest otherwise. Messages of every other ITS-AID carry the full certificate.
pub struct DefaultSignHeaderPolicy<'a> {
    runtime: &'a dyn Runtime,
    certificate_interval: u64,
    last_certificate: Option<Time64>,
    certificate_requested: bool,
    unrecognized: Vec<HashedId8>,
}

impl<'a> DefaultSignHeaderPolicy<'a> {
    #[must_use]
    pub fn new(runtime: &'a dyn Runtime) -> Self {
        Self::with_interval(runtime, DEFAULT_CERTIFICATE_INTERVAL)
    }

    /// Policy repeating the full certificate in CA messages every `certificate_interval`
    /// microseconds
    #[must_use]
    pub fn with_interval(runtime: &'a dyn Runtime, certificate_interval: u64) -> Self {
        Self {
            runtime,
            certificate_interval,
            last_certificate: None,
            certificate_requested: false,
            unrecognized: Vec::new(),
        }
    }

    fn ca_signer_info(
        &self,
        now: Time64,
        certificate: &Certificate,
    ) -> Result<SignerInfo, PolicyError> {
        let digest = certificate.calculate_hash();
        let requested = self.certificate_requested
            || digest.is_some_and(|digest| self.unrecognized.contains(&digest));
        let due = match self.last_certificate {
            None => true,
            // a clock running backwards also triggers the certificate
            Some(last) => now < last || now - last >= self.certificate_interval,
        };
        if requested || due {
            trace!(now, requested, "Attaching full certificate to CA message");
            Ok(SignerInfo::Certificate(Box::new(certificate.clone())))
        } else {
            trace!(now, "Attaching certificate digest to CA message");
            digest
                .map(SignerInfo::CertificateDigestWithSha256)
                .ok_or(PolicyError::CertificateDigest)
        }
    }
}

impl SignHeaderPolicy for DefaultSignHeaderPolicy<'_> {
    fn prepare_header(
        &mut self,
        request: &SignRequest,
        certificate: &Certificate,
    ) -> Result<Vec<HeaderField>, PolicyError> {
        if !request.permissions.is_empty()
            && certificate.app_permissions(request.its_aid) != request.permissions.as_ref()
        {
            return Err(PolicyError::MissingPermission(request.its_aid));
        }
        let now = self.runtime.now();
        let signer_info = if request.its_aid == aid::CA {
            self.ca_signer_info(now, certificate)?
        } else {
            SignerInfo::Certificate(Box::new(certificate.clone()))
        };
        let mut fields = vec![
            HeaderField::SignerInfo(signer_info),
            HeaderField::GenerationTime(now),
            HeaderField::ItsAid(request.its_aid),
        ];
        fields.extend(encryption_fields(request));
        Ok(fields)
    }

    fn commit_header(&mut self, header_fields: &[HeaderField]) {
        let mut its_aid = None;
        let mut generation_time = None;
        let mut full_certificate = false;
        for field in header_fields {
            match field {
                HeaderField::ItsAid(id) => its_aid = Some(*id),
                HeaderField::GenerationTime(time) => generation_time = Some(*time),
                HeaderField::SignerInfo(signer) => {
                    full_certificate = matches!(signer, SignerInfo::Certificate(_));
                }
                _ => (),
            }
        }
        if its_aid != Some(aid::CA) {
            return;
        }
        self.unrecognized.clear();
        if full_certificate {
            self.last_certificate = generation_time.or_else(|| Some(self.runtime.now()));
            self.certificate_requested = false;
        }
    }

    fn request_certificate(&mut self) {
        self.certificate_requested = true;
    }

    fn request_unrecognized_certificate(&mut self, id: HashedId8) {
        if !self.unrecognized.contains(&id) {
            self.unrecognized.push(id);
        }
    }
}

fn encryption_fields(request: &SignRequest) -> impl Iterator<Item = HeaderField> + '_ {
    request.encryption.iter().flat_map(|encryption| {
        [
            HeaderField::EncryptionParameters(encryption.parameters),
            HeaderField::RecipientInfo(encryption.recipients.clone()),
        ]
    })
}

/// Refuses requests whose message would not decode under the default [`crate::DecodeLimits`]
fn check_limits(request: &SignRequest) -> Result<(), SignError> {
    let limits = DecodeLimits::default();
    let length = request.plain_message.len();
    if length > limits.payload_data {
        return Err(SignError::ExcessiveLength {
            what: "Payload",
            length,
            limit: limits.payload_data,
        });
    }
    let opaque_keys = request
        .encryption
        .iter()
        .flat_map(|encryption| &encryption.recipients)
        .filter_map(|recipient| match &recipient.enc_key {
            Key::Opaque(key) => Some(key.data.len()),
            Key::Ecies(_) => None,
        });
    for length in opaque_keys {
        if length > limits.opaque_key {
            return Err(SignError::ExcessiveLength {
                what: "Opaque recipient key",
                length,
                limit: limits.opaque_key,
            });
        }
    }
    Ok(())
}

fn unsigned_message(request: SignRequest, header_fields: Vec<HeaderField>) -> SecuredMessage {
    let payload_type = request.payload_type();
    let mut message = SecuredMessage::new(Payload::new(payload_type, request.plain_message));
    message.header_fields = header_fields;
    message
}

/// Sign service producing ECDSA signatures with the station's own certificate
pub struct StraightSignService<'a> {
    certificates: &'a dyn CertificateProvider,
    backend: &'a dyn Backend,
    policy: &'a mut dyn SignHeaderPolicy,
}

impl<'a> StraightSignService<'a> {
    pub fn new(
        certificates: &'a dyn CertificateProvider,
        backend: &'a dyn Backend,
        policy: &'a mut dyn SignHeaderPolicy,
    ) -> Self {
        Self {
            certificates,
            backend,
            policy,
        }
    }

    fn try_sign(&mut self, request: SignRequest) -> Result<SecuredMessage, SignError> {
        check_limits(&request)?;
        let certificate = self.certificates.own_certificate()?;
        let private_key = self.certificates.own_private_key()?;
        let header_fields = self.policy.prepare_header(&request, certificate)?;
        let mut message = unsigned_message(request, header_fields);

        // the signed bytes cover the trailer length, so the placeholder must match the final size
        let placeholder = EcdsaSignature::zero();
        message.set_signature(placeholder);
        let data = message.convert_for_signing()?;
        let signature = self.backend.sign_data(private_key, &data)?;
        let expected = placeholder.r.encoded_size();
        let actual = signature.r.encoded_size();
        if expected != actual {
            return Err(SignError::SignatureSize { expected, actual });
        }
        message.set_signature(signature);
        self.policy.commit_header(&message.header_fields);
        Ok(message)
    }
}

impl SignService for StraightSignService<'_> {
    fn sign(&mut self, request: SignRequest) -> SignConfirm {
        let its_aid = request.its_aid;
        let result = self.try_sign(request);
        match &result {
            Ok(message) => debug!(
                its_aid,
                payload_length = message.payload.data.len(),
                "Signed secured message"
            ),
            Err(e) => warn!(its_aid, error = %e, "Signing secured message failed"),
        }
        result.into()
    }
}

/// Sign service attaching an all-zero signature
///
/// Messages have the same structure as those of [`StraightSignService`] but are NOT
/// cryptographically valid. Receivers verifying signatures will reject them.
pub struct DummySignService<'a> {
    runtime: &'a dyn Runtime,
    signer_info: SignerInfo,
}

impl<'a> DummySignService<'a> {
    #[must_use]
    pub fn new(runtime: &'a dyn Runtime, signer_info: SignerInfo) -> Self {
        Self {
            runtime,
            signer_info,
        }
    }
}

impl SignService for DummySignService<'_> {
    fn sign(&mut self, request: SignRequest) -> SignConfirm {
        let its_aid = request.its_aid;
        if let Err(e) = check_limits(&request) {
            warn!(its_aid, error = %e, "Refusing to build dummy signed message");
            return SignConfirm::Failure(e);
        }
        let mut header_fields = vec![
            HeaderField::SignerInfo(self.signer_info.clone()),
            HeaderField::GenerationTime(self.runtime.now()),
            HeaderField::ItsAid(its_aid),
        ];
        header_fields.extend(encryption_fields(&request));
        let mut message = unsigned_message(request, header_fields);
        message.set_signature(EcdsaSignature::zero());
        debug!(its_aid, "Attached dummy signature to secured message");
        SignConfirm::Success(message)
    }
}

#[cfg(test)]
mod tests {
    use core::cell::RefCell;

    use super::*;
    use crate::runtime::ManualRuntime;
    use crate::{
        Decode, EccPoint, EciesEncryptedKey, OpaqueKey, PublicKey, SymmetricAlgorithm,
        ECIES_TAG_LENGTH, NONCE_LENGTH, OPAQUE_KEY_LENGTH_LIMIT, PAYLOAD_DATA_LENGTH_LIMIT,
    };

    const START: Time64 = 600_000_000_000_000;

    /// Backend returning a fixed signature and remembering what it signed
    #[derive(Default)]
    struct RecordingBackend {
        signed: RefCell<Vec<u8>>,
        uncompressed: bool,
    }

    impl Backend for RecordingBackend {
        fn sign_data(&self, _: &PrivateKey, data: &[u8]) -> Result<EcdsaSignature, BackendError> {
            *self.signed.borrow_mut() = data.to_vec();
            let r = if self.uncompressed {
                EccPoint::Uncompressed {
                    x: [1; 32],
                    y: [2; 32],
                }
            } else {
                EccPoint::XCoordinateOnly([1; 32])
            };
            Ok(EcdsaSignature { r, s: [3; 32] })
        }

        fn verify_data(&self, _: &PublicKey, _: &[u8], _: &EcdsaSignature) -> bool {
            false
        }
    }

    struct FailingBackend;

    impl Backend for FailingBackend {
        fn sign_data(&self, _: &PrivateKey, _: &[u8]) -> Result<EcdsaSignature, BackendError> {
            Err(BackendError::Signing("hardware token removed".into()))
        }

        fn verify_data(&self, _: &PublicKey, _: &[u8], _: &EcdsaSignature) -> bool {
            false
        }
    }

    struct EmptyProvider;

    impl CertificateProvider for EmptyProvider {
        fn own_certificate(&self) -> Result<&Certificate, ProviderError> {
            Err(ProviderError::MissingCertificate)
        }

        fn own_private_key(&self) -> Result<&PrivateKey, ProviderError> {
            Err(ProviderError::MissingPrivateKey)
        }
    }

    fn provider() -> StaticCertificateProvider {
        StaticCertificateProvider::new(Certificate::fake(), PrivateKey([0x11; 32]))
    }

    fn encryption() -> EncryptionRequest {
        EncryptionRequest {
            parameters: EncryptionParameters {
                symmetric_algorithm: SymmetricAlgorithm::Aes128Ccm,
                nonce: [0x0c; NONCE_LENGTH],
            },
            recipients: vec![
                RecipientInfo {
                    cert_id: HashedId8([0xa1; 8]),
                    enc_key: Key::Ecies(EciesEncryptedKey {
                        v: EccPoint::CompressedLsbY0([0xa2; 32]),
                        c: vec![0xa3; 16],
                        t: [0xa4; ECIES_TAG_LENGTH],
                    }),
                },
                RecipientInfo {
                    cert_id: HashedId8([0xb1; 8]),
                    enc_key: Key::Opaque(OpaqueKey {
                        data: vec![0xb2; 5],
                    }),
                },
            ],
        }
    }

    fn signer_of(message: &SecuredMessage) -> &SignerInfo {
        message.signer_info().unwrap()
    }

    fn ca_signer(
        policy: &mut DefaultSignHeaderPolicy<'_>,
        request: &SignRequest,
        certificate: &Certificate,
    ) -> SignerInfo {
        let mut fields = policy.prepare_header(request, certificate).unwrap();
        policy.commit_header(&fields);
        match fields.remove(0) {
            HeaderField::SignerInfo(signer) => signer,
            field => panic!("unexpected first header field {field:?}"),
        }
    }

    #[test]
    fn signs_over_signing_view() {
        let runtime = ManualRuntime::new(START);
        let provider = provider();
        let backend = RecordingBackend::default();
        let mut policy = DefaultSignHeaderPolicy::new(&runtime);
        let mut service = StraightSignService::new(&provider, &backend, &mut policy);

        let message = service
            .sign(SignRequest::new(aid::DEN, vec![0xde, 0xad]))
            .into_result()
            .unwrap();
        assert_eq!(message.payload, Payload::new(PayloadType::Signed, vec![0xde, 0xad]));
        assert_eq!(message.generation_time(), Some(START));
        assert_eq!(message.its_aid(), Some(aid::DEN));
        assert_eq!(
            signer_of(&message),
            &SignerInfo::Certificate(Box::new(Certificate::fake()))
        );
        assert_eq!(
            message.signature(),
            Some(&EcdsaSignature {
                r: EccPoint::XCoordinateOnly([1; 32]),
                s: [3; 32],
            })
        );
        assert_eq!(*backend.signed.borrow(), message.convert_for_signing().unwrap());
    }

    #[test]
    fn orders_header_fields() {
        let runtime = ManualRuntime::new(START);
        let mut policy = DefaultSignHeaderPolicy::new(&runtime);
        let request = SignRequest::new(aid::DEN, vec![1]).with_encryption(encryption());
        let fields = policy
            .prepare_header(&request, &Certificate::fake())
            .unwrap();
        let types: Vec<u8> = fields.iter().map(HeaderField::field_type).collect();
        assert_eq!(types, [128, 0, 5, 129, 130]);
    }

    #[test]
    fn repeats_certificate_in_ca_messages_per_interval() {
        let runtime = ManualRuntime::new(START);
        let certificate = Certificate::fake();
        let digest =
            SignerInfo::CertificateDigestWithSha256(certificate.calculate_hash().unwrap());
        let full = SignerInfo::Certificate(Box::new(certificate.clone()));
        let mut policy = DefaultSignHeaderPolicy::new(&runtime);
        let request = SignRequest::new(aid::CA, vec![0xca]);
        let signer =
            |policy: &mut DefaultSignHeaderPolicy| ca_signer(policy, &request, &certificate);

        assert_eq!(signer(&mut policy), full);
        runtime.trigger(100_000);
        assert_eq!(signer(&mut policy), digest);
        runtime.trigger(899_999);
        assert_eq!(signer(&mut policy), digest);
        runtime.trigger(1);
        assert_eq!(signer(&mut policy), full);

        policy.request_certificate();
        assert_eq!(signer(&mut policy), full);
        assert_eq!(signer(&mut policy), digest);

        policy.request_unrecognized_certificate(HashedId8([0xff; 8]));
        assert_eq!(signer(&mut policy), digest);
        policy.request_unrecognized_certificate(certificate.calculate_hash().unwrap());
        assert_eq!(signer(&mut policy), full);
    }

    #[test]
    fn keeps_certificate_due_after_failed_signing() {
        let runtime = ManualRuntime::new(START);
        let provider = provider();
        let mut policy = DefaultSignHeaderPolicy::new(&runtime);
        let request = SignRequest::new(aid::CA, vec![0xca]);

        let mut failing = StraightSignService::new(&provider, &FailingBackend, &mut policy);
        assert!(!failing.sign(request.clone()).is_success());

        runtime.trigger(10);
        let backend = RecordingBackend::default();
        let mut working = StraightSignService::new(&provider, &backend, &mut policy);
        let first = working.sign(request.clone()).into_result().unwrap();
        assert!(matches!(signer_of(&first), SignerInfo::Certificate(_)));

        runtime.trigger(10);
        let second = working.sign(request).into_result().unwrap();
        assert!(matches!(
            signer_of(&second),
            SignerInfo::CertificateDigestWithSha256(_)
        ));
    }

    #[test]
    fn keeps_certificate_request_until_signed() {
        let runtime = ManualRuntime::new(START);
        let certificate = Certificate::fake();
        let request = SignRequest::new(aid::CA, vec![0xca]);
        let mut policy = DefaultSignHeaderPolicy::new(&runtime);
        assert!(matches!(
            ca_signer(&mut policy, &request, &certificate),
            SignerInfo::Certificate(_)
        ));

        policy.request_unrecognized_certificate(certificate.calculate_hash().unwrap());
        runtime.trigger(10);
        // a header that was prepared but never signed does not consume the request
        policy.prepare_header(&request, &certificate).unwrap();
        assert!(matches!(
            ca_signer(&mut policy, &request, &certificate),
            SignerInfo::Certificate(_)
        ));
    }

    #[test]
    fn refuses_messages_beyond_decode_limits() {
        let runtime = ManualRuntime::new(START);
        let provider = provider();
        let backend = RecordingBackend::default();
        let mut policy = DefaultSignHeaderPolicy::new(&runtime);
        let mut straight = StraightSignService::new(&provider, &backend, &mut policy);
        let mut dummy = DummySignService::new(&runtime, SignerInfo::SelfSigned);

        let oversized_payload = SignRequest::new(aid::DEN, vec![0; PAYLOAD_DATA_LENGTH_LIMIT + 1]);
        let mut oversized_key = encryption();
        oversized_key.recipients.push(RecipientInfo {
            cert_id: HashedId8([0xc1; 8]),
            enc_key: Key::Opaque(OpaqueKey {
                data: vec![0xc2; OPAQUE_KEY_LENGTH_LIMIT + 1],
            }),
        });
        let oversized_key = SignRequest::new(aid::DEN, vec![0x01]).with_encryption(oversized_key);

        for service in [&mut straight as &mut dyn SignService, &mut dummy] {
            assert_eq!(
                service.sign(oversized_payload.clone()).into_result(),
                Err(SignError::ExcessiveLength {
                    what: "Payload",
                    length: 4097,
                    limit: 4096
                })
            );
            assert_eq!(
                service.sign(oversized_key.clone()).into_result(),
                Err(SignError::ExcessiveLength {
                    what: "Opaque recipient key",
                    length: 513,
                    limit: 512
                })
            );

            let at_limit = SignRequest::new(aid::DEN, vec![0; PAYLOAD_DATA_LENGTH_LIMIT]);
            let encoded = service.sign(at_limit).into_result().unwrap().serialize().unwrap();
            assert!(SecuredMessage::decode(&encoded[..]).is_ok());
        }
        assert!(backend.signed.borrow().len() > PAYLOAD_DATA_LENGTH_LIMIT);
    }

    #[test]
    fn attaches_full_certificate_for_other_aids() {
        let runtime = ManualRuntime::new(START);
        let mut policy = DefaultSignHeaderPolicy::with_interval(&runtime, u64::MAX);
        let certificate = Certificate::fake();
        for _ in 0..3 {
            let fields = policy
                .prepare_header(&SignRequest::new(aid::IVI, vec![]), &certificate)
                .unwrap();
            assert_eq!(
                fields[0],
                HeaderField::SignerInfo(SignerInfo::Certificate(Box::new(certificate.clone())))
            );
        }
    }

    #[test]
    fn checks_requested_permissions() {
        let runtime = ManualRuntime::new(START);
        let mut policy = DefaultSignHeaderPolicy::new(&runtime);
        let mut certificate = Certificate::fake();
        certificate.add_permission(aid::DEN, vec![0x01, 0xff, 0xfc]);

        let granted = SignRequest::new(aid::DEN, vec![]).with_permissions(vec![0x01, 0xff, 0xfc]);
        assert!(policy.prepare_header(&granted, &certificate).is_ok());

        let denied = SignRequest::new(aid::DEN, vec![]).with_permissions(vec![0x01, 0x00, 0x00]);
        assert_eq!(
            policy.prepare_header(&denied, &certificate),
            Err(PolicyError::MissingPermission(aid::DEN))
        );
    }

    #[test]
    fn propagates_collaborator_failures() {
        let runtime = ManualRuntime::new(START);
        let mut policy = DefaultSignHeaderPolicy::new(&runtime);
        let request = SignRequest::new(aid::DEN, vec![0x01]);

        let backend = RecordingBackend::default();
        let mut service = StraightSignService::new(&EmptyProvider, &backend, &mut policy);
        assert_eq!(
            service.sign(request.clone()),
            SignConfirm::Failure(SignError::Provider(ProviderError::MissingCertificate))
        );

        let provider = provider();
        let mut service = StraightSignService::new(&provider, &FailingBackend, &mut policy);
        assert!(matches!(
            service.sign(request.clone()).into_result(),
            Err(SignError::Backend(BackendError::Signing(_)))
        ));

        let backend = RecordingBackend {
            uncompressed: true,
            ..RecordingBackend::default()
        };
        let mut service = StraightSignService::new(&provider, &backend, &mut policy);
        assert_eq!(
            service.sign(request).into_result(),
            Err(SignError::SignatureSize {
                expected: 33,
                actual: 65
            })
        );
    }

    #[test]
    fn dummy_signs_with_zero_signature() {
        let runtime = ManualRuntime::new(START);
        let signer_info = SignerInfo::CertificateDigestWithSha256(HashedId8([9; 8]));
        let mut service = DummySignService::new(&runtime, signer_info.clone());
        runtime.trigger(42);

        let message = service
            .sign(SignRequest::new(aid::CA, vec![0xca, 0xfe]))
            .into_result()
            .unwrap();
        assert_eq!(signer_of(&message), &signer_info);
        assert_eq!(message.generation_time(), Some(START + 42));
        assert_eq!(message.signature(), Some(&EcdsaSignature::zero()));
        assert_eq!(message.payload.payload_type(), PayloadType::Signed);
    }

    #[test]
    fn both_services_produce_decodable_messages() {
        let runtime = ManualRuntime::new(START);
        let provider = provider();
        let backend = RecordingBackend::default();
        let mut policy = DefaultSignHeaderPolicy::new(&runtime);
        let mut straight = StraightSignService::new(&provider, &backend, &mut policy);
        let mut dummy = DummySignService::new(
            &runtime,
            SignerInfo::Certificate(Box::new(Certificate::fake())),
        );

        let request = SignRequest::new(aid::DEN, vec![0x5a; 300]).with_encryption(encryption());
        for confirm in [straight.sign(request.clone()), dummy.sign(request.clone())] {
            let message = confirm.into_result().unwrap();
            let encoded = message.serialize().unwrap();
            let decoded = SecuredMessage::decode(&encoded[..]).unwrap();
            assert_eq!(decoded.bytes_consumed, encoded.len());
            assert_eq!(decoded.decoded, message);
            assert_eq!(
                decoded.decoded.payload.payload_type(),
                PayloadType::SignedAndEncrypted
            );
            assert_eq!(decoded.decoded.recipients(), &encryption().recipients[..]);
        }
    }

    #[cfg(feature = "crypto")]
    #[test]
    fn only_straight_signatures_verify() {
        use crate::backend::P256Backend;
        use crate::{
            verify_message, EccP256CurvePoint, KeyCompression, PublicVerificationKey,
            ValidationResult, VerificationKeyIndicator,
        };

        let private_key = PrivateKey([0x2a; 32]);
        let public_key = P256Backend.public_key(&private_key).unwrap();
        let x: [u8; 32] = public_key.x.as_slice().try_into().unwrap();
        let point = match public_key.compression {
            KeyCompression::Y1 => EccP256CurvePoint::CompressedY1(x),
            _ => EccP256CurvePoint::CompressedY0(x),
        };
        let mut certificate = Certificate::fake();
        certificate.to_be_signed.verify_key_indicator =
            VerificationKeyIndicator::VerificationKey(PublicVerificationKey::EcdsaNistP256(point));

        let runtime = ManualRuntime::new(START);
        let provider = StaticCertificateProvider::new(certificate.clone(), private_key);
        let mut policy = DefaultSignHeaderPolicy::new(&runtime);
        let mut straight = StraightSignService::new(&provider, &P256Backend, &mut policy);
        let mut dummy = DummySignService::new(
            &runtime,
            SignerInfo::CertificateDigestWithSha256(certificate.calculate_hash().unwrap()),
        );

        let request = SignRequest::new(aid::CA, vec![0x02, 0x02, 0x00, 0x01]);
        let signed = straight.sign(request.clone()).into_result().unwrap();
        assert_eq!(
            verify_message(&P256Backend, &signed, &certificate),
            Ok(ValidationResult::Success)
        );
        let faked = dummy.sign(request).into_result().unwrap();
        assert!(matches!(
            verify_message(&P256Backend, &faked, &certificate),
            Ok(ValidationResult::Failure { .. })
        ));
    }
}
