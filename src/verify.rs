use alloc::{format, string::String};

use tracing::debug;

use crate::backend::Backend;
use crate::{Certificate, EncodeError, PayloadType, SecuredMessage, SignerInfo};

/// Outcome of a completed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Success,
    Failure { reason: String },
    NotApplicable { info: &'static str },
}

/// Validation could not be carried out
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unsupported: {0}")]
    Unsupported(String),
    #[error("Error re-encoding signed data: {0}")]
    ReencodingError(String),
}

impl From<EncodeError> for ValidationError {
    fn from(value: EncodeError) -> Self {
        ValidationError::ReencodingError(value.message())
    }
}

/// Checks the signature of `message` against the verification key of `certificate`.
///
/// The signer info of `message` has to refer to `certificate`, either by digest or
/// by carrying it.
/// #### Returns
/// - `Ok(ValidationResult::Success)` if the signature matches
/// - `Ok(ValidationResult::Failure { reason })` if the signer or the signature does not match
/// - `Ok(ValidationResult::NotApplicable { info })` if `message` is not signed
/// - `Err(ValidationError)` if the check could not be run
pub fn verify_message(
    backend: &dyn Backend,
    message: &SecuredMessage,
    certificate: &Certificate,
) -> Result<ValidationResult, ValidationError> {
    let Some(signature) = message.signature() else {
        return Ok(ValidationResult::NotApplicable {
            info: "Secured messages without signature are not validated.",
        });
    };
    if matches!(
        message.payload.payload_type,
        PayloadType::Unsecured | PayloadType::Encrypted
    ) {
        return Err(ValidationError::InvalidInput(format!(
            "Signature attached to payload of type {:?}",
            message.payload.payload_type
        )));
    }

    match message.signer_info() {
        None => {
            return Ok(ValidationResult::Failure {
                reason: "Signer info must be present!".into(),
            })
        }
        Some(SignerInfo::SelfSigned) => {
            return Ok(ValidationResult::Failure {
                reason: "Signer info must be of type digest or certificate!".into(),
            })
        }
        Some(SignerInfo::CertificateDigestWithSha256(digest)) => {
            let hash = certificate.calculate_hash().ok_or_else(|| {
                ValidationError::Unsupported("Certificate digest cannot be calculated".into())
            })?;
            if hash != *digest {
                return Ok(ValidationResult::Failure {
                    reason: format!(
                        "Signer digest {digest:?} does not identify certificate {hash:?}"
                    ),
                });
            }
        }
        Some(SignerInfo::Certificate(attached)) => {
            if **attached != *certificate {
                return Ok(ValidationResult::Failure {
                    reason: "Attached certificate differs from the signer's certificate.".into(),
                });
            }
        }
    }

    let public_key = certificate.public_key().ok_or_else(|| {
        ValidationError::Unsupported("Certificate carries no usable verification key".into())
    })?;
    let data = message.convert_for_signing()?;
    if backend.verify_data(&public_key, &data, signature) {
        Ok(ValidationResult::Success)
    } else {
        debug!(key_type = ?public_key.key_type, "Signature verification failed");
        Ok(ValidationResult::Failure {
            reason: "Signature does not match the signer's verification key.".into(),
        })
    }
}
