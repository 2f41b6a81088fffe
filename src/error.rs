use thiserror::Error;

use crate::cert::attributes::CertAttributes;

/// Represents errors raised while parsing or encoding certificates.
///
/// Parse-time failures are always surfaced, never silently defaulted: a
/// `Certificate` that constructs successfully offers total attribute access
/// afterwards.
#[derive(Debug, Error, Clone)]
pub enum CertError {
    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// The input could not be parsed into a well-formed certificate.
    ///
    /// Carries whatever partial attributes were recoverable before the
    /// parse failed, for diagnostics.
    #[error("Invalid certificate: {reason}")]
    InvalidCertificate {
        attributes: Option<Box<CertAttributes>>,
        reason: String,
    },
}

impl From<der::Error> for CertError {
    /// Converts a `der::Error` into a `CertError`.
    fn from(err: der::Error) -> Self {
        CertError::DecodingError(err.to_string())
    }
}

impl From<pem::PemError> for CertError {
    fn from(err: pem::PemError) -> Self {
        CertError::DecodingError(err.to_string())
    }
}

/// Represents chain-validation failures, one variant per policy.
///
/// `CertificateStore::validate` surfaces the first violation found in its
/// fixed scan order and never recovers internally. Every variant carries the
/// offending certificate's attribute record, never a raw parser handle.
#[derive(Debug, Error, Clone)]
pub enum ValidationError {
    /// A chain link's signature does not verify, or the link's
    /// issuer/subject names and key identifiers could not be matched.
    #[error("Certificate signature could not be verified against its issuer")]
    InvalidSignature { cert: Box<CertAttributes> },

    /// A certificate in the chain is outside its validity window.
    #[error("Certificate is outside its validity window at {checked_at}")]
    Expired {
        cert: Box<CertAttributes>,
        checked_at: time::OffsetDateTime,
    },

    /// No trusted anchor was found for the chain.
    #[error("Certificate chain does not terminate at a trusted root")]
    Untrusted { cert: Box<CertAttributes> },

    /// The leaf certificate's names do not match the requested hostname.
    #[error("Certificate is not valid for hostname '{hostname}'")]
    HostnameMismatch {
        cert: Box<CertAttributes>,
        hostname: String,
    },

    /// A key-usage or extended-key-usage extension forbids the
    /// certificate's role in the chain.
    #[error("Certificate key usage does not permit its role in the chain")]
    KeyUsage { cert: Box<CertAttributes> },

    /// A non-leaf certificate is not a CA, or violates a path-length
    /// constraint above it.
    #[error("Certificate basic constraints forbid its position in the chain")]
    BasicConstraints { cert: Box<CertAttributes> },
}

impl ValidationError {
    /// The attribute record of the certificate the validation failed on.
    pub fn cert_attributes(&self) -> &CertAttributes {
        match self {
            ValidationError::InvalidSignature { cert }
            | ValidationError::Expired { cert, .. }
            | ValidationError::Untrusted { cert }
            | ValidationError::HostnameMismatch { cert, .. }
            | ValidationError::KeyUsage { cert }
            | ValidationError::BasicConstraints { cert } => cert,
        }
    }
}
