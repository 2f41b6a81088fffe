pub mod attributes;
pub mod extensions;

use der::{Decode, Encode};
use x509_cert::certificate::CertificateInner;

use crate::error::CertError;
use crate::pem_utils;
use attributes::CertAttributes;

/// Represents one X.509 certificate.
///
/// A `Certificate` is an immutable value: it owns the exact DER bytes it was
/// parsed from, the parsed structure, and the structured attribute record
/// computed at construction time. Certificates are pulled out of stores or
/// created through [`crate::handler::CertHandler`] factory calls, and are
/// shared read-only behind `Arc` once constructed.
#[derive(Debug, Clone)]
pub struct Certificate {
    der: Vec<u8>,
    inner: CertificateInner,
    attributes: CertAttributes,
}

impl Certificate {
    /// Parses a certificate from a PEM-armored string.
    ///
    /// The encoding must include the `-----BEGIN CERTIFICATE-----` and end
    /// certificate markers.
    pub fn from_pem(pem_cert: &str) -> Result<Self, CertError> {
        let der = pem_utils::pem_to_der(pem_cert)?;
        Self::from_der(der)
    }

    /// Parses a certificate from raw DER bytes.
    ///
    /// Fails with [`CertError::InvalidCertificate`] if the bytes are not a
    /// well-formed certificate structure; attribute extraction happens here,
    /// once, so attribute access on a constructed certificate never fails.
    pub fn from_der(der: Vec<u8>) -> Result<Self, CertError> {
        let inner = CertificateInner::from_der(&der).map_err(|e| CertError::InvalidCertificate {
            attributes: None,
            reason: e.to_string(),
        })?;
        let attributes = attributes::extract(&inner, &der)?;
        Ok(Self {
            der,
            inner,
            attributes,
        })
    }

    /// Wraps an already-parsed certificate structure.
    pub fn from_x509(inner: CertificateInner) -> Result<Self, CertError> {
        let der = inner
            .to_der()
            .map_err(|e| CertError::EncodingError(e.to_string()))?;
        let attributes = attributes::extract(&inner, &der)?;
        Ok(Self {
            der,
            inner,
            attributes,
        })
    }

    /// Returns the PEM encoding, armoring the stored DER bytes.
    pub fn to_pem(&self) -> String {
        pem_utils::der_to_pem(&self.der, pem_utils::CERTIFICATE_LABEL)
    }

    /// Returns the DER encoding — the exact bytes this certificate was
    /// constructed from.
    pub fn to_der(&self) -> &[u8] {
        &self.der
    }

    /// Returns the structured attribute record. Total and pure.
    pub fn attributes(&self) -> &CertAttributes {
        &self.attributes
    }

    /// The hex SHA-1 digest of the DER encoding, used as the identity key
    /// for store deduplication and the trust cache.
    pub fn sha1_hex(&self) -> &str {
        &self.attributes.sha1_digest
    }

    /// Exposes the parsed `x509-cert` structure for interop with the
    /// cryptographic layer. Not part of the portable contract.
    pub fn as_x509(&self) -> &CertificateInner {
        &self.inner
    }

    /// DER encoding of the to-be-signed portion, as covered by the
    /// certificate signature.
    pub(crate) fn tbs_der(&self) -> Result<Vec<u8>, CertError> {
        self.inner
            .tbs_certificate
            .to_der()
            .map_err(|e| CertError::EncodingError(e.to_string()))
    }

    pub(crate) fn subject(&self) -> &x509_cert::name::Name {
        &self.inner.tbs_certificate.subject
    }

    pub(crate) fn issuer(&self) -> &x509_cert::name::Name {
        &self.inner.tbs_certificate.issuer
    }

    /// Raw signature bytes from the certificate.
    pub(crate) fn signature_bytes(&self) -> Option<&[u8]> {
        self.inner.signature.as_bytes()
    }

    pub(crate) fn signature_algorithm(&self) -> &x509_cert::spki::AlgorithmIdentifierOwned {
        &self.inner.signature_algorithm
    }

    pub(crate) fn public_key_info(&self) -> &x509_cert::spki::SubjectPublicKeyInfoOwned {
        &self.inner.tbs_certificate.subject_public_key_info
    }
}

impl PartialEq for Certificate {
    /// Certificates are equal when their DER encodings are equal.
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}
