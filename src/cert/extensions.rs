use const_oid::AssociatedOid;
use der::{Decode, oid::ObjectIdentifier};
use x509_cert::ext::pkix::name::GeneralName;

use crate::error::CertError;

pub use der::flagset::FlagSet;
use x509_cert::ext::pkix::KeyUsage as X509KeyUsage;
pub use x509_cert::ext::pkix::KeyUsages;

/// Trait for decoding X.509 extension values into typed views.
///
/// Each implementor names its extension OID and knows how to decode the
/// DER-encoded extension value. Encoding is not part of this subsystem;
/// certificates are obtained already issued.
pub trait FromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CertError>
    where
        Self: Sized;
}

/// Represents the Subject Alternative Name (SAN) extension.
///
/// Only dNSName entries participate in hostname validation; other general
/// name forms are skipped rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectAltName {
    pub dns_names: Vec<String>,
}

impl FromX509Extension for SubjectAltName {
    const OID: ObjectIdentifier = <x509_cert::ext::pkix::SubjectAltName as AssociatedOid>::OID;

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CertError> {
        let san = x509_cert::ext::pkix::SubjectAltName::from_der(extension)?;
        let dns_names = san
            .0
            .iter()
            .filter_map(|name| match name {
                GeneralName::DnsName(dns) => Some(dns.to_string()),
                _ => None,
            })
            .collect();
        Ok(Self { dns_names })
    }
}

/// Represents the Basic Constraints extension.
///
/// # Fields
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `max_path_length` - The maximum number of intermediate CAs allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct BasicConstraints {
    #[serde(rename = "CA")]
    pub is_ca: bool,
    #[serde(rename = "pathLen", skip_serializing_if = "Option::is_none")]
    pub max_path_length: Option<u32>,
}

impl FromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = <x509_cert::ext::pkix::BasicConstraints as AssociatedOid>::OID;

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self, CertError> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(der_bytes)?;
        Ok(Self {
            is_ca: bc.ca,
            max_path_length: bc.path_len_constraint.map(|v| v as u32),
        })
    }
}

/// Represents the Key Usage extension as a set of named bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl serde::Serialize for KeyUsage {
    /// Serializes as the list of canonical bit names.
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.names())
    }
}

impl KeyUsage {
    pub fn contains(&self, usage: KeyUsages) -> bool {
        self.0.contains(usage)
    }

    /// The canonical names of the set bits, in bit order.
    pub fn names(&self) -> Vec<&'static str> {
        ALL_KEY_USAGES
            .iter()
            .filter(|(bit, _)| self.0.contains(*bit))
            .map(|(_, name)| *name)
            .collect()
    }
}

const ALL_KEY_USAGES: [(KeyUsages, &str); 9] = [
    (KeyUsages::DigitalSignature, "digitalSignature"),
    (KeyUsages::NonRepudiation, "nonRepudiation"),
    (KeyUsages::KeyEncipherment, "keyEncipherment"),
    (KeyUsages::DataEncipherment, "dataEncipherment"),
    (KeyUsages::KeyAgreement, "keyAgreement"),
    (KeyUsages::KeyCertSign, "certSigning"),
    (KeyUsages::CRLSign, "crlSigning"),
    (KeyUsages::EncipherOnly, "encipherOnly"),
    (KeyUsages::DecipherOnly, "decipherOnly"),
];

impl FromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <X509KeyUsage as AssociatedOid>::OID;

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CertError> {
        let ku = X509KeyUsage::from_der(extension)?;
        Ok(Self(ku.0))
    }
}

/// The extended-key-usage purpose name for TLS server authentication.
pub const EKU_SERVER_AUTH: &str = "serverAuth";

/// Represents the Extended Key Usage extension as named purposes.
///
/// Well-known purposes decode to their short names; anything else is kept
/// as dotted OID text rather than rejected, since root bundles in the wild
/// carry vendor purposes.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct ExtendedKeyUsage {
    pub purposes: Vec<String>,
}

impl ExtendedKeyUsage {
    pub fn contains(&self, purpose: &str) -> bool {
        self.purposes.iter().any(|p| p == purpose)
    }
}

fn eku_purpose_name(oid: &ObjectIdentifier) -> String {
    match *oid {
        const_oid::db::rfc5912::ID_KP_SERVER_AUTH => EKU_SERVER_AUTH.to_string(),
        const_oid::db::rfc5912::ID_KP_CLIENT_AUTH => "clientAuth".to_string(),
        const_oid::db::rfc5912::ID_KP_CODE_SIGNING => "codeSigning".to_string(),
        const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION => "emailProtection".to_string(),
        const_oid::db::rfc5912::ID_KP_TIME_STAMPING => "timeStamping".to_string(),
        const_oid::db::rfc5912::ID_KP_OCSP_SIGNING => "OCSPSigning".to_string(),
        _ => oid.to_string(),
    }
}

impl FromX509Extension for ExtendedKeyUsage {
    const OID: ObjectIdentifier = <x509_cert::ext::pkix::ExtendedKeyUsage as AssociatedOid>::OID;

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CertError> {
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage::from_der(extension)?;
        let purposes = eku.0.iter().map(eku_purpose_name).collect();
        Ok(Self { purposes })
    }
}

/// Represents the Subject Key Identifier (SKI) extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectKeyIdentifier {
    pub key_identifier: Vec<u8>,
}

impl FromX509Extension for SubjectKeyIdentifier {
    const OID: ObjectIdentifier = <x509_cert::ext::pkix::SubjectKeyIdentifier as AssociatedOid>::OID;

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CertError> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(extension)?;
        Ok(Self {
            key_identifier: ski.0.as_bytes().to_vec(),
        })
    }
}

/// Represents the Authority Key Identifier (AKI) extension.
///
/// Identifies the issuer's public key, optionally with an issuer-name and
/// serial-number back-reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorityKeyIdentifier {
    pub key_identifier: Option<Vec<u8>>,
    pub authority_cert_issuer: Option<String>,
    pub authority_cert_serial_number: Option<Vec<u8>>,
}

impl FromX509Extension for AuthorityKeyIdentifier {
    const OID: ObjectIdentifier =
        <x509_cert::ext::pkix::AuthorityKeyIdentifier as AssociatedOid>::OID;

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CertError> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier::from_der(extension)?;

        let authority_cert_issuer = aki.authority_cert_issuer.as_ref().and_then(|names| {
            names.iter().find_map(|name| match name {
                GeneralName::DirectoryName(dn) => Some(dn.to_string()),
                _ => None,
            })
        });

        Ok(Self {
            key_identifier: aki.key_identifier.map(|id| id.as_bytes().to_vec()),
            authority_cert_issuer,
            authority_cert_serial_number: aki
                .authority_cert_serial_number
                .map(|sn| sn.as_bytes().to_vec()),
        })
    }
}
