use std::collections::BTreeMap;

use serde::Serialize;
use sha1::{Digest, Sha1};
use time::OffsetDateTime;
use x509_cert::certificate::CertificateInner;

use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, FromX509Extension, KeyUsage,
    SubjectAltName, SubjectKeyIdentifier,
};
use crate::error::CertError;

/// A distinguished name broken into its components, keyed by the canonical
/// component names (`commonName`, `organizationName`, ...). Components with
/// unrecognized attribute types are keyed by their dotted OID.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NameAttributes {
    pub components: BTreeMap<String, String>,
}

impl NameAttributes {
    /// The `commonName` component, if present.
    pub fn common_name(&self) -> Option<&str> {
        self.components.get("commonName").map(String::as_str)
    }
}

/// The authority-key-identifier back-reference, in textual form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AkiAttributes {
    #[serde(
        rename = "authorityKeyIdentifierId",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(
        rename = "authorityKeyIdentifierName",
        skip_serializing_if = "Option::is_none"
    )]
    pub issuer_name: Option<String>,
    #[serde(
        rename = "authorityKeyIdentifierSerial",
        skip_serializing_if = "Option::is_none"
    )]
    pub serial: Option<String>,
}

/// The structured attribute record of one certificate.
///
/// Computed once when the certificate is constructed; access afterwards is
/// total and pure. Serializes to a map with the canonical field names, for
/// logging, UI display, or test assertions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertAttributes {
    pub subject_name: NameAttributes,
    pub subject_name_string: String,
    pub issuer_name: NameAttributes,
    pub issuer_name_string: String,
    /// Serial number in hexadecimal text form.
    pub serial_number: String,
    #[serde(with = "time::serde::rfc3339")]
    pub valid_from: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub valid_to: OffsetDateTime,
    /// SHA-1 digest of the DER encoding, hex. Also the store/dedup key.
    pub sha1_digest: String,
    /// MD5 digest of the DER encoding, hex. Legacy display only.
    pub md5_digest: String,
    #[serde(rename = "subjectAltName", skip_serializing_if = "Vec::is_empty")]
    pub subject_alt_names: Vec<String>,
    #[serde(rename = "basicConstraints", skip_serializing_if = "Option::is_none")]
    pub basic_constraints: Option<BasicConstraints>,
    #[serde(rename = "keyUsage", skip_serializing_if = "Option::is_none")]
    pub key_usage: Option<KeyUsage>,
    #[serde(rename = "extendedKeyUsage", skip_serializing_if = "Option::is_none")]
    pub extended_key_usage: Option<ExtendedKeyUsage>,
    #[serde(
        rename = "subjectKeyIdentifier",
        skip_serializing_if = "Option::is_none"
    )]
    pub subject_key_identifier: Option<String>,
    #[serde(
        rename = "authorityKeyIdentifier",
        skip_serializing_if = "Option::is_none"
    )]
    pub authority_key_identifier: Option<AkiAttributes>,
}

impl CertAttributes {
    /// The record as a generic JSON map, field names as in the serialized
    /// form.
    pub fn to_record(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// A record with no content, reported when a failure has no
    /// certificate to attach (an empty chain).
    pub(crate) fn absent() -> Self {
        CertAttributes {
            subject_name: NameAttributes::default(),
            subject_name_string: String::new(),
            issuer_name: NameAttributes::default(),
            issuer_name_string: String::new(),
            serial_number: String::new(),
            valid_from: OffsetDateTime::UNIX_EPOCH,
            valid_to: OffsetDateTime::UNIX_EPOCH,
            sha1_digest: String::new(),
            md5_digest: String::new(),
            subject_alt_names: Vec::new(),
            basic_constraints: None,
            key_usage: None,
            extended_key_usage: None,
            subject_key_identifier: None,
            authority_key_identifier: None,
        }
    }

    /// Raw authority-key-identifier bytes, decoded back from the hex form.
    pub(crate) fn authority_key_id_bytes(&self) -> Option<Vec<u8>> {
        self.authority_key_identifier
            .as_ref()
            .and_then(|aki| aki.id.as_ref())
            .and_then(|id| hex::decode(id).ok())
    }

    /// Raw subject-key-identifier bytes, decoded back from the hex form.
    pub(crate) fn subject_key_id_bytes(&self) -> Option<Vec<u8>> {
        self.subject_key_identifier
            .as_ref()
            .and_then(|id| hex::decode(id).ok())
    }
}

fn component_name(oid: &str) -> &str {
    match oid {
        "2.5.4.3" => "commonName",
        "2.5.4.6" => "countryName",
        "2.5.4.7" => "localityName",
        "2.5.4.8" => "stateOrProvinceName",
        "2.5.4.10" => "organizationName",
        "2.5.4.11" => "organizationalUnitName",
        other => other,
    }
}

fn rdn_value_string(value: &der::Any) -> Option<String> {
    if let Ok(s) = value.decode_as::<String>() {
        return Some(s);
    }
    if let Ok(s) = value.decode_as::<der::asn1::PrintableStringRef>() {
        return Some(s.to_string());
    }
    if let Ok(s) = value.decode_as::<der::asn1::Ia5StringRef>() {
        return Some(s.to_string());
    }
    None
}

fn name_attributes(name: &x509_cert::name::Name) -> NameAttributes {
    let mut components = BTreeMap::new();
    for rdn in name.0.iter() {
        for attr in rdn.0.iter() {
            if let Some(value) = rdn_value_string(&attr.value) {
                components.insert(component_name(&attr.oid.to_string()).to_string(), value);
            }
        }
    }
    NameAttributes { components }
}

fn validity_time(t: &x509_cert::time::Time) -> OffsetDateTime {
    match t {
        x509_cert::time::Time::UtcTime(ut) => OffsetDateTime::from(ut.to_system_time()),
        x509_cert::time::Time::GeneralTime(gt) => OffsetDateTime::from(gt.to_system_time()),
    }
}

/// Extracts the full attribute record from a parsed certificate.
///
/// A malformed extension fails extraction with `InvalidCertificate`
/// carrying the attributes recovered up to that point, so callers get
/// usable diagnostics for bad input.
pub(crate) fn extract(
    inner: &CertificateInner,
    der_bytes: &[u8],
) -> Result<CertAttributes, CertError> {
    let tbs = &inner.tbs_certificate;

    let mut attrs = CertAttributes {
        subject_name: name_attributes(&tbs.subject),
        subject_name_string: tbs.subject.to_string(),
        issuer_name: name_attributes(&tbs.issuer),
        issuer_name_string: tbs.issuer.to_string(),
        serial_number: hex::encode(tbs.serial_number.as_bytes()),
        valid_from: validity_time(&tbs.validity.not_before),
        valid_to: validity_time(&tbs.validity.not_after),
        sha1_digest: hex::encode(Sha1::digest(der_bytes)),
        md5_digest: hex::encode(md5::Md5::digest(der_bytes)),
        subject_alt_names: Vec::new(),
        basic_constraints: None,
        key_usage: None,
        extended_key_usage: None,
        subject_key_identifier: None,
        authority_key_identifier: None,
    };

    let Some(extensions) = tbs.extensions.as_ref() else {
        return Ok(attrs);
    };

    for ext in extensions.iter() {
        let value = ext.extn_value.as_bytes();
        let result = if ext.extn_id == BasicConstraints::OID {
            BasicConstraints::from_x509_extension_value(value)
                .map(|bc| attrs.basic_constraints = Some(bc))
        } else if ext.extn_id == KeyUsage::OID {
            KeyUsage::from_x509_extension_value(value).map(|ku| attrs.key_usage = Some(ku))
        } else if ext.extn_id == ExtendedKeyUsage::OID {
            ExtendedKeyUsage::from_x509_extension_value(value)
                .map(|eku| attrs.extended_key_usage = Some(eku))
        } else if ext.extn_id == SubjectAltName::OID {
            SubjectAltName::from_x509_extension_value(value)
                .map(|san| attrs.subject_alt_names = san.dns_names)
        } else if ext.extn_id == SubjectKeyIdentifier::OID {
            SubjectKeyIdentifier::from_x509_extension_value(value)
                .map(|ski| attrs.subject_key_identifier = Some(hex::encode(ski.key_identifier)))
        } else if ext.extn_id == AuthorityKeyIdentifier::OID {
            AuthorityKeyIdentifier::from_x509_extension_value(value).map(|aki| {
                attrs.authority_key_identifier = Some(AkiAttributes {
                    id: aki.key_identifier.map(hex::encode),
                    issuer_name: aki.authority_cert_issuer,
                    serial: aki.authority_cert_serial_number.map(hex::encode),
                })
            })
        } else {
            // other extensions are not part of the attribute record
            Ok(())
        };

        if let Err(err) = result {
            return Err(CertError::InvalidCertificate {
                attributes: Some(Box::new(attrs)),
                reason: format!("malformed extension {}: {}", ext.extn_id, err),
            });
        }
    }

    Ok(attrs)
}
