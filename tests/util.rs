//! Shared fixtures: mint small ECDSA P-256 certificate chains with chosen
//! validity windows, usages, and names, so validation tests are
//! deterministic and time-invariant.
#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use der::asn1::{BitString, Ia5String, OctetString, UtcTime};
use der::flagset::FlagSet;
use der::Encode;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use rand_core::OsRng;
use sha1::{Digest, Sha1};
use time::macros::datetime;
use time::OffsetDateTime;
use x509_cert::certificate::{CertificateInner, TbsCertificateInner};
use x509_cert::ext::pkix;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::time::{Time, Validity};
use x509_cert::Version;

use trustkit::cert::extensions::KeyUsages;
use trustkit::cert::Certificate;

/// Default fixture window: certificates are valid throughout 2024-2033.
pub const VALID_FROM: OffsetDateTime = datetime!(2024-01-01 00:00:00 UTC);
pub const VALID_TO: OffsetDateTime = datetime!(2034-01-01 00:00:00 UTC);

/// A timestamp inside every default fixture window.
pub const INSIDE_WINDOW: OffsetDateTime = datetime!(2025-06-15 12:00:00 UTC);

/// Parameters for one minted certificate.
#[derive(Clone)]
pub struct CertParams {
    pub cn: String,
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
    pub is_ca: bool,
    pub path_len: Option<u8>,
    pub include_basic_constraints: bool,
    pub key_usage: Option<FlagSet<KeyUsages>>,
    pub server_auth_eku: bool,
    pub dns_names: Vec<String>,
}

impl CertParams {
    /// A TLS server leaf: not a CA, signature/encipherment key usage,
    /// serverAuth EKU.
    pub fn leaf(cn: &str) -> Self {
        Self {
            cn: cn.to_string(),
            not_before: VALID_FROM,
            not_after: VALID_TO,
            is_ca: false,
            path_len: None,
            include_basic_constraints: true,
            key_usage: Some(KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment),
            server_auth_eku: true,
            dns_names: vec![cn.to_string()],
        }
    }

    /// A certificate authority: CA basic constraints, cert-sign key usage.
    pub fn ca(cn: &str) -> Self {
        Self {
            cn: cn.to_string(),
            not_before: VALID_FROM,
            not_after: VALID_TO,
            is_ca: true,
            path_len: None,
            include_basic_constraints: true,
            key_usage: Some(KeyUsages::KeyCertSign | KeyUsages::CRLSign),
            server_auth_eku: false,
            dns_names: Vec::new(),
        }
    }

    pub fn valid(mut self, from: OffsetDateTime, to: OffsetDateTime) -> Self {
        self.not_before = from;
        self.not_after = to;
        self
    }

    pub fn key_usage(mut self, usage: FlagSet<KeyUsages>) -> Self {
        self.key_usage = Some(usage);
        self
    }

    pub fn no_key_usage(mut self) -> Self {
        self.key_usage = None;
        self
    }

    pub fn no_basic_constraints(mut self) -> Self {
        self.include_basic_constraints = false;
        self
    }

    pub fn path_len(mut self, len: u8) -> Self {
        self.path_len = Some(len);
        self
    }

    pub fn dns_names(mut self, names: &[&str]) -> Self {
        self.dns_names = names.iter().map(|n| n.to_string()).collect();
        self
    }
}

pub fn name(cn: &str) -> Name {
    Name::from_str(&format!("CN={cn}")).expect("fixture name")
}

fn algorithm() -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
        parameters: None,
    }
}

fn spki_for(key: &SigningKey) -> SubjectPublicKeyInfoOwned {
    SubjectPublicKeyInfoOwned::from_key(*key.verifying_key()).expect("fixture spki")
}

fn key_id(spki: &SubjectPublicKeyInfoOwned) -> Vec<u8> {
    Sha1::digest(spki.subject_public_key.raw_bytes()).to_vec()
}

fn utc(t: OffsetDateTime) -> Time {
    Time::UtcTime(UtcTime::from_system_time(t.into()).expect("fixture time"))
}

fn extension<E: Encode>(oid: const_oid::ObjectIdentifier, critical: bool, value: &E) -> Extension {
    Extension {
        extn_id: oid,
        critical,
        extn_value: OctetString::new(value.to_der().expect("fixture extension"))
            .expect("fixture extension"),
    }
}

/// Mints a certificate for `params`, signed by `issuer_key` under
/// `issuer_name`, binding `subject_key`'s public half.
pub fn issue_with_key(
    params: &CertParams,
    issuer_name: &Name,
    issuer_key: &SigningKey,
    subject_key: &SigningKey,
    serial: u8,
) -> Arc<Certificate> {
    let subject_spki = spki_for(subject_key);
    let issuer_spki = spki_for(issuer_key);

    let mut extensions = Vec::new();
    if params.include_basic_constraints {
        extensions.push(extension(
            <pkix::BasicConstraints as const_oid::AssociatedOid>::OID,
            true,
            &pkix::BasicConstraints {
                ca: params.is_ca,
                path_len_constraint: params.path_len,
            },
        ));
    }
    if let Some(usage) = params.key_usage {
        extensions.push(extension(
            <pkix::KeyUsage as const_oid::AssociatedOid>::OID,
            true,
            &pkix::KeyUsage(usage),
        ));
    }
    if params.server_auth_eku {
        extensions.push(extension(
            <pkix::ExtendedKeyUsage as const_oid::AssociatedOid>::OID,
            false,
            &pkix::ExtendedKeyUsage(vec![const_oid::db::rfc5912::ID_KP_SERVER_AUTH]),
        ));
    }
    if !params.dns_names.is_empty() {
        let names = params
            .dns_names
            .iter()
            .map(|n| {
                GeneralName::DnsName(Ia5String::try_from(n.clone()).expect("fixture dns name"))
            })
            .collect();
        extensions.push(extension(
            <pkix::SubjectAltName as const_oid::AssociatedOid>::OID,
            false,
            &pkix::SubjectAltName(names),
        ));
    }
    extensions.push(extension(
        <pkix::SubjectKeyIdentifier as const_oid::AssociatedOid>::OID,
        false,
        &pkix::SubjectKeyIdentifier(
            OctetString::new(key_id(&subject_spki)).expect("fixture ski"),
        ),
    ));
    extensions.push(extension(
        <pkix::AuthorityKeyIdentifier as const_oid::AssociatedOid>::OID,
        false,
        &pkix::AuthorityKeyIdentifier {
            key_identifier: Some(OctetString::new(key_id(&issuer_spki)).expect("fixture aki")),
            authority_cert_issuer: None,
            authority_cert_serial_number: None,
        },
    ));

    let tbs = TbsCertificateInner {
        version: Version::V3,
        serial_number: SerialNumber::new(&[serial]).expect("fixture serial"),
        signature: algorithm(),
        issuer: issuer_name.clone(),
        validity: Validity {
            not_before: utc(params.not_before),
            not_after: utc(params.not_after),
        },
        subject: name(&params.cn),
        subject_public_key_info: subject_spki,
        issuer_unique_id: None,
        subject_unique_id: None,
        extensions: Some(extensions),
    };

    let tbs_der = tbs.to_der().expect("fixture tbs");
    let signature: Signature = issuer_key.sign(&tbs_der);
    let signature_der = signature.to_der();

    let inner = CertificateInner {
        tbs_certificate: tbs,
        signature_algorithm: algorithm(),
        signature: BitString::from_bytes(signature_der.as_bytes()).expect("fixture signature"),
    };

    Arc::new(Certificate::from_x509(inner).expect("fixture certificate"))
}

/// Mints a certificate with a fresh key, returning both.
pub fn issue(
    params: &CertParams,
    issuer_name: &Name,
    issuer_key: &SigningKey,
    serial: u8,
) -> (Arc<Certificate>, SigningKey) {
    let subject_key = SigningKey::random(&mut OsRng);
    let cert = issue_with_key(params, issuer_name, issuer_key, &subject_key, serial);
    (cert, subject_key)
}

/// Mints a self-signed certificate with a fresh key.
pub fn self_signed(params: &CertParams, serial: u8) -> (Arc<Certificate>, SigningKey) {
    let key = SigningKey::random(&mut OsRng);
    let subject = name(&params.cn);
    let cert = issue_with_key(params, &subject, &key, &key, serial);
    (cert, key)
}

/// Root CA, intermediate CA, and server leaf for `hostname`, properly
/// linked. Returned leaf-first-usable as `[leaf, intermediate]` with the
/// root held by the store.
pub struct Fixture {
    pub root: Arc<Certificate>,
    pub intermediate: Arc<Certificate>,
    pub leaf: Arc<Certificate>,
}

pub fn three_level_chain(hostname: &str) -> Fixture {
    let (root, root_key) = self_signed(&CertParams::ca("Fixture Root CA"), 1);
    let (intermediate, intermediate_key) = issue(
        &CertParams::ca("Fixture Intermediate CA"),
        &name("Fixture Root CA"),
        &root_key,
        2,
    );
    let (leaf, _leaf_key) = issue(
        &CertParams::leaf(hostname),
        &name("Fixture Intermediate CA"),
        &intermediate_key,
        3,
    );
    Fixture {
        root,
        intermediate,
        leaf,
    }
}
