//! Per-link certificate signature verification.

use const_oid::ObjectIdentifier;
use der::Encode;
use rsa::RsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use sha2::{Sha256, Sha384, Sha512};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::Certificate;

/// Why a link's signature check failed. Internal detail; validation maps
/// every case to the invalid-signature policy failure.
#[derive(Debug, thiserror::Error)]
pub(crate) enum VerifyError {
    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("malformed key or signature: {0}")]
    Malformed(String),

    #[error("signature mismatch")]
    Mismatch,
}

/// Verifies that `issuer`'s public key validates `child`'s signature over
/// its TBS bytes.
///
/// Dispatches on the signature-algorithm OID: RSA PKCS#1 v1.5 with
/// SHA-256/384/512, ECDSA on P-256/P-384/P-521 with the paired hash, and
/// Ed25519.
pub(crate) fn verify_signed_by(child: &Certificate, issuer: &Certificate) -> Result<(), VerifyError> {
    let tbs = child
        .tbs_der()
        .map_err(|e| VerifyError::Malformed(e.to_string()))?;
    let signature = child
        .signature_bytes()
        .ok_or_else(|| VerifyError::Malformed("signature bit string has unused bits".to_string()))?;
    let sig_oid = child.signature_algorithm().oid;
    let spki = issuer.public_key_info();

    match sig_oid {
        const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION => {
            verify_rsa::<Sha256>(&tbs, signature, spki)
        }
        const_oid::db::rfc5912::SHA_384_WITH_RSA_ENCRYPTION => {
            verify_rsa::<Sha384>(&tbs, signature, spki)
        }
        const_oid::db::rfc5912::SHA_512_WITH_RSA_ENCRYPTION => {
            verify_rsa::<Sha512>(&tbs, signature, spki)
        }
        const_oid::db::rfc5912::ECDSA_WITH_SHA_256
        | const_oid::db::rfc5912::ECDSA_WITH_SHA_384
        | const_oid::db::rfc5912::ECDSA_WITH_SHA_512 => {
            verify_ecdsa(&tbs, signature, spki, sig_oid)
        }
        const_oid::db::rfc8410::ID_ED_25519 => verify_ed25519(&tbs, signature, spki),
        other => Err(VerifyError::UnsupportedAlgorithm(other.to_string())),
    }
}

fn verify_rsa<D>(
    tbs: &[u8],
    signature: &[u8],
    spki: &SubjectPublicKeyInfoOwned,
) -> Result<(), VerifyError>
where
    D: sha2::Digest + const_oid::AssociatedOid,
{
    let spki_der = spki
        .to_der()
        .map_err(|e| VerifyError::Malformed(e.to_string()))?;
    let public_key = RsaPublicKey::from_public_key_der(&spki_der)
        .map_err(|e| VerifyError::Malformed(e.to_string()))?;
    let verifying_key = rsa::pkcs1v15::VerifyingKey::<D>::new(public_key);
    let signature = rsa::pkcs1v15::Signature::try_from(signature)
        .map_err(|e| VerifyError::Malformed(e.to_string()))?;
    verifying_key
        .verify(tbs, &signature)
        .map_err(|_| VerifyError::Mismatch)
}

fn verify_ecdsa(
    tbs: &[u8],
    signature: &[u8],
    spki: &SubjectPublicKeyInfoOwned,
    sig_oid: ObjectIdentifier,
) -> Result<(), VerifyError> {
    // the named curve lives in the algorithm parameters of the SPKI
    let curve_oid = spki
        .algorithm
        .parameters
        .as_ref()
        .and_then(|params| params.decode_as::<ObjectIdentifier>().ok())
        .ok_or_else(|| {
            VerifyError::Malformed("EC public key carries no named curve".to_string())
        })?;
    let point = spki.subject_public_key.raw_bytes();

    match (sig_oid, curve_oid) {
        (
            const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
            const_oid::db::rfc5912::SECP_256_R_1,
        ) => {
            let verifying_key = p256::ecdsa::VerifyingKey::from_sec1_bytes(point)
                .map_err(|e| VerifyError::Malformed(e.to_string()))?;
            let signature = p256::ecdsa::DerSignature::try_from(signature)
                .map_err(|e| VerifyError::Malformed(e.to_string()))?;
            verifying_key
                .verify(tbs, &signature)
                .map_err(|_| VerifyError::Mismatch)
        }
        (
            const_oid::db::rfc5912::ECDSA_WITH_SHA_384,
            const_oid::db::rfc5912::SECP_384_R_1,
        ) => {
            let verifying_key = p384::ecdsa::VerifyingKey::from_sec1_bytes(point)
                .map_err(|e| VerifyError::Malformed(e.to_string()))?;
            let signature = p384::ecdsa::DerSignature::try_from(signature)
                .map_err(|e| VerifyError::Malformed(e.to_string()))?;
            verifying_key
                .verify(tbs, &signature)
                .map_err(|_| VerifyError::Mismatch)
        }
        (
            const_oid::db::rfc5912::ECDSA_WITH_SHA_512,
            const_oid::db::rfc5912::SECP_521_R_1,
        ) => {
            let verifying_key = p521::ecdsa::VerifyingKey::from_sec1_bytes(point)
                .map_err(|e| VerifyError::Malformed(e.to_string()))?;
            let signature = p521::ecdsa::Signature::from_der(signature)
                .map_err(|e| VerifyError::Malformed(e.to_string()))?;
            verifying_key
                .verify(tbs, &signature)
                .map_err(|_| VerifyError::Mismatch)
        }
        (sig, curve) => Err(VerifyError::UnsupportedAlgorithm(format!(
            "{sig} over curve {curve}"
        ))),
    }
}

fn verify_ed25519(
    tbs: &[u8],
    signature: &[u8],
    spki: &SubjectPublicKeyInfoOwned,
) -> Result<(), VerifyError> {
    let point: &[u8; 32] = spki
        .subject_public_key
        .raw_bytes()
        .try_into()
        .map_err(|_| VerifyError::Malformed("Ed25519 public key is not 32 bytes".to_string()))?;
    let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(point)
        .map_err(|e| VerifyError::Malformed(e.to_string()))?;
    let signature = ed25519_dalek::Signature::from_slice(signature)
        .map_err(|e| VerifyError::Malformed(e.to_string()))?;
    verifying_key
        .verify(tbs, &signature)
        .map_err(|_| VerifyError::Mismatch)
}
