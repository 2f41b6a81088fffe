use crate::error::CertError;

/// PEM label for X.509 certificates.
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(&pem, pem::EncodeConfig::new())
}

/// Convert a PEM‑encoded string to DER‑encoded bytes.
pub fn pem_to_der(pem_str: &str) -> Result<Vec<u8>, pem::PemError> {
    let pem = pem::parse(pem_str)?;
    Ok(pem.contents().to_vec())
}

/// Parse every `CERTIFICATE` block out of a PEM concatenation, in order.
///
/// Blocks with other labels are ignored, so a bundle that also carries keys
/// or CRLs yields just its certificates.
pub fn parse_all_certificates(pem_str: &str) -> Result<Vec<Vec<u8>>, CertError> {
    let blocks = pem::parse_many(pem_str)?;
    Ok(blocks
        .into_iter()
        .filter(|block| block.tag() == CERTIFICATE_LABEL)
        .map(|block| block.contents().to_vec())
        .collect())
}
