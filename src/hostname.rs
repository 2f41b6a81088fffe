//! Hostname matching against certificate names.

use crate::cert::attributes::CertAttributes;

/// Check whether the certificate's names cover `hostname`.
///
/// The subject common name and every SAN dNSName are candidates; the match
/// succeeds if any of them matches. Comparison is case-insensitive, with a
/// single leading-wildcard-label rule: `*.example.com` matches
/// `a.example.com` but not `example.com` or `a.b.example.com`.
pub fn cert_matches_hostname(attrs: &CertAttributes, hostname: &str) -> bool {
    let hostname = hostname.trim();
    if hostname.is_empty() {
        return false;
    }

    if let Some(cn) = attrs.subject_name.common_name() {
        if matches_dns(cn, hostname) {
            return true;
        }
    }

    attrs
        .subject_alt_names
        .iter()
        .any(|name| matches_dns(name, hostname))
}

/// Check if a certificate DNS name pattern matches a hostname.
///
/// Wildcard rules:
/// - `*` only as the entire leftmost label; partial wildcards are rejected
/// - the wildcard matches exactly one label
/// - at least two labels must follow the wildcard (`*.com` is rejected)
pub(crate) fn matches_dns(pattern: &str, hostname: &str) -> bool {
    let pattern = pattern.trim_end_matches('.').to_ascii_lowercase();
    let hostname = hostname.trim_end_matches('.').to_ascii_lowercase();

    if !pattern.contains('*') {
        return pattern == hostname;
    }

    let labels: Vec<&str> = pattern.split('.').collect();

    // the wildcard must be the whole leftmost label, with a real domain
    // behind it
    if labels[0] != "*" || labels.len() < 3 {
        return false;
    }

    let host_labels: Vec<&str> = hostname.split('.').collect();
    if host_labels.len() != labels.len() {
        return false;
    }

    labels[1..]
        .iter()
        .zip(host_labels[1..].iter())
        .all(|(p, h)| p == h)
}
