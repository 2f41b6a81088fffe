use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::cert::Certificate;
use crate::cert::attributes::CertAttributes;
use crate::cert::extensions::{EKU_SERVER_AUTH, KeyUsages};
use crate::error::ValidationError;
use crate::hostname::cert_matches_hostname;
use crate::pem_utils;
use crate::policy::{PolicySet, ValidationParams, ValidationPolicy};
use crate::vector::{CertificateChain, CertificateVector};
use crate::verify::verify_signed_by;

/// Cache of trust decisions: leaf SHA-1 hex mapped to the validated chain's
/// date-intersection window. Entries exist only for leaves that already
/// passed a full validation against this store, and are never persisted.
type TrustCache = HashMap<String, (OffsetDateTime, OffsetDateTime)>;

/// Counters observable across validations; the chain-walk counter lets
/// tests distinguish trust-cache hits from full walks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreMetrics {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub chain_walks: u64,
}

/// A named, persistable store of trusted root certificates.
///
/// The store owns the chain-validation algorithm and a trust-decision
/// cache. Mutation and validation take `&mut self`; callers that share a
/// store across threads wrap it in a `Mutex` (the
/// [`CertHandler`](crate::handler::CertHandler) registry hands stores out
/// that way), which makes the cache read/write during `validate` a proper
/// critical section.
#[derive(Debug)]
pub struct CertificateStore {
    store_id: String,
    path: PathBuf,
    certs: CertificateVector,
    trusted_cache: TrustCache,
    metrics: StoreMetrics,
}

impl CertificateStore {
    /// Loads the store persisted at `path`, or creates an empty one.
    ///
    /// Never fails: a missing file yields an empty store, and PEM blocks
    /// that do not parse as certificates are skipped with a warning.
    pub fn load(store_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let mut store = Self {
            store_id: store_id.into(),
            path: path.into(),
            certs: CertificateVector::new(),
            trusted_cache: TrustCache::new(),
            metrics: StoreMetrics::default(),
        };

        match std::fs::read_to_string(&store.path) {
            Ok(contents) => match pem_utils::parse_all_certificates(&contents) {
                Ok(blocks) => {
                    for der in blocks {
                        match Certificate::from_der(der) {
                            Ok(cert) => store.certs.add(Arc::new(cert)),
                            Err(err) => warn!(
                                store_id = %store.store_id,
                                %err,
                                "skipping unparseable certificate in store file"
                            ),
                        }
                    }
                    debug!(
                        store_id = %store.store_id,
                        certs = store.certs.len(),
                        "loaded certificate store"
                    );
                }
                Err(err) => warn!(
                    store_id = %store.store_id,
                    %err,
                    "store file is not valid PEM, starting empty"
                ),
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(store_id = %store.store_id, "no persisted store, starting empty");
            }
            Err(err) => warn!(
                store_id = %store.store_id,
                %err,
                "could not read store file, starting empty"
            ),
        }

        store
    }

    /// The store's stable identifier, used for on-disk naming and for
    /// distinguishing concurrently-open stores.
    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read access to the trusted-certificate vector.
    pub fn certs(&self) -> &CertificateVector {
        &self.certs
    }

    /// Appends a trusted certificate; an existing copy is replaced.
    pub fn add(&mut self, cert: Arc<Certificate>) {
        self.certs.add(cert);
    }

    /// Inserts a trusted certificate at `index`; an existing copy is
    /// replaced.
    pub fn insert(&mut self, index: usize, cert: Arc<Certificate>) {
        self.certs.insert(index, cert);
    }

    /// Removes and returns the certificate at `index`.
    pub fn erase(&mut self, index: usize) -> Option<Arc<Certificate>> {
        self.certs.erase(index)
    }

    /// Counter snapshot.
    pub fn metrics(&self) -> StoreMetrics {
        self.metrics
    }

    /// Persists the store as a PEM concatenation at its backing path.
    ///
    /// Writes a temporary file and renames it over the target, so the
    /// persisted store is never observed half-written. A write failure is
    /// logged and absorbed: the in-memory store stays authoritative for
    /// the session.
    pub fn save(&self) {
        let mut bundle = String::new();
        for cert in self.certs.iter() {
            bundle.push_str(&cert.to_pem());
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        if let Err(err) = std::fs::write(&tmp, &bundle) {
            warn!(store_id = %self.store_id, %err, "could not write certificate store");
            let _ = std::fs::remove_file(&tmp);
            return;
        }
        if let Err(err) = std::fs::rename(&tmp, &self.path) {
            warn!(store_id = %self.store_id, %err, "could not replace certificate store");
            let _ = std::fs::remove_file(&tmp);
            return;
        }
        debug!(store_id = %self.store_id, certs = self.certs.len(), "saved certificate store");
    }

    /// Validates a certificate chain against this store under the given
    /// policy set.
    ///
    /// Returns normally when every requested policy holds; otherwise
    /// surfaces the first violation found, in the fixed order: chain
    /// linkage and signatures, validity window, trust anchoring, hostname,
    /// key usage, basic constraints.
    ///
    /// A trust-cache hit for the leaf digest whose cached window covers
    /// the validation time skips the chain walk; an entry past its window
    /// is evicted and the chain is walked in full again.
    pub fn validate(
        &mut self,
        policy: PolicySet,
        chain: &CertificateChain,
        params: &ValidationParams,
    ) -> Result<(), ValidationError> {
        let now = params.effective_date();

        let Some(leaf) = chain.leaf().cloned() else {
            return Err(ValidationError::Untrusted {
                cert: Box::new(CertAttributes::absent()),
            });
        };

        // trust-cache fast path: the linkage, time, and anchor checks were
        // established when the entry was written
        let mut cache_hit = false;
        if policy.contains(ValidationPolicy::Trusted) {
            match self.trusted_cache.get(leaf.sha1_hex()).copied() {
                Some((valid_from, valid_to)) => {
                    if !policy.contains(ValidationPolicy::Time)
                        || (now >= valid_from && now <= valid_to)
                    {
                        self.metrics.cache_hits += 1;
                        cache_hit = true;
                        debug!(
                            store_id = %self.store_id,
                            leaf = leaf.sha1_hex(),
                            "trust cache hit"
                        );
                    } else {
                        // never authoritative past its window
                        self.trusted_cache.remove(leaf.sha1_hex());
                        self.metrics.cache_misses += 1;
                    }
                }
                None => self.metrics.cache_misses += 1,
            }
        }

        let mut effective: Vec<Arc<Certificate>> = chain.iter().cloned().collect();
        let mut anchored = false;

        if !cache_hit {
            self.metrics.chain_walks += 1;

            // chain linkage & signature check, independent of the policy set
            for pair in effective.windows(2) {
                check_link(&pair[0], &pair[1])?;
            }

            let last = effective.last().cloned().unwrap_or_else(|| leaf.clone());
            anchored = self.certs.find_by_sha1(last.sha1_hex()).is_some();
            if !anchored {
                if let Some(root) = self.find_issuer_root(&last).cloned() {
                    check_link(&last, &root)?;
                    effective.push(root);
                    anchored = true;
                }
            }

            if policy.contains(ValidationPolicy::Time) {
                for cert in &effective {
                    let attrs = cert.attributes();
                    if now < attrs.valid_from || now > attrs.valid_to {
                        return Err(ValidationError::Expired {
                            cert: Box::new(attrs.clone()),
                            checked_at: now,
                        });
                    }
                }
            }

            if policy.contains(ValidationPolicy::Trusted) && !anchored {
                return Err(ValidationError::Untrusted {
                    cert: Box::new(leaf.attributes().clone()),
                });
            }
        }

        if policy.contains(ValidationPolicy::Hostname) {
            let hostname = params.hostname.clone().unwrap_or_default();
            if !cert_matches_hostname(leaf.attributes(), &hostname) {
                return Err(ValidationError::HostnameMismatch {
                    cert: Box::new(leaf.attributes().clone()),
                    hostname,
                });
            }
        }

        if policy.contains(ValidationPolicy::SslKeyUsage) {
            let attrs = leaf.attributes();
            if let Some(key_usage) = attrs.key_usage {
                if !key_usage.contains(KeyUsages::DigitalSignature)
                    && !key_usage.contains(KeyUsages::KeyEncipherment)
                {
                    return Err(ValidationError::KeyUsage {
                        cert: Box::new(attrs.clone()),
                    });
                }
            }
            if let Some(eku) = &attrs.extended_key_usage {
                if !eku.contains(EKU_SERVER_AUTH) {
                    return Err(ValidationError::KeyUsage {
                        cert: Box::new(attrs.clone()),
                    });
                }
            }
        }

        if policy.contains(ValidationPolicy::CaKeyUsage) {
            for issuing in effective.iter().skip(1) {
                let attrs = issuing.attributes();
                if let Some(key_usage) = attrs.key_usage {
                    if !key_usage.contains(KeyUsages::KeyCertSign) {
                        return Err(ValidationError::KeyUsage {
                            cert: Box::new(attrs.clone()),
                        });
                    }
                }
            }
        }

        if policy.contains(ValidationPolicy::CaBasicConstraints) {
            for (depth, cert) in effective.iter().enumerate().skip(1) {
                let attrs = cert.attributes();
                let Some(constraints) = attrs.basic_constraints else {
                    return Err(ValidationError::BasicConstraints {
                        cert: Box::new(attrs.clone()),
                    });
                };
                if !constraints.is_ca {
                    return Err(ValidationError::BasicConstraints {
                        cert: Box::new(attrs.clone()),
                    });
                }
                if let Some(max_path) = constraints.max_path_length {
                    // pathLen bounds the issuing certificates below this one
                    let issued_below = (depth - 1) as u32;
                    if issued_below > max_path {
                        return Err(ValidationError::BasicConstraints {
                            cert: Box::new(attrs.clone()),
                        });
                    }
                }
            }
        }

        // record the decision only once every requested policy has held
        if !cache_hit && anchored && policy.contains(ValidationPolicy::Trusted) {
            let window = date_intersection(&effective);
            self.trusted_cache
                .insert(leaf.sha1_hex().to_string(), window);
        }

        Ok(())
    }

    /// Finds a store root that could have issued `cert`, by subject/issuer
    /// name and, when both sides carry them, authority/subject key
    /// identifiers.
    fn find_issuer_root(&self, cert: &Certificate) -> Option<&Arc<Certificate>> {
        let child_key_id = cert.attributes().authority_key_id_bytes();
        self.certs.iter().find(|root| {
            if root.subject() != cert.issuer() {
                return false;
            }
            match (&child_key_id, root.attributes().subject_key_id_bytes()) {
                (Some(child_id), Some(root_id)) => *child_id == root_id,
                _ => true,
            }
        })
    }
}

/// The intersection of the chain members' validity windows.
fn date_intersection(certs: &[Arc<Certificate>]) -> (OffsetDateTime, OffsetDateTime) {
    let Some((first, rest)) = certs.split_first() else {
        return (OffsetDateTime::UNIX_EPOCH, OffsetDateTime::UNIX_EPOCH);
    };
    let mut from = first.attributes().valid_from;
    let mut to = first.attributes().valid_to;
    for cert in rest {
        let attrs = cert.attributes();
        from = from.max(attrs.valid_from);
        to = to.min(attrs.valid_to);
    }
    (from, to)
}

/// Checks one chain link: the child's issuer name must be the issuer's
/// subject name, key identifiers must agree when both are present, and the
/// issuer's key must verify the child's signature.
fn check_link(child: &Arc<Certificate>, issuer: &Arc<Certificate>) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidSignature {
        cert: Box::new(child.attributes().clone()),
    };

    if child.issuer() != issuer.subject() {
        return Err(invalid());
    }

    if let (Some(child_key_id), Some(issuer_key_id)) = (
        child.attributes().authority_key_id_bytes(),
        issuer.attributes().subject_key_id_bytes(),
    ) {
        if child_key_id != issuer_key_id {
            return Err(invalid());
        }
    }

    verify_signed_by(child, issuer).map_err(|err| {
        debug!(
            child = child.sha1_hex(),
            issuer = issuer.sha1_hex(),
            %err,
            "chain link signature check failed"
        );
        invalid()
    })
}
