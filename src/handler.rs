use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::debug;
use x509_cert::certificate::CertificateInner;

use crate::cert::Certificate;
use crate::error::CertError;
use crate::store::CertificateStore;
use crate::vector::CertificateChain;

/// A store handle shared between callers. Locking the mutex gives the
/// exclusive access that mutation and validation require.
pub type SharedStore = Arc<Mutex<CertificateStore>>;

static GLOBAL_HANDLER: OnceLock<CertHandler> = OnceLock::new();

/// Factory for certificates, chains, and stores.
///
/// Stores are cached per id for the handler's lifetime: the first request
/// loads (or creates) the store from disk, subsequent requests return the
/// same shared instance, so trust-cache state and pending edits are
/// consistent across callers. There is no implicit teardown — callers
/// persist stores explicitly with `save()`.
#[derive(Debug)]
pub struct CertHandler {
    store_dir: PathBuf,
    stores: Mutex<HashMap<String, SharedStore>>,
}

impl CertHandler {
    /// Creates a handler whose stores persist under `store_dir` as
    /// `<store_id>.pem`.
    pub fn new(store_dir: impl Into<PathBuf>) -> Self {
        Self {
            store_dir: store_dir.into(),
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// Installs the process-wide handler. The first call wins; later calls
    /// return the already-installed instance.
    pub fn init_global(store_dir: impl Into<PathBuf>) -> &'static CertHandler {
        GLOBAL_HANDLER.get_or_init(|| CertHandler::new(store_dir))
    }

    /// The process-wide handler, if one has been installed.
    pub fn global() -> Option<&'static CertHandler> {
        GLOBAL_HANDLER.get()
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    /// Instantiates a certificate from a PEM string.
    pub fn certificate_from_pem(&self, pem_cert: &str) -> Result<Arc<Certificate>, CertError> {
        Ok(Arc::new(Certificate::from_pem(pem_cert)?))
    }

    /// Instantiates a certificate from DER bytes.
    pub fn certificate_from_der(&self, der: Vec<u8>) -> Result<Arc<Certificate>, CertError> {
        Ok(Arc::new(Certificate::from_der(der)?))
    }

    /// Instantiates a certificate from an already-parsed structure.
    pub fn certificate_from_x509(
        &self,
        inner: CertificateInner,
    ) -> Result<Arc<Certificate>, CertError> {
        Ok(Arc::new(Certificate::from_x509(inner)?))
    }

    /// Instantiates a chain from a leaf-first sequence of parsed
    /// certificates, as accumulated by the cryptographic layer during a
    /// handshake or an explicit chain-building call.
    pub fn chain_from_context<I>(&self, context: I) -> Result<CertificateChain, CertError>
    where
        I: IntoIterator<Item = CertificateInner>,
    {
        context
            .into_iter()
            .map(|inner| Certificate::from_x509(inner).map(Arc::new))
            .collect::<Result<CertificateChain, CertError>>()
    }

    /// The shared store instance for `store_id`.
    ///
    /// The first request loads the persisted store if one exists, or
    /// creates an empty one (not yet persisted). The instance is cached
    /// for the handler's lifetime.
    pub fn store_for(&self, store_id: &str) -> SharedStore {
        let mut stores = self
            .stores
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        stores
            .entry(store_id.to_string())
            .or_insert_with(|| {
                let path = self.store_dir.join(format!("{store_id}.pem"));
                debug!(store_id, path = %path.display(), "opening certificate store");
                Arc::new(Mutex::new(CertificateStore::load(store_id, path)))
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_for_returns_the_same_instance() {
        let handler = CertHandler::new("/tmp/trustkit_test_stores");
        let first = handler.store_for("roots");
        let second = handler.store_for("roots");
        assert!(Arc::ptr_eq(&first, &second));

        let other = handler.store_for("accepted");
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(
            other
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .store_id(),
            "accepted"
        );
    }
}
