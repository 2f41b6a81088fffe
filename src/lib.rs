//! # TrustKit - A Pure Rust Certificate Trust Library
//!
//! TrustKit is a certificate trust library built entirely with rustcrypto
//! libraries, without dependencies on ring or openssl. It provides immutable
//! X.509 certificate values, ordered certificate collections and chains, a
//! persistent trusted-root certificate store, and a policy-driven
//! chain-validation algorithm with a trust-decision cache.
//!
//! ## What TrustKit Does
//!
//! - **Certificates**: parse PEM or DER into immutable, shareable values
//!   with a structured attribute record (names, serial, validity window,
//!   digests, basic constraints, key usage, key identifiers)
//! - **Chains**: ordered leaf-first sequences whose issuer links are a
//!   claim, checked by validation rather than construction
//! - **Stores**: named, persistable vectors of trusted roots with
//!   digest-level deduplication
//! - **Validation**: policy-driven chain checking — signatures, validity
//!   window, trust anchoring, hostname, key usage, basic constraints —
//!   surfacing the first violation as a typed error
//! - **Trust cache**: successful trust decisions are cached per leaf digest
//!   so unchanged, recently-validated chains skip the full walk
//!
//! TrustKit deliberately does not issue certificates, generate keys, speak
//! TLS, or fetch revocation data; it validates certificates that were
//! obtained elsewhere.
//!
//! ## Quick Start
//!
//! ### Validating a peer chain
//!
//! ```rust,no_run
//! use trustkit::handler::CertHandler;
//! use trustkit::policy::{ssl_policy, ValidationParams};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let handler = CertHandler::init_global("/var/lib/myapp/certs");
//!
//! let peer_pem = std::fs::read_to_string("peer.pem")?;
//! let leaf = handler.certificate_from_pem(&peer_pem)?;
//! let chain = trustkit::vector::CertificateChain::from_certs([leaf]);
//!
//! let store = handler.store_for("ca_bundle");
//! let params = ValidationParams::builder()
//!     .hostname("login.example.com".to_string())
//!     .build();
//!
//! match store.lock().unwrap().validate(ssl_policy(), &chain, &params) {
//!     Ok(()) => println!("peer is trusted"),
//!     Err(err) => println!("rejected: {err} ({:?})", err.cert_attributes().subject_name_string),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Managing a trusted-root store
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trustkit::cert::Certificate;
//! use trustkit::store::CertificateStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = CertificateStore::load("accepted", "/var/lib/myapp/certs/accepted.pem");
//! let root_pem = std::fs::read_to_string("root.pem")?;
//! let root = Certificate::from_pem(&root_pem)?;
//! store.add(Arc::new(root));
//! store.save();
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Parse failures surface as [`error::CertError`]; every chain-validation
//! failure is a distinct [`error::ValidationError`] variant carrying the
//! offending certificate's attribute record, so callers can render precise
//! trust prompts or assert exact failure kinds in tests:
//!
//! ```rust,no_run
//! use trustkit::error::ValidationError;
//!
//! # fn handle(err: ValidationError) {
//! match err {
//!     ValidationError::Expired { checked_at, .. } => println!("expired at {checked_at}"),
//!     ValidationError::HostnameMismatch { hostname, .. } => println!("not valid for {hostname}"),
//!     ValidationError::Untrusted { .. } => println!("unknown issuer"),
//!     other => println!("rejected: {other}"),
//! }
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cert`]: certificate values, attribute records, extension views
//! - [`vector`]: certificate collections and chains
//! - [`store`]: the persistent trusted-root store and validation algorithm
//! - [`policy`]: validation policies and parameters
//! - [`handler`]: factory and process-wide store registry
//! - [`error`]: parse and validation error types

pub mod cert;
pub mod error;
pub mod handler;
pub mod hostname;
pub mod pem_utils;
pub mod policy;
pub mod store;
pub mod vector;

mod verify;
