//! Genotype queries against the provider on behalf of a principal.
//!
//! Every operation follows the same path: [`AccessGuard`] resolves the
//! principal's credential (failing before any network I/O when there is
//! none), refreshes it if expired, and the resulting snapshot drives the
//! provider calls. Raw genotype data is returned to the caller and never
//! stored.

pub mod api;
pub mod endpoints;
pub mod error;
pub mod fanout;
pub mod guard;
pub mod probe;
pub mod profiles;
pub mod service;

pub use {
    api::ProviderApi,
    endpoints::ProviderEndpoints,
    error::{ApiFailure, Error, Result},
    fanout::GenotypeMap,
    guard::AccessGuard,
    probe::detect_api_base,
    profiles::Profile,
    service::{CredentialStatus, GenotypeService},
};
