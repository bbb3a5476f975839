//! URL handling module for driftnet
//!
//! Provides the normalization used as the visited-set equality key during
//! traversal, plus authority extraction for same-domain checks.

mod domain;
mod normalize;

pub use domain::url_authority;
pub use normalize::normalize_url;
