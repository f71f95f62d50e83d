//! Error types and result definitions for the rownum crates.
//!
//! Every fallible operation in the workspace returns [`Result<T>`], whose
//! error variant is the single [`Error`] enum defined here. Keeping one enum
//! lets errors cross crate boundaries with `?` and gives callers a stable set
//! of variants to match on.
//!
//! # Error Categories
//!
//! - **Configuration errors** ([`Error::InvalidConfiguration`]): bad options at construction
//! - **Argument errors** ([`Error::InvalidArgumentError`]): out-of-range group ids
//! - **Growth failures** ([`Error::ResourceExhausted`]): arena storage could not be extended
//! - **Internal errors** ([`Error::Internal`]): invariant violations found by diagnostics

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
