//! # travcore-error
//!
//! Unified error handling for travcore - following OpenDAL's error handling practices.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what error occurred (e.g., LoopDetected, JoinMisuse)
//! - **ErrorStatus**: Decide how to handle it (Permanent, Temporary, Persistent)
//! - **Error Context**: Assist in locating the cause with rich context
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! Every kind the traversal core raises is a programming error in a pass or in
//! the Node implementation it walks, so every one of them resolves to
//! `ErrorStatus::Permanent` - there is no local recovery path inside the driver.
//!
//! ## Usage
//!
//! ```rust
//! use travcore_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::LoopDetected, "cycle through n42")
//!         .with_operation("driver::apply_visitor")
//!         .with_context("node", "n42"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All functions return `Result<T, travcore_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context
//! - Don't abuse `From<OtherError>` to prevent raw error leakage

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using travcore Error
pub type Result<T> = std::result::Result<T, Error>;
