//! Open Packaging Convention constants.
//!
//! The archive packaging itself is handled by the caller; the preprocessor
//! only needs the namespace URIs.

pub mod constants;
