//! Office Open XML (OOXML) format implementation.
//!
//! The module is organized into these layers:
//!
//! 1. **OPC constants** (`opc`): namespace URIs
//! 2. **Errors** (`error`): error and protocol violation types
//! 3. **Format-specific modules**:
//!    - `docx`: mail-merge preprocessing of Word documents
pub mod docx;
pub mod error;
pub mod opc;

pub use error::{ConstructKind, OoxmlError, ProtocolViolation, Result};
