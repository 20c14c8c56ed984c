//! Common utilities shared across the OOXML layer.

pub mod xml;
