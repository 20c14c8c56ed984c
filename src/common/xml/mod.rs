//! XML text helpers shared by the buffered tree and the handlers.

mod escape;

pub use escape::{escape_xml, unescape_xml};
