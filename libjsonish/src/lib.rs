//! Permissive parser and canonical serializer for JSON-like project
//! manifests (package.json and friends).
//!
//! The grammar is JSON restricted to a mapping at the top level, extended
//! with `//` line comments and `/* */` block comments. The parser exists
//! as a fallback for manifests a standards-conformant codec rejects: in
//! permissive mode it swallows the first structural error and returns a
//! best-effort partial document instead of failing.
//!
//! # Pipeline
//!
//! 1. **Scanner**: A character-driven state machine that walks the input
//!    once, tracking comments, string escapes, and lexeme accumulation.
//!
//! 2. **Document builder**: Explicit context stacks (open mappings, open
//!    sequences, pending keys) assemble the value tree bottom-up; there is
//!    no call-stack recursion, so nesting depth is bounded only by memory.
//!
//! 3. **Canonical serializer**: Re-emits a document with sorted keys and
//!    fixed indentation so equal documents are byte-identical on disk.

mod encode;
mod error;
mod parser;
mod scanner;
mod value;

pub use encode::{prune, to_canonical_string};
pub use error::{ParseContext, ParseError, Result};
pub use parser::Parsed;
pub use scanner::State;
pub use value::{Mapping, Value};

/// Parse a manifest in strict mode: the first structural error aborts the
/// parse and no document is returned.
///
/// # Example
///
/// ```
/// use libjsonish::parse;
///
/// let doc = parse(r#"{"name": "demo"}"#).unwrap();
/// assert_eq!(doc["name"].as_str(), Some("demo"));
/// ```
pub fn parse(input: &str) -> Result<Mapping> {
    parse_with_filename(input, None)
}

/// Parse a manifest in strict mode with a filename for error messages.
pub fn parse_with_filename(input: &str, filename: Option<&str>) -> Result<Mapping> {
    let ctx = error::ParseContext::new(filename);
    parser::parse_strict(input, &ctx)
}

/// Parse a manifest in permissive mode: the first structural error is
/// logged and recorded on the result instead of raised, and the caller
/// receives whatever document was built before the error.
pub fn parse_permissive(input: &str) -> Parsed {
    parse_permissive_with_filename(input, None)
}

/// Permissive parse with a filename for error messages.
pub fn parse_permissive_with_filename(input: &str, filename: Option<&str>) -> Parsed {
    let ctx = error::ParseContext::new(filename);
    parser::parse_permissive(input, &ctx)
}
