//! Parsing and code generation for sweetener.
//!
//! Thin wrappers around the SWC parser and emitter. The source is parsed
//! as a module with the syntax picked from the file extension; the emitter
//! writes the (possibly rewritten) module back to text, optionally with a
//! source map.

pub mod emit;
pub mod parse;

pub use emit::{emit_module, EmitError, Emitted};
pub use parse::{parse_source, syntax_for, ParseError, ParseResult};
