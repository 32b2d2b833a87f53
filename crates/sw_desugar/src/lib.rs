//! Desugaring pass that rewrites sweetener constructs into standard JavaScript.
//!
//! Transforms:
//! - `a == b`, `a != b` → `a === b`, `a !== b`
//! - `println(x)`       → ``console.log(`${x}\n`)``
//! - `defer(fn)`        → `_defers.push(fn)` inside a `try`/`finally` that
//!   runs the registered cleanups in reverse order

pub mod defer;
pub mod desugar;
pub mod diagnostics;
pub mod driver;
pub mod equality;
pub mod error;
mod make;
pub mod println;
pub mod runtime;

pub use desugar::{desugar_module, transform, transform_file, transform_with_sink, Desugared, DEFAULT_FILENAME};
pub use diagnostics::{DiagnosticSink, Event, EventLog, NullSink, SourceRange, TracingSink};
pub use error::TransformError;
pub use runtime::RUNTIME_SOURCE;
