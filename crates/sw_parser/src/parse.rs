use std::path::Path;

use swc_common::{comments::SingleThreadedComments, sync::Lrc, FileName, SourceMap, Span, Spanned};
use swc_ecma_ast::EsVersion;
use swc_ecma_parser::{EsSyntax, Syntax, TsSyntax};

/// Result of parsing a source file.
pub struct ParseResult {
    pub module: swc_ecma_ast::Module,
    pub comments: SingleThreadedComments,
    pub source_map: Lrc<SourceMap>,
}

/// A syntax error reported by the parser, located in the original source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{filename}:{line}:{column}: {message}")]
pub struct ParseError {
    pub filename: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Pick the parser syntax from a file name.
///
/// `.ts`/`.mts`/`.cts` parse as TypeScript, `.tsx` as TSX, the JavaScript
/// extensions as ECMAScript with JSX. Anything else is treated as TSX so
/// that both type annotations and JSX are accepted.
pub fn syntax_for(filename: &str) -> Syntax {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    match extension {
        "js" | "mjs" | "cjs" | "jsx" => Syntax::Es(EsSyntax {
            jsx: true,
            decorators: true,
            ..Default::default()
        }),
        "ts" | "mts" | "cts" => Syntax::Typescript(TsSyntax {
            decorators: true,
            ..Default::default()
        }),
        _ => Syntax::Typescript(TsSyntax {
            tsx: true,
            decorators: true,
            ..Default::default()
        }),
    }
}

/// Parse a source string as a module.
///
/// Recoverable parser errors are treated as fatal too: the engine never
/// rewrites a tree the parser had to patch up.
pub fn parse_source(source: &str, filename: &str) -> Result<ParseResult, ParseError> {
    let source_map: Lrc<SourceMap> = Default::default();
    let source_file = source_map.new_source_file(
        Lrc::new(FileName::Custom(filename.to_string())),
        source.to_string(),
    );

    let comments = SingleThreadedComments::default();
    let mut recovered = vec![];

    let module = swc_ecma_parser::parse_file_as_module(
        &source_file,
        syntax_for(filename),
        EsVersion::latest(),
        Some(&comments),
        &mut recovered,
    )
    .map_err(|e| locate(&source_map, filename, e.span(), e.kind().msg().into_owned()))?;

    if let Some(e) = recovered.into_iter().next() {
        return Err(locate(
            &source_map,
            filename,
            e.span(),
            e.kind().msg().into_owned(),
        ));
    }

    tracing::trace!(filename, items = module.body.len(), "parsed module");

    Ok(ParseResult {
        module,
        comments,
        source_map,
    })
}

fn locate(source_map: &SourceMap, filename: &str, span: Span, message: String) -> ParseError {
    let loc = source_map.lookup_char_pos(span.lo);
    ParseError {
        filename: filename.to_string(),
        line: loc.line,
        column: loc.col.0 + 1,
        message,
    }
}
