use swc_common::{comments::Comments, source_map::DefaultSourceMapGenConfig, sync::Lrc, SourceMap};
use swc_ecma_codegen::{text_writer::JsWriter, Emitter, Node};

/// Generated code and, when requested, its source map as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub code: String,
    pub source_map: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("failed to write generated code: {0}")]
    Io(#[from] std::io::Error),
    #[error("generated code is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("failed to serialize source map: {0}")]
    SourceMap(String),
}

/// Emit a module as JavaScript/TypeScript text.
///
/// `source_map` must be the map the module was parsed with so that spans
/// kept from the input resolve to their original positions.
pub fn emit_module(
    module: &swc_ecma_ast::Module,
    source_map: &Lrc<SourceMap>,
    comments: Option<&dyn Comments>,
    with_source_map: bool,
) -> Result<Emitted, EmitError> {
    let mut buf = Vec::new();
    let mut srcmap_buf = if with_source_map { Some(vec![]) } else { None };
    {
        let writer = JsWriter::new(source_map.clone(), "\n", &mut buf, srcmap_buf.as_mut());
        let mut emitter = Emitter {
            cfg: swc_ecma_codegen::Config::default().with_target(swc_ecma_ast::EsVersion::latest()),
            cm: source_map.clone(),
            comments,
            wr: writer,
        };
        module.emit_with(&mut emitter)?;
    }

    let code = String::from_utf8(buf)?;

    let source_map = match srcmap_buf {
        Some(srcmap_data) => {
            let srcmap = source_map.build_source_map(&srcmap_data, None, DefaultSourceMapGenConfig);
            let mut srcmap_json = vec![];
            srcmap
                .to_writer(&mut srcmap_json)
                .map_err(|e| EmitError::SourceMap(e.to_string()))?;
            Some(String::from_utf8(srcmap_json)?)
        }
        None => None,
    };

    Ok(Emitted { code, source_map })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_source;

    #[test]
    fn emits_parsed_module() {
        let parsed = parse_source("const answer = 42;", "a.js").unwrap();
        let emitted = emit_module(&parsed.module, &parsed.source_map, None, false).unwrap();
        assert_eq!(emitted.code.trim(), "const answer = 42;");
        assert!(emitted.source_map.is_none());
    }

    #[test]
    fn emits_source_map_on_request() {
        let parsed = parse_source("let a = 1;\nlet b = a;", "a.js").unwrap();
        let emitted = emit_module(&parsed.module, &parsed.source_map, None, true).unwrap();
        let map = emitted.source_map.expect("source map requested");
        assert!(map.contains("\"mappings\""));
    }

    #[test]
    fn keeps_comments_when_given() {
        let parsed = parse_source("// keep me\nlet a = 1;", "a.js").unwrap();
        let emitted = emit_module(
            &parsed.module,
            &parsed.source_map,
            Some(&parsed.comments),
            false,
        )
        .unwrap();
        assert!(emitted.code.contains("// keep me"));
    }
}
