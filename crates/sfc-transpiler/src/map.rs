//! Dense token-level source maps for untranspiled script.

use crate::TranspileError;
use source_map::{ByteOffset, LineCol, LineIndex, SourceMap};
use swc_common::{sync::Lrc, FileName, SourceMap as SwcSourceMap};
use swc_ecma_parser::{lexer::Lexer, StringInput, Syntax};

/// Maps every script token in `content` back to the component `file`.
///
/// `offset` is the 1-based component line on which `content` begins, so a
/// token on generated line `L` (0-based) lands on component line
/// `L + offset` (1-based). Columns are left as they are.
///
/// # Errors
///
/// Returns [`TranspileError::InvalidOffset`] when `offset < 1`. Content that
/// needs no line shift should not be mapped at all.
pub fn generate_map(content: &str, file: &str, offset: i64) -> Result<SourceMap, TranspileError> {
    // Maps store 0-based lines: generated L + offset (1-based) is L + offset - 1
    let shift = offset
        .checked_sub(1)
        .and_then(|shift| u32::try_from(shift).ok())
        .ok_or(TranspileError::InvalidOffset { offset })?;

    let cm: Lrc<SwcSourceMap> = Default::default();
    let fm = cm.new_source_file(Lrc::new(FileName::Anon), content.to_string());
    let lexer = Lexer::new(
        Syntax::Es(Default::default()),
        Default::default(),
        StringInput::from(&*fm),
        None,
    );

    let index = LineIndex::new(content);
    let mut builder = SourceMap::builder().file(file);
    let source = builder.add_source(file);
    let mut end = 0;

    for token in lexer {
        let lo = (token.span.lo.0 - fm.start_pos.0) as usize;
        let hi = (token.span.hi.0 - fm.start_pos.0) as usize;

        // End of input may come back as an empty token
        if lo == hi {
            if hi >= content.len() {
                break;
            }
            continue;
        }
        if lo < end {
            break;
        }
        end = hi;

        let Some(name) = content.get(lo..hi) else {
            continue;
        };
        let generated = utf16_position(&index, content, lo);
        let original = LineCol::new(generated.line + shift, generated.col);
        builder.add_mapping(generated, original, source, Some(name));
    }

    tracing::debug!(file, offset, mappings = builder.len(), "generated source map");
    Ok(builder.build())
}

/// Line and UTF-16 column of a byte offset.
fn utf16_position(index: &LineIndex, content: &str, offset: usize) -> LineCol {
    let line = index.line_of(ByteOffset::from(offset as u32));
    let start = index
        .line_start(line)
        .map_or(0, |start| u32::from(start) as usize);
    let col = content
        .get(start..offset)
        .map_or(0, |prefix| prefix.encode_utf16().count());
    LineCol::new(line, col as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_zero_offset_is_rejected() {
        let err = generate_map("module.exports = {}", "foo.js", 0).unwrap_err();
        assert!(matches!(err, TranspileError::InvalidOffset { offset: 0 }));
    }

    #[test]
    fn test_negative_offset_is_rejected() {
        let err = generate_map("x", "foo.js", -3).unwrap_err();
        assert!(matches!(err, TranspileError::InvalidOffset { offset: -3 }));
        assert_eq!(
            err.to_string(),
            "source map offset must be a positive line number, got -3"
        );
    }

    #[test]
    fn test_one_mapping_per_token() {
        let map = generate_map("\nmodule.exports = {}\n", "foo.vue", 1).unwrap();
        let names: Vec<_> = map.entries().map(|e| e.name.unwrap_or_default()).collect();
        assert_eq!(names, ["module", ".", "exports", "=", "{", "}"]);
        assert!(map.entries().all(|e| e.source == "foo.vue"));
    }

    #[test]
    fn test_lines_shift_by_offset() {
        let map = generate_map("a;\n  b;", "App.vue", 5).unwrap();
        let positions: Vec<_> = map
            .entries()
            .map(|e| (e.generated, e.original))
            .collect();
        assert_eq!(
            positions,
            [
                (LineCol::new(0, 0), LineCol::new(4, 0)),
                (LineCol::new(0, 1), LineCol::new(4, 1)),
                (LineCol::new(1, 2), LineCol::new(5, 2)),
                (LineCol::new(1, 3), LineCol::new(5, 3)),
            ]
        );
    }

    #[test]
    fn test_columns_count_utf16_units() {
        let map = generate_map("let s = \"h\u{e9}llo\"; x", "App.vue", 1).unwrap();
        let last = map.entries().last().unwrap();
        assert_eq!(last.name, Some("x"));
        assert_eq!(last.generated, LineCol::new(0, 17));
    }

    #[test]
    fn test_crlf_lines() {
        let map = generate_map("a\r\nb", "App.vue", 2).unwrap();
        let lines: Vec<_> = map.entries().map(|e| e.original.line).collect();
        assert_eq!(lines, [1, 2]);
    }

    #[test]
    fn test_empty_content_has_no_mappings() {
        let map = generate_map("", "App.vue", 1).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.sources(), ["App.vue"]);
    }

    #[test]
    fn test_map_json() {
        let map = generate_map("a.b", "foo.vue", 3).unwrap();
        insta::assert_snapshot!(
            map.to_json(),
            @r#"{"version":3,"file":"foo.vue","sources":["foo.vue"],"names":["a",".","b"],"mappings":"AAEAA,CAACC,CAACC"}"#
        );
    }
}
