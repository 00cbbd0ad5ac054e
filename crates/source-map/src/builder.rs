//! Version 3 source map tables and the builder that produces them.

use crate::{vlq, LineCol, SourceMapError};
use base64::{engine::general_purpose::STANDARD, Engine};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A single mapping from a generated position to an original position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    /// Position in the generated output.
    pub generated: LineCol,
    /// Position in the original source.
    pub original: LineCol,
    /// Index into [`SourceMap::sources`].
    pub source: u32,
    /// Index into [`SourceMap::names`], if the mapping is named.
    pub name: Option<u32>,
}

/// A [`Mapping`] with its source and name resolved to strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingEntry<'a> {
    /// Identifier of the original file.
    pub source: &'a str,
    /// Position in the original source.
    pub original: LineCol,
    /// Position in the generated output.
    pub generated: LineCol,
    /// Original token text for named mappings.
    pub name: Option<&'a str>,
}

/// A source map that tracks position mappings from generated code back to original source.
///
/// Lines and columns are 0-based, as in the serialized `mappings` field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMap {
    file: Option<String>,
    sources: Vec<String>,
    names: Vec<String>,
    /// Sorted by generated position.
    mappings: Vec<Mapping>,
}

/// Serialized shape of a v3 map.
#[derive(Debug, Serialize, Deserialize)]
struct RawSourceMap {
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    #[serde(default)]
    sources: Vec<String>,
    #[serde(default)]
    names: Vec<String>,
    mappings: String,
}

impl SourceMap {
    /// The only interchange version produced and accepted.
    pub const VERSION: u32 = 3;

    /// Creates a new empty source map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source map builder.
    pub fn builder() -> SourceMapBuilder {
        SourceMapBuilder::new()
    }

    /// Returns the generated file this map describes, if recorded.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Returns the original source identifiers.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Returns the distinct token names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the number of mappings in this source map.
    #[inline]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Returns true if this source map has no mappings.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Returns an iterator over all mappings.
    pub fn mappings(&self) -> impl Iterator<Item = &Mapping> {
        self.mappings.iter()
    }

    /// Returns all mappings with sources and names resolved.
    pub fn entries(&self) -> impl Iterator<Item = MappingEntry<'_>> {
        self.mappings.iter().map(|m| MappingEntry {
            source: &self.sources[m.source as usize],
            original: m.original,
            generated: m.generated,
            name: m.name.map(|idx| self.names[idx as usize].as_str()),
        })
    }

    /// Finds the mapping that covers a generated position: the last mapping on
    /// the same line starting at or before the column.
    pub fn lookup(&self, generated: LineCol) -> Option<&Mapping> {
        let idx = self
            .mappings
            .partition_point(|m| m.generated <= generated)
            .checked_sub(1)?;

        self.mappings
            .get(idx)
            .filter(|m| m.generated.line == generated.line)
    }

    /// Encodes the mappings as base64 VLQ segments.
    pub fn encode_mappings(&self) -> String {
        let mut out = String::with_capacity(self.mappings.len() * 6);
        let mut line = 0;
        let mut prev_col: i64 = 0;
        let mut prev_source: i64 = 0;
        let mut prev_line: i64 = 0;
        let mut prev_orig_col: i64 = 0;
        let mut prev_name: i64 = 0;

        for (i, m) in self.mappings.iter().enumerate() {
            if m.generated.line != line {
                for _ in line..m.generated.line {
                    out.push(';');
                }
                line = m.generated.line;
                prev_col = 0;
            } else if i > 0 {
                out.push(',');
            }

            vlq::encode(i64::from(m.generated.col) - prev_col, &mut out);
            prev_col = i64::from(m.generated.col);

            vlq::encode(i64::from(m.source) - prev_source, &mut out);
            prev_source = i64::from(m.source);

            vlq::encode(i64::from(m.original.line) - prev_line, &mut out);
            prev_line = i64::from(m.original.line);

            vlq::encode(i64::from(m.original.col) - prev_orig_col, &mut out);
            prev_orig_col = i64::from(m.original.col);

            if let Some(name) = m.name {
                vlq::encode(i64::from(name) - prev_name, &mut out);
                prev_name = i64::from(name);
            }
        }

        out
    }

    /// Serializes the map as v3 JSON.
    pub fn to_json(&self) -> String {
        let raw = RawSourceMap {
            version: Self::VERSION,
            file: self.file.clone(),
            sources: self.sources.clone(),
            names: self.names.clone(),
            mappings: self.encode_mappings(),
        };
        // Strings and integers only, serialization cannot fail
        serde_json::to_string(&raw).unwrap_or_default()
    }

    /// Encodes the map as a `data:` URL for an inline `sourceMappingURL`
    /// comment.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:application/json;charset=utf-8;base64,{}",
            STANDARD.encode(self.to_json())
        )
    }

    /// Parses a v3 JSON map.
    ///
    /// Segments without an original position carry no information for
    /// lookups and are dropped.
    pub fn from_json(json: &str) -> Result<Self, SourceMapError> {
        let raw: RawSourceMap = serde_json::from_str(json)?;
        if raw.version != Self::VERSION {
            return Err(SourceMapError::UnsupportedVersion(raw.version));
        }

        let mut mappings = Vec::new();
        let mut source: i64 = 0;
        let mut orig_line: i64 = 0;
        let mut orig_col: i64 = 0;
        let mut name: i64 = 0;

        for (line, groups) in raw.mappings.split(';').enumerate() {
            let mut col: i64 = 0;
            for segment in groups.split(',').filter(|s| !s.is_empty()) {
                let fields = vlq::decode_segment(segment)?;
                advance(&mut col, fields[0], "generated column")?;
                match fields.len() {
                    1 => continue,
                    4 | 5 => {}
                    n => return Err(SourceMapError::InvalidSegment(n)),
                }

                advance(&mut source, fields[1], "source index")?;
                advance(&mut orig_line, fields[2], "original line")?;
                advance(&mut orig_col, fields[3], "original column")?;
                let named = fields.len() == 5;
                if named {
                    advance(&mut name, fields[4], "name index")?;
                }

                mappings.push(Mapping {
                    generated: LineCol::new(line as u32, to_index(col, "generated column")?),
                    original: LineCol::new(
                        to_index(orig_line, "original line")?,
                        to_index(orig_col, "original column")?,
                    ),
                    source: checked_ref(source, raw.sources.len(), "source index")?,
                    name: if named {
                        Some(checked_ref(name, raw.names.len(), "name index")?)
                    } else {
                        None
                    },
                });
            }
        }

        mappings.sort_by_key(|m| m.generated);
        Ok(Self {
            file: raw.file,
            sources: raw.sources,
            names: raw.names,
            mappings,
        })
    }
}

fn advance(acc: &mut i64, delta: i64, what: &'static str) -> Result<(), SourceMapError> {
    *acc = acc
        .checked_add(delta)
        .ok_or(SourceMapError::OutOfRange(what))?;
    Ok(())
}

fn to_index(value: i64, what: &'static str) -> Result<u32, SourceMapError> {
    u32::try_from(value).map_err(|_| SourceMapError::OutOfRange(what))
}

fn checked_ref(value: i64, len: usize, what: &'static str) -> Result<u32, SourceMapError> {
    let idx = to_index(value, what)?;
    if idx as usize >= len {
        return Err(SourceMapError::OutOfRange(what));
    }
    Ok(idx)
}

/// A builder for constructing source maps.
///
/// Mappings keep the order they are added in, then are stably sorted by
/// generated position on [`build`](Self::build).
#[derive(Debug, Default)]
pub struct SourceMapBuilder {
    file: Option<String>,
    sources: Vec<String>,
    source_ids: FxHashMap<String, u32>,
    names: Vec<String>,
    name_ids: FxHashMap<String, u32>,
    mappings: Vec<Mapping>,
}

impl SourceMapBuilder {
    /// Creates a new source map builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the generated file name.
    pub fn file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Interns a source identifier and returns its index.
    pub fn add_source(&mut self, source: &str) -> u32 {
        intern(&mut self.sources, &mut self.source_ids, source)
    }

    /// Interns a token name and returns its index.
    pub fn add_name(&mut self, name: &str) -> u32 {
        intern(&mut self.names, &mut self.name_ids, name)
    }

    /// Adds a mapping from a generated position to an original one.
    pub fn add_mapping(
        &mut self,
        generated: LineCol,
        original: LineCol,
        source: u32,
        name: Option<&str>,
    ) {
        let name = name.map(|name| self.add_name(name));
        self.mappings.push(Mapping {
            generated,
            original,
            source,
            name,
        });
    }

    /// Returns the number of mappings added so far.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Returns true if no mapping has been added.
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Builds the final source map.
    pub fn build(mut self) -> SourceMap {
        // Sort mappings by generated position for efficient lookup
        self.mappings.sort_by_key(|m| m.generated);
        SourceMap {
            file: self.file,
            sources: self.sources,
            names: self.names,
            mappings: self.mappings,
        }
    }
}

fn intern(table: &mut Vec<String>, ids: &mut FxHashMap<String, u32>, value: &str) -> u32 {
    if let Some(&id) = ids.get(value) {
        return id;
    }
    let id = table.len() as u32;
    table.push(value.to_string());
    ids.insert(value.to_string(), id);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> SourceMap {
        let mut builder = SourceMap::builder().file("foo.js");
        let src = builder.add_source("foo.vue");
        builder.add_mapping(LineCol::new(0, 0), LineCol::new(1, 0), src, Some("module"));
        builder.add_mapping(LineCol::new(0, 6), LineCol::new(1, 6), src, Some("."));
        builder.add_mapping(LineCol::new(1, 2), LineCol::new(2, 2), src, None);
        builder.build()
    }

    #[test]
    fn test_empty_source_map() {
        let map = SourceMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.encode_mappings(), "");
    }

    #[test]
    fn test_encode_mappings() {
        assert_eq!(sample().encode_mappings(), "AACAA,MAAMC;EACJ");
    }

    #[test]
    fn test_to_json() {
        insta::assert_snapshot!(
            sample().to_json(),
            @r#"{"version":3,"file":"foo.js","sources":["foo.vue"],"names":["module","."],"mappings":"AACAA,MAAMC;EACJ"}"#
        );
    }

    #[test]
    fn test_data_url() {
        let url = sample().to_data_url();
        let payload = url
            .strip_prefix("data:application/json;charset=utf-8;base64,")
            .unwrap();
        let json = String::from_utf8(STANDARD.decode(payload).unwrap()).unwrap();
        assert_eq!(SourceMap::from_json(&json).unwrap(), sample());
    }

    #[test]
    fn test_json_roundtrip() {
        let map = sample();
        let parsed = SourceMap::from_json(&map.to_json()).unwrap();
        assert_eq!(parsed, map);
    }

    #[test]
    fn test_from_json_skips_empty_lines_and_bare_segments() {
        let json = r#"{"version":3,"sources":["a.js"],"names":[],"mappings":";;C,GACA"}"#;
        let map = SourceMap::from_json(json).unwrap();
        assert_eq!(map.len(), 1);
        let mapping = map.mappings().next().unwrap();
        assert_eq!(mapping.generated, LineCol::new(2, 4));
        assert_eq!(mapping.original, LineCol::new(1, 0));
    }

    #[test]
    fn test_from_json_rejects_bad_maps() {
        assert!(matches!(
            SourceMap::from_json(r#"{"version":2,"mappings":""}"#),
            Err(SourceMapError::UnsupportedVersion(2))
        ));
        assert!(matches!(
            SourceMap::from_json(r#"{"version":3,"sources":[],"mappings":"AAAA"}"#),
            Err(SourceMapError::OutOfRange("source index"))
        ));
        assert!(matches!(
            SourceMap::from_json(r#"{"version":3,"sources":["a"],"mappings":"AA"}"#),
            Err(SourceMapError::InvalidSegment(2))
        ));
        assert!(matches!(
            SourceMap::from_json("not json"),
            Err(SourceMapError::Json(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_overflowing_deltas() {
        let json = r#"{"version":3,"sources":["a"],"names":[],"mappings":"+///////////P,+///////////P"}"#;
        assert!(matches!(
            SourceMap::from_json(json),
            Err(SourceMapError::OutOfRange("generated column"))
        ));
    }

    #[test]
    fn test_entries_resolve_names() {
        let map = sample();
        let entries: Vec<_> = map.entries().collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].source, "foo.vue");
        assert_eq!(entries[0].name, Some("module"));
        assert_eq!(entries[2].name, None);
    }

    #[test]
    fn test_names_are_interned() {
        let mut builder = SourceMapBuilder::new();
        let src = builder.add_source("a.vue");
        assert_eq!(builder.add_source("a.vue"), src);
        builder.add_mapping(LineCol::new(0, 0), LineCol::new(0, 0), src, Some("x"));
        builder.add_mapping(LineCol::new(0, 2), LineCol::new(0, 2), src, Some("x"));
        let map = builder.build();
        assert_eq!(map.names(), ["x".to_string()]);
        assert_eq!(map.sources(), ["a.vue".to_string()]);
    }

    #[test]
    fn test_lookup() {
        let map = sample();
        assert_eq!(
            map.lookup(LineCol::new(0, 3)).map(|m| m.original),
            Some(LineCol::new(1, 0))
        );
        assert_eq!(
            map.lookup(LineCol::new(0, 9)).map(|m| m.original),
            Some(LineCol::new(1, 6))
        );
        // Column before the first mapping on line 1
        assert_eq!(map.lookup(LineCol::new(1, 0)), None);
        assert_eq!(map.lookup(LineCol::new(5, 0)), None);
    }
}
