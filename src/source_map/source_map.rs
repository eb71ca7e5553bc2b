use std::fmt;

/// Index of a registered [`SourceUnit`] inside a [`SourceMap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub usize);

/// A piece of source text and the virtual path (or synthetic id) it was registered under
#[derive(Debug, Clone, PartialEq)]
pub struct SourceUnit {
    pub id: String,
    pub text: String,
    line_starts: Vec<usize>,
}

impl SourceUnit {
    pub fn new(id: &str, text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        SourceUnit {
            id: id.to_string(),
            text: text.to_string(),
            line_starts,
        }
    }

    /// 1-based line and column of a byte offset
    pub fn line_column(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.text.len());
        let line = self.line_starts.partition_point(|&s| s <= offset) - 1;
        let start = self.line_starts[line];
        let column = match self.text.get(start..offset) {
            Some(prefix) => prefix.chars().count() + 1,
            None => offset - start + 1,
        };
        (line + 1, column)
    }
}

/// `[start, end)` byte range in the preprocessed output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        SourceSpan { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Position inside an original source unit, lines and columns 1-based
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourcePosition {
    pub unit: String,
    pub line: usize,
    pub column: usize,
}

impl SourcePosition {
    pub fn new(unit: &str, line: usize, column: usize) -> Self {
        SourcePosition {
            unit: unit.to_string(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.unit, self.line, self.column)
    }
}

/// One run of output bytes produced from a single origin.
///
/// An advancing run maps output byte `output_start + k` to `source_offset + k`. A
/// non-advancing run (macro expansion output) maps every byte to `source_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingRun {
    pub output_start: usize,
    pub output_end: usize,
    pub unit: UnitId,
    pub source_offset: usize,
    pub advancing: bool,
}

/// Ordered, run-length mapping from preprocessed output back to source units
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMap {
    units: Vec<SourceUnit>,
    runs: Vec<MappingRun>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.units.clear();
        self.runs.clear();
    }

    /// Register a unit, reusing the existing id when the same unit is registered twice
    pub fn add_unit(&mut self, id: &str, text: &str) -> UnitId {
        if let Some(i) = self
            .units
            .iter()
            .position(|u| u.id == id && u.text == text)
        {
            return UnitId(i);
        }
        self.units.push(SourceUnit::new(id, text));
        UnitId(self.units.len() - 1)
    }

    pub fn unit(&self, id: UnitId) -> Option<&SourceUnit> {
        self.units.get(id.0)
    }

    pub fn units(&self) -> &[SourceUnit] {
        &self.units
    }

    pub fn runs(&self) -> &[MappingRun] {
        &self.runs
    }

    /// Append a mapping for `len` output bytes starting at `output_start`.
    ///
    /// Runs must be pushed in output order. Contiguous runs from contiguous input merge.
    pub fn push(
        &mut self,
        output_start: usize,
        len: usize,
        unit: UnitId,
        source_offset: usize,
        advancing: bool,
    ) {
        if len == 0 {
            return;
        }
        if let Some(last) = self.runs.last_mut() {
            if last.output_end == output_start && last.unit == unit && last.advancing == advancing {
                let contiguous = if advancing {
                    last.source_offset + (last.output_end - last.output_start) == source_offset
                } else {
                    last.source_offset == source_offset
                };
                if contiguous {
                    last.output_end += len;
                    return;
                }
            }
        }
        self.runs.push(MappingRun {
            output_start,
            output_end: output_start + len,
            unit,
            source_offset,
            advancing,
        });
    }

    /// Map an output byte index to `(unit, byte offset in unit)`.
    ///
    /// Indices past the last run clamp to its end so that end-of-output errors still resolve.
    pub fn convert_source_index(&self, output_index: usize) -> Option<(UnitId, usize)> {
        if self.runs.is_empty() {
            return None;
        }
        let i = self
            .runs
            .partition_point(|r| r.output_start <= output_index)
            .saturating_sub(1);
        let run = &self.runs[i];
        if !run.advancing {
            return Some((run.unit, run.source_offset));
        }
        let delta = output_index
            .saturating_sub(run.output_start)
            .min(run.output_end - run.output_start);
        Some((run.unit, run.source_offset + delta))
    }

    pub fn position_in_unit(&self, unit: UnitId, offset: usize) -> SourcePosition {
        match self.unit(unit) {
            Some(u) => {
                let (line, column) = u.line_column(offset);
                SourcePosition::new(&u.id, line, column)
            }
            None => SourcePosition::default(),
        }
    }

    pub fn source_position_of(&self, output_index: usize) -> Option<SourcePosition> {
        let (unit, offset) = self.convert_source_index(output_index)?;
        Some(self.position_in_unit(unit, offset))
    }

    /// Like [`SourceMap::source_position_of`], falling back to an empty position
    pub fn position_or_default(&self, output_index: usize) -> SourcePosition {
        self.source_position_of(output_index).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_column() {
        let unit = SourceUnit::new("a.glsl", "ab\ncd\n\nef");
        assert_eq!(unit.line_column(0), (1, 1));
        assert_eq!(unit.line_column(1), (1, 2));
        assert_eq!(unit.line_column(3), (2, 1));
        assert_eq!(unit.line_column(6), (3, 1));
        assert_eq!(unit.line_column(8), (4, 2));
    }

    #[test]
    fn test_contiguous_runs_merge() {
        let mut map = SourceMap::new();
        let u = map.add_unit("main", "abcdef");
        map.push(0, 2, u, 0, true);
        map.push(2, 3, u, 2, true);
        assert_eq!(map.runs().len(), 1);
        assert_eq!(map.runs()[0].output_end, 5);

        // gap in the input starts a new run
        map.push(5, 1, u, 5, true);
        assert_eq!(map.runs().len(), 1);
        map.push(6, 1, u, 0, true);
        assert_eq!(map.runs().len(), 2);
    }

    #[test]
    fn test_non_advancing_runs() {
        let mut map = SourceMap::new();
        let main = map.add_unit("main", "X + y\n");
        map.push(0, 5, main, 0, false);
        map.push(5, 5, main, 1, true);
        assert_eq!(map.convert_source_index(3), Some((main, 0)));
        assert_eq!(map.convert_source_index(7), Some((main, 3)));
    }

    #[test]
    fn test_lookup_across_units() {
        let mut map = SourceMap::new();
        let main = map.add_unit("main", "line1\n#include \"b\"\nline3\n");
        let b = map.add_unit("b.glsl", "first\nsecond\n");
        map.push(0, 6, main, 0, true);
        map.push(6, 13, b, 0, true);
        map.push(19, 6, main, 20, true);

        let p = map.source_position_of(13).unwrap();
        assert_eq!(p.unit, "b.glsl");
        assert_eq!(p.line, 2);
        assert_eq!(p.column, 2);

        let p = map.source_position_of(20).unwrap();
        assert_eq!(p.unit, "main");
        assert_eq!(p.line, 3);

        // clamps past the end
        let p = map.source_position_of(1000).unwrap();
        assert_eq!(p.unit, "main");
    }

    #[test]
    fn test_empty_map() {
        let map = SourceMap::new();
        assert!(map.source_position_of(0).is_none());
        assert_eq!(map.position_or_default(4), SourcePosition::default());
    }
}
