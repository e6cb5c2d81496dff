//! Rows and the line tokenizer.
//!
//! A `Row` is an ordered list of textual fields; field positions are the
//! columns. Values are only coerced to integers on demand by the operators.

use serde::{Deserialize, Serialize};

/// One record: fields addressed by 0-based position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub fields: Vec<String>,
}

impl Row {
    pub fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// A row of `n` empty fields (outer-join padding).
    pub fn empty(n: usize) -> Self {
        Self {
            fields: vec![String::new(); n],
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.fields.get(idx).map(String::as_str)
    }

    pub fn push(&mut self, field: impl Into<String>) {
        self.fields.push(field.into());
    }

    /// Append clones of every field of `other`.
    pub fn extend_from(&mut self, other: &Row) {
        self.fields.extend(other.fields.iter().cloned());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Re-join the fields with `separator`.
    pub fn join(&self, separator: char) -> String {
        let mut buf = [0u8; 4];
        self.fields.join(separator.encode_utf8(&mut buf))
    }
}

impl From<Vec<String>> for Row {
    fn from(fields: Vec<String>) -> Self {
        Self { fields }
    }
}

impl From<Vec<&str>> for Row {
    fn from(fields: Vec<&str>) -> Self {
        Self {
            fields: fields.into_iter().map(str::to_string).collect(),
        }
    }
}

impl FromIterator<String> for Row {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Where an emitted row came from. Decides which width table formats it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowKind {
    /// A primary row passed through without join columns.
    Primary,
    /// Primary and side fields concatenated by a match.
    Joined,
    /// An unmatched side row behind empty primary padding (outer join).
    SideOnly,
}

/// A row ready for the width pass and rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRow {
    pub kind: RowKind,
    pub row: Row,
}

impl OutputRow {
    pub fn new(kind: RowKind, row: Row) -> Self {
        Self { kind, row }
    }

    /// True for rows that carry the extended (joined) schema.
    pub fn is_joined_schema(&self) -> bool {
        !matches!(self.kind, RowKind::Primary)
    }
}

/// Split `line` on any character in `separators`.
///
/// Empty fields between adjacent separators are kept, a trailing separator
/// yields a trailing empty token, and `k` separators always give `k + 1`
/// field tokens. With `keep_separators`, each separator is emitted as its own
/// one-character token between the fields.
pub fn tokenize(line: &str, separators: &[char], keep_separators: bool) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut start = 0;
    for (pos, ch) in line.char_indices() {
        if separators.contains(&ch) {
            tokens.push(line[start..pos].to_string());
            if keep_separators {
                tokens.push(ch.to_string());
            }
            start = pos + ch.len_utf8();
        }
    }
    tokens.push(line[start..].to_string());
    tokens
}

/// Row splitting on a single separator character.
pub fn split_row(line: &str, separator: char) -> Row {
    Row::new(tokenize(line, &[separator], false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn k_separators_yield_k_plus_one_fields() {
        for line in ["a", "a,b", ",", ",,", "a,,b,", "", "x,y,z,w"] {
            let k = line.matches(',').count();
            assert_eq!(tokenize(line, &[','], false).len(), k + 1, "line {line:?}");
        }
    }

    #[test]
    fn empty_and_trailing_fields_are_kept() {
        assert_eq!(tokenize("a,,b,", &[','], false), vec!["a", "", "b", ""]);
        assert_eq!(tokenize("", &[','], false), vec![""]);
        assert_eq!(tokenize("whole line", &[','], false), vec!["whole line"]);
    }

    #[test]
    fn keep_separators_interleaves_operator_tokens() {
        let ops = ['+', '-', '*', '/'];
        assert_eq!(tokenize("col0+col1", &ops, true), vec!["col0", "+", "col1"]);
        assert_eq!(tokenize("4*-2", &ops, true), vec!["4", "*", "", "-", "2"]);
    }

    #[test]
    fn separator_order_does_not_matter() {
        let a = tokenize("1+2*3", &['+', '*'], true);
        let b = tokenize("1+2*3", &['*', '+'], true);
        assert_eq!(a, b);
    }

    #[test]
    fn join_round_trips_split() {
        for line in ["1,2,3", "a,,c", "", "k1,X", "trailing,"] {
            assert_eq!(split_row(line, ',').join(','), line);
        }
        assert_eq!(split_row("a|b", '|').join('|'), "a|b");
    }

    #[test]
    fn multibyte_separator_and_fields() {
        assert_eq!(split_row("é;ü;", ';').fields, vec!["é", "ü", ""]);
        assert_eq!(split_row("a§b", '§').fields, vec!["a", "b"]);
    }
}
