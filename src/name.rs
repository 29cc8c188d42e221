//! `Label` and `Name`: the DNS name model.
//!
//! Unlike the teacher's `idna`-based `Name`, labels here hold raw bytes (RFC
//! 1035 §3.1 names are opaque octet strings, not Unicode) so that a name
//! containing `\x00` or a literal space round-trips exactly.

use crate::errors::ParseError;
use crate::parse_error;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// One DNS label: 1 to 63 arbitrary bytes. The root label (length 0) is only
/// ever represented implicitly, by a [`Name`] with zero labels.
#[derive(Clone, Debug, Eq)]
pub struct Label(Vec<u8>);

impl Label {
    pub const MAX_LEN: usize = 63;

    /// Builds a label from raw bytes, enforcing the 1..=63 byte length cap.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Label, ParseError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return parse_error!("labels must be at least 1 byte long");
        }
        if bytes.len() > Self::MAX_LEN {
            return parse_error!(
                "label is {} bytes, longer than the {} byte maximum",
                bytes.len(),
                Self::MAX_LEN
            );
        }
        Ok(Label(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// ASCII-lowercases A-Z; all other bytes pass through, since
    /// case-insensitivity per RFC 1035 §2.3.3 only covers ASCII letters.
    fn fold(b: u8) -> u8 {
        if b.is_ascii_uppercase() {
            b.to_ascii_lowercase()
        } else {
            b
        }
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(other.0.iter())
                .all(|(a, b)| Label::fold(*a) == Label::fold(*b))
    }
}

impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .iter()
            .map(|b| Label::fold(*b))
            .cmp(other.0.iter().map(|b| Label::fold(*b)))
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::hash::Hash for Label {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for b in &self.0 {
            Label::fold(*b).hash(state);
        }
    }
}

/// Writes a label's presentation form: bytes `<= 0x20` or `>= 0x7F` become
/// `\DDD` (three decimal digits); literal `.` and `\` are backslash-escaped.
impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            match b {
                b'.' | b'\\' => write!(f, "\\{}", b as char)?,
                0..=0x20 | 0x7F..=0xFF => write!(f, "\\{:03}", b)?,
                _ => write!(f, "{}", b as char)?,
            }
        }
        Ok(())
    }
}

/// Parses one label from its presentation form, reversing `Display`'s
/// escaping. `s` must not itself contain an unescaped '.'.
fn unescape_label(s: &str) -> Result<Vec<u8>, ParseError> {
    let mut out = Vec::with_capacity(s.len());
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 1;
            if i >= bytes.len() {
                return parse_error!("trailing escape character in label '{}'", s);
            }
            if bytes[i].is_ascii_digit() {
                if i + 2 >= bytes.len() {
                    return parse_error!("truncated \\DDD escape in label '{}'", s);
                }
                let digits = &s[i..i + 3];
                let val: u16 = digits
                    .parse()
                    .map_err(|_| ParseError::Message(format!("bad \\DDD escape '{}'", digits)))?;
                if val > 255 {
                    return parse_error!("\\DDD escape '{}' out of byte range", digits);
                }
                out.push(val as u8);
                i += 3;
            } else {
                out.push(bytes[i]);
                i += 1;
            }
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// A fully qualified (or relative, during zone-tree manipulation) DNS name:
/// an ordered sequence of [`Label`]s. The root name is the empty sequence.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Name {
    labels: Vec<Label>,
}

impl Name {
    /// The root name (".").
    pub fn root() -> Name {
        Name { labels: Vec::new() }
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn from_labels(labels: Vec<Label>) -> Name {
        Name { labels }
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn push_front(&mut self, label: Label) {
        self.labels.insert(0, label);
    }

    pub fn push_back(&mut self, label: Label) {
        self.labels.push(label);
    }

    pub fn pop_front(&mut self) -> Option<Label> {
        if self.labels.is_empty() {
            None
        } else {
            Some(self.labels.remove(0))
        }
    }

    /// Wire-form length in bytes, including each label's length octet and
    /// the trailing root octet. Used to enforce the 255-byte name cap.
    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }

    /// True iff `root`'s labels are a suffix of `self`'s labels, i.e. `self`
    /// is `root` or a descendant of it.
    pub fn is_part_of(&self, root: &Name) -> bool {
        if root.labels.len() > self.labels.len() {
            return false;
        }
        let offset = self.labels.len() - root.labels.len();
        self.labels[offset..] == root.labels[..]
    }

    /// If `self.is_part_of(root)`, drops that suffix and returns `true`;
    /// otherwise leaves `self` untouched and returns `false`.
    pub fn make_relative(&mut self, root: &Name) -> bool {
        if !self.is_part_of(root) {
            return false;
        }
        let offset = self.labels.len() - root.labels.len();
        self.labels.truncate(offset);
        true
    }

    /// Concatenates `self` (relative) with `suffix` (typically a zone apex),
    /// yielding an absolute name.
    pub fn joined(&self, suffix: &Name) -> Name {
        let mut labels = self.labels.clone();
        labels.extend(suffix.labels.iter().cloned());
        Name { labels }
    }

    pub fn parse_presentation(s: &str) -> Result<Name, ParseError> {
        Name::from_str(s)
    }
}

impl From<&[Label]> for Name {
    fn from(labels: &[Label]) -> Name {
        Name {
            labels: labels.to_vec(),
        }
    }
}

impl std::ops::Add for Name {
    type Output = Name;

    fn add(mut self, rhs: Name) -> Name {
        self.labels.extend(rhs.labels);
        self
    }
}

impl std::ops::AddAssign for Name {
    fn add_assign(&mut self, rhs: Name) {
        self.labels.extend(rhs.labels);
    }
}

impl FromStr for Name {
    type Err = ParseError;

    /// Parses a presentation-form name: labels joined by unescaped '.',
    /// with `\DDD` and `\X` escapes reversed per label. "." and "" both
    /// parse to the root name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s == "." {
            return Ok(Name::root());
        }

        let mut labels = Vec::new();
        let mut current = String::new();
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    current.push(c);
                    if let Some(next) = chars.next() {
                        current.push(next);
                        if next.is_ascii_digit() {
                            for _ in 0..2 {
                                if let Some(d) = chars.next() {
                                    current.push(d);
                                }
                            }
                        }
                    }
                }
                '.' => {
                    labels.push(Label::new(unescape_label(&current)?)?);
                    current.clear();
                }
                _ => current.push(c),
            }
        }
        if !current.is_empty() {
            labels.push(Label::new(unescape_label(&current)?)?);
        }

        let name = Name { labels };
        if name.wire_len() > 255 {
            return parse_error!("name '{}' is longer than 255 bytes on the wire", s);
        }
        Ok(name)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            return write!(f, ".");
        }
        for label in &self.labels {
            write!(f, "{}.", label)?;
        }
        Ok(())
    }
}

impl Ord for Name {
    /// Root-first lexical order by label, matching zone-tree child ordering
    /// (AXFR `next()`/`prev()` traversal walks names in this order).
    fn cmp(&self, other: &Self) -> Ordering {
        self.labels.iter().rev().cmp(other.labels.iter().rev())
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_equality() {
        let a = Name::from_str("WWW.Example.COM").unwrap();
        let b = Name::from_str("www.example.com").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn root_round_trips() {
        assert_eq!(Name::root().to_string(), ".");
        assert_eq!(Name::from_str(".").unwrap(), Name::root());
        assert_eq!(Name::from_str("").unwrap(), Name::root());
    }

    #[test]
    fn presentation_round_trip_simple() {
        let n = Name::from_str("a.b.com.").unwrap();
        assert_eq!(n.to_string(), "a.b.com.");
    }

    #[test]
    fn presentation_round_trip_escapes() {
        let label = Label::new(vec![0u8, b'.', b'\\', b' ', 200]).unwrap();
        let name = Name::from_labels(vec![label.clone()]);
        let printed = name.to_string();
        let reparsed = Name::from_str(&printed).unwrap();
        assert_eq!(reparsed.labels()[0], label);
    }

    #[test]
    fn is_part_of_and_make_relative() {
        let root = Name::from_str("example.com").unwrap();
        let mut a = Name::from_str("www.example.com").unwrap();
        assert!(a.is_part_of(&root));
        let saved = a.clone();
        assert!(a.make_relative(&root));
        assert_eq!(a.joined(&root), saved);
    }

    #[test]
    fn make_relative_false_when_not_suffix() {
        let root = Name::from_str("example.com").unwrap();
        let mut other = Name::from_str("example.org").unwrap();
        let saved = other.clone();
        assert!(!other.make_relative(&root));
        assert_eq!(other, saved);
    }

    #[test]
    fn label_too_long_rejected() {
        let long = vec![b'a'; 64];
        assert!(Label::new(long).is_err());
    }

    #[test]
    fn name_too_long_rejected() {
        let labels: Vec<String> = (0..10).map(|_| "a".repeat(50)).collect();
        assert!(Name::from_str(&labels.join(".")).is_err());
    }
}
