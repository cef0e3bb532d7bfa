//! Path syntax shared by folder lookups and the session's working directory.
//!
//! Paths use either `/` or `\` as separator, mixed freely. Resolution is
//! segment by segment: `""` and `.` stay in place, `..` moves to the parent,
//! anything else names a child folder.

/// Characters accepted as path separators.
pub const SEPARATORS: [char; 2] = ['/', '\\'];

/// Check whether `c` is a path separator.
#[inline]
pub fn is_separator(c: char) -> bool {
    SEPARATORS.contains(&c)
}

/// Check whether a name contains any separator character.
pub fn contains_separator(name: &str) -> bool {
    name.chars().any(is_separator)
}

/// Check whether a path starts at the root (leading separator).
pub fn is_absolute(path: &str) -> bool {
    path.starts_with(is_separator)
}

/// Strip exactly one leading separator, if present.
///
/// # Examples
///
/// ```
/// use contactvault_core::tree::path::strip_root;
///
/// assert_eq!(strip_root("/work/team"), Some("work/team"));
/// assert_eq!(strip_root("\\work"), Some("work"));
/// assert_eq!(strip_root("work"), None);
/// ```
pub fn strip_root(path: &str) -> Option<&str> {
    let mut chars = path.chars();
    match chars.next() {
        Some(c) if is_separator(c) => Some(chars.as_str()),
        _ => None,
    }
}

/// Split a path at its first separator into head and optional tail.
///
/// A path without separator yields `(path, None)`. A trailing separator
/// yields an empty tail, which resolves to the folder reached so far.
pub fn split_first(path: &str) -> (&str, Option<&str>) {
    match path.find(is_separator) {
        // Separators are single-byte ASCII, so idx + 1 is a char boundary.
        Some(idx) => (&path[..idx], Some(&path[idx + 1..])),
        None => (path, None),
    }
}

/// One path segment, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// `""` or `.`
    Current,
    /// `..`
    Parent,
    /// Any other segment: the name of a child folder.
    Child(&'a str),
}

impl<'a> Segment<'a> {
    pub fn parse(segment: &'a str) -> Self {
        match segment {
            "" | "." => Segment::Current,
            ".." => Segment::Parent,
            name => Segment::Child(name),
        }
    }
}

/// Iterate over the classified segments of a relative path.
///
/// # Examples
///
/// ```
/// use contactvault_core::tree::path::{segments, Segment};
///
/// let parts: Vec<_> = segments("../work\\team").collect();
/// assert_eq!(parts, vec![Segment::Parent, Segment::Child("work"), Segment::Child("team")]);
/// ```
pub fn segments(path: &str) -> impl Iterator<Item = Segment<'_>> {
    let mut rest = Some(path);
    std::iter::from_fn(move || {
        let (head, tail) = split_first(rest?);
        rest = tail;
        Some(Segment::parse(head))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_first_without_separator() {
        assert_eq!(split_first("work"), ("work", None));
        assert_eq!(split_first(""), ("", None));
    }

    #[test]
    fn test_split_first_splits_once() {
        assert_eq!(split_first("a/b/c"), ("a", Some("b/c")));
        assert_eq!(split_first("a\\b/c"), ("a", Some("b/c")));
        assert_eq!(split_first("a/"), ("a", Some("")));
        assert_eq!(split_first("/a"), ("", Some("a")));
    }

    #[test]
    fn test_segment_classification() {
        assert_eq!(Segment::parse(""), Segment::Current);
        assert_eq!(Segment::parse("."), Segment::Current);
        assert_eq!(Segment::parse(".."), Segment::Parent);
        assert_eq!(Segment::parse("..."), Segment::Child("..."));
        assert_eq!(Segment::parse("work"), Segment::Child("work"));
    }

    #[test]
    fn test_segments_trailing_separator() {
        let parts: Vec<_> = segments("a/").collect();
        assert_eq!(parts, vec![Segment::Child("a"), Segment::Current]);
    }

    #[test]
    fn test_absolute_detection() {
        assert!(is_absolute("/"));
        assert!(is_absolute("\\a"));
        assert!(!is_absolute("a/b"));
        assert!(!is_absolute(""));
        assert_eq!(strip_root("/"), Some(""));
    }

    #[test]
    fn test_contains_separator() {
        assert!(contains_separator("a/b"));
        assert!(contains_separator("a\\b"));
        assert!(!contains_separator("a.b"));
    }
}
