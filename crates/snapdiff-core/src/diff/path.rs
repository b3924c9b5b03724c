use std::fmt;

/// Represents a single element within a structural path.
///
/// ```
/// # use snapdiff_core::diff::PathSegment;
/// let key = PathSegment::key("name");
/// let index = PathSegment::index(2);
/// assert!(matches!(key, PathSegment::Key(_)));
/// assert!(matches!(index, PathSegment::Index(2)));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    /// Mapping field lookup, or the rendered identity of a keyed list element.
    Key(String),
    /// Positional sequence lookup.
    Index(usize),
}

impl PathSegment {
    /// Creates a key segment.
    #[must_use]
    pub fn key<S>(value: S) -> Self
    where
        S: Into<String>,
    {
        Self::Key(value.into())
    }

    /// Creates an index segment.
    #[must_use]
    pub fn index(value: usize) -> Self {
        Self::Index(value)
    }
}

/// Location of a change within a document.
///
/// Key segments are joined with dots and index segments are appended in
/// brackets, so `[key("a"), index(0), key("b")]` displays as `a[0].b`. The
/// root path displays as the empty string.
///
/// ```
/// # use snapdiff_core::diff::{Path, PathSegment};
/// let path = Path::new()
///     .with_segment(PathSegment::key("items"))
///     .with_segment(PathSegment::index(0))
///     .with_segment(PathSegment::key("price"));
/// assert_eq!(path.to_string(), "items[0].price");
/// assert_eq!(Path::new().to_string(), "");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path(Vec<PathSegment>);

impl Path {
    /// Creates an empty path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new segment, returning the extended path.
    #[must_use]
    pub fn with_segment(mut self, segment: PathSegment) -> Self {
        self.0.push(segment);
        self
    }

    /// Returns a copy of this path extended by a key segment.
    #[must_use]
    pub fn child_key<S>(&self, key: S) -> Self
    where
        S: Into<String>,
    {
        self.clone().with_segment(PathSegment::key(key))
    }

    /// Returns a copy of this path extended by an index segment.
    #[must_use]
    pub fn child_index(&self, index: usize) -> Self {
        self.clone().with_segment(PathSegment::index(index))
    }
}

impl From<PathSegment> for Path {
    fn from(value: PathSegment) -> Self {
        Self(vec![value])
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) => {
                    if idx > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_indices_have_no_separator() {
        let path = Path::from(PathSegment::key("grid")).child_index(1).child_index(2);
        assert_eq!(path.to_string(), "grid[1][2]");
    }

    #[test]
    fn keyed_identities_render_as_dotted_keys() {
        let path = Path::from(PathSegment::key("items")).child_key("42").child_key("v");
        assert_eq!(path.to_string(), "items.42.v");
    }
}
