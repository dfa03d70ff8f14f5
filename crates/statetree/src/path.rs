//! Dotted attribute paths with numeric list indexes

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// One step of an [`AttrPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Path to an attribute, such as `spec.containers.0.image`.
///
/// Numeric segments address list elements. The empty path addresses the
/// root and displays as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AttrPath {
    segments: Vec<Segment>,
}

impl AttrPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a key segment
    #[must_use]
    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(key.to_string()));
        Self { segments }
    }

    /// Append an index segment
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }

    /// Append every segment of `other`
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }
}

impl FromStr for AttrPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let segments = s
            .split('.')
            .map(|part| {
                if part.is_empty() {
                    return Err(Error::InvalidPath {
                        path: s.to_string(),
                        reason: "empty segment".to_string(),
                    });
                }
                Ok(match part.parse::<usize>() {
                    Ok(index) => Segment::Index(index),
                    Err(_) => Segment::Key(part.to_string()),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { segments })
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keys_and_indexes() {
        let path: AttrPath = "spec.containers.2.image".parse().unwrap();
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("spec".to_string()),
                Segment::Key("containers".to_string()),
                Segment::Index(2),
                Segment::Key("image".to_string()),
            ]
        );
        assert_eq!(path.to_string(), "spec.containers.2.image");
    }

    #[test]
    fn test_empty_is_root() {
        let path: AttrPath = "".parse().unwrap();
        assert!(path.is_root());
        assert_eq!(path.to_string(), "");
    }

    #[test]
    fn test_empty_segment_rejected() {
        let err = "spec..image".parse::<AttrPath>().unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
        assert!("spec.".parse::<AttrPath>().is_err());
    }

    #[test]
    fn test_builders() {
        let base: AttrPath = "spec".parse().unwrap();
        let path = base.child("containers").index(0).child("image");
        assert_eq!(path.to_string(), "spec.containers.0.image");

        let suffix: AttrPath = "image".parse().unwrap();
        assert_eq!(
            base.child("containers").index(1).join(&suffix).to_string(),
            "spec.containers.1.image"
        );
    }
}
