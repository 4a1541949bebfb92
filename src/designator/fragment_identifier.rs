use crate::error::DesignatorError;
use std::fmt::Display;
use std::str::FromStr;

const SEPARATOR: char = '\\';

/// A path-like key locating a level inside one document, like `\chapter\section`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentIdentifier {
    segments: Vec<String>,
}

impl FragmentIdentifier {
    pub fn new<I, S>(segments: I) -> Result<Self, DesignatorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(DesignatorError::NoSegment);
        }
        if segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(DesignatorError::BlankSegment);
        }
        Ok(FragmentIdentifier { segments })
    }

    pub fn from_segment(segment: impl Into<String>) -> Result<Self, DesignatorError> {
        Self::new([segment.into()])
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segment_at(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    pub fn parent(&self) -> Option<FragmentIdentifier> {
        if self.segments.len() > 1 {
            Some(FragmentIdentifier {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            })
        } else {
            None
        }
    }

    /// True if `other` is exactly one segment deeper and starts with all of these segments.
    pub fn is_parent_of(&self, other: &FragmentIdentifier) -> bool {
        other.segments.len() == self.segments.len() + 1
            && other.segments.starts_with(&self.segments)
    }

    /// Form used in documents for absolute identifiers: `\\first\second`.
    pub fn absolute_representation(&self) -> String {
        format!("{SEPARATOR}{self}")
    }
}

impl Display for FragmentIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for segment in &self.segments {
            write!(f, "{SEPARATOR}{segment}")?;
        }
        Ok(())
    }
}

/// Accepts `segment`, `\segment` or `\\first\second`.
impl FromStr for FragmentIdentifier {
    type Err = DesignatorError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let bare = text.trim_start_matches(SEPARATOR);
        if bare.is_empty() {
            return Err(DesignatorError::NoSegment);
        }
        Self::new(bare.split(SEPARATOR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_representations() {
        let identifier = FragmentIdentifier::new(["chapter", "section"]).unwrap();
        assert_eq!(identifier.to_string(), "\\chapter\\section");
        assert_eq!(identifier.absolute_representation(), "\\\\chapter\\section");
        assert_eq!(identifier.segment_count(), 2);
        assert_eq!(identifier.segment_at(1), Some("section"));
    }

    #[test]
    fn test_parse_all_forms() {
        let expected = FragmentIdentifier::new(["a", "b"]).unwrap();
        assert_eq!("\\\\a\\b".parse::<FragmentIdentifier>().unwrap(), expected);
        assert_eq!("\\a\\b".parse::<FragmentIdentifier>().unwrap(), expected);
        assert_eq!("a\\b".parse::<FragmentIdentifier>().unwrap(), expected);
    }

    #[test]
    fn test_rejects_blank_segments() {
        assert_eq!(
            FragmentIdentifier::new(Vec::<String>::new()),
            Err(DesignatorError::NoSegment)
        );
        assert_eq!(
            FragmentIdentifier::new(["a", " "]),
            Err(DesignatorError::BlankSegment)
        );
        assert_eq!("\\\\".parse::<FragmentIdentifier>(), Err(DesignatorError::NoSegment));
        assert_eq!("\\a\\\\b".parse::<FragmentIdentifier>(), Err(DesignatorError::BlankSegment));
    }

    #[test]
    fn test_parenthood() {
        let parent = FragmentIdentifier::from_segment("a").unwrap();
        let child = FragmentIdentifier::new(["a", "b"]).unwrap();
        assert!(parent.is_parent_of(&child));
        assert!(!child.is_parent_of(&parent));
        assert_eq!(child.parent(), Some(parent.clone()));
        assert_eq!(parent.parent(), None);
    }
}
