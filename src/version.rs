use crate::error::VersionError;
use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;

/// A `major.minor.fix` version, or the snapshot that comes after all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    Numbered { major: u32, minor: u32, fix: u32 },
    Snapshot,
}

const SNAPSHOT: &str = "SNAPSHOT";
const PROJECT_VERSION_PLACEHOLDER: &str = "${project.version}";

impl Version {
    pub fn new(major: u32, minor: u32, fix: u32) -> Self {
        Version::Numbered { major, minor, fix }
    }

    pub fn parse(text: &str) -> Result<Self, VersionError> {
        if text == SNAPSHOT || text == PROJECT_VERSION_PLACEHOLDER {
            return Ok(Version::Snapshot);
        }
        let error = || VersionError {
            text: text.to_string(),
        };
        let mut numbers = text.split('.').map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                Err(error())
            } else {
                part.parse::<u32>().map_err(|_| error())
            }
        });
        let (Some(major), Some(minor), Some(fix), None) =
            (numbers.next(), numbers.next(), numbers.next(), numbers.next())
        else {
            return Err(error());
        };
        Ok(Version::new(major?, minor?, fix?))
    }

    pub fn is_snapshot(&self) -> bool {
        matches!(self, Version::Snapshot)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Version::Snapshot, Version::Snapshot) => Ordering::Equal,
            (Version::Snapshot, _) => Ordering::Greater,
            (_, Version::Snapshot) => Ordering::Less,
            (
                Version::Numbered { major, minor, fix },
                Version::Numbered {
                    major: other_major,
                    minor: other_minor,
                    fix: other_fix,
                },
            ) => (major, minor, fix).cmp(&(other_major, other_minor, other_fix)),
        }
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Version::Numbered { major, minor, fix } => write!(f, "{major}.{minor}.{fix}"),
            Version::Snapshot => f.write_str(SNAPSHOT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Version::parse("1.22.333").unwrap(), Version::new(1, 22, 333));
        assert!(Version::parse("SNAPSHOT").unwrap().is_snapshot());
        assert!(Version::parse("${project.version}").unwrap().is_snapshot());
    }

    #[test]
    fn test_parse_failures() {
        for text in ["", "1.2", "1.2.3.4", "a.b.c", "1.-2.3", "1..3", "snapshot"] {
            let err = Version::parse(text).unwrap_err();
            assert_eq!(err.to_string(), format!("Cannot parse version: '{text}'"));
        }
    }

    #[test]
    fn test_ordering() {
        let mut versions: Vec<Version> = ["SNAPSHOT", "1.1.2", "0.2.1", "1.0.0"]
            .iter()
            .map(|text| Version::parse(text).unwrap())
            .collect();
        versions.sort();
        let rendered: Vec<String> = versions.iter().map(Version::to_string).collect();
        assert_eq!(rendered, vec!["0.2.1", "1.0.0", "1.1.2", "SNAPSHOT"]);
    }
}
