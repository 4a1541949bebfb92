use super::Command;
use crate::context::CommandExecutionContext;
use crate::error::NovellaError;
use crate::problem::{Location, Problem};
use log::debug;

const KNOWN_MIME_TYPES: [&str; 6] = ["html", "pdf", "fo", "txt", "xml", "nlp"];

/// Tells which stylesheet renders the document for some output format.
#[derive(Debug, Clone)]
pub struct MapstylesheetCommand {
    location: Location,
    mappings: Vec<(String, String)>,
}

impl MapstylesheetCommand {
    /// `mappings` pairs MIME names like `html` with resource names like `dir/custom.xsl`.
    pub fn new(location: Location, mappings: Vec<(String, String)>) -> Self {
        MapstylesheetCommand { location, mappings }
    }

    pub fn mappings(&self) -> &[(String, String)] {
        &self.mappings
    }

    fn check(&self) -> Vec<Problem> {
        let mut problems = Vec::new();
        for (mime, resource) in &self.mappings {
            if !is_known_mime_type(mime) {
                problems.push(Problem::at(
                    self.location.clone(),
                    format!("Unsupported MIME type: '{mime}'"),
                ));
            }
            if !is_valid_resource_name(resource) {
                problems.push(Problem::at(
                    self.location.clone(),
                    format!("Invalid resource name: '{resource}'"),
                ));
            }
        }
        problems
    }
}

impl Command for MapstylesheetCommand {
    fn location(&self) -> &Location {
        &self.location
    }

    fn evaluate(
        &self,
        context: CommandExecutionContext,
    ) -> Result<CommandExecutionContext, NovellaError> {
        let problems = self.check();
        if !problems.is_empty() {
            return Ok(context.with_problems(problems));
        }

        let mut stylesheets = context.stylesheets().clone();
        for (mime, resource) in &self.mappings {
            let mime = mime.to_ascii_lowercase();
            if let Some(existing) = stylesheets.get(&mime) {
                let message = format!(
                    "Already mapping {mime} to {existing}; won't replace by {resource}"
                );
                return Ok(context.with_problem(Problem::at(self.location.clone(), message)));
            }
            debug!("Mapping {} to stylesheet '{}'", mime, resource);
            stylesheets.insert(mime, resource.clone());
        }
        Ok(context.with_stylesheets(stylesheets))
    }
}

fn is_known_mime_type(name: &str) -> bool {
    KNOWN_MIME_TYPES
        .iter()
        .any(|known| known.eq_ignore_ascii_case(name))
}

/// A relative path like `dir/name.xsl`, made of plain segments, with an extension.
fn is_valid_resource_name(name: &str) -> bool {
    let segments: Vec<&str> = name.split('/').collect();
    let plain = segments.iter().all(|segment| {
        !segment.is_empty()
            && *segment != "."
            && *segment != ".."
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    });
    let has_extension = segments
        .last()
        .and_then(|last| last.rsplit_once('.'))
        .is_some_and(|(stem, extension)| !stem.is_empty() && !extension.is_empty());
    plain && has_extension
}
