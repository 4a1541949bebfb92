use crate::node_kind::NodeKind;
use crate::problem::{Location, Problem};
use crate::tree::SyntacticTree;
use crate::utils::urlify_path;
use log::debug;
use std::path::{Component, Path, PathBuf};

/// Rewrites image locations so they are relative to the base directory.
///
/// A location starting with `/` is taken from the base directory, any other from the
/// directory of the Novella. The result is written `/relative/to/base`.
pub struct ResourceRelocator {
    base_directory: PathBuf,
    novella_directory: PathBuf,
    file_name: String,
}

impl ResourceRelocator {
    pub fn new(base_directory: &Path, novella_directory: &Path, file_name: &str) -> Self {
        ResourceRelocator {
            base_directory: normalize(base_directory),
            novella_directory: normalize(novella_directory),
            file_name: file_name.to_string(),
        }
    }

    pub fn relocate(&self, tree: &SyntacticTree) -> (SyntacticTree, Vec<Problem>) {
        let mut problems = Vec::new();
        let relocated = self.relocate_tree(tree, &mut problems);
        (relocated, problems)
    }

    fn relocate_tree(&self, tree: &SyntacticTree, problems: &mut Vec<Problem>) -> SyntacticTree {
        if tree.child_count() == 0 {
            return tree.clone();
        }
        let is_image = tree.is_one_of(&[NodeKind::RasterImage, NodeKind::VectorImage]);
        let children = tree
            .children()
            .iter()
            .map(|child| {
                if is_image && child.is(NodeKind::ResourceLocation) {
                    self.relocate_location(tree, child, problems)
                } else {
                    self.relocate_tree(child, problems)
                }
            })
            .collect();
        tree.adopt(children)
    }

    fn relocate_location(
        &self,
        image: &SyntacticTree,
        resource_location: &SyntacticTree,
        problems: &mut Vec<Problem>,
    ) -> SyntacticTree {
        let name = resource_location.text().unwrap_or_default();
        let location = image
            .location()
            .cloned()
            .unwrap_or_else(|| Location::of_file(&self.file_name));
        match self.resolve(name) {
            Ok(relocated) => {
                debug!("Relocated '{}' to '{}'", name, relocated);
                SyntacticTree::with_text(NodeKind::ResourceLocation, relocated)
            }
            Err(message) => {
                problems.push(Problem::at(location, message));
                resource_location.clone()
            }
        }
    }

    fn resolve(&self, name: &str) -> Result<String, String> {
        let candidate = match name.strip_prefix('/') {
            Some(from_base) => self.base_directory.join(from_base),
            None => self.novella_directory.join(name),
        };
        let resolved = normalize(&candidate);
        let Ok(relative) = resolved.strip_prefix(&self.base_directory) else {
            return Err(format!(
                "Given resource '{}' resolved outside of '{}'",
                name,
                self.base_directory.display()
            ));
        };
        if !resolved.exists() {
            return Err(format!("Does not exist: '{}'", resolved.display()));
        }
        Ok(format!("/{}", urlify_path(relative)))
    }
}

/// Absolute form of the path with `.` and `..` resolved, without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
