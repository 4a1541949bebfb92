use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Lists the files under `directory` having one of the `extensions`, in lexical order of their
/// canonical paths. Subdirectories are entered only when `recurse` is set, and never through a
/// symbolic link.
pub fn scan(directory: &Path, extensions: &[String], recurse: bool) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect(&directory.canonicalize()?, extensions, recurse, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect(
    directory: &Path,
    extensions: &[String],
    recurse: bool,
    files: &mut Vec<PathBuf>,
) -> io::Result<()> {
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();
        // Symbolic links to directories are not followed.
        if entry.file_type()?.is_dir() {
            if recurse {
                collect(&path, extensions, recurse, files)?;
            }
        } else if has_extension(&path, extensions) {
            files.push(path.canonicalize()?);
        }
    }
    Ok(())
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extensions.iter().any(|wanted| wanted == extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extensions() -> Vec<String> {
        vec!["novella".to_string(), "nlp".to_string()]
    }

    #[test]
    fn test_scan_with_and_without_recursion() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.novella"), "b").unwrap();
        fs::write(dir.path().join("a.nlp"), "a").unwrap();
        fs::write(dir.path().join("ignored.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("c.novella"), "c").unwrap();

        let names = |files: Vec<PathBuf>| -> Vec<String> {
            files
                .iter()
                .map(|file| file.file_name().unwrap().to_string_lossy().into_owned())
                .collect()
        };
        assert_eq!(
            names(scan(dir.path(), &extensions(), false).unwrap()),
            vec!["a.nlp", "b.novella"]
        );
        assert_eq!(
            names(scan(dir.path(), &extensions(), true).unwrap()),
            vec!["a.nlp", "b.novella", "c.novella"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_recursion_ignores_linked_directories() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("c.novella"), "c").unwrap();
        std::os::unix::fs::symlink(dir.path(), sub.join("loop")).unwrap();

        let files = scan(dir.path(), &extensions(), true).unwrap();
        assert_eq!(files, vec![sub.canonicalize().unwrap().join("c.novella")]);
    }
}
