//! Project-scoped file manipulation
//!
//! Sequence steps may patch generated sources before a build
//! (`replace_in_file`, `insert_in_file`), copy extra sources into the
//! project tree (`add_file`, `add_folder`), and verify generated content
//! (`search_file`). All destination paths are resolved against the
//! project root.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::error::{Error, Result};
use crate::step::InsertAt;

/// Replace every occurrence of a literal string in a project file.
pub fn replace_in_file(project_root: &Path, src: &str, needle: &str, replacement: &str) -> Result<()> {
    let path = project_root.join(src);
    let content = fs::read_to_string(&path)?;
    fs::write(&path, content.replace(needle, replacement))?;
    Ok(())
}

/// Insert text into a project file at a zero-based line index or at EOF.
/// The text is inserted verbatim; multi-line insertions carry their own
/// newlines.
pub fn insert_in_file(project_root: &Path, src: &str, at: InsertAt, text: &str) -> Result<()> {
    let path = project_root.join(src);
    let content = fs::read_to_string(&path)?;

    let mut lines: Vec<&str> = content.split_inclusive('\n').collect();
    match at {
        InsertAt::Eof(_) => lines.push(text),
        InsertAt::Line(index) => {
            if index > lines.len() {
                return Err(Error::spec(format!(
                    "insert_in_file line {} is past the end of {} ({} lines)",
                    index,
                    src,
                    lines.len()
                )));
            }
            lines.insert(index, text);
        }
    }

    fs::write(&path, lines.concat())?;
    Ok(())
}

/// Copy a file or directory tree into the project. `src` is resolved from
/// the invocation directory, `dst` from the project root; intermediate
/// destination directories are created.
pub fn copy_into_project(src: &Path, project_root: &Path, dst: &str) -> Result<()> {
    let destination = project_root.join(dst);
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }

    if src.is_file() {
        fs::copy(src, &destination)?;
    } else {
        copy_tree(src, &destination)?;
    }
    Ok(())
}

fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Match a project file against a list of regexes and return the patterns
/// that did not match. Patterns are anchored at the start of the file and
/// compiled with `.` matching newlines, so they are usually written with a
/// leading `.*`.
pub fn unmatched_patterns(
    project_root: &Path,
    src: &str,
    patterns: &[String],
) -> Result<Vec<String>> {
    let content = fs::read_to_string(project_root.join(src))?;

    let mut unmatched = Vec::new();
    for pattern in patterns {
        let re = Regex::new(&format!("(?s){}", pattern))
            .map_err(|e| Error::spec(format!("invalid search_file pattern '{}': {}", pattern, e)))?;
        let matched_at_start = re.find(&content).is_some_and(|m| m.start() == 0);
        if !matched_at_start {
            unmatched.push(pattern.clone());
        }
    }
    Ok(unmatched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::EofMarker;

    fn project_with(src: &str, content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(src), content).unwrap();
        dir
    }

    #[test]
    fn test_replace_in_file() {
        let dir = project_with("hal_entry.c", "void hal_entry(void) {\n    /* TODO */\n}\n");
        replace_in_file(dir.path(), "hal_entry.c", "/* TODO */", "run_tests();").unwrap();
        let content = fs::read_to_string(dir.path().join("hal_entry.c")).unwrap();
        assert!(content.contains("run_tests();"));
        assert!(!content.contains("TODO"));
    }

    #[test]
    fn test_insert_at_line_and_eof() {
        let dir = project_with("main.c", "one\ntwo\n");

        insert_in_file(dir.path(), "main.c", InsertAt::Line(1), "inserted\n").unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("main.c")).unwrap(),
            "one\ninserted\ntwo\n"
        );

        insert_in_file(dir.path(), "main.c", InsertAt::Eof(EofMarker::Eof), "tail\n").unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("main.c")).unwrap(),
            "one\ninserted\ntwo\ntail\n"
        );
    }

    #[test]
    fn test_insert_past_end_is_a_spec_error() {
        let dir = project_with("main.c", "one\n");
        let err = insert_in_file(dir.path(), "main.c", InsertAt::Line(5), "x\n").unwrap_err();
        assert!(matches!(err, Error::Spec(_)));
    }

    #[test]
    fn test_copy_file_and_tree() {
        let dir = tempfile::tempdir().unwrap();
        let external = tempfile::tempdir().unwrap();
        fs::write(external.path().join("extra.c"), "int x;\n").unwrap();
        fs::create_dir_all(external.path().join("lib/inc")).unwrap();
        fs::write(external.path().join("lib/inc/extra.h"), "#pragma once\n").unwrap();

        copy_into_project(&external.path().join("extra.c"), dir.path(), "src/extra.c").unwrap();
        assert!(dir.path().join("src/extra.c").is_file());

        copy_into_project(&external.path().join("lib"), dir.path(), "src/lib").unwrap();
        assert!(dir.path().join("src/lib/inc/extra.h").is_file());
    }

    #[test]
    fn test_unmatched_patterns_anchor_at_file_start() {
        let dir = project_with("gen.c", "#include \"hal.h\"\nint counter = 42;\n");

        let patterns = vec![
            ".*int counter = 42;.*".to_string(),
            "int counter".to_string(), // not at file start
        ];
        let unmatched = unmatched_patterns(dir.path(), "gen.c", &patterns).unwrap();
        assert_eq!(unmatched, vec!["int counter".to_string()]);
    }
}
