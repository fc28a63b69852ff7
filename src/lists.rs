//! Line-delimited list files

use crate::Result;
use anyhow::Context;
use std::fs;
use std::path::Path;

/// Read non-empty lines that are not `#` comments, trimmed
pub fn read_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;
    Ok(parse_lines(&content))
}

/// Same filtering as [`read_lines`], on text already in memory
pub fn parse_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lines_skips_blank_and_comments() {
        let content = "# HTTP sources\nhttps://a.test/list.txt\n\n   \n  https://b.test/x  \n#https://c.test\n";
        assert_eq!(
            parse_lines(content),
            vec!["https://a.test/list.txt", "https://b.test/x"]
        );
    }

    #[test]
    fn test_read_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.txt");
        fs::write(&path, "1.1.1.1:80\n\n2.2.2.2:8080\n").unwrap();
        assert_eq!(read_lines(&path).unwrap(), vec!["1.1.1.1:80", "2.2.2.2:8080"]);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_lines(dir.path().join("nope.txt")).is_err());
    }
}
