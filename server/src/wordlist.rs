//! Named word lists that sessions draw their words from
//!
//! Lists are loaded once at startup from a directory of `*.txt` files, one
//! word per line. The file stem becomes the list name.

use log::{info, warn};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct WordLists {
    lists: HashMap<String, Arc<[String]>>,
}

impl WordLists {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every `*.txt` file in `dir`
    ///
    /// Blank lines and lines starting with `#` are skipped. Each list is
    /// de-duplicated and sorted so its order does not depend on the file.
    pub fn load_dir(dir: &Path) -> io::Result<Self> {
        let mut lists = Self::new();

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                warn!("Skipping word list with unreadable name: {}", path.display());
                continue;
            };

            let contents = fs::read_to_string(&path)?;
            let words = parse_words(&contents);
            info!("Loaded word list {} ({} words)", name, words.len());
            lists.insert(name, words);
        }

        Ok(lists)
    }

    pub fn insert(&mut self, name: impl Into<String>, words: Vec<String>) {
        self.lists.insert(name.into(), words.into());
    }

    pub fn get(&self, name: &str) -> Option<Arc<[String]>> {
        self.lists.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

fn parse_words(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_words() {
        let words = parse_words("zebra\n\n  apple \n# comment\napple\nmango\n");
        assert_eq!(words, vec!["apple", "mango", "zebra"]);
    }

    #[test]
    fn test_load_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path();
        fs::write(path.join("green.txt"), "one\ntwo\nthree\n").unwrap();
        fs::write(path.join("duet.txt"), "alpha\nbeta\n").unwrap();
        fs::write(path.join("notes.md"), "ignored\n").unwrap();

        let lists = WordLists::load_dir(path).unwrap();
        assert_eq!(lists.len(), 2);
        assert_eq!(&*lists.get("green").unwrap(), &["one", "three", "two"]);
        assert!(lists.get("notes").is_none());
    }

    #[test]
    fn test_load_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(WordLists::load_dir(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_insert_and_get() {
        let mut lists = WordLists::new();
        assert!(lists.is_empty());
        lists.insert("small", vec!["a".to_string(), "b".to_string()]);
        assert_eq!(lists.get("small").unwrap().len(), 2);
    }
}
