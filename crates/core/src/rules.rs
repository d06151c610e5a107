//! A flat `key = value` configuration file (the on-disk analogue of the
//! original `.timewarrior/timewarrior.cfg`). No hierarchical sections: a
//! dotted key like `reports.week.summary` is just a string key.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct Rules {
    values: HashMap<String, String>,
}

impl Rules {
    pub fn empty() -> Rules {
        Rules {
            values: HashMap::new(),
        }
    }

    /// Parses `path`, skipping blank lines and `#`-comments. Lines must be
    /// `key = value`; the value may be empty.
    pub fn load(path: &Path) -> Result<Rules> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Rules::empty()),
            Err(e) => {
                return Err(Error::Io {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        let mut values = HashMap::new();
        for (line_no, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| Error::Parse {
                path: path.to_path_buf(),
                line: line_no + 1,
                field: "rule",
                detail: format!("expected 'key = value', got {line:?}"),
            })?;
            values.insert(key.trim().to_string(), value.trim().to_string());
        }

        Ok(Rules { values })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Truthy values are `1`, `yes`, `true`, `on` (case-insensitive);
    /// anything else, or an absent key, falls back to `default`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "yes" | "true" | "on"),
            None => default,
        }
    }
}
