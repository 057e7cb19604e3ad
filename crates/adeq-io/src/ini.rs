//! Minimal reader for the INI-like section files used by cluster catalogs
//! and additional constraints.
//!
//! Supported syntax: `[section]` headers, `key = value` properties, `;` or
//! `#` comment lines. Keys keep their declaration order; duplicate keys are
//! kept as separate properties.

use std::fs;
use std::path::Path;

use adeq_core::{CoreError, CoreResult};

#[derive(Debug, Clone, Default)]
pub struct IniSection {
    pub name: String,
    pub properties: Vec<(String, String)>,
}

impl IniSection {
    /// First value of a key, if any.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct IniFile {
    pub sections: Vec<IniSection>,
}

impl IniFile {
    pub fn parse(content: &str) -> CoreResult<Self> {
        let mut file = IniFile::default();
        for (line_no, raw_line) in content.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some(header) = line.strip_prefix('[') {
                let Some(name) = header.strip_suffix(']') else {
                    return Err(CoreError::InvalidInput(format!(
                        "line {}: unterminated section header `{raw_line}`",
                        line_no + 1
                    )));
                };
                file.sections.push(IniSection {
                    name: name.trim().to_string(),
                    properties: Vec::new(),
                });
            } else if let Some((key, value)) = line.split_once('=') {
                let Some(section) = file.sections.last_mut() else {
                    return Err(CoreError::InvalidInput(format!(
                        "line {}: property `{}` outside any section",
                        line_no + 1,
                        key.trim()
                    )));
                };
                section
                    .properties
                    .push((key.trim().to_string(), value.trim().to_string()));
            } else {
                return Err(CoreError::InvalidInput(format!(
                    "line {}: expected `key = value`, found `{raw_line}`",
                    line_no + 1
                )));
            }
        }
        Ok(file)
    }

    /// Read and parse a file. A missing file is `Ok(None)` so optional
    /// inputs can be skipped quietly.
    pub fn open(path: &Path) -> CoreResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content).map(Some)
    }
}
