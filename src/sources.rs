//! The period extract files and how each one must be read.
//!
//! Format, encoding and separator vary from year to year and are looked up
//! here rather than detected. The built-in table can be replaced by a JSON
//! manifest:
//! ```json
//! [
//!   { "name": "2015S1_NB_FER", "format": "csv", "encoding": "utf8", "separator": ";" },
//!   { "name": "2023_S2_NB_FER", "format": "txt", "encoding": "utf16le", "separator": "\t" }
//! ]
//! ```

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Txt,
}

impl FileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Csv => ".csv",
            FileFormat::Txt => ".txt",
        }
    }

    pub fn default_separator(self) -> char {
        match self {
            FileFormat::Csv => ';',
            FileFormat::Txt => '\t',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceEncoding {
    Utf8,
    Utf16le,
    /// Legacy 8-bit Windows code page (often labelled "ANSI").
    #[serde(alias = "ansi")]
    Windows1252,
}

impl SourceEncoding {
    pub fn encoding(self) -> &'static encoding_rs::Encoding {
        match self {
            SourceEncoding::Utf8 => encoding_rs::UTF_8,
            SourceEncoding::Utf16le => encoding_rs::UTF_16LE,
            SourceEncoding::Windows1252 => encoding_rs::WINDOWS_1252,
        }
    }
}

/// One period extract and its read parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub format: FileFormat,
    pub encoding: SourceEncoding,
    pub separator: char,
}

impl SourceFile {
    pub fn csv(name: &str) -> Self {
        Self::new(name, FileFormat::Csv, SourceEncoding::Utf8)
    }

    pub fn txt(name: &str) -> Self {
        Self::new(name, FileFormat::Txt, SourceEncoding::Utf8)
    }

    fn new(name: &str, format: FileFormat, encoding: SourceEncoding) -> Self {
        Self {
            name: name.to_string(),
            format,
            encoding,
            separator: format.default_separator(),
        }
    }

    pub fn with_encoding(mut self, encoding: SourceEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// File name with the format's extension appended when absent.
    pub fn file_name(&self) -> String {
        let ext = self.format.extension();
        if self.name.ends_with(ext) {
            self.name.clone()
        } else {
            format!("{}{}", self.name, ext)
        }
    }
}

/// Ordered list of every extract that makes up the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceManifest {
    entries: Vec<SourceFile>,
}

impl SourceManifest {
    pub fn new(entries: Vec<SourceFile>) -> Self {
        Self { entries }
    }

    /// Loads a manifest from a JSON array on disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest '{}'", path.display()))?;
        let entries: Vec<SourceFile> = serde_json::from_str(&content)
            .with_context(|| format!("invalid manifest '{}'", path.display()))?;

        for entry in &entries {
            if !entry.separator.is_ascii() {
                bail!("separator for '{}' must be a single ASCII character", entry.name);
            }
        }

        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceFile> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SourceManifest {
    /// The 2015–2025 extracts as published.
    fn default() -> Self {
        use SourceEncoding::{Utf16le, Windows1252};

        Self::new(vec![
            SourceFile::csv("2015S1_NB_FER"),
            SourceFile::csv("2015S2_NB_FER"),
            SourceFile::txt("2016S1_NB_FER"),
            SourceFile::txt("2016S2_NB_FER"),
            SourceFile::txt("2017S1_NB_FER"),
            SourceFile::txt("2017_S2_NB_FER"),
            SourceFile::txt("2018_S1_NB_FER"),
            SourceFile::txt("2018_S2_NB_FER"),
            SourceFile::txt("2019_S1_NB_FER"),
            SourceFile::txt("2019_S2_NB_FER"),
            SourceFile::txt("2020_S1_NB_FER"),
            SourceFile::txt("2020_S2_NB_FER"),
            SourceFile::txt("2021_S1_NB_FER"),
            SourceFile::txt("2021_S2_NB_FER"),
            SourceFile::txt("2022_S1_NB_FER"),
            SourceFile::txt("2022_S2_NB_FER").with_separator(';'),
            SourceFile::txt("2023_S1_NB_FER").with_encoding(Windows1252),
            SourceFile::txt("2023_S2_NB_FER").with_encoding(Utf16le),
            SourceFile::txt("2024_S1_NB_FER").with_encoding(Windows1252),
            SourceFile::txt("2024_T3_NB_FER"),
            SourceFile::csv("2024_T4_NB_FER"),
            SourceFile::csv("2025_T1_NB_FER"),
            SourceFile::csv("2025_T2_NB_FER"),
            SourceFile::csv("2025_T3_NB_FER"),
        ])
    }
}
