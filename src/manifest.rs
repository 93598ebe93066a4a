use crate::error::{ClimaFetchError, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// One manifest line reduced to the file it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// 1-based position of the line in the manifest
    pub sequence: usize,
    pub filename: String,
}

/// Returns the last whitespace-separated token of a manifest line.
///
/// Leading fields (sizes, dates, permissions of an FTP listing) are ignored,
/// so `"20240101 1234 stundenwerte_TU_00003.zip"` and
/// `"stundenwerte_TU_00003.zip"` name the same file.
pub fn parse_filename(line: &str) -> Option<&str> {
    line.split_whitespace().last()
}

/// Streams entries out of a manifest file, numbering every line.
///
/// The file handle lives as long as the reader, so dropping the reader (on
/// success or on the first error) closes it.
pub struct ManifestReader {
    lines: Lines<BufReader<File>>,
    sequence: usize,
}

impl ManifestReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;

        Ok(Self {
            lines: BufReader::new(file).lines(),
            sequence: 0,
        })
    }
}

impl Iterator for ManifestReader {
    type Item = Result<ManifestEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.lines.next()? {
            Ok(line) => line,
            Err(e) => return Some(Err(ClimaFetchError::Io(e))),
        };

        self.sequence += 1;

        Some(match parse_filename(&line) {
            Some(filename) => Ok(ManifestEntry {
                sequence: self.sequence,
                filename: filename.to_string(),
            }),
            None => Err(ClimaFetchError::MalformedEntry {
                line: self.sequence,
            }),
        })
    }
}
