//! Input abstraction: decompressed text lines from plain,
//! gzip or zip compressed Observation RINEX
use crate::error::Error;
use flate2::read::GzDecoder;
use std::{
    fs::File,
    io::{BufRead, BufReader, Cursor, Read},
    path::Path,
};

use log::debug;

#[derive(Debug)]
pub enum BufferedReader {
    /// Readable plain RINEX
    Plain(BufReader<File>),
    /// Gzip compressed RINEX
    Gz(BufReader<GzDecoder<File>>),
    /// First observation member of a zip archive, inflated in memory
    Zip(BufReader<Cursor<Vec<u8>>>),
}

/// Member selection inside zip archives: standard observation
/// file names end in "O.rnx", "O.crx" or the V2 style "YYo".
fn is_observation_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with("o.rnx")
        || lower.ends_with("mo.rnx")
        || lower.ends_with(".obs")
        || lower
            .rsplit('.')
            .next()
            .map(|ext| ext.ends_with('o') && ext.len() == 3)
            .unwrap_or(false)
}

impl BufferedReader {
    /// Opens given local file, extension decides the decompression scheme
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let f = File::open(path)?;
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "gz" => Ok(Self::Gz(BufReader::new(GzDecoder::new(f)))),
            "zip" => {
                let mut archive = zip::ZipArchive::new(f)?;
                let names: Vec<String> = archive.file_names().map(String::from).collect();
                let member = names
                    .iter()
                    .find(|name| is_observation_name(name))
                    .ok_or(Error::NoObservationMember)?;
                debug!("zip archive: selected \"{}\"", member);
                let mut content = Vec::new();
                archive.by_name(member)?.read_to_end(&mut content)?;
                Ok(Self::Zip(BufReader::new(Cursor::new(content))))
            },
            _ => Ok(Self::Plain(BufReader::new(f))),
        }
    }
}

impl Read for BufferedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Plain(h) => h.read(buf),
            Self::Gz(h) => h.read(buf),
            Self::Zip(h) => h.read(buf),
        }
    }
}

impl BufRead for BufferedReader {
    fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
        match self {
            Self::Plain(h) => h.fill_buf(),
            Self::Gz(h) => h.fill_buf(),
            Self::Zip(h) => h.fill_buf(),
        }
    }
    fn consume(&mut self, s: usize) {
        match self {
            Self::Plain(h) => h.consume(s),
            Self::Gz(h) => h.consume(s),
            Self::Zip(h) => h.consume(s),
        }
    }
}
