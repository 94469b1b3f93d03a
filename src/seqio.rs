use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::warn;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// File extensions recognised as FASTA when scanning a directory.
pub const FASTA_EXTENSIONS: &[&str] = &["fasta", "faa", "fa"];

/// Output line width used by every FASTA-writing subcommand unless overridden.
pub const DEFAULT_LINE_WIDTH: usize = 60;

/// A single FASTA record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// First token of the header
    pub id: String,
    /// Full header text without the leading '>'
    pub header: String,
    /// Sequence bytes with line breaks and whitespace removed. Gap and stop
    /// characters are kept so alignments survive a round trip.
    pub seq: Vec<u8>,
}

impl Record {
    /// Header text following the id, trimmed. Empty when the header is just the id.
    pub fn description(&self) -> &str {
        self.header
            .strip_prefix(self.id.as_str())
            .unwrap_or("")
            .trim()
    }
}

fn is_gz(path: &Path) -> bool {
    path.extension().map(|e| e.eq_ignore_ascii_case("gz")).unwrap_or(false)
}

fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>> {
    let f = File::open(path)
        .with_context(|| format!("Failed to open input: {}", path.display()))?;
    if is_gz(path) {
        let gz = MultiGzDecoder::new(f);
        Ok(Box::new(BufReader::new(gz)))
    } else {
        Ok(Box::new(BufReader::new(f)))
    }
}

fn split_header(line: &str) -> (String, String) {
    let header = line[1..].trim().to_string();
    let id = header.split_whitespace().next().unwrap_or("").to_string();
    (id, header)
}

/// Parse FASTA records from any buffered reader. Lines before the first header are ignored.
pub fn parse_fasta<R: BufRead>(reader: R) -> Result<Vec<Record>> {
    let mut records: Vec<Record> = Vec::new();
    let mut current: Option<(String, String)> = None;
    let mut current_seq: Vec<u8> = Vec::new();

    for line_res in reader.lines() {
        let line = line_res?;
        if line.starts_with('>') {
            if let Some((id, header)) = current.take() {
                records.push(Record { id, header, seq: std::mem::take(&mut current_seq) });
            }
            current = Some(split_header(&line));
        } else if current.is_some() {
            current_seq.extend(line.bytes().filter(|b| !b.is_ascii_whitespace()));
        }
    }
    if let Some((id, header)) = current.take() {
        records.push(Record { id, header, seq: current_seq });
    }
    Ok(records)
}

/// Read a FASTA file, optionally gzipped.
pub fn read_fasta<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    let path_ref: &Path = path.as_ref();
    let rdr = open_maybe_gz(path_ref)?;
    parse_fasta(rdr).with_context(|| format!("Failed to parse FASTA: {}", path_ref.display()))
}

/// A small record for writing to FASTA
pub struct FastaRecord<'a> {
    pub header: String,
    pub seq: &'a [u8],
}

/// Write one record (wrapped to `line_width` chars; 0 disables wrapping).
pub fn write_record<W: Write>(w: &mut W, header: &str, seq: &[u8], line_width: usize) -> Result<()> {
    writeln!(w, ">{}", header)?;
    let lw = if line_width == 0 { usize::MAX } else { line_width };
    for chunk in seq.chunks(lw) {
        w.write_all(chunk)?;
        writeln!(w)?;
    }
    Ok(())
}

/// Create (truncating) a buffered writer, making parent directories as needed.
fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    File::create(path).with_context(|| format!("Failed to create output: {}", path.display()))
}

pub fn create_writer<P: AsRef<Path>>(path: P) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(create_file(path.as_ref())?))
}

/// Write records to a FASTA file (wrapped to `line_width` chars), gzip-compressed if the
/// path ends in `.gz`.
pub fn write_fasta<P: AsRef<Path>>(records: &[FastaRecord<'_>], path: P, line_width: usize) -> Result<()> {
    let path = path.as_ref();
    let f = create_file(path)?;
    if is_gz(path) {
        let mut w = BufWriter::new(GzEncoder::new(f, Compression::default()));
        for rec in records {
            write_record(&mut w, &rec.header, rec.seq, line_width)?;
        }
        let enc = w.into_inner().map_err(|e| e.into_error())?;
        enc.finish()?;
    } else {
        let mut w = BufWriter::new(f);
        for rec in records {
            write_record(&mut w, &rec.header, rec.seq, line_width)?;
        }
        w.flush()?;
    }
    Ok(())
}

fn has_fasta_extension(path: &Path) -> bool {
    let name = path.file_name().map(|n| n.to_string_lossy().to_ascii_lowercase()).unwrap_or_default();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    FASTA_EXTENSIONS
        .iter()
        .any(|ext| name.len() > ext.len() + 1 && name.ends_with(&format!(".{}", ext)))
}

/// List FASTA files (`.fasta`, `.faa`, `.fa`, plain or gzipped) directly inside `dir`, sorted.
pub fn list_fasta_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = BTreeSet::new();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;
    for entry in entries {
        let path = match entry {
            Ok(e) => e.path(),
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        if path.is_file() && has_fasta_extension(&path) {
            found.insert(path);
        }
    }
    Ok(found.into_iter().collect())
}
