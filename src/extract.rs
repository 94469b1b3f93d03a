//! Pulls the sequences listed in per-group hit files out of one reference FASTA (`extract`).

use crate::hits::group_id_from_path;
use crate::pattern::FilePattern;
use crate::seqio::{create_writer, read_fasta, write_record, Record, DEFAULT_LINE_WIDTH};
use anyhow::{anyhow, Context, Result};
use clap::Args;
use csv::{ReaderBuilder, StringRecord};
use log::{debug, error, info, warn};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Duplicate lookup keys reported individually before warnings are suppressed.
const MAX_DUPLICATE_WARNINGS: usize = 5;

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Reference FASTA containing all sequences (optionally .gz)
    #[arg(short = 'r', long = "reference", value_name = "FASTA")]
    pub reference: PathBuf,

    /// Directory containing the hit files
    #[arg(short = 'd', long = "hits-dir", value_name = "DIR")]
    pub hits_dir: PathBuf,

    /// Directory for the per-group FASTA files
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Suffix of the hit files to process
    #[arg(long = "hits-suffix", default_value = "_best_euk_hits.txt")]
    pub hits_suffix: String,

    /// Column holding the sequence ids to extract
    #[arg(long = "hits-column", default_value = "sseqid")]
    pub hits_column: String,

    /// Column holding full headers for the output; ignored when absent from a file
    #[arg(long = "header-column", default_value = "full_header")]
    pub header_column: Option<String>,
}

/// Reference sequences addressable by full id or by the id's part before the first `|`.
pub struct ReferenceIndex {
    records: Vec<Record>,
    by_id: HashMap<String, usize>,
    lookup: HashMap<String, usize>,
}

fn short_key(id: &str) -> &str {
    id.split('|').next().unwrap_or("").trim()
}

impl ReferenceIndex {
    pub fn new(records: Vec<Record>) -> Self {
        let mut by_id = HashMap::with_capacity(records.len());
        let mut lookup = HashMap::with_capacity(records.len());
        let mut duplicates = 0usize;

        for (i, rec) in records.iter().enumerate() {
            if by_id.insert(rec.id.clone(), i).is_some() {
                warn!("Reference id '{}' appears more than once; using the last occurrence", rec.id);
            }
            let key = short_key(&rec.id);
            if key.is_empty() {
                debug!("Skipping empty lookup key derived from '{}'", rec.id);
                continue;
            }
            match lookup.entry(key.to_string()) {
                Entry::Vacant(slot) => {
                    slot.insert(i);
                }
                Entry::Occupied(slot) => {
                    if duplicates < MAX_DUPLICATE_WARNINGS {
                        warn!(
                            "Lookup key '{}' derived from multiple reference ids. Keeping '{}', ignoring '{}'.",
                            key, records[*slot.get()].id, rec.id
                        );
                    } else if duplicates == MAX_DUPLICATE_WARNINGS {
                        warn!("... (suppressing further duplicate key warnings)");
                    }
                    duplicates += 1;
                }
            }
        }
        info!(
            "Built map with {} unique lookup keys ({} duplicate mappings)",
            lookup.len(),
            duplicates
        );
        Self { records, by_id, lookup }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find the reference record for a hit-file id: by lookup key, then by the id's own short key.
    pub fn find(&self, id: &str) -> Option<&Record> {
        if let Some(&i) = self.lookup.get(id) {
            return Some(&self.records[i]);
        }
        let derived = short_key(id);
        if derived != id {
            if let Some(&i) = self.lookup.get(derived) {
                debug!("Found '{}' via derived key '{}'", id, derived);
                return Some(&self.records[i]);
            }
        }
        self.by_id.get(id).map(|&i| &self.records[i])
    }
}

/// Rows of a headered hit table, with the positions of the id and header columns.
struct HitsTable {
    rows: Vec<StringRecord>,
    id_col: usize,
    header_col: Option<usize>,
}

fn read_table(path: &Path, delimiter: u8) -> Result<(StringRecord, Vec<StringRecord>)> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open hits file {}", path.display()))?;
    let headers = rdr.headers()?.clone();
    let rows = rdr.records().collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((headers, rows))
}

fn load_hits_table(path: &Path, id_column: &str, header_column: Option<&str>) -> Result<HitsTable> {
    let column = |headers: &StringRecord, name: &str| headers.iter().position(|h| h.trim() == name);

    let (mut headers, mut rows) = read_table(path, b'\t')?;
    if headers.iter().all(|h| h.trim().is_empty()) && rows.is_empty() {
        debug!("Hits file {} is empty", path.display());
        return Ok(HitsTable { rows, id_col: 0, header_col: None });
    }
    if column(&headers, id_column).is_none() {
        debug!("'{}' not found with tab separator, trying comma for {}", id_column, path.display());
        (headers, rows) = read_table(path, b',')?;
    }
    let id_col = column(&headers, id_column).ok_or_else(|| {
        anyhow!(
            "Hits file {} is missing column '{}'. Found: {:?}",
            path.display(),
            id_column,
            headers.iter().collect::<Vec<_>>()
        )
    })?;
    let header_col = header_column.and_then(|name| column(&headers, name));
    Ok(HitsTable { rows, id_col, header_col })
}

/// Output header for an extracted sequence.
fn output_header(id: &str, full_header: Option<&str>) -> String {
    match full_header.map(str::trim).filter(|h| !h.is_empty()) {
        Some(h) if h.starts_with(id) => h.to_string(),
        Some(h) => format!("{} {}", id, h),
        None => id.to_string(),
    }
}

/// Counts for one hit file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractCounts {
    pub extracted: usize,
    pub not_found: usize,
    pub unique_ids: usize,
}

/// Extract the sequences listed in one hit file. Always leaves an output file behind.
pub fn extract_for_group(
    hits_file: &Path,
    index: &ReferenceIndex,
    output_dir: &Path,
    hits_column: &str,
    header_column: Option<&str>,
) -> Result<ExtractCounts> {
    let group_id = group_id_from_path(hits_file);
    let output = output_dir.join(format!("{}_extracted_sequences.fasta", group_id));
    info!("Extracting sequences for {} from {}", group_id, hits_file.display());

    let table = load_hits_table(hits_file, hits_column, header_column)?;
    let mut w = create_writer(&output)?;
    let mut counts = ExtractCounts::default();
    let mut requested = HashSet::new();

    for (row_no, row) in table.rows.iter().enumerate() {
        let id = row.get(table.id_col).map(str::trim).unwrap_or("");
        if id.is_empty() {
            debug!("Skipping row {} of {}: no '{}'", row_no + 2, hits_file.display(), hits_column);
            continue;
        }
        requested.insert(id.to_string());

        match index.find(id) {
            Some(rec) => {
                let full = table.header_col.and_then(|c| row.get(c));
                write_record(&mut w, &output_header(id, full), &rec.seq, DEFAULT_LINE_WIDTH)?;
                counts.extracted += 1;
            }
            None => {
                warn!("ID '{}' from {} not found in the reference. Skipping.", id, hits_file.display());
                counts.not_found += 1;
            }
        }
    }
    w.flush()?;
    counts.unique_ids = requested.len();

    if counts.extracted > 0 {
        info!(
            "Saved {} sequences to {} ({} not found, {} unique ids requested)",
            counts.extracted,
            output.display(),
            counts.not_found,
            counts.unique_ids
        );
    } else {
        warn!("No sequences extracted for {}; wrote empty {}", group_id, output.display());
    }
    Ok(counts)
}

/// Execute the `extract` subcommand.
pub fn run(args: ExtractArgs) -> Result<()> {
    if !args.reference.is_file() {
        return Err(anyhow!("Reference FASTA not found: {}", args.reference.display()));
    }
    if !args.hits_dir.is_dir() {
        return Err(anyhow!("Hits directory not found: {}", args.hits_dir.display()));
    }
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create output directory {}", args.output_dir.display()))?;

    info!("Indexing reference FASTA {}", args.reference.display());
    let index = ReferenceIndex::new(read_fasta(&args.reference)?);
    if index.is_empty() {
        return Err(anyhow!("No sequences found in {}", args.reference.display()));
    }
    info!("Indexed {} sequences", index.len());

    let hits_files = FilePattern::with_suffix(&args.hits_suffix)?.find_in(&args.hits_dir)?;
    if hits_files.is_empty() {
        return Err(anyhow!(
            "No hit files matching '*{}' found in {}",
            args.hits_suffix,
            args.hits_dir.display()
        ));
    }
    info!("Found {} hit files to process", hits_files.len());

    let header_column = args.header_column.as_deref().filter(|c| !c.is_empty());
    for hits_file in &hits_files {
        if let Err(e) = extract_for_group(hits_file, &index, &args.output_dir, &args.hits_column, header_column) {
            error!("Failed to process {}: {:#}", hits_file.display(), e);
        }
    }
    info!("Finished processing {} hit files; output in {}", hits_files.len(), args.output_dir.display());
    Ok(())
}
