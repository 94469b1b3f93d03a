use crate::seqio::{create_writer, list_fasta_files, read_fasta, write_record, DEFAULT_LINE_WIDTH};
use anyhow::{anyhow, Result};
use clap::Args;
use log::{info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_KEYWORDS: &[&str] = &[
    "hypothetical",
    "uncharacterized",
    "unknown function",
    "predicted protein",
    "conserved protein",
    "putative protein",
    "DUF",
    "unnamed protein product",
    "orf",
    "possible protein",
];

/// Concatenate a directory of FASTA files, then keep records whose annotation field is blank
/// or mentions a keyword.
#[derive(Args, Debug, Clone)]
pub struct CatFilterArgs {
    /// Input directory containing individual FASTA files (.fa, .faa, .fasta)
    #[arg(short = 'i', long = "input-dir", value_name = "DIR")]
    pub input_dir: PathBuf,

    /// Output path for the concatenated FASTA
    #[arg(short = 'c', long = "concat-output", value_name = "FASTA")]
    pub concat_output: PathBuf,

    /// Output path for the filtered FASTA subset
    #[arg(short = 'f', long = "filter-output", value_name = "FASTA")]
    pub filter_output: PathBuf,

    /// Keywords (case-insensitive) that select a record for the subset
    #[arg(short = 'k', long = "keywords", num_args = 1.., default_values_t = DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect::<Vec<_>>())]
    pub keywords: Vec<String>,

    /// Delimiter separating fields in the record id
    #[arg(long = "delimiter", default_value = "|")]
    pub delimiter: String,

    /// 0-based index of the annotation field after splitting the id by the delimiter
    #[arg(long = "name-index", default_value_t = 4)]
    pub name_index: usize,
}

/// Rule deciding which concatenated records go into the subset.
#[derive(Debug, Clone)]
pub struct HeaderFilter {
    keywords: Vec<String>,
    delimiter: String,
    name_index: usize,
}

impl HeaderFilter {
    pub fn new(keywords: &[String], delimiter: &str, name_index: usize) -> Result<Self> {
        if delimiter.is_empty() {
            return Err(anyhow!("--delimiter must not be empty"));
        }
        Ok(Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).filter(|k| !k.is_empty()).collect(),
            delimiter: delimiter.to_string(),
            name_index,
        })
    }

    /// Keep when the annotation field is blank, mentions a keyword, or the id has too few fields.
    pub fn keep(&self, id: &str) -> bool {
        match id.split(self.delimiter.as_str()).nth(self.name_index) {
            Some(field) => {
                let field = field.trim().to_lowercase();
                field.is_empty() || self.keywords.iter().any(|k| field.contains(k.as_str()))
            }
            None => {
                warn!(
                    "Header has fewer than {} fields delimited by '{}', keeping: {}",
                    self.name_index + 1,
                    self.delimiter,
                    id
                );
                true
            }
        }
    }
}

/// Concatenate all records of `files` into `output`. Returns the number of records written.
pub fn concatenate(files: &[PathBuf], output: &Path) -> Result<usize> {
    let mut w = create_writer(output)?;
    let mut written = 0usize;
    for (i, file) in files.iter().enumerate() {
        if (i + 1) % 50 == 0 || i + 1 == files.len() {
            info!("Processing file {}/{}: {}", i + 1, files.len(), file.display());
        }
        let records = match read_fasta(file) {
            Ok(r) => r,
            Err(e) => {
                warn!("Could not read {}, skipping: {:#}", file.display(), e);
                continue;
            }
        };
        for rec in &records {
            if rec.id.is_empty() || rec.seq.is_empty() {
                warn!("Skipping invalid record in {} (id: '{}')", file.display(), rec.id);
                continue;
            }
            write_record(&mut w, &rec.header, &rec.seq, DEFAULT_LINE_WIDTH)?;
            written += 1;
        }
    }
    w.flush()?;
    Ok(written)
}

/// Filter `input` into `output`. Returns (records read, records written).
pub fn filter_by_header(input: &Path, output: &Path, filter: &HeaderFilter) -> Result<(usize, usize)> {
    let records = read_fasta(input)?;
    let mut w = create_writer(output)?;
    let mut written = 0usize;
    for rec in &records {
        if filter.keep(&rec.id) {
            write_record(&mut w, &rec.header, &rec.seq, DEFAULT_LINE_WIDTH)?;
            written += 1;
        }
    }
    w.flush()?;
    Ok((records.len(), written))
}

/// Execute the `cat-filter` subcommand.
pub fn run(args: CatFilterArgs) -> Result<()> {
    let filter = HeaderFilter::new(&args.keywords, &args.delimiter, args.name_index)?;
    if !args.input_dir.is_dir() {
        return Err(anyhow!("Input directory not found: {}", args.input_dir.display()));
    }
    let files = list_fasta_files(&args.input_dir)?;
    if files.is_empty() {
        return Err(anyhow!("No FASTA files (.fasta, .faa, .fa) found in {}", args.input_dir.display()));
    }
    info!("Concatenating {} FASTA files into {}", files.len(), args.concat_output.display());
    let n = concatenate(&files, &args.concat_output)?;
    info!("Wrote {} records to {}", n, args.concat_output.display());

    info!(
        "Keeping records if field {} (delimited by '{}') is blank or contains: {}",
        args.name_index + 1,
        args.delimiter,
        args.keywords.join(", ")
    );
    let (read, written) = filter_by_header(&args.concat_output, &args.filter_output, &filter)?;
    info!("Read {} records; wrote {} matching records to {}", read, written, args.filter_output.display());
    Ok(())
}
