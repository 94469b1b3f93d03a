use crate::seqio::{list_fasta_files, read_fasta, write_fasta, FastaRecord, DEFAULT_LINE_WIDTH};
use anyhow::{anyhow, Context, Result};
use clap::Args;
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

/// Filter every FASTA file of a directory by sequence length.
#[derive(Args, Debug, Clone)]
pub struct LengthFilterArgs {
    /// Input directory containing FASTA files (.fa, .faa, .fasta)
    #[arg(short = 'i', long = "input-dir", value_name = "DIR")]
    pub input_dir: PathBuf,

    /// Output directory for the length-filtered FASTA files
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Minimum sequence length to keep (inclusive)
    #[arg(long = "min-len", default_value_t = 50)]
    pub min_len: usize,

    /// Maximum sequence length to keep (inclusive)
    #[arg(long = "max-len", default_value_t = 100_000)]
    pub max_len: usize,
}

/// Per-file outcome: records read and records written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterCounts {
    pub read: usize,
    pub kept: usize,
}

/// Keep records with `min_len <= len <= max_len`. Nothing is written when no record survives.
pub fn filter_file(input: &Path, output: &Path, min_len: usize, max_len: usize) -> Result<FilterCounts> {
    let records = read_fasta(input)?;
    let kept: Vec<FastaRecord<'_>> = records
        .iter()
        .filter(|r| (min_len..=max_len).contains(&r.seq.len()))
        .map(|r| FastaRecord { header: r.header.clone(), seq: r.seq.as_slice() })
        .collect();

    if kept.is_empty() {
        debug!("No records kept for {} after length filtering", input.display());
    } else {
        write_fasta(&kept, output, DEFAULT_LINE_WIDTH)?;
    }
    Ok(FilterCounts { read: records.len(), kept: kept.len() })
}

/// Execute the `length-filter` subcommand.
pub fn run(args: LengthFilterArgs) -> Result<()> {
    if args.min_len > args.max_len {
        return Err(anyhow!("--min-len must be <= --max-len"));
    }
    if !args.input_dir.is_dir() {
        return Err(anyhow!("Input directory '{}' not found", args.input_dir.display()));
    }
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create output directory {}", args.output_dir.display()))?;

    let files = list_fasta_files(&args.input_dir)?;
    if files.is_empty() {
        return Err(anyhow!("No FASTA files (.fasta, .faa, .fa) found in '{}'", args.input_dir.display()));
    }
    info!("Found {} FASTA files to process", files.len());
    info!("Length filter: {} <= length <= {}", args.min_len, args.max_len);

    let mut total = FilterCounts::default();
    let mut failed = 0usize;
    for (i, input) in files.iter().enumerate() {
        let Some(name) = input.file_name() else { continue };
        let output = args.output_dir.join(name);
        debug!("Processing file {}/{}: {}", i + 1, files.len(), input.display());
        match filter_file(input, &output, args.min_len, args.max_len) {
            Ok(counts) => {
                total.read += counts.read;
                total.kept += counts.kept;
            }
            Err(e) => {
                error!("Error processing {}: {:#}", input.display(), e);
                failed += 1;
            }
        }
    }

    info!("Processed {} input files", files.len());
    info!("Total sequences read: {}", total.read);
    info!("Total sequences kept (length {}-{}): {}", args.min_len, args.max_len, total.kept);
    if total.read > 0 {
        info!("Kept approximately {:.1}% of the sequences", total.kept as f64 / total.read as f64 * 100.0);
    }
    info!("Filtered FASTA files are in: {}", args.output_dir.display());

    if failed > 0 {
        warn!("Encountered errors while processing {} files", failed);
        return Err(anyhow!("{} of {} files failed", failed, files.len()));
    }
    Ok(())
}
