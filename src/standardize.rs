//! Protein header standardization (`standardize-headers`).
//!
//! Rewrites each genome's `protein.faa` headers as `ProteinID|GenomeID|Source|AnnotationType|Name`
//! into `<GenomeID>.fasta`.

use crate::seqio::{create_writer, read_fasta, write_record};
use anyhow::{anyhow, Context, Result};
use clap::Args;
use log::{info, warn};
use regex::{Regex, RegexBuilder};
use std::io::Write;
use std::path::{Path, PathBuf};

const UNKNOWN_SOURCE: &str = "UnknownSource";

#[derive(Args, Debug, Clone)]
pub struct StandardizeArgs {
    /// Base directory containing one subdirectory per genome assembly
    #[arg(short = 'i', long = "input-dir", value_name = "DIR")]
    pub input_dir: PathBuf,

    /// Directory for the standardized FASTA files
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Protein FASTA file name inside each genome subdirectory
    #[arg(long = "faa-name", default_value = "protein.faa")]
    pub faa_name: String,

    /// Residues per output line
    #[arg(long = "line-length", default_value_t = 60)]
    pub line_length: usize,
}

/// Compiled header-cleaning rules.
pub struct HeaderCleaner {
    bracket: Regex,
    name_separators: Regex,
    source_separators: Regex,
    disallowed: Regex,
    underscores: Regex,
    generic_name: Regex,
    hypothetical: Regex,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardHeader {
    pub protein_id: String,
    pub source: String,
    pub annotated: bool,
    pub name: String,
}

impl StandardHeader {
    pub fn render(&self, genome_id: &str) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.protein_id,
            genome_id,
            self.source,
            if self.annotated { "annotated" } else { "hypothetical" },
            self.name
        )
    }
}

impl HeaderCleaner {
    pub fn new() -> Result<Self> {
        let ci = |expr: &str| RegexBuilder::new(expr).case_insensitive(true).build();
        Ok(Self {
            bracket: Regex::new(r"\[([^\]]+)\]")?,
            name_separators: Regex::new(r"[\s,;()\[\]{}:/\\]+")?,
            source_separators: Regex::new(r"[\s/]+")?,
            disallowed: Regex::new(r"[^a-zA-Z0-9_.\-]")?,
            underscores: Regex::new(r"_+")?,
            generic_name: ci(
                r"^(hypothetical_protein|unknown|predicted_protein|uncharacterized_protein|protein_of_unknown_function|possible_protein|orf|DUF.*)$",
            )?,
            hypothetical: ci(r"hypothetical|unknown|predicted|uncharacterized|domain_of_unknown_function")?,
        })
    }

    /// Cleaned content of the first `[...]`, or `UnknownSource`.
    pub fn source(&self, description: &str) -> String {
        let Some(caps) = self.bracket.captures(description) else {
            return UNKNOWN_SOURCE.to_string();
        };
        let raw = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        let joined = self.source_separators.replace_all(raw, "_");
        let cleaned = self.disallowed.replace_all(&joined, "");
        if cleaned.is_empty() {
            UNKNOWN_SOURCE.to_string()
        } else {
            cleaned.into_owned()
        }
    }

    /// Cleaned annotation name from the text before the first `[`; `None` if empty or generic.
    pub fn annotation_name(&self, description: &str) -> Option<String> {
        let desc = description.split('[').next().unwrap_or("").trim();
        if desc.is_empty() {
            return None;
        }
        let joined = self.name_separators.replace_all(desc, "_");
        let kept = self.disallowed.replace_all(&joined, "");
        let collapsed = self.underscores.replace_all(&kept, "_");
        let cleaned = collapsed.trim_matches('_');
        if cleaned.is_empty() || self.generic_name.is_match(cleaned) {
            return None;
        }
        Some(cleaned.to_string())
    }

    pub fn standardize(&self, protein_id: &str, description: &str) -> StandardHeader {
        let source = self.source(description);
        let name = if self.hypothetical.is_match(description) {
            None
        } else {
            self.annotation_name(description)
        };
        StandardHeader {
            protein_id: protein_id.to_string(),
            source,
            annotated: name.is_some(),
            name: name.unwrap_or_default(),
        }
    }
}

/// Records processed and written for one genome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenomeCounts {
    pub processed: usize,
    pub written: usize,
}

/// Rewrite one genome's protein FASTA. Returns `None` when the input file does not exist.
pub fn process_genome(
    genome_dir: &Path,
    output_dir: &Path,
    faa_name: &str,
    line_length: usize,
    cleaner: &HeaderCleaner,
) -> Result<Option<GenomeCounts>> {
    let genome_id = genome_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("Genome directory has no name: {}", genome_dir.display()))?;
    let input = genome_dir.join(faa_name);
    if !input.is_file() {
        warn!("'{}' not found in {}. Skipping genome.", faa_name, genome_dir.display());
        return Ok(None);
    }

    let records = read_fasta(&input)?;
    let mut counts = GenomeCounts { processed: records.len(), written: 0 };
    let valid: Vec<_> = records
        .iter()
        .filter(|r| {
            let ok = !r.id.is_empty() && !r.seq.is_empty();
            if !ok {
                warn!("Skipping invalid record in {} (id: '{}')", input.display(), r.id);
            }
            ok
        })
        .collect();
    if valid.is_empty() {
        return Ok(Some(counts));
    }

    let output = output_dir.join(format!("{}.fasta", genome_id));
    let mut w = create_writer(&output)?;
    for rec in valid {
        let header = cleaner.standardize(&rec.id, rec.description()).render(&genome_id);
        write_record(&mut w, &header, &rec.seq, line_length)?;
        counts.written += 1;
    }
    w.flush()?;
    Ok(Some(counts))
}

/// Execute the `standardize-headers` subcommand.
pub fn run(args: StandardizeArgs) -> Result<()> {
    if !args.input_dir.is_dir() {
        return Err(anyhow!("Input base directory not found: {}", args.input_dir.display()));
    }
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create output directory {}", args.output_dir.display()))?;
    let cleaner = HeaderCleaner::new()?;

    let mut genome_dirs: Vec<PathBuf> = std::fs::read_dir(&args.input_dir)
        .with_context(|| format!("Failed to read directory {}", args.input_dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    genome_dirs.sort();
    info!("Found {} potential genome directories in {}", genome_dirs.len(), args.input_dir.display());

    let (mut processed, mut written, mut skipped, mut failed) = (0usize, 0usize, 0usize, 0usize);
    for dir in &genome_dirs {
        match process_genome(dir, &args.output_dir, &args.faa_name, args.line_length, &cleaner) {
            Ok(Some(c)) => {
                processed += c.processed;
                written += c.written;
            }
            Ok(None) => skipped += 1,
            Err(e) => {
                warn!("Error processing {}: {:#}", dir.display(), e);
                failed += 1;
            }
        }
    }

    info!(
        "Genomes: {} found, {} skipped (no {}), {} with errors",
        genome_dirs.len(),
        skipped,
        args.faa_name,
        failed
    );
    info!("Proteins: {} read, {} written to {}", processed, written, args.output_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn annotated_protein() {
        let c = HeaderCleaner::new().unwrap();
        let h = c.standardize("WP_012.1", "DNA polymerase II [Sulfolobus acidocaldarius DSM 639]");
        assert_eq!(
            h.render("GCA_1"),
            "WP_012.1|GCA_1|Sulfolobus_acidocaldarius_DSM_639|annotated|DNA_polymerase_II"
        );
    }

    #[test]
    fn hypothetical_and_generic_names() {
        let c = HeaderCleaner::new().unwrap();
        let h = c.standardize("WP_1", "hypothetical protein [Org x]");
        assert_eq!(h.render("G"), "WP_1|G|Org_x|hypothetical|");
        let h = c.standardize("WP_2", "DUF1234 domain-containing protein");
        assert_eq!(h.render("G"), "WP_2|G|UnknownSource|hypothetical|");
        let h = c.standardize("WP_3", "");
        assert_eq!(h.render("G"), "WP_3|G|UnknownSource|hypothetical|");
    }

    #[test]
    fn name_cleaning() {
        let c = HeaderCleaner::new().unwrap();
        assert_eq!(
            c.annotation_name("ABC transporter (ATP-binding), subunit: A/B"),
            Some("ABC_transporter_ATP-binding_subunit_A_B".to_string())
        );
        assert_eq!(c.annotation_name("  orf  "), None);
        assert_eq!(c.source("x [Candidatus 'Foo' bar/baz]"), "Candidatus_Foo_bar_baz");
        assert_eq!(c.source("x [ ]"), UNKNOWN_SOURCE);
    }

    #[test]
    fn processes_genome_directories() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("genomes");
        fs::create_dir_all(base.join("GCA_1")).unwrap();
        fs::create_dir_all(base.join("GCA_2")).unwrap();
        fs::write(
            base.join("GCA_1").join("protein.faa"),
            ">WP_9.1 RecA [Org a]\nMKVLAG\n>WP_8.1 hypothetical protein\nMK\n>empty\n",
        )
        .unwrap();
        let out = dir.path().join("out");

        run(StandardizeArgs {
            input_dir: base,
            output_dir: out.clone(),
            faa_name: "protein.faa".into(),
            line_length: 4,
        })
        .unwrap();

        assert_eq!(
            fs::read_to_string(out.join("GCA_1.fasta")).unwrap(),
            ">WP_9.1|GCA_1|Org_a|annotated|RecA\nMKVL\nAG\n>WP_8.1|GCA_1|UnknownSource|hypothetical|\nMK\n"
        );
        assert!(!out.join("GCA_2.fasta").exists());
    }
}
