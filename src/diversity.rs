//! Hill diversity (order 1) of alignments and trees (`hill-diversity`).
//!
//! For each orthogroup alignment `<og>_trimmed.fasta`, the mean per-column Hill number is
//! reported; if the matching tree `<og>_fasttree.nwk` exists, the Hill number of its branch
//! length distribution is reported as well. Hill number of order 1 is `exp(H)` where `H` is the
//! Shannon entropy.

use crate::newick::{read_newick, Node};
use crate::pattern::FilePattern;
use crate::seqio::{create_writer, read_fasta};
use anyhow::{anyhow, Result};
use clap::Args;
use log::{info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Added to every branch length so zero-length branches stay in the distribution.
pub const BRANCH_EPSILON: f64 = 1e-10;
/// Number of amino-acid states used to normalise alignment diversity.
pub const AMINO_ACID_STATES: f64 = 20.0;

#[derive(Args, Debug, Clone)]
pub struct HillDiversityArgs {
    /// Directory with trimmed alignments
    #[arg(short = 'a', long = "alignments-dir", value_name = "DIR")]
    pub alignments_dir: PathBuf,

    /// Directory with Newick trees
    #[arg(short = 't', long = "trees-dir", value_name = "DIR")]
    pub trees_dir: PathBuf,

    /// Output CSV
    #[arg(short = 'o', long = "output", value_name = "CSV")]
    pub output: PathBuf,

    /// Alignment file suffix; the rest of the name is the orthogroup id
    #[arg(long = "alignment-suffix", default_value = "_trimmed.fasta")]
    pub alignment_suffix: String,

    /// Tree file suffix appended to the orthogroup id
    #[arg(long = "tree-suffix", default_value = "_fasttree.nwk")]
    pub tree_suffix: String,
}

fn entropy<I: IntoIterator<Item = f64>>(proportions: I) -> f64 {
    -proportions.into_iter().filter(|&p| p > 0.0).map(|p| p * p.ln()).sum::<f64>()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeDiversity {
    pub hill: Option<f64>,
    pub norm_by_tips: Option<f64>,
    pub norm_by_pd: Option<f64>,
    pub n_tips: usize,
    pub entropy: Option<f64>,
}

/// Hill diversity of a tree's branch-length distribution.
pub fn tree_diversity(tree: &Node, epsilon: f64) -> TreeDiversity {
    let n_tips = tree.tip_count();
    let branches = tree.branch_lengths();
    let total: f64 = branches.iter().map(|b| b + epsilon).sum();
    if branches.is_empty() || total <= 0.0 {
        return TreeDiversity { n_tips, ..Default::default() };
    }

    let h = entropy(branches.iter().map(|b| (b + epsilon) / total));
    let hill = h.exp();
    let pd: f64 = branches.iter().sum();
    TreeDiversity {
        hill: Some(hill),
        norm_by_tips: (n_tips > 0).then(|| hill / n_tips as f64),
        norm_by_pd: (pd > 0.0).then(|| hill / pd),
        n_tips,
        entropy: Some(h),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MsaDiversity {
    pub column_hill: Vec<f64>,
    pub mean: Option<f64>,
    pub normalized: Option<f64>,
}

/// Per-column Hill diversity of an alignment. Gaps (`-`, `.`) and stops (`*`) are ignored and
/// an all-gap column counts as 1.
pub fn msa_diversity(rows: &[&[u8]]) -> Result<MsaDiversity> {
    let Some(first) = rows.first() else {
        return Ok(MsaDiversity::default());
    };
    let width = first.len();
    if let Some(bad) = rows.iter().position(|r| r.len() != width) {
        return Err(anyhow!(
            "Alignment rows differ in length (row 1 has {}, row {} has {})",
            width,
            bad + 1,
            rows[bad].len()
        ));
    }
    if width == 0 {
        return Ok(MsaDiversity::default());
    }

    let mut column_hill = Vec::with_capacity(width);
    let mut counts: HashMap<u8, usize> = HashMap::new();
    for col in 0..width {
        counts.clear();
        let mut total = 0usize;
        for row in rows {
            let c = row[col].to_ascii_uppercase();
            if !matches!(c, b'-' | b'.' | b'*') {
                *counts.entry(c).or_default() += 1;
                total += 1;
            }
        }
        let hill = if total == 0 {
            1.0
        } else {
            entropy(counts.values().map(|&n| n as f64 / total as f64)).exp()
        };
        column_hill.push(hill);
    }

    let mean = column_hill.iter().sum::<f64>() / column_hill.len() as f64;
    let normalized = ((mean - 1.0) / (AMINO_ACID_STATES - 1.0)).clamp(0.0, 1.0);
    Ok(MsaDiversity { column_hill, mean: Some(mean), normalized: Some(normalized) })
}

/// One output row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiversityRow {
    #[serde(rename = "OG_ID")]
    pub og_id: String,
    #[serde(rename = "Tree_n_tips")]
    pub tree_n_tips: Option<usize>,
    #[serde(rename = "Tree_Hill_diversity")]
    pub tree_hill: Option<f64>,
    #[serde(rename = "Tree_Norm_by_tips")]
    pub tree_norm_by_tips: Option<f64>,
    #[serde(rename = "Tree_Norm_by_PD")]
    pub tree_norm_by_pd: Option<f64>,
    #[serde(rename = "Tree_entropy")]
    pub tree_entropy: Option<f64>,
    #[serde(rename = "MSA_mean_diversity")]
    pub msa_mean: Option<f64>,
    #[serde(rename = "MSA_normalized_diversity")]
    pub msa_normalized: Option<f64>,
}

fn msa_for_file(path: &Path) -> Result<MsaDiversity> {
    let records = read_fasta(path)?;
    let rows: Vec<&[u8]> = records.iter().map(|r| r.seq.as_slice()).collect();
    msa_diversity(&rows)
}

/// Compute the diversity row for one orthogroup. Problems are logged and leave fields empty.
pub fn diversity_for_group(og_id: &str, alignment: &Path, tree: &Path) -> DiversityRow {
    let mut row = DiversityRow { og_id: og_id.to_string(), ..Default::default() };

    match msa_for_file(alignment) {
        Ok(msa) => {
            row.msa_mean = msa.mean;
            row.msa_normalized = msa.normalized;
            match (msa.mean, msa.normalized) {
                (Some(m), Some(n)) => info!("{}: MSA diversity mean={:.4} normalized={:.4}", og_id, m, n),
                _ => info!("{}: MSA diversity could not be calculated", og_id),
            }
        }
        Err(e) => warn!("{}: error processing alignment {}: {:#}", og_id, alignment.display(), e),
    }

    if !tree.is_file() {
        warn!("{}: tree file not found: {}. Skipping tree diversity.", og_id, tree.display());
        return row;
    }
    match read_newick(tree) {
        Ok(t) => {
            let d = tree_diversity(&t, BRANCH_EPSILON);
            row.tree_n_tips = Some(d.n_tips);
            row.tree_hill = d.hill;
            row.tree_norm_by_tips = d.norm_by_tips;
            row.tree_norm_by_pd = d.norm_by_pd;
            row.tree_entropy = d.entropy;
            match d.hill {
                Some(h) => info!("{}: tree Hill diversity={:.4}, tips={}", og_id, h, d.n_tips),
                None => info!("{}: tree diversity could not be calculated", og_id),
            }
        }
        Err(e) => warn!("{}: error processing tree {}: {:#}", og_id, tree.display(), e),
    }
    row
}

/// Execute the `hill-diversity` subcommand.
pub fn run(args: HillDiversityArgs) -> Result<()> {
    if !args.alignments_dir.is_dir() {
        return Err(anyhow!("Alignment directory not found: {}", args.alignments_dir.display()));
    }
    let alignments = FilePattern::with_suffix(&args.alignment_suffix)?.find_in(&args.alignments_dir)?;
    info!("Found {} alignment files in {}", alignments.len(), args.alignments_dir.display());
    if alignments.is_empty() {
        warn!("No alignment files found; nothing to do");
        return Ok(());
    }

    let mut rows = Vec::with_capacity(alignments.len());
    for path in &alignments {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let og_id = name.strip_suffix(args.alignment_suffix.as_str()).unwrap_or(&name).to_string();
        let tree = args.trees_dir.join(format!("{}{}", og_id, args.tree_suffix));
        rows.push(diversity_for_group(&og_id, path, &tree));
    }

    let mut wtr = csv::Writer::from_writer(create_writer(&args.output)?);
    for row in &rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    info!("Saved diversity results for {} orthogroups to {}", rows.len(), args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::newick::parse_newick;
    use std::fs;
    use tempfile::tempdir;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn conserved_and_variable_columns() {
        let rows = [&b"AM-"[..], &b"AK-"[..], &b"aM*"[..]];
        let d = msa_diversity(&rows).unwrap();
        assert!(close(d.column_hill[0], 1.0));
        // 2/3 M, 1/3 K
        let h = -(2.0f64 / 3.0 * (2.0f64 / 3.0).ln() + 1.0 / 3.0 * (1.0f64 / 3.0).ln());
        assert!(close(d.column_hill[1], h.exp()));
        assert!(close(d.column_hill[2], 1.0));
        let mean = (2.0 + h.exp()) / 3.0;
        assert!(close(d.mean.unwrap(), mean));
        assert!(close(d.normalized.unwrap(), (mean - 1.0) / 19.0));
    }

    #[test]
    fn uniform_column_hill_equals_state_count() {
        let rows = [&b"A"[..], &b"C"[..], &b"D"[..], &b"E"[..]];
        let d = msa_diversity(&rows).unwrap();
        assert!(close(d.column_hill[0], 4.0));
    }

    #[test]
    fn empty_and_ragged_alignments() {
        assert_eq!(msa_diversity(&[]).unwrap(), MsaDiversity::default());
        let ragged = [&b"AA"[..], &b"A"[..]];
        assert!(msa_diversity(&ragged).is_err());
    }

    #[test]
    fn equal_branches_give_branch_count() {
        let t = parse_newick("((A:1,B:1):1,C:1);").unwrap();
        let d = tree_diversity(&t, BRANCH_EPSILON);
        assert!(close(d.hill.unwrap(), 4.0));
        assert_eq!(d.n_tips, 3);
        assert!(close(d.norm_by_tips.unwrap(), 4.0 / 3.0));
        assert!(close(d.norm_by_pd.unwrap(), 1.0));
        assert!(close(d.entropy.unwrap(), 4.0f64.ln()));
    }

    #[test]
    fn tree_without_lengths_reports_tips_only() {
        let t = parse_newick("(A,B);").unwrap();
        let d = tree_diversity(&t, BRANCH_EPSILON);
        assert_eq!(d, TreeDiversity { n_tips: 2, ..Default::default() });
    }

    #[test]
    fn zero_length_tree_has_no_pd_normalisation() {
        let t = parse_newick("(A:0,B:0);").unwrap();
        let d = tree_diversity(&t, BRANCH_EPSILON);
        assert!(close(d.hill.unwrap(), 2.0));
        assert_eq!(d.norm_by_pd, None);
    }

    #[test]
    fn writes_csv_with_blank_missing_values() {
        let dir = tempdir().unwrap();
        let aln = dir.path().join("aln");
        let trees = dir.path().join("trees");
        fs::create_dir(&aln).unwrap();
        fs::create_dir(&trees).unwrap();
        fs::write(aln.join("OG1_trimmed.fasta"), ">a\nAC\n>b\nAC\n").unwrap();
        fs::write(aln.join("OG2_trimmed.fasta"), ">a\nA\n>b\nC\n").unwrap();
        fs::write(trees.join("OG1_fasttree.nwk"), "(a:1,b:1);").unwrap();
        let out = dir.path().join("div.csv");

        run(HillDiversityArgs {
            alignments_dir: aln,
            trees_dir: trees,
            output: out.clone(),
            alignment_suffix: "_trimmed.fasta".into(),
            tree_suffix: "_fasttree.nwk".into(),
        })
        .unwrap();

        let text = fs::read_to_string(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "OG_ID,Tree_n_tips,Tree_Hill_diversity,Tree_Norm_by_tips,Tree_Norm_by_PD,Tree_entropy,MSA_mean_diversity,MSA_normalized_diversity"
        );
        assert!(lines[1].starts_with("OG1,2,"));
        assert!(lines[1].ends_with(",1.0,0.0"));
        assert!(lines[2].starts_with("OG2,,,,,,2.0,"));
    }
}
