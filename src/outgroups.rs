//! Outgroup selection from per-group DIAMOND results (`select-outgroups`).
//!
//! For each group's hit table, hits are classified by taxon keywords and filtered by e-value and
//! coverage. The best hit of every keyword group is taken first, then the best remaining hits.
//! One CSV row is written per group id.

use crate::hits::{group_id_from_path, load_hit_table, HitRecord};
use crate::pattern::FilePattern;
use crate::seqio::create_writer;
use crate::taxon::{Class, Classifier, KeywordGroup, KeywordSets};
use anyhow::{anyhow, Context, Result};
use clap::Args;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_EVALUE_THRESHOLD: f64 = 1e-10;
pub const DEFAULT_MIN_COVERAGE: f64 = 0.5;
pub const DEFAULT_MAX_OUTGROUPS: usize = 3;

/// Marker for empty selection slots in the summary table.
const MISSING: &str = "NA";

#[derive(Args, Debug, Clone)]
pub struct SelectOutgroupsArgs {
    /// Directory containing per-group DIAMOND result files (tabular, 14 columns)
    #[arg(short = 'i', long = "input-dir", value_name = "DIR")]
    pub input_dir: PathBuf,

    /// Output summary CSV listing selected outgroups per group
    #[arg(short = 'o', long = "output", value_name = "CSV")]
    pub output: PathBuf,

    /// File-name pattern of hit tables inside the input directory
    #[arg(long = "pattern", default_value = "OG*_hits.tsv")]
    pub pattern: String,

    /// Maximum e-value
    #[arg(long = "evalue", default_value_t = DEFAULT_EVALUE_THRESHOLD)]
    pub evalue: f64,

    /// Minimum query AND subject coverage (0.0 to 1.0)
    #[arg(long = "min-cov", value_parser = parse_fraction, default_value_t = DEFAULT_MIN_COVERAGE)]
    pub min_cov: f64,

    /// Maximum number of outgroups per group
    #[arg(long = "max-outgroups", default_value_t = DEFAULT_MAX_OUTGROUPS)]
    pub max_outgroups: usize,

    /// Keyword group as NAME=FILE (one keyword per line). Repeat in priority order.
    /// Defaults to built-in TACK and Euryarchaeota lists.
    #[arg(long = "keywords", value_name = "NAME=FILE", value_parser = parse_keyword_arg)]
    pub keywords: Vec<(String, PathBuf)>,

    /// Worker threads (default: all cores)
    #[arg(short = 't', long = "threads", value_name = "INT")]
    pub threads: Option<usize>,
}

fn parse_fraction(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(format!("{} is not in the range 0.0 - 1.0", v))
    }
}

fn parse_keyword_arg(s: &str) -> Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((name, path)) if !name.trim().is_empty() && !path.trim().is_empty() => {
            Ok((name.trim().to_string(), PathBuf::from(path.trim())))
        }
        _ => Err(format!("expected NAME=FILE, got '{}'", s)),
    }
}

/// E-value and coverage cut-offs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub e_value_max: f64,
    pub min_coverage: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { e_value_max: DEFAULT_EVALUE_THRESHOLD, min_coverage: DEFAULT_MIN_COVERAGE }
    }
}

impl Thresholds {
    fn passes(&self, hit: &HitRecord) -> bool {
        hit.e_value <= self.e_value_max
            && hit.query_coverage() >= self.min_coverage
            && hit.subject_coverage() >= self.min_coverage
    }
}

/// Parameters shared by every group in a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectParams {
    pub thresholds: Thresholds,
    pub max_outgroups: usize,
}

/// A hit together with its keyword classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedHit<'a> {
    pub hit: &'a HitRecord,
    pub class: Class,
}

/// Why a group ended up without any candidate after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// The table had no usable rows.
    NoValidHits,
    /// Nothing survived the e-value and coverage cut-offs.
    BelowThresholds,
    /// Hits passed the cut-offs but none matched a keyword group.
    NoneClassified,
}

/// Keep hits that pass the e-value and coverage cut-offs and belong to a keyword group.
pub fn filter_hits<'a>(
    hits: &'a [HitRecord],
    classifier: &Classifier,
    thresholds: &Thresholds,
) -> Vec<ClassifiedHit<'a>> {
    hits.iter()
        .filter(|hit| thresholds.passes(hit))
        .map(|hit| ClassifiedHit { hit, class: classifier.classify(&hit.subject_id) })
        .filter(|ch| ch.class.is_classified())
        .collect()
}

/// Diagnose an empty filter result. Returns `None` if some hit survives filtering.
pub fn empty_reason(
    hits: &[HitRecord],
    classifier: &Classifier,
    thresholds: &Thresholds,
) -> Option<EmptyReason> {
    if hits.is_empty() {
        return Some(EmptyReason::NoValidHits);
    }
    let mut numeric_survivors = 0usize;
    for hit in hits.iter().filter(|h| thresholds.passes(h)) {
        if classifier.classify(&hit.subject_id).is_classified() {
            return None;
        }
        numeric_survivors += 1;
    }
    if numeric_survivors > 0 {
        Some(EmptyReason::NoneClassified)
    } else {
        Some(EmptyReason::BelowThresholds)
    }
}

fn by_score_desc(a: &ClassifiedHit<'_>, b: &ClassifiedHit<'_>) -> std::cmp::Ordering {
    b.hit.bit_score.total_cmp(&a.hit.bit_score)
}

/// Pick up to `max_outgroups` unique subject ids.
///
/// The best hit of each keyword group (`0..group_count`, in priority order) is taken first,
/// ordered by bitscore; remaining slots go to the best other hits. Ties keep input order.
pub fn select_outgroups(
    filtered: &[ClassifiedHit<'_>],
    group_count: usize,
    max_outgroups: usize,
) -> Vec<String> {
    if max_outgroups == 0 || filtered.is_empty() {
        return Vec::new();
    }
    let mut ranked: Vec<&ClassifiedHit<'_>> = filtered.iter().collect();
    ranked.sort_by(|a, b| by_score_desc(a, b));

    let mut seeds: Vec<&ClassifiedHit<'_>> = Vec::with_capacity(group_count);
    let mut seen: HashSet<&str> = HashSet::new();
    for group in 0..group_count {
        let best = ranked.iter().find(|ch| ch.class == Class::Group(group));
        if let Some(best) = best {
            if seen.insert(best.hit.subject_id.as_str()) {
                seeds.push(*best);
            }
        }
    }
    seeds.sort_by(|a, b| by_score_desc(a, b));
    seeds.truncate(max_outgroups);

    let mut selected: Vec<String> = seeds.iter().map(|ch| ch.hit.subject_id.clone()).collect();
    let mut chosen: HashSet<&str> = seeds.iter().map(|ch| ch.hit.subject_id.as_str()).collect();
    for ch in &ranked {
        if selected.len() >= max_outgroups {
            break;
        }
        if chosen.insert(ch.hit.subject_id.as_str()) {
            selected.push(ch.hit.subject_id.clone());
        }
    }
    selected
}

/// Selection result for one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSelection {
    pub group_id: String,
    pub outgroups: Vec<String>,
}

/// Load, classify, filter and select for one group's hit table.
///
/// Never fails: unreadable or empty tables give an empty selection so that every group still
/// gets a row in the summary.
pub fn process_group(
    path: &Path,
    group_id: &str,
    classifier: &Classifier,
    params: &SelectParams,
) -> GroupSelection {
    debug!("Processing hit table for {}: {}", group_id, path.display());
    let empty = || GroupSelection { group_id: group_id.to_string(), outgroups: Vec::new() };

    let hits = match load_hit_table(path) {
        Ok(h) => h,
        Err(e) => {
            warn!("{:#}. Skipping {}.", e, group_id);
            return empty();
        }
    };

    let filtered = filter_hits(&hits, classifier, &params.thresholds);
    if filtered.is_empty() {
        match empty_reason(&hits, classifier, &params.thresholds) {
            Some(EmptyReason::NoValidHits) => {
                info!("No valid hits found after initial cleaning for {}", group_id)
            }
            Some(EmptyReason::NoneClassified) => info!(
                "Hits passed e-value/coverage for {}, but none matched a keyword group. No outgroups selected.",
                group_id
            ),
            _ => info!(
                "No hits passed e-value/coverage filters for {}. No outgroups selected.",
                group_id
            ),
        }
        return empty();
    }

    if log::log_enabled!(log::Level::Debug) {
        let per_class: Vec<String> = (0..classifier.group_count())
            .map(|g| {
                let n = filtered.iter().filter(|ch| ch.class == Class::Group(g)).count();
                format!("{}={}", classifier.name(Class::Group(g)), n)
            })
            .collect();
        debug!("{} candidate hits for {} ({})", filtered.len(), group_id, per_class.join(", "));
    }

    let outgroups = select_outgroups(&filtered, classifier.group_count(), params.max_outgroups);
    debug!("Selected {} outgroups for {}: {:?}", outgroups.len(), group_id, outgroups);
    GroupSelection { group_id: group_id.to_string(), outgroups }
}

/// Write the summary table: `GroupID,Selection_1..Selection_N`, `NA` for empty slots.
pub fn write_summary<W: Write>(writer: W, selections: &[GroupSelection], max_outgroups: usize) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = Vec::with_capacity(max_outgroups + 1);
    header.push("GroupID".to_string());
    header.extend((1..=max_outgroups).map(|i| format!("Selection_{}", i)));
    wtr.write_record(&header)?;

    for sel in selections {
        let mut row: Vec<&str> = Vec::with_capacity(max_outgroups + 1);
        row.push(&sel.group_id);
        for i in 0..max_outgroups {
            row.push(sel.outgroups.get(i).map(String::as_str).unwrap_or(MISSING));
        }
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn keyword_sets(args: &SelectOutgroupsArgs) -> Result<KeywordSets> {
    if args.keywords.is_empty() {
        return Ok(KeywordSets::default());
    }
    let groups = args
        .keywords
        .iter()
        .map(|(name, path)| KeywordGroup::from_file(name, path))
        .collect::<Result<Vec<_>>>()?;
    KeywordSets::new(groups)
}

/// Execute the `select-outgroups` subcommand.
pub fn run(args: SelectOutgroupsArgs) -> Result<()> {
    info!("Input directory: {}", args.input_dir.display());
    info!("File pattern: {}", args.pattern);
    info!("E-value threshold: {:e}, min coverage: {}", args.evalue, args.min_cov);
    info!("Max outgroups per group: {}", args.max_outgroups);

    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let sets = keyword_sets(&args)?;
    for g in sets.groups() {
        info!("Keyword group {}: {} keywords", g.name, g.keywords.len());
    }
    let classifier = Classifier::new(&sets)?;

    if !args.input_dir.is_dir() {
        return Err(anyhow!("Input directory not found: {}", args.input_dir.display()));
    }
    let pattern = FilePattern::new(&args.pattern)?;
    let files = pattern.find_in(&args.input_dir)?;
    if files.is_empty() {
        return Err(anyhow!(
            "No files found in '{}' matching pattern '{}'",
            args.input_dir.display(),
            pattern.as_str()
        ));
    }
    info!("Found {} hit tables", files.len());

    let params = SelectParams {
        thresholds: Thresholds { e_value_max: args.evalue, min_coverage: args.min_cov },
        max_outgroups: args.max_outgroups,
    };
    let jobs: Vec<(PathBuf, String)> = files
        .into_iter()
        .map(|p| {
            let id = group_id_from_path(&p);
            (p, id)
        })
        .collect();

    let results: Vec<GroupSelection> = jobs
        .par_iter()
        .map(|(path, id)| process_group(path, id, &classifier, &params))
        .collect();

    // one row per group id; files are in path order so the last one wins
    let mut by_group: BTreeMap<String, GroupSelection> = BTreeMap::new();
    for ((path, id), selection) in jobs.iter().zip(results) {
        if by_group.insert(id.clone(), selection).is_some() {
            warn!("Group {} appears in more than one file; keeping {}", id, path.display());
        }
    }
    let selections: Vec<GroupSelection> = by_group.into_values().collect();

    let with_outgroups = selections.iter().filter(|s| !s.outgroups.is_empty()).count();
    info!("Processed {} groups; found outgroups for {}", selections.len(), with_outgroups);

    let w = create_writer(&args.output)?;
    write_summary(w, &selections, args.max_outgroups)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!("Saved selected outgroups for {} groups to {}", selections.len(), args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn tack_eury() -> Classifier {
        let sets = KeywordSets::new(vec![
            KeywordGroup::new("TACK", &["Sulfolobus"]),
            KeywordGroup::new("Eury", &["Methanosarcina"]),
        ])
        .unwrap();
        Classifier::new(&sets).unwrap()
    }

    /// Hit with coverage `cov` on both sides (alignment length over length-100 sequences).
    fn hit(id: &str, bits: f64, evalue: f64, cov: f64) -> HitRecord {
        HitRecord::new("q", id, (cov * 100.0).round() as u64, evalue, bits, 100, 100)
    }

    fn scenario() -> Vec<HitRecord> {
        vec![
            hit("X_Sulfolobus_1", 500.0, 1e-20, 0.9),
            hit("Y_Methanosarcina_1", 300.0, 1e-15, 0.8),
            hit("Z_Unknown_1", 900.0, 1e-30, 0.95),
        ]
    }

    fn run_selection(hits: &[HitRecord], c: &Classifier, max: usize) -> Vec<String> {
        let thresholds = Thresholds { e_value_max: 1e-10, min_coverage: 0.5 };
        let filtered = filter_hits(hits, c, &thresholds);
        select_outgroups(&filtered, c.group_count(), max)
    }

    #[test]
    fn end_to_end_scenario() {
        let c = tack_eury();
        let hits = scenario();
        assert_eq!(run_selection(&hits, &c, 3), vec!["X_Sulfolobus_1", "Y_Methanosarcina_1"]);
        assert_eq!(run_selection(&hits, &c, 1), vec!["X_Sulfolobus_1"]);
        assert!(run_selection(&hits, &c, 0).is_empty());
    }

    #[test]
    fn filter_excludes_each_reason_independently() {
        let c = tack_eury();
        let t = Thresholds { e_value_max: 1e-10, min_coverage: 0.5 };

        let ok = hit("A_Sulfolobus_1", 100.0, 1e-20, 0.9);
        assert_eq!(filter_hits(std::slice::from_ref(&ok), &c, &t).len(), 1);

        let high_evalue = hit("A_Sulfolobus_1", 100.0, 1e-5, 0.9);
        assert!(filter_hits(&[high_evalue], &c, &t).is_empty());

        let low_qcov = HitRecord::new("q", "A_Sulfolobus_1", 40, 1e-20, 100.0, 100, 50);
        assert!(filter_hits(&[low_qcov], &c, &t).is_empty());

        let low_scov = HitRecord::new("q", "A_Sulfolobus_1", 40, 1e-20, 100.0, 50, 100);
        assert!(filter_hits(&[low_scov], &c, &t).is_empty());

        let unclassified = hit("A_Unknown_1", 100.0, 1e-20, 0.9);
        assert!(filter_hits(&[unclassified], &c, &t).is_empty());
    }

    #[test]
    fn thresholds_are_inclusive() {
        let c = tack_eury();
        let t = Thresholds { e_value_max: 1e-10, min_coverage: 0.5 };
        let edge = hit("A_Sulfolobus_1", 100.0, 1e-10, 0.5);
        assert_eq!(filter_hits(&[edge], &c, &t).len(), 1);
    }

    #[test]
    fn empty_reasons_are_distinguished() {
        let c = tack_eury();
        let t = Thresholds::default();
        assert_eq!(empty_reason(&[], &c, &t), Some(EmptyReason::NoValidHits));
        let unclassified = vec![hit("Z_Unknown_1", 900.0, 1e-30, 0.95)];
        assert_eq!(empty_reason(&unclassified, &c, &t), Some(EmptyReason::NoneClassified));
        let weak = vec![hit("X_Sulfolobus_1", 900.0, 1.0, 0.95)];
        assert_eq!(empty_reason(&weak, &c, &t), Some(EmptyReason::BelowThresholds));
        assert_eq!(empty_reason(&scenario(), &c, &t), None);
    }

    #[test]
    fn diversity_seeds_come_before_higher_scoring_fill() {
        let c = tack_eury();
        let hits = vec![
            hit("T1_Sulfolobus", 500.0, 1e-30, 0.9),
            hit("T2_Sulfolobus", 450.0, 1e-30, 0.9),
            hit("E1_Methanosarcina", 300.0, 1e-30, 0.9),
        ];
        assert_eq!(run_selection(&hits, &c, 2), vec!["T1_Sulfolobus", "E1_Methanosarcina"]);
        assert_eq!(
            run_selection(&hits, &c, 3),
            vec!["T1_Sulfolobus", "E1_Methanosarcina", "T2_Sulfolobus"]
        );
    }

    #[test]
    fn best_group_leads_when_its_top_hit_is_global_best() {
        let c = tack_eury();
        let hits = vec![
            hit("E1_Methanosarcina", 800.0, 1e-30, 0.9),
            hit("T1_Sulfolobus", 500.0, 1e-30, 0.9),
        ];
        assert_eq!(run_selection(&hits, &c, 1), vec!["E1_Methanosarcina"]);
        assert_eq!(run_selection(&hits, &c, 2)[0], "E1_Methanosarcina");
    }

    #[test]
    fn repeated_subject_ids_are_selected_once() {
        let c = tack_eury();
        let hits = vec![
            hit("T1_Sulfolobus", 500.0, 1e-30, 0.9),
            hit("T1_Sulfolobus", 490.0, 1e-30, 0.9),
            hit("T2_Sulfolobus", 100.0, 1e-30, 0.9),
        ];
        assert_eq!(run_selection(&hits, &c, 3), vec!["T1_Sulfolobus", "T2_Sulfolobus"]);
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let c = tack_eury();
        let hits = vec![
            hit("B_Sulfolobus", 100.0, 1e-30, 0.9),
            hit("A_Sulfolobus", 100.0, 1e-30, 0.9),
            hit("C_Methanosarcina", 100.0, 1e-30, 0.9),
        ];
        assert_eq!(
            run_selection(&hits, &c, 3),
            vec!["B_Sulfolobus", "C_Methanosarcina", "A_Sulfolobus"]
        );
    }

    #[test]
    fn selection_is_bounded_unique_and_idempotent() {
        let c = tack_eury();
        let mut hits = Vec::new();
        for i in 0..12 {
            let taxon = if i % 3 == 0 { "Methanosarcina" } else { "Sulfolobus" };
            hits.push(hit(&format!("s{}_{}", i % 7, taxon), (i * 37 % 11) as f64 * 10.0, 1e-30, 0.9));
        }
        for max in 0..6 {
            let first = run_selection(&hits, &c, max);
            assert!(first.len() <= max);
            let unique: HashSet<&String> = first.iter().collect();
            assert_eq!(unique.len(), first.len());

            // feed the chosen records back in, keeping each id's best-scoring row
            let mut again: Vec<HitRecord> = Vec::new();
            for id in &first {
                let best = hits
                    .iter()
                    .filter(|h| &h.subject_id == id)
                    .max_by(|a, b| a.bit_score.total_cmp(&b.bit_score))
                    .unwrap();
                again.push(best.clone());
            }
            assert_eq!(run_selection(&again, &c, max), first);
        }
    }

    #[test]
    fn process_group_handles_missing_and_empty_tables() {
        let dir = tempdir().unwrap();
        let c = tack_eury();
        let params = SelectParams { thresholds: Thresholds::default(), max_outgroups: 2 };

        let missing = process_group(&dir.path().join("OG1_hits.tsv"), "OG1", &c, &params);
        assert!(missing.outgroups.is_empty());

        let empty_path = dir.path().join("OG2_hits.tsv");
        fs::write(&empty_path, "").unwrap();
        assert!(process_group(&empty_path, "OG2", &c, &params).outgroups.is_empty());

        let path = dir.path().join("OG3_hits.tsv");
        fs::write(
            &path,
            "q\tX_Sulfolobus_1\t60\t90\t1\t0\t1\t90\t1\t90\t1e-20\t500\t100\t100\n\
             q\tZ_Unknown_1\t60\t95\t1\t0\t1\t95\t1\t95\t1e-30\t900\t100\t100\n",
        )
        .unwrap();
        let sel = process_group(&path, "OG3", &c, &params);
        assert_eq!(sel.outgroups, vec!["X_Sulfolobus_1"]);
    }

    #[test]
    fn summary_has_one_row_per_group_with_na_padding() {
        let selections = vec![
            GroupSelection { group_id: "OG1".into(), outgroups: vec!["a".into(), "b".into()] },
            GroupSelection { group_id: "OG2".into(), outgroups: vec![] },
        ];
        let mut buf = Vec::new();
        write_summary(&mut buf, &selections, 3).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "GroupID,Selection_1,Selection_2,Selection_3\nOG1,a,b,NA\nOG2,NA,NA,NA\n"
        );
    }

    #[test]
    fn run_writes_sorted_summary() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("hits");
        fs::create_dir(&input).unwrap();
        let row = |id: &str, bits: u32| {
            format!("q\t{}\t60\t90\t1\t0\t1\t90\t1\t90\t1e-20\t{}\t100\t100\n", id, bits)
        };
        fs::write(input.join("OG2_hits.tsv"), row("Y_Methanosarcina_1", 300)).unwrap();
        fs::write(
            input.join("OG1_hits.tsv"),
            row("X_Sulfolobus_1", 500) + &row("Y_Methanosarcina_1", 300),
        )
        .unwrap();
        fs::write(input.join("OG3_hits.tsv"), "").unwrap();
        fs::write(input.join("ignored.txt"), row("X_Sulfolobus_1", 500)).unwrap();

        let out = dir.path().join("out").join("outgroups.csv");
        let args = SelectOutgroupsArgs {
            input_dir: input,
            output: out.clone(),
            pattern: "OG*_hits.tsv".into(),
            evalue: 1e-10,
            min_cov: 0.5,
            max_outgroups: 2,
            keywords: vec![],
            threads: None,
        };
        run(args).unwrap();

        let text = fs::read_to_string(out).unwrap();
        assert_eq!(
            text,
            "GroupID,Selection_1,Selection_2\n\
             OG1,X_Sulfolobus_1,Y_Methanosarcina_1\n\
             OG2,Y_Methanosarcina_1,NA\n\
             OG3,NA,NA\n"
        );
    }

    #[test]
    fn run_fails_without_matching_files() {
        let dir = tempdir().unwrap();
        let args = SelectOutgroupsArgs {
            input_dir: dir.path().to_path_buf(),
            output: dir.path().join("o.csv"),
            pattern: "OG*_hits.tsv".into(),
            evalue: 1e-10,
            min_cov: 0.5,
            max_outgroups: 3,
            keywords: vec![],
            threads: None,
        };
        assert!(run(args).is_err());
    }

    #[test]
    fn run_writes_each_group_once() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("hits");
        fs::create_dir(&input).unwrap();
        let row = |id: &str| {
            format!("q\t{}\t60\t90\t1\t0\t1\t90\t1\t90\t1e-20\t500\t100\t100\n", id)
        };
        fs::write(input.join("OG1_hits.tsv"), row("X_Sulfolobus_1")).unwrap();
        fs::write(input.join("OG1_rerun_hits.tsv"), row("X_Sulfolobus_2")).unwrap();
        let out = dir.path().join("outgroups.csv");

        run(SelectOutgroupsArgs {
            input_dir: input,
            output: out.clone(),
            pattern: "OG*_hits.tsv".into(),
            evalue: 1e-10,
            min_cov: 0.5,
            max_outgroups: 1,
            keywords: vec![],
            threads: None,
        })
        .unwrap();

        assert_eq!(fs::read_to_string(out).unwrap(), "GroupID,Selection_1\nOG1,X_Sulfolobus_2\n");
    }

    #[test]
    fn keyword_and_fraction_args() {
        assert_eq!(
            parse_keyword_arg("TACK=kw/tack.txt").unwrap(),
            ("TACK".to_string(), PathBuf::from("kw/tack.txt"))
        );
        assert!(parse_keyword_arg("TACK").is_err());
        assert!(parse_fraction("1.5").is_err());
        assert_eq!(parse_fraction("0.25").unwrap(), 0.25);
    }
}
