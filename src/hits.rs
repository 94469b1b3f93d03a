//! DIAMOND / BLAST tabular hit tables: headerless, 14 columns
//! (`qseqid sseqid pident length mismatch gapopen qstart qend sstart send evalue bitscore qlen slen`).

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, warn};
use std::path::Path;

/// One alignment hit.
#[derive(Debug, Clone, PartialEq)]
pub struct HitRecord {
    pub query_id: String,
    pub subject_id: String,
    pub percent_identity: Option<f64>,
    pub alignment_length: u64,
    pub mismatches: Option<u64>,
    pub gap_openings: Option<u64>,
    pub query_start: Option<i64>,
    pub query_end: Option<i64>,
    pub subject_start: Option<i64>,
    pub subject_end: Option<i64>,
    pub e_value: f64,
    pub bit_score: f64,
    pub query_length: i64,
    pub subject_length: i64,
}

impl HitRecord {
    /// Minimal record carrying only the fields the selection logic reads.
    pub fn new(
        query_id: &str,
        subject_id: &str,
        alignment_length: u64,
        e_value: f64,
        bit_score: f64,
        query_length: i64,
        subject_length: i64,
    ) -> Self {
        Self {
            query_id: query_id.to_string(),
            subject_id: subject_id.to_string(),
            percent_identity: None,
            alignment_length,
            mismatches: None,
            gap_openings: None,
            query_start: None,
            query_end: None,
            subject_start: None,
            subject_end: None,
            e_value,
            bit_score,
            query_length,
            subject_length,
        }
    }

    /// Fraction of the query covered by the alignment; 0 when the query length is not positive.
    pub fn query_coverage(&self) -> f64 {
        if self.query_length > 0 {
            self.alignment_length as f64 / self.query_length as f64
        } else {
            0.0
        }
    }

    /// Fraction of the subject covered by the alignment; 0 when the subject length is not positive.
    pub fn subject_coverage(&self) -> f64 {
        if self.subject_length > 0 {
            self.alignment_length as f64 / self.subject_length as f64
        } else {
            0.0
        }
    }

    /// Build a record from one table row, or `None` if a required field is unusable.
    pub fn from_row(row: &StringRecord) -> Option<Self> {
        let field = |i: usize| row.get(i).map(str::trim).filter(|s| !s.is_empty());
        let float = |i: usize| field(i).and_then(|s| s.parse::<f64>().ok()).filter(|v| !v.is_nan());
        // integral floats ("350.0") are accepted, fractional ones are not
        let int = |i: usize| {
            field(i).and_then(|s| {
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite() && v.fract() == 0.0)
                        .map(|v| v as i64)
                })
            })
        };

        let alignment_length = int(3)?;
        if alignment_length < 0 {
            return None;
        }
        Some(Self {
            query_id: field(0).unwrap_or_default().to_string(),
            subject_id: field(1).unwrap_or_default().to_string(),
            percent_identity: float(2),
            alignment_length: alignment_length as u64,
            mismatches: int(4).and_then(|v| u64::try_from(v).ok()),
            gap_openings: int(5).and_then(|v| u64::try_from(v).ok()),
            query_start: int(6),
            query_end: int(7),
            subject_start: int(8),
            subject_end: int(9),
            e_value: float(10)?,
            bit_score: float(11)?,
            query_length: int(12)?,
            subject_length: int(13)?,
        })
    }
}

/// Parse a headerless tab-separated hit table from any reader.
pub fn parse_hit_table<R: std::io::Read>(reader: R) -> Result<Vec<HitRecord>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut hits = Vec::new();
    let mut dropped = 0usize;
    for (i, row) in rdr.records().enumerate() {
        let row = match row {
            Ok(r) => r,
            Err(e) => {
                warn!("Unreadable hit table row {}: {}", i + 1, e);
                dropped += 1;
                continue;
            }
        };
        match HitRecord::from_row(&row) {
            Some(hit) => hits.push(hit),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!("Dropped {} malformed hit rows", dropped);
    }
    Ok(hits)
}

/// Load a hit table from disk.
pub fn load_hit_table(path: &Path) -> Result<Vec<HitRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open hit table {}", path.display()))?;
    parse_hit_table(file).with_context(|| format!("Failed to read hit table {}", path.display()))
}

/// Group identifier for a per-group input file: the leading `OG<digits>` of the file name,
/// falling back to the file stem.
pub fn group_id_from_path(path: &Path) -> String {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    if let Some(id) = og_prefix(&name) {
        return id;
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.clone());
    warn!("Could not parse an OG identifier from '{}', using '{}'", name, stem);
    stem
}

fn og_prefix(name: &str) -> Option<String> {
    let rest = name.strip_prefix("OG")?;
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    (digits > 0).then(|| name[..2 + digits].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const TABLE: &str = "\
q1\tX_Sulfolobus_1\t55.2\t180\t20\t2\t1\t180\t5\t185\t1e-20\t500\t200\t200
q1\tbad_evalue\t55.2\t180\t20\t2\t1\t180\t5\t185\tNA\t500\t200\t200
q1\tshort_row\t55.2\t180
q1\tY_Methanosarcina_1\t40\t160\t.\t.\t1\t160\t1\t160\t1e-15\t300.5\t200\t200
";

    #[test]
    fn drops_rows_missing_required_fields() {
        let hits = parse_hit_table(TABLE.as_bytes()).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.subject_id.as_str()).collect();
        assert_eq!(ids, vec!["X_Sulfolobus_1", "Y_Methanosarcina_1"]);
        assert_eq!(hits[0].alignment_length, 180);
        assert_eq!(hits[0].e_value, 1e-20);
        assert_eq!(hits[1].mismatches, None);
        assert_eq!(hits[1].bit_score, 300.5);
    }

    #[test]
    fn coverage_guards_non_positive_lengths() {
        let mut hit = HitRecord::new("q", "s", 90, 1e-5, 50.0, 100, 180);
        assert!((hit.query_coverage() - 0.9).abs() < 1e-12);
        assert!((hit.subject_coverage() - 0.5).abs() < 1e-12);
        hit.query_length = 0;
        hit.subject_length = -3;
        assert_eq!(hit.query_coverage(), 0.0);
        assert_eq!(hit.subject_coverage(), 0.0);
    }

    #[test]
    fn empty_table_is_not_an_error() {
        assert!(parse_hit_table("".as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn group_ids_from_file_names() {
        assert_eq!(group_id_from_path(&PathBuf::from("/d/OG0001234_hits.tsv")), "OG0001234");
        assert_eq!(group_id_from_path(&PathBuf::from("custom_group.tsv")), "custom_group");
        assert_eq!(group_id_from_path(&PathBuf::from("OG_x_hits.tsv")), "OG_x_hits");
        assert_eq!(group_id_from_path(&PathBuf::from("OG7")), "OG7");
    }

    #[test]
    fn fractional_lengths_are_rejected() {
        let table = "\
q\tfloat_ok\t50\t90.0\t0\t0\t1\t90\t1\t90\t1e-20\t100\t100.0\t100
q\tfractional\t50\t90.5\t0\t0\t1\t90\t1\t90\t1e-20\t100\t100\t100
q\tfractional_qlen\t50\t90\t0\t0\t1\t90\t1\t90\t1e-20\t100\t99.9\t100
";
        let hits = parse_hit_table(table.as_bytes()).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].subject_id, "float_ok");
        assert_eq!(hits[0].alignment_length, 90);
        assert_eq!(hits[0].query_length, 100);
    }
}
