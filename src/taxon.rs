//! Keyword-based taxonomic classification of subject identifiers.

use anyhow::{anyhow, Context, Result};
use log::debug;
use regex::{Regex, RegexBuilder};
use std::fs;
use std::path::Path;

pub const DEFAULT_TACK_KEYWORDS: &[&str] = &[
    "Thermoproteota", "Crenarchaeota", "Nitrososphaerota", "Thaumarchaeota",
    "Korarchaeota", "Aigarchaeota", "Bathyarchaeota",
    "Thermoprotei", "Nitrososphaeria", "Korarchaeia", "Sulfolobus", "Thermoproteus",
    "Pyrobaculum", "Desulfurococcus", "Ignicoccus", "Nitrosopumilus", "Nitrososphaera",
    "Nitrosotalea", "Nitrosocaldus", "Korarchaeum", "Caldiarchaeum", "Cenarchaeum",
    "Thermosphaera",
];

pub const DEFAULT_EURY_KEYWORDS: &[&str] = &[
    "Euryarchaeota", "Methanobacteria", "Methanococci", "Methanomicrobia", "Halobacteria",
    "Thermococci", "Archaeoglobi", "Thermoplasmata", "Methanopyri", "Methanobacterium",
    "Methanobrevibacter", "Methanothermobacter", "Methanococcus", "Methanothermococcus",
    "Methanomicrobium", "Methanoculleus", "Methanospirillum", "Methanosarcina",
    "Methanosaeta", "Methanothrix", "Halobacterium", "Halococcus", "Haloarcula",
    "Halorubrum", "Haloquadratum", "Thermococcus", "Pyrococcus", "Archaeoglobus",
    "Ferroglobus", "Thermoplasma", "Picrophilus", "Ferroplasma", "Aciduliprofundum",
    "Methanopyrus", "Methanosalsum", "Methanoregulaceae", "Methanocorpusculum",
    "Methanodesulfokora", "Thermoplasmatales", "Methanocellales", "Methanobacteriota",
    "Methanosphaera", "Methanolinea", "Methanomassiliicoccales", "Natrialbaceae",
    "Natronococcus", "Halomicrobium", "Natronoarchaeum", "Halomarina", "Halolamina",
    "Salarchaeum", "Halosegnis", "Natrarchaeobius", "Halorussus", "Halarchaeum",
    "Methanococcoides", "Methanoplanus", "Syntrophoarchaeum", "Methanoperedens",
    "Methanomarinus", "ANME-1", "ANME-2", "Methanotrichaceae", "Methanophagales",
    "Alkanophagales", "Nitrosopumilaceae", "Hadesarchaea", "Hydrothermarchaeota",
    "Marine_Group_II", "Marine_Group_III",
];

/// A named set of keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordGroup {
    pub name: String,
    pub keywords: Vec<String>,
}

impl KeywordGroup {
    pub fn new<S: AsRef<str>>(name: &str, keywords: &[S]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.as_ref().to_string()).collect(),
        }
    }

    /// Load keywords from a file: one per line, blank lines and `#` comments ignored.
    pub fn from_file(name: &str, path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read keyword file {}", path.display()))?;
        let keywords: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect();
        if keywords.is_empty() {
            return Err(anyhow!("Keyword file {} for group '{}' is empty", path.display(), name));
        }
        Ok(Self { name: name.to_string(), keywords })
    }
}

/// Keyword groups in priority order: when an id matches several groups, the first listed wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSets {
    groups: Vec<KeywordGroup>,
}

impl KeywordSets {
    pub fn new(groups: Vec<KeywordGroup>) -> Result<Self> {
        if groups.is_empty() {
            return Err(anyhow!("At least one keyword group is required"));
        }
        for (i, g) in groups.iter().enumerate() {
            if groups[..i].iter().any(|prev| prev.name == g.name) {
                return Err(anyhow!("Keyword group '{}' given more than once", g.name));
            }
        }
        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[KeywordGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }
}

impl Default for KeywordSets {
    /// TACK then Euryarchaeota.
    fn default() -> Self {
        Self {
            groups: vec![
                KeywordGroup::new("TACK", DEFAULT_TACK_KEYWORDS),
                KeywordGroup::new("Euryarchaeota", DEFAULT_EURY_KEYWORDS),
            ],
        }
    }
}

/// Classification of one subject id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Class {
    /// Index into the classifier's keyword groups.
    Group(usize),
    Unclassified,
}

impl Class {
    pub fn is_classified(self) -> bool {
        !matches!(self, Class::Unclassified)
    }
}

/// Compiled classifier; one pattern per keyword group.
#[derive(Debug, Clone)]
pub struct Classifier {
    names: Vec<String>,
    patterns: Vec<Option<Regex>>,
}

fn group_pattern(keywords: &[String]) -> Result<Option<Regex>> {
    let alternatives: Vec<String> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }
    let expr = format!(
        r"(?:^|[^[:alnum:]])(?:{})(?:$|[^[:alnum:]])",
        alternatives.join("|")
    );
    let re = RegexBuilder::new(&expr)
        .case_insensitive(true)
        .build()
        .context("Failed to compile keyword pattern")?;
    Ok(Some(re))
}

impl Classifier {
    pub fn new(sets: &KeywordSets) -> Result<Self> {
        let mut names = Vec::with_capacity(sets.len());
        let mut patterns = Vec::with_capacity(sets.len());
        for group in sets.groups() {
            names.push(group.name.clone());
            patterns.push(
                group_pattern(&group.keywords)
                    .with_context(|| format!("Keyword group '{}'", group.name))?,
            );
        }
        Ok(Self { names, patterns })
    }

    pub fn group_count(&self) -> usize {
        self.names.len()
    }

    /// Display name of a class.
    pub fn name(&self, class: Class) -> &str {
        match class {
            Class::Group(i) => self.names.get(i).map(String::as_str).unwrap_or("Unclassified"),
            Class::Unclassified => "Unclassified",
        }
    }

    /// First group, in priority order, with a keyword in `subject_id` bounded by the string
    /// edges or non-alphanumeric characters. Case is ignored.
    pub fn classify(&self, subject_id: &str) -> Class {
        if subject_id.trim().is_empty() {
            debug!("Empty subject id, leaving unclassified");
            return Class::Unclassified;
        }
        for (i, pattern) in self.patterns.iter().enumerate() {
            if pattern.as_ref().map_or(false, |re| re.is_match(subject_id)) {
                return Class::Group(i);
            }
        }
        debug!("Could not classify subject id: {}", subject_id);
        Class::Unclassified
    }
}
