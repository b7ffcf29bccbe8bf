use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

pub const TOWN_NAME: &str = "town_name";
pub const REGISTERED_VOTERS: &str = "registered_voters";
pub const ENVELOPES_COUNT: &str = "envelopes_count";
pub const VALID_VOTES: &str = "valid_votes";
pub const TOWN_CODE: &str = "town_code";

/// Party name → vote count, in the order the parties appear on the page.
pub type PartyVotes = IndexMap<String, u64>;

/// Figures read from one municipality result page, before the town code is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TownResults {
    pub town_name: String,
    pub registered_voters: u64,
    pub envelopes_count: u64,
    pub valid_votes: u64,
    pub party_votes: PartyVotes,
}

impl TownResults {
    pub fn with_town_code(self, town_code: impl Into<String>) -> ElectionRecord {
        ElectionRecord {
            town_name: self.town_name,
            town_code: town_code.into(),
            registered_voters: self.registered_voters,
            envelopes_count: self.envelopes_count,
            valid_votes: self.valid_votes,
            party_votes: self.party_votes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectionRecord {
    pub town_name: String,
    pub town_code: String,
    pub registered_voters: u64,
    pub envelopes_count: u64,
    pub valid_votes: u64,
    pub party_votes: PartyVotes,
}

impl ElectionRecord {
    /// Flattens the record into its output columns: fixed fields, parties, then the town code.
    pub fn to_row(&self) -> Row {
        let mut cells = IndexMap::with_capacity(self.party_votes.len() + 5);
        cells.insert(TOWN_NAME.to_string(), self.town_name.clone());
        cells.insert(
            REGISTERED_VOTERS.to_string(),
            self.registered_voters.to_string(),
        );
        cells.insert(ENVELOPES_COUNT.to_string(), self.envelopes_count.to_string());
        cells.insert(VALID_VOTES.to_string(), self.valid_votes.to_string());
        for (party, votes) in &self.party_votes {
            cells.insert(party.clone(), votes.to_string());
        }
        cells.insert(TOWN_CODE.to_string(), self.town_code.clone());
        Row { cells }
    }
}

/// Ordered column → cell view of a record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    cells: IndexMap<String, String>,
}

impl Row {
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    /// Cells in `schema` order; columns this row lacks come out empty.
    pub fn project<'a>(&'a self, schema: &'a Schema) -> impl Iterator<Item = &'a str> + 'a {
        schema
            .columns()
            .iter()
            .map(move |column| self.get(column).unwrap_or(""))
    }
}

/// How the CSV header is derived from a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum HeaderMode {
    /// The first record's keys define the columns; later extra keys are dropped.
    #[default]
    FirstRecord,
    /// Every key of every record, in first-seen order.
    Union,
}

/// Delimiter flavour of the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Csv,
    Tsv,
}

impl OutputFormat {
    pub fn delimiter(self) -> u8 {
        match self {
            OutputFormat::Csv => b',',
            OutputFormat::Tsv => b'\t',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    /// `None` for an empty dataset, which has no header to derive.
    pub fn derive(rows: &[Row], mode: HeaderMode) -> Option<Self> {
        let first = rows.first()?;
        let columns = match mode {
            HeaderMode::FirstRecord => first.keys().map(str::to_string).collect(),
            HeaderMode::Union => {
                let mut seen: IndexSet<String> = IndexSet::new();
                for row in rows {
                    for key in row.keys() {
                        if !seen.contains(key) {
                            seen.insert(key.to_string());
                        }
                    }
                }
                seen.into_iter().collect()
            }
        };
        Some(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// A municipality that could not be processed.
#[derive(Debug)]
pub struct TownFailure {
    pub url: String,
    pub error: crate::utils::error::ScrapeError,
}

/// Outcome of one aggregation run, both halves in listing order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub records: Vec<ElectionRecord>,
    pub failures: Vec<TownFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub output_path: String,
    pub records_written: usize,
    pub towns_failed: usize,
    pub columns: usize,
}
