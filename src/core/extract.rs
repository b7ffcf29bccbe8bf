//! HTML extraction for volby.cz listing and municipality result pages.
//!
//! All lookups are fixed selector paths into pages owned by the election
//! authority. A layout change upstream shows up as a `StructureError` (or as an
//! empty listing), never as a panic.

use crate::domain::model::{PartyVotes, TownResults};
use crate::utils::error::{Result, ScrapeError};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

const HIDDEN_CELL_CLASS: &str = "hidden_td";
const PARTY_ROW_CELLS: usize = 5;
const TOWN_CODE_PARAM: &str = "xobec";

static TOWN_LINK_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.cislo").expect("invalid selector: town link cell"));
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("invalid selector: anchor"));
static TOWN_NAME: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("#publikace > h3:nth-child(4)").expect("invalid selector: town name")
});
static REGISTERED_VOTERS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("table tr:nth-child(3) td:nth-child(4)")
        .expect("invalid selector: registered voters")
});
static ENVELOPES_COUNT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("table tr:nth-child(3) td:nth-child(5)")
        .expect("invalid selector: envelopes count")
});
static VALID_VOTES: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("table tr:nth-child(3) td:nth-child(8)").expect("invalid selector: valid votes")
});
static RESULT_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#inner tr").expect("invalid selector: result row"));
static CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("invalid selector: cell"));

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

/// Relative links to the municipality pages, in document order.
///
/// Only `td.cislo` cells holding a hyperlink count; a page without any yields
/// an empty list.
pub fn extract_town_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&TOWN_LINK_CELL)
        .filter_map(|cell| cell.select(&ANCHOR).next())
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Parses one municipality result page. The town code comes from the page URL,
/// see [`extract_town_code`].
pub fn extract_record(html: &str) -> Result<TownResults> {
    let document = Html::parse_document(html);

    let results = TownResults {
        town_name: extract_town_name(&document)?,
        registered_voters: extract_integer(&document, &REGISTERED_VOTERS, "registered voters")?,
        envelopes_count: extract_integer(&document, &ENVELOPES_COUNT, "envelopes count")?,
        valid_votes: extract_integer(&document, &VALID_VOTES, "valid votes")?,
        party_votes: extract_party_votes(&document)?,
    };

    tracing::debug!(
        "Parsed {}: {} parties, {} valid votes",
        results.town_name,
        results.party_votes.len(),
        results.valid_votes
    );
    Ok(results)
}

/// Value of the `xobec` query parameter.
pub fn extract_town_code(url: &str) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|e| ScrapeError::structure(format!("invalid town URL '{}': {}", url, e)))?;

    parsed
        .query_pairs()
        .find(|(key, _)| key == TOWN_CODE_PARAM)
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| {
            ScrapeError::structure(format!(
                "query parameter '{}' not found in {}",
                TOWN_CODE_PARAM, url
            ))
        })
}

pub fn extract_town_name(document: &Html) -> Result<String> {
    let heading = document
        .select(&TOWN_NAME)
        .next()
        .ok_or_else(|| ScrapeError::structure("town name heading not found"))?;

    let text = elem_text(heading);
    text.split(':')
        .nth(1)
        .map(|name| name.trim().to_string())
        .ok_or_else(|| {
            ScrapeError::structure(format!("town name heading has no ':' separator: {}", text.trim()))
        })
}

fn extract_integer(document: &Html, selector: &Selector, what: &str) -> Result<u64> {
    let cell = document
        .select(selector)
        .next()
        .ok_or_else(|| ScrapeError::structure(format!("{} cell not found", what)))?;
    parse_count(&elem_text(cell))
}

/// Keeps only the digits of `text`, in order, and parses them base-10.
///
/// `"1 234"` and `"1\u{a0}234"` both give 1234. Text without any digit is an
/// error, not zero.
pub fn parse_count(text: &str) -> Result<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits
        .parse::<u64>()
        .map_err(|e| ScrapeError::structure(format!("expected a number, got '{}': {}", text.trim(), e)))
}

/// A party row has a visible first cell and exactly five cells.
pub fn is_party_row(row: ElementRef) -> bool {
    let mut cells = row.select(&CELL);
    match cells.next() {
        Some(first) if !first.value().classes().any(|c| c == HIDDEN_CELL_CLASS) => {
            1 + cells.count() == PARTY_ROW_CELLS
        }
        _ => false,
    }
}

pub fn extract_party_votes(document: &Html) -> Result<PartyVotes> {
    let mut votes = PartyVotes::new();

    for row in document.select(&RESULT_ROW).filter(|row| is_party_row(*row)) {
        let cells: Vec<ElementRef> = row.select(&CELL).collect();
        let party = elem_text(cells[1]).trim().to_string();
        let count = parse_count(&elem_text(cells[2]))?;

        // 重複的政黨名稱沿用第一次出現的位置
        votes.insert(party, count);
    }

    Ok(votes)
}
