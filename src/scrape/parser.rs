//! HTML parser for extracting stock listings
//!
//! This module handles parsing the stock page markup to extract:
//! - Item listings per recognized category
//! - The per-category "updates in" countdown driving the polling cadence
//!
//! The page carries no versioned structure, so the container lookup walks an
//! ordered chain of structural fallbacks instead of trusting one selector.

use crate::model::{Category, Item};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use thiserror::Error;

/// Seconds assumed until the next change when a countdown is missing or
/// cannot be read
pub const DEFAULT_UPDATE_SECS: u64 = 300;

/// Floor applied to parsed countdowns so a near-zero timer on the page
/// cannot drive a re-fetch storm
pub const MIN_UPDATE_SECS: u64 = 30;

/// Marker phrase preceding the countdown text in a category section
const COUNTDOWN_MARKER: &str = "updates in:";

/// Container selectors tried in order; the first one that matches anything
/// wins. The exact grid class is the page's current layout, the rest are
/// progressively looser fallbacks for when the styling shifts.
const CONTAINER_SELECTORS: [&str; 4] = [
    r#"div[class="grid grid-cols-1 md:grid-cols-3 gap-6 px-6 text-left max-w-screen-lg mx-auto"]"#,
    "div.grid",
    "main",
    "section",
];

/// Errors that can occur while parsing page markup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("No recognizable stock container found in page markup")]
    MissingContainer,
}

/// Extracted listing for one recognized category
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCategory {
    /// Items in page order
    pub items: Vec<Item>,

    /// Seconds until the page expects this listing to change
    pub next_update_seconds: u64,
}

/// Everything extracted from one page fetch
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStock {
    /// Recognized categories only; a section whose heading maps to no known
    /// category is absent here
    pub categories: HashMap<Category, ParsedCategory>,
}

impl ParsedStock {
    /// Number of categories recognized in the page
    pub fn recognized_count(&self) -> usize {
        self.categories.len()
    }
}

/// Parses stock page markup into per-category listings
///
/// Walks the container fallback chain, then treats each direct child block
/// holding an `<h2>` heading as one category section. Sections whose heading
/// maps to no known category are skipped; duplicate headings for the same
/// category overwrite (last one in document order wins).
///
/// # Arguments
///
/// * `html` - The page markup to parse
///
/// # Returns
///
/// * `Ok(ParsedStock)` - Parse succeeded, possibly with zero recognized
///   categories
/// * `Err(ParseError)` - No fallback container matched at all
pub fn parse_stock_page(html: &str) -> Result<ParsedStock, ParseError> {
    let document = Html::parse_document(html);

    let container = find_container(&document).ok_or(ParseError::MissingContainer)?;

    let mut categories = HashMap::new();

    for block in container.children().filter_map(ElementRef::wrap) {
        let label = match block_heading(block) {
            Some(label) => label,
            None => continue,
        };

        let category = match Category::from_label(&label) {
            Some(category) => category,
            None => continue,
        };

        let next_update_seconds = block_countdown(block).unwrap_or(DEFAULT_UPDATE_SECS);
        let items = block_items(block);

        categories.insert(
            category,
            ParsedCategory {
                items,
                next_update_seconds,
            },
        );
    }

    Ok(ParsedStock { categories })
}

/// Parses countdown text like "01h 13m 56s" into seconds
///
/// Each unit is independently optional but must appear in h, m, s order,
/// with whitespace tolerated between groups. Text matching no unit at all
/// yields [`DEFAULT_UPDATE_SECS`]; matched text is clamped to
/// [`MIN_UPDATE_SECS`]. Pure string-to-integer mapping, no side effects.
pub fn parse_update_time(text: &str) -> u64 {
    let lower = text.trim().to_ascii_lowercase();
    let mut rest = lower.as_str();
    let mut total: u64 = 0;
    let mut matched = false;

    for (unit, seconds) in [('h', 3600u64), ('m', 60), ('s', 1)] {
        rest = rest.trim_start();

        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            continue;
        }

        let (number, tail) = rest.split_at(digits);
        let mut tail_chars = tail.chars();
        if tail_chars.next() != Some(unit) {
            continue;
        }

        if let Ok(value) = number.parse::<u64>() {
            total = total.saturating_add(value.saturating_mul(seconds));
            matched = true;
            rest = tail_chars.as_str();
        }
    }

    if !matched {
        return DEFAULT_UPDATE_SECS;
    }

    total.max(MIN_UPDATE_SECS)
}

/// Finds the section container via the ordered fallback chain
fn find_container(document: &Html) -> Option<ElementRef<'_>> {
    for raw in CONTAINER_SELECTORS {
        if let Ok(selector) = Selector::parse(raw) {
            if let Some(element) = document.select(&selector).next() {
                return Some(element);
            }
        }
    }
    None
}

/// Extracts a block's heading text, if it has one
fn block_heading(block: ElementRef<'_>) -> Option<String> {
    let selector = Selector::parse("h2").ok()?;

    block
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts a block's countdown hint, if any element carries the marker
fn block_countdown(block: ElementRef<'_>) -> Option<u64> {
    let selector = Selector::parse("p, div, span").ok()?;

    for element in block.select(&selector) {
        let text = element.text().collect::<String>().to_lowercase();
        if let Some(pos) = text.find(COUNTDOWN_MARKER) {
            return Some(parse_update_time(&text[pos + COUNTDOWN_MARKER.len()..]));
        }
    }

    None
}

/// Extracts item entries from a block's first list element
fn block_items(block: ElementRef<'_>) -> Vec<Item> {
    let mut items = Vec::new();

    if let (Ok(list_selector), Ok(entry_selector)) = (Selector::parse("ul"), Selector::parse("li"))
    {
        if let Some(list) = block.select(&list_selector).next() {
            for entry in list.select(&entry_selector) {
                let text = entry.text().collect::<String>();
                if let Some(item) = parse_item_entry(&text) {
                    items.push(item);
                }
            }
        }
    }

    items
}

/// Parses one list entry into an item
///
/// Entries follow the "Name xQuantity" convention. The split is taken from
/// the right so names containing " x" survive; a missing suffix means a
/// quantity of one, an unparsable suffix means zero. Entries with an empty
/// name are dropped.
fn parse_item_entry(text: &str) -> Option<Item> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    match text.rsplit_once(" x") {
        Some((name, quantity)) => {
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            let quantity = quantity.trim().parse::<u32>().unwrap_or(0);
            Some(Item::new(name, quantity))
        }
        None => Some(Item::new(text, 1)),
    }
}
