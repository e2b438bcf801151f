//! Record normalization
//!
//! Turns raw extracted fields into display values: `[YY.MM.DD]` date
//! prefixes, entity-decoded titles and peer counts.

use chrono::DateTime;

/// Genitive month names as printed by the trackers, January first
const MONTHS: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

/// Wrapper markup placed around bracketed parts of titles
const TITLE_WRAPPERS: [&str; 2] = ["<span class=\"brackets-pair\">", "</span>"];

/// Options applied to every record of a search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Normalizer {
    /// Prefix display names with the upload date
    pub torrent_date: bool,
    /// Require every token of a multi-word phrase in the display name
    pub phrase_filter: bool,
}

impl Normalizer {
    /// Builds the display name from an optional date prefix and a title
    pub fn display_name(&self, date: Option<String>, title: &str) -> String {
        match date {
            Some(prefix) if self.torrent_date => format!("{} {}", prefix, title),
            _ => title.to_string(),
        }
    }

    /// Returns true if a record with this display name should be emitted
    pub fn accepts(&self, name: &str, phrase: &str) -> bool {
        !self.phrase_filter || matches_phrase(name, phrase)
    }
}

/// Returns the two-digit number of a month name
///
/// A name matches if it contains one of the known forms.
pub fn month_number(name: &str) -> Option<u8> {
    MONTHS
        .iter()
        .position(|month| name.contains(month))
        .map(|idx| idx as u8 + 1)
}

/// Formats a localized date as a `[YY.MM.DD]` prefix
///
/// Month text that matches none of the known names is kept as-is.
///
/// # Example
///
/// ```
/// use tracker_scout::extract::normalize_date;
///
/// assert_eq!(normalize_date("5", "марта", "24"), "[24.03.05]");
/// assert_eq!(normalize_date("17", "ноября", "2023"), "[23.11.17]");
/// ```
pub fn normalize_date(day: &str, month: &str, year: &str) -> String {
    let month = match month_number(month) {
        Some(number) => {
            let name = MONTHS[usize::from(number - 1)];
            month.replace(name, &format!("{:02}", number))
        }
        None => month.to_string(),
    };

    format!(
        "[{}.{}.{}]",
        last_chars(year, 2),
        month,
        last_chars(&format!("0{}", day), 2)
    )
}

/// Parses a `"<day> <month> <year>"` field into a date prefix
///
/// Returns `None` if the field has fewer than three tokens.
pub fn date_prefix(raw: &str) -> Option<String> {
    let decoded = html_escape::decode_html_entities(raw);
    let mut tokens = decoded.split_whitespace();
    let (day, month, year) = (tokens.next()?, tokens.next()?, tokens.next()?);
    Some(normalize_date(day, month, year))
}

/// Formats a unix timestamp (UTC) as a `[YY.MM.DD]` prefix
pub fn timestamp_prefix(raw: &str) -> Option<String> {
    let secs: i64 = raw.trim().parse().ok()?;
    let moment = DateTime::from_timestamp(secs, 0)?;
    Some(moment.format("[%y.%m.%d]").to_string())
}

/// Strips wrapper tags and decodes HTML entities in a title
pub fn clean_title(raw: &str) -> String {
    let stripped = TITLE_WRAPPERS
        .iter()
        .fold(raw.to_string(), |title, wrapper| title.replace(wrapper, ""));
    html_escape::decode_html_entities(&stripped).into_owned()
}

/// Checks that every space-separated token of `phrase` occurs in `name`
///
/// Single-token phrases always match; comparison is case-sensitive.
pub fn matches_phrase(name: &str, phrase: &str) -> bool {
    let tokens: Vec<&str> = phrase.split_whitespace().collect();
    if tokens.len() < 2 {
        return true;
    }
    tokens.iter().all(|token| name.contains(token))
}

/// Parses a peer count, clamping negative values to zero
pub fn parse_peer_count(raw: &str) -> Option<u32> {
    let count: i64 = raw.trim().parse().ok()?;
    Some(count.clamp(0, i64::from(u32::MAX)) as u32)
}

/// Parses a result total of at most `max_digits` ASCII digits
///
/// Anything longer is not a total the tracker would print.
pub fn parse_total(raw: &str, max_digits: usize) -> Option<u32> {
    if raw.is_empty() || raw.len() > max_digits || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn last_chars(s: &str, n: usize) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(n)).collect()
}
