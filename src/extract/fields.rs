//! Positional field extraction
//!
//! Fields are pulled out of a markup fragment with an ordered list of
//! (prefix, suffix) delimiter pairs. Each pair performs one forward substring
//! search on the remainder left by the previous pair, so the scan is linear
//! and never revisits consumed input.

/// One (prefix, suffix) pair of an extraction schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    /// Text preceding the field; empty means "start at the current position"
    pub prefix: &'static str,
    /// Text terminating the field
    pub suffix: &'static str,
}

impl Delimiters {
    pub const fn new(prefix: &'static str, suffix: &'static str) -> Self {
        Self { prefix, suffix }
    }
}

/// A fragment marker plus the field delimiters applied to each fragment
#[derive(Debug, Clone, Copy)]
pub struct ExtractionSchema {
    /// Marker the page is split on; each piece is one candidate fragment
    pub fragment_marker: &'static str,
    pub fields: &'static [Delimiters],
}

impl ExtractionSchema {
    /// Returns the complete raw field sets found in a page, in page order
    ///
    /// Fragments that do not yield every field are skipped; pages contain
    /// boilerplate between the item fragments.
    pub fn field_sets<'a>(&'a self, page: &'a str) -> impl Iterator<Item = Vec<String>> + 'a {
        split_fragments(page, self.fragment_marker)
            .filter_map(move |fragment| extract_complete(fragment, self.fields))
    }
}

/// Extracts the ordered fields of a fragment
///
/// Stops at the first pair whose prefix or suffix cannot be found and returns
/// the fields extracted up to that point. A short result is the expected
/// outcome for fragments that are not items.
///
/// # Arguments
///
/// * `fragment` - The markup to scan
/// * `schema` - Delimiter pairs, one per field
///
/// # Example
///
/// ```
/// use tracker_scout::extract::{extract_fields, Delimiters};
///
/// const SCHEMA: &[Delimiters] = &[Delimiters::new("<b>", "</b>"), Delimiters::new("", "|")];
/// let fields = extract_fields("x<b>name</b>42|rest", SCHEMA);
/// assert_eq!(fields, vec!["name", "42"]);
/// ```
pub fn extract_fields(fragment: &str, schema: &[Delimiters]) -> Vec<String> {
    let mut fields = Vec::with_capacity(schema.len());
    let mut rest = fragment;

    for pair in schema {
        let start = if pair.prefix.is_empty() {
            rest
        } else {
            match rest.find(pair.prefix) {
                Some(idx) => &rest[idx + pair.prefix.len()..],
                None => break,
            }
        };

        let Some(end) = start.find(pair.suffix) else {
            break;
        };

        fields.push(start[..end].to_string());
        rest = &start[end + pair.suffix.len()..];
    }

    fields
}

/// Extracts a fragment's fields only if every pair matched
pub fn extract_complete(fragment: &str, schema: &[Delimiters]) -> Option<Vec<String>> {
    let fields = extract_fields(fragment, schema);
    (fields.len() == schema.len()).then_some(fields)
}

/// Returns the text between the first `prefix` and the following `suffix`
pub fn extract_between<'a>(text: &'a str, prefix: &str, suffix: &str) -> Option<&'a str> {
    let start = text.find(prefix)? + prefix.len();
    let len = text[start..].find(suffix)?;
    Some(&text[start..start + len])
}

/// Splits a page into candidate fragments on `marker`
pub fn split_fragments<'a>(page: &'a str, marker: &'a str) -> impl Iterator<Item = &'a str> {
    page.split(marker)
}
