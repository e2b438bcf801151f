use crate::extract::{
    clean_title, date_prefix, extract_between, parse_total, Delimiters, ExtractionSchema,
    Normalizer,
};
use crate::output::Record;
use crate::trackers::{Query, SearchCategory, TotalResults, Tracker};
use crate::url::encode_legacy;
use url::Url;

const BASE_URL: &str = "https://megapeer.vip/";
const DOWNLOAD_URL: &str = "https://d.megapeer.vip/download/";

const TOTAL_PREFIX: &str = "<td style=\"padding-left: 10px;\">Всего: ";
const TOTAL_SUFFIX: &str = "</td>";
const TOTAL_MAX_DIGITS: usize = 4;
/// Listings carry no peer columns, every row reports this count
const LISTED_PEERS: u32 = 100;
const NOTHING_FOUND: &str = "Ничего не найдено";

/// Listing rows: date, topic path, title, download link, size
const SCHEMA: ExtractionSchema = ExtractionSchema {
    fragment_marker: "<td class=\"row1 tLeft\"><div class=\"topic-detail\">",
    fields: &[
        Delimiters::new("<span>Добавлен:</span> ", " в "),
        Delimiters::new("<a class=\"med tLink hl-tags bold\" href=\"/", "\">"),
        Delimiters::new("", "</a>"),
        Delimiters::new("<a class=\"gr-button tr-dl dl-stub\" href=\"", "\">"),
        Delimiters::new("\n", " <img src=\"/pic/icon_tor_arrow.png\"/>"),
    ],
};

/// Open tracker; no login, static category codes, no peer counts
#[derive(Debug, Clone)]
pub struct Megapeer {
    base: String,
    download: String,
}

impl Default for Megapeer {
    fn default() -> Self {
        Self {
            base: BASE_URL.to_string(),
            download: DOWNLOAD_URL.to_string(),
        }
    }
}

impl Megapeer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points the tracker at other hosts, e.g. a mirror
    pub fn with_urls(base: &str, download: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(base)?.to_string(),
            download: Url::parse(download)?.to_string(),
        })
    }

    /// Resolves a link found in the listing against the base URL
    fn join(&self, href: &str) -> String {
        Url::parse(&self.base)
            .and_then(|base| base.join(href))
            .map(|url| url.to_string())
            .unwrap_or_else(|_| format!("{}{}", self.base, href.trim_start_matches('/')))
    }
}

impl Tracker for Megapeer {
    fn name(&self) -> &'static str {
        "megapeer"
    }

    fn engine_url(&self) -> &str {
        &self.base
    }

    fn origins(&self) -> Vec<String> {
        vec![self.base.clone(), self.download.clone()]
    }

    fn default_headers(&self) -> Vec<(&'static str, String)> {
        vec![("referer", format!("{}browse.php", self.base))]
    }

    fn category_code(&self, category: SearchCategory) -> String {
        let code = match category {
            SearchCategory::Music => 94,
            SearchCategory::Games => 28,
            SearchCategory::Software => 107,
            SearchCategory::Books => 52,
            SearchCategory::All
            | SearchCategory::Movies
            | SearchCategory::Tv
            | SearchCategory::Anime
            | SearchCategory::Pictures => 0,
        };
        code.to_string()
    }

    fn page_url(&self, query: &Query, page: u32) -> String {
        let mut url = format!(
            "{}browse.php?search={}&cat={}",
            self.base,
            encode_legacy(&query.phrase),
            query.category_code
        );
        if page > 0 {
            url.push_str(&format!("&page={}", page));
        }
        url
    }

    fn total_results(&self, page: &str) -> TotalResults {
        let total = extract_between(page, TOTAL_PREFIX, TOTAL_SUFFIX)
            .and_then(|t| parse_total(t, TOTAL_MAX_DIGITS));
        match total {
            Some(0) => TotalResults::NoResults,
            Some(total) => TotalResults::Count(total),
            None if page.contains(NOTHING_FOUND) => TotalResults::NoResults,
            None => TotalResults::Unrecognized,
        }
    }

    fn extract_records(&self, page: &str, query: &Query, normalizer: &Normalizer) -> Vec<Record> {
        SCHEMA
            .field_sets(page)
            .filter_map(|fields| {
                let title = clean_title(&fields[2]);
                let name = normalizer.display_name(date_prefix(&fields[0]), &title);
                if !normalizer.accepts(&name, &query.phrase) {
                    return None;
                }
                Some(Record {
                    engine_url: self.base.clone(),
                    name,
                    link: self.join(&fields[3]),
                    desc_link: Some(self.join(&fields[1])),
                    size: fields[4].trim().to_string(),
                    seeds: Some(LISTED_PEERS),
                    leech: Some(LISTED_PEERS),
                })
            })
            .collect()
    }
}
