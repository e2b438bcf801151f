use crate::extract::{
    clean_title, extract_between, parse_peer_count, parse_total, timestamp_prefix, Delimiters,
    ExtractionSchema, Normalizer,
};
use crate::output::Record;
use crate::session::LoginSpec;
use crate::taxonomy::{TaxonomyRules, TaxonomySource};
use crate::trackers::{Query, SearchCategory, SessionStatus, TotalResults, Tracker};
use crate::url::encode_legacy;
use url::Url;

const BASE_URL: &str = "https://rutracker.org/forum/";

const LOGGED_IN_MARKER: &str = "log-out-icon";
const LOGIN_FORM_MARKER: &str = "login-form-full";
const TOTAL_PREFIX: &str = "Результатов поиска: ";
const TOTAL_SUFFIX: &str = " <span";
const TOTAL_MAX_DIGITS: usize = 3;
const NOTHING_FOUND: &str = "Не найдено";

/// Phrase that matches nothing; its result page still renders the full category picker
const PICKER_PHRASE: &str = "ABCDZASDFEFCS";

/// Listing rows: topic id, title, size in bytes, seeds, leechers, upload time
const SCHEMA: ExtractionSchema = ExtractionSchema {
    fragment_marker: "<tr id=\"trs-tr-",
    fields: &[
        Delimiters::new("data-topic_id=\"", "\""),
        Delimiters::new("\">", "</a>"),
        Delimiters::new("tor-size\" data-ts_text=\"", "\""),
        Delimiters::new("data-ts_text=\"", "\""),
        Delimiters::new("Личи\">", "</"),
        Delimiters::new("ata-ts_text=\"", "\""),
    ],
};

/// Members-only tracker with a dynamic category tree
#[derive(Debug, Clone)]
pub struct Rutracker {
    base: String,
}

impl Default for Rutracker {
    fn default() -> Self {
        Self {
            base: BASE_URL.to_string(),
        }
    }
}

impl Rutracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points the tracker at another forum root, e.g. a mirror
    pub fn with_base_url(base: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(base)?.to_string(),
        })
    }

    fn download_url(&self, topic_id: &str) -> String {
        format!("{}dl.php?t={}", self.base, topic_id)
    }

    fn topic_url(&self, topic_id: &str) -> String {
        format!("{}viewtopic.php?t={}", self.base, topic_id)
    }

    fn search_url(&self, phrase: &str, code: &str) -> String {
        format!("{}tracker.php?nm={}&f={}", self.base, encode_legacy(phrase), code)
    }

    fn record(&self, fields: &[String], query: &Query, normalizer: &Normalizer) -> Option<Record> {
        let topic_id = &fields[0];
        let title = clean_title(&fields[1]);
        let name = normalizer.display_name(timestamp_prefix(&fields[5]), &title);
        if !normalizer.accepts(&name, &query.phrase) {
            return None;
        }

        Some(Record {
            engine_url: self.base.clone(),
            name,
            link: self.download_url(topic_id),
            desc_link: Some(self.topic_url(topic_id)),
            size: fields[2].clone(),
            seeds: Some(parse_peer_count(&fields[3]).unwrap_or(0)),
            leech: Some(parse_peer_count(&fields[4]).unwrap_or(0)),
        })
    }
}

impl Tracker for Rutracker {
    fn name(&self) -> &'static str {
        "rutracker"
    }

    fn engine_url(&self) -> &str {
        &self.base
    }

    fn origins(&self) -> Vec<String> {
        vec![self.base.clone()]
    }

    fn category_code(&self, _category: SearchCategory) -> String {
        "-1".to_string()
    }

    fn page_url(&self, query: &Query, page: u32) -> String {
        let mut url = self.search_url(&query.phrase, &query.category_code);
        if page > 0 {
            url.push_str(&format!("&start={}", page * crate::scrape::PAGE_SIZE));
        }
        url
    }

    fn session_status(&self, page: &str) -> SessionStatus {
        if page.contains(LOGGED_IN_MARKER) {
            SessionStatus::Active
        } else if page.contains(LOGIN_FORM_MARKER) {
            SessionStatus::LoggedOut
        } else {
            SessionStatus::Unrecognized
        }
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
            .filter_map(|fields| self.record(&fields, query, normalizer))
            .collect()
    }

    fn login_spec(&self) -> Option<LoginSpec> {
        Some(LoginSpec {
            url: format!("{}login.php", self.base),
            session_cookie: "bb_session",
            username_field: "login_username",
            password_field: "login_password",
            extra_fields: vec![("login", "Вход")],
            preset_cookies: vec![("bb_ssl", "1")],
        })
    }

    fn taxonomy(&self) -> Option<TaxonomySource> {
        Some(TaxonomySource {
            url: self.search_url(PICKER_PHRASE, ""),
            rules: TaxonomyRules::rutracker(),
        })
    }
}
