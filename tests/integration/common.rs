//! Shared fixtures: cp1251 pages, tracker markup and test configuration

use encoding_rs::WINDOWS_1251;
use std::ops::RangeInclusive;
use std::path::Path;
use tracker_scout::config::{Config, StatePaths};
use tracker_scout::session::SessionJar;
use wiremock::ResponseTemplate;

/// Encodes text the way the trackers serve it
pub fn cp1251(text: &str) -> Vec<u8> {
    WINDOWS_1251.encode(text).0.into_owned()
}

/// A 200 response carrying a Windows-1251 page
pub fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_bytes(cp1251(body))
        .insert_header("content-type", "text/html; charset=windows-1251")
}

/// Configuration with short timeouts and no date prefixes
pub fn test_config() -> Config {
    Config {
        torrent_date: false,
        timeout_secs: 2,
        ..Config::default()
    }
}

pub fn state_paths(dir: &Path, engine: &str) -> StatePaths {
    test_config().state_paths(dir, engine)
}

pub fn megapeer_row(id: u32) -> String {
    format!(
        "<tr><td class=\"row1 tLeft\"><div class=\"topic-detail\">\
         <span>Добавлен:</span> 5 марта 2024 в 12:30</div>\
         <a class=\"med tLink hl-tags bold\" href=\"/torrent/{id}/\">Doctor Who s{id}</a>\
         <a class=\"gr-button tr-dl dl-stub\" href=\"/download/{id}\">\n1.{id} GB <img src=\"/pic/icon_tor_arrow.png\"/></a></td></tr>\n"
    )
}

/// A megapeer listing; the total line is only present on the first page
pub fn megapeer_page(total: Option<u32>, ids: RangeInclusive<u32>) -> String {
    let mut page = String::from("<html><body><table>");
    if let Some(total) = total {
        page.push_str(&format!("<tr><td style=\"padding-left: 10px;\">Всего: {}</td></tr>", total));
    }
    for id in ids {
        page.push_str(&megapeer_row(id));
    }
    page.push_str("</table></body></html>");
    page
}

pub fn rutracker_row(id: u32) -> String {
    format!(
        "<tr id=\"trs-tr-{id}\" class=\"tCenter hl-tr\">\
         <td class=\"row1 t-title-col tt\"><div class=\"wbr t-title\">\
         <a data-topic_id=\"{id}\" class=\"med tLink tt-text ts-text hl-tags bold\" href=\"viewtopic.php?t={id}\">Ubuntu {id}</a></div></td>\
         <td class=\"row4 small nowrap tor-size\" data-ts_text=\"1073741824\"><a class=\"small tr-dl dl-stub\" href=\"dl.php?t={id}\">1 GB</a></td>\
         <td class=\"row4 nowrap\" data-ts_text=\"7\"><b class=\"seedmed\">7</b></td>\
         <td class=\"row4 leechmed bold\" title=\"Личи\">2</td>\
         <td class=\"row4 small nowrap\" data-ts_text=\"1709640000\"><p>5-Мар-24</p></td></tr>\n"
    )
}

/// A rutracker result page rendered for a logged-in user
pub fn rutracker_page(total: u32, ids: RangeInclusive<u32>) -> String {
    let mut page = String::from(
        "<html><body><a id=\"logged-in-username\">USERNAME</a><i class=\"log-out-icon\"></i>",
    );
    page.push_str(&format!(
        "<p class=\"med bold\">Результатов поиска: {} <span class=\"normal\">(max: 500)</span></p>",
        total
    ));
    page.push_str("<table id=\"tor-tbl\">");
    for id in ids {
        page.push_str(&rutracker_row(id));
    }
    page.push_str("</table></body></html>");
    page
}

/// What rutracker serves instead of results when the session is gone
pub const RUTRACKER_LOGIN_PAGE: &str =
    "<html><body><div class=\"login-form-full\"><form action=\"login.php\"></form></div></body></html>";

/// Category picker with one movie group
pub const RUTRACKER_PICKER: &str = "<html><body><p>Не найдено</p>\
    <a class=\"log-out-icon\"></a>\
    <select id=\"fs-main\" name=\"f[]\">\
    <option value=\"-1\">&nbsp;Все имеющиеся</option>\
    <optgroup label=\"&nbsp;Кино, Видео и ТВ\">\
    <option id=\"fs-7\" value=\"7\" class=\"root_forum has_sf\">Зарубежное кино</option>\
    <option id=\"fs-187\" value=\"187\" class=\"fp-7\">&nbsp;|- Классика</option>\
    <option id=\"fs-22\" value=\"22\" class=\"root_forum\">Документальные фильмы</option>\
    </optgroup>\
    </select></body></html>";

/// Stores a session cookie for `base` the way a previous run would have
pub fn write_session_cookie(base: &str, path: &Path) {
    let url = url::Url::parse(base).unwrap();
    let jar = SessionJar::new();
    jar.set(&url, "bb_session", "stored");
    jar.save(path).unwrap();
}
