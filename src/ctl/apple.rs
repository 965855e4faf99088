use crate::{
    cert::CertRecord,
    ctl::{Ctl, EntryMap, TrustSource, VerifyResult},
    error::{AppResult, ErrorReason},
    fetch::Fetcher,
    tabular::Row,
};
use chrono::{NaiveDate, Utc};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

pub const APPLE_KB_URL: &str = "https://support.apple.com/en-us/HT209143";

const FINGERPRINT_COLUMN: &str = "FINGERPRINT (SHA-256)";
const NAME_COLUMN: &str = "CERTIFICATE NAME";

/// Apple publishes its trust store as a knowledge-base page: a landing
/// page carrying the publish date and a link to the current store, whose
/// detail page holds the trusted and blocked certificate tables.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AppleCtl {
    #[serde(flatten)]
    pub ctl: Ctl,
    #[serde(default = "default_publish_url")]
    pub publish_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub published_date: String,
}

impl Default for AppleCtl {
    fn default() -> Self {
        Self {
            ctl: Ctl::default(),
            publish_url: default_publish_url(),
            published_date: String::new(),
        }
    }
}

fn default_publish_url() -> String {
    APPLE_KB_URL.to_owned()
}

impl AppleCtl {
    /// True when `published` is strictly newer than the stored publish
    /// date. An absent or unparseable stored date never blocks an update.
    fn is_newer(&self, published: &str) -> AppResult<bool> {
        let new_date = parse_date(published)?;
        match parse_date(&self.published_date) {
            Ok(stored) => Ok(new_date > stored),
            Err(_) => Ok(true),
        }
    }

    /// Replace the vendor state from a fetched detail page. Both tables
    /// must parse before anything is committed.
    pub fn ingest_detail(&mut self, published: String, html: &str) -> AppResult<()> {
        let doc = Html::parse_document(html);

        let trusted_rows = certificate_table(
            &doc,
            "trusted",
            &["Trusted Certificates", "Trusted certificates"],
        )?;
        let trusted = extract_entries(&trusted_rows);
        if trusted.is_empty() {
            return Err(
                ErrorReason::Scrape("trusted certificate table has no entries".to_owned()).into(),
            );
        }

        let blocked_rows = certificate_table(
            &doc,
            "blocked",
            &["Blocked Certificates", "Blocked certificates"],
        )?;
        let removed = extract_entries(&blocked_rows);

        info!(
            "apple trust store {}: {} trusted, {} blocked roots",
            published,
            trusted.len(),
            removed.len()
        );
        self.ctl.trusted = trusted;
        self.ctl.removed = removed;
        self.published_date = published;
        self.ctl.updated_at = Some(Utc::now());
        Ok(())
    }
}

impl TrustSource for AppleCtl {
    fn name(&self) -> &'static str {
        "Apple"
    }

    fn removal_reference(&self) -> &'static str {
        APPLE_KB_URL
    }

    async fn fetch(&mut self, fetcher: &Fetcher) -> AppResult<()> {
        let landing = fetcher.get_text(&self.publish_url).await?;
        let (published, link) = {
            let doc = Html::parse_document(&landing);
            let published = published_date(&doc)?;
            if !self.is_newer(&published)? {
                debug!(
                    "apple trust store unchanged since {}, skipping",
                    self.published_date
                );
                return Ok(());
            }
            (published, trust_store_link(&doc)?)
        };

        let detail = fetcher.get_text(&link).await?;
        self.ingest_detail(published, &detail)
    }

    fn verify<'a>(&self, certs: &'a [CertRecord], allow: &EntryMap) -> VerifyResult<'a> {
        self.ctl.verify(certs, allow)
    }
}

/// Publish dates appear in ISO form or written out ("September 2, 2022");
/// both, with or without zero padding, are accepted.
pub(crate) fn parse_date(text: &str) -> AppResult<NaiveDate> {
    const FORMATS: [&str; 2] = ["%Y-%m-%d", "%B %d, %Y"];
    let trimmed = text.trim();
    for format in FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    Err(ErrorReason::DateFormat(text.to_owned()).into())
}

fn selector(css: &str) -> AppResult<Selector> {
    Selector::parse(css).map_err(|_| ErrorReason::Scrape(format!("bad selector {css:?}")).into())
}

fn normalize_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// The date element following the "Published Date:" label.
fn published_date(doc: &Html) -> AppResult<String> {
    let spans = selector("span")?;
    for span in doc.select(&spans) {
        if normalize_text(span) != "Published Date:" {
            continue;
        }
        for sibling in span.next_siblings() {
            if let Some(element) = ElementRef::wrap(sibling) {
                if element.value().name() == "time" {
                    return Ok(normalize_text(element));
                }
            }
        }
    }
    Err(ErrorReason::Scrape("publish date not found".to_owned()).into())
}

/// The first link below the "Current Trust Store" heading.
fn trust_store_link(doc: &Html) -> AppResult<String> {
    let headings = selector("h2")?;
    let anchors = selector("a")?;
    for heading in doc.select(&headings) {
        if normalize_text(heading) != "Current Trust Store" {
            continue;
        }
        for sibling in heading.next_siblings() {
            let Some(element) = ElementRef::wrap(sibling) else {
                continue;
            };
            if let Some(anchor) = element.select(&anchors).next() {
                if let Some(href) = anchor.value().attr("href") {
                    return Ok(href.to_owned());
                }
            }
        }
    }
    Err(ErrorReason::Scrape("current trust store link not found".to_owned()).into())
}

/// Locate a certificate table by heading id or title and read it into
/// header-keyed rows. Column names are uppercased so minor capitalization
/// drift on the page does not break the contract.
fn certificate_table(doc: &Html, id: &str, titles: &[&str]) -> AppResult<Vec<Row>> {
    let headings = selector("h2")?;
    let tables = selector("table")?;
    let header_cells = selector("th")?;
    let table_rows = selector("tr")?;
    let cells = selector("td")?;

    for heading in doc.select(&headings) {
        let title = normalize_text(heading);
        if heading.value().id() != Some(id) && !titles.contains(&title.as_str()) {
            continue;
        }
        let Some(table) = heading
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find_map(|element| {
                if element.value().name() == "table" {
                    Some(element)
                } else {
                    element.select(&tables).next()
                }
            })
        else {
            continue;
        };

        let headers: Vec<String> = table
            .select(&header_cells)
            .map(|cell| normalize_text(cell).to_uppercase())
            .collect();
        if headers.is_empty() {
            return Err(ErrorReason::Scrape(format!("table {id:?} has no header row")).into());
        }

        let mut rows = Vec::new();
        for row in table.select(&table_rows) {
            let values: Vec<String> = row.select(&cells).map(normalize_text).collect();
            // Drops the header row (no td cells) and ragged rows alike.
            if values.len() != headers.len() {
                continue;
            }
            rows.push(headers.iter().cloned().zip(values).collect());
        }
        return Ok(rows);
    }
    Err(ErrorReason::Scrape(format!("certificate table {id:?} not found")).into())
}

fn extract_entries(rows: &[Row]) -> EntryMap {
    let mut entries = EntryMap::new();
    for row in rows {
        let Some(fingerprint) = row.get(FINGERPRINT_COLUMN) else {
            continue;
        };
        let fingerprint = fingerprint.replace(' ', "").to_uppercase();
        if fingerprint.is_empty() {
            continue;
        }
        let name = row.get(NAME_COLUMN).cloned().unwrap_or_default();
        entries.insert(fingerprint, name);
    }
    entries
}
