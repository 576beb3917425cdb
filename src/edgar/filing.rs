use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate};
use log::{info, warn};
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use super::parsing::{ExtractedItems, ItemExtractor};
use super::rate_limiter::RateLimiter;
use super::report::ReportType;
use super::utils::fetch_text;
use crate::core::config::FetchConfig;

pub const SEC_BASE_URL: &str = "https://www.sec.gov";

static DOCUMENT_TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"table[summary="Document Format Files"]"#).unwrap());
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").unwrap());
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// One filing listed in a company's EDGAR Atom feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub filing_date: NaiveDate,
    pub index_url: String,
}

pub fn company_feed_url(company: &str, form: &ReportType) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/cgi-bin/browse-edgar", SEC_BASE_URL))?;
    url.query_pairs_mut()
        .append_pair("action", "getcompany")
        .append_pair("CIK", company)
        .append_pair("type", &form.to_string())
        .append_pair("owner", "exclude")
        .append_pair("count", "100")
        .append_pair("output", "atom");
    Ok(url)
}

/// Entries of a company filing feed, in feed order. Entries without a date or link are skipped.
pub fn parse_filing_feed(xml: &str) -> Result<Vec<FeedEntry>> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| anyhow!("Failed to parse filing feed: {}", e))?;

    let entries = doc
        .descendants()
        .filter(|n| n.tag_name().name() == "entry")
        .filter_map(|entry| {
            let filing_date = entry
                .descendants()
                .find(|n| n.tag_name().name() == "filing-date")
                .and_then(|n| n.text())
                .and_then(|text| NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok());
            let index_url = entry
                .children()
                .find(|n| n.tag_name().name() == "link")
                .and_then(|n| n.attribute("href"))
                .or_else(|| {
                    entry
                        .descendants()
                        .find(|n| n.tag_name().name() == "filing-href")
                        .and_then(|n| n.text())
                })
                .map(|href| href.trim().to_string());

            match (filing_date, index_url) {
                (Some(filing_date), Some(index_url)) => Some(FeedEntry {
                    filing_date,
                    index_url,
                }),
                _ => {
                    warn!("Skipping feed entry without filing date or link");
                    None
                }
            }
        })
        .collect();

    Ok(entries)
}

/// Entries filed in the most recent year present in the feed.
pub fn latest_year_entries(entries: &[FeedEntry]) -> Vec<FeedEntry> {
    let Some(latest_year) = entries.iter().map(|e| e.filing_date.year()).max() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter(|e| e.filing_date.year() == latest_year)
        .cloned()
        .collect()
}

/// URL of the primary `.htm` document of `form` listed on a filing index page.
pub fn primary_document_url(index_html: &str, form: &ReportType) -> Option<String> {
    let page = Html::parse_document(index_html);
    let table = page.select(&DOCUMENT_TABLE).next()?;
    let form = form.to_string();

    table.select(&ROW).find_map(|row| {
        let cells: Vec<_> = row.select(&CELL).collect();
        if cells.len() < 4 || cells[3].text().collect::<String>().trim() != form {
            return None;
        }
        let href = cells[2].select(&LINK).next()?.value().attr("href")?;
        if !href.ends_with(".htm") {
            return None;
        }
        // Inline XBRL filings link through the viewer; the raw document sits behind it.
        Some(format!("{}{}", SEC_BASE_URL, href).replace("/ix?doc=", ""))
    })
}

/// Talks to EDGAR on behalf of the extractor.
pub struct Edgar {
    client: Client,
    config: FetchConfig,
    rate_limiter: RateLimiter,
}

impl Edgar {
    pub fn new(config: FetchConfig) -> Self {
        let rate_limiter = RateLimiter::new(config.max_concurrent);
        Self {
            client: Client::new(),
            config,
            rate_limiter,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    async fn get(&self, url: &Url) -> Result<String> {
        fetch_text(&self.client, url, &self.config.user_agent, &self.rate_limiter).await
    }

    /// Extracts items from the newest year's filings of `form`, returning the
    /// first non-empty result. An empty map means nothing could be located.
    pub async fn fetch_filing_items(
        &self,
        ticker: &str,
        form: &ReportType,
        extractor: &ItemExtractor,
    ) -> Result<ExtractedItems> {
        let feed_url = company_feed_url(ticker, form)?;
        info!("Fetching {} filings for {} from {}", form, ticker, feed_url);

        let feed = self.get(&feed_url).await?;
        let entries = latest_year_entries(&parse_filing_feed(&feed)?);
        info!("{} {} filing(s) in the latest year", entries.len(), form);

        for entry in entries {
            let index_page = self.get(&Url::parse(&entry.index_url)?).await?;
            let Some(document_url) = primary_document_url(&index_page, form) else {
                warn!("No primary {} document listed at {}", form, entry.index_url);
                continue;
            };

            let html = self.get(&Url::parse(&document_url)?).await?;
            let extractor = extractor.clone();
            let items = tokio::task::spawn_blocking(move || extractor.extract(&html)).await??;

            if !items.is_empty() {
                info!(
                    "Extracted {} item(s) from {} filed {}",
                    items.len(),
                    document_url,
                    entry.filing_date
                );
                return Ok(items);
            }
            warn!("No items located in {}", document_url);
        }

        Ok(ExtractedItems::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>APPLE INC  (0000320193)</title>
  <entry>
    <category label="form type" scheme="https://www.sec.gov/" term="10-K"/>
    <content type="text/xml">
      <accession-number>0000320193-24-000123</accession-number>
      <filing-date>2024-11-01</filing-date>
      <filing-href>https://www.sec.gov/Archives/edgar/data/320193/000032019324000123/0000320193-24-000123-index.htm</filing-href>
      <filing-type>10-K</filing-type>
    </content>
    <link href="https://www.sec.gov/Archives/edgar/data/320193/000032019324000123/0000320193-24-000123-index.htm" rel="alternate" type="text/html"/>
    <title>10-K  - Annual report</title>
  </entry>
  <entry>
    <content type="text/xml">
      <filing-date>2023-11-03</filing-date>
      <filing-href>https://www.sec.gov/Archives/edgar/data/320193/000032019323000106/0000320193-23-000106-index.htm</filing-href>
    </content>
  </entry>
  <entry>
    <title>missing date</title>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_filing_feed() {
        let entries = parse_filing_feed(FEED).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].filing_date,
            NaiveDate::from_ymd_opt(2024, 11, 1).unwrap()
        );
        assert!(entries[0].index_url.ends_with("0000320193-24-000123-index.htm"));
        assert!(entries[1].index_url.ends_with("0000320193-23-000106-index.htm"));

        let latest = latest_year_entries(&entries);
        assert_eq!(latest, vec![entries[0].clone()]);
        assert!(latest_year_entries(&[]).is_empty());
    }

    #[test]
    fn test_primary_document_url() {
        let index = r#"<html><body>
<table class="tableFile" summary="Document Format Files">
  <tr><th>Seq</th><th>Description</th><th>Document</th><th>Type</th><th>Size</th></tr>
  <tr><td>1</td><td>10-K</td><td><a href="/ix?doc=/Archives/edgar/data/320193/000032019324000123/aapl-20240928.htm">aapl-20240928.htm</a></td><td>10-K</td><td>1234</td></tr>
  <tr><td>2</td><td>EX-21.1</td><td><a href="/Archives/edgar/data/320193/000032019324000123/a10-kexhibit2111.htm">a10-kexhibit2111.htm</a></td><td>EX-21.1</td><td>99</td></tr>
</table>
</body></html>"#;

        assert_eq!(
            primary_document_url(index, &ReportType::Form10K).as_deref(),
            Some("https://www.sec.gov/Archives/edgar/data/320193/000032019324000123/aapl-20240928.htm")
        );
        assert_eq!(primary_document_url(index, &ReportType::Form10Q), None);
        assert_eq!(primary_document_url("<html></html>", &ReportType::Form10K), None);
    }

    #[test]
    fn test_company_feed_url() {
        let url = company_feed_url("AAPL", &ReportType::Form10K).unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.sec.gov/cgi-bin/browse-edgar?action=getcompany&CIK=AAPL&type=10-K&owner=exclude&count=100&output=atom"
        );
    }
}
