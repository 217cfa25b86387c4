//! S&P 1500 constituents from the Wikipedia index pages, and the universe
//! builder that joins them with per-company metadata.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use reqwest::StatusCode;
use scraper::{ElementRef, Html, Selector};

use crate::metadata::{CompanyInfo, MetadataError};
use crate::table::Table;

/// Wikipedia rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Pause between metadata lookups.
pub const DEFAULT_LOOKUP_DELAY: Duration = Duration::from_millis(200);

#[derive(thiserror::Error, Debug)]
pub enum ScrapeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} for {url}")]
    HttpStatus { status: StatusCode, url: String },
    #[error("no table with a Symbol column on {0}")]
    MissingTable(String),
    #[error("invalid selector: {0}")]
    Selector(String),
}

/// The three S&P indices that make up the 1500 composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexTable {
    Sp500,
    Sp400,
    Sp600,
}

impl IndexTable {
    pub const ALL: [IndexTable; 3] = [IndexTable::Sp500, IndexTable::Sp400, IndexTable::Sp600];

    pub fn path(self) -> &'static str {
        match self {
            IndexTable::Sp500 => "/wiki/List_of_S%26P_500_companies",
            IndexTable::Sp400 => "/wiki/List_of_S%26P_400_companies",
            IndexTable::Sp600 => "/wiki/List_of_S%26P_600_companies",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IndexTable::Sp500 => "S&P 500",
            IndexTable::Sp400 => "S&P 400",
            IndexTable::Sp600 => "S&P 600",
        }
    }
}

/// Class-share tickers use `-` on the quote side (BRK.B becomes BRK-B).
pub fn normalize_ticker(raw: &str) -> String {
    raw.trim().replace('.', "-")
}

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector(format!("{}: {:?}", css, e)))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Tickers from the first table on the page whose header row has a
/// `Symbol` column, already normalized. Blank cells are skipped.
pub fn parse_symbol_table(html: &str, source: &str) -> Result<Vec<String>, ScrapeError> {
    let document = Html::parse_document(html);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let header_sel = selector("th")?;
    let cell_sel = selector("td, th")?;

    for table in document.select(&table_sel) {
        let mut rows = table.select(&row_sel);
        let Some(header_row) = rows.next() else {
            continue;
        };
        let Some(col) = header_row
            .select(&header_sel)
            .position(|th| cell_text(th) == "Symbol")
        else {
            continue;
        };

        let symbols = rows
            .filter_map(|row| row.select(&cell_sel).nth(col))
            .map(|cell| normalize_ticker(&cell_text(cell)))
            .filter(|s| !s.is_empty())
            .collect();
        return Ok(symbols);
    }
    Err(ScrapeError::MissingTable(source.to_string()))
}

/// Client for the index constituent pages.
pub struct IndexScraper {
    base_url: String,
    http: reqwest::Client,
}

impl IndexScraper {
    pub fn new() -> Result<Self, ScrapeError> {
        Self::with_base_url(crate::config::UniverseConfig::DEFAULT_WIKI_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, ScrapeError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn fetch_html(&self, url: &str) -> Result<String, ScrapeError> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                status,
                url: url.to_string(),
            });
        }
        Ok(resp.text().await?)
    }

    pub async fn fetch_symbols(&self, index: IndexTable) -> Result<Vec<String>, ScrapeError> {
        let url = format!("{}{}", self.base_url, index.path());
        let html = self.fetch_html(&url).await?;
        let symbols = parse_symbol_table(&html, &url)?;
        tracing::info!("{}: {} symbols", index.name(), symbols.len());
        Ok(symbols)
    }

    /// All three indices concatenated in 500, 400, 600 order. A ticker listed
    /// on more than one page keeps its first position.
    pub async fn fetch_universe(&self) -> Result<Vec<String>, ScrapeError> {
        let mut seen = HashSet::new();
        let mut all = Vec::new();
        for index in IndexTable::ALL {
            for symbol in self.fetch_symbols(index).await? {
                if seen.insert(symbol.clone()) {
                    all.push(symbol);
                }
            }
        }
        Ok(all)
    }
}

/// Source of per-company metadata for the universe builder.
pub trait CompanySource {
    fn company_info(
        &self,
        ticker: &str,
    ) -> impl Future<Output = Result<Option<CompanyInfo>, MetadataError>>;
}

/// Tally of a universe build.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UniverseStats {
    pub found: usize,
    pub empty: usize,
    pub failed: usize,
}

/// Look up every ticker in order, pausing `delay` plus up to a tenth of it in
/// random jitter between lookups. Failed or empty lookups are skipped.
/// `on_done` is called once per ticker.
pub async fn build_universe<S, P>(
    source: &S,
    tickers: &[String],
    delay: Duration,
    mut on_done: P,
) -> (Table, UniverseStats)
where
    S: CompanySource,
    P: FnMut(&str),
{
    let mut table = Table::new(vec!["symbol".to_string()]);
    let mut stats = UniverseStats::default();

    for (i, ticker) in tickers.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay + jitter(delay)).await;
        }
        match source.company_info(ticker).await {
            Ok(Some(info)) => {
                table.push_record(info.fields());
                stats.found += 1;
            }
            Ok(None) => {
                tracing::warn!("{}: no company info returned, skipping", ticker);
                stats.empty += 1;
            }
            Err(e) => {
                tracing::warn!("{}: company info lookup failed: {}", ticker, e);
                stats.failed += 1;
            }
        }
        on_done(ticker);
    }
    (table, stats)
}

fn jitter(delay: Duration) -> Duration {
    let max_ms = (delay.as_millis() / 10) as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
}
