use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FEED_URL: &str = "https://open.er-api.com/v6/latest/USD";

/// Used when the feed carries no LKR entry.
pub const FIXED_USD_LKR: f64 = 320.0;

/// Currencies derived from the USD cross rates; USD itself maps straight to
/// the LKR rate.
const DERIVED: &[&str] = &["EUR", "GBP", "AUD", "SGD"];

/// Whole-LKR rates served when the feed is unreachable or malformed.
const FALLBACK_RATES: &[(&str, i64)] = &[
    ("USD", 320),
    ("EUR", 348),
    ("GBP", 406),
    ("AUD", 209),
    ("SGD", 238),
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CurrencyRates {
    pub base: String,
    pub source: &'static str,
    /// LKR per one unit of the keyed currency, rounded to the whole rupee.
    pub rates: BTreeMap<String, i64>,
}

#[derive(Debug, Deserialize)]
struct Feed {
    rates: BTreeMap<String, f64>,
}

pub fn fallback_rates() -> CurrencyRates {
    CurrencyRates {
        base: "LKR".to_string(),
        source: "fallback",
        rates: FALLBACK_RATES
            .iter()
            .map(|(code, rate)| ((*code).to_string(), *rate))
            .collect(),
    }
}

/// Derives whole-rupee rates from a USD-base cross-rate table. Returns None
/// when an expected currency is missing or non-positive, which the caller
/// treats the same as a failed fetch.
pub fn derive_rates(per_usd: &BTreeMap<String, f64>) -> Option<BTreeMap<String, i64>> {
    let usd_lkr = per_usd
        .get("LKR")
        .copied()
        .filter(|v| *v > 0.0)
        .unwrap_or(FIXED_USD_LKR);

    let mut out = BTreeMap::new();
    out.insert("USD".to_string(), usd_lkr.round() as i64);
    for code in DERIVED {
        let rate = per_usd.get(*code).copied().filter(|v| *v > 0.0)?;
        out.insert((*code).to_string(), (usd_lkr / rate).round() as i64);
    }
    Some(out)
}

async fn fetch_live(client: &reqwest::Client, feed_url: &str) -> anyhow::Result<CurrencyRates> {
    let response = client
        .get(feed_url)
        .send()
        .await
        .with_context(|| format!("GET {feed_url}"))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("currency feed returned {status}");
    }

    let feed: Feed = response.json().await.context("parse currency feed")?;
    let rates = derive_rates(&feed.rates)
        .ok_or_else(|| anyhow::anyhow!("currency feed is missing expected currencies"))?;

    Ok(CurrencyRates {
        base: "LKR".to_string(),
        source: "live",
        rates,
    })
}

/// Fetches the cross-rate feed and shapes it into LKR rates; any failure is
/// substituted with the static table and logged, never surfaced.
pub async fn rates(client: &reqwest::Client, feed_url: &str) -> CurrencyRates {
    match fetch_live(client, feed_url).await {
        Ok(rates) => rates,
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "currency feed failed, serving fallback");
            fallback_rates()
        }
    }
}

pub fn http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("build currency/weather http client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eur_rate_derives_from_cross_rate_and_fixed_lkr() {
        let feed = BTreeMap::from([
            ("EUR".to_string(), 0.92),
            ("GBP".to_string(), 0.79),
            ("AUD".to_string(), 1.53),
            ("SGD".to_string(), 1.34),
        ]);

        let rates = derive_rates(&feed).unwrap();
        assert_eq!(rates["EUR"], (320.0_f64 / 0.92).round() as i64);
        assert_eq!(rates["EUR"], 348);
        assert_eq!(rates["USD"], 320);
    }

    #[test]
    fn feed_lkr_entry_wins_over_fixed_rate() {
        let feed = BTreeMap::from([
            ("LKR".to_string(), 300.0),
            ("EUR".to_string(), 0.92),
            ("GBP".to_string(), 0.79),
            ("AUD".to_string(), 1.53),
            ("SGD".to_string(), 1.34),
        ]);

        let rates = derive_rates(&feed).unwrap();
        assert_eq!(rates["USD"], 300);
        assert_eq!(rates["EUR"], (300.0_f64 / 0.92).round() as i64);
    }

    #[test]
    fn missing_currency_yields_none() {
        let feed = BTreeMap::from([("EUR".to_string(), 0.92)]);
        assert!(derive_rates(&feed).is_none());
    }

    #[tokio::test]
    async fn unreachable_feed_serves_fallback_table() {
        let client = http_client().unwrap();
        // Port 1 is never bound in the test environment.
        let out = rates(&client, "http://127.0.0.1:1/latest/USD").await;
        assert_eq!(out.source, "fallback");
        assert_eq!(out.rates["USD"], 320);
    }
}
