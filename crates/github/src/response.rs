use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::{HeaderMap, LINK};
use reqwest::StatusCode;
use url::Url;

const RATE_LIMIT_HEADER: &str = "x-ratelimit-limit";
const RATE_REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RATE_RESET_HEADER: &str = "x-ratelimit-reset";

/// Metadata from one HTTP exchange with the API.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub url: Url,
    pub headers: HeaderMap,
    pub next_page: Option<u32>,
    pub prev_page: Option<u32>,
    pub first_page: Option<u32>,
    pub last_page: Option<u32>,
    pub rate: Option<Rate>,
}

/// Rate limit state reported alongside a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    pub limit: u32,
    pub remaining: u32,
    pub reset: DateTime<Utc>,
}

impl Response {
    pub fn new(status: StatusCode, url: Url, headers: HeaderMap) -> Self {
        let mut response = Self {
            status,
            url,
            rate: parse_rate(&headers),
            headers,
            next_page: None,
            prev_page: None,
            first_page: None,
            last_page: None,
        };
        response.populate_page_values();
        response
    }

    fn populate_page_values(&mut self) {
        let Some(links) = self.headers.get(LINK).and_then(|v| v.to_str().ok()) else {
            return;
        };

        for link in links.split(',') {
            let mut segments = link.split(';');
            let Some(target) = segments.next().map(str::trim) else {
                continue;
            };
            if !target.starts_with('<') || !target.ends_with('>') {
                continue;
            }
            let Ok(target) = Url::parse(&target[1..target.len() - 1]) else {
                continue;
            };
            let Some(page) = target
                .query_pairs()
                .find(|(key, _)| key == "page")
                .and_then(|(_, value)| value.parse::<u32>().ok())
            else {
                continue;
            };

            for segment in segments {
                match segment.trim() {
                    r#"rel="next""# => self.next_page = Some(page),
                    r#"rel="prev""# => self.prev_page = Some(page),
                    r#"rel="first""# => self.first_page = Some(page),
                    r#"rel="last""# => self.last_page = Some(page),
                    _ => {}
                }
            }
        }
    }
}

fn parse_rate(headers: &HeaderMap) -> Option<Rate> {
    let number = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
    };

    let limit = u32::try_from(number(RATE_LIMIT_HEADER)?).ok()?;
    let remaining = u32::try_from(number(RATE_REMAINING_HEADER)?).ok()?;
    let reset = Utc.timestamp_opt(number(RATE_RESET_HEADER)?, 0).single()?;

    Some(Rate {
        limit,
        remaining,
        reset,
    })
}
