use std::io::Read;

use reqwest::blocking::Client;
use reqwest::redirect;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[cfg(test)]
    #[error("no fixture for {0}")]
    Missing(String),
}

/// Network seam of the crawler. Pages come back as text, images as a byte stream.
pub trait Fetch {
    fn fetch_html(&self, url: &str) -> Result<String, FetchError>;

    fn fetch_stream(&self, url: &str) -> Result<Box<dyn Read>, FetchError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let redirect_policy = redirect::Policy::custom(|attempt| {
            if attempt.previous().len() > 100 {
                attempt.error("Too many redirects (>100)")
            } else {
                attempt.follow()
            }
        });

        let client = Client::builder().redirect(redirect_policy).build()?;
        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<reqwest::blocking::Response, FetchError> {
        Ok(self.client.get(url).send()?.error_for_status()?)
    }
}

impl Fetch for HttpFetcher {
    fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        self.get(url)?.text().map_err(|e| e.into())
    }

    fn fetch_stream(&self, url: &str) -> Result<Box<dyn Read>, FetchError> {
        Ok(Box::new(self.get(url)?))
    }
}
