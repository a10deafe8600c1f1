use std::path::PathBuf;

pub const BASE_URL: &str = "https://tkaninydzieciece.com.pl/";
pub const BASE_SEARCH_URL: &str = "https://tkaninydzieciece.com.pl/szukaj";
pub const OUTPUT_FILE: &str = "products.csv";
pub const IMAGE_DIR: &str = "images";

/// Where the crawler reads from and writes to.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Prefix for site-relative links. Must end with `/`.
    pub base_url: String,
    /// Search listing; the page number is appended as `,<n>`.
    pub search_url: String,
    pub output_file: PathBuf,
    pub image_dir: PathBuf,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            search_url: BASE_SEARCH_URL.to_string(),
            output_file: PathBuf::from(OUTPUT_FILE),
            image_dir: PathBuf::from(IMAGE_DIR),
        }
    }
}

impl CrawlerConfig {
    pub fn page_url(&self, page_number: u32) -> String {
        format!("{},{}", self.search_url, page_number)
    }
}
