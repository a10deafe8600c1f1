mod archiver;
mod config;
mod crawler;
mod fetcher;
mod images;
mod models;
mod parser;

use anyhow::Result;
use chrono::Local;
use tracing::{info, warn};

use crate::config::CrawlerConfig;
use crate::crawler::Crawler;
use crate::fetcher::HttpFetcher;

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = CrawlerConfig::default();
    let started = Local::now();
    info!("Crawl started at {}", started.format("%Y-%m-%d %H:%M:%S"));

    let fetcher = HttpFetcher::new()?;
    let mut crawler = Crawler::new(config.clone(), fetcher);
    let catalog = crawler.run();

    if catalog.is_empty() {
        warn!("No products were scraped");
    }
    archiver::save_catalog(&catalog, &config.output_file)?;

    let finished = Local::now();
    let stats = crawler.stats();
    info!(
        "Crawl finished at {} after {}s: {} pages, {} products saved, {} dropped, {} images",
        finished.format("%Y-%m-%d %H:%M:%S"),
        (finished - started).num_seconds(),
        stats.pages_fetched,
        catalog.len(),
        stats.products_dropped,
        stats.images_saved,
    );
    Ok(())
}
