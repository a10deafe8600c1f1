use scraper::Html;
use tracing::{debug, info, warn};

use crate::config::CrawlerConfig;
use crate::fetcher::Fetch;
use crate::images::download_images;
use crate::models::{Catalog, ProductRecord, ProductSummary};
use crate::parser::{DetailError, DetailFields, parse_search_page};

/// Counters logged at the end of a run.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrawlStats {
    pub pages_fetched: usize,
    pub products_dropped: usize,
    pub images_saved: usize,
}

/// Walks the search listing page by page until a page fails to load or
/// lists nothing, scraping every product's detail page along the way.
pub struct Crawler<F> {
    config: CrawlerConfig,
    fetcher: F,
    stats: CrawlStats,
}

impl<F: Fetch> Crawler<F> {
    pub fn new(config: CrawlerConfig, fetcher: F) -> Self {
        Self {
            config,
            fetcher,
            stats: CrawlStats::default(),
        }
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    pub fn run(&mut self) -> Catalog {
        let mut catalog = Catalog::new();
        let mut page_number = 1;

        loop {
            let page_url = self.config.page_url(page_number);
            info!("Fetching page: {page_url}");

            let Some(doc) = self.fetch_document(&page_url) else {
                break;
            };
            self.stats.pages_fetched += 1;

            let page = parse_search_page(&doc, &self.config.base_url);
            if page.dropped > 0 {
                debug!("Skipped {} unreadable product boxes on page {page_number}", page.dropped);
            }
            if page.products.is_empty() {
                info!("No products on page {page_number}, stopping");
                break;
            }

            for summary in &page.products {
                match self.scrape_product(summary) {
                    Some(record) => catalog.push(record),
                    None => self.stats.products_dropped += 1,
                }
            }

            page_number += 1;
        }

        catalog
    }

    fn fetch_document(&self, url: &str) -> Option<Html> {
        match self.fetcher.fetch_html(url) {
            Ok(body) => Some(Html::parse_document(&body)),
            Err(e) => {
                warn!("Error fetching page: {e}");
                None
            }
        }
    }

    /// A product whose detail page cannot be fetched, or whose details are
    /// broken, yields no record.
    fn scrape_product(&mut self, summary: &ProductSummary) -> Option<ProductRecord> {
        info!("Fetching product details: {}", summary.title);
        let doc = self.fetch_document(&summary.detail_link)?;

        match self.scrape_details(&doc, summary) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Error fetching product details: {e}");
                None
            }
        }
    }

    fn scrape_details(&mut self, doc: &Html, summary: &ProductSummary) -> Result<ProductRecord, DetailError> {
        let fields = DetailFields::extract(doc)?;
        let missing = fields.missing();
        if !missing.is_empty() {
            debug!("Using placeholders for {} of {}", missing.join(", "), summary.title);
        }

        self.stats.images_saved += download_images(
            &self.fetcher,
            doc,
            &summary.title,
            &self.config.base_url,
            &self.config.image_dir,
        )?;

        Ok(fields.into_record(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archiver::{read_catalog, save_catalog};
    use crate::fetcher::fixtures::FixtureFetcher;
    use crate::parser::{NO_DESCRIPTION, NO_NUMBER};

    fn test_config(dir: &std::path::Path) -> CrawlerConfig {
        CrawlerConfig {
            base_url: "https://shop.test/".into(),
            search_url: "https://shop.test/szukaj".into(),
            output_file: dir.join("products.csv"),
            image_dir: dir.join("images"),
        }
    }

    fn search_page(products: &[(&str, &str, &str)]) -> String {
        let boxes: String = products
            .iter()
            .map(|(title, href, price)| {
                format!(
                    r#"<div class="produkt_box">
                         <div class="produkt_box_tytul"><a href="{href}">{title}</a></div>
                         <div class="produkty_box_stopka1"><span class="cena">{price}</span></div>
                       </div>"#
                )
            })
            .collect();
        format!("<html><body>{boxes}</body></html>")
    }

    fn detail_page(number: &str, stock: &str) -> String {
        format!(
            r#"<html><body>
                 <div>nr katalogowy: <strong>{number}</strong></div>
                 <div style="text-align: center;">Dostępność: {stock}</div>
                 <div class="produkt_box_tresc"><p>Szerokość 160 cm</p></div>
               </body></html>"#
        )
    }

    #[test]
    fn two_pages_then_empty_page() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FixtureFetcher::new()
            .with(
                "https://shop.test/szukaj,1",
                search_page(&[("Minky", "/minky", "30 zł"), ("Dresówka", "dresowka", "25 zł")]),
            )
            .with("https://shop.test/szukaj,2", search_page(&[]))
            .with("https://shop.test/minky", detail_page("MK-1", "dostępny"))
            .with("https://shop.test/dresowka", detail_page("DR-2", "brak"));
        let mut crawler = Crawler::new(test_config(dir.path()), fetcher);

        let catalog = crawler.run();

        assert_eq!(
            crawler.fetcher.requested(),
            [
                "https://shop.test/szukaj,1",
                "https://shop.test/minky",
                "https://shop.test/dresowka",
                "https://shop.test/szukaj,2",
            ]
        );
        assert_eq!(catalog.len(), 2);
        let first = &catalog.records()[0];
        assert_eq!(first.title, "Minky");
        assert_eq!(first.catalog_number, "MK-1");
        assert_eq!(first.stock_status, "dostępny");
        assert_eq!(first.specifications, "Szerokość 160 cm");
        assert_eq!(first.price, "30 zł");
        assert_eq!(first.url, "https://shop.test/minky");
        assert_eq!(catalog.records()[1].stock_status, "brak");

        assert_eq!(crawler.stats().pages_fetched, 2);
        assert_eq!(crawler.stats().products_dropped, 0);

        save_catalog(&catalog, &test_config(dir.path()).output_file).unwrap();
        let rows = read_catalog(&test_config(dir.path()).output_file).unwrap();
        assert_eq!(rows, catalog.records());
    }

    #[test]
    fn failed_detail_fetch_drops_only_that_product() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FixtureFetcher::new()
            .with(
                "https://shop.test/szukaj,1",
                search_page(&[("Gone", "/gone", "1 zł"), ("Kept", "/kept", "2 zł")]),
            )
            .with("https://shop.test/szukaj,2", search_page(&[]))
            .with("https://shop.test/kept", "<html><body>bare</body></html>");
        let mut crawler = Crawler::new(test_config(dir.path()), fetcher);

        let catalog = crawler.run();

        let titles: Vec<_> = catalog.records().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["Kept"]);
        assert_eq!(catalog.records()[0].catalog_number, NO_NUMBER);
        assert_eq!(catalog.records()[0].description, NO_DESCRIPTION);
        assert_eq!(crawler.stats().products_dropped, 1);
        assert!(crawler.fetcher.requested().contains(&"https://shop.test/szukaj,2".to_string()));
    }

    #[test]
    fn unreachable_first_page_ends_with_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let mut crawler = Crawler::new(test_config(dir.path()), FixtureFetcher::new());

        let catalog = crawler.run();

        assert!(catalog.is_empty());
        assert_eq!(crawler.fetcher.requested(), ["https://shop.test/szukaj,1"]);
        assert_eq!(crawler.stats().pages_fetched, 0);
    }

    #[test]
    fn image_failures_keep_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let detail = r#"<html><body>
              <div class="pokaz-produkt-zdj"><a href="/img/a.jpg"></a><a href="/img/b.jpg"></a></div>
            </body></html>"#;
        let fetcher = FixtureFetcher::new()
            .with("https://shop.test/szukaj,1", search_page(&[("Minky szare", "/m", "9 zł")]))
            .with("https://shop.test/szukaj,2", search_page(&[]))
            .with("https://shop.test/m", detail)
            .with("https://shop.test/img/b.jpg", b"jpeg".to_vec());
        let config = test_config(dir.path());
        let mut crawler = Crawler::new(config.clone(), fetcher);

        let catalog = crawler.run();

        assert_eq!(catalog.len(), 1);
        assert_eq!(crawler.stats().images_saved, 1);
        assert!(config.image_dir.join("Minky_szare_2.jpg").is_file());
        assert!(!config.image_dir.join("Minky_szare_1.jpg").exists());
    }

    #[test]
    fn broken_details_drop_the_product_and_the_crawl_goes_on() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FixtureFetcher::new()
            .with(
                "https://shop.test/szukaj,1",
                search_page(&[("A", "/a", "1 zł"), ("B", "/b", "2 zł"), ("C", "/c", "3 zł")]),
            )
            .with("https://shop.test/szukaj,2", search_page(&[]))
            .with(
                "https://shop.test/a",
                r#"<html><body><div style="text-align: center;"></div></body></html>"#,
            )
            .with(
                "https://shop.test/b",
                r#"<html><body><div class="pokaz-produkt-zdj"><a>x</a><a href="/img/b.jpg"></a></div></body></html>"#,
            )
            .with("https://shop.test/c", detail_page("C-3", "dostępny"))
            .with("https://shop.test/img/b.jpg", b"jpeg".to_vec());
        let mut crawler = Crawler::new(test_config(dir.path()), fetcher);

        let catalog = crawler.run();

        let titles: Vec<_> = catalog.records().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["C"]);
        assert_eq!(crawler.stats().products_dropped, 2);
        assert!(!crawler.fetcher.requested().contains(&"https://shop.test/img/b.jpg".to_string()));
    }

    #[test]
    fn unusable_image_directory_drops_the_product() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::write(&config.image_dir, "not a directory").unwrap();
        let fetcher = FixtureFetcher::new()
            .with("https://shop.test/szukaj,1", search_page(&[("A", "/a", "1 zł")]))
            .with("https://shop.test/szukaj,2", search_page(&[]))
            .with("https://shop.test/a", detail_page("A-1", "dostępny"));
        let mut crawler = Crawler::new(config, fetcher);

        let catalog = crawler.run();

        assert!(catalog.is_empty());
        assert_eq!(crawler.stats().products_dropped, 1);
    }
}
