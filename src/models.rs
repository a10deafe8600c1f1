use serde::{Deserialize, Serialize};

/// One entry of a search listing, consumed right away to fetch its detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSummary {
    pub title: String,
    pub price: String,
    pub detail_link: String,
}

/// A scraped product as it lands in the CSV. Field order is column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Catalog Number")]
    pub catalog_number: String,
    #[serde(rename = "Specifications")]
    pub specifications: String,
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Stock Status")]
    pub stock_status: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Link")]
    pub url: String,
}

/// Append-only record list in crawl order.
#[derive(Debug, Default)]
pub struct Catalog {
    records: Vec<ProductRecord>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ProductRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
