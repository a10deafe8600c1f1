use std::io;
use std::path::PathBuf;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::warn;

use crate::models::{ProductRecord, ProductSummary};

pub const NO_NUMBER: &str = "No number";
pub const NO_INFORMATION: &str = "No information";
pub const NO_DESCRIPTION: &str = "No description";
pub const NO_SPECIFICATIONS: &str = "No specifications";

const CATALOG_MARKER: &str = "nr katalogowy";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

static PRODUCT_BOX: LazyLock<Selector> = LazyLock::new(|| selector(".produkt_box"));
static TITLE_LINK: LazyLock<Selector> = LazyLock::new(|| selector(".produkt_box_tytul a"));
static PRICE: LazyLock<Selector> = LazyLock::new(|| selector(".produkty_box_stopka1 span.cena"));
static STOCK: LazyLock<Selector> = LazyLock::new(|| selector(r#"div[style="text-align: center;"]"#));
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| selector(".produkt_box_tresc"));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| selector("p"));
static STRONG: LazyLock<Selector> = LazyLock::new(|| selector("strong"));
static GALLERY_LINK: LazyLock<Selector> = LazyLock::new(|| selector(".pokaz-produkt-zdj a"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SummaryError {
    #[error("product box has no title link")]
    MissingTitle,
    #[error("title link of {0:?} has no href")]
    MissingLink(String),
    #[error("no price for {0:?}")]
    MissingPrice(String),
}

/// Markup problems on a detail page that void the whole product, as opposed
/// to a missing field, which only falls back to a placeholder.
#[derive(Debug, Error)]
pub enum DetailError {
    #[error("stock status line has no text around ':'")]
    EmptyStockStatus,
    #[error("gallery link #{0} has no href")]
    MissingImageLink(usize),
    #[error("creating image directory {}: {source}", .path.display())]
    ImageDir { path: PathBuf, source: io::Error },
}

/// Turns an href into an absolute URL: a leading `/` is folded into the
/// base's trailing slash, anything else is appended as is.
pub fn normalize_url(base_url: &str, href: &str) -> String {
    match href.strip_prefix('/') {
        Some(rest) => format!("{base_url}{rest}"),
        None => format!("{base_url}{href}"),
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Strips ASCII whitespace and NUL only; a padding `&nbsp;` is kept.
fn strip(s: &str) -> &str {
    s.trim_matches(|c: char| matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r' | '\0'))
}

/// Summaries found on one search page, plus how many boxes were skipped.
#[derive(Debug, Default)]
pub struct SearchPage {
    pub products: Vec<ProductSummary>,
    pub dropped: usize,
}

pub fn parse_search_page(doc: &Html, base_url: &str) -> SearchPage {
    let mut page = SearchPage::default();
    for product_box in doc.select(&PRODUCT_BOX) {
        match extract_summary(product_box, base_url) {
            Ok(summary) => page.products.push(summary),
            Err(e) => {
                warn!("Error fetching product data: {e}");
                page.dropped += 1;
            }
        }
    }
    page
}

fn extract_summary(product_box: ElementRef<'_>, base_url: &str) -> Result<ProductSummary, SummaryError> {
    let title_el = product_box.select(&TITLE_LINK).next().ok_or(SummaryError::MissingTitle)?;
    let title = strip(&element_text(title_el)).to_string();
    let href = title_el
        .value()
        .attr("href")
        .ok_or_else(|| SummaryError::MissingLink(title.clone()))?;
    let detail_link = normalize_url(base_url, href);

    let price = product_box
        .select(&PRICE)
        .next()
        .map(|e| strip(&element_text(e)).to_string())
        .ok_or_else(|| SummaryError::MissingPrice(title.clone()))?;

    Ok(ProductSummary { title, price, detail_link })
}

/// Outcome of a best-effort field lookup on a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Found(String),
    Fallback(&'static str),
}

impl Field {
    fn or_placeholder(value: Option<String>, placeholder: &'static str) -> Self {
        value.map_or(Field::Fallback(placeholder), Field::Found)
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Field::Found(_))
    }

    pub fn into_value(self) -> String {
        match self {
            Field::Found(v) => v,
            Field::Fallback(p) => p.to_string(),
        }
    }
}

/// Catalog number: the first `strong` under the parent of the first text
/// node mentioning "nr katalogowy".
pub fn catalog_number(doc: &Html) -> Field {
    let number = doc
        .tree
        .root()
        .descendants()
        .find(|node| node.value().as_text().is_some_and(|t| t.contains(CATALOG_MARKER)))
        .and_then(|node| node.parent())
        .and_then(ElementRef::wrap)
        .and_then(|parent| parent.select(&STRONG).next())
        .map(|strong| strip(&element_text(strong)).to_string());
    Field::or_placeholder(number, NO_NUMBER)
}

/// Text after the last `:` of the centered availability line. Trailing empty
/// segments are skipped, so `"Stan:"` yields `"Stan"`. A line made only of
/// colons, or with no text at all, is an error rather than a fallback.
pub fn stock_status(doc: &Html) -> Result<Field, DetailError> {
    let Some(el) = doc.select(&STOCK).next() else {
        return Ok(Field::Fallback(NO_INFORMATION));
    };
    element_text(el)
        .split(':')
        .rev()
        .find(|segment| !segment.is_empty())
        .map(|segment| Field::Found(strip(segment).to_string()))
        .ok_or(DetailError::EmptyStockStatus)
}

pub fn description(doc: &Html) -> Field {
    let text = doc
        .select(&DESCRIPTION)
        .next()
        .map(|el| strip(&element_text(el)).to_string());
    Field::or_placeholder(text, NO_DESCRIPTION)
}

pub fn specifications(doc: &Html) -> Field {
    let joined = doc.select(&PARAGRAPH).map(element_text).collect::<Vec<_>>().join(" ");
    let joined = strip(&joined);
    if joined.is_empty() {
        Field::Fallback(NO_SPECIFICATIONS)
    } else {
        Field::Found(joined.to_string())
    }
}

/// Raw `href`s of the image gallery, in page order. `None` marks an anchor
/// without one.
pub fn gallery_hrefs(doc: &Html) -> Vec<Option<String>> {
    doc.select(&GALLERY_LINK)
        .map(|a| a.value().attr("href").map(str::to_string))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailFields {
    pub catalog_number: Field,
    pub stock_status: Field,
    pub description: Field,
    pub specifications: Field,
}

impl DetailFields {
    pub fn extract(doc: &Html) -> Result<Self, DetailError> {
        Ok(Self {
            catalog_number: catalog_number(doc),
            stock_status: stock_status(doc)?,
            description: description(doc),
            specifications: specifications(doc),
        })
    }

    /// Names of the fields that fell back to their placeholder.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("catalog number", &self.catalog_number),
            ("stock status", &self.stock_status),
            ("description", &self.description),
            ("specifications", &self.specifications),
        ]
        .into_iter()
        .filter(|(_, field)| !field.is_found())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn into_record(self, summary: &ProductSummary) -> ProductRecord {
        ProductRecord {
            title: summary.title.clone(),
            catalog_number: self.catalog_number.into_value(),
            specifications: self.specifications.into_value(),
            price: summary.price.clone(),
            stock_status: self.stock_status.into_value(),
            description: self.description.into_value(),
            url: summary.detail_link.clone(),
        }
    }
}
