use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use scraper::Html;
use tracing::{info, warn};

use crate::fetcher::Fetch;
use crate::parser::{DetailError, gallery_hrefs, normalize_url};

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_ \t\r\n\x0B\x0C-]+").expect("static regex must compile"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\r\n\x0B\x0C]+").expect("static regex must compile"));

/// Strips everything but ASCII word characters, ASCII whitespace and `-`,
/// then turns each whitespace run into a single `_`.
pub fn sanitize_filename(name: &str) -> String {
    let kept = DISALLOWED.replace_all(name, "");
    WHITESPACE.replace_all(&kept, "_").into_owned()
}

pub fn image_path(dir: &Path, title: &str, index: usize) -> PathBuf {
    dir.join(format!("{}_{}.jpg", sanitize_filename(title), index))
}

/// Downloads every gallery image of a detail page and returns how many were
/// saved. A failed download is logged and skipped. An unusable image
/// directory or a gallery link without `href` aborts the rest of the gallery
/// and voids the product.
pub fn download_images(
    fetcher: &dyn Fetch,
    doc: &Html,
    title: &str,
    base_url: &str,
    dir: &Path,
) -> Result<usize, DetailError> {
    fs::create_dir_all(dir).map_err(|source| DetailError::ImageDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut saved = 0;
    for (i, href) in gallery_hrefs(doc).iter().enumerate() {
        let index = i + 1;
        let href = href.as_deref().ok_or(DetailError::MissingImageLink(index))?;

        let url = normalize_url(base_url, href);
        let path = image_path(dir, title, index);
        info!("Downloading image: {url} -> {}", path.display());
        match download_image(fetcher, &url, &path) {
            Ok(()) => saved += 1,
            Err(e) => warn!("Error downloading image: {e:#}"),
        }
    }
    Ok(saved)
}

fn download_image(fetcher: &dyn Fetch, url: &str, path: &Path) -> Result<()> {
    let mut body = fetcher.fetch_stream(url)?;
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    io::copy(&mut body, &mut file).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
