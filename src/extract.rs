//! Metadata extraction from a single article page.

use lazy_static::lazy_static;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use scraper::{Html, Selector};

/// The optional fields found in an article's markup. Absent fields are `None`;
/// the indexer applies the filename/mtime fallbacks.
#[derive(Debug, Default)]
pub struct ArticleMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub thumbnail: Option<String>,
    pub category: Option<String>,
}

/// Extracts all known metadata fields from one page. Never fails: a page with
/// no recognizable metadata yields all-`None`.
pub fn extract(html: &str) -> ArticleMeta {
    let doc = Html::parse_document(html);

    ArticleMeta {
        title: extract_title(&doc),
        description: extract_description(&doc),
        date: extract_date(&doc),
        thumbnail: extract_thumbnail(&doc, html),
        category: meta_content(&doc, "category"),
    }
}

/// `og:title`, then `<title>`, then the first `<h1>`
fn extract_title(doc: &Html) -> Option<String> {
    meta_content(doc, "og:title")
        .or_else(|| first_text(doc, "title"))
        .or_else(|| first_text(doc, "h1"))
}

/// `description`/`og:description` meta, then the first paragraph with enough
/// text to be a plausible summary
fn extract_description(doc: &Html) -> Option<String> {
    if let Some(desc) = meta_content(doc, "description").or_else(|| meta_content(doc, "og:description")) {
        return Some(desc);
    }

    let selector = Selector::parse("p").unwrap();
    for elt in doc.select(&selector) {
        let text = elt.text().collect::<String>();
        let text = text.trim();
        if text.chars().count() >= 30 {
            return Some(text.to_string());
        }
    }
    None
}

/// `date`/`article:published_time` meta, then `<time datetime="...">`
fn extract_date(doc: &Html) -> Option<String> {
    if let Some(date) = meta_content(doc, "date").or_else(|| meta_content(doc, "article:published_time")) {
        return Some(date);
    }

    let selector = Selector::parse("time[datetime]").unwrap();
    doc.select(&selector)
        .find_map(|elt| non_empty(elt.value().attr("datetime")?))
}

lazy_static! {
    static ref BG_IMAGE_RE: Regex =
        Regex::new(r#"(?i)background-image\s*:\s*url\(\s*['"]?([^'")]+)['"]?\s*\)"#).unwrap();
}

/// A CSS `background-image: url(...)` anywhere in the page (style attributes
/// and `<style>` blocks alike), then the first `<img>`, then `og:image`.
/// The CSS probe runs on the raw text since inline style is opaque to the DOM.
fn extract_thumbnail(doc: &Html, html: &str) -> Option<String> {
    if let Some(captures) = BG_IMAGE_RE.captures(html) {
        return non_empty(&captures[1]);
    }

    let selector = Selector::parse("img[src]").unwrap();
    if let Some(src) = doc.select(&selector).find_map(|elt| non_empty(elt.value().attr("src")?)) {
        return Some(src);
    }

    meta_content(doc, "og:image")
}

/// Returns the `content` of the first `<meta>` carrying the given key in its
/// `name` or `property` attribute. Key comparison is case-insensitive, and the
/// DOM lookup makes quoting style and attribute order irrelevant.
fn meta_content(doc: &Html, key: &str) -> Option<String> {
    let selector = Selector::parse("meta").unwrap();
    for elt in doc.select(&selector) {
        let elt = elt.value();
        let named = elt.attr("name").map_or(false, |n| n.eq_ignore_ascii_case(key))
            || elt.attr("property").map_or(false, |p| p.eq_ignore_ascii_case(key));
        if named {
            if let Some(content) = elt.attr("content").and_then(non_empty) {
                return Some(content);
            }
        }
    }
    None
}

fn first_text(doc: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).unwrap();
    doc.select(&selector)
        .next()
        .and_then(|elt| non_empty(&elt.text().collect::<String>()))
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

//----- Thumbnail path normalization

// Bytes that break when a thumbnail path lands in a URL. '%' is excluded so
// that an already-normalized value passes through unchanged.
const PATH_UNSAFE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^');

lazy_static! {
    static ref ABSOLUTE_URL_RE: Regex = Regex::new("(?i)^https?://").unwrap();
}

/// Normalizes a thumbnail path to resolve from the site root even when the
/// site is deployed under a subpath: strip one `../`, `./` or `/` prefix, then
/// percent-encode anything unsafe in a URL path unless the value is already an
/// absolute http(s) URL.
pub fn normalize_thumbnail(raw: &str) -> String {
    let mut path = raw.trim();
    path = path.strip_prefix("../").unwrap_or(path);
    path = path.strip_prefix("./").unwrap_or(path);
    path = path.strip_prefix('/').unwrap_or(path);

    if ABSOLUTE_URL_RE.is_match(path) {
        path.to_string()
    } else {
        utf8_percent_encode(path, PATH_UNSAFE).to_string()
    }
}
