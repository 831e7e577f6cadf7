use url::Url;

/// Extension that marks a link as a downloadable document
pub const DOCUMENT_EXTENSION: &str = ".pdf";

/// Path under which bare manual file names are served
const MODEL_MANUAL_PATH: &str = "/modelManual/";

/// Returns true if the raw candidate mentions the document extension
///
/// The check is case-insensitive and matches anywhere in the string, so
/// `manual.PDF?download=1` qualifies.
pub fn is_document_candidate(raw: &str) -> bool {
    raw.to_ascii_lowercase().contains(DOCUMENT_EXTENSION)
}

/// Resolves a link href to an absolute HTTP(S) URL
///
/// Returns None if the link should be ignored:
/// - empty hrefs and fragment-only links
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - anything that does not resolve to HTTP or HTTPS
///
/// # Resolution Rules
///
/// - `//host/path` takes the scheme of `base`
/// - `/path` is resolved against the origin of `base`
/// - absolute URLs are kept as-is
/// - anything else is resolved relative to `page_url`
pub fn resolve_link(href: &str, page_url: &Url, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let resolved = if let Some(rest) = href.strip_prefix("//") {
        Url::parse(&format!("{}://{}", base.scheme(), rest))
    } else if href.starts_with('/') {
        base.join(href)
    } else {
        page_url.join(href)
    };

    resolved
        .ok()
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
}

/// Resolves a document href found on a page
///
/// Same rules as [`resolve_link`], but candidates that do not mention the
/// document extension are discarded.
pub fn resolve_document_href(href: &str, page_url: &Url, base: &Url) -> Option<Url> {
    if !is_document_candidate(href) {
        return None;
    }
    resolve_link(href, page_url, base)
}

/// Resolves the value of a manual-name marker attribute
///
/// Marker values are either full links or bare file names such as
/// `ABC-123_manual.pdf`; bare names live under `/modelManual/` on the site.
pub fn resolve_manual_name(name: &str, base: &Url) -> Option<Url> {
    let name = name.trim();
    if !is_document_candidate(name) {
        return None;
    }

    let lower = name.to_ascii_lowercase();
    if name.starts_with('/') || lower.starts_with("http:") || lower.starts_with("https:") {
        return resolve_link(name, base, base);
    }

    base.join(MODEL_MANUAL_PATH).ok()?.join(name).ok()
}
