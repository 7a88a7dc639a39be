//! File-Hosting Share-Link Rewriting
//!
//! Videos are often pasted into the CMS as a hosting provider's "sharing
//! link", which renders a viewer page rather than the media itself. Links in
//! either of the provider's two known shapes are rewritten to the direct
//! stream form; anything else passes through unchanged.

use url::Url;

/// Rewrites a provider sharing link to its direct-stream form.
///
/// Recognized shapes (on any `drive.`-prefixed host):
/// - `https://drive.example.com/file/d/<FILE_ID>/view` (path form)
/// - `https://drive.example.com/open?id=<FILE_ID>` (query form)
///
/// Returns None when the link is not a sharing link or the file ID cannot
/// be extracted; callers then use the original link as-is.
pub fn rewrite_share_link(link: &str) -> Option<String> {
    let parsed = Url::parse(link).ok()?;
    let host = parsed.host_str()?;
    if !host.starts_with("drive.") {
        return None;
    }

    let file_id = extract_path_id(&parsed).or_else(|| extract_query_id(&parsed))?;
    Some(format!(
        "https://{}/uc?export=download&id={}",
        host, file_id
    ))
}

/// Path form: `/file/d/<FILE_ID>/...`.
fn extract_path_id(url: &Url) -> Option<String> {
    let mut segments = url.path_segments()?;
    if segments.next() != Some("file") || segments.next() != Some("d") {
        return None;
    }
    segments
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Query form: `?id=<FILE_ID>`.
fn extract_query_id(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty())
}
