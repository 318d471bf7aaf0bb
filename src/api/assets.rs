/// Resolves a media reference from the backend into a fetchable URL.
///
/// Absolute `http(s)` URLs pass through. Paths starting with `/` are joined to
/// `base_url`; `/assets/...` paths get every segment percent-encoded because
/// file names carry non-ASCII characters. Anything else is treated as an
/// asset-relative file name.
pub fn resolve_asset_url(base_url: &str, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with("http://") || raw.starts_with("https://") {
        return Some(raw.to_string());
    }

    let base = base_url.trim_end_matches('/');
    if raw.starts_with("/assets") {
        let encoded: Vec<String> = raw
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        return Some(format!("{base}{}", encoded.join("/")));
    }
    if raw.starts_with('/') {
        return Some(format!("{base}{raw}"));
    }
    Some(format!(
        "{base}/assets/images/{}",
        urlencoding::encode(raw)
    ))
}
