use crate::error::{Error, Result};

/// Check if a string looks like a Gist id (hex, as GitHub issues them).
pub fn is_gist_id(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Extract the Gist id from a Gist URL.
///
/// Supported URL patterns:
/// - `https://gist.github.com/<user>/<id>`
/// - `https://gist.github.com/<id>`
/// - `https://api.github.com/gists/<id>`
/// - any of the above with a trailing `/`, `.git`, `/revisions`, etc.
pub fn parse_gist_url(input: &str) -> Result<String> {
    let url = url::Url::parse(input).map_err(|e| Error::UrlParse(e.to_string()))?;

    let host = url.host_str().unwrap_or("");
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let candidate = match host {
        "gist.github.com" => match segments.as_slice() {
            [_user, id, ..] if is_gist_id(id.trim_end_matches(".git")) => *id,
            [id, ..] => *id,
            _ => "",
        },
        "api.github.com" => match segments.as_slice() {
            ["gists", id, ..] => *id,
            _ => "",
        },
        _ => return Err(Error::UrlParse(format!("not a Gist URL: {input}"))),
    };

    let id = candidate.trim_end_matches(".git");
    if is_gist_id(id) {
        Ok(id.to_string())
    } else {
        Err(Error::UrlParse(format!("missing Gist id in URL: {input}")))
    }
}

/// Accept either a raw Gist id or a Gist URL and return the id.
pub fn resolve_gist_id(input: &str) -> Result<String> {
    let input = input.trim();
    if is_gist_id(input) {
        return Ok(input.to_string());
    }
    if input.starts_with("http://") || input.starts_with("https://") {
        return parse_gist_url(input);
    }
    Err(Error::InvalidIdentifier(format!(
        "expected a Gist id or Gist URL, got '{input}'"
    )))
}
