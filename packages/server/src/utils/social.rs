/// Normalization for user-supplied social handles.
///
/// Investor spreadsheets arrive with everything from bare handles to full
/// profile URLs; the importer stores only the bare handle.

/// Hosts whose path component is the handle itself (`t.me/name`).
const TELEGRAM_HOSTS: &[&str] = &["t.me", "telegram.me"];
const TWITTER_HOSTS: &[&str] = &["twitter.com", "x.com"];
const LINKEDIN_HOSTS: &[&str] = &["linkedin.com"];

pub fn normalize_telegram(raw: &str) -> Option<String> {
    normalize(raw, TELEGRAM_HOSTS, &[])
}

pub fn normalize_twitter(raw: &str) -> Option<String> {
    normalize(raw, TWITTER_HOSTS, &[])
}

/// LinkedIn profile URLs carry the handle under `/in/` (people) or
/// `/company/` (organizations); both shapes appear in investor sheets.
pub fn normalize_linkedin(raw: &str) -> Option<String> {
    normalize(raw, LINKEDIN_HOSTS, &["in", "company"])
}

fn normalize(raw: &str, hosts: &[&str], path_prefixes: &[&str]) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let handle = match extract_from_url(trimmed, hosts, path_prefixes) {
        // A known profile URL that carries no handle is junk, not a handle.
        Some(extracted) => extracted?,
        None => trimmed,
    };
    let handle = handle.trim().trim_start_matches('@').trim();
    if handle.is_empty() {
        return None;
    }
    Some(handle.to_string())
}

/// Pull the handle out of a profile URL.
///
/// Outer `None`: the input is not a URL of one of the known hosts (the
/// caller treats it as a bare handle). Inner `None`: a known host whose
/// path yields no handle.
fn extract_from_url<'a>(
    input: &'a str,
    hosts: &[&str],
    path_prefixes: &[&str],
) -> Option<Option<&'a str>> {
    let rest = input
        .strip_prefix("https://")
        .or_else(|| input.strip_prefix("http://"))
        .unwrap_or(input);

    let (host, path) = rest.split_once('/')?;
    let host = host.trim_start_matches("www.");
    if !hosts.iter().any(|h| host.eq_ignore_ascii_case(h)) {
        return None;
    }

    let path = path.split(['?', '#']).next().unwrap_or("");
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let first = segments.next();
    let handle = match first {
        Some(s) if path_prefixes.iter().any(|p| s.eq_ignore_ascii_case(p)) => segments.next(),
        other => other,
    };
    Some(handle)
}
