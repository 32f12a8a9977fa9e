use url::Url;

/// Query parameter that selects a profile for the public, read-only view.
pub const PROFILE_PARAM: &str = "profile";

const RELATIVE_BASE: &str = "http://localhost/";

fn parse_page_url(page_url: &str) -> Option<(Url, bool)> {
    if let Ok(url) = Url::parse(page_url) {
        return Some((url, true));
    }
    let base = Url::parse(RELATIVE_BASE).ok()?;
    base.join(page_url).ok().map(|url| (url, false))
}

/// The profile id carried by the page URL, if any.
pub fn public_target(page_url: &str) -> Option<String> {
    let (url, _) = parse_page_url(page_url)?;
    url.query_pairs()
        .find(|(key, _)| key == PROFILE_PARAM)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `page_url` without the profile parameter; other parameters are kept.
pub fn strip_public_target(page_url: &str) -> String {
    let Some((mut url, absolute)) = parse_page_url(page_url) else {
        return page_url.to_string();
    };

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != PROFILE_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    if absolute {
        return url.to_string();
    }
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

pub fn share_link(public_base_url: &str, user_id: &str) -> String {
    match Url::parse(public_base_url) {
        Ok(mut url) => {
            url.query_pairs_mut().clear().append_pair(PROFILE_PARAM, user_id);
            url.to_string()
        }
        Err(_) => format!("{public_base_url}?{PROFILE_PARAM}={user_id}"),
    }
}

/// wa.me link for an Indonesian number as partners type it (`0812...`, `+62812...`, `812...`).
pub fn whatsapp_link(number: &str) -> Option<String> {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    let digits = digits.trim_start_matches('0');
    let local = digits.strip_prefix("62").unwrap_or(digits);
    if local.is_empty() {
        return None;
    }
    Some(format!("https://wa.me/62{local}"))
}
