//! Post-sanitization filters.
//!
//! Runs over sanitizer output, so nothing added here is subject to the
//! allow-list: images get a `max-width` style and bare URLs in text become
//! `nofollow` links, except inside code, preformatted blocks and existing
//! anchors.

use linkify::{LinkFinder, LinkKind};

use crate::util::{decode_entities, escape_attr, escape_text};

/// Style forced onto every image so it cannot overflow its cell.
pub const IMAGE_STYLE: &str = "max-width: 100%";

/// Schemes autolinking may emit.
const LINK_SCHEMES: &[&str] = &["http", "https", "ftp", "mailto"];

/// Top level domains recognized in scheme-less links, sorted.
const TLDS: &[&str] = &[
    "ac", "ad", "ae", "aero", "af", "ag", "ai", "al", "am", "ao", "aq", "ar", "arpa", "as",
    "asia", "at", "au", "aw", "ax", "az", "ba", "bb", "bd", "be", "bf", "bg", "bh", "bi", "biz",
    "bj", "bm", "bn", "bo", "br", "bs", "bt", "bv", "bw", "by", "bz", "ca", "cat", "cc", "cd",
    "cf", "cg", "ch", "ci", "ck", "cl", "cm", "cn", "co", "com", "coop", "cr", "cu", "cv", "cx",
    "cy", "cz", "de", "dev", "dj", "dk", "dm", "do", "dz", "ec", "edu", "ee", "eg", "er", "es",
    "et", "eu", "fi", "fj", "fk", "fm", "fo", "fr", "ga", "gb", "gd", "ge", "gf", "gg", "gh",
    "gi", "gl", "gm", "gn", "gov", "gp", "gq", "gr", "gs", "gt", "gu", "gw", "gy", "hk", "hm",
    "hn", "hr", "ht", "hu", "id", "ie", "il", "im", "in", "info", "int", "io", "iq", "ir", "is",
    "it", "je", "jm", "jo", "jobs", "jp", "ke", "kg", "kh", "ki", "km", "kn", "kp", "kr", "kw",
    "ky", "kz", "la", "lb", "lc", "li", "lk", "lr", "ls", "lt", "lu", "lv", "ly", "ma", "mc",
    "md", "me", "mg", "mh", "mil", "mk", "ml", "mm", "mn", "mo", "mobi", "mp", "mq", "mr", "ms",
    "mt", "mu", "museum", "mv", "mw", "mx", "my", "mz", "na", "name", "nc", "ne", "net", "nf",
    "ng", "ni", "nl", "no", "np", "nr", "nu", "nz", "om", "org", "pa", "pe", "pf", "pg", "ph",
    "pk", "pl", "pm", "pn", "post", "pr", "pro", "ps", "pt", "pw", "py", "qa", "re", "ro", "rs",
    "ru", "rw", "sa", "sb", "sc", "sd", "se", "sg", "sh", "si", "sj", "sk", "sl", "sm", "sn",
    "so", "sr", "ss", "st", "su", "sv", "sx", "sy", "sz", "tc", "td", "tel", "tf", "tg", "th",
    "tj", "tk", "tl", "tm", "tn", "to", "tr", "travel", "tt", "tv", "tw", "tz", "ua", "ug", "uk",
    "us", "uy", "uz", "va", "vc", "ve", "vg", "vi", "vn", "vu", "wf", "ws", "xxx", "ye", "yt",
    "za", "zm", "zw",
];

/// Elements whose text is never linkified.
const SKIP_TAGS: &[&str] = &["pre", "code", "a", "script", "style", "textarea"];

/// Applies the image style patch and autolinking to sanitized HTML.
///
/// # Arguments
///
/// * `html`: Sanitized HTML fragment
///
/// # Returns
///
/// HTML with patched images and linkified text
pub fn apply(html: &str) -> String {
    let finder = link_finder();
    let mut result = String::with_capacity(html.len());
    let mut skip_depth = 0usize;
    let mut pos = 0;

    while pos < html.len() {
        let Some(offset) = html[pos..].find('<') else {
            push_text(&mut result, &html[pos..], skip_depth > 0, &finder);
            break;
        };
        let tag_start = pos + offset;
        push_text(&mut result, &html[pos..tag_start], skip_depth > 0, &finder);

        let tag_end = find_tag_end(html, tag_start);
        let tag = &html[tag_start..tag_end];

        match tag_name(tag) {
            Some((false, name)) if name == "img" => push_image(&mut result, tag),
            Some((false, name)) => {
                if SKIP_TAGS.contains(&name.as_str()) && !tag.ends_with("/>") {
                    skip_depth += 1;
                }
                result.push_str(tag);
            }
            Some((true, name)) => {
                if SKIP_TAGS.contains(&name.as_str()) {
                    skip_depth = skip_depth.saturating_sub(1);
                }
                result.push_str(tag);
            }
            None => result.push_str(tag),
        }

        pos = tag_end;
    }

    result
}

/// URL finder used for autolinking.
fn link_finder() -> LinkFinder {
    let mut finder = LinkFinder::new();
    finder.kinds(&[LinkKind::Url]).url_must_have_scheme(false);
    finder
}

/// Appends a text run, wrapping URLs in anchors unless inside a skipped element.
fn push_text(result: &mut String, text: &str, skip: bool, finder: &LinkFinder) {
    if text.is_empty() {
        return;
    }
    if skip {
        result.push_str(text);
        return;
    }

    let decoded = decode_entities(text);
    let mut linked = String::with_capacity(text.len());
    let mut found = false;

    for span in finder.spans(&decoded) {
        let href = span.kind().and_then(|_| link_href(span.as_str()));
        match href {
            Some(href) => {
                found = true;
                linked.push_str("<a href=\"");
                linked.push_str(&escape_attr(&href));
                linked.push_str("\" rel=\"nofollow\">");
                linked.push_str(&escape_text(span.as_str()));
                linked.push_str("</a>");
            }
            None => linked.push_str(&escape_text(span.as_str())),
        }
    }

    if found {
        result.push_str(&linked);
    } else {
        result.push_str(text);
    }
}

/// Returns link target for detected URL text, or None to leave it as text.
///
/// Links with a scheme are kept only for [`LINK_SCHEMES`]; this pass runs
/// after sanitization, so nothing else filters the `href`. Scheme-less
/// matches are linked over `http://` when the host ends in a known top
/// level domain, which keeps file names such as `notes.txt` as text.
fn link_href(url: &str) -> Option<String> {
    if let Some((scheme, rest)) = url.split_once(':') {
        if rest.starts_with("//") || scheme.eq_ignore_ascii_case("mailto") {
            return LINK_SCHEMES
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(scheme))
                .then(|| url.to_string());
        }
    }

    has_known_tld(url).then(|| format!("http://{}", url))
}

/// Returns whether the host of a scheme-less URL ends in a known TLD.
fn has_known_tld(url: &str) -> bool {
    let host = url
        .split(['/', '?', '#', ':'])
        .next()
        .unwrap_or_default();

    match host.rsplit_once('.') {
        Some((name, tld)) if !name.is_empty() => {
            let tld = tld.to_ascii_lowercase();
            TLDS.binary_search(&tld.as_str()).is_ok()
        }
        _ => false,
    }
}

/// Appends an image tag with the max-width style added.
fn push_image(result: &mut String, tag: &str) {
    let Some(body) = tag.strip_suffix('>') else {
        result.push_str(tag);
        return;
    };
    let body = body.strip_suffix('/').unwrap_or(body).trim_end();

    result.push_str(body);
    result.push_str(" style=\"");
    result.push_str(IMAGE_STYLE);
    result.push_str("\">");
}

/// Returns the index just past the `>` closing the tag at `start`.
///
/// Quoted attribute values may contain `>`. Returns the input length when the
/// tag is unterminated.
fn find_tag_end(html: &str, start: usize) -> usize {
    let mut quote: Option<u8> = None;

    for (i, byte) in html.bytes().enumerate().skip(start + 1) {
        match (quote, byte) {
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(byte),
            (None, b'>') => return i + 1,
            (None, _) => {}
        }
    }

    html.len()
}

/// Parses tag text into (is_closing, lowercase name).
fn tag_name(tag: &str) -> Option<(bool, String)> {
    let inner = tag.strip_prefix('<')?;
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };

    let name: String = inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();

    if name.is_empty() {
        None
    } else {
        Some((closing, name.to_ascii_lowercase()))
    }
}
