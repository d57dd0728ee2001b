//! Turning resource identifiers into display names.

use percent_encoding::percent_decode_str;
use url::Url;

/// Fragment of `uri`, or its last path segment when there is no fragment,
/// percent-decoded. Anything that does not parse as a URL is returned
/// unchanged.
pub fn local_name(uri: &str) -> String {
    match Url::parse(uri) {
        Ok(url) => {
            let raw = match url.fragment().filter(|fragment| !fragment.is_empty()) {
                Some(fragment) => fragment,
                None => url.path().rsplit('/').next().unwrap_or_default(),
            };
            percent_decode_str(raw).decode_utf8_lossy().into_owned()
        }
        Err(_) => uri.to_string(),
    }
}

/// Human-readable name of a resource: its local name with camelCase split
/// into capitalised words. Non-URLs pass through untouched.
pub fn display_name(uri: &str) -> String {
    if Url::parse(uri).is_err() {
        return uri.to_string();
    }
    split_camel_case(&local_name(uri))
}

/// "oliveOil" -> "Olive Oil".
pub fn split_camel_case(value: &str) -> String {
    let mut spaced = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        if c.is_ascii_uppercase() {
            spaced.push(' ');
        }
        spaced.push(c);
    }
    spaced
        .trim()
        .split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `text` without a leading `prefix`, if it has one.
pub fn strip_leading<'a>(text: &'a str, prefix: &str) -> &'a str {
    text.strip_prefix(prefix).unwrap_or(text)
}
