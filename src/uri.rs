//! URI helpers
//!
//! Query parameters are always emitted sorted by key so that equal inputs
//! produce byte-identical URIs.

use url::form_urlencoded;

/// Escape a value for use in a query string (`a b` → `a+b`, `/` → `%2F`)
pub fn query_escape(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Escape a single path segment (`a b` → `a%20b`, `?` → `%3F`)
pub fn path_escape(segment: &str) -> String {
    query_escape(segment).replace('+', "%20")
}

/// Append `params` to `uri` as sorted, escaped query parameters.
///
/// Uses `&` as the first separator when `uri` already has a query string.
pub fn append_parameters<'a, I>(uri: &str, params: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut pairs: Vec<(&String, &String)> = params.into_iter().collect();
    pairs.sort();

    let mut out = String::from(uri);
    let mut separator = if uri.contains('?') { '&' } else { '?' };
    for (key, value) in pairs {
        out.push(separator);
        out.push_str(&query_escape(key));
        out.push('=');
        out.push_str(&query_escape(value));
        separator = '&';
    }
    out
}

/// Scheme of a URI, lowercased (`HTTPS://x` → `https`)
pub fn scheme(uri: &str) -> Option<String> {
    uri.split_once(':')
        .map(|(scheme, _)| scheme.to_ascii_lowercase())
        .filter(|s| !s.is_empty())
}
