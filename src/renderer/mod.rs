//! Plain-text rendering of fetched responses

use crate::network::Response;

/// Text a user should see for a response.
///
/// View-source responses are shown verbatim. Everything else has its
/// `<...>` tags stripped and `&lt;` / `&gt;` decoded.
pub fn show(response: &Response) -> String {
    let body = response.text();
    if response.view_source() {
        return body.into_owned();
    }
    strip_markup(&body)
}

/// Drop tags and decode the two entities that can appear in text
pub fn strip_markup(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut in_tag = false;
    let mut rest = content;

    while let Some(c) = rest.chars().next() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if in_tag => {}
            '&' if rest.starts_with("&lt;") => {
                out.push('<');
                rest = &rest[4..];
                continue;
            }
            '&' if rest.starts_with("&gt;") => {
                out.push('>');
                rest = &rest[4..];
                continue;
            }
            _ => out.push(c),
        }
        rest = &rest[c.len_utf8()..];
    }

    out
}
