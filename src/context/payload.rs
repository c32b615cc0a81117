// Locates the embedded context element in a rendered page.

use regex::Regex;

use crate::config::CONTEXT_ANCHOR_ID;

/// Inner text of the context element, or `None` if the page has none.
pub fn extract_payload(html: &str) -> Option<String> {
    element_text_by_id(html, CONTEXT_ANCHOR_ID)
}

/// Inner text of the first element whose `id` attribute equals `id`,
/// with the basic HTML entities decoded.
pub fn element_text_by_id(html: &str, id: &str) -> Option<String> {
    let pattern = format!(
        r#"(?is)<([a-z][a-z0-9]*)\b[^>]*\bid\s*=\s*["']?{}["']?[\s/>][^>]*?>?"#,
        regex::escape(id)
    );
    let open = Regex::new(&pattern).ok()?;
    let caps = open.captures(html)?;
    let whole = caps.get(0)?;
    let tag = caps.get(1)?.as_str().to_ascii_lowercase();

    // The id match may stop before the end of the opening tag.
    let body_start = match whole.as_str().ends_with('>') {
        true => whole.end(),
        false => whole.end() + html[whole.end()..].find('>')? + 1,
    };
    let rest = &html[body_start..];
    let close = rest.to_ascii_lowercase().find(&format!("</{}", tag))?;
    Some(decode_entities(&rest[..close]))
}

fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
