use std::fmt::Display;

/// Fills positional `{0}`, `{1}`, ... placeholders in `template`.
///
/// Only the first occurrence of each placeholder is replaced. Placeholders without a
/// matching argument are left untouched.
pub fn format_template(template: &str, args: &[&dyn Display]) -> String {
    args.iter()
        .enumerate()
        .fold(template.to_owned(), |content, (i, arg)| {
            content.replacen(&format!("{{{i}}}"), &arg.to_string(), 1)
        })
}

/// Escapes text for use in HTML/SVG content and quoted attributes.
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
