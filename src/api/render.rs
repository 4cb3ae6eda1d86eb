//! Template rendering for the search page and the Atom feed.
//!
//! Templates are embedded at compile time. HTML templates are auto-escaped;
//! the feed escapes its text through the `xml` filter.

use minijinja::value::Value;
use minijinja::{AutoEscape, Environment};
use once_cell::sync::Lazy;

pub const SEARCH_PAGE: &str = "search.html";
pub const SEARCH_FEED: &str = "feed.xml";

const TEMPLATES: [(&str, &str); 2] = [
    (SEARCH_PAGE, include_str!("../../templates/search.html")),
    (SEARCH_FEED, include_str!("../../templates/feed.xml")),
];

/// Whether `c` may appear in an XML 1.0 document
fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// Escape text for XML element content and double-quoted attributes.
/// Characters XML cannot carry are dropped.
fn xml(value: Value) -> Value {
    let s = value.to_string();
    let mut out = String::with_capacity(s.len());
    for c in s.chars().filter(|c| is_xml_char(*c)) {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Value::from_safe_string(out)
}

static ENV: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();

    env.set_auto_escape_callback(|name| {
        if name.ends_with(".html") {
            AutoEscape::Html
        } else {
            AutoEscape::None
        }
    });
    env.add_filter("xml", xml);

    for (name, source) in TEMPLATES {
        if let Err(e) = env.add_template(name, source) {
            tracing::error!(template = name, error = %e, "Failed to load template");
        }
    }

    env
});

pub fn render_template<T: serde::Serialize>(name: &str, ctx: T) -> Result<String, minijinja::Error> {
    let tpl = ENV.get_template(name)?;
    tpl.render(ctx)
}
