use std::collections::{HashMap, HashSet};

use html_escape::decode_html_entities;

use crate::normalizer::Sanitizer;

/// Tags the messaging endpoint accepts: bold, italic and anchors.
pub const ALLOWED_TAGS: [&str; 3] = ["b", "i", "a"];

/// Named entities the messaging endpoint understands.
const KNOWN_ENTITIES: [&str; 4] = ["lt", "gt", "amp", "quot"];

/// [`Sanitizer`] backed by `ammonia`.
///
/// Disallowed elements are unwrapped, so their text survives; `script` and
/// `style` are dropped together with their contents. Anchors keep only
/// `href`; no other attribute survives. Named entities other than `&lt;`,
/// `&gt;`, `&amp;` and `&quot;` are written out as characters.
#[derive(Debug, Clone, Default)]
pub struct AmmoniaSanitizer;

impl AmmoniaSanitizer {
    pub fn new() -> Self {
        Self
    }
}

impl Sanitizer for AmmoniaSanitizer {
    fn sanitize(&self, markup: &str) -> String {
        let tags: HashSet<&str> = ALLOWED_TAGS.iter().copied().collect();
        let clean = ammonia::Builder::default()
            .tags(tags)
            .generic_attributes(HashSet::new())
            .tag_attributes(HashMap::from([("a", HashSet::from(["href"]))]))
            .link_rel(None)
            .clean(markup)
            .to_string();
        decode_unknown_entities(&clean)
    }
}

/// Replaces named entities outside [`KNOWN_ENTITIES`] (ammonia emits
/// `&nbsp;`) with the characters they stand for.
fn decode_unknown_entities(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];

        let name = rest[1..]
            .find(';')
            .map(|end| &rest[1..end + 1])
            .filter(|name| !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric()));
        match name {
            Some(name) if !KNOWN_ENTITIES.contains(&name) => {
                let entity = &rest[..name.len() + 2];
                out.push_str(&decode_html_entities(entity));
                rest = &rest[entity.len()..];
            }
            _ => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
