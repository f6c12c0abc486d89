//! HTML allow-list sanitization.

use std::collections::{BTreeMap, HashMap, HashSet};

/// Tags always allowed through sanitization.
pub const BASE_TAGS: &[&str] = &[
    "a",
    "abbr",
    "acronym",
    "b",
    "blockquote",
    "code",
    "em",
    "i",
    "li",
    "ol",
    "strong",
    "ul",
    "pre",
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "img",
];

/// Attributes always allowed, keyed by tag.
const BASE_ATTRIBUTES: &[(&str, &[&str])] = &[("a", &["href"]), ("img", &["src", "alt"])];

/// Tags whose content is dropped along with the tag unless explicitly allowed.
const CLEAN_CONTENT_TAGS: &[&str] = &["script", "style"];

/// Attributes owned by the rendering pipeline rather than the allow-list.
///
/// Anchors always get `rel="nofollow"` from the sanitizer and images get their
/// style from the post-sanitization image filter.
const RESERVED_ATTRIBUTES: &[(&str, &str)] = &[("a", "rel"), ("img", "style")];

const LINK_REL: &str = "nofollow";

/// Allow-list sanitizer built on ammonia.
///
/// Disallowed tags are removed while their text content is kept, except for
/// `script` and `style` whose content is dropped too. All attributes not on
/// the allow-list are removed, comments are stripped and every anchor gets
/// `rel="nofollow"`.
#[derive(Debug, Clone)]
pub struct Sanitizer<'a> {
    tags: HashSet<&'a str>,
    tag_attributes: HashMap<&'a str, HashSet<&'a str>>,
}

impl<'a> Sanitizer<'a> {
    /// Creates sanitizer allowing the base set plus extra tags and attributes.
    ///
    /// Extra attributes are unioned with the base attributes of the same tag.
    ///
    /// # Arguments
    ///
    /// * `extra_tags`: Tag names allowed in addition to [`BASE_TAGS`]
    /// * `extra_attrs`: Attribute names allowed per tag
    pub fn new(extra_tags: &'a [String], extra_attrs: &'a BTreeMap<String, Vec<String>>) -> Self {
        let tags = BASE_TAGS
            .iter()
            .copied()
            .chain(extra_tags.iter().map(String::as_str))
            .collect();

        let mut tag_attributes: HashMap<&'a str, HashSet<&'a str>> = BASE_ATTRIBUTES
            .iter()
            .map(|(tag, attrs)| (*tag, attrs.iter().copied().collect()))
            .collect();

        for (tag, attrs) in extra_attrs {
            let allowed = tag_attributes.entry(tag.as_str()).or_default();
            for attr in attrs {
                if is_reserved(tag, attr) {
                    tracing::warn!(tag = %tag, attribute = %attr, "Ignoring reserved attribute in allow-list");
                    continue;
                }
                allowed.insert(attr.as_str());
            }
        }

        Self {
            tags,
            tag_attributes,
        }
    }

    /// Returns whether a tag is on the allow-list.
    pub fn allows_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Returns whether an attribute is allowed on a tag.
    pub fn allows_attribute(&self, tag: &str, attribute: &str) -> bool {
        self.tag_attributes
            .get(tag)
            .is_some_and(|attrs| attrs.contains(attribute))
    }

    /// Sanitizes an HTML fragment against the allow-list.
    ///
    /// # Arguments
    ///
    /// * `html`: Untrusted HTML fragment
    ///
    /// # Returns
    ///
    /// Sanitized HTML fragment
    pub fn clean(&self, html: &str) -> String {
        // ammonia rejects tags that are both allowed and content-cleaned
        let clean_content: HashSet<&str> = CLEAN_CONTENT_TAGS
            .iter()
            .copied()
            .filter(|tag| !self.tags.contains(tag) && !self.tag_attributes.contains_key(tag))
            .collect();

        let mut cleaner = ammonia::Builder::default();
        cleaner
            .tags(self.tags.clone())
            .tag_attributes(self.tag_attributes.clone())
            .generic_attributes(HashSet::<&str>::new())
            .clean_content_tags(clean_content)
            .strip_comments(true)
            .link_rel(Some(LINK_REL));

        cleaner.clean(html).to_string()
    }
}

fn is_reserved(tag: &str, attribute: &str) -> bool {
    RESERVED_ATTRIBUTES
        .iter()
        .any(|(reserved_tag, reserved_attr)| *reserved_tag == tag && *reserved_attr == attribute)
}
