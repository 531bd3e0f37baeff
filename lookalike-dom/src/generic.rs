//! Library-agnostic element tree handed to the tree builder.

/// Attributes whose value is a whitespace-separated token list.
pub const MULTI_VALUED_ATTRIBUTES: &[&str] = &[
    "class",
    "rel",
    "rev",
    "accept-charset",
    "headers",
    "accesskey",
    "dropzone",
];

/// Collapse token-list attribute values to single-space separated form.
///
/// ```
/// use lookalike_dom::generic::normalize_attribute_value;
///
/// assert_eq!(normalize_attribute_value("class", "  btn \n primary "), "btn primary");
/// assert_eq!(normalize_attribute_value("title", " keep "), " keep ");
/// ```
pub fn normalize_attribute_value(name: &str, value: &str) -> String {
    if MULTI_VALUED_ATTRIBUTES.contains(&name) {
        value.split_whitespace().collect::<Vec<_>>().join(" ")
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericElement {
    pub tag: String,
    /// Attributes in document order, stylesheet projections appended last.
    pub attributes: Vec<(String, String)>,
    /// Set when at least one stylesheet selector matched this element.
    pub css_mark: bool,
    pub children: Vec<GenericElement>,
}

impl GenericElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn marked(mut self) -> Self {
        self.css_mark = true;
        self
    }

    pub fn child(mut self, child: GenericElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A whole document, rooted at its document element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericDom {
    pub root: GenericElement,
}

impl GenericDom {
    pub fn new(root: GenericElement) -> Self {
        Self { root }
    }
}
