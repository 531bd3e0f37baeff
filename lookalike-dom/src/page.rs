//! Parsed page backed by `scraper` (html5ever).

use crate::generic::{normalize_attribute_value, GenericDom, GenericElement};
use crate::stylesheet::StyleSheetMap;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use url::Url;

/// Attribute some pipelines already set to flag styled elements.
const CSS_MARK_ATTRIBUTE: &str = "css_mark";

#[derive(Default)]
struct Projection {
    marked: bool,
    attributes: Vec<(String, String)>,
}

/// A parsed HTML document that can be filtered in place and then converted
/// to a [`GenericDom`].
pub struct PageDom {
    html: Html,
    base_url: Option<Url>,
}

impl PageDom {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
            base_url: None,
        }
    }

    /// Resolve relative stylesheet links against `url`. Unparseable URLs are ignored.
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = Url::parse(url).ok();
        self
    }

    /// Detach every element (with its subtree) whose tag is listed. Returns
    /// how many elements were removed. The document element is never removed.
    pub fn filter(&mut self, tags: &[String]) -> usize {
        let mut removed = 0;
        for tag in tags {
            let tag = tag.trim().to_ascii_lowercase();
            if tag.is_empty() || tag == "html" {
                continue;
            }
            let Ok(selector) = Selector::parse(&tag) else {
                tracing::debug!(tag = %tag, "dom.filter.invalid_tag");
                continue;
            };
            let ids: Vec<_> = self.html.select(&selector).map(|el| el.id()).collect();
            for id in ids {
                if let Some(mut node) = self.html.tree.get_mut(id) {
                    node.detach();
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Collect the text of every element whose tag is listed (in list order,
    /// then document order) and detach those elements.
    pub fn take_inline_styles(&mut self, style_tags: &[String]) -> Vec<String> {
        let mut sources = Vec::new();
        for tag in style_tags {
            let tag = tag.trim().to_ascii_lowercase();
            if tag.is_empty() || tag == "html" {
                continue;
            }
            let Ok(selector) = Selector::parse(&tag) else {
                tracing::debug!(tag = %tag, "dom.styles.invalid_tag");
                continue;
            };
            let found: Vec<_> = self
                .html
                .select(&selector)
                .map(|el| (el.id(), el.text().collect::<String>()))
                .collect();
            for (id, text) in found {
                sources.push(text);
                if let Some(mut node) = self.html.tree.get_mut(id) {
                    node.detach();
                }
            }
        }
        sources
    }

    /// Absolute URLs of `<link rel="stylesheet" href=...>` elements.
    pub fn stylesheet_links(&self) -> Vec<String> {
        let Ok(selector) = Selector::parse("link[href]") else {
            return Vec::new();
        };
        self.html
            .select(&selector)
            .filter(|el| {
                el.value()
                    .attr("rel")
                    .map(|rel| {
                        rel.split_whitespace()
                            .any(|t| t.eq_ignore_ascii_case("stylesheet"))
                    })
                    .unwrap_or(false)
            })
            .filter_map(|el| el.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .filter_map(|href| self.resolve(href))
            .collect()
    }

    fn resolve(&self, href: &str) -> Option<String> {
        if let Ok(abs) = Url::parse(href) {
            return Some(abs.to_string());
        }
        match &self.base_url {
            Some(base) => base.join(href).ok().map(|u| u.to_string()),
            None => {
                tracing::debug!(href, "dom.styles.relative_link_without_base");
                None
            }
        }
    }

    /// Convert to an owned [`GenericDom`] rooted at the document element.
    ///
    /// With a `projection`, every element matched by a selector gets
    /// `css_mark` and each declared property it does not already carry as
    /// an attribute. Selectors the engine cannot parse are skipped.
    pub fn to_generic(&self, projection: Option<&StyleSheetMap>) -> GenericDom {
        let mut projected = HashMap::new();
        if let Some(sheet) = projection {
            for (css, declarations) in sheet.iter() {
                let selector = match Selector::parse(css) {
                    Ok(s) => s,
                    Err(e) => {
                        tracing::debug!(
                            selector = css,
                            error = ?e,
                            "dom.projection.unsupported_selector"
                        );
                        continue;
                    }
                };
                for el in self.html.select(&selector) {
                    let entry: &mut Projection = projected.entry(el.id()).or_default();
                    entry.marked = true;
                    for (prop, value) in declarations.iter() {
                        let present = el.value().attr(prop).is_some()
                            || entry.attributes.iter().any(|(k, _)| k == prop);
                        if !present {
                            entry.attributes.push((prop.to_string(), value.to_string()));
                        }
                    }
                }
            }
        }

        let shell = |el: ElementRef<'_>| -> GenericElement {
            let mut out = GenericElement::new(el.value().name());
            for (name, value) in el.value().attrs() {
                if name == CSS_MARK_ATTRIBUTE {
                    let value = value.trim();
                    out.css_mark |= !value.is_empty() && value != "0";
                    continue;
                }
                out.attributes
                    .push((name.to_string(), normalize_attribute_value(name, value)));
            }
            if let Some(p) = projected.get(&el.id()) {
                out.css_mark |= p.marked;
                out.attributes.extend(p.attributes.iter().cloned());
            }
            out
        };

        // Iterative post-order assembly; documents can nest deeply.
        let root = self.html.root_element();
        let mut stack = vec![(shell(root), root.children())];
        loop {
            let next = stack
                .last_mut()
                .and_then(|(_, children)| children.find_map(ElementRef::wrap));
            if let Some(child) = next {
                stack.push((shell(child), child.children()));
                continue;
            }
            let Some((done, _)) = stack.pop() else {
                break GenericDom::new(GenericElement::new("html"));
            };
            match stack.last_mut() {
                Some((parent, _)) => parent.children.push(done),
                None => break GenericDom::new(done),
            }
        }
    }
}
