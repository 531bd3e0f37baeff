//! Stylesheet parsing into an ordered selector → declarations map.
//!
//! Only qualified (style) rules are kept. At-rules such as `@media` or
//! `@font-face` are skipped together with their blocks, and malformed
//! declarations are dropped individually.

use cssparser::{ParseError, Parser, ParserInput, Token};
use std::fmt;

/// Ordered property → value list of one rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declarations(Vec<(String, String)>);

impl Declarations {
    /// Insert or overwrite `name`, keeping its first position.
    pub fn upsert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Declarations {
    /// Canonical text `{prop: value, prop: value}` in insertion order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        f.write_str("}")
    }
}

/// Selector text → declarations, ordered by first insertion.
///
/// A later rule for a selector replaces the earlier declarations wholesale
/// but keeps the selector's original position.
///
/// ```
/// use lookalike_dom::parse_stylesheet;
///
/// let sheet = parse_stylesheet(".a { color: red } .b { margin: 0 } .a { color: blue; }");
/// let selectors: Vec<_> = sheet.selectors().collect();
/// assert_eq!(selectors, vec![".a", ".b"]);
/// assert_eq!(sheet.get(".a").unwrap().get("color"), Some("blue"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSheetMap {
    rules: Vec<(String, Declarations)>,
}

impl StyleSheetMap {
    pub fn insert(&mut self, selector: impl Into<String>, declarations: Declarations) {
        let selector = selector.into();
        match self.rules.iter_mut().find(|(s, _)| *s == selector) {
            Some(slot) => slot.1 = declarations,
            None => self.rules.push((selector, declarations)),
        }
    }

    /// Merge every rule of `other`, in order, with [`StyleSheetMap::insert`] semantics.
    pub fn merge(&mut self, other: StyleSheetMap) {
        for (selector, decls) in other.rules {
            self.insert(selector, decls);
        }
    }

    pub fn get(&self, selector: &str) -> Option<&Declarations> {
        self.rules
            .iter()
            .find(|(s, _)| s == selector)
            .map(|(_, d)| d)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Declarations)> {
        self.rules.iter().map(|(s, d)| (s.as_str(), d))
    }

    pub fn selectors(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(s, _)| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Parse CSS source text. Never fails; unparseable input yields fewer rules.
pub fn parse_stylesheet(css: &str) -> StyleSheetMap {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut sheet = StyleSheetMap::default();

    loop {
        parser.skip_whitespace();
        // `<!--` / `-->` wrappers are common inside <style> blocks.
        if parser
            .try_parse(|p| match p.next() {
                Ok(Token::CDO) | Ok(Token::CDC) => Ok(()),
                _ => Err(()),
            })
            .is_ok()
        {
            continue;
        }
        if parser.is_exhausted() {
            break;
        }

        let start = parser.position();
        let mut first = true;
        let mut at_rule = false;
        let mut has_block = false;
        loop {
            match parser.next() {
                Ok(Token::AtKeyword(_)) if first => at_rule = true,
                Ok(Token::Semicolon) if at_rule => break,
                Ok(Token::CurlyBracketBlock) => {
                    has_block = true;
                    break;
                }
                Ok(_) => {}
                Err(_) => break,
            }
            first = false;
        }

        if !has_block {
            continue;
        }
        if at_rule {
            let _: Result<(), ParseError<'_, ()>> = parser.parse_nested_block(|_| Ok(()));
            continue;
        }

        let selector = normalize_selector(parser.slice_from(start).trim_end_matches('{'));
        let parsed: Result<Declarations, ParseError<'_, ()>> =
            parser.parse_nested_block(|p| Ok(parse_declaration_block(p)));
        if selector.is_empty() {
            continue;
        }
        if let Ok(decls) = parsed {
            sheet.insert(selector, decls);
        }
    }

    sheet
}

fn normalize_selector(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_declaration_block(p: &mut Parser<'_, '_>) -> Declarations {
    let mut decls = Declarations::default();
    loop {
        p.skip_whitespace();
        if p.is_exhausted() {
            break;
        }
        let start = p.position();
        let mut end = start;
        loop {
            let before = p.position();
            match p.next() {
                Ok(Token::Semicolon) => {
                    end = before;
                    break;
                }
                Ok(_) => end = p.position(),
                Err(_) => break,
            }
        }
        if let Some((name, value)) = split_declaration(p.slice(start..end)) {
            decls.upsert(name, value);
        }
    }
    decls
}

fn split_declaration(text: &str) -> Option<(String, String)> {
    let (name, value) = text.split_once(':')?;
    let name = name.trim().to_ascii_lowercase();
    let mut value = value.trim();
    if let Some(idx) = value.to_ascii_lowercase().rfind("!important") {
        value = value[..idx].trim_end();
    }
    if name.is_empty() || value.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some((name, value.to_string()))
}
