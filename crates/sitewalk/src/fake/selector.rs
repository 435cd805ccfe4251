//! CSS selector subset understood by the fake browser.
//!
//! Supported: type, `*`, `#id`, `.class`, `[attr]`, `[attr=v]`, `^=`, `$=`,
//! `*=`, `~=`, descendant and child combinators, and `,` lists.

use crate::locator::{Locator, Strategy};
use crate::result::{SitewalkError, SitewalkResult};
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AttrOp {
    Exists,
    Equals,
    Prefix,
    Suffix,
    Contains,
    Word,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AttrSelector {
    pub(crate) name: String,
    op: AttrOp,
    value: String,
}

impl AttrSelector {
    pub(crate) fn test(&self, actual: &str) -> bool {
        match self.op {
            AttrOp::Exists => true,
            AttrOp::Equals => actual == self.value,
            AttrOp::Prefix => !self.value.is_empty() && actual.starts_with(&self.value),
            AttrOp::Suffix => !self.value.is_empty() && actual.ends_with(&self.value),
            AttrOp::Contains => !self.value.is_empty() && actual.contains(&self.value),
            AttrOp::Word => actual.split_whitespace().any(|w| w == self.value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Compound {
    pub(crate) tag: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<AttrSelector>,
}

/// Compounds left to right; `child_combinators[i]` is true when
/// `compounds[i + 1]` must be a direct child of `compounds[i]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Selector {
    pub(crate) compounds: Vec<Compound>,
    pub(crate) child_combinators: Vec<bool>,
}

/// A resolved locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Query {
    /// Selector list; an element matches if any selector does
    Css(Vec<Selector>),
    /// Links by visible text
    LinkText { text: String, partial: bool },
}

impl Query {
    pub(crate) fn from_locator(locator: &Locator) -> SitewalkResult<Self> {
        let single = |compound: Compound| {
            Self::Css(vec![Selector {
                compounds: vec![compound],
                child_combinators: Vec::new(),
            }])
        };
        let value = locator.value();
        match locator.strategy() {
            Strategy::Css => parse(value).map(Self::Css),
            Strategy::Id => Ok(single(Compound {
                id: Some(value.to_string()),
                ..Compound::default()
            })),
            Strategy::ClassName => Ok(single(Compound {
                classes: vec![value.trim().to_string()],
                ..Compound::default()
            })),
            Strategy::TagName => Ok(single(Compound {
                tag: Some(value.to_ascii_lowercase()),
                ..Compound::default()
            })),
            Strategy::Name => Ok(single(Compound {
                attrs: vec![AttrSelector {
                    name: "name".to_string(),
                    op: AttrOp::Equals,
                    value: value.to_string(),
                }],
                ..Compound::default()
            })),
            Strategy::LinkText => Ok(Self::LinkText {
                text: value.trim().to_string(),
                partial: false,
            }),
            Strategy::PartialLinkText => Ok(Self::LinkText {
                text: value.to_string(),
                partial: true,
            }),
            Strategy::XPath => Err(SitewalkError::Unsupported {
                message: format!("XPath locators are not supported by the fake browser: {locator}"),
            }),
        }
    }
}

fn invalid(selector: &str, reason: &str) -> SitewalkError {
    SitewalkError::driver(format!("invalid selector '{selector}': {reason}"))
}

/// Parse a selector list
pub(crate) fn parse(selector: &str) -> SitewalkResult<Vec<Selector>> {
    let mut chars = selector.chars().peekable();
    let mut list = Vec::new();
    loop {
        list.push(parse_complex(selector, &mut chars)?);
        match chars.next() {
            None => return Ok(list),
            Some(',') => {}
            Some(c) => return Err(invalid(selector, &format!("unexpected '{c}'"))),
        }
    }
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) -> bool {
    let mut skipped = false;
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
        skipped = true;
    }
    skipped
}

fn parse_complex(selector: &str, chars: &mut Peekable<Chars<'_>>) -> SitewalkResult<Selector> {
    let mut compounds = Vec::new();
    let mut child_combinators = Vec::new();
    skip_whitespace(chars);
    loop {
        let Some(compound) = parse_compound(selector, chars)? else {
            return Err(invalid(selector, "expected a selector"));
        };
        compounds.push(compound);

        let spaced = skip_whitespace(chars);
        match chars.peek() {
            None | Some(',') => break,
            Some('>') => {
                chars.next();
                skip_whitespace(chars);
                child_combinators.push(true);
            }
            Some(_) if spaced => child_combinators.push(false),
            Some(c) => return Err(invalid(selector, &format!("unexpected '{c}'"))),
        }
    }
    Ok(Selector {
        compounds,
        child_combinators,
    })
}

/// `None` when nothing was consumed
fn parse_compound(
    selector: &str,
    chars: &mut Peekable<Chars<'_>>,
) -> SitewalkResult<Option<Compound>> {
    let mut compound = Compound::default();
    let mut first = true;
    while let Some(&c) = chars.peek() {
        match c {
            '*' if first => {
                chars.next();
            }
            c if first && is_ident_char(c) => {
                compound.tag = Some(ident(chars).to_ascii_lowercase());
            }
            '#' => {
                chars.next();
                compound.id = Some(required_ident(selector, chars)?);
            }
            '.' => {
                chars.next();
                compound.classes.push(required_ident(selector, chars)?);
            }
            '[' => {
                chars.next();
                compound.attrs.push(parse_attr(selector, chars)?);
            }
            ':' => return Err(invalid(selector, "pseudo-classes are not supported")),
            _ => break,
        }
        first = false;
    }
    Ok((!first).then_some(compound))
}

fn parse_attr(selector: &str, chars: &mut Peekable<Chars<'_>>) -> SitewalkResult<AttrSelector> {
    skip_whitespace(chars);
    let name = required_ident(selector, chars)?.to_ascii_lowercase();
    skip_whitespace(chars);
    let op = match chars.next() {
        Some(']') => {
            return Ok(AttrSelector {
                name,
                op: AttrOp::Exists,
                value: String::new(),
            })
        }
        Some('=') => AttrOp::Equals,
        Some(c @ ('^' | '$' | '*' | '~')) => {
            if chars.next() != Some('=') {
                return Err(invalid(selector, "expected '=' in attribute selector"));
            }
            match c {
                '^' => AttrOp::Prefix,
                '$' => AttrOp::Suffix,
                '*' => AttrOp::Contains,
                _ => AttrOp::Word,
            }
        }
        _ => return Err(invalid(selector, "malformed attribute selector")),
    };
    skip_whitespace(chars);
    let value = match chars.peek() {
        Some(&quote @ ('"' | '\'')) => {
            chars.next();
            let mut value = String::new();
            loop {
                match chars.next() {
                    Some(c) if c == quote => break,
                    Some('\\') => {
                        if let Some(c) = chars.next() {
                            value.push(c);
                        }
                    }
                    Some(c) => value.push(c),
                    None => return Err(invalid(selector, "unterminated string")),
                }
            }
            value
        }
        _ => required_ident(selector, chars)?,
    };
    skip_whitespace(chars);
    if chars.next() != Some(']') {
        return Err(invalid(selector, "expected ']'"));
    }
    Ok(AttrSelector { name, op, value })
}

const fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn ident(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        out.push(c);
        chars.next();
    }
    out
}

fn required_ident(selector: &str, chars: &mut Peekable<Chars<'_>>) -> SitewalkResult<String> {
    let name = ident(chars);
    if name.is_empty() {
        return Err(invalid(selector, "expected a name"));
    }
    Ok(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_compound() {
        let list = parse("a#buy.btn.primary[href^='https']").unwrap();
        assert_eq!(list.len(), 1);
        let compound = &list[0].compounds[0];
        assert_eq!(compound.tag.as_deref(), Some("a"));
        assert_eq!(compound.id.as_deref(), Some("buy"));
        assert_eq!(compound.classes, ["btn", "primary"]);
        assert_eq!(compound.attrs[0].op, AttrOp::Prefix);
    }

    #[test]
    fn test_combinators() {
        let list = parse("nav  ul > li a").unwrap();
        assert_eq!(list[0].compounds.len(), 4);
        assert_eq!(list[0].child_combinators, [false, true, false]);
    }

    #[test]
    fn test_universal() {
        let list = parse("ul > *").unwrap();
        assert_eq!(list[0].compounds[1], Compound::default());
    }

    #[test]
    fn test_list() {
        let list = parse("button[type=submit], input[type=\"submit\"]").unwrap();
        assert_eq!(list.len(), 2);
        assert!(list[1].compounds[0].attrs[0].test("submit"));
    }

    #[test]
    fn test_attr_ops() {
        let word = &parse("[class~=a]").unwrap()[0].compounds[0].attrs[0];
        assert!(word.test("b a c"));
        assert!(!word.test("ab"));
        let exists = &parse("[data-id]").unwrap()[0].compounds[0].attrs[0];
        assert!(exists.test(""));
    }

    #[test]
    fn test_invalid() {
        for bad in ["", "a >", "#", "a[href", "a:hover", ".a,", "a[x^y]", "a ! b"] {
            assert!(parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_xpath_unsupported() {
        assert!(matches!(
            Query::from_locator(&Locator::xpath("//a")),
            Err(SitewalkError::Unsupported { .. })
        ));
    }
}
