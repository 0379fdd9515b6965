// Compound selectors (`nav`, `.navbar`, `#header`, `[data-en]`, `span.i18n-cur`)
// No combinators: the controller only ever needs single-element matches.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("unsupported selector syntax in {0:?}")]
    Unsupported(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Simple {
    Tag(String),
    Id(String),
    Class(String),
    Attr(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    parts: Vec<Simple>,
    source: String,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &[char], start: usize) -> (String, usize) {
    let mut end = start;
    while end < chars.len() && is_ident_char(chars[end]) {
        end += 1;
    }
    (chars[start..end].iter().collect(), end)
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(SelectorError::Empty);
        }
        let unsupported = || SelectorError::Unsupported(source.to_string());
        let chars: Vec<char> = source.chars().collect();
        let mut parts = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if is_ident_char(c) && i == 0 {
                let (name, end) = take_ident(&chars, i);
                parts.push(Simple::Tag(name.to_ascii_lowercase()));
                i = end;
                continue;
            }
            match c {
                '.' | '#' => {
                    let (name, end) = take_ident(&chars, i + 1);
                    if name.is_empty() {
                        return Err(unsupported());
                    }
                    parts.push(if c == '.' { Simple::Class(name) } else { Simple::Id(name) });
                    i = end;
                }
                '[' => {
                    let (name, end) = take_ident(&chars, i + 1);
                    if name.is_empty() || chars.get(end) != Some(&']') {
                        return Err(unsupported());
                    }
                    parts.push(Simple::Attr(name.to_ascii_lowercase()));
                    i = end + 1;
                }
                _ => return Err(unsupported()),
            }
        }

        Ok(Self {
            parts,
            source: source.to_string(),
        })
    }

    pub fn id(id: &str) -> Self {
        Self {
            parts: vec![Simple::Id(id.to_string())],
            source: format!("#{id}"),
        }
    }

    pub fn class(class: &str) -> Self {
        Self {
            parts: vec![Simple::Class(class.to_string())],
            source: format!(".{class}"),
        }
    }

    pub fn attr(name: &str) -> Self {
        Self {
            parts: vec![Simple::Attr(name.to_ascii_lowercase())],
            source: format!("[{name}]"),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Matches an element given its tag name and an attribute accessor.
    pub fn matches_element<F>(&self, tag: &str, attr: F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        self.parts.iter().all(|part| match part {
            Simple::Tag(name) => tag.eq_ignore_ascii_case(name),
            Simple::Id(id) => attr("id").as_deref() == Some(id.as_str()),
            Simple::Class(class) => attr("class")
                .map(|list| list.split_whitespace().any(|c| c == class))
                .unwrap_or(false),
            Simple::Attr(name) => attr(name).is_some(),
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
