//! Bind-parameter scanner - extracts parameter references from raw SQL text

use std::{collections::HashSet, iter::Peekable, str::CharIndices};

use crate::{config::ScanOptions, sql::fold_case};

/// One parameter reference found in SQL text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterToken {
    /// Name without the marker, as written
    pub name: String,
    /// Byte offset of the marker
    pub offset: usize,
    /// Byte length of marker plus name
    pub len: usize,
}

/// Scans SQL text left to right, yielding bind-parameter references
///
/// Skipped: doubled markers (driver system references such as `@@version`),
/// variables introduced by the declare keyword (on that and every later
/// occurrence) and names the caller has already bound.
pub struct Scanner<'a> {
    text: &'a str,
    iter: Peekable<CharIndices<'a>>,
    marker: char,
    declare_keyword: &'a str,
    /// Case-folded names never yielded
    skip: HashSet<String>,
}

impl<'a> Iterator for Scanner<'a> {
    type Item = ParameterToken;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let marker = self.marker;
            let offset = self.next_marker()?;

            // Doubled marker: system reference, advance past both
            if self.next_if(|c| c == marker).is_some() {
                continue;
            }

            let name = match self.next_while(|c| !is_delimiter(c)) {
                Some(name) => name,
                None => continue,
            };
            let key = fold_case(&name);

            if self.is_declared_at(offset) {
                self.skip.insert(key);
                continue;
            }
            if self.skip.contains(&key) {
                continue;
            }

            let len = self.marker.len_utf8() + name.len();
            return Some(ParameterToken { name, offset, len });
        }
    }
}

impl<'a> Scanner<'a> {
    /// Creates a scanner with the default `@` marker
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            iter: text.char_indices().peekable(),
            marker: '@',
            declare_keyword: "declare",
            skip: HashSet::new(),
        }
    }

    pub fn with_options(text: &'a str, options: &'a ScanOptions) -> Self {
        Self {
            marker: options.marker,
            declare_keyword: &options.declare_keyword,
            ..Self::new(text)
        }
    }

    /// Excludes names already bound by the caller (compared case-insensitively)
    pub fn skip_bound<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.skip
            .extend(names.into_iter().map(|n| fold_case(n.as_ref())));
        self
    }

    /// Consumes the next character if it satisfies the predicate
    fn next_if<F: Fn(char) -> bool>(&mut self, predicate: F) -> Option<char> {
        self.iter.peek().filter(|&&(_, c)| predicate(c))?;
        self.iter.next().map(|(_, c)| c)
    }

    /// Consumes consecutive characters while they satisfy the predicate
    fn next_while<F: Fn(char) -> bool>(&mut self, predicate: F) -> Option<String> {
        let mut value = String::new();
        while let Some(c) = self.next_if(&predicate) {
            value.push(c);
        }
        Some(value).filter(|v| !v.is_empty())
    }

    /// Advances past the next marker, returning its offset
    fn next_marker(&mut self) -> Option<usize> {
        let marker = self.marker;
        self.iter.find(|&(_, c)| c == marker).map(|(i, _)| i)
    }

    /// Whether the fixed-width text before `offset` is the declare keyword plus a separator
    fn is_declared_at(&self, offset: usize) -> bool {
        let keyword_len = self.declare_keyword.len();
        let Some(start) = offset.checked_sub(keyword_len + 1) else {
            return false;
        };
        match (
            self.text.get(start..start + keyword_len),
            self.text.get(start + keyword_len..offset),
        ) {
            (Some(keyword), Some(sep)) => {
                keyword.eq_ignore_ascii_case(self.declare_keyword)
                    && sep.chars().all(char::is_whitespace)
            }
            _ => false,
        }
    }
}

/// Characters that terminate a parameter name
fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || (c.is_ascii_punctuation() && !matches!(c, '_' | '#' | '$'))
}

/// Distinct parameter names in first-occurrence order
///
/// A name referenced several times is listed once, as first written.
pub fn scan<I, S>(text: &str, bound: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    distinct(&Scanner::new(text).skip_bound(bound).collect::<Vec<_>>())
}

/// Every non-excluded parameter reference, in text order, repeats included
pub fn scan_tokens<I, S>(text: &str, bound: I) -> Vec<ParameterToken>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Scanner::new(text).skip_bound(bound).collect()
}

pub(crate) fn distinct<'t>(tokens: impl IntoIterator<Item = &'t ParameterToken>) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens
        .into_iter()
        .filter(|t| seen.insert(fold_case(&t.name)))
        .map(|t| t.name.clone())
        .collect()
}
