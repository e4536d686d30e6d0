//! Path pattern compilation.
//!
//! # Responsibilities
//! - Parse a path template into literal and parameter tokens
//! - Build an anchored regex that tests and captures a concrete path
//! - Fill a template back into a concrete path from a parameter map
//!
//! # Grammar
//! ```text
//! /user/:id            named segment
//! /user/:id?           optional segment
//! /files/:path*        zero or more segments
//! /files/:path+        one or more segments
//! /post/:id(\d+)       custom segment pattern
//! /raw/(.*)            unnamed group
//! *                    wildcard (captured as `pathMatch`)
//! ```
//!
//! # Design Decisions
//! - Compiled once per route record at table-build time
//! - Unnamed captures are indexed; index 0 is exposed as `pathMatch`
//! - Prefix-only matching (`end = false`) consumes the trailing delimiter
//!   instead of asserting it, the regex engine has no look-around

use std::sync::LazyLock;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::routing::error::PatternError;
use crate::routing::Params;

/// Reserved parameter key for the first unnamed capture.
pub const PATH_MATCH: &str = "pathMatch";

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// `encodeURI` followed by escaping `/`, `?` and `#`.
const PRETTY_SEGMENT: &AsciiSet = &URI_COMPONENT
    .remove(b';')
    .remove(b',')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$');

/// `encodeURI` followed by escaping `?` and `#`; slashes survive.
const ASTERISK_SEGMENT: &AsciiSet = &PRETTY_SEGMENT.remove(b'/');

/// Options handed to the pattern compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PatternOptions {
    /// Case-sensitive matching.
    pub sensitive: bool,
    /// Trailing delimiter is significant.
    pub strict: bool,
    /// Pattern must match the whole path (false = prefix match).
    pub end: bool,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            sensitive: false,
            strict: false,
            end: true,
        }
    }
}

/// Name of a captured parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyName {
    Named(String),
    Index(usize),
}

impl KeyName {
    /// Key under which the capture is stored in a params map.
    pub fn param_key(&self) -> String {
        match self {
            KeyName::Named(name) => name.clone(),
            KeyName::Index(0) => PATH_MATCH.to_string(),
            KeyName::Index(i) => i.to_string(),
        }
    }
}

impl std::fmt::Display for KeyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyName::Named(name) => write!(f, "{}", name),
            KeyName::Index(i) => write!(f, "{}", i),
        }
    }
}

/// A parameter slot in a compiled pattern.
#[derive(Debug, Clone)]
pub struct ParamKey {
    pub name: KeyName,
    pub prefix: String,
    pub delimiter: char,
    pub optional: bool,
    pub repeat: bool,
    pub partial: bool,
    pub asterisk: bool,
    pub pattern: String,
}

#[derive(Debug, Clone)]
enum Token {
    Literal(String),
    Param(ParamKey),
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    tokens: Vec<Token>,
    keys: Vec<ParamKey>,
    regex: Regex,
    /// Per-key validators used when filling, in token order.
    segment_checks: Vec<Regex>,
}

impl PathPattern {
    /// Compile a path template.
    pub fn compile(path: &str, options: PatternOptions) -> Result<Self, PatternError> {
        let tokens = parse(path);
        let mut keys = Vec::new();
        let mut segment_checks = Vec::new();
        let mut route = String::new();

        for token in &tokens {
            match token {
                Token::Literal(text) => route.push_str(&regex::escape(text)),
                Token::Param(key) => {
                    let prefix = regex::escape(&key.prefix);
                    let mut capture = format!("(?:{})", key.pattern);
                    if key.repeat {
                        capture = format!("{capture}(?:{prefix}{capture})*");
                    }
                    let capture = if key.optional {
                        if key.partial {
                            format!("{prefix}({capture})?")
                        } else {
                            format!("(?:{prefix}({capture}))?")
                        }
                    } else {
                        format!("{prefix}({capture})")
                    };
                    route.push_str(&capture);

                    let check = Regex::new(&format!("^(?:{})$", key.pattern)).map_err(|e| {
                        PatternError::Invalid {
                            path: path.to_string(),
                            reason: e.to_string(),
                        }
                    })?;
                    segment_checks.push(check);
                    keys.push(key.clone());
                }
            }
        }

        let ends_with_delimiter = route.ends_with('/');
        if !options.strict {
            if ends_with_delimiter {
                route.pop();
            }
            if options.end {
                route.push_str("/?");
            }
        }
        if options.end {
            route.push('$');
        } else if !(options.strict && ends_with_delimiter) {
            route.push_str("(?:/|$)");
        }

        let flags = if options.sensitive { "" } else { "(?i)" };
        let regex = Regex::new(&format!("{flags}^{route}")).map_err(|e| PatternError::Invalid {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            source: path.to_string(),
            tokens,
            keys,
            regex,
            segment_checks,
        })
    }

    /// The template this pattern was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn keys(&self) -> &[ParamKey] {
        &self.keys
    }

    /// Names of the non-optional named parameters.
    pub fn required_names(&self) -> Vec<String> {
        self.keys
            .iter()
            .filter(|k| !k.optional)
            .filter_map(|k| match &k.name {
                KeyName::Named(name) => Some(name.clone()),
                KeyName::Index(_) => None,
            })
            .collect()
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Match `path` and collect percent-decoded captures into `params`.
    ///
    /// Unmatched optional groups leave their key absent.
    pub fn match_into(&self, path: &str, params: &mut Params) -> bool {
        let Some(caps) = self.regex.captures(path) else {
            return false;
        };
        for (i, key) in self.keys.iter().enumerate() {
            if let Some(value) = caps.get(i + 1) {
                params.insert(key.name.param_key(), decode_component(value.as_str()));
            }
        }
        true
    }

    /// Fill the template from `params`.
    pub fn fill(&self, params: &Params) -> Result<String, PatternError> {
        let mut out = String::new();
        let mut key_index = 0;
        for token in &self.tokens {
            let key = match token {
                Token::Literal(text) => {
                    out.push_str(text);
                    continue;
                }
                Token::Param(key) => key,
            };
            let check = &self.segment_checks[key_index];
            key_index += 1;

            let Some(value) = params.get(&key.name.param_key()) else {
                if key.optional {
                    if key.partial {
                        out.push_str(&key.prefix);
                    }
                    continue;
                }
                return Err(PatternError::MissingParam {
                    path: self.source.clone(),
                    name: key.name.to_string(),
                });
            };

            let encoding = if key.asterisk { ASTERISK_SEGMENT } else { PRETTY_SEGMENT };
            let segment = utf8_percent_encode(value, encoding).to_string();
            if !check.is_match(&segment) {
                return Err(PatternError::ParamMismatch {
                    path: self.source.clone(),
                    name: key.name.to_string(),
                    pattern: key.pattern.clone(),
                    value: segment,
                });
            }
            out.push_str(&key.prefix);
            out.push_str(&segment);
        }
        Ok(out)
    }
}

/// Percent-decode a captured segment, keeping the raw text when it is not valid UTF-8.
pub fn decode_component(raw: &str) -> String {
    percent_encoding::percent_decode_str(raw)
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

static NAME_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+").expect("static regex"));

struct Scanned {
    len: usize,
    prefix: Option<char>,
    name: Option<String>,
    capture: Option<String>,
    modifier: Option<char>,
    asterisk: bool,
}

fn parse(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut next_index = 0;
    let mut i = 0;

    while i < source.len() {
        let rest = &source[i..];
        let mut chars = rest.chars();
        let Some(c) = chars.next() else { break };

        if c == '\\' {
            if let Some(escaped) = chars.next() {
                literal.push(escaped);
                i += c.len_utf8() + escaped.len_utf8();
                continue;
            }
        }

        let Some(scanned) = scan_param(rest) else {
            literal.push(c);
            i += c.len_utf8();
            continue;
        };

        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }

        let following = source[i + scanned.len..].chars().next();
        let partial = match (scanned.prefix, following) {
            (Some(p), Some(n)) => n != p,
            _ => false,
        };
        let delimiter = scanned.prefix.unwrap_or('/');
        let pattern = match &scanned.capture {
            Some(group) => escape_group(group),
            None if scanned.asterisk => ".*".to_string(),
            None => format!("[^{}]+?", regex::escape(&delimiter.to_string())),
        };
        let name = match scanned.name {
            Some(name) => KeyName::Named(name),
            None => {
                next_index += 1;
                KeyName::Index(next_index - 1)
            }
        };

        tokens.push(Token::Param(ParamKey {
            name,
            prefix: scanned.prefix.map(String::from).unwrap_or_default(),
            delimiter,
            optional: matches!(scanned.modifier, Some('?') | Some('*')),
            repeat: matches!(scanned.modifier, Some('+') | Some('*')),
            partial,
            asterisk: scanned.asterisk,
            pattern,
        }));
        i += scanned.len;
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    tokens
}

/// Recognise `[/.]?(:name(group)?|(group))[+*?]?` or `[/.]?*` at the start of `input`.
fn scan_param(input: &str) -> Option<Scanned> {
    let mut offset = 0;
    let mut prefix = None;
    if let Some(c @ ('/' | '.')) = input.chars().next() {
        prefix = Some(c);
        offset = 1;
    }
    let body = &input[offset..];

    let (name, capture, consumed) = if let Some(after_colon) = body.strip_prefix(':') {
        let name = NAME_CHARS.find(after_colon)?.as_str().to_string();
        let after_name = &after_colon[name.len()..];
        match scan_group(after_name) {
            Some((group, len)) => (Some(name.clone()), Some(group), 1 + name.len() + len),
            None => (Some(name.clone()), None, 1 + name.len()),
        }
    } else if body.starts_with('(') {
        let (group, len) = scan_group(body)?;
        (None, Some(group), len)
    } else if body.starts_with('*') {
        return Some(Scanned {
            len: offset + 1,
            prefix,
            name: None,
            capture: None,
            modifier: None,
            asterisk: true,
        });
    } else {
        return None;
    };

    let mut len = offset + consumed;
    let modifier = match input[len..].chars().next() {
        Some(m @ ('+' | '*' | '?')) => {
            len += 1;
            Some(m)
        }
        _ => None,
    };

    Some(Scanned {
        len,
        prefix,
        name,
        capture,
        modifier,
        asterisk: false,
    })
}

/// Scan `(…)` where the body is escaped characters or anything but `\`, `(`, `)`.
fn scan_group(input: &str) -> Option<(String, usize)> {
    let body = input.strip_prefix('(')?;
    let mut group = String::new();
    let mut chars = body.char_indices();
    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => {
                let (_, escaped) = chars.next()?;
                group.push('\\');
                group.push(escaped);
            }
            ')' if !group.is_empty() => return Some((group, idx + 2)),
            '(' | ')' => return None,
            other => group.push(other),
        }
    }
    None
}

fn escape_group(group: &str) -> String {
    let mut out = String::with_capacity(group.len());
    for c in group.chars() {
        if matches!(c, '$' | '(' | ')') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
