//! RFC 6570 URI templates filled from row data.
//!
//! Templates are compiled once, when a schema is loaded, and expanded for
//! every cell. Compilation is the only fallible step: expansion is total and
//! silently drops undefined variables.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasher;

use indexmap::IndexMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::error::{Result, TemplateError, TemplateErrorKind};

/// Characters kept as-is by simple expansion (RFC 3986 unreserved).
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Characters kept as-is by reserved (`+`) and fragment (`#`) expansion.
const RESERVED: &AsciiSet = &UNRESERVED
    .remove(b':')
    .remove(b'/')
    .remove(b'?')
    .remove(b'#')
    .remove(b'[')
    .remove(b']')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=');

const MAX_PREFIX: usize = 9999;

/// A source of variable values for template expansion.
pub trait TemplateVars {
    /// Returns the value bound to `name`, or `None` when it is undefined.
    fn var(&self, name: &str) -> Option<&str>;
}

impl<S: BuildHasher> TemplateVars for IndexMap<String, String, S> {
    fn var(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl<S: BuildHasher> TemplateVars for HashMap<String, String, S> {
    fn var(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl TemplateVars for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// A compiled URI template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    source: String,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Expression {
    operator: Operator,
    variables: Vec<VarSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct VarSpec {
    name: String,
    modifier: Modifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    None,
    Prefix(usize),
    Explode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Simple,
    Reserved,
    Fragment,
    Label,
    PathSegment,
    PathParameter,
    Query,
    QueryContinuation,
}

impl Operator {
    fn from_char(ch: char) -> Option<Self> {
        match ch {
            '+' => Some(Self::Reserved),
            '#' => Some(Self::Fragment),
            '.' => Some(Self::Label),
            '/' => Some(Self::PathSegment),
            ';' => Some(Self::PathParameter),
            '?' => Some(Self::Query),
            '&' => Some(Self::QueryContinuation),
            _ => None,
        }
    }

    fn first(self) -> &'static str {
        match self {
            Self::Simple | Self::Reserved => "",
            Self::Fragment => "#",
            Self::Label => ".",
            Self::PathSegment => "/",
            Self::PathParameter => ";",
            Self::Query => "?",
            Self::QueryContinuation => "&",
        }
    }

    fn separator(self) -> &'static str {
        match self {
            Self::Simple | Self::Reserved | Self::Fragment => ",",
            Self::Label => ".",
            Self::PathSegment => "/",
            Self::PathParameter => ";",
            Self::Query | Self::QueryContinuation => "&",
        }
    }

    fn named(self) -> bool {
        matches!(
            self,
            Self::PathParameter | Self::Query | Self::QueryContinuation
        )
    }

    fn if_empty(self) -> &'static str {
        match self {
            Self::Query | Self::QueryContinuation => "=",
            _ => "",
        }
    }

    fn allows_reserved(self) -> bool {
        matches!(self, Self::Reserved | Self::Fragment)
    }
}

impl UriTemplate {
    /// Compiles a template string.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] for unbalanced braces, empty or invalid
    /// variable names, reserved operators and out-of-range prefix modifiers.
    pub fn parse(template: &str) -> Result<Self> {
        let mut parts = Vec::new();
        let mut cursor = 0;
        while cursor < template.len() {
            let rest = &template[cursor..];
            let Some(found) = rest.find(['{', '}']) else {
                parts.push(Part::Literal(rest.to_string()));
                break;
            };
            if found > 0 {
                parts.push(Part::Literal(rest[..found].to_string()));
            }
            let open = cursor + found;
            if template[open..].starts_with('}') {
                return Err(error(
                    template,
                    open,
                    TemplateErrorKind::UnexpectedClosingBrace,
                ));
            }
            let body_start = open + 1;
            let close = template[body_start..]
                .find(['{', '}'])
                .filter(|idx| template[body_start + idx..].starts_with('}'))
                .ok_or_else(|| error(template, open, TemplateErrorKind::UnclosedExpression))?;
            let body = &template[body_start..body_start + close];
            parts.push(Part::Expression(Expression::parse(
                template, body_start, body,
            )?));
            cursor = body_start + close + 1;
        }
        Ok(Self {
            source: template.to_string(),
            parts,
        })
    }

    /// The template text as written in the schema.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Expands the template against `vars`.
    pub fn expand<V: TemplateVars + ?Sized>(&self, vars: &V) -> String {
        let mut out = String::with_capacity(self.source.len());
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Expression(expression) => expression.expand_into(vars, &mut out),
            }
        }
        out
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Expression {
    fn parse(template: &str, offset: usize, body: &str) -> Result<Self> {
        let Some(lead) = body.chars().next() else {
            return Err(error(template, offset, TemplateErrorKind::EmptyVariable));
        };
        let (operator, list) = match Operator::from_char(lead) {
            Some(operator) => (operator, &body[lead.len_utf8()..]),
            None if matches!(lead, '=' | ',' | '!' | '@' | '|') => {
                return Err(error(
                    template,
                    offset,
                    TemplateErrorKind::ReservedOperator(lead),
                ));
            }
            None => (Operator::Simple, body),
        };
        let variables = list
            .split(',')
            .map(|spec| VarSpec::parse(template, offset, spec))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            operator,
            variables,
        })
    }

    fn expand_into<V: TemplateVars + ?Sized>(&self, vars: &V, out: &mut String) {
        let mut first = true;
        for spec in &self.variables {
            let Some(value) = lookup(vars, &spec.name) else {
                continue;
            };
            out.push_str(if first {
                self.operator.first()
            } else {
                self.operator.separator()
            });
            first = false;
            let value = match spec.modifier {
                Modifier::Prefix(len) => truncate_chars(value, len),
                Modifier::None | Modifier::Explode => value,
            };
            if self.operator.named() {
                out.push_str(&spec.name);
                if value.is_empty() {
                    out.push_str(self.operator.if_empty());
                    continue;
                }
                out.push('=');
            }
            if self.operator.allows_reserved() {
                encode_reserved(value, out);
            } else {
                out.extend(utf8_percent_encode(value, UNRESERVED));
            }
        }
    }
}

impl VarSpec {
    fn parse(template: &str, offset: usize, spec: &str) -> Result<Self> {
        let (name, modifier) = if let Some(name) = spec.strip_suffix('*') {
            (name, Modifier::Explode)
        } else if let Some((name, len)) = spec.split_once(':') {
            let len = len
                .parse::<usize>()
                .ok()
                .filter(|len| (1..=MAX_PREFIX).contains(len))
                .ok_or_else(|| {
                    error(
                        template,
                        offset,
                        TemplateErrorKind::InvalidPrefix(len.to_string()),
                    )
                })?;
            (name, Modifier::Prefix(len))
        } else {
            (spec, Modifier::None)
        };
        if name.is_empty() {
            return Err(error(template, offset, TemplateErrorKind::EmptyVariable));
        }
        if !is_valid_name(name) {
            return Err(error(
                template,
                offset,
                TemplateErrorKind::InvalidVariableName(name.to_string()),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            modifier,
        })
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.starts_with('.')
        && !name.ends_with('.')
        && name
            .chars()
            .all(|ch| ch.is_alphanumeric() || matches!(ch, '_' | '.' | '%' | '-'))
}

/// Looks a variable up verbatim, then by its percent-decoded spelling.
fn lookup<'a, V: TemplateVars + ?Sized>(vars: &'a V, name: &str) -> Option<&'a str> {
    if let Some(value) = vars.var(name) {
        return Some(value);
    }
    if !name.contains('%') {
        return None;
    }
    let decoded = percent_decode_str(name).decode_utf8().ok()?;
    vars.var(&decoded)
}

fn truncate_chars(value: &str, len: usize) -> &str {
    match value.char_indices().nth(len) {
        Some((end, _)) => &value[..end],
        None => value,
    }
}

/// Encodes `value` for `+` and `#` expansion, keeping existing
/// percent-encoded triplets intact.
fn encode_reserved(value: &str, out: &mut String) {
    let bytes = value.as_bytes();
    let mut start = 0;
    let mut idx = 0;
    while idx < bytes.len() {
        let is_triplet = bytes[idx] == b'%'
            && idx + 2 < bytes.len()
            && bytes[idx + 1].is_ascii_hexdigit()
            && bytes[idx + 2].is_ascii_hexdigit();
        if is_triplet {
            out.extend(utf8_percent_encode(&value[start..idx], RESERVED));
            out.push_str(&value[idx..idx + 3]);
            idx += 3;
            start = idx;
        } else {
            idx += 1;
        }
    }
    out.extend(utf8_percent_encode(&value[start..], RESERVED));
}

fn error(template: &str, position: usize, kind: TemplateErrorKind) -> TemplateError {
    TemplateError {
        template: template.to_string(),
        position,
        kind,
    }
}
