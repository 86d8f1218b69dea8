//! Path templates with typed placeholders, e.g. `/products/{id:int}`.
//!
//! An `int` placeholder only accepts a run of ASCII digits that fits an `i64`,
//! so `/products/abc` and `/products/-1` are non-matches rather than
//! parameter parse failures. Values are checked after percent-decoding.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("Path template must start with '/': {0}")]
    MissingLeadingSlash(String),

    #[error("Malformed placeholder '{segment}' in {template}")]
    MalformedPlaceholder { template: String, segment: String },

    #[error("Unknown placeholder type '{kind}' in {template}")]
    UnknownKind { template: String, kind: String },

    #[error("Duplicate placeholder '{name}' in {template}")]
    DuplicateName { template: String, name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param { name: String, kind: ParamKind },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(template: &str) -> Result<Self, RouteError> {
        let rest = template
            .strip_prefix('/')
            .ok_or_else(|| RouteError::MissingLeadingSlash(template.to_string()))?;

        let mut segments = Vec::new();
        if !rest.is_empty() {
            for part in rest.split('/') {
                segments.push(parse_segment(template, part)?);
            }
        }

        let mut seen = Vec::new();
        for segment in &segments {
            if let Segment::Param { name, .. } = segment {
                if seen.contains(&name) {
                    return Err(RouteError::DuplicateName {
                        template: template.to_string(),
                        name: name.clone(),
                    });
                }
                seen.push(name);
            }
        }

        Ok(Self {
            raw: template.to_string(),
            segments,
        })
    }

    /// Equivalent path in axum's router syntax (`/products/:id`)
    pub fn axum_path(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => format!("/{}", text),
                Segment::Param { name, .. } => format!("/:{}", name),
            })
            .collect()
    }

    /// Whether decoded `(name, value)` pairs satisfy their placeholder kinds
    pub fn accepts<'a, I>(&self, params: I) -> bool
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        params.into_iter().all(|(name, value)| match self.kind_of(name) {
            Some(ParamKind::Int) => is_int_segment(value),
            Some(ParamKind::Str) => !value.is_empty(),
            None => true,
        })
    }

    fn kind_of(&self, param: &str) -> Option<ParamKind> {
        self.segments.iter().find_map(|segment| match segment {
            Segment::Param { name, kind } if name == param => Some(*kind),
            _ => None,
        })
    }

    pub fn has_typed_params(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Param { kind: ParamKind::Int, .. }))
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_segment(template: &str, part: &str) -> Result<Segment, RouteError> {
    let malformed = || RouteError::MalformedPlaceholder {
        template: template.to_string(),
        segment: part.to_string(),
    };

    let Some(inner) = part.strip_prefix('{') else {
        if part.contains(['{', '}', ':']) {
            return Err(malformed());
        }
        return Ok(Segment::Literal(part.to_string()));
    };
    let inner = inner.strip_suffix('}').ok_or_else(malformed)?;

    let (name, kind) = match inner.split_once(':') {
        Some((name, "int")) => (name, ParamKind::Int),
        Some((name, "str")) => (name, ParamKind::Str),
        Some((_, kind)) => {
            return Err(RouteError::UnknownKind {
                template: template.to_string(),
                kind: kind.to_string(),
            })
        }
        None => (inner, ParamKind::Str),
    };

    let valid_name = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid_name {
        return Err(malformed());
    }

    Ok(Segment::Param {
        name: name.to_string(),
        kind,
    })
}

fn is_int_segment(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) && part.parse::<i64>().is_ok()
}
