//! Module: template
//! Responsibility: compiled key templates and their resolution against entity
//! snapshots.
//! Does not own: deciding whether a missing key skips a mutation (index engine).
//!
//! Pattern text: literal characters, `{}` for a direct placeholder, `{.}` for
//! a dereference placeholder. `{{` and `}}` escape literal braces.
//!
//! Resolution is pure: the same template, entity and arguments always produce
//! the same key, and nothing is read except the entity passed in.

mod parse;

#[cfg(test)]
mod tests;

use crate::{entity::Entity, error::InternalError, path::FieldPath};
use std::fmt::{self, Display};

///
/// Segment
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Segment {
    /// Copied verbatim.
    Literal(String),
    /// Substituted by the next positional argument as-is.
    Direct,
    /// The next positional argument names a field path; the entity's value at
    /// that path is substituted.
    Deref,
}

///
/// KeyTemplate
///
/// Compiled key pattern. Adjacent literals are coalesced at construction.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyTemplate {
    segments: Vec<Segment>,
}

impl KeyTemplate {
    /// Compile pattern text.
    pub fn parse(pattern: &str) -> Result<Self, InternalError> {
        parse::parse_segments(pattern).map(Self::new)
    }

    /// Build a template from segments.
    #[must_use]
    pub fn new(segments: impl IntoIterator<Item = Segment>) -> Self {
        let mut coalesced: Vec<Segment> = Vec::new();

        for segment in segments {
            if let Segment::Literal(text) = &segment {
                if text.is_empty() {
                    continue;
                }
                if let Some(Segment::Literal(prev)) = coalesced.last_mut() {
                    prev.push_str(text);
                    continue;
                }
            }
            coalesced.push(segment);
        }

        Self {
            segments: coalesced,
        }
    }

    /// A template consisting of one literal segment.
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Self::new([Segment::Literal(text.into())])
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of positional arguments this template consumes.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| !matches!(segment, Segment::Literal(_)))
            .count()
    }

    /// True when both templates have the same literals at the same positions,
    /// counting direct and dereference placeholders as equal. Such templates
    /// can name the same key.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Literal(_), _) | (_, Segment::Literal(_)) => false,
                    _ => true,
                })
    }

    /// Resolve against `entity`, consuming `args` positionally.
    ///
    /// Returns `None` when an argument is missing or a dereferenced path does
    /// not hold an indexable value.
    #[must_use]
    pub fn resolve(&self, entity: &Entity, args: &[TemplateArg]) -> Option<String> {
        let mut args = args.iter();
        let mut key = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => key.push_str(text),
                Segment::Direct => key.push_str(&args.next()?.expand(entity)?),
                Segment::Deref => key.push_str(&args.next()?.deref(entity)?),
            }
        }

        Some(key)
    }

    /// Substitute every placeholder, in order, with the given values.
    ///
    /// This is the entity-free form used by lookups, where the caller already
    /// holds the value a dereference placeholder would have produced.
    pub fn fill(&self, values: &[&str]) -> Result<String, InternalError> {
        if values.len() != self.arity() {
            return Err(InternalError::template_unsupported(format!(
                "template '{self}' takes {} values, got {}",
                self.arity(),
                values.len()
            )));
        }

        let mut values = values.iter();
        let mut key = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => key.push_str(text),
                Segment::Direct | Segment::Deref => {
                    if let Some(value) = values.next() {
                        key.push_str(value);
                    }
                }
            }
        }

        Ok(key)
    }
}

impl Display for KeyTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => {
                    for ch in text.chars() {
                        match ch {
                            '{' => f.write_str("{{")?,
                            '}' => f.write_str("}}")?,
                            ch => write!(f, "{ch}")?,
                        }
                    }
                }
                Segment::Direct => f.write_str("{}")?,
                Segment::Deref => f.write_str("{.}")?,
            }
        }

        Ok(())
    }
}

///
/// TemplateArg
///
/// Positional argument for a placeholder. A nested template is resolved
/// against the same entity before it is used.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TemplateArg {
    Text(String),
    Path(FieldPath),
    Template(Box<KeyExpr>),
}

impl TemplateArg {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    #[must_use]
    pub const fn path(path: FieldPath) -> Self {
        Self::Path(path)
    }

    #[must_use]
    pub fn template(expr: KeyExpr) -> Self {
        Self::Template(Box::new(expr))
    }

    // Text for a direct placeholder.
    fn expand(&self, entity: &Entity) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Path(path) => Some(path.as_str().to_string()),
            Self::Template(expr) => expr.resolve(entity),
        }
    }

    // Entity value for a dereference placeholder.
    fn deref(&self, entity: &Entity) -> Option<String> {
        match self {
            Self::Path(path) => entity.scalar(path),
            Self::Text(_) | Self::Template(_) => {
                let path = FieldPath::parse(self.expand(entity)?).ok()?;
                entity.scalar(&path)
            }
        }
    }
}

///
/// KeyExpr
///
/// A template bound to its positional arguments; resolvable from an entity
/// snapshot alone. Arity is checked at construction.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyExpr {
    template: KeyTemplate,
    args: Vec<TemplateArg>,
}

impl KeyExpr {
    pub fn new(template: KeyTemplate, args: Vec<TemplateArg>) -> Result<Self, InternalError> {
        if template.arity() != args.len() {
            return Err(InternalError::template_unsupported(format!(
                "template '{template}' takes {} arguments, got {}",
                template.arity(),
                args.len()
            )));
        }

        Ok(Self { template, args })
    }

    /// Compile `pattern` and bind `args` in one step.
    pub fn parse(pattern: &str, args: Vec<TemplateArg>) -> Result<Self, InternalError> {
        Self::new(KeyTemplate::parse(pattern)?, args)
    }

    /// An expression without placeholders.
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            template: KeyTemplate::literal(text),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub const fn template(&self) -> &KeyTemplate {
        &self.template
    }

    #[must_use]
    pub fn args(&self) -> &[TemplateArg] {
        &self.args
    }

    #[must_use]
    pub fn resolve(&self, entity: &Entity) -> Option<String> {
        self.template.resolve(entity, &self.args)
    }

    pub fn fill(&self, values: &[&str]) -> Result<String, InternalError> {
        self.template.fill(values)
    }
}

impl Display for KeyExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.template)
    }
}
