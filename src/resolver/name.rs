//! Qualified names and entity kinds.

use std::fmt;

/// Kind of a declared entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Namespace,
    Class,
    Struct,
    Union,
    Enum,
}

impl EntityKind {
    pub fn keyword(self) -> &'static str {
        match self {
            EntityKind::Namespace => "namespace",
            EntityKind::Class => "class",
            EntityKind::Struct => "struct",
            EntityKind::Union => "union",
            EntityKind::Enum => "enum",
        }
    }

    pub fn is_record(self) -> bool {
        matches!(self, EntityKind::Class | EntityKind::Struct | EntityKind::Union)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One step of a scope path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Named(String),
    /// Synthesized identity of an anonymous namespace, record or enum. The
    /// ordinal is unique across the whole model.
    Anonymous { kind: AnonymousKind, ordinal: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnonymousKind {
    Namespace,
    Class,
    Struct,
    Union,
    Enum,
}

impl From<EntityKind> for AnonymousKind {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Namespace => AnonymousKind::Namespace,
            EntityKind::Class => AnonymousKind::Class,
            EntityKind::Struct => AnonymousKind::Struct,
            EntityKind::Union => AnonymousKind::Union,
            EntityKind::Enum => AnonymousKind::Enum,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Named(name) => f.write_str(name),
            Segment::Anonymous { kind, ordinal } => {
                let kind = match kind {
                    AnonymousKind::Namespace => "namespace",
                    AnonymousKind::Class => "class",
                    AnonymousKind::Struct => "struct",
                    AnonymousKind::Union => "union",
                    AnonymousKind::Enum => "enum",
                };
                write!(f, "(anonymous {} {})", kind, ordinal)
            }
        }
    }
}

/// Full scope-path identity of a declaration. The empty path is the global
/// scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct QualifiedName {
    segments: Vec<Segment>,
}

impl QualifiedName {
    pub fn global() -> Self {
        Self::default()
    }

    /// Parse `a::b::C`; every segment is named
    pub fn parse(text: &str) -> Self {
        let segments = text
            .split("::")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Segment::Named(s.to_string()))
            .collect();
        Self { segments }
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_global(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// Enclosing scope; `None` for the global scope itself
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Last segment if it is named
    pub fn local_name(&self) -> Option<&str> {
        match self.segments.last() {
            Some(Segment::Named(name)) => Some(name),
            _ => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Anonymous { .. }))
    }

    /// The path as seen by name lookup: anonymous segments removed
    pub fn visible_path(&self) -> Vec<String> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Named(name) => Some(name.clone()),
                Segment::Anonymous { .. } => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("::")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}
