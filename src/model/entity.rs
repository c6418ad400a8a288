// Entities, members and relationships of the finished model

use crate::ids::EntityId;
use crate::parser::ast::{Access, MemberFlags, MemberKind, Param, RawMember, SourceLocation};
use crate::resolver::{EntityKind, QualifiedName};

/// A field or method of a record
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: String,
    /// Declared type, or return type for methods; empty for constructors
    /// and destructors
    pub type_ref: String,
    pub access: Access,
    pub kind: MemberKind,
    pub flags: MemberFlags,
    pub template_params: Vec<String>,
    pub location: SourceLocation,
}

impl Member {
    pub fn is_method(&self) -> bool {
        matches!(self.kind, MemberKind::Method { .. })
    }

    pub fn params(&self) -> &[Param] {
        match &self.kind {
            MemberKind::Method { params } => params,
            MemberKind::Field => &[],
        }
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }

    pub fn is_virtual(&self) -> bool {
        self.flags.contains(MemberFlags::VIRTUAL)
    }

    pub fn is_pure_virtual(&self) -> bool {
        self.flags.contains(MemberFlags::PURE_VIRTUAL)
    }

    pub fn is_const(&self) -> bool {
        self.flags.contains(MemberFlags::CONST)
    }

    pub fn is_deleted(&self) -> bool {
        self.flags.contains(MemberFlags::DELETED)
    }
}

impl From<&RawMember> for Member {
    fn from(raw: &RawMember) -> Self {
        Self {
            name: raw.name.clone(),
            type_ref: raw.type_ref.clone(),
            access: raw.access,
            kind: raw.kind.clone(),
            flags: raw.flags,
            template_params: raw.template_params.clone(),
            location: raw.location,
        }
    }
}

/// A base-specifier of a record
#[derive(Debug, Clone, PartialEq)]
pub struct BaseRef {
    /// As written, e.g. `ns::Base<T>`
    pub text: String,
    pub access: Access,
    pub is_virtual: bool,
    /// `None` when the base is external, ambiguous or a template parameter
    pub target: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TemplateInfo {
    pub params: Vec<String>,
    /// Normalized header, e.g. `template <typename T, int N>`
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub name: QualifiedName,
    pub kind: EntityKind,
    pub members: Vec<Member>,
    pub bases: Vec<BaseRef>,
    pub children: Vec<EntityId>,
    pub parent: Option<EntityId>,
    pub is_abstract: bool,
    pub template: Option<TemplateInfo>,
    pub enum_values: Vec<String>,
    pub is_scoped_enum: bool,
    pub is_inline_namespace: bool,
    /// False when only a forward declaration was seen
    pub is_definition: bool,
    pub source: String,
    pub location: SourceLocation,
}

impl Entity {
    /// Last segment of the qualified name as displayed
    pub fn display_name(&self) -> String {
        self.name
            .last()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    pub fn is_record(&self) -> bool {
        self.kind.is_record()
    }

    pub fn methods(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.is_method())
    }

    pub fn fields(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| !m.is_method())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationshipKind {
    /// Edge runs from base to derived
    Inheritance { access: Access, is_virtual: bool },
    /// Owner to the entity named by a field type
    Composition { member: String, by_reference: bool },
    /// Outer to inner
    Nesting,
    /// Owner to the entity named by a method parameter type
    Dependency { method: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub from: EntityId,
    pub to: EntityId,
    pub kind: RelationshipKind,
}

impl Relationship {
    pub fn is_inheritance(&self) -> bool {
        matches!(self.kind, RelationshipKind::Inheritance { .. })
    }

    pub fn is_composition(&self) -> bool {
        matches!(self.kind, RelationshipKind::Composition { .. })
    }

    pub fn is_nesting(&self) -> bool {
        matches!(self.kind, RelationshipKind::Nesting)
    }

    pub fn is_dependency(&self) -> bool {
        matches!(self.kind, RelationshipKind::Dependency { .. })
    }
}
