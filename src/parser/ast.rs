// Raw declaration tree produced by the declaration parser

use bitflags::bitflags;
use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    /// Character offset from the start of the input
    pub offset: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Member and base-class access level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Public,
    Protected,
    Private,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Access::Public => "public",
            Access::Protected => "protected",
            Access::Private => "private",
        };
        f.write_str(s)
    }
}

/// The three record keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Class,
    Struct,
    Union,
}

impl RecordKind {
    /// Access applied to members (and bases) before any explicit specifier.
    pub fn default_access(self) -> Access {
        match self {
            RecordKind::Class => Access::Private,
            RecordKind::Struct | RecordKind::Union => Access::Public,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            RecordKind::Class => "class",
            RecordKind::Struct => "struct",
            RecordKind::Union => "union",
        }
    }
}

bitflags! {
    /// Qualifiers recorded on a member declaration
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemberFlags: u16 {
        const STATIC       = 1 << 0;
        const VIRTUAL      = 1 << 1;
        const PURE_VIRTUAL = 1 << 2;
        const OVERRIDE     = 1 << 3;
        const FINAL        = 1 << 4;
        const CONST        = 1 << 5;
        const DELETED      = 1 << 6;
        const DEFAULTED    = 1 << 7;
        const CONSTRUCTOR  = 1 << 8;
        const DESTRUCTOR   = 1 << 9;
    }
}

/// Fundamental type words. These never name an entity and are never
/// reported as unresolved.
pub fn is_builtin_type(word: &str) -> bool {
    matches!(
        word,
        "void"
            | "bool"
            | "char"
            | "wchar_t"
            | "char8_t"
            | "char16_t"
            | "char32_t"
            | "short"
            | "int"
            | "long"
            | "signed"
            | "unsigned"
            | "float"
            | "double"
            | "auto"
            | "size_t"
            | "ptrdiff_t"
            | "nullptr_t"
            | "int8_t"
            | "int16_t"
            | "int32_t"
            | "int64_t"
            | "uint8_t"
            | "uint16_t"
            | "uint32_t"
            | "uint64_t"
    )
}

/// Method parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub type_ref: String,
    pub name: Option<String>,
}

/// Field or method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Method { params: Vec<Param> },
}

/// A member as written in a class/struct/union body
#[derive(Debug, Clone, PartialEq)]
pub struct RawMember {
    pub name: String,
    /// Declared type (return type for methods), whitespace-normalized
    pub type_ref: String,
    pub access: Access,
    pub kind: MemberKind,
    pub flags: MemberFlags,
    /// Parameter names of a member template, empty otherwise
    pub template_params: Vec<String>,
    pub location: SourceLocation,
}

impl RawMember {
    pub fn is_method(&self) -> bool {
        matches!(self.kind, MemberKind::Method { .. })
    }

    pub fn params(&self) -> &[Param] {
        match &self.kind {
            MemberKind::Method { params } => params,
            MemberKind::Field => &[],
        }
    }
}

/// One entry of a base-specifier list, kept as raw text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseSpecifier {
    pub text: String,
    pub access: Access,
    pub is_virtual: bool,
    pub location: SourceLocation,
}

/// `template <...>` header: ordered parameter names plus the normalized text
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TemplateHeader {
    pub params: Vec<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
    /// `None` for an anonymous namespace
    pub name: Option<String>,
    pub is_inline: bool,
    pub body: Vec<RawDeclaration>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordDecl {
    pub kind: RecordKind,
    /// Name path; empty for anonymous records, several segments for
    /// out-of-line nested definitions (`class Outer::Inner { ... }`)
    pub name: Vec<String>,
    pub bases: Vec<BaseSpecifier>,
    pub members: Vec<RawMember>,
    pub nested: Vec<RawDeclaration>,
    /// False for forward declarations (`class X;`)
    pub is_definition: bool,
    pub location: SourceLocation,
}

impl RecordDecl {
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: Option<String>,
    /// `enum class` / `enum struct`
    pub is_scoped: bool,
    pub underlying: Option<String>,
    pub values: Vec<String>,
    pub is_definition: bool,
    pub location: SourceLocation,
}

/// A template header applied to a record declaration
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDecl {
    pub header: TemplateHeader,
    pub declaration: Box<RawDeclaration>,
    pub location: SourceLocation,
}

/// Unresolved syntactic declaration node
#[derive(Debug, Clone, PartialEq)]
pub enum RawDeclaration {
    Namespace(NamespaceDecl),
    Record(RecordDecl),
    Enum(EnumDecl),
    Template(TemplateDecl),
}

impl RawDeclaration {
    /// Get the source location of this declaration
    pub fn location(&self) -> SourceLocation {
        match self {
            RawDeclaration::Namespace(ns) => ns.location,
            RawDeclaration::Record(record) => record.location,
            RawDeclaration::Enum(e) => e.location,
            RawDeclaration::Template(t) => t.location,
        }
    }

    /// Local (last-segment) name, `None` for anonymous constructs
    pub fn local_name(&self) -> Option<&str> {
        match self {
            RawDeclaration::Namespace(ns) => ns.name.as_deref(),
            RawDeclaration::Record(record) => record.name.last().map(String::as_str),
            RawDeclaration::Enum(e) => e.name.as_deref(),
            RawDeclaration::Template(t) => t.declaration.local_name(),
        }
    }
}

/// All top-level declarations of one header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationUnit {
    pub declarations: Vec<RawDeclaration>,
}

impl TranslationUnit {
    pub fn new() -> Self {
        TranslationUnit::default()
    }
}
