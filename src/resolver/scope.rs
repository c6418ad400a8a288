//! Qualified-name and short-name indexes, and type-reference lookup.
//!
//! Lookup follows C++ unqualified name lookup closely enough for diagrams:
//! the reference is tried in the scope it appears in, then in each enclosing
//! scope outward, and the first scope with a match wins.

use crate::ids::DeclId;
use crate::resolver::name::{EntityKind, QualifiedName};
use crate::resolver::types::strip_template_args;
use rustc_hash::FxHashMap;
use tracing::debug;

/// Outcome of a type-reference lookup. Lookup never fails: anything not
/// found is external or opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Resolved(DeclId),
    Unresolved,
    /// Several equally good candidates; the reference stays unresolved
    Ambiguous(Vec<QualifiedName>),
}

#[derive(Debug, Clone)]
struct IndexEntry {
    name: QualifiedName,
    kind: EntityKind,
}

/// Read-only index built once all declarations are known
#[derive(Debug, Default)]
pub struct ScopeIndex {
    entries: FxHashMap<DeclId, IndexEntry>,
    by_name: FxHashMap<QualifiedName, DeclId>,
    by_visible: FxHashMap<Vec<String>, Vec<DeclId>>,
    by_local: FxHashMap<String, Vec<DeclId>>,
}

impl ScopeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declaration under its qualified name and every path that
    /// can spell it
    pub(crate) fn insert(
        &mut self,
        id: DeclId,
        name: QualifiedName,
        kind: EntityKind,
        visible_paths: Vec<Vec<String>>,
    ) {
        self.by_name.entry(name.clone()).or_insert(id);
        if let Some(local) = name.local_name() {
            self.by_local.entry(local.to_string()).or_default().push(id);
        }
        for path in visible_paths {
            let ids = self.by_visible.entry(path).or_default();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        self.entries.insert(id, IndexEntry { name, kind });
    }

    /// Declaration with exactly this qualified name
    pub fn get(&self, name: &QualifiedName) -> Option<DeclId> {
        self.by_name.get(name).copied()
    }

    /// Every declaration whose last segment is `local`, in declaration order
    pub fn named(&self, local: &str) -> &[DeclId] {
        self.by_local.get(local).map_or(&[], Vec::as_slice)
    }

    /// Resolve a type reference as written inside `from_scope`
    pub fn lookup(&self, reference: &str, from_scope: &QualifiedName) -> Lookup {
        let stripped = strip_template_args(reference);
        let global = stripped.starts_with("::");
        let path: Vec<String> = stripped
            .split("::")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        if path.is_empty() {
            return Lookup::Unresolved;
        }

        let scope = from_scope.visible_path();
        let innermost = if global { 0 } else { scope.len() };

        for depth in (0..=innermost).rev() {
            let mut key = scope[..depth].to_vec();
            key.extend(path.iter().cloned());

            let candidates: Vec<DeclId> = self
                .by_visible
                .get(&key)
                .map(|ids| {
                    ids.iter()
                        .copied()
                        .filter(|id| self.kind(*id) != Some(EntityKind::Namespace))
                        .collect()
                })
                .unwrap_or_default();

            if !candidates.is_empty() {
                let result = self.pick(candidates);
                debug!(reference, scope = %from_scope, ?result, "lookup");
                return result;
            }
        }

        Lookup::Unresolved
    }

    fn kind(&self, id: DeclId) -> Option<EntityKind> {
        self.entries.get(&id).map(|e| e.kind)
    }

    /// Class/struct beats enum/union; anything still tied is ambiguous
    fn pick(&self, candidates: Vec<DeclId>) -> Lookup {
        if let [only] = candidates.as_slice() {
            return Lookup::Resolved(*only);
        }

        let preferred: Vec<DeclId> = candidates
            .iter()
            .copied()
            .filter(|id| matches!(self.kind(*id), Some(EntityKind::Class | EntityKind::Struct)))
            .collect();
        if let [only] = preferred.as_slice() {
            return Lookup::Resolved(*only);
        }

        let pool = if preferred.is_empty() { candidates } else { preferred };
        let mut names: Vec<QualifiedName> = pool
            .iter()
            .filter_map(|id| self.entries.get(id).map(|e| e.name.clone()))
            .collect();
        names.sort();
        Lookup::Ambiguous(names)
    }
}
