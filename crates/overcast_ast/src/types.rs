//! The Overcast type representation.
//!
//! Types are nominal: a built-in or struct is identified by its name, and a
//! pointer wraps another type. Derived `PartialEq` is plain structural
//! equality; the language-level relation is [`OcType::equals`].

use std::collections::HashMap;
use std::fmt;

use crate::Parameter;

/// Names of the built-in identifier types.
pub const BUILTIN_TYPE_NAMES: [&str; 6] = ["void", "int", "int64", "string", "float", "bool"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OcType {
    /// A built-in (`int`, `string`, ...) or a struct name.
    Identifier(String),
    /// Pointer to the inner type.
    Pointer(Box<OcType>),
}

impl OcType {
    /// Sentinel name that compares equal to every type.
    pub const ANY: &'static str = "any";

    pub fn identifier(name: impl Into<String>) -> Self {
        OcType::Identifier(name.into())
    }

    pub fn pointer(inner: OcType) -> Self {
        OcType::Pointer(Box::new(inner))
    }

    pub fn void() -> Self {
        Self::identifier("void")
    }

    pub fn int() -> Self {
        Self::identifier("int")
    }

    pub fn int64() -> Self {
        Self::identifier("int64")
    }

    pub fn string() -> Self {
        Self::identifier("string")
    }

    pub fn float() -> Self {
        Self::identifier("float")
    }

    pub fn bool() -> Self {
        Self::identifier("bool")
    }

    pub fn any() -> Self {
        Self::identifier(Self::ANY)
    }

    /// Language-level type equality.
    ///
    /// Not symmetric: an `any` receiver accepts every argument, while
    /// `x.equals(any)` only holds when `x` is itself `any`. Always call it as
    /// `declared.equals(actual)`. Pointers compare by their rendered form.
    pub fn equals(&self, other: &OcType) -> bool {
        match (self, other) {
            (OcType::Identifier(name), _) if name == Self::ANY => true,
            (OcType::Identifier(a), OcType::Identifier(b)) => a == b,
            (OcType::Pointer(_), OcType::Pointer(_)) => self.to_string() == other.to_string(),
            _ => false,
        }
    }

    /// The innermost identifier beneath any pointer layers.
    pub fn base_type(&self) -> &OcType {
        match self {
            OcType::Identifier(_) => self,
            OcType::Pointer(inner) => inner.base_type(),
        }
    }

    /// Name of [`OcType::base_type`].
    pub fn base_name(&self) -> &str {
        match self.base_type() {
            OcType::Identifier(name) => name,
            OcType::Pointer(_) => unreachable!("base_type never returns a pointer"),
        }
    }

    /// Number of pointer layers (`int**` has depth 2).
    pub fn pointer_depth(&self) -> usize {
        match self {
            OcType::Identifier(_) => 0,
            OcType::Pointer(inner) => 1 + inner.pointer_depth(),
        }
    }

    /// The pointee of a pointer type.
    pub fn pointee(&self) -> Option<&OcType> {
        match self {
            OcType::Pointer(inner) => Some(inner),
            OcType::Identifier(_) => None,
        }
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, OcType::Identifier(name) if BUILTIN_TYPE_NAMES.contains(&name.as_str()))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, OcType::Identifier(name) if name == "void")
    }

    /// `int` or `int64`.
    pub fn is_integer(&self) -> bool {
        matches!(self, OcType::Identifier(name) if name == "int" || name == "int64")
    }

    /// The struct name when this is a non-pointer, non-built-in identifier.
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            OcType::Identifier(name) if !self.is_builtin() && name != Self::ANY => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for OcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OcType::Identifier(name) => f.write_str(name),
            OcType::Pointer(inner) => write!(f, "{inner}*"),
        }
    }
}

/// Member order and the name to positional index table of a struct.
///
/// Built once per declaration; the binder uses it for member types and the
/// code generator for aggregate addressing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructLayout {
    members: Vec<Parameter>,
    indices: HashMap<String, usize>,
}

impl StructLayout {
    /// Later duplicates of a member name do not override the first index.
    pub fn from_members(members: &[Parameter]) -> Self {
        let mut indices = HashMap::with_capacity(members.len());
        for (index, member) in members.iter().enumerate() {
            indices.entry(member.name.clone()).or_insert(index);
        }
        Self {
            members: members.to_vec(),
            indices,
        }
    }

    pub fn index_of(&self, member: &str) -> Option<usize> {
        self.indices.get(member).copied()
    }

    pub fn member(&self, name: &str) -> Option<&Parameter> {
        self.index_of(name).map(|index| &self.members[index])
    }

    pub fn members(&self) -> &[Parameter] {
        &self.members
    }

    pub fn indices(&self) -> &HashMap<String, usize> {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn has_duplicates(&self) -> bool {
        self.indices.len() != self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_equality_is_by_name() {
        for a in BUILTIN_TYPE_NAMES {
            for b in BUILTIN_TYPE_NAMES {
                assert_eq!(
                    OcType::identifier(a).equals(&OcType::identifier(b)),
                    a == b,
                    "{a} vs {b}"
                );
            }
        }
    }

    #[test]
    fn any_accepts_everything_but_not_the_reverse() {
        let any = OcType::any();
        let int_ptr = OcType::pointer(OcType::int());
        assert!(any.equals(&OcType::int()));
        assert!(any.equals(&int_ptr));
        assert!(any.equals(&OcType::identifier("Point")));
        assert!(!OcType::int().equals(&any));
        assert!(!int_ptr.equals(&any));
        assert!(any.equals(&any));
    }

    #[test]
    fn pointer_equality_uses_rendered_form() {
        let a = OcType::pointer(OcType::pointer(OcType::int()));
        let b = OcType::pointer(OcType::pointer(OcType::int()));
        assert!(a.equals(&b));
        assert!(!a.equals(&OcType::pointer(OcType::int())));
        assert!(!a.equals(&OcType::int()));
        assert_eq!(a.to_string(), "int**");
    }

    #[test]
    fn base_type_and_depth() {
        let ty = OcType::pointer(OcType::pointer(OcType::identifier("Point")));
        assert_eq!(ty.base_type(), &OcType::identifier("Point"));
        assert_eq!(ty.base_name(), "Point");
        assert_eq!(ty.pointer_depth(), 2);
        assert_eq!(ty.pointee(), Some(&OcType::pointer(OcType::identifier("Point"))));
        assert_eq!(OcType::identifier("Point").struct_name(), Some("Point"));
        assert_eq!(OcType::int().struct_name(), None);
    }

    #[test]
    fn layout_indices_follow_declaration_order() {
        let layout = StructLayout::from_members(&[
            Parameter::new("x", OcType::int()),
            Parameter::new("y", OcType::int()),
            Parameter::new("name", OcType::string()),
        ]);
        assert_eq!(layout.len(), 3);
        assert_eq!(layout.index_of("x"), Some(0));
        assert_eq!(layout.index_of("y"), Some(1));
        assert_eq!(layout.index_of("name"), Some(2));
        assert_eq!(layout.index_of("z"), None);
        assert!(!layout.has_duplicates());
    }
}
