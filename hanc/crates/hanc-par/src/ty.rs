//! The type model.
//!
//! One representation serves both declared types (written by the parser)
//! and synthesized types (computed by the type checker): a tagged variant
//! over primitives and the parametric compositions pointer, array,
//! function, struct and enum. Struct and enum types carry their member
//! tables so member access can be checked wherever the type value flows.
//!
//! Two relations govern the checker:
//!
//! - **Structural equality** ([`Type::same_type`], also `PartialEq`): tags
//!   match and every composed type/length matches. Struct and enum types
//!   are equal iff they refer to the same declared type name.
//! - **Compatibility** ([`Type::compatible_with`]): equality plus
//!   `array(T, N) ↔ array(T, 0)` (unknown length), `int ↔ enum`, and
//!   `pointer(void) ↔ pointer(T)` — the latter covers both the `空`
//!   literal and the `内存地址` type.

use hanc_util::Symbol;

/// A struct field: name, type, const flag
#[derive(Clone, Debug, PartialEq)]
pub struct StructField {
    pub name: Symbol,
    pub ty: Type,
    pub is_const: bool,
}

/// An enum member: name and integer value
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnumMember {
    pub name: Symbol,
    pub value: i64,
}

/// A type in the language
#[derive(Clone, Debug)]
pub enum Type {
    /// 整数
    Int,
    /// 小数
    Float,
    /// 布尔
    Bool,
    /// 字符串
    Str,
    /// 无
    Void,
    /// Pointer to a pointee type; `pointer(void)` doubles as the untyped
    /// address (`内存地址`, `空`)
    Pointer(Box<Type>),
    /// Array with element type and length; length 0 means length-unknown
    Array { elem: Box<Type>, len: usize },
    /// Declared struct type with its ordered field list
    Struct {
        name: Symbol,
        fields: Vec<StructField>,
    },
    /// Declared enum type with its ordered member list
    Enum {
        name: Symbol,
        members: Vec<EnumMember>,
    },
    /// Function type
    Function { ret: Box<Type>, params: Vec<Type> },
    /// A type name the parser could not classify (struct or enum); the
    /// semantic analyzer replaces it with the declared type
    Named(Symbol),
}

impl Type {
    /// Shorthand for the untyped address type
    pub fn address() -> Type {
        Type::Pointer(Box::new(Type::Void))
    }

    /// The declared name of a struct, enum or named type
    pub fn decl_name(&self) -> Option<Symbol> {
        match self {
            Type::Struct { name, .. } | Type::Enum { name, .. } | Type::Named(name) => Some(*name),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    /// Whether a value of this type can appear in boolean position
    pub fn is_bool_convertible(&self) -> bool {
        matches!(self, Type::Bool | Type::Int | Type::Float | Type::Pointer(_))
    }

    /// Structural equality
    ///
    /// Struct, enum and not-yet-resolved named types compare by declared
    /// name; everything else compares tags and composed parts, including
    /// array lengths.
    pub fn same_type(&self, other: &Type) -> bool {
        use Type::*;
        match (self, other) {
            (Int, Int) | (Float, Float) | (Bool, Bool) | (Str, Str) | (Void, Void) => true,
            (Pointer(a), Pointer(b)) => a.same_type(b),
            (Array { elem: a, len: la }, Array { elem: b, len: lb }) => {
                la == lb && a.same_type(b)
            }
            (Function { ret: ra, params: pa }, Function { ret: rb, params: pb }) => {
                ra.same_type(rb)
                    && pa.len() == pb.len()
                    && pa.iter().zip(pb).all(|(x, y)| x.same_type(y))
            }
            _ => match (self.decl_name(), other.decl_name()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }

    /// Compatibility: the relation governing assignment and argument
    /// passing
    pub fn compatible_with(&self, other: &Type) -> bool {
        use Type::*;
        if self.same_type(other) {
            return true;
        }
        match (self, other) {
            // Length-unknown arrays accept any length, both directions.
            (Array { elem: a, len: la }, Array { elem: b, len: lb }) => {
                (*la == 0 || *lb == 0) && a.same_type(b)
            }
            // Enum values are integers.
            (Int, Enum { .. }) | (Enum { .. }, Int) => true,
            // The untyped address unifies with every pointer.
            (Pointer(a), Pointer(b)) => {
                matches!(**a, Void) || matches!(**b, Void)
            }
            // A function name decays to a pointer to its function type.
            (Pointer(a), b @ Function { .. }) | (b @ Function { .. }, Pointer(a)) => {
                a.same_type(b)
            }
            _ => false,
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.same_type(other)
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Int => write!(f, "整数"),
            Type::Float => write!(f, "小数"),
            Type::Bool => write!(f, "布尔"),
            Type::Str => write!(f, "字符串"),
            Type::Void => write!(f, "无"),
            Type::Pointer(p) => write!(f, "{p}*"),
            Type::Array { elem, len: 0 } => write!(f, "数组 {elem}"),
            Type::Array { elem, len } => write!(f, "数组 {elem}[{len}]"),
            Type::Struct { name, .. } => write!(f, "结构体 {name}"),
            Type::Enum { name, .. } => write!(f, "枚举 {name}"),
            Type::Function { ret, params } => {
                write!(f, "函数(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") -> {ret}")
            }
            Type::Named(name) => write!(f, "{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_array(len: usize) -> Type {
        Type::Array {
            elem: Box::new(Type::Int),
            len,
        }
    }

    #[test]
    fn test_primitive_equality() {
        assert!(Type::Int.same_type(&Type::Int));
        assert!(!Type::Int.same_type(&Type::Float));
        assert!(!Type::Str.same_type(&Type::Void));
    }

    #[test]
    fn test_pointer_equality_is_structural() {
        let p1 = Type::Pointer(Box::new(Type::Int));
        let p2 = Type::Pointer(Box::new(Type::Int));
        let p3 = Type::Pointer(Box::new(Type::Float));
        assert!(p1.same_type(&p2));
        assert!(!p1.same_type(&p3));
    }

    #[test]
    fn test_array_equality_includes_length() {
        assert!(int_array(3).same_type(&int_array(3)));
        assert!(!int_array(3).same_type(&int_array(4)));
    }

    #[test]
    fn test_array_length_relaxation() {
        assert!(int_array(3).compatible_with(&int_array(0)));
        assert!(int_array(0).compatible_with(&int_array(3)));
        assert!(!int_array(3).compatible_with(&int_array(4)));
    }

    #[test]
    fn test_struct_equality_by_name() {
        let a = Type::Struct {
            name: Symbol::intern("点"),
            fields: vec![],
        };
        let b = Type::Struct {
            name: Symbol::intern("点"),
            fields: vec![StructField {
                name: Symbol::intern("x"),
                ty: Type::Int,
                is_const: false,
            }],
        };
        let c = Type::Struct {
            name: Symbol::intern("线"),
            fields: vec![],
        };
        assert!(a.same_type(&b));
        assert!(!a.same_type(&c));
    }

    #[test]
    fn test_named_matches_declared() {
        let named = Type::Named(Symbol::intern("颜色"));
        let decl = Type::Enum {
            name: Symbol::intern("颜色"),
            members: vec![],
        };
        assert!(named.same_type(&decl));
        assert!(decl.same_type(&named));
    }

    #[test]
    fn test_int_enum_compat() {
        let e = Type::Enum {
            name: Symbol::intern("颜色"),
            members: vec![],
        };
        assert!(Type::Int.compatible_with(&e));
        assert!(e.compatible_with(&Type::Int));
        assert!(!Type::Float.compatible_with(&e));
    }

    #[test]
    fn test_null_pointer_compat() {
        let null = Type::address();
        let p = Type::Pointer(Box::new(Type::Int));
        assert!(null.compatible_with(&p));
        assert!(p.compatible_with(&null));
        let q = Type::Pointer(Box::new(Type::Str));
        assert!(!p.compatible_with(&q));
    }

    #[test]
    fn test_function_decays_to_pointer() {
        let f = Type::Function {
            ret: Box::new(Type::Int),
            params: vec![Type::Int],
        };
        let p = Type::Pointer(Box::new(f.clone()));
        assert!(p.compatible_with(&f));
        assert!(f.compatible_with(&p));
        let other = Type::Function {
            ret: Box::new(Type::Void),
            params: vec![],
        };
        assert!(!p.compatible_with(&other));
    }

    #[test]
    fn test_function_type_equality() {
        let f1 = Type::Function {
            ret: Box::new(Type::Int),
            params: vec![Type::Int, Type::Int],
        };
        let f2 = Type::Function {
            ret: Box::new(Type::Int),
            params: vec![Type::Int, Type::Int],
        };
        let f3 = Type::Function {
            ret: Box::new(Type::Int),
            params: vec![Type::Int],
        };
        assert!(f1.same_type(&f2));
        assert!(!f1.same_type(&f3));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Type::Int), "整数");
        assert_eq!(format!("{}", Type::Pointer(Box::new(Type::Int))), "整数*");
        assert_eq!(format!("{}", int_array(0)), "数组 整数");
    }
}
