//! Built-in function names.
//!
//! Builtins are recognized by name rather than by symbol table entry;
//! the resolver leaves their identifier nodes unbound and the type
//! checker and IR generator dispatch on the name.

use hanc_util::Symbol;

/// A recognized built-in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    /// `长度(x)` — array or string length
    Length,
    /// `打印(x)` — type-dispatched print
    Print,
    /// `打印整数(x)`
    PrintInt,
    /// `打印字符串(x)`
    PrintString,
    /// `文件打开(path)` — hosted only
    FileOpen,
    /// `文件读取(handle)` — hosted only
    FileRead,
    /// `文件写入(handle, data)` — hosted only
    FileWrite,
    /// `文件关闭(handle)` — hosted only
    FileClose,
    /// `读取行()` — console input, hosted only
    ReadLine,
}

impl Builtin {
    /// Whether this builtin is forbidden in freestanding mode
    pub fn is_hosted_only(self) -> bool {
        matches!(
            self,
            Builtin::FileOpen
                | Builtin::FileRead
                | Builtin::FileWrite
                | Builtin::FileClose
                | Builtin::ReadLine
        )
    }
}

/// Classify a name as a builtin
pub fn lookup(name: Symbol) -> Option<Builtin> {
    let builtin = match name.as_str() {
        "长度" => Builtin::Length,
        "打印" => Builtin::Print,
        "打印整数" => Builtin::PrintInt,
        "打印字符串" => Builtin::PrintString,
        "文件打开" => Builtin::FileOpen,
        "文件读取" => Builtin::FileRead,
        "文件写入" => Builtin::FileWrite,
        "文件关闭" => Builtin::FileClose,
        "读取行" => Builtin::ReadLine,
        _ => return None,
    };
    Some(builtin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup(Symbol::intern("长度")), Some(Builtin::Length));
        assert_eq!(lookup(Symbol::intern("打印")), Some(Builtin::Print));
        assert_eq!(lookup(Symbol::intern("别的")), None);
    }

    #[test]
    fn test_hosted_only_set() {
        assert!(Builtin::FileOpen.is_hosted_only());
        assert!(Builtin::ReadLine.is_hosted_only());
        assert!(!Builtin::Print.is_hosted_only());
        assert!(!Builtin::Length.is_hosted_only());
    }
}
