//! Compilation targets.

use std::fmt;

/// Target CPU architecture
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arch {
    X86_64,
    Aarch64,
    Riscv32,
    Riscv64,
}

/// Target operating system
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Os {
    Linux,
    Windows,
    Macos,
    /// Bare metal
    None,
}

/// Target binary ABI / object format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Abi {
    Elf,
    Pe,
    Macho,
}

/// A target triple: architecture, vendor, OS and ABI
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetTriple {
    pub arch: Arch,
    pub vendor: String,
    pub os: Os,
    pub abi: Abi,
}

impl TargetTriple {
    /// The default hosted target
    pub fn host_default() -> Self {
        Self {
            arch: Arch::X86_64,
            vendor: "unknown".to_string(),
            os: Os::Linux,
            abi: Abi::Elf,
        }
    }

    /// A bare-metal target for the given architecture
    pub fn bare_metal(arch: Arch) -> Self {
        Self {
            arch,
            vendor: "unknown".to_string(),
            os: Os::None,
            abi: Abi::Elf,
        }
    }
}

impl fmt::Display for TargetTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arch = match self.arch {
            Arch::X86_64 => "x86_64",
            Arch::Aarch64 => "aarch64",
            Arch::Riscv32 => "riscv32",
            Arch::Riscv64 => "riscv64",
        };
        let os = match self.os {
            Os::Linux => "linux",
            Os::Windows => "windows",
            Os::Macos => "macos",
            Os::None => "none",
        };
        write!(f, "{arch}-{}-{os}", self.vendor)
    }
}

/// Compile mode: hosted permits every builtin, freestanding forbids the
/// hosted-only set (enforced by the freestanding checker)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompileMode {
    Hosted,
    Freestanding,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triple_display() {
        assert_eq!(TargetTriple::host_default().to_string(), "x86_64-unknown-linux");
        assert_eq!(
            TargetTriple::bare_metal(Arch::Riscv32).to_string(),
            "riscv32-unknown-none"
        );
    }
}
