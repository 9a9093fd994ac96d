//! Permission bits and the 10-character descriptor codec

use crate::entry::EntryKind;
use std::fmt;
use thiserror::Error;

/// Which permission triplet applies to an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    /// The entry's owner
    Owner,
    /// A member of the entry's group
    Group,
    /// Everyone else
    Other,
}

impl Class {
    /// Bit offset of this class's triplet inside the 9-bit mode
    const fn shift(self) -> u16 {
        match self {
            Class::Owner => 6,
            Class::Group => 3,
            Class::Other => 0,
        }
    }

    /// Lowercase name, used in reason codes
    pub const fn as_str(self) -> &'static str {
        match self {
            Class::Owner => "owner",
            Class::Group => "group",
            Class::Other => "other",
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single permission bit within a triplet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Perm {
    Read,
    Write,
    Execute,
}

impl Perm {
    const fn mask(self) -> u16 {
        match self {
            Perm::Read => 0o4,
            Perm::Write => 0o2,
            Perm::Execute => 0o1,
        }
    }

    /// Lowercase name, used in reason codes
    pub const fn as_str(self) -> &'static str {
        match self {
            Perm::Read => "read",
            Perm::Write => "write",
            Perm::Execute => "execute",
        }
    }
}

impl fmt::Display for Perm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors decoding a permission descriptor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeError {
    #[error("descriptor must be exactly 10 characters, got {0}")]
    WrongLength(usize),

    #[error("invalid type marker '{0}'")]
    InvalidType(char),

    #[error("invalid character '{found}' at position {position}")]
    InvalidChar { position: usize, found: char },

    #[error("octal mode out of range: {0:o}")]
    OutOfRange(u32),
}

/// Permission bits of an entry
///
/// `bits` holds the nine rwx bits in the usual octal layout (owner in the
/// high triplet). The sticky flag is kept separately and only rendered as
/// the `t`/`T` overlay on the other-execute slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Mode {
    bits: u16,
    sticky: bool,
}

impl Mode {
    /// No bits set
    pub const NONE: Mode = Mode {
        bits: 0,
        sticky: false,
    };

    /// `rw-r--r--`
    pub const FILE_DEFAULT: Mode = Mode {
        bits: 0o644,
        sticky: false,
    };

    /// `rwxr-xr-x`
    pub const DIR_DEFAULT: Mode = Mode {
        bits: 0o755,
        sticky: false,
    };

    /// `rwx------`
    pub const OWNER_ONLY: Mode = Mode {
        bits: 0o700,
        sticky: false,
    };

    /// `rw-------`
    pub const PRIVATE_FILE: Mode = Mode {
        bits: 0o600,
        sticky: false,
    };

    /// `rwxrwxrwt`, the classic shared scratch directory
    pub const SHARED_TMP: Mode = Mode {
        bits: 0o777,
        sticky: true,
    };

    /// Builds a mode from an octal value such as `0o1777`
    pub fn from_octal(value: u32) -> Result<Self, ModeError> {
        if value > 0o1777 {
            return Err(ModeError::OutOfRange(value));
        }
        Ok(Self {
            bits: (value & 0o777) as u16,
            sticky: value & 0o1000 != 0,
        })
    }

    /// Octal representation including the sticky bit
    pub fn octal(&self) -> u32 {
        u32::from(self.bits) | if self.sticky { 0o1000 } else { 0 }
    }

    /// Returns whether `class` holds `perm`
    pub fn allows(&self, class: Class, perm: Perm) -> bool {
        (self.bits >> class.shift()) & perm.mask() != 0
    }

    /// Returns whether the sticky flag is set
    pub fn is_sticky(&self) -> bool {
        self.sticky
    }

    /// Returns a copy with the sticky flag set or cleared
    pub fn with_sticky(mut self, sticky: bool) -> Self {
        self.sticky = sticky;
        self
    }

    /// Returns a copy with one bit set or cleared
    pub fn with(mut self, class: Class, perm: Perm, enabled: bool) -> Self {
        let mask = perm.mask() << class.shift();
        if enabled {
            self.bits |= mask;
        } else {
            self.bits &= !mask;
        }
        self
    }

    /// Renders the full 10-character descriptor for an entry of `kind`
    pub fn descriptor(&self, kind: EntryKind) -> String {
        let mut out = String::with_capacity(10);
        out.push(match kind {
            EntryKind::File => '-',
            EntryKind::Directory => 'd',
        });
        for class in [Class::Owner, Class::Group, Class::Other] {
            out.push(if self.allows(class, Perm::Read) { 'r' } else { '-' });
            out.push(if self.allows(class, Perm::Write) { 'w' } else { '-' });
            let exec = self.allows(class, Perm::Execute);
            let slot = match (class, self.sticky, exec) {
                (Class::Other, true, true) => 't',
                (Class::Other, true, false) => 'T',
                (_, _, true) => 'x',
                (_, _, false) => '-',
            };
            out.push(slot);
        }
        out
    }

    /// Strictly decodes a 10-character descriptor
    pub fn parse_descriptor(descriptor: &str) -> Result<(EntryKind, Mode), ModeError> {
        let chars: Vec<char> = descriptor.chars().collect();
        if chars.len() != 10 {
            return Err(ModeError::WrongLength(chars.len()));
        }

        let kind = match chars[0] {
            '-' => EntryKind::File,
            'd' => EntryKind::Directory,
            other => return Err(ModeError::InvalidType(other)),
        };

        let mut mode = Mode::NONE;
        for (index, class) in [Class::Owner, Class::Group, Class::Other].iter().enumerate() {
            let base = 1 + index * 3;
            for (offset, perm) in [Perm::Read, Perm::Write, Perm::Execute].iter().enumerate() {
                let position = base + offset;
                let found = chars[position];
                let set = match (perm, found) {
                    (_, '-') => false,
                    (Perm::Read, 'r') | (Perm::Write, 'w') | (Perm::Execute, 'x') => true,
                    (Perm::Execute, 't') if *class == Class::Other => {
                        mode.sticky = true;
                        true
                    }
                    (Perm::Execute, 'T') if *class == Class::Other => {
                        mode.sticky = true;
                        false
                    }
                    _ => return Err(ModeError::InvalidChar { position, found }),
                };
                mode = mode.with(*class, *perm, set);
            }
        }

        Ok((kind, mode))
    }

    /// Decodes a descriptor, degrading to no bits when it is malformed
    ///
    /// A malformed descriptor is an Entry Model defect; access checks must
    /// still fail closed rather than propagate an unrelated fault.
    pub fn decode_lenient(descriptor: &str) -> Option<(EntryKind, Mode)> {
        match Self::parse_descriptor(descriptor) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                tracing::warn!(descriptor, error = %err, "malformed permission descriptor, treating as no bits");
                None
            }
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.octal())
    }
}
