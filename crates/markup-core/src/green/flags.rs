use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Summary bits propagated from children to parents
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeFlags(u8);

impl NodeFlags {
    pub const NONE: NodeFlags = NodeFlags(0);
    /// Token synthesized by the parser, no source text
    pub const IS_MISSING: NodeFlags = NodeFlags(1);
    /// The element or a descendant carries diagnostics
    pub const CONTAINS_DIAGNOSTICS: NodeFlags = NodeFlags(1 << 1);
    /// The element or a descendant carries annotations
    pub const CONTAINS_ANNOTATIONS: NodeFlags = NodeFlags(1 << 2);
    /// Skipped-token trivia somewhere below
    pub const CONTAINS_SKIPPED_TEXT: NodeFlags = NodeFlags(1 << 3);
    /// Structured trivia somewhere below
    pub const CONTAINS_STRUCTURED_TRIVIA: NodeFlags = NodeFlags(1 << 4);

    /// Bits a parent inherits from a child
    const INHERITED: u8 = (1 << 1) | (1 << 2) | (1 << 3) | (1 << 4);

    pub const fn contains(self, other: NodeFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: NodeFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn inherited(self) -> NodeFlags {
        NodeFlags(self.0 & Self::INHERITED)
    }

    pub const fn without(self, other: NodeFlags) -> NodeFlags {
        NodeFlags(self.0 & !other.0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for NodeFlags {
    type Output = NodeFlags;

    fn bitor(self, rhs: NodeFlags) -> NodeFlags {
        NodeFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for NodeFlags {
    fn bitor_assign(&mut self, rhs: NodeFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for NodeFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(NodeFlags, &str); 5] = [
            (NodeFlags::IS_MISSING, "IS_MISSING"),
            (NodeFlags::CONTAINS_DIAGNOSTICS, "CONTAINS_DIAGNOSTICS"),
            (NodeFlags::CONTAINS_ANNOTATIONS, "CONTAINS_ANNOTATIONS"),
            (NodeFlags::CONTAINS_SKIPPED_TEXT, "CONTAINS_SKIPPED_TEXT"),
            (NodeFlags::CONTAINS_STRUCTURED_TRIVIA, "CONTAINS_STRUCTURED_TRIVIA"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            f.write_str("NONE")
        } else {
            f.write_str(&names.join(" | "))
        }
    }
}
