use std::fmt;

/// The four entity kinds sharing the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Application,
    Authorization,
    Scope,
    Token,
}

impl EntityKind {
    /// Every kind, in declaration order.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Application,
        EntityKind::Authorization,
        EntityKind::Scope,
        EntityKind::Token,
    ];

    /// Lower-case name used in logs and error messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Authorization => "authorization",
            Self::Scope => "scope",
            Self::Token => "token",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
