//! Identifier types.

use std::fmt;

/// Pool-assigned connection identifier - newtype for type safety.
///
/// Identifiers are handed out in increasing order by the pool; a replacement
/// connection always gets a fresh id, never the id of the connection it
/// replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Create a new ConnectionId.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The id following this one.
    pub(crate) const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ConnectionId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_increments() {
        let id = ConnectionId::new(7);
        assert_eq!(id.next().get(), 8);
        assert_eq!(id.get(), 7);
    }

    #[test]
    fn display_is_numeric() {
        assert_eq!(ConnectionId::from(42).to_string(), "42");
    }
}
