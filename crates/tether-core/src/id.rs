//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a coupling datum within a coupling scheme.
///
/// Data are registered with the scheme at configuration time and keep
/// their ID for the lifetime of the scheme. The ID doubles as the wire
/// ordering key: both participants exchange data in ascending ID order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataId(pub u32);

impl fmt::Display for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for DataId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_id_orders_by_value() {
        assert!(DataId(1) < DataId(2));
        assert_eq!(DataId::from(7), DataId(7));
        assert_eq!(format!("{}", DataId(42)), "42");
    }
}
