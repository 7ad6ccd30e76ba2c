use core::fmt;
use core::num::NonZeroU32;

/// Persistent identity of a solution branch.
///
/// Handed out by a monotonically increasing counter and never reused.
/// `NonZero` keeps `Option<BranchId>` the same size as `BranchId`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchId(NonZeroU32);

impl BranchId {
    /// Create an id from a 0-based counter value by storing counter+1.
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::MIN.saturating_add(index))
    }

    /// Recover the 0-based counter value.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }
}

impl fmt::Debug for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BranchId({})", self.index())
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Serialized as the 0-based index, matching `Display`.
#[cfg(feature = "serde")]
impl serde::Serialize for BranchId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.index())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for BranchId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let index = <u32 as serde::Deserialize>::deserialize(deserializer)?;
        if index == u32::MAX {
            return Err(serde::de::Error::custom("branch index out of range"));
        }
        Ok(Self::from_index(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trip_index() {
        for i in [0_u32, 1, 2, 42, 10_000] {
            let id = BranchId::from_index(i);
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn option_id_is_small() {
        assert_eq!(
            core::mem::size_of::<BranchId>(),
            core::mem::size_of::<Option<BranchId>>()
        );
    }

    #[test]
    fn ids_order_by_birth() {
        assert!(BranchId::from_index(0) < BranchId::from_index(1));
        assert_eq!(format!("{}", BranchId::from_index(7)), "7");
    }
}
