use nutype::nutype;
use redb::TypeName;
use std::cmp::Ordering;

/// Identifier of the record owning a photo. Only ever used to namespace the
/// on-disk subdirectory and to key the pointer table.
#[nutype(derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    From,
    Into,
    Display,
    Serialize,
    Deserialize,
))]
pub struct OwnerId(u64);

impl redb::Key for OwnerId {
    fn compare(data1: &[u8], data2: &[u8]) -> Ordering {
        let a = u64::from_le_bytes(data1.try_into().expect("invalid owner id width"));
        let b = u64::from_le_bytes(data2.try_into().expect("invalid owner id width"));

        a.cmp(&b)
    }
}

impl redb::Value for OwnerId {
    type SelfType<'a> = Self;
    type AsBytes<'a> = [u8; 8];

    fn fixed_width() -> Option<usize> {
        Some(8)
    }

    fn from_bytes<'a>(data: &'a [u8]) -> Self::SelfType<'a>
    where
        Self: 'a,
    {
        Self::new(u64::from_le_bytes(
            data.try_into().expect("invalid owner id width"),
        ))
    }

    fn as_bytes<'a, 'b: 'a>(value: &'a Self::SelfType<'b>) -> Self::AsBytes<'a>
    where
        Self: 'b,
    {
        value.into_inner().to_le_bytes()
    }

    fn type_name() -> TypeName {
        TypeName::new("photostore::OwnerId")
    }
}
