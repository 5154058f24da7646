use redb::TypeName;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::types::StoredReference;

/// Version byte prefixed to every encoded record.
const RECORD_VERSION: u8 = 1;

/// Pointer row stored per owner: which file is the photo of record, and when
/// the pointer last changed.
#[cfg_attr(test, derive(Eq, PartialEq))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub reference: StoredReference,
    pub updated_at: SystemTime,
}

impl redb::Value for PhotoRecord {
    type SelfType<'a> = PhotoRecord;
    type AsBytes<'a> = Vec<u8>;

    fn fixed_width() -> Option<usize> {
        None
    }

    fn from_bytes<'a>(data: &'a [u8]) -> Self::SelfType<'a>
    where
        Self: 'a,
    {
        let (version, data) = data.split_first().expect("empty record");
        match *version {
            RECORD_VERSION => postcard::from_bytes::<PhotoRecord>(data).expect("invalid record"),
            version => panic!("unsupported record version: {}", version),
        }
    }

    fn as_bytes<'a, 'b: 'a>(value: &'a Self::SelfType<'b>) -> Self::AsBytes<'a>
    where
        Self: 'b,
    {
        postcard::to_extend(value, vec![RECORD_VERSION]).unwrap()
    }

    fn type_name() -> TypeName {
        TypeName::new("photostore::PhotoRecord")
    }
}
