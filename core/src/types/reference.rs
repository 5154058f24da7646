use nutype::nutype;

/// Opaque handle to a stored photo, `<owner-id>/<token>.<ext>`, relative to
/// the photos directory. The record store persists it as-is; only the path
/// resolver may turn it into a disk path.
#[nutype(
    sanitize(trim),
    validate(not_empty),
    derive(
        Debug,
        Clone,
        PartialEq,
        Eq,
        Hash,
        AsRef,
        Deref,
        TryFrom,
        Into,
        Display,
        Serialize,
        Deserialize,
    )
)]
pub struct StoredReference(String);
