/// A single column assignment in a partial update
///
/// Patches are expressed as `(column, value)` pairs; only the pairs a
/// caller supplied are turned into `SET` clauses.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchValue {
    Text(String),
    Int(i64),
    Bool(bool),
}

/// Push `(column, value)` into `fields` when the value was supplied
pub(crate) fn push_field<T>(
    fields: &mut Vec<(&'static str, PatchValue)>,
    column: &'static str,
    value: &Option<T>,
    convert: impl FnOnce(&T) -> PatchValue,
) {
    if let Some(v) = value {
        fields.push((column, convert(v)));
    }
}
