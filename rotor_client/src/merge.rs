use tracing::warn;

/// Overwrite a known field when the incoming value parsed to the right
/// type. Wrong-typed values get the same treatment as unknown keys:
/// warn and skip, so one bad field cannot poison the rest of a
/// broadcast.
pub(crate) fn apply<T>(store: &'static str, key: &str, parsed: Option<T>, field: &mut T) {
    match parsed {
        Some(value) => *field = value,
        None => warn!(store, key, "field value has the wrong type"),
    }
}
