#![forbid(unsafe_code)]

use gdx_model::{LabelUniverse, Record, RecordSource};

use crate::error::{ReadError, ReadResult};

/// Text of one set element: its associated text when the record carries a text index, otherwise
/// the element's labels joined with `.` in dimension order.
pub(crate) fn element_text<S: RecordSource + ?Sized>(
    source: &S,
    universe: &LabelUniverse,
    record: &Record,
) -> ReadResult<String> {
    match record.text_index() {
        Some(index) => Ok(source.associated_text(index)?),
        None => default_text(universe, &record.keys),
    }
}

pub(crate) fn default_text(universe: &LabelUniverse, keys: &[u32]) -> ReadResult<String> {
    let mut text = String::new();
    for (dim, &key) in keys.iter().enumerate() {
        let Some(label) = universe.get(key) else {
            return Err(ReadError::corrupt(
                "*",
                format!("universe index {key} out of range 1..={}", universe.len()),
            ));
        };
        if dim > 0 {
            text.push('.');
        }
        text.push_str(label);
    }
    Ok(text)
}
