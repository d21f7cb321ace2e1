//! Expands an annotation span into one diagnostic per physical line.

use nudge_types::{AnnotationRecord, Diagnostic, MAX_SPAN_LINES, Position, Range};

/// One diagnostic per line in `[start_line, end_line]`, ascending.
///
/// Every diagnostic starts at the reported start column and ends at the
/// beginning of the following line, which highlights to end-of-line without
/// knowing line lengths. Zero values saturate to 0; a reversed span yields
/// nothing. At most [`MAX_SPAN_LINES`] diagnostics are produced.
#[must_use]
pub fn expand(record: &AnnotationRecord) -> Vec<Diagnostic> {
    let start_character = record.start_column().saturating_sub(1);
    (record.start_line()..=record.end_line())
        .take(MAX_SPAN_LINES as usize)
        .map(|line| {
            let range = Range::new(
                Position::new(line.saturating_sub(1), start_character),
                Position::new(line, 0),
            );
            Diagnostic::information(record.path(), range, record.message())
        })
        .collect()
}
