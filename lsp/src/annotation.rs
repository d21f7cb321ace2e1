//! Parser for the analyzer's `::notice` annotation lines.
//!
//! The grammar is fixed: field order and labels never vary, and the message
//! runs to the end of the line without escaping.

use std::sync::LazyLock;

use nudge_types::AnnotationRecord;
use regex::Regex;

static NOTICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^::notice file=([^\n]+),line=(\d+),col=(\d+),endLine=(\d+),endColumn=(\d+)::(.*)$",
    )
    .expect("notice pattern is valid")
});

/// Parse one line of analyzer output.
///
/// Returns `None` for anything that is not a notice annotation, including
/// numeric fields too large for a `u32`.
#[must_use]
pub fn parse_line(line: &str) -> Option<AnnotationRecord> {
    let caps = NOTICE.captures(line)?;
    let number = |idx: usize| caps.get(idx)?.as_str().parse::<u32>().ok();

    let path = caps.get(1)?.as_str();
    let start_line = number(2)?;
    let start_column = number(3)?;
    let end_line = number(4)?;
    let end_column = number(5)?;
    let message = caps.get(6).map_or("", |m| m.as_str());

    Some(AnnotationRecord::new(
        path,
        start_line,
        start_column,
        end_line,
        end_column,
        message,
    ))
}

/// Parse every line of `output`, skipping non-annotations.
pub fn parse_output(output: &str) -> impl Iterator<Item = AnnotationRecord> + '_ {
    output.lines().filter_map(|line| {
        let record = parse_line(line);
        if record.is_none() && !line.trim().is_empty() {
            tracing::trace!(line, "Skipping non-annotation output");
        }
        record
    })
}
