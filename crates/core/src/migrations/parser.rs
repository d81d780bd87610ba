//! Migration Source Parser - Extracts up/down SQL from migration files
//!
//! Migration files delimit each direction with a paired line marker:
//!
//! ```text
//! -- up --
//! CREATE TABLE t (x INT);
//! -- up --
//! -- down --
//! DROP TABLE t;
//! -- down --
//! ```
//!
//! A missing or unpaired marker yields an empty body, which signals "no
//! operation for this direction" rather than an error. Only the first
//! complete block per direction is honored. The body is opaque text; no SQL
//! validation happens here.

/// Marker line delimiting the up block
pub const UP_MARKER: &str = "-- up --";
/// Marker line delimiting the down block
pub const DOWN_MARKER: &str = "-- down --";

/// Parse migration file content into its up and down SQL bodies.
pub fn parse_source(content: &str) -> (String, String) {
    (
        extract_block(content, UP_MARKER),
        extract_block(content, DOWN_MARKER),
    )
}

/// Extract the first block delimited by a pair of marker lines.
///
/// Scans line by line: the block opens at the first line that equals the
/// marker (ignoring surrounding whitespace) and closes at the next such
/// line. Leading and trailing newlines of the body are trimmed.
fn extract_block(content: &str, marker: &str) -> String {
    let mut body: Vec<&str> = Vec::new();
    let mut open = false;

    for line in content.lines() {
        if line.trim() == marker {
            if open {
                return body.join("\n").trim_matches('\n').to_string();
            }
            open = true;
            continue;
        }
        if open {
            body.push(line);
        }
    }

    // Opening marker without a closing one (or no marker at all)
    String::new()
}
