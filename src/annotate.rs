//! Citation marker annotation.
//!
//! Search summaries cite their sources with `[n]` markers. [`annotate`]
//! splits a summary into [`Segment`]s so a renderer can turn each marker
//! into a link while leaving the surrounding prose untouched.
//!
//! ```rust
//! use vsearch::annotate::annotate;
//! use vsearch::models::Segment;
//!
//! let segments = annotate("Open daily [2].");
//! assert_eq!(
//!     segments,
//!     vec![Segment::text("Open daily "), Segment::link("2"), Segment::text(".")]
//! );
//! ```
//!
//! Bracketed content that is not an integer is kept verbatim as plain text.
//! Only the opening `[` consumed by the split is lost in that case.

use crate::models::Segment;

/// Splits `summary` into plain-text and reference-link segments.
///
/// The first segment is always plain text, even when empty. For every `[`,
/// the text up to the first following `]` is parsed as an integer; on
/// success a link is emitted followed by the remaining text, otherwise the
/// whole piece after `[` is emitted as plain text.
pub fn annotate(summary: &str) -> Vec<Segment> {
    let mut parts = summary.split('[');

    // `split` always yields at least one item.
    let mut segments = vec![Segment::text(parts.next().unwrap_or_default())];

    for part in parts {
        match part.split_once(']') {
            Some((reference, rest)) if is_integer(reference) => {
                segments.push(Segment::link(reference));
                segments.push(Segment::text(rest));
            }
            _ => segments.push(Segment::text(part)),
        }
    }

    segments
}

/// Accepts an optional sign followed by one or more ASCII digits.
///
/// Values too large for a machine integer are rejected.
fn is_integer(s: &str) -> bool {
    s.parse::<i64>().is_ok()
}
