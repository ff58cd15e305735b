//! Presentation helpers for annotated summaries.

use crate::models::{ResponseSnippet, Segment, SourceDocument};

/// Renders segments as one HTML `<div>`, links as `<a href="n">n</a>`.
pub fn to_html(segments: &[Segment]) -> String {
    let mut out = String::from("<div>");
    for segment in segments {
        match segment {
            Segment::PlainText { content } => out.push_str(&escape_html(content)),
            Segment::ReferenceLink { label, target } => {
                out.push_str(&format!(
                    "<a href=\"{}\">{}</a>",
                    escape_html(target),
                    escape_html(label)
                ));
            }
        }
    }
    out.push_str("</div>");
    out
}

/// Renders segments for a terminal, links as `[n]`.
pub fn to_terminal(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| match s {
            Segment::PlainText { content } => content.clone(),
            Segment::ReferenceLink { label, .. } => format!("[{}]", label),
        })
        .collect()
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// A cited snippet resolved against the response list.
#[derive(Debug, Clone, PartialEq)]
pub struct Citation<'a> {
    pub number: usize,
    pub snippet: &'a ResponseSnippet,
    pub document: Option<&'a SourceDocument>,
}

/// Resolves each distinct `[n]` link (1-based) to its response snippet and
/// source document. Numbers outside the response list are skipped.
pub fn citations<'a>(
    segments: &[Segment],
    references: &'a [ResponseSnippet],
    documents: &'a [SourceDocument],
) -> Vec<Citation<'a>> {
    let mut seen = Vec::new();
    let mut out = Vec::new();

    for segment in segments {
        let Segment::ReferenceLink { target, .. } = segment else {
            continue;
        };
        let Ok(number) = target.trim_start_matches('+').parse::<usize>() else {
            continue;
        };
        if number == 0 || seen.contains(&number) {
            continue;
        }
        let Some(snippet) = references.get(number - 1) else {
            continue;
        };
        seen.push(number);
        out.push(Citation {
            number,
            snippet,
            document: documents.get(snippet.document_index),
        });
    }

    out
}
