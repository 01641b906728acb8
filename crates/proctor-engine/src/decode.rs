// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort structured decoding of oracle text.
//!
//! Oracle replies are supposed to be JSON but routinely arrive wrapped in
//! markdown fences, surrounded by prose, or with trailing commas. Decoding
//! walks a fixed ladder and stops at the first rung that parses:
//!
//! 1. the trimmed text as-is
//! 2. the text with a surrounding code fence removed
//! 3. the largest balanced `{...}` or `[...]` span
//! 4. that span (or the unfenced text) with trailing commas removed
//!
//! Anything that fails every rung yields `None`; callers decide what a
//! missing value means for them.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Decodes `raw` into `T`, trying each rung of the ladder in order.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Option<T> {
    candidates(raw)
        .into_iter()
        .find_map(|text| serde_json::from_str::<T>(&text).ok())
}

/// Decodes `raw` into an untyped JSON value.
pub fn decode_value(raw: &str) -> Option<serde_json::Value> {
    decode(raw)
}

/// Like [`decode`], logging the raw text when every rung fails.
pub fn decode_logged<T: DeserializeOwned>(component: &str, raw: &str) -> Option<T> {
    let decoded = decode(raw);
    if decoded.is_none() {
        warn!(component, "failed to decode oracle output");
        debug!(component, raw_response = %raw, "raw oracle output that failed to decode");
    }
    decoded
}

/// Texts to attempt, in ladder order, without duplicates.
fn candidates(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(5);
    let mut push = |s: String| {
        if !s.is_empty() && !out.contains(&s) {
            out.push(s);
        }
    };

    let trimmed = raw.trim();
    push(trimmed.to_string());

    let unfenced = strip_fences(trimmed);
    push(unfenced.to_string());

    let span = largest_balanced_span(unfenced).map(str::to_string);
    if let Some(span) = &span {
        push(span.clone());
        push(remove_trailing_commas(span));
    }
    push(remove_trailing_commas(unfenced));

    out
}

/// Removes one surrounding markdown code fence, with or without a language tag.
pub(crate) fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Skip the info string ("json", "JSON", ...) up to the first newline.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Finds the longest top-level balanced `{...}` or `[...]` span.
///
/// Brackets inside JSON strings are ignored once a span is open. Prose
/// outside any span is not tokenized, so apostrophes there are harmless.
pub(crate) fn largest_balanced_span(text: &str) -> Option<&str> {
    let mut best: Option<(usize, usize)> = None;
    let mut stack: Vec<char> = Vec::new();
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if stack.is_empty() {
            if ch == '{' || ch == '[' {
                stack.push(ch);
                start = idx;
                in_string = false;
                escaped = false;
            }
            continue;
        }

        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' | '[' => stack.push(ch),
            '}' | ']' => {
                let open = if ch == '}' { '{' } else { '[' };
                if stack.last() == Some(&open) {
                    stack.pop();
                    if stack.is_empty() {
                        let end = idx + ch.len_utf8();
                        let longer = best.is_none_or(|(s, e)| end - start > e - s);
                        if longer {
                            best = Some((start, end));
                        }
                    }
                } else {
                    // Mismatched closer: abandon this span.
                    stack.clear();
                }
            }
            _ => {}
        }
    }

    best.map(|(s, e)| &text[s..e])
}

/// Drops commas that directly precede a closing brace or bracket.
pub(crate) fn remove_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &ch) in chars.iter().enumerate() {
        if in_string {
            out.push(ch);
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(ch);
                }
            }
            _ => out.push(ch),
        }
    }
    out
}
