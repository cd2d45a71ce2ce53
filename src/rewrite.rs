//! The two forward-only -> omni-direction rewrites.
//!
//! Both transforms are purely textual: a fixed pattern with named capture
//! groups locates the region, and the replacement is spliced over the
//! matched byte range. No parse tree is built, so the patterns only accept
//! the tight shapes they were written for; anything else is left alone and
//! reported as zero changes.
//!
//! Each stage returns an explicit `(text, change count)` pair. A count of
//! zero always means the returned text is the input, unchanged.

use crate::cache;
use std::borrow::Cow;

/// The ordered four-direction literal injected by both transforms.
/// The ordering is fixed (N, E, S, W) so repeated runs diff cleanly.
pub const OMNI_DIRS_DECL: &str = "const dirs = ['N','E','S','W'] as const;";

/// Identifier the injected loop binds each direction to. The original loop
/// body's standalone `dir` references are rebound to this name.
const LOOP_BINDING: &str = "face";

/// Structural pattern for the forward-only block: the empty visibleCells
/// declaration (head), the facing-direction binding (dirdecl), and a
/// bounded depth loop (ray). The ray span ends at the first closing brace,
/// so bodies with nested braces are truncated; callers accept that as part
/// of the best-effort contract.
const FORWARD_BLOCK: &str = r"(?s)(?P<head>(?:const|let)\s+visibleCells\s*=\s*\[[^\]]*\]\s*;\s*(?:\r?\n)+.*?)(?P<dirdecl>(?:const|let)\s+dir\s*=\s*(?:player\.)?face\s*;\s*)(?P<ray>for\s*\(\s*let\s+\w+\s*=\s*1\s*;\s*\w+\s*<=\s*(?:VIEW_DEPTH|viewDepth|depth|3)\s*;\s*\w+\+\+\s*\)\s*\{.*?\})";

/// Standalone `dir` token inside the relocated loop body.
const DIR_TOKEN: &str = r"\bdir\b";

/// Single-element directions literal derived from the current facing.
const DIRS_LITERAL: &str =
    r"const\s+dirs\s*=\s*\[\s*(?:player\.)?face\s*\]\s+as\s+const\s*;\s*";

/// Transform A: wrap the forward ray loop in a four-direction loop.
///
/// Applies to the first eligible region only. Wrapping an already wrapped
/// region is undefined, and re-indentation has only been reasoned about
/// for a single region, so at most one application per file.
pub fn rewrite_forward_block(text: &str) -> (String, usize) {
    let re = cache::get_or_compile(FORWARD_BLOCK);
    let Some(caps) = re.captures(text) else {
        return (text.to_string(), 0);
    };
    let whole = caps.get(0).expect("group 0 is the whole match");
    let head = &caps["head"];
    let ray = &caps["ray"];

    // Rebind the removed standalone direction variable to the loop binding.
    let dir_token = cache::get_or_compile(DIR_TOKEN);
    let ray = dir_token.replace_all(ray, LOOP_BINDING);

    // One extra nesting level keeps the relocated body syntactically valid.
    let injected = format!(
        "{OMNI_DIRS_DECL}\nfor (const {LOOP_BINDING} of dirs) {{\n{}\n}}\n",
        indent_block(&ray, 2)
    );

    let mut out = String::with_capacity(text.len() + injected.len());
    out.push_str(&text[..whole.start()]);
    out.push_str(head);
    out.push_str(&injected);
    out.push_str(&text[whole.end()..]);
    (out, 1)
}

/// Transform B: replace a `const dirs = [face] as const;` declaration with
/// the fixed four-direction literal.
///
/// Idempotent by construction: once the four-direction literal is in
/// place, the single-element pattern no longer matches.
pub fn rewrite_dirs_literal(text: &str) -> (String, usize) {
    let re = cache::get_or_compile(DIRS_LITERAL);
    let replacement = format!("{OMNI_DIRS_DECL}\n");
    match re.replacen(text, 1, replacement.as_str()) {
        Cow::Borrowed(_) => (text.to_string(), 0),
        Cow::Owned(out) => (out, 1),
    }
}

/// Run both transforms: A over the original text, then B over A's output.
///
/// B must see A's output, not the original, in case A altered the
/// surrounding text. The summed count of zero is a valid outcome meaning
/// "no known pattern in this file".
pub fn rewrite(text: &str) -> (String, usize) {
    let (text, a) = rewrite_forward_block(text);
    let (text, b) = rewrite_dirs_literal(&text);
    (text, a + b)
}

/// Indent every non-blank line of `block` by `spaces` spaces.
pub(crate) fn indent_block(block: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    block
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
