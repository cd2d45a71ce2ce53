//! Dedupe guard injection for the visible-cell collection.
//!
//! Overlapping rays visit the same cell more than once, so every append
//! into `visibleCells` is rewritten into a guarded block keyed on the
//! cell's coordinates. The whole stage is gated on two textual markers: if
//! the file already carries a `seen` set, nothing is touched.

use crate::cache;
use regex::Captures;

/// Tracking-structure declaration inserted after the collection declaration.
pub const SEEN_DECL: &str = "const seen = new Set<string>();";

/// Either marker present means the file is already guarded.
const SEEN_MARKERS: [&str; 2] = ["const seen = new Set", "seen.has"];

/// Only the first 10 append sites are rewritten. A deliberate cap on the
/// blast radius, not an oversight: mass-editing every push in a large file
/// has not been reasoned about.
const MAX_GUARDED_PUSHES: usize = 10;

/// Declaration of the visible-cell collection; the insertion point for the
/// `seen` declaration is immediately after it.
const VISIBLE_CELLS_DECL: &str = r"(?:const|let)\s+visibleCells\s*=\s*\[[^\]]*\]\s*;\s*";

/// Append call site against the collection. The expression capture stops
/// at the first closing parenthesis, so nested calls are skipped; that is
/// accepted as part of the best-effort contract.
const PUSH_CALL: &str = r"\bvisibleCells\.push\(\s*(?P<expr>[^)]+)\s*\)\s*;";

/// Ensure cells are pushed into `visibleCells` at most once per position.
///
/// Returns the new text and a coarse indicator: 1 if the text changed at
/// all, 0 otherwise. The marker check runs before any insertion logic and
/// is the sole idempotence gate for this stage.
pub fn ensure_dedupe(text: &str) -> (String, usize) {
    if SEEN_MARKERS.iter().any(|m| text.contains(m)) {
        return (text.to_string(), 0);
    }

    let decl_re = cache::get_or_compile(VISIBLE_CELLS_DECL);
    let Some(decl) = decl_re.find(text) else {
        return (text.to_string(), 0);
    };

    let mut with_seen = String::with_capacity(text.len() + SEEN_DECL.len() + 2);
    with_seen.push_str(&text[..decl.end()]);
    with_seen.push('\n');
    with_seen.push_str(SEEN_DECL);
    with_seen.push('\n');
    with_seen.push_str(&text[decl.end()..]);

    let push_re = cache::get_or_compile(PUSH_CALL);
    let guarded = push_re.replacen(&with_seen, MAX_GUARDED_PUSHES, |caps: &Captures| {
        let expr = caps["expr"].trim().to_string();
        format!(
            "{{\n  const __c = {expr};\n  const __k = `${{__c.x}}:${{__c.y}}`;\n  \
             if (!seen.has(__k)) {{ seen.add(__k); visibleCells.push(__c); }}\n}}\n"
        )
    });

    let guarded = guarded.into_owned();
    let changed = usize::from(guarded != text);
    (guarded, changed)
}
