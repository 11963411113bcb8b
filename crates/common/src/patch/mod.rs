// Reversible text patches: Myers char diff encoded as copy/insert/delete runs.
//
// Round-trip contract, exact in both directions:
//   apply(old, [diff(old, new)], reverse = false) == new
//   apply(new, [diff(old, new)], reverse = true)  == old

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod line;
mod myers;

pub use line::{line_diff, LineChange, LineChangeKind};
pub use myers::{myers_edits, DiffEdit};

/// A single run in a patch. Offsets are implicit: ops are applied in
/// sequence and together must consume the whole base text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PatchOp {
    /// Carry `len` chars of the base text through unchanged.
    Copy { len: usize },
    /// Emit `text`, which is absent from the base.
    Insert { text: String },
    /// Consume `text` from the base. Carrying the removed text is what
    /// makes the patch reversible.
    Delete { text: String },
}

/// A reversible difference between two text snapshots.
///
/// An empty patch means the snapshots were identical; callers use
/// [`Patch::is_empty`] to skip recording a version for a no-op edit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Patch {
    pub ops: Vec<PatchOp>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    /// The patch does not fit the text it was applied to.
    #[error("corrupt patch: {0}")]
    Corrupt(String),
    /// The stored representation could not be decoded.
    #[error("patch encoding error: {0}")]
    Encoding(String),
}

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn to_json(&self) -> Result<String, PatchError> {
        serde_json::to_string(self).map_err(|error| PatchError::Encoding(error.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self, PatchError> {
        serde_json::from_str(text).map_err(|error| PatchError::Encoding(error.to_string()))
    }

    /// The inverse patch: inserts become deletes and vice versa, copies stay.
    pub fn inverted(&self) -> Patch {
        let ops = self
            .ops
            .iter()
            .map(|op| match op {
                PatchOp::Copy { len } => PatchOp::Copy { len: *len },
                PatchOp::Insert { text } => PatchOp::Delete { text: text.clone() },
                PatchOp::Delete { text } => PatchOp::Insert { text: text.clone() },
            })
            .collect();
        Patch { ops }
    }

    /// Concatenated insert/delete payload text. This is what the stored
    /// version text index sees; copy runs carry no text of their own.
    pub fn payload_text(&self) -> String {
        let mut out = String::new();
        for op in &self.ops {
            match op {
                PatchOp::Insert { text } | PatchOp::Delete { text } => {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    out.push_str(text);
                }
                PatchOp::Copy { .. } => {}
            }
        }
        out
    }

    /// Whether any insert/delete payload contains `needle` literally.
    pub fn payload_contains(&self, needle: &str) -> bool {
        self.ops.iter().any(|op| match op {
            PatchOp::Insert { text } | PatchOp::Delete { text } => text.contains(needle),
            PatchOp::Copy { .. } => false,
        })
    }
}

/// Computes the reversible patch from `old_text` to `new_text`.
pub fn diff(old_text: &str, new_text: &str) -> Patch {
    if old_text == new_text {
        return Patch::default();
    }

    let old_chars: Vec<char> = old_text.chars().collect();
    let new_chars: Vec<char> = new_text.chars().collect();
    let edits = myers::myers_edits(&old_chars, &new_chars);
    edits_to_ops(&edits)
}

/// Applies `patches` to `base` in the order supplied by the caller.
///
/// With `reverse` set, each patch's inverse is applied instead; callers
/// reconstructing older content supply patches newest-first.
pub fn apply(base: &str, patches: &[Patch], reverse: bool) -> Result<String, PatchError> {
    let mut text = base.to_string();
    for patch in patches {
        text = if reverse {
            apply_one(&text, &patch.inverted())?
        } else {
            apply_one(&text, patch)?
        };
    }
    Ok(text)
}

fn apply_one(base: &str, patch: &Patch) -> Result<String, PatchError> {
    // An empty patch is the identity and round-trips on any base.
    if patch.is_empty() {
        return Ok(base.to_string());
    }

    let base_chars: Vec<char> = base.chars().collect();
    let mut cursor = 0usize;
    let mut out = String::with_capacity(base.len());

    for op in &patch.ops {
        match op {
            PatchOp::Copy { len } => {
                let end = checked_run_end(cursor, *len, base_chars.len(), "copy")?;
                out.extend(&base_chars[cursor..end]);
                cursor = end;
            }
            PatchOp::Insert { text } => out.push_str(text),
            PatchOp::Delete { text } => {
                let len = text.chars().count();
                let end = checked_run_end(cursor, len, base_chars.len(), "delete")?;
                let actual: String = base_chars[cursor..end].iter().collect();
                if actual != *text {
                    return Err(PatchError::Corrupt(format!(
                        "delete text mismatch at char offset {cursor}"
                    )));
                }
                cursor = end;
            }
        }
    }

    if cursor != base_chars.len() {
        return Err(PatchError::Corrupt(format!(
            "patch consumed {cursor} of {} base chars",
            base_chars.len()
        )));
    }

    Ok(out)
}

fn checked_run_end(
    cursor: usize,
    len: usize,
    base_len: usize,
    kind: &str,
) -> Result<usize, PatchError> {
    cursor
        .checked_add(len)
        .filter(|end| *end <= base_len)
        .ok_or_else(|| {
            PatchError::Corrupt(format!(
                "{kind} of {len} chars overruns base at char offset {cursor}"
            ))
        })
}

fn edits_to_ops(edits: &[myers::DiffEdit<char>]) -> Patch {
    let mut ops: Vec<PatchOp> = Vec::new();

    for edit in edits {
        match edit {
            myers::DiffEdit::Equal(_) => match ops.last_mut() {
                Some(PatchOp::Copy { len }) => *len += 1,
                _ => ops.push(PatchOp::Copy { len: 1 }),
            },
            myers::DiffEdit::Insert(ch) => match ops.last_mut() {
                Some(PatchOp::Insert { text }) => text.push(*ch),
                _ => ops.push(PatchOp::Insert { text: ch.to_string() }),
            },
            myers::DiffEdit::Delete(ch) => match ops.last_mut() {
                Some(PatchOp::Delete { text }) => text.push(*ch),
                _ => ops.push(PatchOp::Delete { text: ch.to_string() }),
            },
        }
    }

    Patch { ops }
}

#[cfg(test)]
mod tests {
    use super::{apply, diff, Patch, PatchError, PatchOp};

    #[test]
    fn computes_expected_simple_insert_and_delete_ops() {
        assert_eq!(
            diff("abc", "abXYZc").ops,
            vec![
                PatchOp::Copy { len: 2 },
                PatchOp::Insert { text: "XYZ".to_owned() },
                PatchOp::Copy { len: 1 },
            ]
        );

        assert_eq!(
            diff("abXYZc", "abc").ops,
            vec![
                PatchOp::Copy { len: 2 },
                PatchOp::Delete { text: "XYZ".to_owned() },
                PatchOp::Copy { len: 1 },
            ]
        );
    }

    #[test]
    fn round_trips_in_both_directions() {
        let scenarios = [
            ("", "hello world"),
            ("hello world", ""),
            ("hello world", "hello brave new world"),
            ("alpha\nbeta\ngamma\n", "alpha!\nbeta\ndelta\ngamma\nomega\n"),
            ("naïve café", "naive cafe ☕"),
            ("🙂 hello", "🙂 hi"),
        ];

        for (old_text, new_text) in scenarios {
            let patch = diff(old_text, new_text);
            let forward = apply(old_text, std::slice::from_ref(&patch), false)
                .expect("forward apply should succeed");
            assert_eq!(forward, new_text, "failed scenario old={old_text:?} new={new_text:?}");

            let backward = apply(new_text, std::slice::from_ref(&patch), true)
                .expect("reverse apply should succeed");
            assert_eq!(backward, old_text, "failed scenario old={old_text:?} new={new_text:?}");
        }
    }

    #[test]
    fn identical_texts_yield_an_empty_patch_that_round_trips() {
        let patch = diff("same", "same");
        assert!(patch.is_empty());

        let applied =
            apply("same", std::slice::from_ref(&patch), false).expect("identity apply should succeed");
        assert_eq!(applied, "same");
    }

    #[test]
    fn multiple_patches_replay_newest_first_in_reverse() {
        let v1 = "first";
        let v2 = "first second";
        let v3 = "first second third";

        let p1 = diff(v1, v2);
        let p2 = diff(v2, v3);

        // Newest-first is the caller's responsibility.
        let reconstructed =
            apply(v3, &[p2, p1], true).expect("reverse chain apply should succeed");
        assert_eq!(reconstructed, v1);
    }

    #[test]
    fn overrunning_copy_is_rejected_as_corrupt() {
        let patch = Patch { ops: vec![PatchOp::Copy { len: 99 }] };
        let error = apply("short", &[patch], false).expect_err("apply should fail");
        assert!(matches!(error, PatchError::Corrupt(_)));
    }

    #[test]
    fn delete_text_mismatch_is_rejected_as_corrupt() {
        let patch = Patch {
            ops: vec![PatchOp::Delete { text: "xxxxx".to_owned() }],
        };
        let error = apply("short", &[patch], false).expect_err("apply should fail");
        assert!(matches!(error, PatchError::Corrupt(_)));
    }

    #[test]
    fn underconsuming_patch_is_rejected_as_corrupt() {
        let patch = Patch { ops: vec![PatchOp::Copy { len: 2 }] };
        let error = apply("short", &[patch], false).expect_err("apply should fail");
        assert!(matches!(error, PatchError::Corrupt(_)));
    }

    #[test]
    fn json_encoding_round_trips() {
        let patch = diff("see [[Beta]]", "see [[Beta]] now");
        let encoded = patch.to_json().expect("patch should encode");
        let decoded = Patch::from_json(&encoded).expect("patch should decode");
        assert_eq!(decoded, patch);
    }

    #[test]
    fn payload_text_exposes_insert_and_delete_runs_only() {
        let patch = diff("see [[Beta]]", "now see [[Beta]] too");
        let payload = patch.payload_text();

        assert!(patch.payload_contains("now"));
        assert!(patch.payload_contains("too"));
        assert!(!payload.contains("see"), "copied text must not leak into the payload");
    }

    #[test]
    fn malformed_json_is_an_encoding_error() {
        let error = Patch::from_json("{not json").expect_err("decode should fail");
        assert!(matches!(error, PatchError::Encoding(_)));
    }
}
