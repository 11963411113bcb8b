// Line-level display diff for history views.
//
// Deliberately decoupled from the stored `Patch` representation: this is
// what a history page renders, not what the version log persists.

use serde::{Deserialize, Serialize};

use super::myers::{myers_edits, DiffEdit};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LineChangeKind {
    Unchanged,
    Inserted,
    Deleted,
}

/// One line of a side-by-side style comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineChange {
    pub kind: LineChangeKind,
    pub text: String,
}

/// Compare two snapshots line by line.
pub fn line_diff(old_text: &str, new_text: &str) -> Vec<LineChange> {
    let old_lines: Vec<&str> = old_text.lines().collect();
    let new_lines: Vec<&str> = new_text.lines().collect();

    myers_edits(&old_lines, &new_lines)
        .into_iter()
        .map(|edit| match edit {
            DiffEdit::Equal(line) => LineChange {
                kind: LineChangeKind::Unchanged,
                text: line.to_string(),
            },
            DiffEdit::Insert(line) => LineChange {
                kind: LineChangeKind::Inserted,
                text: line.to_string(),
            },
            DiffEdit::Delete(line) => LineChange {
                kind: LineChangeKind::Deleted,
                text: line.to_string(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{line_diff, LineChangeKind};

    #[test]
    fn reports_inserted_and_deleted_lines_around_unchanged_runs() {
        let old_text = "intro\nmiddle\noutro\n";
        let new_text = "intro\nreplacement\noutro\n";

        let changes = line_diff(old_text, new_text);

        let kinds: Vec<LineChangeKind> = changes.iter().map(|change| change.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LineChangeKind::Unchanged,
                LineChangeKind::Deleted,
                LineChangeKind::Inserted,
                LineChangeKind::Unchanged,
            ]
        );
        assert_eq!(changes[1].text, "middle");
        assert_eq!(changes[2].text, "replacement");
    }

    #[test]
    fn identical_snapshots_are_all_unchanged() {
        let changes = line_diff("a\nb\n", "a\nb\n");
        assert!(changes.iter().all(|change| change.kind == LineChangeKind::Unchanged));
        assert_eq!(changes.len(), 2);
    }
}
