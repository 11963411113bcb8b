// Myers shortest-edit-script over arbitrary comparable items.
//
// Used with `char` items for the stored patch codec and with line slices
// for the display diff.

/// One element of an edit script, tagged with the item it touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffEdit<T> {
    Equal(T),
    Insert(T),
    Delete(T),
}

pub fn myers_edits<T: PartialEq + Clone>(old_items: &[T], new_items: &[T]) -> Vec<DiffEdit<T>> {
    let old_len = old_items.len();
    let new_len = new_items.len();

    if old_len == 0 {
        return new_items.iter().cloned().map(DiffEdit::Insert).collect();
    }
    if new_len == 0 {
        return old_items.iter().cloned().map(DiffEdit::Delete).collect();
    }

    let max = old_len + new_len;
    let offset = max as isize;
    let mut v = vec![0isize; 2 * max + 1];
    let mut trace: Vec<Vec<isize>> = Vec::with_capacity(max + 1);
    let mut solved_d = 0usize;

    'outer: for d in 0..=max {
        trace.push(v.clone());

        let d_isize = d as isize;
        let mut k = -d_isize;
        while k <= d_isize {
            let k_idx = (k + offset) as usize;
            let mut x = if k == -d_isize
                || (k != d_isize && v[(k - 1 + offset) as usize] < v[(k + 1 + offset) as usize])
            {
                v[(k + 1 + offset) as usize]
            } else {
                v[(k - 1 + offset) as usize] + 1
            };
            let mut y = x - k;

            while x < old_len as isize
                && y < new_len as isize
                && old_items[x as usize] == new_items[y as usize]
            {
                x += 1;
                y += 1;
            }

            v[k_idx] = x;

            if x >= old_len as isize && y >= new_len as isize {
                solved_d = d;
                break 'outer;
            }

            k += 2;
        }
    }

    backtrack_edits(old_items, new_items, &trace, solved_d, offset)
}

fn backtrack_edits<T: PartialEq + Clone>(
    old_items: &[T],
    new_items: &[T],
    trace: &[Vec<isize>],
    solved_d: usize,
    offset: isize,
) -> Vec<DiffEdit<T>> {
    let mut edits = Vec::new();
    let mut x = old_items.len() as isize;
    let mut y = new_items.len() as isize;

    for d in (0..=solved_d).rev() {
        let v = &trace[d];
        let k = x - y;
        let d_isize = d as isize;

        let prev_k = if d == 0 {
            0
        } else if k == -d_isize
            || (k != d_isize && v[(k - 1 + offset) as usize] < v[(k + 1 + offset) as usize])
        {
            k + 1
        } else {
            k - 1
        };
        let prev_x = if d == 0 { 0 } else { v[(prev_k + offset) as usize] };
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            edits.push(DiffEdit::Equal(old_items[(x - 1) as usize].clone()));
            x -= 1;
            y -= 1;
        }

        if d == 0 {
            break;
        }

        if x == prev_x {
            edits.push(DiffEdit::Insert(new_items[(y - 1) as usize].clone()));
            y -= 1;
        } else {
            edits.push(DiffEdit::Delete(old_items[(x - 1) as usize].clone()));
            x -= 1;
        }
    }

    edits.reverse();
    edits
}
