// Minimization passes: reachability compaction, first-fit row merging,
// uniform-command lifting.

use crate::Reduce;
use crate::row::{Cell, Row};
use crate::trie::Trie;

/// Reachability compaction.
///
/// Renumbers rows densely in depth-first visitation order from the root
/// and drops anything unreachable. Standalone it is the identity
/// minimization; it also finishes every other pass so their outputs have
/// no gaps.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compact;

impl Reduce for Compact {
    fn optimize(&self, trie: &Trie) -> Trie {
        let (rows, remap) = remove_gaps(trie.root(), trie.rows());
        Trie::from_parts(
            trie.forward(),
            remap[trie.root() as usize],
            trie.commands().clone(),
            rows,
        )
    }
}

/// First-fit structural row merging.
///
/// Rows are processed from the highest index down (children before
/// parents, given how insertion allocates rows); each candidate is folded
/// into the first already-accepted row it merges with cleanly, otherwise
/// it is accepted as-is. Two rows merge when their shared characters
/// agree on skip, command, and child reference; counters are summed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowMerge;

impl Reduce for RowMerge {
    fn optimize(&self, trie: &Trie) -> Trie {
        let old = trie.rows();
        let mut remap = vec![0i32; old.len()];
        let mut rows: Vec<Row> = Vec::new();
        for j in (0..old.len()).rev() {
            // Children sit at higher indices and are already remapped.
            let now = old[j].remap(&remap);
            let mut merged = false;
            for i in 0..rows.len() {
                if let Some(joined) = merge_rows(&now, &rows[i]) {
                    rows[i] = joined;
                    remap[j] = i as i32;
                    merged = true;
                    break;
                }
            }
            if !merged {
                remap[j] = rows.len() as i32;
                rows.push(now);
            }
        }
        let root = remap[trie.root() as usize];
        let (rows, remap) = remove_gaps(root, &rows);
        Trie::from_parts(
            trie.forward(),
            remap[root as usize],
            trie.commands().clone(),
            rows,
        )
    }
}

/// Uniform-command lifting.
///
/// A child row whose every leaf cell agrees on one command exists only to
/// deliver that command; the referencing cell absorbs it and drops the
/// hop. With `respect_skip` the child's shared skip must also agree, the
/// consumed hop is folded into the lifted cell's skip, and cells that
/// already carry a command are left alone — a key may terminate there,
/// and growing its skip would strand that key. That keeps full-key
/// lookups intact. Without `respect_skip` the skip is cleared, which
/// shortens paths further but only preserves `get_last_on_path` results.
#[derive(Debug, Clone, Copy)]
pub struct UniformLift {
    pub respect_skip: bool,
}

impl Reduce for UniformLift {
    fn optimize(&self, trie: &Trie) -> Trie {
        let mut rows: Vec<Row> = trie.rows().to_vec();
        // Highest index first: a lifted child is final before any row
        // pointing at it is examined.
        for j in (0..rows.len()).rev() {
            let lifted: Vec<(char, Cell)> = rows[j]
                .cells()
                .filter_map(|(&ch, cell)| {
                    if cell.child < 0 {
                        return None;
                    }
                    let child = rows.get(cell.child as usize)?;
                    let u = child.uniform_cmd(self.respect_skip)?;
                    if self.respect_skip {
                        // A resolved command marks a key terminus; that
                        // key cannot also satisfy the folded skip run.
                        if cell.cmd >= 0 {
                            return None;
                        }
                    } else if cell.cmd >= 0 && cell.cmd != u.cmd {
                        return None;
                    }
                    let mut c = cell.clone();
                    c.cnt += u.cnt;
                    c.cmd = u.cmd;
                    c.child = -1;
                    c.skip = if self.respect_skip { u.skip + 1 } else { 0 };
                    Some((ch, c))
                })
                .collect();
            for (ch, cell) in lifted {
                rows[j].insert_cell(ch, cell);
            }
        }
        let (rows, remap) = remove_gaps(trie.root(), &rows);
        Trie::from_parts(
            trie.forward(),
            remap[trie.root() as usize],
            trie.commands().clone(),
            rows,
        )
    }
}

/// Depth-first walk from `root` assigning dense new indices in visitation
/// order. Returns the rewritten reachable rows and the old→new remap
/// (-1 for dropped rows).
pub(crate) fn remove_gaps(root: i32, old: &[Row]) -> (Vec<Row>, Vec<i32>) {
    let mut remap = vec![-1i32; old.len()];
    let mut order: Vec<usize> = Vec::new();
    visit(root as usize, old, &mut remap, &mut order);
    let rows = order.iter().map(|&i| old[i].remap(&remap)).collect();
    (rows, remap)
}

fn visit(idx: usize, old: &[Row], remap: &mut [i32], order: &mut Vec<usize>) {
    remap[idx] = order.len() as i32;
    order.push(idx);
    for (_, cell) in old[idx].cells() {
        if cell.child >= 0 && remap[cell.child as usize] < 0 {
            visit(cell.child as usize, old, remap, order);
        }
    }
}

/// Merge two rows cell by cell; `None` when any shared character's cells
/// conflict.
fn merge_rows(master: &Row, existing: &Row) -> Option<Row> {
    let mut out = Row::new();
    for (&ch, a) in master.cells() {
        let cell = match existing.at(ch) {
            None => a.clone(),
            Some(b) => merge_cells(a, b)?,
        };
        out.insert_cell(ch, cell);
    }
    for (&ch, b) in existing.cells() {
        if out.at(ch).is_none() {
            out.insert_cell(ch, b.clone());
        }
    }
    Some(out)
}

/// Cells merge when their skips are equal and command/child references
/// either agree or are absent on one side. Counters always sum.
fn merge_cells(m: &Cell, e: &Cell) -> Option<Cell> {
    if m.skip != e.skip {
        return None;
    }
    let cmd = if m.cmd >= 0 && e.cmd >= 0 {
        if m.cmd != e.cmd {
            return None;
        }
        m.cmd
    } else {
        m.cmd.max(e.cmd)
    };
    let child = if m.child >= 0 && e.child >= 0 {
        if m.child != e.child {
            return None;
        }
        m.child
    } else {
        m.child.max(e.child)
    };
    Some(Cell {
        cmd,
        cnt: m.cnt + e.cnt,
        child,
        skip: m.skip,
    })
}
