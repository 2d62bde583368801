// Rows and cells: one trie node's outgoing character transitions.

use std::collections::BTreeMap;

use crate::TrieError;
use crate::format::{self, Reader};

/// One transition's payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Interned command index; -1 when the transition carries no command.
    pub cmd: i32,
    /// Merge-weight / occurrence counter.
    pub cnt: i32,
    /// Child row index; -1 for a leaf transition.
    pub child: i32,
    /// Extra characters consumed without branching when this cell is taken.
    pub skip: i32,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            cmd: -1,
            cnt: 0,
            child: -1,
            skip: 0,
        }
    }
}

impl Cell {
    /// True when the cell carries neither a command nor a child reference.
    /// Empty cells are not persisted.
    pub fn is_empty(&self) -> bool {
        self.cmd < 0 && self.child < 0
    }
}

/// Single command shared by every leaf cell of a row; see
/// [`Row::uniform_cmd`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uniform {
    pub cmd: i32,
    pub cnt: i32,
    pub skip: i32,
}

/// One trie node: an ordered map from transition character to [`Cell`].
///
/// Ordering by key keeps iteration, serialization, and the reachability
/// walk deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: BTreeMap<char, Cell>,
}

impl Row {
    pub fn new() -> Self {
        Row::default()
    }

    pub fn at(&self, ch: char) -> Option<&Cell> {
        self.cells.get(&ch)
    }

    /// Command index for `ch`, -1 if absent.
    pub fn cmd(&self, ch: char) -> i32 {
        self.cells.get(&ch).map_or(-1, |c| c.cmd)
    }

    /// Child row index for `ch`, -1 if absent.
    pub fn child(&self, ch: char) -> i32 {
        self.cells.get(&ch).map_or(-1, |c| c.child)
    }

    /// Set the command on the `ch` transition, creating the cell on
    /// demand. Resets the counter: a resolved command counts once.
    pub fn set_cmd(&mut self, ch: char, cmd: i32) {
        let cell = self.cells.entry(ch).or_default();
        cell.cmd = cmd;
        cell.cnt = if cmd >= 0 { 1 } else { 0 };
    }

    /// Point the `ch` transition at a child row, creating the cell on
    /// demand.
    pub fn set_child(&mut self, ch: char, child: i32) {
        self.cells.entry(ch).or_default().child = child;
    }

    pub(crate) fn insert_cell(&mut self, ch: char, cell: Cell) {
        self.cells.insert(ch, cell);
    }

    pub fn cells(&self) -> impl Iterator<Item = (&char, &Cell)> {
        self.cells.iter()
    }

    /// Number of cells, including any that would not be persisted.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Probe the row for a single shared command.
    ///
    /// Returns the command every command-carrying cell agrees on, with
    /// the number of agreeing cells and their skip, or `None` when any
    /// cell still references a child, two commands disagree, or (with
    /// `eq_skip`) two skips disagree. Rows with no commands at all also
    /// yield `None`.
    pub fn uniform_cmd(&self, eq_skip: bool) -> Option<Uniform> {
        let mut ret: Option<Uniform> = None;
        for cell in self.cells.values() {
            if cell.child >= 0 {
                return None;
            }
            if cell.cmd < 0 {
                continue;
            }
            match ret {
                None => {
                    ret = Some(Uniform {
                        cmd: cell.cmd,
                        cnt: 1,
                        skip: cell.skip,
                    });
                }
                Some(ref mut u) => {
                    if u.cmd != cell.cmd {
                        return None;
                    }
                    if eq_skip && u.skip != cell.skip {
                        return None;
                    }
                    u.cnt += 1;
                }
            }
        }
        ret
    }

    /// Copy of this row with every child reference rewritten through
    /// `map` (old row index → new row index).
    pub fn remap(&self, map: &[i32]) -> Row {
        let mut out = Row::new();
        for (&ch, cell) in &self.cells {
            let mut c = cell.clone();
            if c.child >= 0 {
                c.child = map[c.child as usize];
            }
            out.cells.insert(ch, c);
        }
        out
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        let live = self.cells.values().filter(|c| !c.is_empty()).count();
        format::write_i32(out, live as i32);
        for (&ch, cell) in &self.cells {
            if cell.is_empty() {
                continue;
            }
            format::write_char(out, ch);
            format::write_i32(out, cell.cmd);
            format::write_i32(out, cell.cnt);
            format::write_i32(out, cell.child);
            format::write_i32(out, cell.skip);
        }
    }

    pub fn read(r: &mut Reader) -> Result<Row, TrieError> {
        let count = r.read_i32()?;
        if count < 0 {
            return Err(TrieError::NegativeCount(count));
        }
        let mut row = Row::new();
        for _ in 0..count {
            let ch = r.read_char()?;
            let cmd = r.read_i32()?;
            let cnt = r.read_i32()?;
            let child = r.read_i32()?;
            let skip = r.read_i32()?;
            row.cells.insert(
                ch,
                Cell {
                    cmd,
                    cnt,
                    child,
                    skip,
                },
            );
        }
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_cmd_counts_once() {
        let mut row = Row::new();
        row.set_cmd('s', 3);
        assert_eq!(row.cmd('s'), 3);
        assert_eq!(row.at('s').unwrap().cnt, 1);
        row.set_cmd('s', 5);
        assert_eq!(row.cmd('s'), 5);
        assert_eq!(row.at('s').unwrap().cnt, 1);
    }

    #[test]
    fn missing_cells_are_negative() {
        let row = Row::new();
        assert_eq!(row.cmd('x'), -1);
        assert_eq!(row.child('x'), -1);
    }

    #[test]
    fn uniform_row_with_agreeing_commands() {
        let mut row = Row::new();
        row.set_cmd('a', 2);
        row.set_cmd('b', 2);
        let u = row.uniform_cmd(false).unwrap();
        assert_eq!(u.cmd, 2);
        assert_eq!(u.cnt, 2);
    }

    #[test]
    fn uniform_rejects_disagreement_and_children() {
        let mut row = Row::new();
        row.set_cmd('a', 2);
        row.set_cmd('b', 3);
        assert_eq!(row.uniform_cmd(false), None);

        let mut row = Row::new();
        row.set_cmd('a', 2);
        row.set_child('b', 7);
        assert_eq!(row.uniform_cmd(false), None);
    }

    #[test]
    fn uniform_skip_sensitivity() {
        let mut row = Row::new();
        row.insert_cell(
            'a',
            Cell {
                cmd: 2,
                cnt: 1,
                child: -1,
                skip: 1,
            },
        );
        row.insert_cell(
            'b',
            Cell {
                cmd: 2,
                cnt: 1,
                child: -1,
                skip: 2,
            },
        );
        assert!(row.uniform_cmd(false).is_some());
        assert_eq!(row.uniform_cmd(true), None);
    }

    #[test]
    fn remap_rewrites_children() {
        let mut row = Row::new();
        row.set_child('a', 2);
        row.set_cmd('b', 0);
        let map = vec![-1, -1, 5];
        let out = row.remap(&map);
        assert_eq!(out.child('a'), 5);
        assert_eq!(out.cmd('b'), 0);
    }

    #[test]
    fn round_trip_skips_empty_cells() {
        let mut row = Row::new();
        row.set_cmd('s', 1);
        row.set_child('t', 4);
        // An empty cell: no command, no child.
        row.insert_cell('u', Cell::default());

        let mut buf = Vec::new();
        row.write(&mut buf);
        let mut r = Reader::new(&buf);
        let loaded = Row::read(&mut r).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.cmd('s'), 1);
        assert_eq!(loaded.child('t'), 4);
        assert!(loaded.at('u').is_none());
    }
}
