// The transition table: rows arena, root, direction, command pool.

use crate::TrieError;
use crate::format::{self, Reader};
use crate::pool::CommandPool;
use crate::row::Row;

/// A patch trie: an arena of [`Row`]s addressed by index plus the command
/// pool the cells point into.
///
/// `forward` selects whether keys are consumed head-to-tail or
/// tail-to-head; suffix-stripping stemmers walk tail-to-head. Rows
/// reference each other by `i32` index into the owning arena, matching
/// the persisted format.
#[derive(Debug, Clone)]
pub struct Trie {
    rows: Vec<Row>,
    cmds: CommandPool,
    root: i32,
    forward: bool,
}

impl Trie {
    pub fn new(forward: bool) -> Self {
        Trie {
            rows: vec![Row::new()],
            cmds: CommandPool::new(),
            root: 0,
            forward,
        }
    }

    pub(crate) fn from_parts(forward: bool, root: i32, cmds: CommandPool, rows: Vec<Row>) -> Self {
        Trie {
            rows,
            cmds,
            root,
            forward,
        }
    }

    pub fn forward(&self) -> bool {
        self.forward
    }

    pub fn root(&self) -> i32 {
        self.root
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn commands(&self) -> &CommandPool {
        &self.cmds
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Row::len).sum()
    }

    pub fn command_count(&self) -> usize {
        self.cmds.len()
    }

    fn row(&self, idx: i32) -> Option<&Row> {
        if idx < 0 {
            return None;
        }
        self.rows.get(idx as usize)
    }

    /// Key characters in walk order: reversed for tail-to-head tries.
    fn key_chars(&self, key: &str) -> Vec<char> {
        let mut chars: Vec<char> = key.chars().collect();
        if !self.forward {
            chars.reverse();
        }
        chars
    }

    /// Insert `key` mapping to the patch command `cmd`.
    ///
    /// Walks the key one character at a time, growing the arena with
    /// empty rows where the path does not exist yet; the last character's
    /// cell receives the interned command, overwriting any previous
    /// command at that exact transition. Empty commands and empty keys
    /// are ignored.
    pub fn insert(&mut self, key: &str, cmd: &str) {
        if cmd.is_empty() || key.is_empty() {
            return;
        }
        let id = self.cmds.intern(cmd);
        let chars = self.key_chars(key);
        let mut node = self.root;
        for &ch in &chars[..chars.len() - 1] {
            let child = self.rows[node as usize].child(ch);
            node = if child >= 0 {
                child
            } else {
                let idx = self.rows.len() as i32;
                self.rows.push(Row::new());
                self.rows[node as usize].set_child(ch, idx);
                idx
            };
        }
        self.rows[node as usize].set_cmd(chars[chars.len() - 1], id);
    }

    /// Command reached by consuming the whole key.
    ///
    /// A cell with `skip > 0` consumes that many additional characters
    /// with no branching. Returns `None` when the key runs out early,
    /// when a transition is missing, or when the last cell touched
    /// carries no command.
    pub fn get_fully(&self, key: &str) -> Option<&str> {
        let chars = self.key_chars(key);
        if chars.is_empty() {
            return None;
        }
        let mut now = self.row(self.root)?;
        let mut cmd = -1;
        let mut i = 0;
        while i < chars.len() {
            let ch = chars[i];
            i += 1;
            let cell = now.at(ch)?;
            cmd = cell.cmd;
            for _ in 0..cell.skip {
                if i < chars.len() {
                    i += 1;
                } else {
                    return None;
                }
            }
            if i < chars.len() {
                if cell.child < 0 {
                    return None;
                }
                now = self.row(cell.child)?;
            } else {
                break;
            }
        }
        self.cmds.get(cmd)
    }

    /// Most recent resolved command along the key's path.
    ///
    /// Same walk as [`get_fully`](Self::get_fully), but a dead end
    /// returns whatever command was last seen instead of nothing. This is
    /// the lookup stemmers use: the longest matching suffix rule wins.
    pub fn get_last_on_path(&self, key: &str) -> Option<&str> {
        let chars = self.key_chars(key);
        if chars.is_empty() {
            return None;
        }
        let mut now = self.row(self.root)?;
        let mut last: Option<&str> = None;
        let mut i = 0;
        while i < chars.len() {
            let ch = chars[i];
            i += 1;
            let Some(cell) = now.at(ch) else {
                return last;
            };
            if cell.cmd >= 0 {
                last = self.cmds.get(cell.cmd);
            }
            for _ in 0..cell.skip {
                if i < chars.len() {
                    i += 1;
                } else {
                    return last;
                }
            }
            if i < chars.len() {
                let Some(next) = self.row(cell.child) else {
                    return last;
                };
                now = next;
            } else {
                break;
            }
        }
        last
    }

    /// Every distinct command seen along the key's path, in encounter
    /// order. Used for inspecting ambiguous or overlapping rules.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        let chars = self.key_chars(key);
        let mut found: Vec<i32> = Vec::new();
        let Some(mut now) = self.row(self.root) else {
            return Vec::new();
        };
        let mut i = 0;
        'walk: while i < chars.len() {
            let ch = chars[i];
            i += 1;
            let Some(cell) = now.at(ch) else {
                break;
            };
            if cell.cmd >= 0 && !found.contains(&cell.cmd) {
                found.push(cell.cmd);
            }
            for _ in 0..cell.skip {
                if i < chars.len() {
                    i += 1;
                } else {
                    break 'walk;
                }
            }
            if i < chars.len() {
                let Some(next) = self.row(cell.child) else {
                    break;
                };
                now = next;
            } else {
                break;
            }
        }
        found.iter().filter_map(|&id| self.cmds.get(id)).collect()
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        format::write_bool(out, self.forward);
        format::write_i32(out, self.root);
        self.cmds.write(out);
        format::write_i32(out, self.rows.len() as i32);
        for row in &self.rows {
            row.write(out);
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write(&mut out);
        out
    }

    /// Read one trie from the reader, validating that the root and every
    /// child/command reference stays inside the table.
    pub fn read(r: &mut Reader) -> Result<Self, TrieError> {
        let forward = r.read_bool()?;
        let root = r.read_i32()?;
        let cmds = CommandPool::read(r)?;
        let count = r.read_i32()?;
        if count < 0 {
            return Err(TrieError::NegativeCount(count));
        }
        let mut rows = Vec::new();
        for _ in 0..count {
            rows.push(Row::read(r)?);
        }
        if root < 0 || root as usize >= rows.len() {
            return Err(TrieError::BadRowIndex {
                index: root,
                rows: rows.len(),
            });
        }
        for row in &rows {
            for (_, cell) in row.cells() {
                if cell.child >= rows.len() as i32 {
                    return Err(TrieError::BadRowIndex {
                        index: cell.child,
                        rows: rows.len(),
                    });
                }
                if cell.cmd >= cmds.len() as i32 {
                    return Err(TrieError::BadCommandIndex {
                        index: cell.cmd,
                        cmds: cmds.len(),
                    });
                }
            }
        }
        Ok(Trie {
            rows,
            cmds,
            root,
            forward,
        })
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, TrieError> {
        let mut r = Reader::new(data);
        Self::read(&mut r)
    }
}
