// Interned patch-command strings, referenced by index from trie cells.

use hashbrown::HashMap;

use crate::TrieError;
use crate::format::{self, Reader};

/// Ordered, deduplicated sequence of patch-command strings.
///
/// Commands are interned once and referenced everywhere else by `i32`
/// index. Equal strings always collapse to one index, and indices are
/// assigned in first-seen order, which keeps the persisted form
/// deterministic for identical input order.
#[derive(Debug, Clone, Default)]
pub struct CommandPool {
    cmds: Vec<String>,
    index: HashMap<String, i32>,
}

impl CommandPool {
    pub fn new() -> Self {
        CommandPool::default()
    }

    /// Intern `cmd`, returning its pooled index. Re-interning an equal
    /// string returns the existing index and leaves the pool unchanged.
    pub fn intern(&mut self, cmd: &str) -> i32 {
        if let Some(&id) = self.index.get(cmd) {
            return id;
        }
        let id = self.cmds.len() as i32;
        self.cmds.push(cmd.to_string());
        self.index.insert(cmd.to_string(), id);
        id
    }

    /// Command string for a pooled index; `None` for -1 or out of range.
    pub fn get(&self, id: i32) -> Option<&str> {
        if id < 0 {
            return None;
        }
        self.cmds.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        format::write_i32(out, self.cmds.len() as i32);
        for cmd in &self.cmds {
            format::write_str(out, cmd);
        }
    }

    pub fn read(r: &mut Reader) -> Result<Self, TrieError> {
        let count = r.read_i32()?;
        if count < 0 {
            return Err(TrieError::NegativeCount(count));
        }
        let mut pool = CommandPool::new();
        for _ in 0..count {
            let cmd = r.read_str()?;
            pool.intern(&cmd);
        }
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates() {
        let mut pool = CommandPool::new();
        let a = pool.intern("Db");
        let b = pool.intern("-aDa");
        let c = pool.intern("Db");
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(c, a);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn get_negative_is_none() {
        let pool = CommandPool::new();
        assert_eq!(pool.get(-1), None);
        assert_eq!(pool.get(0), None);
    }

    #[test]
    fn round_trip_preserves_order() {
        let mut pool = CommandPool::new();
        pool.intern("Db");
        pool.intern("Rs");
        pool.intern("-a");

        let mut buf = Vec::new();
        pool.write(&mut buf);
        let mut r = Reader::new(&buf);
        let loaded = CommandPool::read(&mut r).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.get(0), Some("Db"));
        assert_eq!(loaded.get(1), Some("Rs"));
        assert_eq!(loaded.get(2), Some("-a"));
    }

    #[test]
    fn reject_negative_count() {
        let mut buf = Vec::new();
        format::write_i32(&mut buf, -3);
        let mut r = Reader::new(&buf);
        assert!(matches!(
            CommandPool::read(&mut r),
            Err(TrieError::NegativeCount(-3))
        ));
    }
}
