// Layered tries: a multi-step command is split across several smaller
// tables so each layer's trie stays shallow and merges well.

use crate::format::{self, Reader};
use crate::trie::Trie;
use crate::{Reduce, TrieError};

/// Terminal marker inserted one layer past a command's final segment.
/// Deliberately outside the patch-command opcode alphabet.
const EOM: char = '*';
const EOM_NODE: &str = "*";

fn is_eom(cmd: &str) -> bool {
    let mut chars = cmd.chars();
    chars.next() == Some(EOM) && chars.next().is_none()
}

/// Fixed-width layered trie: command chunk `i` lives in layer `i`, keyed
/// by the same unmodified key at every layer.
#[derive(Debug, Clone)]
pub struct MultiTrie {
    tries: Vec<Trie>,
    forward: bool,
    by: i32,
}

impl MultiTrie {
    pub fn new(forward: bool) -> Self {
        MultiTrie {
            tries: Vec::new(),
            forward,
            by: 1,
        }
    }

    /// Chunk widths below 1 are treated as 1.
    pub fn with_chunk_width(forward: bool, by: i32) -> Self {
        MultiTrie {
            tries: Vec::new(),
            forward,
            by: by.max(1),
        }
    }

    pub fn forward(&self) -> bool {
        self.forward
    }

    pub fn layer_count(&self) -> usize {
        self.tries.len()
    }

    pub fn layers(&self) -> &[Trie] {
        &self.tries
    }

    /// Insert `cmd` for `key`, one fixed-size chunk per layer, then the
    /// terminal marker one layer past the last chunk.
    pub fn insert(&mut self, key: &str, cmd: &str) {
        if cmd.is_empty() || key.is_empty() {
            return;
        }
        let chars: Vec<char> = cmd.chars().collect();
        let by = self.by as usize;
        let levels = chars.len() / by;
        while self.tries.len() <= levels {
            self.tries.push(Trie::new(self.forward));
        }
        for i in 0..levels {
            let part: String = chars[i * by..(i + 1) * by].iter().collect();
            self.tries[i].insert(key, &part);
        }
        self.tries[levels].insert(key, EOM_NODE);
    }

    /// Query every layer in order at the same key, concatenating results;
    /// stops at the first layer that answers nothing or only the
    /// terminal marker.
    pub fn get_fully(&self, key: &str) -> Option<String> {
        self.collect(key, |trie, k| trie.get_fully(k))
    }

    pub fn get_last_on_path(&self, key: &str) -> Option<String> {
        self.collect(key, |trie, k| trie.get_last_on_path(k))
    }

    fn collect<'a, F>(&'a self, key: &str, lookup: F) -> Option<String>
    where
        F: Fn(&'a Trie, &str) -> Option<&'a str>,
    {
        let mut result = String::new();
        for trie in &self.tries {
            match lookup(trie, key) {
                Some(part) if !is_eom(part) => result.push_str(part),
                _ => break,
            }
        }
        if result.is_empty() { None } else { Some(result) }
    }

    /// Apply a reduction pass to every layer independently.
    pub fn reduce(&self, pass: &dyn Reduce) -> MultiTrie {
        MultiTrie {
            tries: self.tries.iter().map(|t| pass.optimize(t)).collect(),
            forward: self.forward,
            by: self.by,
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        write_layers(out, self.forward, self.by, &self.tries);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write(&mut out);
        out
    }

    pub fn read(r: &mut Reader) -> Result<Self, TrieError> {
        let (forward, by, tries) = read_layers(r)?;
        Ok(MultiTrie { tries, forward, by })
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, TrieError> {
        let mut r = Reader::new(data);
        Self::read(&mut r)
    }
}

/// Command-aligned layered trie.
///
/// Commands are split at skip-token boundaries instead of fixed widths:
/// each segment is either one `-N` token or a maximal run of
/// delete/insert/replace tokens, so semantically related edits stay in
/// one layer. After a layer's segment matches, the characters that
/// segment consumed are removed from the key's matched end before the
/// next layer is probed.
#[derive(Debug, Clone)]
pub struct MultiTrie2 {
    tries: Vec<Trie>,
    forward: bool,
}

impl MultiTrie2 {
    pub fn new(forward: bool) -> Self {
        MultiTrie2 {
            tries: Vec::new(),
            forward,
        }
    }

    pub fn forward(&self) -> bool {
        self.forward
    }

    pub fn layer_count(&self) -> usize {
        self.tries.len()
    }

    pub fn layers(&self) -> &[Trie] {
        &self.tries
    }

    /// Insert `cmd` for `key`, one decomposed segment per layer.
    ///
    /// Fails with [`TrieError::SegmentOrder`] when two adjacent segments
    /// continue with the same skip/delete opcode class — the
    /// decomposition upstream should have merged them, so the command is
    /// treated as corrupt rather than stored.
    pub fn insert(&mut self, key: &str, cmd: &str) -> Result<(), TrieError> {
        if cmd.is_empty() || key.is_empty() {
            return Ok(());
        }
        let parts = decompose(cmd);
        for pair in parts.windows(2) {
            let after = last_op(&pair[0]);
            let goes = first_op(&pair[1]);
            if cannot_follow(after, goes) {
                return Err(TrieError::SegmentOrder {
                    prev: pair[0].clone(),
                    next: pair[1].clone(),
                    op: goes,
                });
            }
        }
        let levels = parts.len();
        while self.tries.len() <= levels {
            self.tries.push(Trie::new(self.forward));
        }
        let mut key_now = key.to_string();
        let mut last_key = key.to_string();
        for (i, part) in parts.iter().enumerate() {
            if key_now.is_empty() {
                self.tries[i].insert(&last_key, part);
            } else {
                self.tries[i].insert(&key_now, part);
                last_key = key_now.clone();
            }
            key_now = skip_consumed(&key_now, length_pp(part), self.forward).unwrap_or_default();
        }
        if key_now.is_empty() {
            self.tries[levels].insert(&last_key, EOM_NODE);
        } else {
            self.tries[levels].insert(&key_now, EOM_NODE);
        }
        Ok(())
    }

    pub fn get_fully(&self, key: &str) -> Option<String> {
        self.collect(key, |trie, k| trie.get_fully(k))
    }

    pub fn get_last_on_path(&self, key: &str) -> Option<String> {
        self.collect(key, |trie, k| trie.get_last_on_path(k))
    }

    /// Walk the layers, trimming consumed characters between them exactly
    /// as insertion did. A segment-order violation yields the partial
    /// accumulation gathered so far.
    fn collect<'a, F>(&'a self, key: &str, lookup: F) -> Option<String>
    where
        F: Fn(&'a Trie, &str) -> Option<&'a str>,
    {
        let mut result = String::new();
        let mut key_now = key.to_string();
        let mut last_key = key_now.clone();
        let mut prev_op = ' ';
        for trie in &self.tries {
            let probe = if key_now.is_empty() { &last_key } else { &key_now };
            let Some(part) = lookup(trie, probe) else {
                break;
            };
            if is_eom(part) {
                break;
            }
            if cannot_follow(prev_op, first_op(part)) {
                break;
            }
            prev_op = last_op(part);
            result.push_str(part);
            if !key_now.is_empty() {
                last_key = key_now.clone();
            }
            key_now = skip_consumed(&key_now, length_pp(part), self.forward).unwrap_or_default();
        }
        if result.is_empty() { None } else { Some(result) }
    }

    pub fn reduce(&self, pass: &dyn Reduce) -> MultiTrie2 {
        MultiTrie2 {
            tries: self.tries.iter().map(|t| pass.optimize(t)).collect(),
            forward: self.forward,
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        // The chunk-width slot is meaningless for command-aligned
        // layers but stays in the format.
        write_layers(out, self.forward, 1, &self.tries);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write(&mut out);
        out
    }

    pub fn read(r: &mut Reader) -> Result<Self, TrieError> {
        let (forward, _by, tries) = read_layers(r)?;
        Ok(MultiTrie2 { tries, forward })
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, TrieError> {
        let mut r = Reader::new(data);
        Self::read(&mut r)
    }
}

fn write_layers(out: &mut Vec<u8>, forward: bool, by: i32, tries: &[Trie]) {
    format::write_bool(out, forward);
    format::write_i32(out, by);
    format::write_i32(out, tries.len() as i32);
    for trie in tries {
        trie.write(out);
    }
}

fn read_layers(r: &mut Reader) -> Result<(bool, i32, Vec<Trie>), TrieError> {
    let forward = r.read_bool()?;
    let by = r.read_i32()?;
    if by < 1 {
        return Err(TrieError::NegativeCount(by));
    }
    let count = r.read_i32()?;
    if count < 0 {
        return Err(TrieError::NegativeCount(count));
    }
    let mut tries = Vec::new();
    for _ in 0..count {
        tries.push(Trie::read(r)?);
    }
    Ok((forward, by, tries))
}

/// Split a command at skip-token boundaries: each segment is a single
/// `-N` token or a maximal run of non-skip tokens.
fn decompose(cmd: &str) -> Vec<String> {
    let tokens: Vec<char> = cmd.chars().collect();
    let mut parts: Vec<String> = Vec::new();
    let mut run = String::new();
    let mut i = 0;
    while i + 1 < tokens.len() {
        let op = tokens[i];
        let param = tokens[i + 1];
        if op == '-' {
            if !run.is_empty() {
                parts.push(std::mem::take(&mut run));
            }
            let mut seg = String::new();
            seg.push(op);
            seg.push(param);
            parts.push(seg);
        } else {
            run.push(op);
            run.push(param);
        }
        i += 2;
    }
    if !run.is_empty() {
        parts.push(run);
    }
    parts
}

/// Number of key characters a segment consumes: skips and deletes
/// consume their encoded count, a replace consumes one, an insert none.
fn length_pp(cmd: &str) -> usize {
    let tokens: Vec<char> = cmd.chars().collect();
    let mut len = 0;
    let mut i = 0;
    while i + 1 < tokens.len() {
        match tokens[i] {
            '-' | 'D' => len += tokens[i + 1] as usize - 'a' as usize + 1,
            'R' => len += 1,
            _ => {}
        }
        i += 2;
    }
    len
}

/// Remove `count` already-consumed characters from the matched end of
/// `key`: the head for forward tries, the tail for backward ones.
/// `None` when the key is shorter than the consumption.
fn skip_consumed(key: &str, count: usize, forward: bool) -> Option<String> {
    let chars: Vec<char> = key.chars().collect();
    if count > chars.len() {
        return None;
    }
    let kept = if forward {
        &chars[count..]
    } else {
        &chars[..chars.len() - count]
    };
    Some(kept.iter().collect())
}

/// Opcode of a segment's first token.
fn first_op(segment: &str) -> char {
    segment.chars().next().unwrap_or(' ')
}

/// Opcode of a segment's last token.
fn last_op(segment: &str) -> char {
    let chars: Vec<char> = segment.chars().collect();
    if chars.len() < 2 { ' ' } else { chars[chars.len() - 2] }
}

/// Two adjacent segments may not continue with the same skip or delete
/// opcode; the decomposition would have merged them into one run.
fn cannot_follow(after: char, goes: char) -> bool {
    matches!(after, '-' | 'D') && after == goes
}
