// Weighted edit-script engine: turns a (word, stem) pair into a patch
// command and replays patch commands over a character buffer.
//
// A patch command is a sequence of 2-character tokens `(opcode, param)`:
//   `-N`  skip N already-equal characters
//   `DN`  delete the next N characters
//   `Ic`  insert the literal character c
//   `Rc`  replace the current character with the literal c
// Run lengths 1..=26 are encoded as `'a'..='z'`; longer runs spill into
// additional maximal tokens.

/// Longest run a single token parameter can encode.
const MAX_RUN: u32 = 26;

/// Cost of a mismatching no-op candidate; high enough that a genuine
/// replace or delete/insert pair always wins.
const MISMATCH: i32 = 100;

/// Outcome of replaying a patch command over a buffer.
///
/// A command that references positions outside the buffer stops the
/// replay and leaves the buffer in whatever partial state it reached;
/// the truncation is reported, never propagated as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Complete,
    Truncated,
}

/// Dynamic-programming edit-distance engine with configurable weights.
///
/// The cost and choice tables are kept between calls and regrown on
/// demand, so one engine can churn through a whole dictionary without
/// reallocating per pair.
#[derive(Debug, Clone)]
pub struct Diff {
    ins: i32,
    del: i32,
    rep: i32,
    noop: i32,
    net: Vec<i32>,
    way: Vec<u8>,
    width: usize,
}

impl Default for Diff {
    fn default() -> Self {
        Diff::new(1, 1, 1, 0)
    }
}

impl Diff {
    pub fn new(ins: i32, del: i32, rep: i32, noop: i32) -> Self {
        Diff {
            ins,
            del,
            rep,
            noop,
            net: Vec::new(),
            way: Vec::new(),
            width: 0,
        }
    }

    /// Compute the minimal patch command transforming `word` into `stem`.
    ///
    /// The returned command is ordered from the end of `word` toward its
    /// start, matching how [`apply`] replays it.
    pub fn exec(&mut self, word: &str, stem: &str) -> String {
        let a: Vec<char> = word.chars().collect();
        let b: Vec<char> = stem.chars().collect();
        let sizex = a.len() + 1;
        let sizey = b.len() + 1;
        self.grow(sizex, sizey);

        for x in 0..sizex {
            self.set(x, 0, x as i32, b'X');
        }
        for y in 0..sizey {
            self.set(0, y, y as i32, b'Y');
        }

        for x in 1..sizex {
            for y in 1..sizey {
                let diag = self.net(x - 1, y - 1);
                let cost_d = diag + if a[x - 1] == b[y - 1] { self.noop } else { MISMATCH };
                let cost_x = self.net(x - 1, y) + self.del;
                let cost_y = self.net(x, y - 1) + self.ins;
                let cost_r = diag + self.rep;

                // The tie-break order decides which of several equally
                // cheap scripts wins, and with it the shape of the trie
                // built from the scripts. Keep it exactly as is.
                let mut cost = cost_d;
                let mut way = b'D';
                if cost_x <= cost {
                    cost = cost_x;
                    way = b'X';
                }
                if cost_y < cost {
                    cost = cost_y;
                    way = b'Y';
                }
                if cost_r < cost {
                    cost = cost_r;
                    way = b'R';
                }
                self.set(x, y, cost, way);
            }
        }

        let mut result = String::new();
        let mut deletes: u32 = 0;
        let mut equals: u32 = 0;
        let mut x = sizex - 1;
        let mut y = sizey - 1;
        while x > 0 || y > 0 {
            match self.way(x, y) {
                b'X' => {
                    flush_run(&mut result, '-', &mut equals);
                    deletes += 1;
                    x -= 1;
                }
                b'Y' => {
                    flush_run(&mut result, '-', &mut equals);
                    flush_run(&mut result, 'D', &mut deletes);
                    result.push('I');
                    result.push(b[y - 1]);
                    y -= 1;
                }
                b'R' => {
                    flush_run(&mut result, '-', &mut equals);
                    flush_run(&mut result, 'D', &mut deletes);
                    result.push('R');
                    result.push(b[y - 1]);
                    x -= 1;
                    y -= 1;
                }
                _ => {
                    flush_run(&mut result, 'D', &mut deletes);
                    equals += 1;
                    x -= 1;
                    y -= 1;
                }
            }
        }
        // A trailing equal run reaches the start of the word and needs no
        // token; a trailing delete run still has to be emitted.
        flush_run(&mut result, 'D', &mut deletes);
        result
    }

    /// Total weighted cost of the last computed script, straight from the
    /// cost table.
    pub fn last_cost(&self, word_len: usize, stem_len: usize) -> i32 {
        self.net(word_len, stem_len)
    }

    fn grow(&mut self, sizex: usize, sizey: usize) {
        let needed = sizex * sizey;
        if self.net.len() < needed {
            self.net.resize(needed, 0);
            self.way.resize(needed, 0);
        }
        self.width = sizey;
    }

    fn net(&self, x: usize, y: usize) -> i32 {
        self.net[x * self.width + y]
    }

    fn way(&self, x: usize, y: usize) -> u8 {
        self.way[x * self.width + y]
    }

    fn set(&mut self, x: usize, y: usize, cost: i32, way: u8) {
        self.net[x * self.width + y] = cost;
        self.way[x * self.width + y] = way;
    }
}

/// Append run-length tokens for `op`, spilling counts above 26 into
/// additional maximal tokens, and reset the counter.
fn flush_run(out: &mut String, op: char, count: &mut u32) {
    let mut n = *count;
    while n > MAX_RUN {
        out.push(op);
        out.push('z');
        n -= MAX_RUN;
    }
    if n > 0 {
        out.push(op);
        out.push(encode_run(n));
    }
    *count = 0;
}

fn encode_run(n: u32) -> char {
    (b'a' + (n as u8) - 1) as char
}

fn decode_run(param: char) -> Option<usize> {
    if param.is_ascii_lowercase() {
        Some(param as usize - 'a' as usize + 1)
    } else {
        None
    }
}

/// Replay a patch command over `buffer`, acting from the end toward the
/// start. Out-of-range accesses stop the replay with
/// [`Applied::Truncated`] and leave the partial buffer in place.
pub fn apply(buffer: &mut Vec<char>, cmd: &str) -> Applied {
    if cmd.is_empty() {
        return Applied::Complete;
    }
    let tokens: Vec<char> = cmd.chars().collect();
    // May start at -1 for an empty buffer; inserts still land at index 0.
    let mut pos = buffer.len() as isize - 1;
    let mut i = 0;
    while i + 1 < tokens.len() {
        let op = tokens[i];
        let param = tokens[i + 1];
        i += 2;
        match op {
            '-' => {
                let Some(n) = decode_run(param) else {
                    return Applied::Truncated;
                };
                // Only moves the cursor; range checks happen at the next
                // actual buffer access.
                pos = pos - n as isize + 1;
            }
            'R' => {
                if pos < 0 || pos >= buffer.len() as isize {
                    return Applied::Truncated;
                }
                buffer[pos as usize] = param;
            }
            'D' => {
                let Some(n) = decode_run(param) else {
                    return Applied::Truncated;
                };
                let end = pos;
                let start = pos - n as isize + 1;
                if start < 0 || end >= buffer.len() as isize || end < start {
                    return Applied::Truncated;
                }
                buffer.drain(start as usize..=end as usize);
                pos = start;
            }
            'I' => {
                let at = pos + 1;
                if at < 0 || at > buffer.len() as isize {
                    return Applied::Truncated;
                }
                buffer.insert(at as usize, param);
                pos = at;
            }
            _ => return Applied::Truncated,
        }
        pos -= 1;
    }
    Applied::Complete
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(word: &str, stem: &str) -> String {
        let mut diff = Diff::default();
        let cmd = diff.exec(word, stem);
        let mut buf: Vec<char> = word.chars().collect();
        assert_eq!(apply(&mut buf, &cmd), Applied::Complete, "cmd {cmd:?}");
        buf.into_iter().collect()
    }

    #[test]
    fn suffix_strip() {
        let mut diff = Diff::default();
        assert_eq!(diff.exec("teacher", "teach"), "Db");
        assert_eq!(round_trip("teacher", "teach"), "teach");
    }

    #[test]
    fn running_to_run() {
        assert_eq!(round_trip("running", "run"), "run");
    }

    #[test]
    fn identical_words_empty_script() {
        let mut diff = Diff::default();
        assert_eq!(diff.exec("stone", "stone"), "");
    }

    #[test]
    fn replace_and_insert() {
        assert_eq!(round_trip("ponies", "pony"), "pony");
        assert_eq!(round_trip("mice", "mouse"), "mouse");
        assert_eq!(round_trip("geese", "goose"), "goose");
    }

    #[test]
    fn empty_sides() {
        assert_eq!(round_trip("abc", ""), "");
        assert_eq!(round_trip("", "abc"), "abc");
    }

    #[test]
    fn unicode_pairs() {
        assert_eq!(round_trip("kävely", "kävellä"), "kävellä");
        assert_eq!(round_trip("häuser", "haus"), "haus");
    }

    #[test]
    fn cost_never_exceeds_table_value() {
        let pairs = [
            ("teacher", "teach"),
            ("running", "run"),
            ("mice", "mouse"),
            ("abcdef", "xyz"),
            ("", "abc"),
        ];
        for (word, stem) in pairs {
            let mut diff = Diff::default();
            let cmd = diff.exec(word, stem);
            let table = diff.last_cost(word.chars().count(), stem.chars().count());
            assert!(script_cost(&cmd) <= table, "{word}->{stem}: {cmd:?}");
        }
    }

    /// Weighted cost of a command under the default (1,1,1,0) weights.
    fn script_cost(cmd: &str) -> i32 {
        let tokens: Vec<char> = cmd.chars().collect();
        let mut cost = 0;
        let mut i = 0;
        while i + 1 < tokens.len() {
            match tokens[i] {
                'D' => cost += decode_run(tokens[i + 1]).unwrap() as i32,
                'I' | 'R' => cost += 1,
                _ => {}
            }
            i += 2;
        }
        cost
    }

    #[test]
    fn long_runs_spill_into_multiple_tokens() {
        let word: String = std::iter::repeat_n('x', 30).collect();
        let mut diff = Diff::default();
        let cmd = diff.exec(&word, "");
        assert_eq!(cmd, "DzDd");
        let mut buf: Vec<char> = word.chars().collect();
        assert_eq!(apply(&mut buf, &cmd), Applied::Complete);
        assert!(buf.is_empty());
    }

    #[test]
    fn exhaustive_short_ascii_round_trips() {
        let alphabet = ['a', 'b', 'c'];
        let mut words = vec![String::new()];
        for _ in 0..3 {
            let mut next = Vec::new();
            for w in &words {
                for &ch in &alphabet {
                    let mut n = w.clone();
                    n.push(ch);
                    next.push(n);
                }
            }
            words.extend(next);
        }
        let mut diff = Diff::default();
        for w in &words {
            for s in &words {
                let cmd = diff.exec(w, s);
                let mut buf: Vec<char> = w.chars().collect();
                apply(&mut buf, &cmd);
                let got: String = buf.into_iter().collect();
                assert_eq!(&got, s, "word {w:?} stem {s:?} cmd {cmd:?}");
            }
        }
    }

    #[test]
    fn truncated_apply_keeps_partial_buffer() {
        let mut buf: Vec<char> = "ab".chars().collect();
        // Asks to delete four characters from a two-character buffer.
        assert_eq!(apply(&mut buf, "Dd"), Applied::Truncated);
        assert_eq!(buf, vec!['a', 'b']);
    }

    #[test]
    fn apply_on_empty_buffer() {
        let mut buf: Vec<char> = Vec::new();
        assert_eq!(apply(&mut buf, "Da"), Applied::Truncated);
        assert!(buf.is_empty());

        let mut buf: Vec<char> = Vec::new();
        assert_eq!(apply(&mut buf, "IcIbIa"), Applied::Complete);
        let got: String = buf.into_iter().collect();
        assert_eq!(got, "abc");
    }

    #[test]
    fn odd_length_command_ignores_trailing_opcode() {
        let mut buf: Vec<char> = "abc".chars().collect();
        assert_eq!(apply(&mut buf, "DaD"), Applied::Complete);
        let got: String = buf.into_iter().collect();
        assert_eq!(got, "ab");
    }
}
