// stemtab-cli: shared utilities for the table compiler and query tools.

use std::process;

use stemtab_trie::diff::{self, Diff};
use stemtab_trie::format::{self, Reader};
use stemtab_trie::multi::MultiTrie2;
use stemtab_trie::reduce::{RowMerge, UniformLift};
use stemtab_trie::trie::Trie;
use stemtab_trie::{Reduce, TrieError};

/// Parsed compile flag token.
///
/// The token is uppercased, then read left to right: an optional `-`
/// (walk keys tail-to-head), an optional `0` (also store each stem with
/// an identity command), an optional `M` (layered table). Whatever
/// remains is the reduction pass sequence, one letter per pass.
#[derive(Debug, Clone)]
pub struct CompileFlags {
    /// The normalized flag string, persisted verbatim in the output file.
    pub raw: String,
    pub backward: bool,
    pub store_identity: bool,
    pub layered: bool,
    pub passes: String,
}

impl CompileFlags {
    pub fn parse(token: &str) -> CompileFlags {
        let raw = token.to_uppercase();
        let mut rest = raw.as_str();
        let backward = rest.starts_with('-');
        if backward {
            rest = &rest[1..];
        }
        let store_identity = rest.starts_with('0');
        if store_identity {
            rest = &rest[1..];
        }
        let layered = rest.starts_with('M');
        if layered {
            rest = &rest[1..];
        }
        let passes = rest.to_string();
        CompileFlags {
            raw,
            backward,
            store_identity,
            layered,
            passes,
        }
    }
}

/// Look up the reduction pass a flag letter selects.
///
/// `2` and `G` are accepted in flag strings for compatibility but have
/// no reduction here; the driver warns and moves on.
pub fn pass_for(letter: char) -> Option<Box<dyn Reduce>> {
    match letter {
        '1' => Some(Box::new(RowMerge)),
        'L' => Some(Box::new(UniformLift { respect_skip: true })),
        'E' => Some(Box::new(UniformLift {
            respect_skip: false,
        })),
        _ => None,
    }
}

/// A stemming table under construction or loaded from disk: either a
/// single trie or the command-aligned layered variant.
pub enum Lexicon {
    Single(Trie),
    Layered(MultiTrie2),
}

impl Lexicon {
    pub fn new(flags: &CompileFlags) -> Lexicon {
        if flags.layered {
            Lexicon::Layered(MultiTrie2::new(!flags.backward))
        } else {
            Lexicon::Single(Trie::new(!flags.backward))
        }
    }

    /// Insert one (key, command) pair. Returns `false` when the layered
    /// table rejects the command; the caller decides whether to report.
    pub fn insert(&mut self, key: &str, cmd: &str) -> bool {
        match self {
            Lexicon::Single(trie) => {
                trie.insert(key, cmd);
                true
            }
            Lexicon::Layered(multi) => multi.insert(key, cmd).is_ok(),
        }
    }

    pub fn get_last_on_path(&self, key: &str) -> Option<String> {
        match self {
            Lexicon::Single(trie) => trie.get_last_on_path(key).map(str::to_string),
            Lexicon::Layered(multi) => multi.get_last_on_path(key),
        }
    }

    pub fn reduce(&self, pass: &dyn Reduce) -> Lexicon {
        match self {
            Lexicon::Single(trie) => Lexicon::Single(pass.optimize(trie)),
            Lexicon::Layered(multi) => Lexicon::Layered(multi.reduce(pass)),
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        match self {
            Lexicon::Single(trie) => trie.write(out),
            Lexicon::Layered(multi) => multi.write(out),
        }
    }

    pub fn read(layered: bool, r: &mut Reader) -> Result<Lexicon, TrieError> {
        if layered {
            Ok(Lexicon::Layered(MultiTrie2::read(r)?))
        } else {
            Ok(Lexicon::Single(Trie::read(r)?))
        }
    }

    /// One-line size summary: rows, cells, distinct commands, layers.
    pub fn stats(&self) -> String {
        match self {
            Lexicon::Single(trie) => format!(
                "{} rows, {} cells, {} commands",
                trie.row_count(),
                trie.cell_count(),
                trie.command_count()
            ),
            Lexicon::Layered(multi) => {
                let rows: usize = multi.layers().iter().map(Trie::row_count).sum();
                let cells: usize = multi.layers().iter().map(Trie::cell_count).sum();
                format!(
                    "{} layers, {} rows, {} cells",
                    multi.layer_count(),
                    rows,
                    cells
                )
            }
        }
    }
}

/// Per-file compile summary.
pub struct CompileReport {
    pub lines: usize,
    pub inserted: usize,
    pub rejected: usize,
}

/// Feed one dictionary line into the table.
///
/// The line is `stem word word …`, lowercased before diffing; a word
/// equal to its stem is skipped (the identity flag covers it instead).
pub fn compile_line(
    lexicon: &mut Lexicon,
    diff: &mut Diff,
    flags: &CompileFlags,
    line: &str,
    report: &mut CompileReport,
) {
    let lower = line.to_lowercase();
    let mut tokens = lower.split_whitespace();
    let Some(stem) = tokens.next() else {
        return;
    };
    report.lines += 1;
    if flags.store_identity {
        if lexicon.insert(stem, "-a") {
            report.inserted += 1;
        } else {
            report.rejected += 1;
        }
    }
    for word in tokens {
        if word == stem {
            continue;
        }
        let cmd = diff.exec(word, stem);
        if lexicon.insert(word, &cmd) {
            report.inserted += 1;
        } else {
            report.rejected += 1;
        }
    }
}

/// Compile one dictionary file into `<path>.out`.
///
/// Returns the report on success; any I/O problem is returned as a
/// message so the driver can keep going with the remaining files.
pub fn compile_file(flags: &CompileFlags, path: &str) -> Result<CompileReport, String> {
    let text =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read {path}: {e}"))?;

    let mut lexicon = Lexicon::new(flags);
    let mut diff = Diff::default();
    let mut report = CompileReport {
        lines: 0,
        inserted: 0,
        rejected: 0,
    };
    for line in text.lines() {
        compile_line(&mut lexicon, &mut diff, flags, line, &mut report);
    }

    for letter in flags.passes.chars() {
        match pass_for(letter) {
            Some(pass) => lexicon = lexicon.reduce(pass.as_ref()),
            None => eprintln!("warning: no reduction for pass letter {letter:?}, skipping"),
        }
    }

    let mut out = Vec::new();
    format::write_str(&mut out, &flags.raw);
    lexicon.write(&mut out);
    let out_path = format!("{path}.out");
    std::fs::write(&out_path, &out).map_err(|e| format!("failed to write {out_path}: {e}"))?;

    eprintln!("{out_path}: {}", lexicon.stats());
    Ok(report)
}

/// Load a compiled table: the flag string it was built with plus the
/// deserialized table itself.
pub fn load_table(path: &str) -> Result<(CompileFlags, Lexicon), String> {
    let bytes = std::fs::read(path).map_err(|e| format!("failed to read {path}: {e}"))?;
    let mut r = Reader::new(&bytes);
    let raw = r
        .read_str()
        .map_err(|e| format!("bad table header in {path}: {e}"))?;
    let flags = CompileFlags::parse(&raw);
    let lexicon = Lexicon::read(flags.layered, &mut r)
        .map_err(|e| format!("bad table in {path}: {e}"))?;
    Ok((flags, lexicon))
}

/// Stem one word against a loaded table.
///
/// Lowercases, walks with the last-command-on-path lookup, and replays
/// the patch. A truncated replay keeps its partial buffer; only an
/// empty result counts as "no stem".
pub fn stem_word(lexicon: &Lexicon, word: &str) -> Option<String> {
    let lower = word.to_lowercase();
    let cmd = lexicon.get_last_on_path(&lower)?;
    let mut buf: Vec<char> = lower.chars().collect();
    let _ = diff::apply(&mut buf, &cmd);
    if buf.is_empty() {
        None
    } else {
        Some(buf.into_iter().collect())
    }
}

/// Print an error message and exit with code 1.
pub fn fatal(msg: &str) -> ! {
    eprintln!("error: {msg}");
    process::exit(1);
}

/// Check if `--help` or `-h` is in the args.
pub fn wants_help(args: &[String]) -> bool {
    args.iter().any(|a| a == "--help" || a == "-h")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_token_prefixes() {
        let f = CompileFlags::parse("-0M1L");
        assert!(f.backward);
        assert!(f.store_identity);
        assert!(f.layered);
        assert_eq!(f.passes, "1L");
        assert_eq!(f.raw, "-0M1L");
    }

    #[test]
    fn flag_token_is_uppercased() {
        let f = CompileFlags::parse("-0m1l");
        assert!(f.layered);
        assert_eq!(f.passes, "1L");
        assert_eq!(f.raw, "-0M1L");
    }

    #[test]
    fn flag_prefixes_are_positional() {
        // `0` before `-` is not a direction prefix; it all becomes passes.
        let f = CompileFlags::parse("M2");
        assert!(!f.backward);
        assert!(!f.store_identity);
        assert!(f.layered);
        assert_eq!(f.passes, "2");
    }

    #[test]
    fn unknown_pass_letters_select_nothing() {
        assert!(pass_for('1').is_some());
        assert!(pass_for('L').is_some());
        assert!(pass_for('E').is_some());
        assert!(pass_for('2').is_none());
        assert!(pass_for('G').is_none());
        assert!(pass_for('X').is_none());
    }

    fn build(flags: &CompileFlags, lines: &[&str]) -> (Lexicon, CompileReport) {
        let mut lexicon = Lexicon::new(flags);
        let mut diff = Diff::default();
        let mut report = CompileReport {
            lines: 0,
            inserted: 0,
            rejected: 0,
        };
        for line in lines {
            compile_line(&mut lexicon, &mut diff, flags, line, &mut report);
        }
        (lexicon, report)
    }

    #[test]
    fn compile_lines_and_stem() {
        let flags = CompileFlags::parse("-1");
        let (lexicon, report) = build(
            &flags,
            &[
                "teach Teacher TEACHERS teaching",
                "run running runs runner",
                "",
                "walk walk walks",
            ],
        );
        assert_eq!(report.lines, 3);
        // "walk walk" skips the identity pair.
        assert_eq!(report.inserted, 7);
        assert_eq!(report.rejected, 0);
        assert_eq!(stem_word(&lexicon, "Teachers").as_deref(), Some("teach"));
        assert_eq!(stem_word(&lexicon, "running").as_deref(), Some("run"));
        assert_eq!(stem_word(&lexicon, "walks").as_deref(), Some("walk"));
    }

    #[test]
    fn identity_flag_stores_stems() {
        let flags = CompileFlags::parse("-01");
        let (lexicon, _) = build(&flags, &["teach teacher teachers"]);
        assert_eq!(stem_word(&lexicon, "teach").as_deref(), Some("teach"));
    }

    #[test]
    fn reduced_lexicon_keeps_answers() {
        let flags = CompileFlags::parse("-1L");
        let (lexicon, _) = build(
            &flags,
            &["teach teacher teachers teaching", "run running runs"],
        );
        let mut reduced = lexicon;
        for letter in flags.passes.chars() {
            let pass = pass_for(letter).unwrap();
            reduced = reduced.reduce(pass.as_ref());
        }
        for (word, stem) in [
            ("teacher", "teach"),
            ("teachers", "teach"),
            ("teaching", "teach"),
            ("running", "run"),
            ("runs", "run"),
        ] {
            assert_eq!(stem_word(&reduced, word).as_deref(), Some(stem), "{word}");
        }
    }

    #[test]
    fn layered_lexicon_round_trips_through_bytes() {
        let flags = CompileFlags::parse("-M1");
        let (lexicon, report) = build(&flags, &["mouse mice", "teach teacher teachers"]);
        assert_eq!(report.rejected, 0);
        let reduced = lexicon.reduce(&RowMerge);

        let mut out = Vec::new();
        format::write_str(&mut out, &flags.raw);
        reduced.write(&mut out);

        let mut r = Reader::new(&out);
        let raw = r.read_str().unwrap();
        let loaded_flags = CompileFlags::parse(&raw);
        assert!(loaded_flags.layered);
        let loaded = Lexicon::read(loaded_flags.layered, &mut r).unwrap();
        assert_eq!(stem_word(&loaded, "mice").as_deref(), Some("mouse"));
        assert_eq!(stem_word(&loaded, "teachers").as_deref(), Some("teach"));
    }

    #[test]
    fn unknown_word_stems_by_suffix_analogy() {
        let flags = CompileFlags::parse("-L");
        let (lexicon, _) = build(&flags, &["walk walks", "talk talks"]);
        // Lifting pulls the shared "…s" rule toward the word end, so it
        // applies to words never inserted.
        let lifted = lexicon.reduce(&UniformLift { respect_skip: true });
        assert_eq!(stem_word(&lifted, "barks").as_deref(), Some("bark"));
    }
}
