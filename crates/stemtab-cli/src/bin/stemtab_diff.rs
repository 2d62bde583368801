// stemtab-diff: Show the patch command for word/stem pairs.
//
// A debugging aid for the edit-script engine: for each pair it prints
// the computed command and the result of replaying it on the word,
// flagging any replay that does not reproduce the stem.
//
// Usage:
//   stemtab-diff [WORD STEM]
//
// With no arguments, reads `word stem` pairs from stdin, one per line.

use std::io::{self, BufRead, Write};

use stemtab_trie::diff::{self, Applied, Diff};

fn show(out: &mut impl Write, diff: &mut Diff, word: &str, stem: &str) {
    let cmd = diff.exec(word, stem);
    let mut buf: Vec<char> = word.chars().collect();
    let status = diff::apply(&mut buf, &cmd);
    let replayed: String = buf.into_iter().collect();
    let note = if status == Applied::Truncated {
        "  [truncated]"
    } else if replayed != stem {
        "  [mismatch]"
    } else {
        ""
    };
    let _ = writeln!(out, "{word} -> {stem}: {cmd:?} replays to {replayed:?}{note}");
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if stemtab_cli::wants_help(&args) {
        println!("stemtab-diff: Show the patch command for word/stem pairs.");
        println!();
        println!("Usage: stemtab-diff [WORD STEM]");
        println!();
        println!("With no arguments, reads `word stem` pairs from stdin,");
        println!("one pair per line.");
        return;
    }

    let mut diff = Diff::default();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());

    if args.len() >= 2 {
        show(&mut out, &mut diff, &args[0], &args[1]);
        return;
    }
    if args.len() == 1 {
        stemtab_cli::fatal("expected WORD STEM (two arguments) or none");
    }

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("error reading stdin: {e}");
                break;
            }
        };
        let mut tokens = line.split_whitespace();
        let (Some(word), Some(stem)) = (tokens.next(), tokens.next()) else {
            continue;
        };
        show(&mut out, &mut diff, word, stem);
    }
}
