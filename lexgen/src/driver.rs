//! Orchestrates the full pipeline and owns file I/O. [generate] is what `lexgen-cli` calls;
//! [compile] is the filesystem-free half of it, useful for tests and for embedding.

use std::collections::HashMap;
use std::fs;
use std::io::Write as _;
use std::path::Path;
use std::rc::Rc;

use crate::automaton::powerset;
use crate::cp::Alphabet;
use crate::dfa::{tag, Dfa};
use crate::emit::{emit_header, emit_source};
use crate::error::{AmbiguityWarning, GenError, IoError};
use crate::nfa::NfaBuilder;
use crate::rules::read_rules;

/// Everything [generate] needs to emit `tokens.h`/`lexer.cc`, plus the ambiguity warnings
/// discovered while tagging.
pub struct CompileOutput {
    pub dfa: Dfa,
    pub alphabet: Alphabet,
    pub rule_names: Vec<Rc<str>>,
    pub warnings: Vec<AmbiguityWarning>,
}

/// Runs rule parsing through DFA tagging over already-read rule text, without touching the
/// filesystem. When `verbose`, prints each parsed rule's name and AST before compiling.
pub fn compile(src: &str, verbose: bool) -> Result<CompileOutput, GenError> {
    let rule_set = read_rules(src)?;

    if verbose {
        for rule in &rule_set.rules {
            println!("{}: {}", rule.name, rule_set.arena.display(rule.root));
        }
    }

    let rule_names: Vec<Rc<str>> = rule_set.rules.iter().map(|r| Rc::clone(&r.name)).collect();
    let priority: HashMap<Rc<str>, usize> = rule_names
        .iter()
        .enumerate()
        .map(|(i, name)| (Rc::clone(name), i))
        .collect();

    let alphabet = Alphabet::partition(rule_set.boundary_points());
    let (nfa, final_name) = NfaBuilder::build(rule_set, &alphabet)?;
    let (mut dfa, subsets) = powerset(&nfa)?;
    let warnings = tag(&mut dfa, &subsets, &final_name, &priority);

    Ok(CompileOutput {
        dfa,
        alphabet,
        rule_names,
        warnings,
    })
}

/// Reads `rules_path`, compiles it, and writes `tokens.h`/`lexer.cc` into `out_dir`. Both
/// output files are flushed and closed before returning; a failure to read the rules file,
/// create `out_dir`, write, or flush is a fatal [IoError].
pub fn generate(
    out_dir: &Path,
    rules_path: &Path,
    verbose: bool,
) -> Result<Vec<AmbiguityWarning>, GenError> {
    let src = fs::read_to_string(rules_path).map_err(|e| IoError::new(rules_path, e))?;
    let output = compile(&src, verbose)?;

    fs::create_dir_all(out_dir).map_err(|e| IoError::new(out_dir, e))?;

    write_file(&out_dir.join("tokens.h"), &emit_header(&output.rule_names))?;
    write_file(
        &out_dir.join("lexer.cc"),
        &emit_source(&output.dfa, &output.alphabet),
    )?;

    Ok(output.warnings)
}

fn write_file(path: &Path, contents: &str) -> Result<(), GenError> {
    let file = fs::File::create(path).map_err(|e| IoError::new(path, e))?;
    let mut writer = std::io::BufWriter::new(file);
    writer
        .write_all(contents.as_bytes())
        .map_err(|e| IoError::new(path, e))?;
    writer.flush().map_err(|e| IoError::new(path, e))?;
    Ok(())
}
