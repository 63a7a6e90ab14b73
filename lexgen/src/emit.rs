//! Textual code emission. Accumulation is plain `String` + `write!` rather than a templating
//! dependency — the output shape is fixed and simple enough that a template engine would add a
//! dependency without buying readability.

use std::fmt::Write as _;
use std::rc::Rc;

use crate::cp::{Alphabet, EOF_SENTINEL};
use crate::dfa::Dfa;

/// Emits `tokens.h`: an enumeration of every rule name, `ERROR` first, in declaration order.
pub fn emit_header(rule_names: &[Rc<str>]) -> String {
    let mut out = String::new();
    out.push_str("#pragma once\n\nenum class token {\n    ERROR,\n");
    for name in rule_names {
        let _ = writeln!(out, "    {name},");
    }
    out.push_str("};\n");
    out
}

/// Emits `lexer.cc`: the scanner body implementing longest-match tokenisation over `dfa`, with
/// `alphabet` used to turn each transition's alphabet index back into the code-point range it
/// stands for.
pub fn emit_source(dfa: &Dfa, alphabet: &Alphabet) -> String {
    let mut out = String::new();
    out.push_str("#include \"tokens.h\"\n\n");
    out.push_str("token scan(stream& s, std::size_t& length) {\n");
    out.push_str("    const std::size_t start = s.pos();\n");
    let _ = writeln!(out, "    int state = {};", dfa.initial);
    out.push_str("    for (;;) {\n");
    out.push_str("        const std::uint32_t n = s.get();\n");
    out.push_str("        switch (state) {\n");

    for state in 0..dfa.state_count {
        if Some(state) == dfa.trap {
            continue;
        }
        emit_state(&mut out, dfa, alphabet, state);
    }

    out.push_str("        default:\n");
    out.push_str("            return token::ERROR;\n");
    out.push_str("        }\n");
    out.push_str("    }\n");
    out.push_str("}\n");
    out
}

fn emit_state(out: &mut String, dfa: &Dfa, alphabet: &Alphabet, state: u16) {
    let accepting = dfa.is_final(state);

    let _ = writeln!(out, "        case {state}: {{");
    out.push_str("            switch (n) {\n");

    for &(label, to) in &dfa.edges[state as usize] {
        // Longest match: an accepting state's transitions into the trap are omitted here and
        // fall through to the default branch's return instead — accept only when no longer
        // match is possible.
        if accepting && Some(to) == dfa.trap {
            continue;
        }
        let range = alphabet
            .get(label as usize)
            .expect("every DFA edge label is a valid alphabet index");
        let case_label = if range.len() == 1 {
            format!("{:#x}", range.lo)
        } else {
            format!("{:#x} ... {:#x}", range.lo, range.hi - 1)
        };
        let _ = writeln!(out, "            case {case_label}: state = {to}; break;");
    }

    if !accepting {
        // End-of-input is only specially handled for non-accepting states. An accepting state
        // falls through the default branch below to its longest-match return instead, even on
        // EOF.
        let _ = writeln!(
            out,
            "            case {EOF_SENTINEL:#x}: return token::ERROR;"
        );
    }

    out.push_str("            default:\n");
    if accepting {
        let name = &dfa.dfa_final[&state];
        out.push_str("                s.unget();\n");
        out.push_str("                length = s.pos() - start;\n");
        let _ = writeln!(out, "                return token::{name};");
    } else {
        let trap = dfa.trap.unwrap_or(state);
        let _ = writeln!(out, "                state = {trap};");
        out.push_str("                break;\n");
    }
    out.push_str("            }\n");
    out.push_str("            break;\n");
    out.push_str("        }\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::powerset;
    use crate::cp::Alphabet;
    use crate::dfa::tag;
    use crate::nfa::NfaBuilder;
    use crate::rules::read_rules;
    use std::collections::HashMap;

    fn compile(src: &str) -> (Dfa, Alphabet, Vec<Rc<str>>) {
        let rule_set = read_rules(src).unwrap();
        let names: Vec<Rc<str>> = rule_set.rules.iter().map(|r| r.name.clone()).collect();
        let priority: HashMap<Rc<str>, usize> = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();

        let alphabet = Alphabet::partition(rule_set.boundary_points());
        let (nfa, final_name) = NfaBuilder::build(rule_set, &alphabet).unwrap();
        let (mut dfa, subsets) = powerset(&nfa).unwrap();
        tag(&mut dfa, &subsets, &final_name, &priority);
        (dfa, alphabet, names)
    }

    #[test]
    fn header_lists_error_first_then_rules_in_order() {
        let (_, _, names) = compile("KW_IF if\nIDENT [a-z]+");
        let header = emit_header(&names);
        let error_pos = header.find("ERROR").unwrap();
        let if_pos = header.find("KW_IF").unwrap();
        let ident_pos = header.find("IDENT").unwrap();
        assert!(error_pos < if_pos);
        assert!(if_pos < ident_pos);
    }

    #[test]
    fn source_omits_trap_transitions_for_accepting_states() {
        let (dfa, alphabet, _) = compile("KW_IF if");
        let source = emit_source(&dfa, &alphabet);
        assert!(source.contains("return token::KW_IF"));
        assert!(source.contains("token::ERROR"));
    }

    #[test]
    fn every_non_trap_state_is_emitted() {
        let (dfa, alphabet, _) = compile("NUM [0-9]+");
        let source = emit_source(&dfa, &alphabet);
        let emitted_cases = (0..dfa.state_count)
            .filter(|&s| Some(s) != dfa.trap)
            .count();
        let printed = source.matches("case ").count()
            - source.matches(&format!("case {:#x}", crate::cp::EOF_SENTINEL)).count();
        // every emitted (non-trap) state contributes at least one inner case, so the count of
        // `case` occurrences attributable to states is at least the number of emitted states.
        assert!(printed >= emitted_cases);
    }
}
