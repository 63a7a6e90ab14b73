//! Property tests, exercised only through `lexgen`'s public API. `regex_oracle_agrees_on_acceptance`
//! mirrors the teacher's use of the `regex` crate as a semantic oracle (`dandy/src/tests.rs`), just
//! checked against pure string acceptance rather than tokenisation, since plain `Regex::is_match`
//! has no notion of longest-match-over-several-rules to compare against.

use std::collections::HashMap;
use std::rc::Rc;

use proptest::prelude::*;

use lexgen::automaton::powerset;
use lexgen::cp::Alphabet;
use lexgen::dfa::{tag, Dfa};
use lexgen::nfa::NfaBuilder;
use lexgen::rules::read_rules;

fn atom_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("a".to_string()),
        Just("b".to_string()),
        Just("c".to_string()),
        Just("[ab]".to_string()),
        Just("[bc]".to_string()),
        Just("(a|b)".to_string()),
        Just("(b|c)".to_string()),
    ]
}

fn postfix_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just(""), Just("*"), Just("+")]
}

/// A small grammar of patterns over `{a, b, c}` — enough to exercise concatenation, alternation,
/// sets and repetition together without the state-space blowup a fully recursive generator risks.
fn pattern_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec((atom_strategy(), postfix_strategy()), 1..4)
        .prop_map(|parts| parts.into_iter().map(|(atom, post)| format!("{atom}{post}")).collect())
}

/// Runs `input` through `dfa` to completion with no longest-match shortcut, purely to answer
/// "is the whole string accepted" — the same question `^(?:pattern)$` answers for `regex`.
fn accepts(dfa: &Dfa, alphabet: &Alphabet, input: &str) -> bool {
    let mut state = dfa.initial;
    for c in input.chars() {
        let cp = c as u32;
        let Some(label) = alphabet.ranges().iter().position(|r| r.contains(cp)).map(|i| i as u32 + 1)
        else {
            return false;
        };
        let Some(&(_, to)) = dfa.edges[state as usize].iter().find(|&&(l, _)| l == label) else {
            return false;
        };
        if Some(to) == dfa.trap {
            return false;
        }
        state = to;
    }
    dfa.is_final(state)
}

fn compile_one_rule(pattern: &str) -> Option<(Dfa, Alphabet)> {
    let rules_src = format!("R {pattern}");
    let rule_set = read_rules(&rules_src).ok()?;
    let alphabet = Alphabet::partition(rule_set.boundary_points());
    let priority: HashMap<Rc<str>, usize> = HashMap::from([(Rc::from("R"), 0usize)]);
    let (nfa, final_name) = NfaBuilder::build(rule_set, &alphabet).ok()?;
    let (mut dfa, subsets) = powerset(&nfa).ok()?;
    tag(&mut dfa, &subsets, &final_name, &priority);
    Some((dfa, alphabet))
}

proptest! {
    /// Every boundary point contributed to [Alphabet::partition] becomes the start or end of some
    /// range in the result, and the result always tiles `[0, SENTINEL)` with no gaps or overlaps.
    #[test]
    fn alphabet_partition_tiles_the_code_point_space(
        boundaries in prop::collection::vec(0u32..lexgen::cp::SENTINEL, 0..12)
    ) {
        let alphabet = Alphabet::partition(boundaries.iter().copied());
        let ranges = alphabet.ranges();

        prop_assert_eq!(ranges.first().map(|r| r.lo), Some(0));
        prop_assert_eq!(ranges.last().map(|r| r.hi), Some(lexgen::cp::SENTINEL));
        for w in ranges.windows(2) {
            prop_assert_eq!(w[0].hi, w[1].lo);
        }
        for &b in &boundaries {
            let is_boundary = ranges.iter().any(|r| r.lo == b || r.hi == b);
            prop_assert!(is_boundary, "boundary {b} missing from partition");
        }
    }

    /// `epsilon_closure` is a fixed point of itself: closing an already-closed set changes nothing.
    #[test]
    fn epsilon_closure_is_a_fixed_point(pattern in pattern_strategy()) {
        let rules_src = format!("R {pattern}");
        let Ok(rule_set) = read_rules(&rules_src) else { return Ok(()); };
        let alphabet = Alphabet::partition(rule_set.boundary_points());
        let Ok((nfa, _)) = NfaBuilder::build(rule_set, &alphabet) else { return Ok(()); };

        let once = lexgen::automaton::epsilon_closure(&nfa, [nfa.initial]);
        let twice = lexgen::automaton::epsilon_closure(&nfa, once.iter().copied());
        prop_assert_eq!(once, twice);
    }

    /// A compiled single-rule DFA accepts exactly the strings `^(?:pattern)$` matches, over the
    /// `{a, b, c}` alphabet the pattern and input generators are restricted to.
    #[test]
    fn regex_oracle_agrees_on_acceptance(
        pattern in pattern_strategy(),
        input in "[abc]{0,6}",
    ) {
        let Some((dfa, alphabet)) = compile_one_rule(&pattern) else { return Ok(()); };
        let anchored = format!("^(?:{pattern})$");
        let Ok(oracle) = regex::Regex::new(&anchored) else { return Ok(()); };

        prop_assert_eq!(
            oracle.is_match(&input),
            accepts(&dfa, &alphabet, &input),
            "pattern={pattern:?} input={input:?}"
        );
    }
}
