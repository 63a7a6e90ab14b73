//! `lexgen` compiles named token rules — literal strings and regular expressions over a
//! Unicode code-point alphabet — into a DFA, and emits C++ source for a longest-match scanner
//! built on that DFA.
//!
//! Pipeline: [rules] parsing → [cp] alphabet partitioning → [nfa] Thompson construction →
//! [automaton] powerset determinisation → [dfa] tagging → [emit] code generation. [driver]
//! wires the whole thing end to end, with [driver::compile] running it over in-memory rule
//! text and [driver::generate] additionally owning the rules-file read and the two output
//! writes.

pub mod ast;
pub mod automaton;
pub mod cp;
pub mod dfa;
pub mod driver;
pub mod emit;
pub mod error;
pub mod nfa;
pub mod rules;
pub mod unicode_classes;
