//! Thompson construction: lowers a [RuleSet] into an NFA over the partitioned [Alphabet],
//! one state pair per AST node. The state counter lives inside [NfaBuilder] rather than a
//! process-wide static, so building several rule sets in one process never shares state.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::Rc;

use crate::ast::{AstArena, AstId, AstNode};
use crate::cp::{Alphabet, Range};
use crate::error::OverflowError;
use crate::rules::RuleSet;

/// Edge label reserved for epsilon transitions; input edges use `1..=alphabet_size`.
pub const EPSILON: u32 = 0;

/// A Thompson-constructed NFA. Transitions are stored as a vector-of-vectors indexed by the
/// `from` state, each entry a `(label, to)` pair, rather than a map keyed by a packed
/// `(from, to, label)` triple — cheaper to build incrementally and to iterate per-state.
#[derive(Debug, Clone)]
pub struct Nfa {
    pub state_count: u16,
    pub initial: u16,
    pub final_set: HashSet<u16>,
    pub alphabet_size: u32,
    pub edges: Vec<Vec<(u32, u16)>>,
}

impl Nfa {
    pub fn is_final(&self, state: u16) -> bool {
        self.final_set.contains(&state)
    }
}

/// Builds an [Nfa] from a [RuleSet] over `alphabet`. Rule roots are combined into a synthetic
/// top-level `Alt` preserving declaration order — that order is reused later as rule priority
/// (see [crate::dfa::tag]).
pub struct NfaBuilder<'a> {
    arena: &'a AstArena,
    alphabet: &'a Alphabet,
    edges: Vec<Vec<(u32, u16)>>,
    final_name: HashMap<u16, Rc<str>>,
}

impl<'a> NfaBuilder<'a> {
    pub fn build(
        rule_set: RuleSet,
        alphabet: &'a Alphabet,
    ) -> Result<(Nfa, HashMap<u16, Rc<str>>), OverflowError> {
        if alphabet.len() as u64 > u32::MAX as u64 {
            return Err(OverflowError::alphabet(alphabet.len() as u64));
        }

        let RuleSet { mut arena, rules } = rule_set;
        let mut name_map = HashMap::with_capacity(rules.len());
        let mut root_ids = Vec::with_capacity(rules.len());
        for rule in &rules {
            name_map.insert(rule.root, Rc::clone(&rule.name));
            root_ids.push(rule.root);
        }
        let synthetic_root = arena.alloc(AstNode::Alt(root_ids));

        let mut builder = NfaBuilder {
            arena: &arena,
            alphabet,
            edges: Vec::new(),
            final_name: HashMap::new(),
        };
        let (initial, _end) = builder.build_node(synthetic_root, &name_map)?;

        let final_set = builder.final_name.keys().copied().collect();
        let nfa = Nfa {
            state_count: builder.edges.len() as u16,
            initial,
            final_set,
            alphabet_size: alphabet.len() as u32,
            edges: builder.edges,
        };
        Ok((nfa, builder.final_name))
    }

    fn alloc_state(&mut self) -> Result<u16, OverflowError> {
        let idx = self.edges.len();
        if idx >= u16::MAX as usize {
            return Err(OverflowError::states(idx as u64 + 1));
        }
        self.edges.push(Vec::new());
        Ok(idx as u16)
    }

    fn add_edge(&mut self, from: u16, label: u32, to: u16) {
        self.edges[from as usize].push((label, to));
    }

    fn build_node(
        &mut self,
        id: AstId,
        name_map: &HashMap<AstId, Rc<str>>,
    ) -> Result<(u16, u16), OverflowError> {
        let (s, t) = match self.arena.get(id).clone() {
            AstNode::Set { ranges, negated } => self.build_set(&ranges, negated)?,
            AstNode::Cat(children) => self.build_cat(&children, name_map)?,
            AstNode::Alt(children) => self.build_alt(&children, name_map)?,
            AstNode::Rep {
                child,
                accept_empty,
            } => self.build_rep(child, accept_empty, name_map)?,
        };
        if let Some(name) = name_map.get(&id) {
            self.final_name.insert(t, Rc::clone(name));
        }
        Ok((s, t))
    }

    fn covered_alphabet_indices(&self, ranges: &[Range]) -> BTreeSet<usize> {
        let mut covered = BTreeSet::new();
        for r in ranges {
            if let Some((start, end)) = self.alphabet.index_range(*r) {
                covered.extend(start..=end);
            }
        }
        covered
    }

    fn build_set(&mut self, ranges: &[Range], negated: bool) -> Result<(u16, u16), OverflowError> {
        let s = self.alloc_state()?;
        let t = self.alloc_state()?;
        let covered = self.covered_alphabet_indices(ranges);
        if negated {
            for idx in 1..=self.alphabet.len() {
                if !covered.contains(&idx) {
                    self.add_edge(s, idx as u32, t);
                }
            }
        } else {
            for idx in covered {
                self.add_edge(s, idx as u32, t);
            }
        }
        Ok((s, t))
    }

    fn build_cat(
        &mut self,
        children: &[AstId],
        name_map: &HashMap<AstId, Rc<str>>,
    ) -> Result<(u16, u16), OverflowError> {
        let mut iter = children.iter();
        let first = *iter.next().expect("Cat has at least one child");
        let (start, mut prev_end) = self.build_node(first, name_map)?;
        for &child in iter {
            let (cs, ct) = self.build_node(child, name_map)?;
            self.add_edge(prev_end, EPSILON, cs);
            prev_end = ct;
        }
        Ok((start, prev_end))
    }

    fn build_alt(
        &mut self,
        children: &[AstId],
        name_map: &HashMap<AstId, Rc<str>>,
    ) -> Result<(u16, u16), OverflowError> {
        let s = self.alloc_state()?;
        let t = self.alloc_state()?;
        for &child in children {
            let (cs, ct) = self.build_node(child, name_map)?;
            self.add_edge(s, EPSILON, cs);
            self.add_edge(ct, EPSILON, t);
        }
        Ok((s, t))
    }

    fn build_rep(
        &mut self,
        child: AstId,
        accept_empty: bool,
        name_map: &HashMap<AstId, Rc<str>>,
    ) -> Result<(u16, u16), OverflowError> {
        let s = self.alloc_state()?;
        let t = self.alloc_state()?;
        let (cs, ct) = self.build_node(child, name_map)?;
        self.add_edge(s, EPSILON, cs);
        self.add_edge(ct, EPSILON, t);
        self.add_edge(ct, EPSILON, cs);
        if accept_empty {
            self.add_edge(s, EPSILON, t);
        }
        Ok((s, t))
    }
}
