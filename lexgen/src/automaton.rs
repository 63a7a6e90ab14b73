//! Closures and powerset determinisation. `powerset` is an **iterative worklist**: the original
//! generator's recursive `find_state_sets`
//! (`original_source/src/compiler/generator/automaton.cc`) can overflow the call stack on
//! pathological inputs (spec §9's explicit design note); this version keeps an explicit `Vec`
//! as the unexplored-subset stack instead.

use std::collections::{HashMap, HashSet};

use crate::dfa::Dfa;
use crate::error::OverflowError;
use crate::nfa::{Nfa, EPSILON};

/// `ε*(seeds)`: the least superset of `seeds` closed under epsilon edges, as a sorted,
/// deduplicated vector — the canonical form subsets are keyed by during powerset, mirroring the
/// teacher's sorted-vec subset key (`dandy::nfa::Nfa::to_dfa`'s `set_to_vec`) rather than a raw
/// `HashSet`, so structurally-equal subsets merge.
pub fn epsilon_closure(nfa: &Nfa, seeds: impl IntoIterator<Item = u16>) -> Vec<u16> {
    let mut visited: HashSet<u16> = HashSet::new();
    let mut stack: Vec<u16> = Vec::new();
    for seed in seeds {
        if visited.insert(seed) {
            stack.push(seed);
        }
    }
    while let Some(state) = stack.pop() {
        for &(label, to) in &nfa.edges[state as usize] {
            if label == EPSILON && visited.insert(to) {
                stack.push(to);
            }
        }
    }
    let mut result: Vec<u16> = visited.into_iter().collect();
    result.sort_unstable();
    result
}

/// `move(S, a) = ⋃_{q ∈ S} { q' | (q, q', a) ∈ edges }`.
pub fn move_on(nfa: &Nfa, states: &[u16], label: u32) -> Vec<u16> {
    let mut result = Vec::new();
    for &state in states {
        for &(l, to) in &nfa.edges[state as usize] {
            if l == label {
                result.push(to);
            }
        }
    }
    result
}

/// `δ(S, a) = ε*(move(S, a))`.
pub fn input_closure(nfa: &Nfa, states: &[u16], label: u32) -> Vec<u16> {
    epsilon_closure(nfa, move_on(nfa, states, label))
}

/// Converts `nfa` to an equivalent (untagged) [Dfa] by powerset construction, plus the subset
/// each DFA state was discovered from — consumed afterward by [crate::dfa::tag] to resolve rule
/// priority. DFA state indices are assigned in discovery order starting from `S₀ = ε*(initial)`.
pub fn powerset(nfa: &Nfa) -> Result<(Dfa, Vec<Vec<u16>>), OverflowError> {
    let mut subsets: Vec<Vec<u16>> = Vec::new();
    let mut index_of: HashMap<Vec<u16>, u32> = HashMap::new();
    let mut edges: Vec<Vec<(u32, u32)>> = Vec::new();
    let mut worklist: Vec<u32> = Vec::new();
    let mut trap: Option<u32> = None;

    let initial_subset = epsilon_closure(nfa, [nfa.initial]);
    index_of.insert(initial_subset.clone(), 0);
    subsets.push(initial_subset);
    edges.push(Vec::new());
    worklist.push(0);

    while let Some(k) = worklist.pop() {
        for label in 1..=nfa.alphabet_size {
            let target = input_closure(nfa, &subsets[k as usize], label);
            let is_trap = target.is_empty();

            let target_idx = match index_of.get(&target) {
                Some(&idx) => idx,
                None => {
                    let idx = subsets.len() as u32;
                    if idx >= u16::MAX as u32 {
                        return Err(OverflowError::states(idx as u64 + 1));
                    }
                    index_of.insert(target.clone(), idx);
                    subsets.push(target);
                    edges.push(Vec::new());
                    worklist.push(idx);
                    idx
                }
            };

            if is_trap {
                trap = Some(target_idx);
            }
            edges[k as usize].push((label, target_idx));
        }
    }

    let final_set: HashSet<u16> = subsets
        .iter()
        .enumerate()
        .filter(|(_, subset)| subset.iter().any(|&q| nfa.is_final(q)))
        .map(|(idx, _)| idx as u16)
        .collect();

    let dfa = Dfa {
        state_count: subsets.len() as u16,
        initial: 0,
        final_set,
        alphabet_size: nfa.alphabet_size,
        edges: edges
            .into_iter()
            .map(|row| row.into_iter().map(|(label, to)| (label, to as u16)).collect())
            .collect(),
        dfa_final: HashMap::new(),
        trap: trap.map(|t| t as u16),
    };
    Ok((dfa, subsets))
}
