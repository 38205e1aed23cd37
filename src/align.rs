//! @ai:module:intent Align two content sequences into equal/insert/delete/replace opcodes
//! @ai:module:layer domain
//! @ai:module:public_api align, matching_blocks, Opcode, OpTag, MatchingBlock
//! @ai:module:stateless true
//!
//! Longest-match alignment: find the longest run of identical elements in the
//! current window, then recurse into the gaps on either side. Ties go to the
//! match that starts earliest in the old sequence, then earliest in the new one,
//! so the opcode list is fully deterministic.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Range;

/// @ai:intent Kind of span in an alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpTag {
    Equal,
    Insert,
    Delete,
    Replace,
}

impl OpTag {
    pub fn name(&self) -> &'static str {
        match self {
            OpTag::Equal => "equal",
            OpTag::Insert => "insert",
            OpTag::Delete => "delete",
            OpTag::Replace => "replace",
        }
    }
}

/// @ai:intent One span of the alignment: old[i1..i2] corresponds to new[j1..j2]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opcode {
    pub tag: OpTag,
    pub i1: usize,
    pub i2: usize,
    pub j1: usize,
    pub j2: usize,
}

impl Opcode {
    pub fn new(tag: OpTag, i1: usize, i2: usize, j1: usize, j2: usize) -> Self {
        Self { tag, i1, i2, j1, j2 }
    }

    pub fn old_range(&self) -> Range<usize> {
        self.i1..self.i2
    }

    pub fn new_range(&self) -> Range<usize> {
        self.j1..self.j2
    }
}

/// @ai:intent A run of `size` identical elements at old[a..] and new[b..]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingBlock {
    pub a: usize,
    pub b: usize,
    pub size: usize,
}

/// Positions of every element of the new sequence, ascending.
fn index_positions<T: Eq + Hash>(new: &[T]) -> HashMap<&T, Vec<usize>> {
    let mut positions: HashMap<&T, Vec<usize>> = HashMap::new();
    for (j, item) in new.iter().enumerate() {
        positions.entry(item).or_default().push(j);
    }
    positions
}

/// @ai:intent Longest common run inside old[alo..ahi] x new[blo..bhi]
/// @ai:post size == 0 means no common element; then (a, b) == (alo, blo)
/// @ai:complexity O((ahi-alo) * occurrences)
fn find_longest_match<T: Eq + Hash>(
    old: &[T],
    positions: &HashMap<&T, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> MatchingBlock {
    let mut best = MatchingBlock {
        a: alo,
        b: blo,
        size: 0,
    };

    // run_len[j] = length of the common run ending at old[i - 1], new[j]
    let mut run_len: HashMap<usize, usize> = HashMap::new();

    for (i, item) in old.iter().enumerate().take(ahi).skip(alo) {
        let mut next_run_len = HashMap::new();

        if let Some(js) = positions.get(item) {
            for &j in js {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }

                let k = j
                    .checked_sub(1)
                    .and_then(|prev| run_len.get(&prev))
                    .copied()
                    .unwrap_or(0)
                    + 1;
                next_run_len.insert(j, k);

                // strictly longer only, so the earliest start wins ties
                if k > best.size {
                    best = MatchingBlock {
                        a: i + 1 - k,
                        b: j + 1 - k,
                        size: k,
                    };
                }
            }
        }

        run_len = next_run_len;
    }

    best
}

/// @ai:intent All maximal matching runs, ordered, with adjacent runs coalesced
/// @ai:post last element is the sentinel MatchingBlock { a: old.len(), b: new.len(), size: 0 }
/// @ai:effects pure
pub fn matching_blocks<T: Eq + Hash>(old: &[T], new: &[T]) -> Vec<MatchingBlock> {
    let positions = index_positions(new);

    let mut queue = vec![(0, old.len(), 0, new.len())];
    let mut found = Vec::new();

    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let m = find_longest_match(old, &positions, alo, ahi, blo, bhi);
        if m.size == 0 {
            continue;
        }

        found.push(m);
        if alo < m.a && blo < m.b {
            queue.push((alo, m.a, blo, m.b));
        }
        if m.a + m.size < ahi && m.b + m.size < bhi {
            queue.push((m.a + m.size, ahi, m.b + m.size, bhi));
        }
    }

    found.sort_by_key(|m| (m.a, m.b));

    let mut blocks: Vec<MatchingBlock> = Vec::with_capacity(found.len() + 1);
    for m in found {
        match blocks.last_mut() {
            Some(prev) if prev.a + prev.size == m.a && prev.b + prev.size == m.b => {
                prev.size += m.size;
            }
            _ => blocks.push(m),
        }
    }

    blocks.push(MatchingBlock {
        a: old.len(),
        b: new.len(),
        size: 0,
    });

    blocks
}

/// @ai:intent Compute the ordered, exhaustive opcode list turning `old` into `new`
/// @ai:post opcodes partition 0..old.len() and 0..new.len() in order, with no gaps
/// @ai:post every Equal opcode has i2 - i1 == j2 - j1 and identical elements
/// @ai:example (["a"], ["a", "b"]) -> [Equal 0..1/0..1, Insert 1..1/1..2]
/// @ai:idempotent true
/// @ai:effects pure
pub fn align<T: Eq + Hash>(old: &[T], new: &[T]) -> Vec<Opcode> {
    let mut opcodes = Vec::new();
    let (mut i, mut j) = (0, 0);

    for block in matching_blocks(old, new) {
        let tag = match (i < block.a, j < block.b) {
            (true, true) => Some(OpTag::Replace),
            (true, false) => Some(OpTag::Delete),
            (false, true) => Some(OpTag::Insert),
            (false, false) => None,
        };

        if let Some(tag) = tag {
            opcodes.push(Opcode::new(tag, i, block.a, j, block.b));
        }

        i = block.a + block.size;
        j = block.b + block.size;

        if block.size > 0 {
            opcodes.push(Opcode::new(OpTag::Equal, block.a, i, block.b, j));
        }
    }

    opcodes
}
