/*****************************************************************************************[gbc/cover.rs]
Copyright (c) 2026, gbcsat contributors

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

//! Greedy set cover.

use std::{collections::HashSet, hash::Hash};

/// Result of a set cover: indices of the chosen subsets, and the part of
/// the universe they leave uncovered (in universe order, without duplicates).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cover<T> {
    pub chosen: Vec<usize>,
    pub residual: Vec<T>,
}

/// Repeatedly pick the subset covering the most uncovered elements of
/// `universe`, ties going to the lowest index, until nothing is left to
/// cover or no subset adds anything.
///
/// ```
/// use gbcsat::gbc::greedy_cover;
/// let subsets = vec![vec![1, 2], vec![2, 3, 4], vec![5]];
/// let cover = greedy_cover(&[1, 2, 3, 4, 6], &subsets);
/// assert_eq!(cover.chosen, vec![1, 0]);
/// assert_eq!(cover.residual, vec![6]);
/// ```
pub fn greedy_cover<T>(universe: &[T], subsets: &[Vec<T>]) -> Cover<T>
where
    T: Copy + Eq + Hash,
{
    let mut uncovered: HashSet<T> = universe.iter().copied().collect();
    let mut chosen = vec![];

    while !uncovered.is_empty() {
        let mut best: Option<(usize, usize)> = None;
        for (i, s) in subsets.iter().enumerate() {
            let gain = gain(&uncovered, s);
            if gain > best.map_or(0, |(_, g)| g) {
                best = Some((i, gain));
            }
        }
        match best {
            Some((i, _)) => {
                chosen.push(i);
                for x in &subsets[i] {
                    uncovered.remove(x);
                }
            }
            None => break,
        }
    }

    Cover {
        residual: residual(universe, &uncovered),
        chosen,
    }
}

/// Walk `preferred` and choose every valid, not yet chosen subset that
/// covers something new. No other subset is considered.
///
/// ```
/// use gbcsat::gbc::preferred_cover;
/// let subsets = vec![vec!['a'], vec!['b', 'c'], vec!['a', 'b']];
/// let cover = preferred_cover(&['a', 'b', 'c', 'd'], &subsets, &[2, 0, 7, 1]);
/// assert_eq!(cover.chosen, vec![2, 1]);
/// assert_eq!(cover.residual, vec!['d']);
/// ```
pub fn preferred_cover<T>(universe: &[T], subsets: &[Vec<T>], preferred: &[usize]) -> Cover<T>
where
    T: Copy + Eq + Hash,
{
    let mut uncovered: HashSet<T> = universe.iter().copied().collect();
    let mut chosen: Vec<usize> = vec![];

    for &i in preferred {
        if i >= subsets.len() || chosen.contains(&i) {
            continue;
        }
        if gain(&uncovered, &subsets[i]) > 0 {
            chosen.push(i);
            for x in &subsets[i] {
                uncovered.remove(x);
            }
        }
    }

    Cover {
        residual: residual(universe, &uncovered),
        chosen,
    }
}

fn gain<T: Eq + Hash>(uncovered: &HashSet<T>, subset: &[T]) -> usize {
    let mut seen = HashSet::with_capacity(subset.len());
    subset
        .iter()
        .filter(|x| uncovered.contains(*x) && seen.insert(*x))
        .count()
}

fn residual<T: Copy + Eq + Hash>(universe: &[T], uncovered: &HashSet<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    universe
        .iter()
        .copied()
        .filter(|x| uncovered.contains(x) && seen.insert(*x))
        .collect()
}

#[cfg(test)]
mod test {
    use {super::*, proptest::prelude::*};

    #[test]
    fn test_greedy_ties() {
        let subsets = vec![vec![1, 2], vec![3, 4], vec![1, 2, 3]];
        let cover = greedy_cover(&[1, 2, 3, 4], &subsets);
        assert_eq!(cover.chosen, vec![2, 1]);
        assert!(cover.residual.is_empty());

        let subsets = vec![vec![1], vec![2]];
        assert_eq!(greedy_cover(&[2, 1], &subsets).chosen, vec![0, 1]);
    }

    #[test]
    fn test_greedy_nothing_to_cover() {
        let subsets: Vec<Vec<u32>> = vec![vec![], vec![9]];
        let cover = greedy_cover(&[1, 1, 2], &subsets);
        assert!(cover.chosen.is_empty());
        assert_eq!(cover.residual, vec![1, 2]);
    }

    #[test]
    fn test_preferred_skips_useless() {
        let subsets = vec![vec![1, 2], vec![2], vec![3]];
        let cover = preferred_cover(&[1, 2, 3], &subsets, &[0, 1, 0, 2]);
        assert_eq!(cover.chosen, vec![0, 2]);
        assert!(cover.residual.is_empty());
    }

    fn check_valid(universe: &[u8], subsets: &[Vec<u8>], cover: &Cover<u8>) {
        assert!(cover.chosen.iter().all(|&i| i < subsets.len()));
        let covered: HashSet<u8> = cover
            .chosen
            .iter()
            .flat_map(|&i| subsets[i].iter().copied())
            .collect();
        let mut expected = vec![];
        for &x in universe {
            if !covered.contains(&x) && !expected.contains(&x) {
                expected.push(x);
            }
        }
        assert_eq!(cover.residual, expected);
    }

    proptest! {
        #[test]
        fn greedy_cover_is_valid(
            universe in prop::collection::vec(0u8..32, 0..24),
            subsets in prop::collection::vec(prop::collection::vec(0u8..32, 0..8), 0..10),
        ) {
            let cover = greedy_cover(&universe, &subsets);
            check_valid(&universe, &subsets, &cover);
        }

        #[test]
        fn preferred_cover_is_valid(
            universe in prop::collection::vec(0u8..32, 0..24),
            subsets in prop::collection::vec(prop::collection::vec(0u8..32, 0..8), 0..10),
            preferred in prop::collection::vec(0usize..12, 0..12),
        ) {
            let cover = preferred_cover(&universe, &subsets, &preferred);
            check_valid(&universe, &subsets, &cover);
            prop_assert!(cover.chosen.iter().all(|i| preferred.contains(i)));
        }
    }
}
