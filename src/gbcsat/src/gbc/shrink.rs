/*****************************************************************************************[gbc/shrink.rs]
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

//! Shrinking the assumption side of a candidate clause.
//!
//! Every strategy takes the assumption-side literals `alpha_a` (true under
//! the probe) and the conditional literals `neg_alpha_c` (false under the
//! probe). It keeps the assumption literals whose negation falsifies some
//! conditional literal on its own, and returns them with the conditional
//! literals nobody falsified.

use {
    super::{
        cover::{greedy_cover, preferred_cover},
        propagate_or_resolve, GbcHost, Halt,
    },
    crate::{
        clause::{lbool, Lit},
        utils,
    },
};

/// Result of a shrink.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Shrunk {
    /// Assumption literals worth keeping, in the order they were found
    pub useful: Vec<Lit>,
    /// Conditional literals left over
    pub residual: Vec<Lit>,
}

/// Assume each `¬a` alone, from level 0, and drop the conditional
/// literals it falsifies. Ends at level 0.
pub(crate) fn propagation_shrink<H: GbcHost>(
    host: &mut H,
    alpha_a: &[Lit],
    neg_alpha_c: &[Lit],
    retries: u32,
) -> Result<Shrunk, Halt> {
    let mut useful = vec![];
    let mut residual = neg_alpha_c.to_vec();

    for &a in alpha_a {
        host.backtrack(0);
        if host.is_fixed(a.var()) {
            continue;
        }
        host.assume(!a);
        if let Some(r) = propagate_or_resolve(host, Some(retries)) {
            r.recovered()?;
            continue;
        }
        let before = residual.len();
        residual.retain(|&c| host.value(c) != lbool::FALSE);
        if residual.len() < before {
            useful.push(a);
        }
    }
    host.backtrack(0);

    Ok(Shrunk { useful, residual })
}

/// Like `propagation_shrink`, but only looks at binary clauses `{a, ¬c}`.
/// Does not touch the assignment.
pub(crate) fn binary_shrink<H: GbcHost>(host: &H, alpha_a: &[Lit], neg_alpha_c: &[Lit]) -> Shrunk {
    let mut useful = vec![];
    let mut residual = neg_alpha_c.to_vec();

    for &a in alpha_a {
        if host.is_fixed(a.var()) {
            continue;
        }
        let mut keep = false;
        host.for_each_binary(a, |other| {
            let before = residual.len();
            residual.retain(|&c| c != !other);
            keep |= residual.len() < before;
        });
        if keep {
            useful.push(a);
        }
    }

    Shrunk { useful, residual }
}

/// Compute, for each `a`, the conditional literals `¬a` falsifies, and
/// pick a small family of them with set cover.
///
/// With `known_good`, the cover follows that order instead of the greedy
/// choice. Ends at level 0.
pub(crate) fn greedy_shrink<H: GbcHost>(
    host: &mut H,
    alpha_a: &[Lit],
    neg_alpha_c: &[Lit],
    known_good: Option<&[Lit]>,
    retries: u32,
) -> Result<Shrunk, Halt> {
    // `probed[i]` induces `subsets[i]`
    let mut probed: Vec<Lit> = vec![];
    let mut subsets: Vec<Vec<Lit>> = vec![];

    for &a in alpha_a {
        host.backtrack(0);
        if host.is_fixed(a.var()) {
            continue;
        }
        host.assume(!a);
        if let Some(r) = propagate_or_resolve(host, Some(retries)) {
            r.recovered()?;
            continue;
        }
        let falsified: Vec<Lit> = neg_alpha_c
            .iter()
            .copied()
            .filter(|&c| host.value(c) == lbool::FALSE)
            .collect();
        if !falsified.is_empty() {
            probed.push(a);
            subsets.push(falsified);
        }
    }
    host.backtrack(0);

    assert_eq!(probed.len(), subsets.len());
    let cover = match known_good {
        Some(order) => {
            let preferred: Vec<usize> = order
                .iter()
                .filter_map(|l| probed.iter().position(|p| p == l))
                .collect();
            preferred_cover(neg_alpha_c, &subsets, &preferred)
        }
        None => greedy_cover(neg_alpha_c, &subsets),
    };
    trace!(
        "gbc.greedy-shrink: chose {} of {} subsets",
        cover.chosen.len(),
        subsets.len()
    );

    Ok(Shrunk {
        useful: cover.chosen.iter().map(|&i| probed[i]).collect(),
        residual: cover.residual,
    })
}

/// Replay `known_good`, restricted to members of `alpha_a`: assume their
/// negations cumulatively from level 0, and keep those that propagate.
///
/// Literals that are fixed, or already decided by the previous ones, are
/// skipped. A conflict gives an empty result. Ends at level 0.
pub(crate) fn replay_shrink<H: GbcHost>(
    host: &mut H,
    alpha_a: &[Lit],
    neg_alpha_c: &[Lit],
    known_good: &[Lit],
    retries: u32,
) -> Result<Shrunk, Halt> {
    let mut useful = vec![];
    host.backtrack(0);

    for &a in known_good {
        if !alpha_a.contains(&a) || host.is_fixed(a.var()) || host.value(a) != lbool::UNDEF {
            continue;
        }
        host.assume(!a);
        if let Some(r) = propagate_or_resolve(host, Some(retries)) {
            r.recovered()?;
            host.backtrack(0);
            debug!("gbc.replay: conflict on {:?}", !a);
            return Ok(Shrunk {
                useful: vec![],
                residual: neg_alpha_c.to_vec(),
            });
        }
        useful.push(a);
    }

    let residual: Vec<Lit> = neg_alpha_c
        .iter()
        .copied()
        .filter(|&c| host.value(c) != lbool::FALSE)
        .collect();
    if !residual.is_empty() {
        debug!("gbc.replay: {} conditional literals left", residual.len());
    }
    host.backtrack(0);

    Ok(Shrunk { useful, residual })
}

/// Order `alpha_a` so that literals implying more of the others come first.
///
/// Each literal is assumed once from level 0 and ranked by how many other
/// members of `alpha_a` it makes true. Ties keep their order. Ends at level 0.
pub(crate) fn implication_order<H: GbcHost>(
    host: &mut H,
    alpha_a: &[Lit],
    retries: u32,
) -> Result<Vec<Lit>, Halt> {
    let mut ranked: Vec<(usize, Lit)> = Vec::with_capacity(alpha_a.len());
    for &a in alpha_a {
        host.backtrack(0);
        let mut rank = 0;
        if host.value(a) == lbool::UNDEF {
            host.assume(a);
            match propagate_or_resolve(host, Some(retries)) {
                None => {
                    rank = alpha_a
                        .iter()
                        .filter(|&&b| b != a && host.value(b) == lbool::TRUE)
                        .count()
                }
                Some(r) => r.recovered()?,
            }
        }
        ranked.push((rank, a));
    }
    host.backtrack(0);

    ranked.sort_by(|x, y| y.0.cmp(&x.0));
    Ok(ranked.into_iter().map(|(_, a)| a).collect())
}

/// Seeded shuffle of the assumption side.
pub(crate) fn random_order(alpha_a: &mut [Lit], seed: &mut f64) {
    utils::shuffle(alpha_a, seed)
}

#[cfg(test)]
mod test {
    use {super::*, crate::gbc::test_util::*};

    // 1 -> 4, 2 -> 4 and 5, 3 -> nothing; conditional side is {-4, -5, -6}
    fn setup() -> crate::BasicSolver {
        solver(&[&[1, -4], &[2, -4], &[2, -5], &[3, 7], &[-4, -5, -6, 8]])
    }

    #[test]
    fn test_propagation_shrink() {
        let mut s = setup();
        let alpha = lits(&[1, 2, 3]);
        let cond = lits(&[4, 5, 6]);
        let res = propagation_shrink(&mut s, &alpha, &cond, 1).unwrap();
        assert_eq!(ints(&res.useful), vec![1, 2]);
        assert_eq!(ints(&res.residual), vec![6]);
        assert_eq!(s.decision_level(), 0);
        assert!(res.residual.len() <= cond.len());
        assert!(res.residual.iter().all(|l| cond.contains(l)));
    }

    #[test]
    fn test_binary_shrink() {
        let s = setup();
        let res = binary_shrink(&s, &lits(&[2, 1, 3]), &lits(&[4, 5, 6]));
        // 2 covers both 4 and 5, so 1 is useless
        assert_eq!(ints(&res.useful), vec![2]);
        assert_eq!(ints(&res.residual), vec![6]);
    }

    #[test]
    fn test_greedy_shrink() {
        let mut s = setup();
        let alpha = lits(&[1, 2, 3]);
        let cond = lits(&[4, 5, 6]);
        let res = greedy_shrink(&mut s, &alpha, &cond, None, 1).unwrap();
        assert_eq!(ints(&res.useful), vec![2]);
        assert_eq!(ints(&res.residual), vec![6]);

        let known = lits(&[1, 2]);
        let res = greedy_shrink(&mut s, &alpha, &cond, Some(&known), 1).unwrap();
        assert_eq!(ints(&res.useful), vec![1, 2]);
        assert_eq!(ints(&res.residual), vec![6]);
        assert_eq!(s.decision_level(), 0);
    }

    #[test]
    fn test_shrink_skips_conflicts() {
        // -1 is refuted, learning 1
        let mut s = solver(&[&[1, 2], &[1, -2], &[3, -4]]);
        let res = propagation_shrink(&mut s, &lits(&[1, 3]), &lits(&[4]), 1).unwrap();
        assert_eq!(ints(&res.useful), vec![3]);
        assert!(res.residual.is_empty());
        assert!(s.is_fixed(Lit::from_dimacs(1).var()));
    }

    #[test]
    fn test_replay_is_deterministic() {
        let alpha = lits(&[10, 11]);
        let cond = lits(&[5, 6]);
        let order = lits(&[10, 11]);
        let mut results = vec![];
        for _ in 0..2 {
            let mut s = solver(&[&[10, -5], &[11, -6]]);
            let res = replay_shrink(&mut s, &alpha, &cond, &order, 1).unwrap();
            assert_eq!(s.decision_level(), 0);
            results.push(res);
        }
        assert_eq!(results[0], results[1]);
        assert_eq!(ints(&results[0].useful), vec![10, 11]);
        assert!(results[0].residual.is_empty());
    }

    #[test]
    fn test_replay_skips_outsiders() {
        let mut s = solver(&[&[10, -5], &[11, -6], &[12, -7]]);
        let res = replay_shrink(
            &mut s,
            &lits(&[11, 10]),
            &lits(&[5, 6, 7]),
            &lits(&[12, 11, 10]),
            1,
        )
        .unwrap();
        assert_eq!(ints(&res.useful), vec![11, 10]);
        assert_eq!(ints(&res.residual), vec![7]);
    }

    #[test]
    fn test_implication_order() {
        // 3 -> 2 -> 1
        let mut s = solver(&[&[-3, 2], &[-2, 1], &[4, 5]]);
        let order = implication_order(&mut s, &lits(&[1, 4, 2, 3]), 1).unwrap();
        assert_eq!(ints(&order), vec![3, 2, 1, 4]);
        assert_eq!(s.decision_level(), 0);
    }

    #[test]
    fn test_random_order_is_seeded() {
        let mut a = lits(&[1, 2, 3, 4, 5, 6]);
        let mut b = a.clone();
        random_order(&mut a, &mut 17.0);
        random_order(&mut b, &mut 17.0);
        assert_eq!(a, b);
    }
}
