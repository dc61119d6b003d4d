/*****************************************************************************************[gbc/conditional.rs]
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

//! The least conditional part of the current assignment.

use {
    super::{
        driver::Discovery,
        shrink::{self, Shrunk},
        trivial::is_trivial,
        AlphaOrder, GbcHost, Halt, Shrink,
    },
    crate::clause::{lbool, Lit},
    std::collections::HashMap,
};

/// The two sides of the current assignment, as seen from the clauses.
#[derive(Debug, Default)]
pub(super) struct Sides {
    /// Candidate assumption literals, in the order first seen
    pub alpha_a: Vec<Lit>,
    /// All satisfying literals not on the conditional side
    pub autarky: Vec<Lit>,
    /// False literals of clauses the assignment does not satisfy
    pub neg_alpha_c: Vec<Lit>,
}

impl<'a, H: GbcHost> Discovery<'a, H> {
    /// Split the assignment into assumption and conditional sides, then
    /// derive and offer clauses `conditional ∨ key`.
    ///
    /// `known_good` is the assumption order of the current plan group, if any.
    /// Returns `true` if a clause was emitted.
    pub(super) fn least_conditional_part(&mut self, known_good: Option<&[Lit]>) -> Result<bool, Halt> {
        self.stats.episodes += 1;
        let Sides {
            mut alpha_a,
            autarky,
            neg_alpha_c,
        } = self.sides();
        trace!(
            "gbc.episode: alpha_a={:?} neg_alpha_c={:?}",
            alpha_a,
            neg_alpha_c
        );

        let retries = self.opts.shrink_retries;
        match self.opts.alpha_order {
            AlphaOrder::Identity => (),
            AlphaOrder::Implication => {
                alpha_a = shrink::implication_order(self.host, &alpha_a, retries)?;
            }
            AlphaOrder::Random => shrink::random_order(&mut alpha_a, &mut self.seed),
        }

        let shrunk = if self.opts.no_shrink {
            Shrunk::default()
        } else {
            match self.opts.shrink {
                Shrink::Propagate => {
                    shrink::propagation_shrink(self.host, &alpha_a, &neg_alpha_c, retries)?
                }
                Shrink::Binary => shrink::binary_shrink(&*self.host, &alpha_a, &neg_alpha_c),
                Shrink::Greedy => shrink::greedy_shrink(
                    self.host,
                    &alpha_a,
                    &neg_alpha_c,
                    known_good,
                    retries,
                )?,
                Shrink::Replay => match known_good {
                    Some(order) => {
                        shrink::replay_shrink(self.host, &alpha_a, &neg_alpha_c, order, retries)?
                    }
                    None => Shrunk::default(),
                },
            }
        };

        let mut emitted = false;
        match shrunk.useful.last() {
            Some(&key) => {
                let mut clause = shrunk.residual.clone();
                clause.extend_from_slice(&shrunk.useful);
                emitted = self.offer(clause, key, &autarky)?;
            }
            None => {
                for &key in alpha_a.iter().take(self.opts.max_fallback) {
                    self.deadline.check()?;
                    let mut clause = neg_alpha_c.clone();
                    clause.push(key);
                    emitted |= self.offer(clause, key, &autarky)?;
                }
            }
        }
        Ok(emitted)
    }

    /// Scan the clauses under the current assignment.
    ///
    /// Clauses satisfied by a fixed literal are ignored. Satisfying literals
    /// are assumption candidates unless their negation is on the conditional
    /// side. With `skip_decisions`, decisions are not candidates.
    pub(super) fn sides(&mut self) -> Sides {
        let host = &*self.host;
        let include_redundant = host.proof_enabled();

        // satisfying literal -> number of clauses it satisfies
        let mut times_touched: Vec<(Lit, u32)> = vec![];
        let mut touched_idx: HashMap<Lit, usize> = HashMap::new();
        let mut neg_alpha_c = vec![];
        let mut falsified = vec![];

        let mut marks = self.marks.scope();
        host.for_each_clause(include_redundant, |c| {
            if c
                .iter()
                .any(|&l| host.value(l) == lbool::TRUE && host.is_fixed(l.var()))
            {
                return;
            }
            let mut satisfied = false;
            falsified.clear();
            for &l in c {
                let value = host.value(l);
                if value == lbool::TRUE {
                    satisfied = true;
                    match touched_idx.get(&l) {
                        Some(&i) => times_touched[i].1 += 1,
                        None => {
                            touched_idx.insert(l, times_touched.len());
                            times_touched.push((l, 1));
                        }
                    }
                } else if value == lbool::FALSE && !host.is_fixed(l.var()) && !marks.is_marked(l) {
                    falsified.push(l);
                }
            }
            if !satisfied {
                for &l in &falsified {
                    if marks.mark(l) {
                        neg_alpha_c.push(l);
                    }
                }
            }
        });
        trace!("gbc.times-touched: {:?}", times_touched);

        let mut sides = Sides {
            neg_alpha_c,
            ..Sides::default()
        };
        for &(l, _) in &times_touched {
            if marks.is_marked(!l) {
                continue;
            }
            sides.autarky.push(l);
            if !(self.opts.skip_decisions && host.is_decision(l)) {
                sides.alpha_a.push(l);
            }
        }
        sides
    }

    /// Run a candidate through the triviality filter, then emit it.
    fn offer(&mut self, clause: Vec<Lit>, key: Lit, autarky: &[Lit]) -> Result<bool, Halt> {
        self.stats.candidates += 1;
        if self.opts.filter_trivial && is_trivial(self.host, &clause, self.opts.max_len)? {
            trace!("gbc.trivial {:?}", clause);
            self.stats.trivial += 1;
            return Ok(false);
        }
        self.emit(clause, key, autarky)?;
        Ok(true)
    }
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::gbc::{emit::test::SharedBuf, test_util::*, GbcOpts, Recorder},
    };

    // decisions 1, 2, -3: alpha_a is [1, 2], neg_alpha_c is [3]
    fn episode(opts: GbcOpts) -> (bool, String) {
        let mut s = solver(&[&[1, -3], &[2, 5], &[3, 4, 6], &[-2, 1]]);
        for &l in &[1, 2, -3] {
            s.assume(Lit::from_dimacs(l));
            assert!(s.propagate());
        }
        let main = SharedBuf::default();
        let r = Recorder::from_writers(main.clone(), SharedBuf::default());
        let opts = GbcOpts {
            skip_decisions: false,
            filter_trivial: false,
            learn: false,
            ..opts
        };
        let mut d = Discovery::new(&mut s, opts).with_recorder(r);
        let emitted = d.least_conditional_part(None).unwrap();
        assert!(d.marks.is_clear());
        (emitted, main.text())
    }

    #[test]
    fn test_sides() {
        // under 1: (1 2) and (-1 3) satisfied, (-3 4 5) left with -3 false
        let mut s = solver(&[&[1, 2], &[-1, 3], &[-3, 4, 5], &[-1, -6], &[6, -3, 7, 8]]);
        s.assume(Lit::from_dimacs(1));
        assert!(s.propagate());
        let mut d = Discovery::new(&mut s, GbcOpts::default());
        let sides = d.sides();
        assert_eq!(ints(&sides.neg_alpha_c), vec![-3, 6]);
        // 3 is excluded because -3 is conditional; -6 because 6 is
        assert_eq!(ints(&sides.autarky), vec![1]);
        assert!(sides.alpha_a.is_empty(), "1 is a decision");
        assert!(d.marks.is_clear());
    }

    #[test]
    fn test_sides_keeps_decisions() {
        let mut s = solver(&[&[1, 2], &[-1, 3], &[-3, 4, 5]]);
        s.assume(Lit::from_dimacs(1));
        assert!(s.propagate());
        let opts = GbcOpts {
            skip_decisions: false,
            ..GbcOpts::default()
        };
        let mut d = Discovery::new(&mut s, opts);
        let sides = d.sides();
        assert_eq!(ints(&sides.alpha_a), vec![1]);
        assert_eq!(ints(&sides.neg_alpha_c), vec![-3]);
    }

    #[test]
    fn test_fixed_satisfied_clauses_are_ignored() {
        let mut s = solver(&[&[5, -2, 3], &[2, 4], &[5]]);
        assert!(s.propagate());
        s.assume(Lit::from_dimacs(-4));
        assert!(s.propagate());
        let mut d = Discovery::new(&mut s, GbcOpts::default());
        let sides = d.sides();
        // -4 forces 2; (5 -2 3) would contribute -2 but is satisfied by a fixed literal
        assert!(sides.neg_alpha_c.is_empty());
        assert_eq!(ints(&sides.autarky), vec![2]);
        assert_eq!(ints(&sides.alpha_a), vec![2]);
    }

    #[test]
    fn test_episode_propagation_shrink() {
        // -1 alone falsifies 3, -2 falsifies nothing
        assert_eq!(episode(GbcOpts::default()), (true, "1\n".to_string()));
    }

    #[test]
    fn test_episode_greedy_shrink() {
        let opts = GbcOpts {
            shrink: Shrink::Greedy,
            ..GbcOpts::default()
        };
        assert_eq!(episode(opts), (true, "1\n".to_string()));
    }

    #[test]
    fn test_episode_no_shrink() {
        let opts = GbcOpts {
            no_shrink: true,
            ..GbcOpts::default()
        };
        // one fallback clause per key
        assert_eq!(episode(opts), (true, "1 3\n2 3\n".to_string()));
    }

    #[test]
    fn test_episode_implication_order() {
        let fallback = |alpha_order| {
            let opts = GbcOpts {
                alpha_order,
                no_shrink: true,
                max_fallback: 1,
                ..GbcOpts::default()
            };
            episode(opts).1
        };
        assert_eq!(fallback(AlphaOrder::Identity), "1 3\n");
        // 2 implies 1, so it goes first
        assert_eq!(fallback(AlphaOrder::Implication), "2 3\n");
    }

    #[test]
    fn test_episode_marks_clean_on_error() {
        let mut s = solver(&[&[1, 2], &[-1, 3], &[-3, 4, 5]]);
        s.assume(Lit::from_dimacs(1));
        assert!(s.propagate());
        let opts = GbcOpts {
            time_limit: 0.0,
            filter_trivial: false,
            skip_decisions: false,
            shrink: Shrink::Binary,
            ..GbcOpts::default()
        };
        let mut d = Discovery::new(&mut s, opts);
        // no useful literal, and the fallback runs out of time
        assert!(matches!(d.least_conditional_part(None), Err(Halt::Timeout)));
        assert!(d.marks.is_clear());
    }
}
