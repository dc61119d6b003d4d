/*****************************************************************************************[gbc/driver.rs]
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

use {
    super::{
        marks::MarkStore, propagate_or_resolve, Deadline, GbcHost, GbcOpts, GbcStats, Halt,
        ProbeOrder, ProbePlan, Recorder,
    },
    crate::{
        clause::{lbool, Lit, Var},
        utils::{drand, irand},
    },
    std::{cmp::Reverse, io},
};

/// A discovery pass over a solver.
///
/// ```
/// use gbcsat::{lbool, BasicSolver, Discovery, GbcOpts, Lit, SolverInterface};
/// let mut s = BasicSolver::default();
/// for c in &[[1, 2], [-1, 3], [-2, 3]] {
///     let mut c: Vec<Lit> = c.iter().map(|&i| {
///         s.var_of_int(i32::abs(i) as u32 - 1);
///         Lit::from_dimacs(i)
///     }).collect();
///     s.add_clause_reuse(&mut c);
/// }
/// let mut d = Discovery::new(&mut s, GbcOpts::default());
/// assert_eq!(d.run(None).unwrap(), lbool::UNDEF);
/// assert!(d.stats().completed);
/// ```
pub struct Discovery<'a, H: GbcHost> {
    pub(super) host: &'a mut H,
    pub(super) opts: GbcOpts,
    pub(super) marks: MarkStore,
    pub(super) recorder: Option<Recorder>,
    pub(super) stats: GbcStats,
    pub(super) seed: f64,
    pub(super) deadline: Deadline,
}

impl<'a, H: GbcHost> Discovery<'a, H> {
    pub fn new(host: &'a mut H, opts: GbcOpts) -> Self {
        assert!(opts.check());
        let seed = opts.initial_seed();
        let deadline = Deadline::new(opts.time_limit);
        Discovery {
            host,
            opts,
            marks: MarkStore::new(),
            recorder: None,
            stats: GbcStats::default(),
            seed,
            deadline,
        }
    }

    /// Also write found clauses to `recorder`.
    pub fn with_recorder(mut self, recorder: Recorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn stats(&self) -> &GbcStats {
        &self.stats
    }

    /// Flush the recorder and return the counters.
    pub fn finish(mut self) -> io::Result<GbcStats> {
        if let Some(r) = self.recorder.as_mut() {
            r.flush()?;
        }
        Ok(self.stats)
    }

    /// Run the pass. `plan` is required for [`ProbeOrder::Plan`] and
    /// ignored otherwise.
    ///
    /// Returns `lbool::FALSE` if the clause set was found unsatisfiable,
    /// `lbool::UNDEF` otherwise. The host is left at level 0.
    pub fn run(&mut self, plan: Option<&ProbePlan>) -> io::Result<lbool> {
        self.deadline = Deadline::new(self.opts.time_limit);
        self.stats.completed = false;
        let plan = match (self.opts.order, plan) {
            (ProbeOrder::Plan, None) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "probe order `plan` needs a probe plan",
                ))
            }
            (ProbeOrder::Plan, Some(p)) => {
                if p.num_vars() > self.host.max_var() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!(
                            "probe plan uses variable {}, but there are only {}",
                            p.num_vars(),
                            self.host.max_var()
                        ),
                    ));
                }
                Some(p)
            }
            _ => None,
        };
        info!(
            "gbc.run: order={} shrink={:?} vars={}",
            self.opts.order,
            self.opts.shrink,
            self.host.max_var()
        );

        let res = match plan {
            Some(p) => self.run_plan(p),
            None => self.run_probes(),
        };
        self.host.backtrack(0);
        let flushed = match self.recorder.as_mut() {
            Some(r) => r.flush(),
            None => Ok(()),
        };

        let status = match res {
            Ok(()) => {
                self.stats.completed = true;
                lbool::UNDEF
            }
            Err(Halt::Unsat) => lbool::FALSE,
            Err(Halt::Timeout) => {
                info!("gbc.run: out of time after {} probes", self.stats.probes);
                lbool::UNDEF
            }
            Err(Halt::Exhausted) => {
                warn!("gbc.run: conflict analysis exhausted, stopping");
                // drain what is left, without a bound
                if self.settle().is_err() {
                    lbool::FALSE
                } else {
                    lbool::UNDEF
                }
            }
            Err(Halt::Io(e)) => return Err(e),
        };
        flushed?;
        info!(
            "gbc.run: done, {} clauses emitted ({} units)",
            self.stats.emitted,
            self.stats.units
        );
        Ok(if self.host.is_unsat() {
            lbool::FALSE
        } else {
            status
        })
    }

    /// Back to level 0 with propagation done.
    fn settle(&mut self) -> Result<(), Halt> {
        self.host.backtrack(0);
        match propagate_or_resolve(self.host, None) {
            None => Ok(()),
            Some(r) => r.recovered(),
        }
    }

    /// Assume `lit` on top of the current assignment. Returns `false` if
    /// that led to a conflict, which was resolved.
    fn try_assume(&mut self, lit: Lit) -> Result<bool, Halt> {
        self.host.assume(lit);
        match propagate_or_resolve(self.host, None) {
            None => Ok(true),
            Some(r) => r.recovered().map(|()| false),
        }
    }

    pub(super) fn probe_order(&mut self) -> Vec<Lit> {
        let n = self.host.max_var();
        match self.opts.order {
            ProbeOrder::Index | ProbeOrder::Plan => {
                (0..n).map(|v| Lit::new(Var::from_idx(v), true)).collect()
            }
            ProbeOrder::Frequency => {
                let mut occurs = vec![0u32; n as usize];
                self.host.for_each_clause(false, |c| {
                    for l in c {
                        occurs[l.var().idx() as usize] += 1;
                    }
                });
                let host = &*self.host;
                let mut vars: Vec<Var> = (0..n)
                    .map(Var::from_idx)
                    .filter(|&v| host.is_active(v))
                    .collect();
                vars.sort_by_key(|v| Reverse(occurs[v.idx() as usize]));
                vars.into_iter().map(|v| Lit::new(v, true)).collect()
            }
            ProbeOrder::Random => {
                if n == 0 {
                    return vec![];
                }
                (0..n)
                    .map(|_| {
                        let v = irand(&mut self.seed, n as i32) as u32;
                        let sign = drand(&mut self.seed) < 0.5;
                        Lit::new(Var::from_idx(v), sign)
                    })
                    .collect()
            }
        }
    }

    fn run_probes(&mut self) -> Result<(), Halt> {
        let order = self.probe_order();
        debug!("gbc.probes: {} literals", order.len());
        for i in order {
            self.deadline.check()?;
            self.probe(i)?;
        }
        self.settle()
    }

    /// Probe `i` together with each literal it touches, then alone.
    fn probe(&mut self, i: Lit) -> Result<(), Halt> {
        self.settle()?;
        if self.host.is_fixed(i.var()) {
            return Ok(());
        }
        self.stats.probes += 1;
        trace!("gbc.probe {:?}", i);

        if !self.try_assume(i)? {
            return Ok(());
        }
        let touched = self.touched_literals();

        'pairs: for j in touched {
            self.deadline.check()?;
            let polarities = if self.opts.both_polarities {
                vec![j, !j]
            } else {
                vec![j]
            };
            for j in polarities {
                self.settle()?;
                if self.host.is_fixed(i.var()) {
                    break 'pairs;
                }
                if self.host.is_fixed(j.var()) || !self.try_assume(i)? {
                    continue;
                }
                if self.host.value(j) != lbool::UNDEF {
                    continue;
                }
                self.stats.pairs += 1;
                if self.try_assume(j)? {
                    self.least_conditional_part(None)?;
                }
                self.host.backtrack(0);
            }
        }

        for &lit in &[i, !i] {
            self.settle()?;
            if self.host.is_fixed(i.var()) {
                break;
            }
            if self.try_assume(lit)? {
                self.least_conditional_part(None)?;
            }
        }
        self.host.backtrack(0);
        Ok(())
    }

    /// Unassigned literals of clauses that the current assignment
    /// falsifies a literal of without satisfying them.
    ///
    /// Every variable, in positive polarity, when `touch` is off.
    pub(super) fn touched_literals(&mut self) -> Vec<Lit> {
        let host = &*self.host;
        if !self.opts.touch {
            return (0..host.max_var())
                .map(|v| Lit::new(Var::from_idx(v), true))
                .filter(|l| !host.is_fixed(l.var()))
                .collect();
        }

        let mut touched = vec![];
        let mut marks = self.marks.scope();
        host.for_each_clause(host.proof_enabled(), |c| {
            let mut has_false = false;
            for &l in c {
                let value = host.value(l);
                if value == lbool::TRUE {
                    return;
                }
                has_false |= value == lbool::FALSE;
            }
            if !has_false {
                return;
            }
            for &l in c {
                if host.value(l) == lbool::UNDEF && !host.is_fixed(l.var()) && marks.mark(l) {
                    touched.push(l);
                }
            }
        });
        touched
    }

    fn run_plan(&mut self, plan: &ProbePlan) -> Result<(), Halt> {
        for group in plan.groups() {
            self.deadline.check()?;
            self.settle()?;
            self.stats.probes += 1;
            trace!("gbc.plan-group {:?}", group.assumptions);

            let mut consistent = true;
            for &lit in &group.assumptions {
                if self.host.is_fixed(lit.var()) || self.host.value(lit) != lbool::UNDEF {
                    continue;
                }
                if !self.try_assume(lit)? {
                    consistent = false;
                    break;
                }
            }
            if consistent {
                self.least_conditional_part(Some(&group.known_good))?;
            }
            self.host.backtrack(0);
        }
        self.settle()
    }
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::gbc::{emit::test::SharedBuf, plan::ProbeGroup, test_util::*, trivial::is_trivial},
        crate::gbc::{AlphaOrder, Shrink},
        crate::SolverInterface,
    };

    fn recorder() -> (Recorder, SharedBuf, SharedBuf) {
        let (main, pr) = (SharedBuf::default(), SharedBuf::default());
        (Recorder::from_writers(main.clone(), pr.clone()), main, pr)
    }

    #[test]
    fn test_small_formula() {
        let mut s = solver(&[&[1, 2], &[-1, 3], &[-2, 3]]);
        let (r, main, pr) = recorder();
        let opts = GbcOpts {
            enabled: true,
            shrink: Shrink::Binary,
            filter_trivial: false,
            ..GbcOpts::default()
        };
        let mut d = Discovery::new(&mut s, opts).with_recorder(r);
        assert_eq!(d.run(None).unwrap(), lbool::UNDEF);
        assert!(d.marks.is_clear());
        let stats = d.finish().unwrap();
        assert!(stats.completed);
        assert_eq!(stats.probes, 1, "2 and 3 are fixed by then");
        assert_eq!(stats.emitted, 2);

        assert!(main.text().starts_with("3\n"));
        assert!(pr.text().starts_with("3 3 1\n"));
        assert_eq!(main.text(), "3\n2\n");
        assert_eq!(pr.text(), "3 3 1\n2 2\n");

        assert_eq!(s.value_lvl_0(Lit::from_dimacs(3)), lbool::TRUE);
        assert!(is_trivial(&mut s, &lits(&[3]), 16).unwrap());
        assert_eq!(s.decision_level(), 0);
        assert_eq!(s.solve_limited(), lbool::TRUE);
    }

    #[test]
    fn test_small_formula_default_opts() {
        let mut s = solver(&[&[1, 2], &[-1, 3], &[-2, 3]]);
        let (r, main, _pr) = recorder();
        let mut d = Discovery::new(&mut s, GbcOpts::default()).with_recorder(r);
        assert_eq!(d.run(None).unwrap(), lbool::UNDEF);
        let stats = d.finish().unwrap();
        assert!(stats.completed);
        // shrinking on 3 refutes -3, so the unit (3) is learnt, then filtered
        assert_eq!(stats.trivial, 1);
        assert_eq!(stats.emitted, 1);
        assert_eq!(main.text(), "2\n");

        assert_eq!(s.value_lvl_0(Lit::from_dimacs(3)), lbool::TRUE);
        assert!(is_trivial(&mut s, &lits(&[3]), 16).unwrap());
        assert_eq!(s.solve_limited(), lbool::TRUE);
    }

    #[test]
    fn test_unsat_found_by_a_shrink_retry() {
        // -6 and 6 are both implied; shrinking on 5 learns -6 first
        let clauses: &[&[i32]] = &[
            &[1, 9],
            &[-1, 5],
            &[5, 6],
            &[-6, 7],
            &[-6, -7],
            &[6, 8],
            &[6, -8],
        ];
        let mut s = solver(clauses);
        assert_eq!(s.solve_limited(), lbool::FALSE);

        let mut s = solver(clauses);
        let mut d = Discovery::new(&mut s, GbcOpts::default());
        assert_eq!(d.run(None).unwrap(), lbool::FALSE);
        assert!(!d.stats().completed);
        drop(d);
        assert!(s.is_unsat());
        assert_eq!(s.solve_limited(), lbool::FALSE);
    }

    #[test]
    fn test_both_polarities() {
        // only probing 1 touches anything: 2 and 3, through (-1 2 3)
        let pairs = |both_polarities| {
            let mut s = solver(&[&[-1, 2, 3], &[4, 5]]);
            let opts = GbcOpts {
                both_polarities,
                learn: false,
                ..GbcOpts::default()
            };
            let mut d = Discovery::new(&mut s, opts);
            assert_eq!(d.run(None).unwrap(), lbool::UNDEF);
            assert!(d.stats().completed);
            d.stats().pairs
        };
        assert_eq!(pairs(false), 2);
        assert_eq!(pairs(true), 4);
    }

    #[test]
    fn test_zero_budget() {
        let mut s = solver(&[&[1, 2], &[-1, 3], &[-2, 3]]);
        let n = s.num_clauses();
        let opts = GbcOpts {
            time_limit: 0.0,
            filter_trivial: false,
            ..GbcOpts::default()
        };
        let mut d = Discovery::new(&mut s, opts);
        assert_eq!(d.run(None).unwrap(), lbool::UNDEF);
        assert_eq!(d.stats().probes, 0);
        assert!(!d.stats().completed);
        drop(d);
        assert_eq!(s.num_clauses(), n);
        assert_eq!(s.cb().n_gbc(), 0);
        assert_eq!(s.decision_level(), 0);
    }

    fn replay_once() -> String {
        let mut s = solver(&[&[10, -5], &[11, -6], &[-10, -5], &[-11, -6], &[5, 6, 2, 3]]);
        let mut plan = ProbePlan::new();
        plan.push(ProbeGroup {
            assumptions: lits(&[10, 11]),
            known_good: lits(&[10, 11]),
        });
        let (r, main, _pr) = recorder();
        let opts = GbcOpts {
            order: ProbeOrder::Plan,
            shrink: Shrink::Replay,
            skip_decisions: false,
            seed: Some(7),
            ..GbcOpts::default()
        };
        let mut d = Discovery::new(&mut s, opts).with_recorder(r);
        assert_eq!(d.run(Some(&plan)).unwrap(), lbool::UNDEF);
        assert!(d.stats().completed);
        assert_eq!(d.stats().probes, 1);
        main.text()
    }

    #[test]
    fn test_replay_is_deterministic() {
        let first = replay_once();
        assert_eq!(first, "11 10\n");
        assert_eq!(first, replay_once());
    }

    #[test]
    fn test_plan_needs_a_plan() {
        let mut s = solver(&[&[1, 2]]);
        let opts = GbcOpts {
            order: ProbeOrder::Plan,
            ..GbcOpts::default()
        };
        let mut d = Discovery::new(&mut s, opts);
        let e = d.run(None).unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::InvalidInput);

        let mut plan = ProbePlan::new();
        plan.push(ProbeGroup {
            assumptions: lits(&[7]),
            known_good: vec![],
        });
        assert!(d.run(Some(&plan)).is_err(), "variable 7 does not exist");
    }

    #[test]
    fn test_frequency_order() {
        let mut s = solver(&[&[6, 7], &[6], &[1, 2], &[2, 3], &[-2, 4], &[3, 5]]);
        let opts = GbcOpts {
            order: ProbeOrder::Frequency,
            ..GbcOpts::default()
        };
        let mut d = Discovery::new(&mut s, opts);
        // 6 is fixed, hence inactive
        assert_eq!(ints(&d.probe_order()), vec![2, 3, 1, 4, 5, 7]);
    }

    #[test]
    fn test_random_order_is_seeded() {
        let orders: Vec<Vec<i32>> = (0..2)
            .map(|_| {
                let mut s = solver(&[&[1, 2, 3, 4, 5]]);
                let opts = GbcOpts {
                    order: ProbeOrder::Random,
                    alpha_order: AlphaOrder::Random,
                    seed: Some(12345),
                    ..GbcOpts::default()
                };
                let mut d = Discovery::new(&mut s, opts);
                ints(&d.probe_order())
            })
            .collect();
        assert_eq!(orders[0], orders[1]);
        assert_eq!(orders[0].len(), 5);
        assert!(orders[0].iter().all(|&i| i != 0 && i.abs() <= 5));
    }

    #[test]
    fn test_touched_literals() {
        let mut s = solver(&[&[-1, 2, 3], &[-1, 4], &[1, 5], &[-1, 3, 6]]);
        s.assume(Lit::from_dimacs(1));
        assert!(s.propagate());
        let mut d = Discovery::new(&mut s, GbcOpts::default());
        // (-1 4) is satisfied by 4; (1 5) by 1
        assert_eq!(ints(&d.touched_literals()), vec![2, 3, 6]);
        assert!(d.marks.is_clear());

        d.opts.touch = false;
        assert_eq!(ints(&d.touched_literals()), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_unsat_found_while_probing() {
        let mut s = solver(&[&[1, 2], &[1, -2], &[-1, 3], &[-1, -3]]);
        let mut d = Discovery::new(&mut s, GbcOpts::default());
        assert_eq!(d.run(None).unwrap(), lbool::FALSE);
        assert!(!d.stats().completed);
        drop(d);
        assert!(s.is_unsat());
    }
}
