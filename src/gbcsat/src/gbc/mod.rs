/*****************************************************************************************[gbc/mod.rs]
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

//! Discovery of globally blocked clauses (GBCs).
//!
//! The pass probes the formula with one or two assumed literals, looks at
//! which clauses the resulting partial assignment satisfies (the autarky
//! side) and which it only falsifies literals of (the conditional side),
//! and derives a clause `conditional ∨ key` that can be added without
//! changing satisfiability. Assumption-side literals are then shrunk with
//! one of several strategies before the clause is installed or recorded.
//!
//! The solver is only accessed through [`GbcHost`].

use {
    crate::clause::{lbool, Lit, Var},
    std::{
        fmt, io,
        str::FromStr,
        time::{Duration, Instant, SystemTime, UNIX_EPOCH},
    },
};

mod conditional;
mod cover;
mod driver;
mod emit;
mod marks;
mod plan;
mod shrink;
mod trivial;

pub use self::{
    cover::{greedy_cover, preferred_cover, Cover},
    driver::Discovery,
    emit::Recorder,
    plan::{ProbeGroup, ProbePlan},
};

/// What the discovery pass needs from a CDCL solver.
///
/// All assignments made through `assume` are decision levels on the
/// solver's own trail; `backtrack(0)` must always be allowed.
pub trait GbcHost {
    /// Number of variables. Variables are `0..max_var()`.
    fn max_var(&self) -> u32;

    fn decision_level(&self) -> u32;

    /// Undo all assignments above `level`.
    fn backtrack(&mut self, level: u32);

    /// Open a new decision level with `lit` assigned. `lit` must be unassigned.
    fn assume(&mut self, lit: Lit);

    /// Unit propagation. Returns `false` on conflict, or if the clause set
    /// is already known to be unsatisfiable.
    fn propagate(&mut self) -> bool;

    /// Learn from the conflict found by the last `propagate`, and backtrack
    /// accordingly. A conflict at level 0 makes the solver unsatisfiable.
    fn analyze(&mut self);

    fn is_unsat(&self) -> bool;

    fn value(&self, lit: Lit) -> lbool;

    /// Decision level of an assigned literal.
    fn level(&self, lit: Lit) -> i32;

    /// Is the variable assigned at level 0, for good?
    fn is_fixed(&self, v: Var) -> bool;

    /// Is `lit` assigned as a decision (rather than by propagation)?
    fn is_decision(&self, lit: Lit) -> bool;

    fn is_active(&self, v: Var) -> bool;

    /// Are redundant clauses needed to justify new ones?
    fn proof_enabled(&self) -> bool;

    /// Iterate over live clauses, learnt ones included if `include_redundant`.
    fn for_each_clause<F>(&self, include_redundant: bool, f: F)
    where
        F: FnMut(&[Lit]);

    /// Call `f(other)` for each live binary clause `{lit, other}`.
    fn for_each_binary<F>(&self, lit: Lit, f: F)
    where
        F: FnMut(Lit);

    /// Install a globally blocked clause, justified by `witness`
    /// (`witness[0]` is the key literal of the clause).
    fn add_gbc_clause(&mut self, clause: &[Lit], witness: &[Lit]);

    /// Install a globally blocked unit.
    fn add_gbc_unit(&mut self, lit: Lit, witness: &[Lit]);
}

/// Why a discovery run stopped early.
#[derive(Debug)]
pub(crate) enum Halt {
    /// The clause set is unsatisfiable.
    Unsat,
    /// Conflict analysis did not restore a consistent state in time.
    Exhausted,
    /// Out of wall-clock time.
    Timeout,
    Io(io::Error),
}

impl From<io::Error> for Halt {
    fn from(e: io::Error) -> Self {
        Halt::Io(e)
    }
}

/// Outcome of draining a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolution {
    /// A clause was learnt and propagation succeeded again.
    Progressed,
    Unsat,
    /// The retry bound was spent with propagation still failing.
    Exhausted,
}

impl Resolution {
    /// Only a recovered conflict lets the run go on.
    pub(crate) fn recovered(self) -> Result<(), Halt> {
        match self {
            Resolution::Progressed => Ok(()),
            Resolution::Unsat => Err(Halt::Unsat),
            Resolution::Exhausted => Err(Halt::Exhausted),
        }
    }
}

/// Propagate; on conflict, analyze and propagate again until propagation
/// succeeds, the solver is unsatisfiable, or `retries` analyses were spent.
/// A conflict at level 0 is always analyzed, whatever the bound.
///
/// Returns `None` if the first propagation had no conflict.
pub(crate) fn propagate_or_resolve<H: GbcHost>(
    host: &mut H,
    retries: Option<u32>,
) -> Option<Resolution> {
    if host.propagate() {
        None
    } else {
        Some(resolve(host, retries))
    }
}

fn resolve<H: GbcHost>(host: &mut H, retries: Option<u32>) -> Resolution {
    let mut analyses = 0;
    loop {
        host.analyze();
        analyses += 1;
        if host.is_unsat() {
            return Resolution::Unsat;
        }
        if host.propagate() {
            return Resolution::Progressed;
        }
        if host.is_unsat() {
            return Resolution::Unsat;
        }
        // a pending level 0 conflict must not be dropped
        if host.decision_level() > 0 && retries.map_or(false, |n| analyses >= n) {
            trace!("gbc.resolve: gave up after {} analyses", analyses);
            return Resolution::Exhausted;
        }
    }
}

/// Wall-clock budget of a run.
#[derive(Debug, Clone)]
pub(crate) struct Deadline {
    start: Instant,
    limit: Duration,
}

impl Deadline {
    pub(crate) fn new(secs: f64) -> Self {
        Deadline {
            start: Instant::now(),
            limit: Duration::from_secs_f64(secs.max(0.0)),
        }
    }

    pub(crate) fn check(&self) -> Result<(), Halt> {
        if self.start.elapsed() >= self.limit {
            Err(Halt::Timeout)
        } else {
            Ok(())
        }
    }
}

/// Order in which the driver picks probe literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOrder {
    /// Variables `1..=max_var`, positive polarity.
    Index,
    /// Variables by decreasing number of occurrences.
    Frequency,
    /// Random variables and polarities.
    Random,
    /// Assumption groups from a [`ProbePlan`].
    Plan,
}

/// How assumption-side literals are shrunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shrink {
    Propagate,
    Binary,
    Greedy,
    Replay,
}

/// Order of the assumption-side literals before shrinking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaOrder {
    Identity,
    /// Literals implying more of the others come first.
    Implication,
    Random,
}

impl FromStr for ProbeOrder {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "index" => Ok(ProbeOrder::Index),
            "freq" | "frequency" => Ok(ProbeOrder::Frequency),
            "random" => Ok(ProbeOrder::Random),
            "plan" => Ok(ProbeOrder::Plan),
            _ => Err(format!("unknown probe order `{}`", s)),
        }
    }
}

impl FromStr for Shrink {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "prop" | "propagate" => Ok(Shrink::Propagate),
            "binary" | "bcp" => Ok(Shrink::Binary),
            "greedy" => Ok(Shrink::Greedy),
            "replay" => Ok(Shrink::Replay),
            _ => Err(format!("unknown shrink strategy `{}`", s)),
        }
    }
}

impl FromStr for AlphaOrder {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "none" | "identity" => Ok(AlphaOrder::Identity),
            "implication" => Ok(AlphaOrder::Implication),
            "random" => Ok(AlphaOrder::Random),
            _ => Err(format!("unknown alpha order `{}`", s)),
        }
    }
}

/// Options of the discovery pass.
#[derive(Debug, Clone)]
pub struct GbcOpts {
    /// Run the pass at all
    pub enabled: bool,
    pub order: ProbeOrder,
    pub shrink: Shrink,
    pub alpha_order: AlphaOrder,
    /// Drop candidate clauses that are already implied
    pub filter_trivial: bool,
    /// Longest candidate clause that passes the filter
    pub max_len: usize,
    /// Number of single-key clauses offered when shrinking yields nothing
    pub max_fallback: usize,
    /// Wall-clock budget, in seconds
    pub time_limit: f64,
    /// Random seed; taken from the clock if `None`
    pub seed: Option<u64>,
    /// Restrict secondary probes to literals of touched clauses
    pub touch: bool,
    pub both_polarities: bool,
    /// Skip shrinking, always offer single-key clauses
    pub no_shrink: bool,
    /// Install found clauses into the solver
    pub learn: bool,
    /// Keep decisions out of the assumption side
    pub skip_decisions: bool,
    /// Conflict analyses allowed per shrink step before giving up
    pub shrink_retries: u32,
}

impl Default for GbcOpts {
    fn default() -> Self {
        GbcOpts {
            enabled: false,
            order: ProbeOrder::Index,
            shrink: Shrink::Propagate,
            alpha_order: AlphaOrder::Identity,
            filter_trivial: true,
            max_len: 16,
            max_fallback: 5,
            time_limit: 30.0,
            seed: None,
            touch: true,
            both_polarities: false,
            no_shrink: false,
            learn: true,
            skip_decisions: true,
            shrink_retries: 1,
        }
    }
}

impl GbcOpts {
    /// Check that options are valid.
    pub fn check(&self) -> bool {
        self.max_len >= 1
            && (0.0 <= self.time_limit && self.time_limit.is_finite())
            && self.shrink_retries >= 1
    }

    pub(crate) fn initial_seed(&self) -> f64 {
        let seed = self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(1)
        });
        // `utils::drand` needs a seed in `(0, 2^31 - 1)`
        (seed % 2_147_483_646 + 1) as f64
    }
}

/// Counters of a discovery run.
#[derive(Debug, Clone, Default)]
pub struct GbcStats {
    /// Primary probes (or plan groups) started
    pub probes: u64,
    /// Secondary literals assumed on top of a probe
    pub pairs: u64,
    /// Calls to the least-conditional-part engine
    pub episodes: u64,
    /// Candidate clauses offered
    pub candidates: u64,
    /// Candidates rejected as trivial
    pub trivial: u64,
    pub emitted: u64,
    /// Emitted clauses of size 1
    pub units: u64,
    /// Did every probe run?
    pub completed: bool,
}

impl GbcStats {
    pub fn print(&self) {
        println!("c gbc probes            : {:<12}   ({} pairs)", self.probes, self.pairs);
        println!("c gbc episodes          : {}", self.episodes);
        println!(
            "c gbc candidates        : {:<12}   ({} trivial)",
            self.candidates, self.trivial
        );
        println!(
            "c gbc emitted           : {:<12}   ({} units)",
            self.emitted, self.units
        );
        println!("c gbc completed         : {}", self.completed);
    }
}

impl fmt::Display for ProbeOrder {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ProbeOrder::Index => "index",
            ProbeOrder::Frequency => "freq",
            ProbeOrder::Random => "random",
            ProbeOrder::Plan => "plan",
        };
        out.write_str(s)
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use crate::{core::SolverOpts, BasicSolver, Lit, Solver, SolverInterface};

    pub fn solver(clauses: &[&[i32]]) -> BasicSolver {
        solver_with(clauses, SolverOpts::default())
    }

    pub fn solver_with(clauses: &[&[i32]], opts: SolverOpts) -> BasicSolver {
        let mut s = Solver::new(opts, Default::default());
        for c in clauses {
            let mut c: Vec<Lit> = c
                .iter()
                .map(|&i| {
                    s.var_of_int(i.unsigned_abs() - 1);
                    Lit::from_dimacs(i)
                })
                .collect();
            s.add_clause_reuse(&mut c);
        }
        s
    }

    pub fn lits(v: &[i32]) -> Vec<Lit> {
        v.iter().map(|&i| Lit::from_dimacs(i)).collect()
    }

    pub fn ints(v: &[Lit]) -> Vec<i32> {
        v.iter().map(|l| l.to_dimacs()).collect()
    }
}

#[cfg(test)]
mod test {
    use {
        super::{test_util::*, *},
        crate::SolverInterface,
    };

    #[test]
    fn test_parse_opts() {
        assert_eq!("freq".parse::<ProbeOrder>(), Ok(ProbeOrder::Frequency));
        assert_eq!("bcp".parse::<Shrink>(), Ok(Shrink::Binary));
        assert_eq!("none".parse::<AlphaOrder>(), Ok(AlphaOrder::Identity));
        assert!("sideways".parse::<ProbeOrder>().is_err());
        assert!(GbcOpts::default().check());
        let opts = GbcOpts {
            shrink_retries: 0,
            ..GbcOpts::default()
        };
        assert!(!opts.check());
    }

    #[test]
    fn test_seed_in_range() {
        let opts = GbcOpts {
            seed: Some(0),
            ..GbcOpts::default()
        };
        assert_eq!(opts.initial_seed(), 1.0);
        let opts = GbcOpts {
            seed: None,
            ..GbcOpts::default()
        };
        let s = opts.initial_seed();
        assert!(s > 0.0 && s < 2147483647.0);
    }

    #[test]
    fn test_propagate_or_resolve() {
        let mut s = solver(&[&[-1, 2], &[-1, -2], &[3, 4]]);
        assert_eq!(propagate_or_resolve(&mut s, None), None);
        s.assume(Lit::from_dimacs(1));
        assert_eq!(
            propagate_or_resolve(&mut s, Some(1)),
            Some(Resolution::Progressed)
        );
        assert!(s.is_fixed(Lit::from_dimacs(1).var()));

        let mut s = solver(&[&[1, 2], &[1, -2], &[-1, 3], &[-1, -3]]);
        s.assume(Lit::from_dimacs(-1));
        assert_eq!(propagate_or_resolve(&mut s, None), Some(Resolution::Unsat));
        assert!(s.is_unsat());
        assert_eq!(s.decision_level(), 0);
    }

    #[test]
    fn test_retries_exhausted() {
        // under 1 and 2, learning (-2 -1) conflicts again at level 1
        let clauses: &[&[i32]] = &[&[-2, 3], &[-2, 4], &[-3, -4, -1], &[2, 5], &[2, -5, -1]];
        let mut s = solver(clauses);
        s.assume(Lit::from_dimacs(1));
        assert!(s.propagate());
        s.assume(Lit::from_dimacs(2));
        assert_eq!(
            propagate_or_resolve(&mut s, Some(1)),
            Some(Resolution::Exhausted)
        );
        assert!(matches!(Resolution::Exhausted.recovered(), Err(Halt::Exhausted)));
        assert_eq!(s.decision_level(), 1);
        assert!(!s.is_unsat());

        // one more analysis learns -1
        let mut s = solver(clauses);
        s.assume(Lit::from_dimacs(1));
        assert!(s.propagate());
        s.assume(Lit::from_dimacs(2));
        assert_eq!(
            propagate_or_resolve(&mut s, Some(2)),
            Some(Resolution::Progressed)
        );
        assert_eq!(s.value_lvl_0(Lit::from_dimacs(-1)), lbool::TRUE);
    }

    #[test]
    fn test_level_0_conflict_ignores_retries() {
        // assuming -5 learns -6, which conflicts at level 0
        let mut s = solver(&[&[5, 6], &[-6, 7], &[-6, -7], &[6, 8], &[6, -8]]);
        s.assume(Lit::from_dimacs(-5));
        assert_eq!(
            propagate_or_resolve(&mut s, Some(1)),
            Some(Resolution::Unsat)
        );
        assert!(s.is_unsat());
    }

    #[test]
    fn test_zero_deadline() {
        assert!(matches!(Deadline::new(0.0).check(), Err(Halt::Timeout)));
        assert!(Deadline::new(60.0).check().is_ok());
    }
}
