/*****************************************************************************************[core.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)
Copyright (c) 2018-2018, Masaki Hara

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
    crate::callbacks::{Callbacks, ProgressStatus},
    crate::clause::{self, lbool, CRef, ClauseAllocator, DeletePred, Lit, OccListsData, VMap, Var},
    crate::gbc::GbcHost,
    crate::interface::SolverInterface,
    crate::intmap::{Comparator, Heap, HeapData},
    crate::proof::Proof,
    crate::utils,
    std::{
        cmp, f64, fmt, mem,
        sync::atomic::{AtomicBool, Ordering},
    },
};

/// The main solver structure
///
/// A `Solver` object contains the whole state of the SAT solver, including
/// a clause allocator, literals, clauses, and statistics.
///
/// It is parametrized by `Callbacks`
pub struct Solver<Cb: Callbacks> {
    // Extra results: (read-only member variable)
    /// If problem is satisfiable, this vector contains the model (if any).
    model: Vec<lbool>,

    cb: Cb, // the callbacks
    asynch_interrupt: AtomicBool,

    /// List of problem clauses, including globally blocked clauses.
    clauses: Vec<CRef>,
    /// List of learnt clauses.
    learnts: Vec<CRef>,

    v: SolverV,
    tmp_learnt: Vec<Lit>,
    /// DRAT/PR proof, if enabled
    proof: Option<Proof>,
}

/// The current assignments.
struct VarState {
    /// A heuristic measurement of the activity of a variable.
    activity: VMap<f64>,
    /// Current assignment for each variable.
    ass: VMap<lbool>,
    /// Stores reason and level for each variable.
    vardata: VMap<VarData>,
    /// Amount to bump next variable with.
    var_inc: f64,
    var_decay: f64,

    /// Assignment stack; stores all assigments made in the order they were made.
    trail: Vec<Lit>,
    /// Separator indices for different decision levels in `trail`.
    trail_lim: Vec<i32>,
}

struct SolverV {
    vars: VarState,

    learntsize_adjust_start_confl: i32,
    learntsize_adjust_inc: f64,
    max_learnts: f64,
    learntsize_adjust_confl: f64,
    learntsize_adjust_cnt: i32,

    remove_satisfied: bool,

    // Statistics: (read-only member variable)
    solves: u64,
    starts: u64,
    decisions: u64,
    rnd_decisions: u64,
    propagations: u64,
    conflicts: u64,
    dec_vars: u64,
    max_literals: u64,
    tot_literals: u64,
    gbc_clauses: u64,
    gbc_units: u64,

    num_clauses: u64,
    num_learnts: u64,
    clauses_literals: u64,
    learnts_literals: u64,

    // Mode of operation:
    clause_decay: f64,
    random_var_freq: f64,
    random_seed: f64,
    luby_restart: bool,
    /// Controls conflict clause minimization (0=none, 1=basic, 2=deep).
    ccmin_mode: i32,
    /// Controls the level of phase saving (0=none, 1=limited, 2=full).
    phase_saving: i32,
    /// Use random polarities for branching heuristics.
    rnd_pol: bool,
    /// Initialize variable activities with a small random value.
    rnd_init_act: bool,
    /// The fraction of wasted memory allowed before a garbage collection is triggered.
    garbage_frac: f64,
    /// Minimum number to set the learnts limit to.
    min_learnts_lim: i32,

    /// The initial restart limit. (default 100)
    restart_first: i32,
    /// The factor with which the restart limit is multiplied in each restart. (default 1.5)
    restart_inc: f64,
    /// The intitial limit for learnt clauses is a factor of the original clauses. (default 1 / 3)
    learntsize_factor: f64,
    /// The limit for learnt clauses is multiplied with this factor each restart. (default 1.1)
    learntsize_inc: f64,

    /// The preferred polarity of each variable.
    polarity: VMap<bool>,
    /// The users preferred polarity of each variable.
    user_pol: VMap<lbool>,
    /// Declares if a variable is eligible for selection in the decision heuristic.
    decision: VMap<bool>,
    /// `watches[lit]` is a list of constraints watching 'lit' (will go there if literal becomes true).
    watches_data: OccListsData<Lit, Watcher>,
    /// A priority queue of variables ordered with respect to the variable activity.
    order_heap_data: HeapData<Var>,
    /// If `false`, the constraints are already unsatisfiable. No part of the solver state may be used!
    ok: bool,
    /// Amount to bump next clause with.
    cla_inc: f64,
    /// Head of queue (as index into the trail -- no more explicit propagation queue in MiniSat).
    qhead: i32,
    /// Number of top-level assignments since last execution of 'simplify()'.
    simp_db_assigns: i32,
    /// Remaining number of propagations that must be made before next execution of 'simplify()'.
    simp_db_props: i64,
    /// Set by `search()`.
    progress_estimate: f64,
    /// Conflict found by the last external `propagate`, waiting for `analyze`.
    pending_confl: Option<CRef>,

    /// Next variable to be created.
    next_var: Var,
    ca: ClauseAllocator,

    // Temporaries (to reduce allocation overhead). Each variable is prefixed by the method in which it is
    // used, except `seen` wich is used in several places.
    seen: VMap<bool>,
    minimize_stack: Vec<Lit>,
    analyze_toclear: Vec<Lit>,

    // Resource contraints:
    conflict_budget: i64,
    propagation_budget: i64,
}

/// Print the model as DIMACS
pub struct SolverPrintDimacs<'a, Cb: Callbacks + 'a> {
    s: &'a Solver<Cb>,
}

mod dimacs {
    use super::*;

    impl<'a, Cb: Callbacks> fmt::Display for SolverPrintDimacs<'a, Cb> {
        fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
            write!(out, "v ")?;
            for (i, &val) in self.s.model.iter().enumerate() {
                if val == lbool::TRUE {
                    write!(out, "{} ", i + 1)?
                } else if val == lbool::FALSE {
                    write!(out, "-{} ", i + 1)?
                }
            }
            write!(out, "0")
        }
    }
}

// public API
impl<Cb: Callbacks> SolverInterface for Solver<Cb> {
    fn new_var(&mut self, upol: lbool, dvar: bool) -> Var {
        self.v.new_var(upol, dvar)
    }

    fn new_var_default(&mut self) -> Var {
        self.new_var(lbool::UNDEF, true)
    }

    fn var_of_int(&mut self, v_idx: u32) -> Var {
        while v_idx >= self.num_vars() {
            self.new_var_default();
        }
        let var = Var::from_idx(v_idx);
        debug_assert_eq!(var.idx(), v_idx);
        var
    }

    // in the API, we can only add clauses at level 0
    fn add_clause_reuse(&mut self, clause: &mut Vec<Lit>) -> bool {
        debug!("add toplevel clause {:?}", clause);
        debug_assert_eq!(
            self.v.decision_level(),
            0,
            "add clause at non-zero decision level"
        );
        clause.sort_unstable();
        self.add_clause_(clause)
    }

    fn solve_limited(&mut self) -> lbool {
        self.asynch_interrupt.store(false, Ordering::SeqCst);
        self.solve_internal()
    }

    #[inline(always)]
    fn simplify(&mut self) -> bool {
        self.simplify_internal()
    }

    fn value_var(&self, v: Var) -> lbool {
        self.model
            .get(v.idx() as usize)
            .map_or(lbool::UNDEF, |&v| v)
    }
    fn value_lit(&self, v: Lit) -> lbool {
        self.value_var(v.var()) ^ !v.sign()
    }
    fn get_model(&self) -> &[lbool] {
        &self.model
    }
    fn is_ok(&self) -> bool {
        self.v.ok
    }

    fn num_vars(&self) -> u32 {
        self.v.num_vars()
    }
    fn num_clauses(&self) -> u64 {
        self.v.num_clauses
    }
    fn num_conflicts(&self) -> u64 {
        self.v.conflicts
    }
    fn num_propagations(&self) -> u64 {
        self.v.propagations
    }
    fn num_decisions(&self) -> u64 {
        self.v.decisions
    }
    fn num_restarts(&self) -> u64 {
        self.v.starts
    }

    fn value_lvl_0(&self, lit: Lit) -> lbool {
        let mut res = self.v.value_lit(lit);
        if self.v.level(lit.var()) != 0 {
            res = lbool::UNDEF;
        }
        res
    }

    fn print_stats(&self) {
        println!("c restarts              : {}", self.v.starts);
        println!("c conflicts             : {:<12}", self.v.conflicts);
        println!(
            "c decisions             : {:<12}   ({:4.2} % random)",
            self.v.decisions,
            self.v.rnd_decisions as f32 * 100.0 / self.v.decisions.max(1) as f32
        );
        println!("c propagations          : {:<12}", self.v.propagations);
        println!(
            "c conflict literals     : {:<12}   ({:4.2} % deleted)",
            self.v.tot_literals,
            (self.v.max_literals - self.v.tot_literals) as f64 * 100.0
                / self.v.max_literals.max(1) as f64
        );
        println!(
            "c global clauses        : {:<12}   ({} units)",
            self.v.gbc_clauses + self.v.gbc_units,
            self.v.gbc_units
        );
    }

    fn proved_at_lvl_0(&self) -> &[Lit] {
        self.v.vars.proved_at_lvl_0()
    }
}

impl<Cb: Callbacks + Default> Default for Solver<Cb> {
    fn default() -> Self {
        Solver::new(SolverOpts::default(), Default::default())
    }
}

/// The solver as seen by the discovery pass.
///
/// Everything happens on the live trail: assumptions are ordinary decision
/// levels, and conflicts are learnt from like during search.
impl<Cb: Callbacks> GbcHost for Solver<Cb> {
    fn max_var(&self) -> u32 {
        self.v.num_vars()
    }

    fn decision_level(&self) -> u32 {
        self.v.decision_level()
    }

    fn backtrack(&mut self, level: u32) {
        self.cancel_until(level)
    }

    fn assume(&mut self, lit: Lit) {
        debug_assert_eq!(self.v.value_lit(lit), lbool::UNDEF);
        trace!("gbc.assume {:?} at level {}", lit, 1 + self.v.decision_level());
        self.v.vars.new_decision_level();
        self.v.vars.unchecked_enqueue(lit, CRef::UNDEF);
    }

    fn propagate(&mut self) -> bool {
        if !self.v.ok {
            return false;
        }
        match self.v.propagate() {
            Some(cr) => {
                self.v.pending_confl = Some(cr);
                false
            }
            None => true,
        }
    }

    fn analyze(&mut self) {
        let confl = match self.v.pending_confl.take() {
            Some(cr) => cr,
            None => return,
        };
        if self.v.decision_level() == 0 {
            self.set_unsat();
        } else {
            self.learn_from_conflict(confl);
        }
    }

    fn is_unsat(&self) -> bool {
        !self.v.ok
    }

    #[inline]
    fn value(&self, lit: Lit) -> lbool {
        self.v.value_lit(lit)
    }

    #[inline]
    fn level(&self, lit: Lit) -> i32 {
        self.v.level_lit(lit)
    }

    #[inline]
    fn is_fixed(&self, v: Var) -> bool {
        self.v.value(v) != lbool::UNDEF && self.v.level(v) == 0
    }

    fn is_decision(&self, lit: Lit) -> bool {
        self.v.value_lit(lit) != lbool::UNDEF
            && self.v.level_lit(lit) > 0
            && self.v.reason(lit.var()) == CRef::UNDEF
    }

    fn is_active(&self, v: Var) -> bool {
        !self.is_fixed(v)
    }

    fn proof_enabled(&self) -> bool {
        self.proof.is_some()
    }

    fn for_each_clause<F>(&self, include_redundant: bool, mut f: F)
    where
        F: FnMut(&[Lit]),
    {
        let redundant: &[CRef] = if include_redundant { &self.learnts } else { &[] };
        for &cr in self.clauses.iter().chain(redundant.iter()) {
            let c = self.v.ca.get_ref(cr);
            if !c.removed() {
                f(c.lits());
            }
        }
    }

    fn for_each_binary<F>(&self, lit: Lit, mut f: F)
    where
        F: FnMut(Lit),
    {
        for w in &self.v.watches_data[!lit] {
            let c = self.v.ca.get_ref(w.cref);
            if c.size() == 2 && !c.removed() {
                f(if c[0] == lit { c[1] } else { c[0] });
            }
        }
    }

    fn add_gbc_clause(&mut self, clause: &[Lit], witness: &[Lit]) {
        if !self.v.ok {
            return;
        }
        self.cancel_until(0);

        // simplify w.r.t. level 0, keeping the given order
        let mut c: Vec<Lit> = Vec::with_capacity(clause.len());
        for &lit in clause {
            let value = self.v.value_lit(lit);
            if value == lbool::TRUE || c.contains(&!lit) {
                return; // satisfied or tautology
            } else if value == lbool::UNDEF && !c.contains(&lit) {
                c.push(lit);
            }
        }
        debug!("gbc.add-clause {:?} (witness {:?})", c, witness);

        if c.is_empty() {
            self.set_unsat();
            return;
        }
        if let Some(proof) = self.proof.as_mut() {
            // the pivot goes first on a PR line
            let mut line = c.clone();
            match witness.first().and_then(|p| line.iter().position(|l| l == p)) {
                Some(i) => {
                    line.swap(0, i);
                    proof.create_clause_with_witness(&line, witness);
                }
                None => proof.create_clause(&line),
            }
        }
        self.cb.on_new_clause(&c, clause::Kind::Gbc);

        if c.len() == 1 {
            self.v.vars.unchecked_enqueue(c[0], CRef::UNDEF);
            self.v.gbc_units += 1;
        } else {
            let cr = self.v.ca.alloc(&c, clause::Kind::Gbc);
            self.clauses.push(cr);
            self.v.attach_clause(cr);
            self.v.gbc_clauses += 1;
        }

        if self.v.propagate().is_some() {
            self.set_unsat();
        }
    }

    fn add_gbc_unit(&mut self, lit: Lit, witness: &[Lit]) {
        self.add_gbc_clause(&[lit], witness)
    }
}

// main algorithm
impl<Cb: Callbacks> Solver<Cb> {
    /// Create a new solver with the given options and callbacks.
    pub fn new(opts: SolverOpts, cb: Cb) -> Self {
        assert!(opts.check());
        Self {
            model: vec![],
            cb,
            clauses: vec![],
            learnts: vec![],
            asynch_interrupt: AtomicBool::new(false),
            v: SolverV::new(&opts),
            tmp_learnt: vec![],
            proof: if opts.produce_proof {
                Some(Proof::new())
            } else {
                None
            },
        }
    }

    fn simplify_internal(&mut self) -> bool {
        debug_assert_eq!(self.v.decision_level(), 0);

        if !self.v.ok || self.v.propagate().is_some() {
            self.set_unsat();
            return false;
        }

        if self.v.num_assigns() as i32 == self.v.simp_db_assigns || self.v.simp_db_props > 0 {
            return true;
        }

        self.remove_satisfied(ClauseSetSelect::Learnt); // Remove satisfied learnt clauses
        if self.v.remove_satisfied {
            self.remove_satisfied(ClauseSetSelect::Original); // remove satisfied normal clauses
        }
        self.check_garbage();
        self.v.rebuild_order_heap();

        self.v.simp_db_assigns = self.v.num_assigns() as i32;
        // (shouldn't depend on stats really, but it will do for now)
        self.v.simp_db_props = (self.v.clauses_literals + self.v.learnts_literals) as i64;

        true
    }

    /// Search for a model the specified number of conflicts.
    ///
    /// Use negative value for `nof_conflicts` indicate infinity.
    ///
    /// # Output:
    ///
    /// - `lbool::TRUE` if a partial assigment that is consistent with respect to the clauseset is found. If
    ///    all variables are decision variables, this means that the clause set is satisfiable.
    /// - `lbool::FALSE` if the clause set is unsatisfiable.
    /// - 'lbool::UNDEF` if the bound on number of conflicts is reached.
    fn search(&mut self, nof_conflicts: i32) -> lbool {
        debug_assert!(self.v.ok);
        let mut conflict_c = 0;
        self.v.starts += 1;

        loop {
            // boolean propagation
            if let Some(confl) = self.v.propagate() {
                conflict_c += 1;
                if self.v.decision_level() == 0 {
                    self.v.conflicts += 1;
                    return lbool::FALSE;
                }
                self.learn_from_conflict(confl);

                self.v.learntsize_adjust_cnt -= 1;
                if self.v.learntsize_adjust_cnt == 0 {
                    self.v.learntsize_adjust_confl *= self.v.learntsize_adjust_inc;
                    self.v.learntsize_adjust_cnt = self.v.learntsize_adjust_confl as i32;
                    self.v.max_learnts *= self.v.learntsize_inc;

                    let trail_lim_head = self
                        .v
                        .vars
                        .trail_lim
                        .first()
                        .cloned()
                        .unwrap_or(self.v.vars.trail.len() as i32);
                    let v = &self.v;
                    self.cb.on_progress(|| ProgressStatus {
                        conflicts: v.conflicts as i32,
                        dec_vars: v.dec_vars as i32 - trail_lim_head,
                        n_clauses: v.num_clauses,
                        n_clause_lits: v.clauses_literals as i32,
                        max_learnt: v.max_learnts as i32,
                        n_learnt: v.num_learnts,
                        n_learnt_lits: v.learnts_literals as f64 / v.num_learnts.max(1) as f64,
                        progress_estimate: v.progress_estimate() * 100.0,
                    });
                }
            } else {
                // no boolean conflict
                if (nof_conflicts >= 0 && conflict_c >= nof_conflicts) || !self.within_budget() {
                    // Reached bound on number of conflicts:
                    self.v.progress_estimate = self.v.progress_estimate();
                    self.cancel_until(0);
                    return lbool::UNDEF;
                }

                // Simplify the set of problem clauses:
                if self.v.decision_level() == 0 && !self.simplify_internal() {
                    return lbool::FALSE;
                }

                if self.learnts.len() as f64 - self.v.num_assigns() as f64 >= self.v.max_learnts {
                    // Reduce the set of learnt clauses:
                    self.reduce_db();
                }

                let next = self.v.pick_branch_lit();
                if next == Lit::UNDEF {
                    // Model found:
                    return lbool::TRUE;
                }
                self.v.decisions += 1;

                // Increase decision level and enqueue `next`
                // with no justification since it's a decision
                self.v.vars.new_decision_level();
                trace!("pick-next {:?}", next);
                self.v.vars.unchecked_enqueue(next, CRef::UNDEF);
            }
        }
    }

    /// Analyze the conflict `confl`, learn a clause from it, and backtrack
    /// so that the learnt clause propagates.
    ///
    /// Precondition: decision level is not 0
    fn learn_from_conflict(&mut self, confl: CRef) {
        debug_assert!(self.v.decision_level() > 0);
        self.v.conflicts += 1;
        let mut learnt = mem::take(&mut self.tmp_learnt);
        let btlevel = self.v.analyze(confl, &self.learnts, &mut learnt);
        self.add_learnt_and_backtrack(&learnt, btlevel);
        self.tmp_learnt = learnt;

        self.v.vars.var_decay_activity();
        self.v.cla_decay_activity();
    }

    /// Add a learnt clause and backtrack/propagate as necessary
    fn add_learnt_and_backtrack(&mut self, learnt: &[Lit], btlevel: i32) {
        self.cb.on_new_clause(learnt, clause::Kind::Learnt);
        if let Some(proof) = self.proof.as_mut() {
            proof.create_clause(&learnt);
        }
        self.cancel_until(btlevel as u32);

        // propagate the only lit of `learnt` that isn't false
        if learnt.len() == 1 {
            // directly propagate the unit clause at level 0
            self.v.vars.unchecked_enqueue(learnt[0], CRef::UNDEF);
        } else {
            // propagate the lit, justified by `cr`
            let cr = self.v.ca.alloc(learnt, clause::Kind::Learnt);
            self.learnts.push(cr);
            self.v.attach_clause(cr);
            self.v.cla_bump_activity(&self.learnts, cr);
            self.v.vars.unchecked_enqueue(learnt[0], cr);
        }
    }

    /// Main solve method.
    fn solve_internal(&mut self) -> lbool {
        assert!(self.v.decision_level() == 0);
        self.model.clear();
        if !self.v.ok {
            return lbool::FALSE;
        }

        self.v.solves += 1;

        self.v.max_learnts = self.v.num_clauses as f64 * self.v.learntsize_factor;
        if self.v.max_learnts < self.v.min_learnts_lim as f64 {
            self.v.max_learnts = self.v.min_learnts_lim as f64;
        }

        self.v.learntsize_adjust_confl = self.v.learntsize_adjust_start_confl as f64;
        self.v.learntsize_adjust_cnt = self.v.learntsize_adjust_confl as i32;
        let mut status;

        info!("search.start");
        self.cb.on_start();

        // Search:
        let mut curr_restarts: i32 = 0;
        loop {
            let rest_base = if self.v.luby_restart {
                utils::luby(self.v.restart_inc, curr_restarts)
            } else {
                f64::powi(self.v.restart_inc, curr_restarts)
            };
            let nof_clauses = (rest_base * self.v.restart_first as f64) as i32;
            status = self.search(nof_clauses);
            if !self.within_budget() || status != lbool::UNDEF {
                break;
            }
            info!("search.restart({})", curr_restarts);
            curr_restarts += 1;
            self.cb.on_restart();
        }

        self.cb.on_result(status);

        if status == lbool::TRUE {
            // Extend & copy model:
            let num_vars = self.num_vars();
            self.model.resize(num_vars as usize, lbool::UNDEF);
            for i in 0..num_vars {
                self.model[i as usize] = self.v.value(Var::from_idx(i));
            }
        } else if status == lbool::FALSE {
            self.set_unsat();
        }

        self.cancel_until(0);
        debug!("res: {:?}", status);
        status
    }

    /// The clause set is unsatisfiable; record the empty clause once.
    fn set_unsat(&mut self) {
        if self.v.ok {
            self.v.ok = false;
            if let Some(proof) = self.proof.as_mut() {
                proof.create_clause(&Vec::<Lit>::new());
            }
        }
    }

    /// Remove half of the learnt clauses, minus the clauses locked by the current assignment. Locked
    /// clauses are clauses that are reason to some assignment. Binary clauses are never removed.
    fn reduce_db(&mut self) {
        let extra_lim = self.v.cla_inc / self.learnts.len() as f64; // Remove any clause below this activity

        debug!("reduce_db.start");

        {
            let ca = &self.v.ca;
            self.learnts.sort_unstable_by(|&x, &y| {
                let x = ca.get_ref(x);
                let y = ca.get_ref(y);
                Ord::cmp(&(x.size() <= 2), &(y.size() <= 2)).then(
                    PartialOrd::partial_cmp(&x.activity(), &y.activity())
                        .unwrap_or(cmp::Ordering::Equal),
                )
            });
        }
        // Don't delete binary or locked clauses. From the rest, delete clauses from the first half
        // and clauses with activity smaller than `extra_lim`:
        let n = self.learnts.len();
        let mut j = 0;
        for i in 0..n {
            let cr = self.learnts[i];
            let cond = {
                let c = self.v.ca.get_ref(cr);
                c.size() > 2
                    && !self.v.locked(cr)
                    && (i < n / 2 || (c.activity() as f64) < extra_lim)
            };
            if cond {
                self.v.remove_clause(cr);
                let c = self.v.ca.get_ref(cr);
                self.cb.on_delete_clause(c.lits());
                if let Some(proof) = self.proof.as_mut() {
                    proof.delete_clause(c);
                }
            } else {
                self.learnts[j] = cr;
                j += 1;
            }
        }
        self.learnts.truncate(j);

        debug!("reduce_db.done (deleted {})", n - j);

        self.check_garbage();
    }

    /// Shrink the given set to contain only non-satisfied clauses.
    fn remove_satisfied(&mut self, which: ClauseSetSelect) {
        assert_eq!(self.v.decision_level(), 0);
        let cs: &mut Vec<CRef> = match which {
            ClauseSetSelect::Learnt => &mut self.learnts,
            ClauseSetSelect::Original => &mut self.clauses,
        };
        let self_v = &mut self.v;
        let proof = &mut self.proof;
        let cb = &mut self.cb;
        cs.retain(|&cr| {
            let satisfied = self_v.satisfied(cr);
            if satisfied {
                self_v.remove_clause(cr);
                trace!("remove satisfied clause {:?}", self_v.ca.get_ref(cr).lits());
                cb.on_delete_clause(self_v.ca.get_ref(cr).lits());
            } else {
                let vars = &self_v.vars;
                let c = self_v.ca.get_mut(cr);
                // Trim clause (but keep the 2 first lits as they are watching):
                debug_assert_eq!(vars.value_lit(c[0]), lbool::UNDEF);
                debug_assert_eq!(vars.value_lit(c[1]), lbool::UNDEF);
                let orig_size = c.size();
                let mut k = 2;
                let mut end = orig_size;
                while k < end {
                    if vars.value_lit(c[k]) == lbool::FALSE {
                        // this lit is false at level 0, move it past `end`
                        end -= 1;
                        c.lits_mut().swap(k as usize, end as usize);
                    } else {
                        k += 1;
                    }
                }
                if end < orig_size {
                    if let Some(proof) = proof.as_mut() {
                        proof.create_clause(&&c.lits()[..end as usize]);
                        proof.delete_clause(&*c);
                    }
                    c.shrink(end);
                    self_v.ca.free_amount(orig_size - end);
                }
            }
            !satisfied
        });
    }

    /// Revert to the state at given level (keeping all assignment at `level` but not beyond).
    fn cancel_until(&mut self, level: u32) {
        if self.v.decision_level() > level {
            trace!("solver.cancel-until {}", level);
            self.v.cancel_until(level);
        }
    }

    /// Garbage collect the clause allocator by moving alive clauses into
    /// another allocator.
    fn garbage_collect(&mut self) {
        // Initialize the next region to a size corresponding to the estimated utilization degree. This
        // is not precise but should avoid some unnecessary reallocations for the new region:
        let mut to = ClauseAllocator::with_start_cap(self.v.ca.len() - self.v.ca.wasted());

        self.v
            .reloc_all(&mut self.learnts, &mut self.clauses, &mut to);

        self.cb.on_gc(
            (self.v.ca.len() * ClauseAllocator::UNIT_SIZE) as usize,
            (to.len() * ClauseAllocator::UNIT_SIZE) as usize,
        );
        self.v.ca = to;
    }

    /// Check whether the space wasted by dead clauses in the clause allocator exceeds
    /// the threshold
    fn check_garbage(&mut self) {
        if self.v.ca.wasted() as f64 > self.v.ca.len() as f64 * self.v.garbage_frac {
            self.garbage_collect();
        }
    }

    /// Temporary access to the callbacks
    pub fn cb_mut(&mut self) -> &mut Cb {
        &mut self.cb
    }

    /// Temporary access to the callbacks
    pub fn cb(&self) -> &Cb {
        &self.cb
    }

    pub fn dimacs_model(&self) -> SolverPrintDimacs<Cb> {
        SolverPrintDimacs { s: self }
    }

    /// The proof recorded so far, if proof production is enabled
    pub fn proof(&self) -> Option<&Proof> {
        self.proof.as_ref()
    }

    /// Interrupt search asynchronously
    pub fn interrupt_async(&self) {
        self.asynch_interrupt.store(true, Ordering::Relaxed);
    }

    fn has_been_interrupted(&self) -> bool {
        self.asynch_interrupt.load(Ordering::Relaxed)
    }

    fn within_budget(&self) -> bool {
        !self.has_been_interrupted()
            && (self.v.conflict_budget < 0 || self.v.conflicts < self.v.conflict_budget as u64)
            && (self.v.propagation_budget < 0
                || self.v.propagations < self.v.propagation_budget as u64)
            && !self.cb.stop()
    }

    /// Limit the number of conflicts of the next calls to `solve_limited`
    /// (negative for no limit)
    pub fn set_conflict_budget(&mut self, x: i64) {
        self.v.conflict_budget = if x < 0 { -1 } else { self.v.conflicts as i64 + x };
    }

    /// Add clause.
    ///
    /// Precondition: `clause` is sorted for some ordering on `Lit`
    fn add_clause_(&mut self, clause: &mut Vec<Lit>) -> bool {
        if !self.v.ok {
            return false;
        }

        let orig_len = clause.len();
        let mut last_lit = Lit::UNDEF;
        let mut j = 0;
        // remove duplicates, true literals, etc.
        for i in 0..clause.len() {
            let lit_i = clause[i];
            let value = self.v.value_lit(lit_i);
            let lvl = self.v.level_lit(lit_i);
            if (value == lbool::TRUE && lvl == 0) || lit_i == !last_lit {
                return true; // tauto or satisfied already at level 0
            } else if !(value == lbool::FALSE && lvl == 0) && lit_i != last_lit {
                // not a duplicate
                last_lit = lit_i;
                clause[j] = lit_i;
                j += 1;
            }
        }
        clause.truncate(j);

        if j < orig_len {
            if let Some(proof) = self.proof.as_mut() {
                proof.create_clause(clause);
            }
        }

        if clause.is_empty() {
            self.set_unsat();
            return false;
        } else if clause.len() == 1 {
            self.v.vars.unchecked_enqueue(clause[0], CRef::UNDEF);
        } else {
            let cr = self.v.ca.alloc(clause, clause::Kind::Axiom);
            self.clauses.push(cr);
            self.v.attach_clause(cr);
        }

        true
    }
}

impl SolverV {
    #[inline(always)]
    pub fn num_assigns(&self) -> u32 {
        self.vars.num_assigns()
    }

    #[inline(always)]
    fn num_vars(&self) -> u32 {
        self.next_var.idx()
    }

    #[inline(always)]
    pub fn level(&self, x: Var) -> i32 {
        self.vars.level(x)
    }

    #[inline(always)]
    pub fn level_lit(&self, x: Lit) -> i32 {
        self.level(x.var())
    }

    #[inline(always)]
    pub fn value(&self, x: Var) -> lbool {
        self.vars.value(x)
    }

    #[inline(always)]
    pub fn value_lit(&self, x: Lit) -> lbool {
        self.vars.value_lit(x)
    }

    fn order_heap(&mut self) -> Heap<Var, VarOrder> {
        self.order_heap_data.promote(VarOrder {
            activity: &self.vars.activity,
        })
    }

    fn set_decision_var(&mut self, v: Var, b: bool) {
        if b && !self.decision[v] {
            self.dec_vars += 1;
        } else if !b && self.decision[v] {
            self.dec_vars -= 1;
        }
        self.decision[v] = b;
        self.insert_var_order(v);
    }

    fn insert_var_order(&mut self, x: Var) {
        if !self.order_heap_data.in_heap(x) && self.decision[x] {
            self.order_heap().insert(x);
        }
    }

    fn cla_decay_activity(&mut self) {
        self.cla_inc *= 1.0 / self.clause_decay;
    }

    fn cla_bump_activity(&mut self, learnts: &[CRef], cr: CRef) {
        let new_activity = {
            let c = self.ca.get_mut(cr);
            let r = c.activity() + self.cla_inc as f32;
            c.set_activity(r);
            r
        };
        if new_activity > 1e20 {
            // Rescale:
            for &learnt in learnts.iter() {
                let c = self.ca.get_mut(learnt);
                let r = c.activity() * 1e-20;
                c.set_activity(r);
            }
            self.cla_inc *= 1e-20;
        }
    }

    /// Pick a literal to make a decision with
    fn pick_branch_lit(&mut self) -> Lit {
        let mut next = Var::UNDEF;

        // Random decision:
        if utils::drand(&mut self.random_seed) < self.random_var_freq
            && !self.order_heap_data.is_empty()
        {
            let idx_tmp =
                utils::irand(&mut self.random_seed, self.order_heap_data.len() as i32) as usize;
            next = self.order_heap_data[idx_tmp];
            if self.value(next) == lbool::UNDEF && self.decision[next] {
                self.rnd_decisions += 1;
            }
        }

        // Activity based decision:
        while next == Var::UNDEF || self.value(next) != lbool::UNDEF || !self.decision[next] {
            let mut order_heap = self.order_heap();
            if order_heap.is_empty() {
                next = Var::UNDEF;
                break;
            } else {
                next = order_heap.remove_min();
            }
        }

        // Choose polarity based on different polarity modes (global or per-variable):
        if next == Var::UNDEF {
            Lit::UNDEF
        } else if self.user_pol[next] != lbool::UNDEF {
            Lit::new(next, self.user_pol[next] == lbool::TRUE)
        } else if self.rnd_pol {
            Lit::new(next, utils::drand(&mut self.random_seed) < 0.5)
        } else {
            Lit::new(next, self.polarity[next])
        }
    }

    fn new_var(&mut self, upol: lbool, dvar: bool) -> Var {
        let v = self.next_var;
        self.next_var = Var::from_idx(self.next_var.idx() + 1);
        self.watches_data.init(Lit::new(v, false));
        self.watches_data.init(Lit::new(v, true));
        self.vars.ass.insert_default(v, lbool::UNDEF);
        self.vars
            .vardata
            .insert_default(v, VarData::new(CRef::UNDEF, 0));
        let act = if self.rnd_init_act {
            utils::drand(&mut self.random_seed) * 0.00001
        } else {
            0.0
        };
        self.vars.activity.insert_default(v, act);
        self.seen.insert_default(v, false);
        self.polarity.insert_default(v, false);
        self.user_pol.insert_default(v, upol);
        self.decision.reserve_default(v);
        self.set_decision_var(v, dvar);
        v
    }

    /// Analyze conflict and produce a reason clause.
    ///
    /// # Pre-conditions:
    ///
    /// - current decision level must be greater than root level.
    /// - every literal of `confl` is false in the current trail
    ///
    /// # Post-conditions:
    ///
    /// - the backtrack level is returned.
    /// - `out_learnt[0]` is the asserting literal at the backtrack level.
    /// - if `out_learnt.size() > 1` then `out_learnt[1]` has the greatest decision level of the
    ///   rest of literals. There may be others from the same level though.
    fn analyze(&mut self, confl: CRef, learnts: &[CRef], out_learnt: &mut Vec<Lit>) -> i32 {
        out_learnt.clear();
        out_learnt.push(Lit::UNDEF); // leave room for the UIP

        let conflict_level = self.decision_level() as i32;
        let mut cr = confl;
        let mut path_c = 0;
        let mut p = Lit::UNDEF;
        let mut index = self.vars.trail.len();

        loop {
            debug_assert_ne!(cr, CRef::UNDEF, "analyze: reached a decision literal");
            if self.ca.get_ref(cr).learnt() {
                self.cla_bump_activity(learnts, cr);
            }

            // the first literal of a reason clause is `p` itself
            let start = if p == Lit::UNDEF { 0 } else { 1 };
            let size = self.ca.get_ref(cr).size();
            for k in start..size {
                let q = self.ca.get_ref(cr)[k];
                let lvl = self.vars.level(q.var());
                if !self.seen[q.var()] && lvl > 0 {
                    self.vars
                        .var_bump_activity(&mut self.order_heap_data, q.var());
                    self.seen[q.var()] = true;
                    if lvl >= conflict_level {
                        // at conflict level: need to eliminate this lit by resolution
                        path_c += 1;
                    } else {
                        out_learnt.push(q); // part of the learnt clause
                    }
                }
            }

            // Select next literal in the trail to look at:
            while !self.seen[self.vars.trail[index - 1].var()] {
                index -= 1;
            }
            p = self.vars.trail[index - 1];
            index -= 1;
            cr = self.reason(p.var());
            self.seen[p.var()] = false;
            path_c -= 1;

            if path_c <= 0 {
                break;
            }
        }
        out_learnt[0] = !p;

        trace!("analyze-learnt: {:?} (before minimization)", &out_learnt);
        self.max_literals += out_learnt.len() as u64;
        self.minimize_conflict(out_learnt);

        // Find correct backtrack level:
        let btlevel = if out_learnt.len() == 1 {
            0
        } else {
            let mut max_i = 1;
            let mut max_level = self.level_lit(out_learnt[max_i]);
            // Find the first literal assigned at the next-highest level:
            for i in 2..out_learnt.len() {
                let level = self.level_lit(out_learnt[i]);
                if level > max_level {
                    max_i = i;
                    max_level = level;
                }
            }
            // Swap-in this literal at index 1:
            out_learnt.swap(max_i, 1);
            max_level
        };

        for i in 0..self.analyze_toclear.len() {
            let x = self.analyze_toclear[i].var();
            self.seen[x] = false; // (`seen[]` is now cleared)
        }
        debug_assert!(out_learnt
            .iter()
            .all(|&l| self.value_lit(l) == lbool::FALSE));
        btlevel
    }

    /// An abstraction of the level of a variable
    #[inline]
    fn abstract_level(&self, v: Var) -> u32 {
        1 << (self.level(v) & 31)
    }

    fn minimize_conflict(&mut self, out_learnt: &mut Vec<Lit>) {
        // Simplify conflict clause:
        self.analyze_toclear.clear();
        self.analyze_toclear.extend_from_slice(&out_learnt);
        let new_size = if self.ccmin_mode == 2 {
            let mut abstract_levels = 0;
            for a in out_learnt[1..].iter() {
                abstract_levels |= self.abstract_level(a.var())
            }

            let mut j = 1;
            for i in 1..out_learnt.len() {
                let lit = out_learnt[i];
                // can eliminate `lit` only if it's redundant *and* not a decision
                if self.reason(lit.var()) == CRef::UNDEF
                    || !self.lit_redundant(lit, abstract_levels)
                {
                    out_learnt[j] = lit;
                    j += 1;
                }
            }
            j
        } else if self.ccmin_mode == 1 {
            let mut j = 1;
            for i in 1..out_learnt.len() {
                let lit = out_learnt[i];
                let reason = self.reason(lit.var());

                let retain = reason == CRef::UNDEF || {
                    let c = self.ca.get_ref(reason);
                    c.lits()[1..]
                        .iter()
                        .any(|q| !self.seen[q.var()] && self.level(q.var()) > 0)
                };
                if retain {
                    out_learnt[j] = lit;
                    j += 1;
                }
            }
            j
        } else {
            out_learnt.len()
        };

        self.tot_literals += new_size as u64;
        debug_assert!(new_size <= out_learnt.len());
        out_learnt.truncate(new_size);
    }

    /// Check if `p` can be removed from a conflict clause `C`.
    ///
    /// It can be removed from `C` if it is propagation-implied
    /// by literals of level 0 exclusively or if `C x p.reason` subsumes `C`.
    fn lit_redundant(&mut self, p: Lit, abstract_levels: u32) -> bool {
        self.minimize_stack.clear();
        self.minimize_stack.push(p);

        let top = self.analyze_toclear.len();

        while let Some(q) = self.minimize_stack.pop() {
            let cr = self.reason(q.var());
            debug_assert_ne!(cr, CRef::UNDEF);

            // `q` comes from some propagation with `c`, check if these lits can
            // also be eliminated or are already in the learnt clause
            let size = self.ca.get_ref(cr).size();
            for k in 1..size {
                let l = self.ca.get_ref(cr)[k];
                // Variable at level 0 or previously removable: just skip
                if self.level(l.var()) == 0 || self.seen[l.var()] {
                    continue;
                }

                if self.reason(l.var()) != CRef::UNDEF
                    && (self.abstract_level(l.var()) & abstract_levels) != 0
                {
                    self.seen[l.var()] = true;
                    self.minimize_stack.push(l);
                    self.analyze_toclear.push(l);
                } else {
                    // cannot remove `l`, cancel
                    for i in top..self.analyze_toclear.len() {
                        let x = self.analyze_toclear[i].var();
                        self.seen[x] = false;
                    }
                    self.analyze_toclear.truncate(top);
                    return false;
                }
            }
        }

        true
    }

    /// Propagates all enqueued facts.
    ///
    /// If a conflict arises, the conflicting clause is returned,
    /// otherwise `None`.
    ///
    /// # Post-conditions:
    ///
    /// - the propagation queue is empty, even if there was a conflict.
    fn propagate(&mut self) -> Option<CRef> {
        let mut confl = None;
        let mut num_props: u32 = 0;

        while (self.qhead as usize) < self.vars.trail.len() {
            // `p` is the next enqueued fact to propagate.
            let p = self.vars.trail[self.qhead as usize];
            self.qhead += 1;
            num_props += 1;

            // new watches never go into `watches[p]`, so it can be taken out
            let mut ws = mem::take(
                self.watches_data
                    .lookup_mut_pred(p, &WatcherDeleted { ca: &self.ca }),
            );
            let false_lit = !p;
            let mut i: usize = 0;
            let mut j: usize = 0;
            let end: usize = ws.len();
            'clauses: while i < end {
                // Try to avoid inspecting the clause:
                let blocker = ws[i].blocker;
                if self.vars.value_lit(blocker) == lbool::TRUE {
                    ws[j] = ws[i];
                    j += 1;
                    i += 1;
                    continue;
                }

                // Make sure the false literal is data[1]:
                let cr = ws[i].cref;
                let c = self.ca.get_mut(cr);
                if c[0] == false_lit {
                    c[0] = c[1];
                    c[1] = false_lit;
                }
                debug_assert_eq!(c[1], false_lit);
                i += 1;

                // If 0th watch is true, then clause is already satisfied.
                let first = c[0];
                let w = Watcher::new(cr, first);
                if first != blocker && self.vars.value_lit(first) == lbool::TRUE {
                    ws[j] = w;
                    j += 1;
                    continue;
                }

                // Look for new watch:
                for k in 2..c.size() {
                    if self.vars.value_lit(c[k]) != lbool::FALSE {
                        c[1] = c[k];
                        c[k] = false_lit;
                        debug_assert_ne!(!c[1], p);
                        self.watches_data[!c[1]].push(w);
                        continue 'clauses;
                    }
                }

                // Did not find watch -- clause is unit under assignment:
                ws[j] = w;
                j += 1;
                if self.vars.value_lit(first) == lbool::FALSE {
                    confl = Some(cr);
                    self.qhead = self.vars.trail.len() as i32;
                    // Copy the remaining watches:
                    while i < end {
                        ws[j] = ws[i];
                        j += 1;
                        i += 1;
                    }
                } else {
                    self.vars.unchecked_enqueue(first, cr);
                }
            }
            ws.truncate(j);
            self.watches_data[p] = ws;
        }
        self.propagations += num_props as u64;
        self.simp_db_props -= num_props as i64;

        confl
    }

    fn rebuild_order_heap(&mut self) {
        let mut vs = vec![];
        for v in (0..self.num_vars()).map(Var::from_idx) {
            if self.decision[v] && self.value(v) == lbool::UNDEF {
                vs.push(v);
            }
        }
        self.order_heap().build(&vs);
    }

    /// Move to the given clause allocator, where clause indices might differ
    fn reloc_all(
        &mut self,
        learnts: &mut Vec<CRef>,
        clauses: &mut Vec<CRef>,
        to: &mut ClauseAllocator,
    ) {
        // All watchers:
        self.watches_data
            .clean_all_pred(&WatcherDeleted { ca: &self.ca });
        for v in (0..self.num_vars()).map(Var::from_idx) {
            for &sign in &[false, true] {
                let p = Lit::new(v, sign);
                for watch in self.watches_data[p].iter_mut() {
                    self.ca.reloc(&mut watch.cref, to);
                }
            }
        }

        // All reasons:
        for i in 0..self.vars.trail.len() {
            let v = self.vars.trail[i].var();
            let reason = self.reason(v);
            if reason != CRef::UNDEF {
                // `locked` must not look at a clause that was already moved
                if self.ca.get_ref(reason).reloced() || self.locked(reason) {
                    debug_assert!(!self.ca.get_ref(reason).removed());
                    self.ca.reloc(&mut self.vars.vardata[v].reason, to);
                } else {
                    self.vars.vardata[v].reason = CRef::UNDEF;
                }
            }
        }

        // All learnt, then all original:
        for cs in vec![learnts, clauses] {
            let ca = &mut self.ca;
            cs.retain(|&cr| !ca.get_ref(cr).removed());
            for cr in cs.iter_mut() {
                ca.reloc(cr, to);
            }
        }
    }

    /// Attach a clause to watcher lists
    fn attach_clause(&mut self, cr: CRef) {
        let (c0, c1, learnt, size) = {
            let c = self.ca.get_ref(cr);
            debug_assert!(c.size() > 1);
            (c[0], c[1], c.learnt(), c.size())
        };
        self.watches_data[!c0].push(Watcher::new(cr, c1));
        self.watches_data[!c1].push(Watcher::new(cr, c0));
        if learnt {
            self.num_learnts += 1;
            self.learnts_literals += size as u64;
        } else {
            self.num_clauses += 1;
            self.clauses_literals += size as u64;
        }
    }

    /// Revert to the state at given level (keeping all assignment at `level` but not beyond).
    fn cancel_until(&mut self, level: u32) {
        debug_assert!(self.decision_level() > level);
        let trail_lim_last = *self.vars.trail_lim.last().expect("trail_lim is empty") as usize;
        let trail_lim_level = self.vars.trail_lim[level as usize] as usize;
        for c in (trail_lim_level..self.vars.trail.len()).rev() {
            let x = self.vars.trail[c].var();
            self.vars.ass[x] = lbool::UNDEF;
            if self.phase_saving > 1 || (self.phase_saving == 1 && c > trail_lim_last) {
                self.polarity[x] = self.vars.trail[c].sign();
            }
            self.insert_var_order(x);
        }
        self.qhead = trail_lim_level as i32;
        self.vars.trail.truncate(trail_lim_level);
        self.vars.trail_lim.truncate(level as usize);
        self.pending_confl = None;
    }

    /// Detach a clause from watcher lists, lazily: the watch lists are only
    /// marked dirty.
    fn detach_clause(&mut self, cr: CRef) {
        let (c0, c1, csize, clearnt) = {
            let c = self.ca.get_ref(cr);
            (c[0], c[1], c.size(), c.learnt())
        };
        debug_assert!(csize > 1);

        self.watches_data.smudge(!c0);
        self.watches_data.smudge(!c1);

        if clearnt {
            self.num_learnts -= 1;
            self.learnts_literals -= csize as u64;
        } else {
            self.num_clauses -= 1;
            self.clauses_literals -= csize as u64;
        }
    }

    /// Detach and free a clause.
    fn remove_clause(&mut self, cr: CRef) {
        self.detach_clause(cr);
        // Don't leave pointers to free'd memory!
        if self.locked(cr) {
            let v = self.ca.get_ref(cr)[0].var();
            self.vars.vardata[v].reason = CRef::UNDEF;
        }
        self.ca.free(cr);
    }

    fn satisfied(&self, cr: CRef) -> bool {
        self.ca
            .get_ref(cr)
            .iter()
            .any(|&lit| self.value_lit(lit) == lbool::TRUE)
    }

    #[inline(always)]
    pub fn decision_level(&self) -> u32 {
        self.vars.decision_level()
    }

    #[inline(always)]
    fn reason(&self, x: Var) -> CRef {
        self.vars.reason(x)
    }

    /// Returns `true` if a clause is a reason for some implication in the current state.
    fn locked(&self, cr: CRef) -> bool {
        let c0 = self.ca.get_ref(cr)[0];
        self.value_lit(c0) == lbool::TRUE && self.reason(c0.var()) == cr
    }

    fn progress_estimate(&self) -> f64 {
        let mut progress = 0.0;
        let f = 1.0 / self.num_vars() as f64;

        for i in 0..self.decision_level() + 1 {
            let beg: i32 = if i == 0 {
                0
            } else {
                self.vars.trail_lim[i as usize - 1]
            };
            let end: i32 = if i == self.decision_level() {
                self.vars.trail.len() as i32
            } else {
                self.vars.trail_lim[i as usize]
            };
            progress += f64::powi(f, i as i32) * (end - beg) as f64;
        }

        progress / self.num_vars() as f64
    }

    fn new(opts: &SolverOpts) -> Self {
        Self {
            vars: VarState::new(opts),
            num_clauses: 0,
            num_learnts: 0,
            clauses_literals: 0,
            learnts_literals: 0,

            clause_decay: opts.clause_decay,
            random_var_freq: opts.random_var_freq,
            random_seed: opts.random_seed,
            luby_restart: opts.luby_restart,
            ccmin_mode: opts.ccmin_mode,
            phase_saving: opts.phase_saving,
            rnd_pol: false,
            rnd_init_act: opts.rnd_init_act,
            garbage_frac: opts.garbage_frac,
            min_learnts_lim: opts.min_learnts_lim,
            restart_first: opts.restart_first,
            restart_inc: opts.restart_inc,

            // Parameters (experimental):
            learntsize_adjust_start_confl: 100,
            learntsize_adjust_inc: 1.5,

            // Statistics: (formerly in 'SolverStats')
            solves: 0,
            starts: 0,
            decisions: 0,
            rnd_decisions: 0,
            propagations: 0,
            conflicts: 0,
            dec_vars: 0,
            max_literals: 0,
            tot_literals: 0,
            gbc_clauses: 0,
            gbc_units: 0,

            // Parameters (the rest):
            learntsize_factor: 1.0 / 3.0,
            learntsize_inc: 1.1,

            polarity: VMap::new(),
            user_pol: VMap::new(),
            decision: VMap::new(),
            watches_data: OccListsData::new(),
            order_heap_data: HeapData::new(),
            ok: true,
            cla_inc: 1.0,
            qhead: 0,
            simp_db_assigns: -1,
            simp_db_props: 0,
            progress_estimate: 0.0,
            pending_confl: None,
            remove_satisfied: false,
            next_var: Var::from_idx(0),

            ca: ClauseAllocator::new(),

            seen: VMap::new(),
            minimize_stack: vec![],
            analyze_toclear: vec![],
            max_learnts: 0.0,
            learntsize_adjust_confl: 0.0,
            learntsize_adjust_cnt: 0,

            // Resource constraints:
            conflict_budget: -1,
            propagation_budget: -1,
        }
    }
}

impl VarState {
    fn new(opts: &SolverOpts) -> Self {
        Self {
            ass: VMap::new(),
            vardata: VMap::new(),
            activity: VMap::new(),
            var_inc: 1.0,
            var_decay: opts.var_decay,
            trail: vec![],
            trail_lim: vec![],
        }
    }

    #[inline(always)]
    pub fn num_assigns(&self) -> u32 {
        self.trail.len() as u32
    }

    /// Begins a new decision level.
    fn new_decision_level(&mut self) {
        let lvl = self.trail.len() as i32;
        self.trail_lim.push(lvl);
    }

    fn proved_at_lvl_0(&self) -> &[Lit] {
        // find where the end of the level-0 part of the trail is
        let end = self
            .trail_lim
            .get(0)
            .map_or(self.trail.len(), |&x| x as usize);
        &self.trail[..end]
    }

    #[inline(always)]
    pub fn value(&self, x: Var) -> lbool {
        self.ass[x]
    }

    #[inline(always)]
    fn value_lit(&self, x: Lit) -> lbool {
        self.ass[x.var()] ^ !x.sign()
    }

    #[inline(always)]
    fn level(&self, x: Var) -> i32 {
        self.vardata[x].level
    }

    #[inline(always)]
    fn reason(&self, x: Var) -> CRef {
        self.vardata[x].reason
    }

    fn var_decay_activity(&mut self) {
        self.var_inc *= 1.0 / self.var_decay;
    }

    #[inline(always)]
    pub fn decision_level(&self) -> u32 {
        self.trail_lim.len() as u32
    }

    fn unchecked_enqueue(&mut self, p: Lit, from: CRef) {
        debug_assert_eq!(
            self.value_lit(p),
            lbool::UNDEF,
            "lit {:?} should be undef",
            p
        );
        self.ass[p.var()] = lbool::new(p.sign());
        self.vardata[p.var()] = VarData::new(from, self.decision_level() as i32);
        self.trail.push(p);
    }

    /// Increase a variable with the current 'bump' value.
    fn var_bump_activity(&mut self, order_heap_data: &mut HeapData<Var>, v: Var) {
        self.activity[v] += self.var_inc;
        if self.activity[v] > 1e100 {
            // Rescale:
            for (_, x) in self.activity.iter_mut() {
                *x *= 1e-100;
            }
            self.var_inc *= 1e-100;
        }

        // Update order_heap with respect to new activity:
        let mut order_heap = order_heap_data.promote(VarOrder {
            activity: &self.activity,
        });
        if order_heap.in_heap(v) {
            order_heap.decrease(v);
        }
    }
}

#[derive(Debug)]
enum ClauseSetSelect {
    Original,
    Learnt,
}

#[derive(Debug, Clone, Copy)]
struct VarData {
    reason: CRef,
    level: i32,
}

#[derive(Debug, Clone, Copy)]
struct Watcher {
    cref: CRef,
    blocker: Lit,
}

struct VarOrder<'a> {
    activity: &'a VMap<f64>,
}

/// Predicate to test whether a clause has been removed from some lit's watchlist
struct WatcherDeleted<'a> {
    ca: &'a ClauseAllocator,
}

impl Default for VarData {
    fn default() -> Self {
        Self {
            reason: CRef::UNDEF,
            level: 0,
        }
    }
}

impl VarData {
    #[inline(always)]
    fn new(reason: CRef, level: i32) -> Self {
        Self { reason, level }
    }
}

impl<'a> Comparator<Var> for VarOrder<'a> {
    fn cmp(&self, lhs: &Var, rhs: &Var) -> cmp::Ordering {
        PartialOrd::partial_cmp(&self.activity[*rhs], &self.activity[*lhs])
            .unwrap_or(cmp::Ordering::Equal)
    }
}

impl<'a> DeletePred<Watcher> for WatcherDeleted<'a> {
    #[inline]
    fn deleted(&self, w: &Watcher) -> bool {
        self.ca.get_ref(w.cref).removed()
    }
}

impl Watcher {
    fn new(cref: CRef, blocker: Lit) -> Self {
        Self { cref, blocker }
    }
}

pub struct SolverOpts {
    pub var_decay: f64,
    pub clause_decay: f64,
    pub random_var_freq: f64,
    pub random_seed: f64,
    pub ccmin_mode: i32,
    pub phase_saving: i32,
    pub rnd_init_act: bool,
    pub luby_restart: bool,
    pub restart_first: i32,
    pub restart_inc: f64,
    pub garbage_frac: f64,
    pub min_learnts_lim: i32,
    /// Record a DRAT/PR proof
    pub produce_proof: bool,
}

impl Default for SolverOpts {
    fn default() -> SolverOpts {
        Self {
            var_decay: 0.95,
            clause_decay: 0.999,
            random_var_freq: 0.0,
            random_seed: 91648253.0,
            ccmin_mode: 2,
            phase_saving: 2,
            rnd_init_act: false,
            luby_restart: true,
            restart_first: 100,
            restart_inc: 2.0,
            garbage_frac: 0.20,
            min_learnts_lim: 0,
            produce_proof: false,
        }
    }
}

impl SolverOpts {
    /// Check that options are valid.
    pub fn check(&self) -> bool {
        (0.0 < self.var_decay && self.var_decay < 1.0)
            && (0.0 < self.clause_decay && self.clause_decay < 1.0)
            && (0.0 <= self.random_var_freq && self.random_var_freq <= 1.0)
            && (0.0 < self.random_seed && self.random_seed < f64::INFINITY)
            && (0 <= self.ccmin_mode && self.ccmin_mode <= 2)
            && (0 <= self.phase_saving && self.phase_saving <= 2)
            && 1 <= self.restart_first
            && (1.0 < self.restart_inc && self.restart_inc < f64::INFINITY)
            && (0.0 < self.garbage_frac && self.garbage_frac < f64::INFINITY)
            && 0 <= self.min_learnts_lim
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::BasicSolver;

    fn solver_with(clauses: &[&[i32]], opts: SolverOpts) -> BasicSolver {
        let mut s = Solver::new(opts, Default::default());
        for c in clauses {
            let mut lits: Vec<Lit> = c
                .iter()
                .map(|&i| {
                    let v = s.var_of_int(i.unsigned_abs() - 1);
                    Lit::new(v, i > 0)
                })
                .collect();
            s.add_clause_reuse(&mut lits);
        }
        s
    }

    fn solver(clauses: &[&[i32]]) -> BasicSolver {
        solver_with(clauses, SolverOpts::default())
    }

    fn lit(i: i32) -> Lit {
        Lit::from_dimacs(i)
    }

    #[test]
    fn test_sat_model() {
        let mut s = solver(&[&[1, 2], &[-1, 3], &[-2, -3], &[2, 3]]);
        assert_eq!(s.solve_limited(), lbool::TRUE);
        let m = |i| s.value_lit(lit(i)) == lbool::TRUE;
        assert!(m(1) || m(2));
        assert!(!m(1) || m(3));
        assert!(!m(2) || !m(3));
        assert!(m(2) || m(3));
    }

    #[test]
    fn test_unsat_pigeons() {
        // 3 pigeons, 2 holes: p_ij = pigeon i in hole j
        let p = |i: i32, j: i32| 2 * i + j + 1;
        let mut cs: Vec<Vec<i32>> = vec![];
        for i in 0..3 {
            cs.push(vec![p(i, 0), p(i, 1)]);
        }
        for j in 0..2 {
            for i1 in 0..3 {
                for i2 in (i1 + 1)..3 {
                    cs.push(vec![-p(i1, j), -p(i2, j)]);
                }
            }
        }
        let refs: Vec<&[i32]> = cs.iter().map(|c| &c[..]).collect();
        let mut opts = SolverOpts::default();
        opts.produce_proof = true;
        let mut s = solver_with(&refs, opts);
        assert_eq!(s.solve_limited(), lbool::FALSE);
        assert!(!s.is_ok());
        let proof = s.proof().unwrap().to_string();
        assert!(proof.ends_with("\n0\n") || proof == "0\n", "proof: {}", proof);
    }

    #[test]
    fn test_host_assume_and_learn() {
        // 1 -> 2, 1 -> 3, (-2 v -3)
        let mut s = solver(&[&[-1, 2], &[-1, 3], &[-2, -3]]);
        assert!(s.simplify());
        s.assume(lit(1));
        assert_eq!(GbcHost::decision_level(&s), 1);
        assert!(s.is_decision(lit(1)));
        assert!(!s.propagate());
        s.analyze();
        // learnt the unit -1
        assert_eq!(GbcHost::decision_level(&s), 0);
        assert!(s.propagate());
        assert!(s.is_fixed(lit(1).var()));
        assert_eq!(s.value(lit(1)), lbool::FALSE);
        assert!(!s.is_unsat());
    }

    #[test]
    fn test_host_unsat_at_level_0() {
        let mut s = solver(&[&[1, 2], &[1, -2], &[-1, 3], &[-1, -3]]);
        assert!(s.propagate());
        s.assume(lit(1));
        assert!(!s.propagate());
        s.analyze();
        assert!(!s.propagate());
        s.analyze();
        assert!(s.is_unsat());
        assert_eq!(s.solve_limited(), lbool::FALSE);
    }

    #[test]
    fn test_for_each_binary() {
        let s = solver(&[&[1, 2], &[1, -3], &[1, 2, 3], &[-1, 4]]);
        let mut others = vec![];
        s.for_each_binary(lit(1), |o| others.push(o));
        others.sort();
        let mut expected = vec![lit(2), lit(-3)];
        expected.sort();
        assert_eq!(others, expected);
    }

    #[test]
    fn test_add_gbc_clause() {
        let mut opts = SolverOpts::default();
        opts.produce_proof = true;
        let mut s = solver_with(&[&[1, 2, 3], &[-4]], opts);
        assert!(s.simplify());
        s.assume(lit(2));
        assert!(s.propagate());
        let before = s.num_clauses();
        // -4 is false at level 0 and gets dropped
        s.add_gbc_clause(&[lit(3), lit(1), lit(4)], &[lit(1), lit(2)]);
        assert_eq!(GbcHost::decision_level(&s), 0);
        assert_eq!(s.num_clauses(), before + 1);
        assert_eq!(s.cb().n_gbc(), 1);
        assert_eq!(s.proof().unwrap().to_string(), "1 3 1 2 0\n");

        s.var_of_int(4);
        s.add_gbc_unit(lit(5), &[lit(5)]);
        assert_eq!(s.value_lvl_0(lit(5)), lbool::TRUE);
        assert_eq!(s.cb().n_gbc(), 2);

        // satisfied at level 0: nothing happens
        s.add_gbc_clause(&[lit(5), lit(1)], &[lit(5)]);
        assert_eq!(s.cb().n_gbc(), 2);
        assert_eq!(s.solve_limited(), lbool::TRUE);
    }

    #[test]
    fn test_gc_keeps_clauses() {
        let mut opts = SolverOpts::default();
        opts.garbage_frac = 0.01;
        opts.restart_first = 2;
        // a few pigeons to get conflicts, learnt clauses and collections
        let p = |i: i32, j: i32| 3 * i + j + 1;
        let mut cs: Vec<Vec<i32>> = vec![];
        for i in 0..4 {
            cs.push(vec![p(i, 0), p(i, 1), p(i, 2)]);
        }
        for j in 0..3 {
            for i1 in 0..4 {
                for i2 in (i1 + 1)..4 {
                    cs.push(vec![-p(i1, j), -p(i2, j)]);
                }
            }
        }
        let refs: Vec<&[i32]> = cs.iter().map(|c| &c[..]).collect();
        let mut s = solver_with(&refs, opts);
        assert_eq!(s.solve_limited(), lbool::FALSE);
    }
}
