/*****************************************************************************************[callbacks.rs]
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

use crate::clause::{lbool, Kind, Lit};

/// Basic callbacks to the solver
///
/// Typically intended for printing/statistics
pub trait Callbacks {
    /// Called before starting to solve
    fn on_start(&mut self) {}

    /// Called after a clause GC
    fn on_gc(&mut self, _old_size: usize, _new_size: usize) {}

    /// called regularly to indicate progress. The status is only computed
    /// if the callback actually wants it.
    fn on_progress<F>(&mut self, _f: F)
    where
        F: FnOnce() -> ProgressStatus,
    {
    }

    /// Called at each restart
    fn on_restart(&mut self) {}

    /// Called when a result is computed
    fn on_result(&mut self, _s: lbool) {}

    /// Called when a clause is added (learnt, or found by the discovery pass)
    fn on_new_clause(&mut self, _c: &[Lit], _k: Kind) {}

    /// Called when a clause is removed
    fn on_delete_clause(&mut self, _c: &[Lit]) {}

    /// Should we stop? called regularly for asynchronous interrupts and such
    fn stop(&self) -> bool {
        false
    }
}

/// Progress indicator from the SAT solver.
///
/// This is given to `Callbacks` regularly so it can log it somehow.
#[derive(Debug, Clone, Copy)]
pub struct ProgressStatus {
    pub conflicts: i32,
    pub dec_vars: i32,
    pub n_clauses: u64,
    pub n_clause_lits: i32,
    pub max_learnt: i32,
    pub n_learnt: u64,
    pub n_learnt_lits: f64,
    pub progress_estimate: f64,
}

/// Basic set of callbacks
///
/// Stores a function to `stop`, and optionally prints progress lines
pub struct Basic {
    stop: Option<Box<dyn Fn() -> bool>>, // to stop
    verbose: bool,
    n_gbc: u64,
}

impl Callbacks for Basic {
    fn on_start(&mut self) {
        if self.verbose {
            println!("c ============================[ Search Statistics ]==============================");
            println!("c | Conflicts |          ORIGINAL         |          LEARNT          | Progress |");
            println!("c |           |    Vars  Clauses Literals |    Limit  Clauses Lit/Cl |          |");
            println!("c ===============================================================================");
        }
    }

    fn on_progress<F>(&mut self, f: F)
    where
        F: FnOnce() -> ProgressStatus,
    {
        if self.verbose {
            let p = f();
            println!(
                "c | {:9} | {:7} {:8} {:8} | {:8} {:8} {:6.0} | {:6.3} % |",
                p.conflicts,
                p.dec_vars,
                p.n_clauses,
                p.n_clause_lits,
                p.max_learnt,
                p.n_learnt,
                p.n_learnt_lits,
                p.progress_estimate
            );
        }
    }

    fn on_result(&mut self, _s: lbool) {
        if self.verbose {
            println!("c ===============================================================================");
        }
    }

    fn on_new_clause(&mut self, _c: &[Lit], k: Kind) {
        if k == Kind::Gbc {
            self.n_gbc += 1;
        }
    }

    fn stop(&self) -> bool {
        match self.stop {
            None => false,
            Some(ref f) => f(),
        }
    }
}

impl Basic {
    /// Allocate a new set of callbacks
    pub fn new() -> Self {
        Basic {
            stop: None,
            verbose: false,
            n_gbc: 0,
        }
    }

    /// Set the `stop` function
    pub fn set_stop<F>(&mut self, f: F)
    where
        F: 'static + Fn() -> bool,
    {
        self.stop = Some(Box::new(f));
    }

    /// Print progress lines on stdout
    pub fn set_verbose(&mut self, b: bool) {
        self.verbose = b;
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Number of globally blocked clauses seen so far
    pub fn n_gbc(&self) -> u64 {
        self.n_gbc
    }
}

impl Default for Basic {
    fn default() -> Self {
        Basic::new()
    }
}
