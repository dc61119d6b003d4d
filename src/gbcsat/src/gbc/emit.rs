/*****************************************************************************************[gbc/emit.rs]
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

//! Installing and recording accepted clauses.

use {
    super::{driver::Discovery, GbcHost, Halt},
    crate::clause::{lbool, Lit},
    std::{
        cmp::Reverse,
        ffi::OsString,
        fmt,
        fs::File,
        io::{self, BufWriter, Write},
        path::Path,
    },
};

/// Two append-only text streams of found clauses, one record per line.
///
/// The main stream gets `key conditional...`, the `_pr` stream gets
/// `key conditional... key autarky...`, as signed DIMACS integers.
pub struct Recorder {
    main: Box<dyn Write>,
    pr: Box<dyn Write>,
    records: u64,
}

impl Recorder {
    /// Create `base` and `base` + `"_pr"`.
    pub fn create<P: AsRef<Path>>(base: P) -> io::Result<Self> {
        let base = base.as_ref();
        let mut pr_path = OsString::from(base.as_os_str());
        pr_path.push("_pr");
        let main = BufWriter::new(File::create(base)?);
        let pr = BufWriter::new(File::create(&pr_path)?);
        Ok(Recorder::from_writers(main, pr))
    }

    pub fn from_writers<W1, W2>(main: W1, pr: W2) -> Self
    where
        W1: Write + 'static,
        W2: Write + 'static,
    {
        Recorder {
            main: Box::new(main),
            pr: Box::new(pr),
            records: 0,
        }
    }

    /// Number of records written so far
    pub fn len(&self) -> u64 {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    pub fn record(&mut self, key: Lit, conditional: &[Lit], autarky: &[Lit]) -> io::Result<()> {
        writeln!(self.main, "{}", Line(&[key], conditional, &[], &[]))?;
        writeln!(self.pr, "{}", Line(&[key], conditional, &[key], autarky))?;
        self.records += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.main.flush()?;
        self.pr.flush()
    }
}

impl fmt::Debug for Recorder {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        write!(out, "Recorder({} records)", self.records)
    }
}

struct Line<'a>(&'a [Lit], &'a [Lit], &'a [Lit], &'a [Lit]);

impl<'a> fmt::Display for Line<'a> {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        let parts = [self.0, self.1, self.2, self.3];
        let mut first = true;
        for lit in parts.iter().flat_map(|p| p.iter()) {
            if !first {
                out.write_str(" ")?;
            }
            write!(out, "{}", lit.to_dimacs())?;
            first = false;
        }
        Ok(())
    }
}

/// Sort by decreasing decision level, unassigned literals first.
/// The sort is stable.
pub(crate) fn sort_by_level<H: GbcHost>(host: &H, clause: &mut [Lit]) {
    clause.sort_by_key(|&l| {
        Reverse(if host.value(l) == lbool::UNDEF {
            i32::MAX
        } else {
            host.level(l)
        })
    });
}

impl<'a, H: GbcHost> Discovery<'a, H> {
    /// Install and/or record `clause`, whose assumption side is keyed by `key`.
    pub(super) fn emit(&mut self, clause: Vec<Lit>, key: Lit, autarky: &[Lit]) -> Result<(), Halt> {
        let mut clause = dedup(clause);
        let conditional: Vec<Lit> = clause.iter().copied().filter(|&l| l != key).collect();
        let autarky: Vec<Lit> = autarky.iter().copied().filter(|&l| l != key).collect();
        sort_by_level(&*self.host, &mut clause);
        debug!("gbc.emit {:?} (key {:?})", clause, key);

        self.stats.emitted += 1;
        if clause.len() == 1 {
            self.stats.units += 1;
        }
        if self.opts.learn {
            let mut witness = Vec::with_capacity(autarky.len() + 1);
            witness.push(key);
            witness.extend_from_slice(&autarky);
            if clause.len() == 1 {
                self.host.add_gbc_unit(clause[0], &witness);
            } else {
                self.host.add_gbc_clause(&clause, &witness);
            }
        }
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.record(key, &conditional, &autarky)?;
        }

        if self.host.is_unsat() {
            Err(Halt::Unsat)
        } else {
            Ok(())
        }
    }
}

/// Remove duplicates, keeping first occurrences.
fn dedup(mut v: Vec<Lit>) -> Vec<Lit> {
    let mut i = 0;
    while i < v.len() {
        if v[..i].contains(&v[i]) {
            v.remove(i);
        } else {
            i += 1;
        }
    }
    v
}

#[cfg(test)]
pub(crate) mod test {
    use {
        super::*,
        crate::gbc::{test_util::*, GbcOpts},
        crate::{BasicSolver, SolverInterface},
        std::{cell::RefCell, rc::Rc},
    };

    /// A writer whose content stays readable after it is boxed.
    #[derive(Clone, Default)]
    pub struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl SharedBuf {
        pub fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.borrow()).into_owned()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_record_lines() {
        let (main, pr) = (SharedBuf::default(), SharedBuf::default());
        let mut r = Recorder::from_writers(main.clone(), pr.clone());
        r.record(Lit::from_dimacs(3), &lits(&[-1, 2]), &lits(&[4, -5]))
            .unwrap();
        r.record(Lit::from_dimacs(-7), &[], &[]).unwrap();
        r.flush().unwrap();
        assert_eq!(main.text(), "3 -1 2\n-7\n");
        assert_eq!(pr.text(), "3 -1 2 3 4 -5\n-7 -7\n");
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn test_sort_by_level() {
        let mut s: BasicSolver = solver(&[&[1, 9], &[-1, 2], &[3, 9], &[-3, 4]]);
        s.assume(Lit::from_dimacs(1));
        assert!(s.propagate());
        s.assume(Lit::from_dimacs(3));
        assert!(s.propagate());
        let mut c = lits(&[2, 5, 4, -1, 6, 3]);
        sort_by_level(&s, &mut c);
        assert_eq!(ints(&c), vec![5, 6, 4, 3, 2, -1]);
        let levels: Vec<i32> = c
            .iter()
            .map(|&l| if s.value(l) == lbool::UNDEF { i32::MAX } else { s.level(l) })
            .collect();
        assert!(levels.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_emit_installs_and_records() {
        let mut s = solver(&[&[1, 2, 3], &[-3, 4]]);
        let n = s.num_clauses();
        let (main, pr) = (SharedBuf::default(), SharedBuf::default());
        {
            let mut d = Discovery::new(&mut s, GbcOpts::default())
                .with_recorder(Recorder::from_writers(main.clone(), pr.clone()));
            d.emit(lits(&[-1, 2, -1, 4]), Lit::from_dimacs(4), &lits(&[4, 5]))
                .unwrap();
            assert_eq!(d.stats().emitted, 1);
        }
        assert_eq!(s.num_clauses(), n + 1);
        assert_eq!(s.cb().n_gbc(), 1);
        assert_eq!(main.text(), "4 -1 2\n");
        assert_eq!(pr.text(), "4 -1 2 4 5\n");
    }

    #[test]
    fn test_emit_without_learning() {
        let mut s = solver(&[&[1, 2]]);
        let opts = GbcOpts {
            learn: false,
            ..GbcOpts::default()
        };
        let mut d = Discovery::new(&mut s, opts);
        d.emit(lits(&[1]), Lit::from_dimacs(1), &[]).unwrap();
        assert_eq!(d.stats().units, 1);
        drop(d);
        assert_eq!(s.cb().n_gbc(), 0);
        assert_eq!(s.value_lvl_0(Lit::from_dimacs(1)), lbool::UNDEF);
    }
}
