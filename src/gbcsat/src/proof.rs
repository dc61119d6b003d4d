/*****************************************************************************************[proof.rs]
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

//! DRAT proofs, extended with PR steps for globally blocked clauses.
//!
//! A PR step is printed as the clause, followed by its witness, on a single
//! line. The first literal of the clause and the first literal of the
//! witness are the same pivot.

use {
    crate::{clause::ClauseIterable, Lit},
    std::{fmt, i32},
};

const DELETE: i32 = i32::MAX;

/// A serialized DRAT/PR proof.
#[derive(Debug, Clone, Default)]
pub struct Proof(Vec<i32>);

mod proof {
    use {super::*, std::fmt::Write};

    impl fmt::Display for Proof {
        fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
            let mut line_start = true;
            for &i in &self.0 {
                if i == DELETE {
                    out.write_char('d')?;
                    line_start = false;
                } else if i == 0 {
                    out.write_str(if line_start { "0\n" } else { " 0\n" })?;
                    line_start = true;
                } else {
                    if !line_start {
                        out.write_char(' ')?;
                    }
                    write!(out, "{}", i)?;
                    line_start = false;
                }
            }
            Ok(())
        }
    }

    impl Proof {
        /// New proof recording structure.
        pub fn new() -> Self {
            Proof(Vec::new())
        }

        /// Number of recorded integers, separators included
        pub fn len(&self) -> usize {
            self.0.len()
        }

        pub fn is_empty(&self) -> bool {
            self.0.is_empty()
        }

        fn push_lits(&mut self, lits: &[Lit]) {
            self.0.extend(lits.iter().map(|lit| lit.to_dimacs()));
        }

        /// Register clause creation.
        pub fn create_clause<C>(&mut self, c: &C)
        where
            C: ClauseIterable,
        {
            self.push_lits(c.items());
            self.0.push(0);
        }

        /// Register a clause justified by a witness (PR step).
        ///
        /// `witness[0]` must be `clause[0]`.
        pub fn create_clause_with_witness(&mut self, clause: &[Lit], witness: &[Lit]) {
            debug_assert!(!clause.is_empty());
            debug_assert_eq!(clause.first(), witness.first(), "pivot mismatch");
            self.push_lits(clause);
            self.push_lits(witness);
            self.0.push(0);
        }

        /// Register clause deletion.
        pub fn delete_clause<C>(&mut self, c: &C)
        where
            C: ClauseIterable,
        {
            self.0.push(DELETE);
            self.push_lits(c.items());
            self.0.push(0);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn lits(v: &[i32]) -> Vec<Lit> {
        v.iter().map(|&i| Lit::from_dimacs(i)).collect()
    }

    #[test]
    fn test_display() {
        let mut p = Proof::new();
        p.create_clause(&lits(&[1, -2]));
        p.delete_clause(&lits(&[3]));
        p.create_clause(&lits(&[]));
        assert_eq!(p.to_string(), "1 -2 0\nd 3 0\n0\n");
    }

    #[test]
    fn test_witness_line() {
        let mut p = Proof::new();
        p.create_clause_with_witness(&lits(&[3, -1]), &lits(&[3, 4]));
        assert_eq!(p.to_string(), "3 -1 3 4 0\n");
    }
}
