/*****************************************************************************************[gbc/trivial.rs]
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
    super::{propagate_or_resolve, GbcHost, Halt, Resolution},
    crate::clause::{lbool, Lit},
};

/// Is `clause` not worth adding?
///
/// It is if it is longer than `max_len`, or if assuming the negation of
/// its literals, one by one from level 0, satisfies one of them or runs
/// into a conflict. The host is left at level 0.
pub(crate) fn is_trivial<H: GbcHost>(
    host: &mut H,
    clause: &[Lit],
    max_len: usize,
) -> Result<bool, Halt> {
    if clause.len() > max_len {
        return Ok(true);
    }

    host.backtrack(0);
    let mut trivial = false;
    for &lit in clause {
        let value = host.value(lit);
        if value == lbool::TRUE {
            trivial = true;
            break;
        } else if value == lbool::FALSE {
            continue;
        }
        host.assume(!lit);
        match propagate_or_resolve(host, None) {
            None => (),
            Some(Resolution::Unsat) => {
                host.backtrack(0);
                return Err(Halt::Unsat);
            }
            Some(_) => {
                trivial = true;
                break;
            }
        }
    }
    host.backtrack(0);
    Ok(trivial)
}

#[cfg(test)]
mod test {
    use {super::*, crate::gbc::test_util::*};

    #[test]
    fn test_true_literal_is_trivial() {
        let mut s = solver(&[&[1], &[2, 3]]);
        assert!(s.propagate());
        assert!(is_trivial(&mut s, &lits(&[-2, 1]), 16).unwrap());
        assert_eq!(s.decision_level(), 0);
    }

    #[test]
    fn test_too_long() {
        let mut s = solver(&[&[1, 2, 3]]);
        s.assume(Lit::from_dimacs(1));
        assert!(is_trivial(&mut s, &lits(&[1, 2, 3]), 2).unwrap());
        // nothing was touched
        assert_eq!(s.decision_level(), 1);
    }

    #[test]
    fn test_implied_clause() {
        // (1 2) and (-2 3) imply (1 3)
        let mut s = solver(&[&[1, 2], &[-2, 3], &[4, 5]]);
        assert!(is_trivial(&mut s, &lits(&[1, 3]), 16).unwrap());
        assert_eq!(s.decision_level(), 0);
        assert!(!is_trivial(&mut s, &lits(&[4, 1]), 16).unwrap());
        assert_eq!(s.decision_level(), 0);
    }

    #[test]
    fn test_unsat_is_reported() {
        let mut s = solver(&[&[1, 2], &[1, -2], &[-1, 3], &[-1, -3]]);
        let res = is_trivial(&mut s, &lits(&[1]), 16);
        // assuming -1 learns 1, which then conflicts at level 0
        assert!(matches!(res, Err(Halt::Unsat)));
        assert!(s.is_unsat());
    }
}
