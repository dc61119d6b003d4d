/*****************************************************************************************[dimacs.rs]
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
    crate::{interface::SolverInterface, Lit},
    std::io::{self, BufRead},
};

/// `parse(input, solver, is_strict)` adds the content of `input` to the solver
///
/// ## Params
/// - `is_strict` if true, will fail if the number of clauses does not match the declared header
pub fn parse<S: SolverInterface, R: BufRead>(
    input: &mut R,
    solver: &mut S,
    is_strict: bool,
) -> io::Result<()> {
    let mut lits = vec![];
    let mut num_vars = 0;
    let mut num_clauses = 0;
    let mut num_read_clauses = 0;
    loop {
        skip_whitespace(input)?;
        match next_byte(input)? {
            Some(b'p') => {
                let mut header = [0; 5];
                input.read_exact(&mut header)?;
                if &header != b"p cnf" {
                    return parse_error("PARSE ERROR! Unexpected char: p".to_string());
                }
                num_vars = parse_int(input)?;
                num_clauses = parse_int(input)?;
                // declared variables exist even if they never occur
                if num_vars > 0 {
                    solver.var_of_int(num_vars as u32 - 1);
                }
            }
            Some(b'c') => skip_line(input)?,
            Some(_) => {
                read_clause(input, solver, &mut lits)?;
                solver.add_clause_reuse(&mut lits);
                num_read_clauses += 1;
            }
            None => break,
        }
    }
    if is_strict && num_clauses != num_read_clauses {
        return parse_error(
            "PARSE ERROR! DIMACS header mismatch: wrong number of clauses".to_string(),
        );
    }
    if is_strict && solver.num_vars() as i32 > num_vars {
        return parse_error(
            "PARSE ERROR! DIMACS header mismatch: wrong number of variables".to_string(),
        );
    }
    Ok(())
}

fn read_clause<S: SolverInterface, R: BufRead>(
    input: &mut R,
    solver: &mut S,
    lits: &mut Vec<Lit>,
) -> io::Result<()> {
    lits.clear();
    loop {
        let parsed_lit = parse_int(input)?;
        if parsed_lit == 0 {
            return Ok(());
        }
        let var = (parsed_lit.abs() - 1) as u32;
        let lit = Lit::new(solver.var_of_int(var), parsed_lit > 0);
        lits.push(lit);
    }
}

/// Parse a signed integer, skipping leading whitespace.
pub(crate) fn parse_int<R: BufRead>(input: &mut R) -> io::Result<i32> {
    skip_whitespace(input)?;
    let ch = next_byte(input)?;
    let neg = if ch == Some(b'+') || ch == Some(b'-') {
        input.consume(1);
        ch == Some(b'-')
    } else {
        false
    };
    match next_byte(input)? {
        Some(ch) if ch.is_ascii_digit() => (),
        Some(ch) => {
            return parse_error(format!("PARSE ERROR! Unexpected char: {}", ch as char))
        }
        None => return parse_error("PARSE ERROR! Unexpected EOF".to_string()),
    }
    let mut val: i32 = 0;
    while let Some(ch) = next_byte(input)? {
        if !ch.is_ascii_digit() {
            break;
        }
        input.consume(1);
        val = val
            .checked_mul(10)
            .and_then(|v| v.checked_add((ch - b'0') as i32))
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "PARSE ERROR! Integer overflow")
            })?;
    }
    Ok(if neg { -val } else { val })
}

#[inline(always)]
fn is_whitespace(ch: Option<u8>) -> bool {
    ch.map(|ch| b'\x09' <= ch && ch <= b'\x0d' || ch == b' ')
        .unwrap_or(false)
}

pub(crate) fn skip_whitespace<R: BufRead>(input: &mut R) -> io::Result<()> {
    while is_whitespace(next_byte(input)?) {
        input.consume(1);
    }
    Ok(())
}

pub(crate) fn skip_line<R: BufRead>(input: &mut R) -> io::Result<()> {
    while let Some(ch) = next_byte(input)? {
        input.consume(1);
        if ch == b'\n' {
            break;
        }
    }
    Ok(())
}

pub(crate) fn next_byte<R: BufRead>(input: &mut R) -> io::Result<Option<u8>> {
    Ok(input.fill_buf()?.first().copied())
}

fn parse_error<T>(message: String) -> io::Result<T> {
    Err(io::Error::new(io::ErrorKind::InvalidInput, message))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{lbool, BasicSolver};

    #[test]
    fn test_parse_simple() {
        let mut s = BasicSolver::default();
        let mut input = &b"c a comment\np cnf 3 2\n1 -2 0\n2 3 0\n"[..];
        parse(&mut input, &mut s, true).unwrap();
        assert_eq!(s.num_vars(), 3);
        assert_eq!(s.num_clauses(), 2);
    }

    #[test]
    fn test_parse_declares_vars() {
        let mut s = BasicSolver::default();
        let mut input = &b"p cnf 5 1\n1 0\n"[..];
        parse(&mut input, &mut s, true).unwrap();
        assert_eq!(s.num_vars(), 5);
        assert_eq!(s.value_lvl_0(Lit::from_dimacs(1)), lbool::TRUE);
    }

    #[test]
    fn test_parse_strict_mismatch() {
        let mut s = BasicSolver::default();
        let mut input = &b"p cnf 2 3\n1 2 0\n"[..];
        let e = parse(&mut input, &mut s, true).unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::InvalidInput);

        let mut s = BasicSolver::default();
        let mut input = &b"p cnf 2 3\n1 2 0\n"[..];
        assert!(parse(&mut input, &mut s, false).is_ok());
    }

    #[test]
    fn test_parse_bad_char() {
        let mut s = BasicSolver::default();
        let mut input = &b"p cnf 2 1\n1 x 0\n"[..];
        assert!(parse(&mut input, &mut s, false).is_err());
    }
}
