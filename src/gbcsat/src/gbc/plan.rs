/*****************************************************************************************[gbc/plan.rs]
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
    crate::{
        clause::Lit,
        dimacs::{next_byte, parse_int, skip_whitespace},
    },
    std::io::{self, BufRead},
};

/// A set of literals to assume together, and the assumption order known
/// to work for the clause it leads to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeGroup {
    pub assumptions: Vec<Lit>,
    pub known_good: Vec<Lit>,
}

/// Probe groups, run in order by [`ProbeOrder::Plan`](super::ProbeOrder::Plan).
#[derive(Debug, Clone, Default)]
pub struct ProbePlan {
    groups: Vec<ProbeGroup>,
}

impl ProbePlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, group: ProbeGroup) {
        self.groups.push(group)
    }

    pub fn groups(&self) -> &[ProbeGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Largest variable index used, plus one.
    pub(crate) fn num_vars(&self) -> u32 {
        self.groups
            .iter()
            .flat_map(|g| g.assumptions.iter().chain(g.known_good.iter()))
            .map(|l| l.var().idx() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Parse a plan: one group per line, as two zero-terminated lists of
    /// DIMACS literals, `assumptions... 0 known-good... 0`.
    /// Blank lines and lines starting with `c` are ignored.
    ///
    /// ```
    /// use gbcsat::{Lit, ProbePlan};
    /// let text = "c chessboard\n64 73 0 -65 -74 0\n\n73 0 0\n";
    /// let plan = ProbePlan::parse(&mut text.as_bytes()).unwrap();
    /// assert_eq!(plan.len(), 2);
    /// assert_eq!(plan.groups()[0].known_good[1], Lit::from_dimacs(-74));
    /// assert!(plan.groups()[1].known_good.is_empty());
    /// ```
    pub fn parse<R: BufRead>(input: &mut R) -> io::Result<Self> {
        let mut plan = ProbePlan::new();
        let mut line = String::new();
        let mut line_no = 0;
        loop {
            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('c') {
                continue;
            }
            let group = parse_group(trimmed).map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("PARSE ERROR! probe plan, line {}: {}", line_no, e),
                )
            })?;
            plan.push(group);
        }
        Ok(plan)
    }
}

fn parse_group(line: &str) -> io::Result<ProbeGroup> {
    let mut input = line.as_bytes();
    let mut lists: Vec<Vec<Lit>> = vec![vec![]];
    loop {
        skip_whitespace(&mut input)?;
        if next_byte(&mut input)?.is_none() {
            break;
        }
        match parse_int(&mut input)? {
            0 => lists.push(vec![]),
            i => match lists.last_mut() {
                Some(list) => list.push(Lit::from_dimacs(i)),
                None => unreachable!(),
            },
        }
    }
    // a well-formed line ends with its second 0, leaving an empty third list
    if lists.len() != 3 || lists[2].len() != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "expected `assumptions... 0 known-good... 0`",
        ));
    }
    lists.pop();
    let known_good = lists.pop().unwrap_or_default();
    let assumptions = lists.pop().unwrap_or_default();
    Ok(ProbeGroup {
        assumptions,
        known_good,
    })
}

#[cfg(test)]
mod test {
    use {super::*, crate::gbc::test_util::*};

    #[test]
    fn test_parse() {
        let text = "c a plan\n  10 11 0 10 11 0\n-3 0 -3 0\n";
        let plan = ProbePlan::parse(&mut text.as_bytes()).unwrap();
        assert_eq!(
            plan.groups(),
            &[
                ProbeGroup {
                    assumptions: lits(&[10, 11]),
                    known_good: lits(&[10, 11]),
                },
                ProbeGroup {
                    assumptions: lits(&[-3]),
                    known_good: lits(&[-3]),
                },
            ]
        );
        assert_eq!(plan.num_vars(), 11);
    }

    #[test]
    fn test_parse_errors() {
        for bad in &["1 2 0\n", "1 0 2\n", "1 0 2 0 3 0\n", "1 x 0 0\n"] {
            let e = ProbePlan::parse(&mut bad.as_bytes()).unwrap_err();
            assert_eq!(e.kind(), io::ErrorKind::InvalidInput);
            assert!(e.to_string().contains("line 1"), "{}", e);
        }
    }
}
