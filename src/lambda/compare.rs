use core::cmp::Ordering;

use super::term::Term;

fn rank(term: &Term) -> u8 {
    match term {
        Term::Var(_) => 0,
        Term::Free(_) => 1,
        Term::Abs(_, _) => 2,
        Term::App(_, _) => 3,
    }
}

/// Total order on terms: variants rank `Var < Free < Abs < App`, then
/// indices, names, bodies, and function before argument.
///
/// Binder hints are never looked at, so on de Bruijn terms this ordering
/// is exactly alpha-equivalence.
pub fn compare(left: &Term, right: &Term) -> Ordering {
    let mut pending = vec![(left, right)];

    while let Some((m, n)) = pending.pop() {
        let order = match (m, n) {
            (Term::Var(i), Term::Var(j)) => i.cmp(j),
            (Term::Free(a), Term::Free(b)) => a.cmp(b),
            (Term::Abs(_, mb), Term::Abs(_, nb)) => {
                pending.push((mb.as_ref(), nb.as_ref()));
                Ordering::Equal
            }
            (Term::App(mf, ma), Term::App(nf, na)) => {
                pending.push((ma.as_ref(), na.as_ref()));
                pending.push((mf.as_ref(), nf.as_ref()));
                Ordering::Equal
            }
            _ => rank(m).cmp(&rank(n)),
        };

        if order.is_ne() {
            return order;
        }
    }

    Ordering::Equal
}

pub fn equal(left: &Term, right: &Term) -> bool {
    compare(left, right).is_eq()
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        equal(self, other)
    }
}

impl Eq for Term {}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}
