use alloc::rc::Rc;
use core::mem;

pub type TermRef = Rc<Term>;

/// A lambda term in de Bruijn form.
///
/// Terms are immutable and shared through [`TermRef`]. Within one term no
/// application node is reachable through two different paths: the parser
/// allocates every node fresh and substitution copies the replacement for
/// every occurrence it fills. Redexes are addressed by pointer identity, so
/// that property is what lets a reduction target exactly one occurrence.
///
/// Shifting, substitution, comparison and dropping walk the tree on a heap
/// stack. Printing, keys, [`Term::size`] and redex search recurse once per
/// level.
#[derive(Debug)]
pub enum Term {
    /// Bound occurrence, counting binders outward from the nearest one.
    Var(usize),
    /// Unbound identifier. Never a substitution target.
    Free(char),
    /// Binder. The name is only a hint for printing.
    Abs(char, TermRef),
    App(TermRef, TermRef),
}

impl Term {
    pub fn var(index: usize) -> TermRef {
        Rc::new(Term::Var(index))
    }

    pub fn free(name: char) -> TermRef {
        Rc::new(Term::Free(name))
    }

    pub fn abs(hint: char, body: TermRef) -> TermRef {
        Rc::new(Term::Abs(hint, body))
    }

    pub fn app(function: TermRef, argument: TermRef) -> TermRef {
        Rc::new(Term::App(function, argument))
    }

    /// Church numeral `λf.λx.f (f ... x)` with `n` applications of `f`.
    pub fn church(n: usize) -> TermRef {
        let mut body = Term::var(0);
        for _ in 0..n {
            body = Term::app(Term::var(1), body);
        }
        Term::abs('f', Term::abs('x', body))
    }

    /// The value of a Church numeral, or `None` when the term has any other
    /// shape. Binder hints are ignored.
    pub fn as_church(&self) -> Option<usize> {
        let Term::Abs(_, body) = self else {
            return None;
        };
        let Term::Abs(_, body) = &**body else {
            return None;
        };

        let mut body = body;
        let mut n = 0;
        loop {
            match &**body {
                Term::Var(0) => return Some(n),
                Term::App(function, argument) if matches!(**function, Term::Var(1)) => {
                    n += 1;
                    body = argument;
                }
                _ => return None,
            }
        }
    }

    /// Leaves count one, a binder adds one to its body, and an application
    /// is the sum of both sides.
    pub fn size(&self) -> usize {
        match self {
            Term::Var(_) | Term::Free(_) => 1,
            Term::Abs(_, body) => 1 + body.size(),
            Term::App(function, argument) => function.size() + argument.size(),
        }
    }

    /// Distinct free names in order of first occurrence.
    pub fn free_values(&self) -> Vec<char> {
        fn collect(term: &Term, names: &mut Vec<char>) {
            match term {
                Term::Var(_) => {}
                Term::Free(name) => {
                    if !names.contains(name) {
                        names.push(*name);
                    }
                }
                Term::Abs(_, body) => collect(body, names),
                Term::App(function, argument) => {
                    collect(function, names);
                    collect(argument, names);
                }
            }
        }

        let mut names = Vec::new();
        collect(self, &mut names);
        names
    }

    pub fn is_abs(&self) -> bool {
        matches!(self, Term::Abs(_, _))
    }

    /// Whether every bound occurrence refers to a binder inside the term.
    pub fn is_well_indexed(&self) -> bool {
        fn check(term: &Term, depth: usize) -> bool {
            match term {
                Term::Var(index) => *index < depth,
                Term::Free(_) => true,
                Term::Abs(_, body) => check(body, depth + 1),
                Term::App(function, argument) => check(function, depth) && check(argument, depth),
            }
        }

        check(self, 0)
    }
}

/// Moves out every child this term owns alone, leaving a leaf behind.
fn take_children(term: &mut Term, pending: &mut Vec<TermRef>) {
    let mut take = |child: &mut TermRef| {
        if Rc::strong_count(child) == 1 && !matches!(**child, Term::Var(_) | Term::Free(_)) {
            pending.push(mem::replace(child, Term::var(0)));
        }
    };

    match term {
        Term::Var(_) | Term::Free(_) => {}
        Term::Abs(_, body) => take(body),
        Term::App(function, argument) => {
            take(function);
            take(argument);
        }
    }
}

/// Dropping a deep tree field by field would recurse once per level, so
/// children are unlinked onto a heap stack first.
impl Drop for Term {
    fn drop(&mut self) {
        if matches!(self, Term::Var(_) | Term::Free(_)) {
            return;
        }

        let mut pending = Vec::new();
        take_children(self, &mut pending);
        while let Some(child) = pending.pop() {
            if let Ok(mut term) = Rc::try_unwrap(child) {
                take_children(&mut term, &mut pending);
            }
        }
    }
}
