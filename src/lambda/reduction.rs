use alloc::rc::Rc;

use thiserror::Error;

use super::{
    substitution::substitute,
    term::{Term, TermRef},
};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionError {
    #[error("the redex does not occur in the term being reduced")]
    ForeignRedex,
}

/// An application of an abstraction, addressed by node identity.
///
/// Two redexes are the same only if they are the same node, not merely
/// equal terms.
#[derive(Debug, Clone)]
pub struct Redex(TermRef);

impl Redex {
    pub fn node(&self) -> &TermRef {
        &self.0
    }

    /// The abstraction being applied.
    pub fn abstraction(&self) -> &TermRef {
        match &*self.0 {
            Term::App(function, _) => function,
            _ => unreachable!("redexes are only built from applications"),
        }
    }

    pub fn argument(&self) -> &TermRef {
        match &*self.0 {
            Term::App(_, argument) => argument,
            _ => unreachable!("redexes are only built from applications"),
        }
    }

    fn contract(&self) -> TermRef {
        let Term::Abs(_, body) = &**self.abstraction() else {
            unreachable!("redexes are only built from applications of abstractions");
        };
        substitute(body, 0, self.argument())
    }
}

impl PartialEq for Redex {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Redex {}

/// Every redex in `term`.
///
/// The order is fixed and drives the numbering of graph edges: for an
/// application, the redexes of its argument come first, then those of its
/// function, then the application itself if it is a redex.
pub fn redexes(term: &TermRef) -> Vec<Redex> {
    fn collect(term: &TermRef, found: &mut Vec<Redex>) {
        match &**term {
            Term::Var(_) | Term::Free(_) => {}
            Term::Abs(_, body) => collect(body, found),
            Term::App(function, argument) => {
                collect(argument, found);
                collect(function, found);
                if function.is_abs() {
                    found.push(Redex(Rc::clone(term)));
                }
            }
        }
    }

    let mut found = Vec::new();
    collect(term, &mut found);
    found
}

/// Whether `term` is beta-normal.
pub fn is_normal(term: &Term) -> bool {
    match term {
        Term::Var(_) | Term::Free(_) => true,
        Term::Abs(_, body) => is_normal(body),
        Term::App(function, argument) => {
            !function.is_abs() && is_normal(function) && is_normal(argument)
        }
    }
}

/// Contracts exactly the one occurrence `redex` inside `term`. Everything
/// off the path to it is shared with `term`.
pub fn beta_step(term: &TermRef, redex: &Redex) -> Result<TermRef, ReductionError> {
    fn step(term: &TermRef, redex: &Redex) -> Option<TermRef> {
        if Rc::ptr_eq(term, redex.node()) {
            return Some(redex.contract());
        }

        match &**term {
            Term::Var(_) | Term::Free(_) => None,
            Term::Abs(hint, body) => step(body, redex).map(|body| Term::abs(*hint, body)),
            Term::App(function, argument) => {
                if let Some(function) = step(function, redex) {
                    return Some(Term::app(function, Rc::clone(argument)));
                }
                step(argument, redex).map(|argument| Term::app(Rc::clone(function), argument))
            }
        }
    }

    step(term, redex).ok_or(ReductionError::ForeignRedex)
}

/// Every one-step reduct of `term`, paired with the redex contracted, in
/// redex order.
pub fn reducts(term: &TermRef) -> Vec<(TermRef, Redex)> {
    redexes(term)
        .into_iter()
        .map(|redex| {
            let reduced = beta_step(term, &redex).expect("redex was enumerated from this term");
            (reduced, redex)
        })
        .collect()
}
