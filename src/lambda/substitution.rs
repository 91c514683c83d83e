use alloc::rc::Rc;
use core::{cmp::Ordering, convert::Infallible};

use thiserror::Error;

use super::term::{Term, TermRef};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftError {
    #[error("shifting index {index} by {amount} would make it negative")]
    Underflow { index: usize, amount: isize },
}

const BALANCED: &str = "every frame leaves exactly one term behind";

enum Frame<'t> {
    Visit(&'t TermRef, usize),
    Abs(char),
    App,
}

/// Rebuilds `term` bottom-up, replacing every bound occurrence with
/// `var(index, depth)`, where `depth` counts the binders crossed so far.
///
/// Runs on an explicit stack so that deeply nested terms cannot overflow
/// the call stack. Free values are shared, everything else is fresh.
fn rebuild<E>(
    term: &TermRef,
    mut var: impl FnMut(usize, usize) -> Result<TermRef, E>,
) -> Result<TermRef, E> {
    let mut work = vec![Frame::Visit(term, 0)];
    let mut built: Vec<TermRef> = Vec::new();

    while let Some(frame) = work.pop() {
        match frame {
            Frame::Visit(node, depth) => match &**node {
                Term::Var(index) => built.push(var(*index, depth)?),
                Term::Free(_) => built.push(Rc::clone(node)),
                Term::Abs(hint, body) => {
                    work.push(Frame::Abs(*hint));
                    work.push(Frame::Visit(body, depth + 1));
                }
                Term::App(function, argument) => {
                    work.push(Frame::App);
                    work.push(Frame::Visit(argument, depth));
                    work.push(Frame::Visit(function, depth));
                }
            },
            Frame::Abs(hint) => {
                let body = built.pop().expect(BALANCED);
                built.push(Term::abs(hint, body));
            }
            Frame::App => {
                let argument = built.pop().expect(BALANCED);
                let function = built.pop().expect(BALANCED);
                built.push(Term::app(function, argument));
            }
        }
    }

    Ok(built.pop().expect(BALANCED))
}

/// Adds `amount` to every index at or above `cutoff`, where the cutoff
/// grows by one under each binder.
pub fn shift(term: &TermRef, cutoff: usize, amount: isize) -> Result<TermRef, ShiftError> {
    rebuild(term, |index, depth| {
        if index < cutoff + depth {
            return Ok(Term::var(index));
        }

        index
            .checked_add_signed(amount)
            .map(Term::var)
            .ok_or(ShiftError::Underflow { index, amount })
    })
}

/// Upward shift of the indices free in `term`. Always returns a fresh
/// copy, even for `amount == 0`.
fn lift(term: &TermRef, amount: usize) -> TermRef {
    let amount = isize::try_from(amount).expect("binder depth fits in isize");
    shift(term, 0, amount).expect("shifting upwards cannot underflow")
}

/// Replaces the variable `target` with `replacement` and closes the gap it
/// leaves behind: larger indices drop by one.
///
/// Under `depth` binders the target is seen as `target + depth`, and the
/// replacement is lifted by `depth` so its own free indices still point at
/// the same binders.
pub fn substitute(term: &TermRef, target: usize, replacement: &TermRef) -> TermRef {
    rebuild(term, |index, depth| -> Result<_, Infallible> {
        Ok(match index.cmp(&(target + depth)) {
            Ordering::Less => Term::var(index),
            Ordering::Equal => lift(replacement, depth),
            Ordering::Greater => Term::var(index - 1),
        })
    })
    .unwrap_or_else(|never| match never {})
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn arb_term() -> impl Strategy<Value = TermRef> {
        let leaf = prop_oneof![
            (0usize..4).prop_map(Term::var),
            prop::char::range('a', 'e').prop_map(Term::free),
        ];

        leaf.prop_recursive(6, 48, 2, |inner| {
            prop_oneof![
                (prop::char::range('a', 'z'), inner.clone()).prop_map(|(h, b)| Term::abs(h, b)),
                (inner.clone(), inner).prop_map(|(f, a)| Term::app(f, a)),
            ]
        })
    }

    proptest! {
        #[test]
        fn test_shift_up_then_down(term in arb_term()) {
            let up = shift(&term, 0, 1).expect("shifting up never underflows");
            prop_assert_eq!(shift(&up, 0, -1), Ok(term));
        }

        #[test]
        fn test_shift_by_zero_is_identity(term in arb_term(), cutoff in 0usize..3) {
            prop_assert_eq!(shift(&term, cutoff, 0), Ok(term));
        }
    }

    #[test]
    fn test_shift_respects_binders() {
        // λ.0 1  ->  λ.0 2
        let term = Term::abs('x', Term::app(Term::var(0), Term::var(1)));
        let expected = Term::abs('x', Term::app(Term::var(0), Term::var(2)));
        assert_eq!(shift(&term, 0, 1), Ok(expected));
    }

    #[test]
    fn test_shift_respects_cutoff() {
        let term = Term::app(Term::var(0), Term::var(3));
        let expected = Term::app(Term::var(0), Term::var(1));
        assert_eq!(shift(&term, 1, -2), Ok(expected));
    }

    #[test]
    fn test_shift_underflow() {
        assert_eq!(
            shift(&Term::var(0), 0, -1),
            Err(ShiftError::Underflow {
                index: 0,
                amount: -1
            })
        );
    }

    #[test]
    fn test_substitute_target() {
        let result = substitute(&Term::var(0), 0, &Term::free('a'));
        assert_eq!(result, Term::free('a'));
    }

    #[test]
    fn test_substitute_closes_gap() {
        let term = Term::app(Term::var(0), Term::var(2));
        let result = substitute(&term, 0, &Term::free('a'));
        assert_eq!(result, Term::app(Term::free('a'), Term::var(1)));
    }

    #[test]
    fn test_substitute_lifts_under_binders() {
        // [0 := 0] λ.1  ->  λ.1, the replacement still names the outer binder
        let body = Term::abs('y', Term::var(1));
        let result = substitute(&body, 0, &Term::var(0));
        assert_eq!(result, Term::abs('y', Term::var(1)));

        // [0 := 3] λ.λ.(2 0)  ->  λ.λ.(5 0)
        let body = Term::abs('y', Term::abs('z', Term::app(Term::var(2), Term::var(0))));
        let result = substitute(&body, 0, &Term::var(3));
        let expected = Term::abs('y', Term::abs('z', Term::app(Term::var(5), Term::var(0))));
        assert_eq!(result, expected);
    }

    #[test]
    fn test_substitute_avoids_capture() {
        // (λx.λy.x) applied to a variable bound outside: λy must not capture it
        let body = Term::abs('y', Term::var(1));
        let argument = Term::abs('z', Term::app(Term::var(0), Term::var(1)));
        let result = substitute(&body, 0, &argument);
        let expected = Term::abs(
            'y',
            Term::abs('z', Term::app(Term::var(0), Term::var(2))),
        );
        assert_eq!(result, expected);
    }

    #[test]
    fn test_substitute_copies_every_occurrence() {
        let replacement = Term::app(Term::abs('x', Term::var(0)), Term::free('a'));
        let result = substitute(&Term::app(Term::var(0), Term::var(0)), 0, &replacement);

        let Term::App(left, right) = &*result else {
            panic!("expected an application, got {result:?}");
        };
        assert!(!Rc::ptr_eq(left, right));
        assert!(!Rc::ptr_eq(left, &replacement));
        assert_eq!(*left, replacement);
        assert_eq!(*right, replacement);
    }

    #[test]
    fn test_deep_terms_do_not_overflow() {
        let mut term = Term::var(0);
        for _ in 0..200_000 {
            term = Term::abs('x', term);
        }
        let shifted = shift(&term, 0, 1).expect("shifting up never underflows");
        assert!(matches!(*shifted, Term::Abs(_, _)));
        assert_eq!(shifted, term);

        let lowered = substitute(&shifted, 0, &Term::free('a'));
        assert_eq!(lowered, term);
    }
}
