use alloc::rc::Rc;

use super::term::{Term, TermRef};

const HINTS: [char; 4] = ['x', 'y', 'z', 'w'];

/// Every well-indexed term of exactly `size` (see [`Term::size`]) under
/// `depth` enclosing binders, with leaves drawn from `free` and the bound
/// indices in scope.
///
/// Subterms are shared between returned terms, never inside one.
pub fn enumerate_size(size: usize, depth: usize, free: &[char]) -> Vec<TermRef> {
    match size {
        0 => vec![],
        1 => free
            .iter()
            .map(|&name| Term::free(name))
            .chain((0..depth).map(Term::var))
            .collect(),
        _ => {
            let hint = HINTS[depth % HINTS.len()];
            let mut terms: Vec<TermRef> = enumerate_size(size - 1, depth + 1, free)
                .into_iter()
                .map(|body| Term::abs(hint, body))
                .collect();

            for left_size in 1..size {
                let rights = enumerate_size(size - left_size, depth, free);
                for left in enumerate_size(left_size, depth, free) {
                    for right in &rights {
                        terms.push(Term::app(Rc::clone(&left), Rc::clone(right)));
                    }
                }
            }

            terms
        }
    }
}
