use nom::{
    branch::alt,
    character::complete::{char, multispace0, satisfy},
    combinator::cut,
    error::{ErrorKind, ParseError as NomParseError},
    multi::{many0, many1},
    sequence::preceded,
    IResult,
};
use thiserror::Error;
use tracing::trace;

use super::{
    known,
    term::{Term, TermRef},
};

/// Offsets are byte offsets into the source after macro expansion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("input ended in the middle of a term")]
    UnexpectedEnd,
    #[error("expected `{expected}` but found `{found}` at offset {offset}")]
    MissingTerminator {
        expected: char,
        found: char,
        offset: usize,
    },
    #[error("unexpected `{found}` at offset {offset}, expected a term")]
    UnexpectedChar { found: char, offset: usize },
}

pub fn parse(source: &str) -> Result<TermRef, ParseError> {
    let expanded = preprocess(source);
    if expanded != source {
        trace!(%expanded, "expanded macros");
    }

    let (rest, term) = expr(&[], &expanded).map_err(|err| locate(&expanded, err))?;

    let rest = rest.trim_start_matches(WHITESPACE);
    if let Some(found) = rest.chars().next() {
        return Err(ParseError::UnexpectedChar {
            found,
            offset: expanded.len() - rest.len(),
        });
    }

    debug_assert!(term.is_well_indexed());
    Ok(term)
}

const WHITESPACE: [char; 4] = [' ', '\t', '\r', '\n'];

/// Replaces every macro token with its definition and `\` with `λ`.
///
/// Purely lexical: a binder named like a macro is expanded too.
fn preprocess(source: &str) -> String {
    let mut expanded = String::with_capacity(source.len());
    for c in source.chars() {
        match known::expansion(c) {
            Some(definition) => expanded.push_str(definition),
            None if c == '\\' => expanded.push('λ'),
            None => expanded.push(c),
        }
    }

    expanded
}

#[derive(Debug)]
struct Syntax<'a> {
    rest: &'a str,
    expected: Option<char>,
}

impl<'a> NomParseError<&'a str> for Syntax<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        Syntax {
            rest: input,
            expected: None,
        }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }

    fn from_char(input: &'a str, c: char) -> Self {
        Syntax {
            rest: input,
            expected: Some(c),
        }
    }
}

fn locate(source: &str, err: nom::Err<Syntax<'_>>) -> ParseError {
    let syntax = match err {
        nom::Err::Incomplete(_) => return ParseError::UnexpectedEnd,
        nom::Err::Error(syntax) | nom::Err::Failure(syntax) => syntax,
    };

    let offset = source.len() - syntax.rest.len();
    match (syntax.rest.chars().next(), syntax.expected) {
        (None, _) => ParseError::UnexpectedEnd,
        (Some(found), Some(expected)) => ParseError::MissingTerminator {
            expected,
            found,
            offset,
        },
        (Some(found), None) => ParseError::UnexpectedChar { found, offset },
    }
}

type PResult<'a, T> = IResult<&'a str, T, Syntax<'a>>;

fn token<'a>(c: char) -> impl FnMut(&'a str) -> PResult<'a, char> {
    preceded(multispace0, char(c))
}

fn name(s: &str) -> PResult<'_, char> {
    preceded(multispace0, satisfy(|c| c.is_ascii_alphabetic()))(s)
}

/// Innermost binder wins: the index counts the binders between the
/// occurrence and the last binder with that name.
fn resolve(scope: &[char], name: char) -> TermRef {
    match scope.iter().rposition(|&bound| bound == name) {
        Some(position) => Term::var(scope.len() - 1 - position),
        None => Term::free(name),
    }
}

fn variable<'a>(scope: &[char], s: &'a str) -> PResult<'a, TermRef> {
    let (s, name) = name(s)?;
    Ok((s, resolve(scope, name)))
}

fn abstraction<'a>(scope: &[char], s: &'a str) -> PResult<'a, TermRef> {
    let (s, _) = token('λ')(s)?;
    let (s, hint) = cut(name)(s)?;
    let (s, _) = cut(token('.'))(s)?;

    let mut inner = scope.to_vec();
    inner.push(hint);
    let (s, body) = cut(|s: &'a str| expr(&inner, s))(s)?;

    Ok((s, Term::abs(hint, body)))
}

/// `( expr+ )`, the expressions applied left to right.
fn group<'a>(scope: &[char], s: &'a str) -> PResult<'a, TermRef> {
    let (s, _) = token('(')(s)?;
    let (s, terms) = cut(many1(|s: &'a str| expr(scope, s)))(s)?;
    let (s, _) = cut(token(')'))(s)?;

    let term = terms
        .into_iter()
        .reduce(Term::app)
        .expect("many1 already asserts that this is Some, so you shouldn't see this");

    Ok((s, term))
}

fn atom<'a>(scope: &[char], s: &'a str) -> PResult<'a, TermRef> {
    alt((
        |s: &'a str| group(scope, s),
        |s: &'a str| variable(scope, s),
    ))(s)
}

/// Applies `head` to every following atom. Stops at `)`, `λ` or the end.
fn application<'a>(scope: &[char], head: TermRef, s: &'a str) -> PResult<'a, TermRef> {
    let (s, arguments) = many0(|s: &'a str| atom(scope, s))(s)?;
    Ok((s, arguments.into_iter().fold(head, Term::app)))
}

fn expr<'a>(scope: &[char], s: &'a str) -> PResult<'a, TermRef> {
    alt((
        |s: &'a str| {
            let (s, head) = group(scope, s)?;
            application(scope, head, s)
        },
        |s: &'a str| abstraction(scope, s),
        |s: &'a str| {
            let (s, head) = variable(scope, s)?;
            application(scope, head, s)
        },
    ))(s)
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;

    use super::*;

    type Result = core::result::Result<(), ParseError>;

    fn id(hint: char) -> TermRef {
        Term::abs(hint, Term::var(0))
    }

    fn assert_structure(source: &str, expected: &Term) -> Result {
        let term = parse(source)?;
        assert_eq!(*term, *expected, "parsing {source}");
        Ok(())
    }

    #[test]
    fn test_application_of_identities() -> Result {
        let term = parse("(λx.x)(λy.y)")?;
        let Term::App(function, argument) = &*term else {
            panic!("expected an application, got {term:?}");
        };
        assert!(matches!(&**function, Term::Abs('x', body) if matches!(**body, Term::Var(0))));
        assert!(matches!(&**argument, Term::Abs('y', body) if matches!(**body, Term::Var(0))));
        Ok(())
    }

    #[test]
    fn test_indices_count_binders() -> Result {
        // λx.λy.x y
        let expected = Term::abs('x', Term::abs('y', Term::app(Term::var(1), Term::var(0))));
        assert_structure("λx.λy.xy", &expected)?;
        assert_structure("λx. λy. x y", &expected)
    }

    #[test]
    fn test_shadowing_resolves_to_innermost() -> Result {
        let expected = Term::abs('x', Term::abs('x', Term::var(0)));
        assert_structure("λx.λx.x", &expected)
    }

    #[test]
    fn test_unbound_names_are_free() -> Result {
        let expected = Term::abs('x', Term::app(Term::var(0), Term::free('z')));
        assert_structure("λx.xz", &expected)?;
        assert_structure("a", &Term::free('a'))
    }

    #[test]
    fn test_application_is_left_associative() -> Result {
        let expected = Term::app(
            Term::app(Term::free('a'), Term::free('b')),
            Term::free('c'),
        );
        assert_structure("abc", &expected)?;
        assert_structure("(ab)c", &expected)?;
        assert_structure("(a b c)", &expected)?;

        let nested = Term::app(
            Term::free('a'),
            Term::app(Term::free('b'), Term::free('c')),
        );
        assert_structure("a(bc)", &nested)
    }

    #[test]
    fn test_abstraction_body_extends_right() -> Result {
        let expected = Term::abs('x', Term::app(Term::var(0), id('y')));
        assert_structure("λx.x(λy.y)", &expected)
    }

    #[test]
    fn test_group_continues_after_abstraction() -> Result {
        // inside a group a fresh λ starts another applied expression
        let expected = Term::app(id('x'), id('y'));
        assert_structure("(λx.x λy.y)", &expected)
    }

    #[test]
    fn test_group_followed_by_atoms() -> Result {
        let expected = Term::app(Term::app(id('x'), Term::free('a')), id('y'));
        assert_structure("(λx.x)a(λy.y)", &expected)
    }

    #[test]
    fn test_backslash_lambda() -> Result {
        assert_structure("\\x.x", &id('x'))
    }

    #[test]
    fn test_macros() -> Result {
        let expected = Term::app(id('x'), Term::church(2));
        assert_structure("I2", &expected)?;
        assert_eq!(parse("S")?.size(), 7);
        Ok(())
    }

    #[test]
    fn test_macro_clobbers_binder_of_same_name() {
        assert_eq!(
            parse("λI.I"),
            Err(ParseError::UnexpectedChar {
                found: '(',
                offset: "λ".len(),
            })
        );
    }

    #[test]
    fn test_fresh_nodes() -> Result {
        let term = parse("(λx.x)(λx.x)")?;
        let Term::App(function, argument) = &*term else {
            panic!("expected an application, got {term:?}");
        };
        assert!(!Rc::ptr_eq(function, argument));
        Ok(())
    }

    #[test]
    fn test_unexpected_end() {
        assert_eq!(parse(""), Err(ParseError::UnexpectedEnd));
        assert_eq!(parse("λ"), Err(ParseError::UnexpectedEnd));
        assert_eq!(parse("λx."), Err(ParseError::UnexpectedEnd));
        assert_eq!(parse("(λx.x"), Err(ParseError::UnexpectedEnd));
        assert_eq!(parse("("), Err(ParseError::UnexpectedEnd));
    }

    #[test]
    fn test_missing_dot() {
        assert_eq!(
            parse("λx x"),
            Err(ParseError::MissingTerminator {
                expected: '.',
                found: 'x',
                offset: "λx ".len(),
            })
        );
    }

    #[test]
    fn test_missing_close_paren() {
        assert_eq!(
            parse("(x.y"),
            Err(ParseError::MissingTerminator {
                expected: ')',
                found: '.',
                offset: 2,
            })
        );
    }

    #[test]
    fn test_unexpected_leading_token() {
        assert_eq!(
            parse(")"),
            Err(ParseError::UnexpectedChar {
                found: ')',
                offset: 0
            })
        );
        assert_eq!(
            parse("()"),
            Err(ParseError::UnexpectedChar {
                found: ')',
                offset: 1
            })
        );
        assert_eq!(
            parse("x+"),
            Err(ParseError::UnexpectedChar {
                found: '+',
                offset: 1
            })
        );
    }

    #[test]
    fn test_trailing_abstraction_outside_group() {
        assert_eq!(
            parse("x λy.y"),
            Err(ParseError::UnexpectedChar {
                found: 'λ',
                offset: 2
            })
        );
    }
}
