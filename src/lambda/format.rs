use std::fmt::{self, Display};

use super::{
    known::{self, Registry},
    reduction::is_normal,
    term::Term,
};

/// Collision-free serialization used as the identity of a term in a
/// reduction graph: `0` for an index, the letter for a free value, `λ`
/// followed by the body, `(f a)` for an application.
pub fn key(term: &Term) -> String {
    fn write_key(term: &Term, out: &mut String) {
        match term {
            Term::Var(index) => out.push_str(&index.to_string()),
            Term::Free(name) => out.push(*name),
            Term::Abs(_, body) => {
                out.push('λ');
                write_key(body, out);
            }
            Term::App(function, argument) => {
                out.push('(');
                write_key(function, out);
                out.push(' ');
                write_key(argument, out);
                out.push(')');
            }
        }
    }

    let mut out = String::new();
    write_key(term, &mut out);
    out
}

/// Human-readable text that parses back to an alpha-equivalent term.
pub fn pretty(term: &Term) -> String {
    Printer::new(term, None).render(term).text
}

/// Like [`pretty`], but known redex-free abstractions are written by name.
pub fn named(term: &Term, registry: &mut Registry) -> String {
    Printer::new(term, Some(registry)).render(term).text
}

impl Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&pretty(self))
    }
}

fn binder_pool() -> impl Iterator<Item = char> {
    ('a'..='z')
        .chain('A'..='Z')
        .filter(|&name| !known::is_macro(name))
}

#[derive(PartialEq, Eq)]
enum Shape {
    Atom,
    Abs,
    App,
}

struct Fragment {
    text: String,
    shape: Shape,
}

struct Printer<'r> {
    free: Vec<char>,
    scope: Vec<char>,
    registry: Option<&'r mut Registry>,
}

impl<'r> Printer<'r> {
    fn new(term: &Term, registry: Option<&'r mut Registry>) -> Self {
        Printer {
            free: term.free_values(),
            scope: Vec::new(),
            registry,
        }
    }

    fn usable(&self, name: char) -> bool {
        name.is_ascii_alphabetic()
            && !known::is_macro(name)
            && !self.scope.contains(&name)
            && !self.free.contains(&name)
    }

    /// The hint if it cannot be confused with anything in sight, otherwise
    /// the first unused letter.
    fn binder_name(&self, hint: char) -> char {
        if self.usable(hint) {
            return hint;
        }
        binder_pool()
            .find(|&name| self.usable(name))
            .unwrap_or(hint)
    }

    /// Only macro tokens are written, so the text still parses to `term`.
    fn known_name(&mut self, term: &Term) -> Option<String> {
        let registry = self.registry.as_deref_mut()?;
        if !is_normal(term) {
            return None;
        }
        registry
            .name_of(term)
            .filter(|name| known::is_macro_name(name))
            .map(str::to_string)
    }

    fn render(&mut self, term: &Term) -> Fragment {
        match term {
            Term::Var(index) => {
                let text = match self.scope.len().checked_sub(index + 1) {
                    Some(position) => self.scope[position].to_string(),
                    None => format!("#{index}"),
                };
                Fragment {
                    text,
                    shape: Shape::Atom,
                }
            }
            Term::Free(name) => Fragment {
                text: name.to_string(),
                shape: Shape::Atom,
            },
            Term::Abs(hint, body) => {
                if let Some(text) = self.known_name(term) {
                    return Fragment {
                        text,
                        shape: Shape::Atom,
                    };
                }

                let name = self.binder_name(*hint);
                self.scope.push(name);
                let body = self.render(body);
                self.scope.pop();

                Fragment {
                    text: format!("λ{name}.{}", body.text),
                    shape: Shape::Abs,
                }
            }
            Term::App(function, argument) => {
                let function = self.render(function);
                let argument = self.render(argument);

                let function = if function.shape == Shape::Abs {
                    format!("({})", function.text)
                } else {
                    function.text
                };
                let argument = if argument.shape == Shape::Atom {
                    argument.text
                } else {
                    format!("({})", argument.text)
                };

                Fragment {
                    text: function + &argument,
                    shape: Shape::App,
                }
            }
        }
    }
}
