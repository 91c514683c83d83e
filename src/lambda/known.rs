use const_format::formatcp;

use super::{
    parser_lc::parse,
    term::{Term, TermRef},
};

pub const IDENTITY: &str = "(λx.x)";
pub const CONSTANT: &str = "(λx.λy.x)";
pub const SUBSTITUTION: &str = "(λx.λy.λz.xz(yz))";
const SELF_APPLY: &str = "(λx.f(xx))";
pub const FIXED_POINT: &str = formatcp!("(λf.{SELF_APPLY}{SELF_APPLY})");

const BODY_0: &str = "x";
const BODY_1: &str = formatcp!("f{BODY_0}");
const BODY_2: &str = formatcp!("f({BODY_1})");
const BODY_3: &str = formatcp!("f({BODY_2})");
const BODY_4: &str = formatcp!("f({BODY_3})");
const BODY_5: &str = formatcp!("f({BODY_4})");
const BODY_6: &str = formatcp!("f({BODY_5})");
const BODY_7: &str = formatcp!("f({BODY_6})");
const BODY_8: &str = formatcp!("f({BODY_7})");
const BODY_9: &str = formatcp!("f({BODY_8})");

/// Macro tokens and the source text each one stands for.
pub const DEFINITIONS: [(char, &str); 14] = [
    ('I', IDENTITY),
    ('K', CONSTANT),
    ('S', SUBSTITUTION),
    ('Y', FIXED_POINT),
    ('0', formatcp!("(λf.λx.{BODY_0})")),
    ('1', formatcp!("(λf.λx.{BODY_1})")),
    ('2', formatcp!("(λf.λx.{BODY_2})")),
    ('3', formatcp!("(λf.λx.{BODY_3})")),
    ('4', formatcp!("(λf.λx.{BODY_4})")),
    ('5', formatcp!("(λf.λx.{BODY_5})")),
    ('6', formatcp!("(λf.λx.{BODY_6})")),
    ('7', formatcp!("(λf.λx.{BODY_7})")),
    ('8', formatcp!("(λf.λx.{BODY_8})")),
    ('9', formatcp!("(λf.λx.{BODY_9})")),
];

pub fn expansion(token: char) -> Option<&'static str> {
    DEFINITIONS
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, text)| *text)
}

pub fn is_macro(token: char) -> bool {
    expansion(token).is_some()
}

/// Single digits are their own macro; larger numerals are written `C12`,
/// which cannot be read back as an application of digits.
fn numeral_name(n: usize) -> String {
    if n < 10 {
        n.to_string()
    } else {
        format!("C{n}")
    }
}

/// Whether `name` is a single macro token, and so reads back as the term
/// it names.
pub fn is_macro_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!((chars.next(), chars.next()), (Some(token), None) if is_macro(token))
}

/// Named terms recognised when labelling output.
///
/// Append-only: the only growth after construction is a Church numeral
/// being registered the first time it is looked up.
pub struct Registry {
    entries: Vec<(String, TermRef)>,
}

impl Registry {
    pub fn empty() -> Self {
        Registry {
            entries: Vec::new(),
        }
    }

    /// `I`, `K`, `S`, `Y`, then the numerals `0` to `9`.
    pub fn standard() -> Self {
        let mut registry = Registry::empty();
        for (name, text) in DEFINITIONS {
            let term = parse(text).expect("built-in definitions are well-formed");
            registry.register(name.to_string(), term);
        }

        registry
    }

    pub fn register(&mut self, name: String, term: TermRef) {
        self.entries.push((name, term));
    }

    fn contains_name(&self, name: &str) -> bool {
        self.entries.iter().any(|(known, _)| known == name)
    }

    /// The name of the first registered term alpha-equivalent to `term`.
    pub fn name_of(&mut self, term: &Term) -> Option<&str> {
        if let Some(n) = term.as_church() {
            let name = numeral_name(n);
            if !self.contains_name(&name) {
                self.register(name, Term::church(n));
            }
        }

        self.entries
            .iter()
            .find(|(_, known)| **known == *term)
            .map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lambda::parser_lc::ParseError;

    type Result = core::result::Result<(), ParseError>;

    #[test]
    fn test_definitions() {
        assert_eq!(FIXED_POINT, "(λf.(λx.f(xx))(λx.f(xx)))");
        assert_eq!(expansion('3'), Some("(λf.λx.f(f(fx)))"));
        assert_eq!(expansion('x'), None);
    }

    #[test]
    fn test_numeral_definitions_are_church_numerals() -> Result {
        for (n, digit) in ('0'..='9').enumerate() {
            let term = parse(&digit.to_string())?;
            assert_eq!(term.as_church(), Some(n), "digit {digit}");
        }
        Ok(())
    }

    #[test]
    fn test_standard_names() -> Result {
        let mut registry = Registry::standard();
        assert_eq!(registry.entries.len(), 14);

        assert_eq!(registry.name_of(&*parse("λa.a")?), Some("I"));
        assert_eq!(registry.name_of(&*parse("λa.λb.a")?), Some("K"));
        assert_eq!(registry.name_of(&*parse("λa.λb.λc.ac(bc)")?), Some("S"));
        assert_eq!(registry.name_of(&*parse("Y")?), Some("Y"));
        assert_eq!(registry.name_of(&*parse("λa.λb.b")?), Some("0"));
        assert_eq!(registry.name_of(&*parse("λa.a a")?), None);
        Ok(())
    }

    #[test]
    fn test_printed_numeral_round_trips_to_its_name() -> Result {
        let mut registry = Registry::standard();
        let two = parse("2")?;
        let reparsed = parse(&two.to_string())?;
        assert_eq!(registry.name_of(&reparsed), Some("2"));
        Ok(())
    }

    #[test]
    fn test_large_numerals_are_registered_on_first_sight() {
        let mut registry = Registry::standard();
        assert_eq!(registry.name_of(&Term::church(12)), Some("C12"));
        assert_eq!(registry.entries.len(), 15);

        assert_eq!(registry.name_of(&Term::church(12)), Some("C12"));
        assert_eq!(registry.entries.len(), 15);
    }

    #[test]
    fn test_macro_names() {
        assert!(is_macro_name("K"));
        assert!(is_macro_name("7"));
        assert!(!is_macro_name("C10"));
        assert!(!is_macro_name("10"));
        assert!(!is_macro_name(""));
    }

    #[test]
    fn test_empty_registry_still_learns_numerals() {
        let mut registry = Registry::empty();
        assert!(registry.entries.is_empty());
        assert_eq!(registry.name_of(&Term::church(1)), Some("1"));
        assert_eq!(registry.name_of(&Term::free('a')), None);
    }
}
