use std::io::{self, Write};

use clap::{Subcommand, ValueEnum};
use thiserror::Error;
use tracing::debug;

use graph::Budget;
use known::Registry;
use term::TermRef;

mod compare;
mod enumerate;
mod format;
mod graph;
mod known;
mod output;
mod parser_lc;
mod reduction;
mod substitution;
mod term;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFmt {
    /// Graphviz DOT
    #[default]
    Dot,
    /// One line per term, reducts indented below
    Text,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Explore every term reachable by single beta steps
    Graph {
        /// Term to start from, e.g. `(λx.xx)(KI)`; `\` may stand for `λ`
        term: String,
        /// Maximum number of terms to expand [default: size², at most 50]
        #[arg(short, long)]
        budget: Option<usize>,
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFmt,
        /// Write known terms by name
        #[arg(short, long)]
        names: bool,
    },
    /// Print the first normal form found breadth first
    Normal {
        term: String,
        #[arg(short, long)]
        budget: Option<usize>,
        #[arg(short, long)]
        names: bool,
    },
    /// Show how a term is read and which redexes it contains
    Parse { term: String },
    /// List every term of the given size
    Enumerate {
        size: usize,
        /// Letters allowed as free values
        #[arg(long, default_value = "")]
        free: String,
    },
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error("failed parsing term: {0}")]
    Parse(#[from] parser_lc::ParseError),
    #[error("io error: {0}")]
    IO(#[from] io::Error),
    #[error("no normal form within {0} expansions")]
    NoNormalForm(usize),
    #[error("`{0}` cannot be a free value")]
    FreeName(char),
}

fn budget(limit: Option<usize>) -> Budget {
    limit.map_or(Budget::Auto, Budget::Limit)
}

pub fn run(command: &Command, out: &mut impl Write) -> Result<(), RunError> {
    match command {
        Command::Graph {
            term,
            budget: limit,
            format,
            names,
        } => write_graph(&parser_lc::parse(term)?, budget(*limit), *format, *names, out),
        Command::Normal {
            term,
            budget: limit,
            names,
        } => write_normal(&parser_lc::parse(term)?, budget(*limit), *names, out),
        Command::Parse { term } => describe(&parser_lc::parse(term)?, out),
        Command::Enumerate { size, free } => write_enumeration(*size, free, out),
    }
}

fn write_graph(
    term: &TermRef,
    budget: Budget,
    output_fmt: OutputFmt,
    names: bool,
    out: &mut impl Write,
) -> Result<(), RunError> {
    let mut graph = graph::explore(term, budget);
    if names {
        graph.relabel(&mut Registry::standard());
    }

    match output_fmt {
        OutputFmt::Dot => output::write_dot(&graph, out)?,
        OutputFmt::Text => output::write_text(&graph, out)?,
    }

    Ok(())
}

fn write_normal(
    term: &TermRef,
    budget: Budget,
    names: bool,
    out: &mut impl Write,
) -> Result<(), RunError> {
    let normal = graph::normal_form(term, budget)
        .ok_or_else(|| RunError::NoNormalForm(budget.resolve(term)))?;

    let text = if names {
        format::named(&normal, &mut Registry::standard())
    } else {
        format::pretty(&normal)
    };
    writeln!(out, "{text}")?;

    Ok(())
}

fn describe(term: &TermRef, out: &mut impl Write) -> Result<(), RunError> {
    writeln!(out, "term:    {term}")?;
    writeln!(out, "key:     {}", format::key(term))?;
    writeln!(out, "size:    {}", term.size())?;

    let free = term.free_values();
    if !free.is_empty() {
        let free: Vec<String> = free.iter().map(char::to_string).collect();
        writeln!(out, "free:    {}", free.join(" "))?;
    }

    let steps = reduction::reducts(term);
    writeln!(out, "redexes: {}", steps.len())?;
    for (i, (reduced, redex)) in steps.iter().enumerate() {
        writeln!(out, "  [{i}] {} reduces to {reduced}", **redex.node())?;
    }

    if let Some(name) = Registry::standard().name_of(term) {
        writeln!(out, "known:   {name}")?;
    }

    Ok(())
}

fn write_enumeration(size: usize, free: &str, out: &mut impl Write) -> Result<(), RunError> {
    let mut names: Vec<char> = Vec::new();
    for c in free.chars().filter(|c| !c.is_whitespace()) {
        if !c.is_ascii_alphabetic() || known::is_macro(c) {
            return Err(RunError::FreeName(c));
        }
        if !names.contains(&c) {
            names.push(c);
        }
    }

    let terms = enumerate::enumerate_size(size, 0, &names);
    debug!(size, count = terms.len(), "enumerated terms");
    for term in terms {
        writeln!(out, "{term}")?;
    }

    Ok(())
}
