use std::io::{self, Write};

use super::graph::{Node, ReductionGraph};

/// Graphviz colorscheme with nine colors, cycled by redex index.
const EDGE_COLORS: &str = "set19";

fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Writes the graph in Graphviz DOT. Normal forms get a double outline,
/// unexplored nodes a dashed one.
pub fn write_dot(graph: &ReductionGraph, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "digraph reductions {{")?;
    if graph.is_truncated() {
        writeln!(out, "  // truncated: the budget ran out before the graph was complete")?;
    }
    writeln!(out, "  node [shape=box];")?;

    for node in graph.nodes() {
        let style = match (node.explored, node.is_normal()) {
            (false, _) => " style=dashed",
            (true, true) => " peripheries=2",
            (true, false) => "",
        };
        writeln!(out, "  {} [label={}{style}];", quote(&node.id), quote(&node.label))?;
    }

    for edge in graph.edges() {
        writeln!(
            out,
            "  {} -> {} [id={} label={} colorscheme={EDGE_COLORS} color={}];",
            quote(&edge.source),
            quote(&edge.target),
            quote(&edge.key),
            edge.redex_index,
            edge.redex_index % 9 + 1,
        )?;
    }

    writeln!(out, "}}")
}

fn status(node: &Node) -> &'static str {
    match (node.explored, node.is_normal()) {
        (false, _) => " (unexplored)",
        (true, true) => " (normal)",
        (true, false) => "",
    }
}

/// Writes one line per node in discovery order, each followed by its
/// reducts indented and numbered by redex index.
pub fn write_text(graph: &ReductionGraph, out: &mut impl Write) -> io::Result<()> {
    for node in graph.nodes() {
        writeln!(out, "{}{}", node.label, status(node))?;
        for edge in graph.outgoing(&node.id) {
            let target = graph
                .node(&edge.target)
                .expect("every edge target is a node");
            writeln!(out, "  [{}] {}", edge.redex_index, target.label)?;
        }
    }

    if graph.is_truncated() {
        writeln!(out, "... truncated")?;
    }

    Ok(())
}
