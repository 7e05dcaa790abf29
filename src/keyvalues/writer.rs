use crate::keyvalues::{KvNode, KvValue};

/// Renders a tree as text KeyValues, tab indented like the Steam client's own files.
///
/// Backslashes and quotes are escaped, so the output must be read back with
/// [`TextOptions::escape_sequences`](crate::keyvalues::text::TextOptions::escape_sequences) enabled.
pub fn to_text(node: &KvNode) -> String {
    let mut out = String::new();
    write_node(&mut out, node, 0);
    out
}

fn write_node(out: &mut String, node: &KvNode, depth: usize) {
    indent(out, depth);
    write_quoted(out, &node.name);

    match &node.value {
        KvValue::Object(children) => {
            out.push('\n');
            indent(out, depth);
            out.push_str("{\n");
            for child in children {
                write_node(out, child, depth + 1);
            }
            indent(out, depth);
            out.push_str("}\n");
        }
        scalar => {
            out.push_str("\t\t");
            write_quoted(out, &scalar.to_string());
            out.push('\n');
        }
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

fn write_quoted(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
}
