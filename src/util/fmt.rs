use std::io::Write;

use crate::{
    ast::{Declarator, Fixity, LiteralKind, Node},
    ir::Instruction,
};

const INDENT_WIDTH: usize = 2;

pub fn print_node_string(node: &Node) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_node(&mut buf, 0, node).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_instructions_string(instructions: &[Instruction]) -> String {
    let mut buf = Vec::with_capacity(1024);
    for instruction in instructions {
        writeln!(buf, "{instruction}").unwrap();
    }
    String::from_utf8(buf).unwrap()
}

pub fn print_node(w: &mut impl Write, i: usize, node: &Node) -> std::io::Result<()> {
    match node {
        // The program root itself gets no line of its own.
        Node::Program(body) => {
            for stmt in body {
                print_node(w, i, stmt)?;
            }
            return Ok(());
        }
        Node::Block(body) => {
            sp(w, i)?;
            writeln!(w, "block")?;
            for stmt in body {
                print_node(w, i + 1, stmt)?;
            }
        }
        Node::Declaration { ty, declarators } => {
            sp(w, i)?;
            writeln!(w, "declaration {ty}")?;
            for declarator in declarators {
                print_declarator(w, i + 1, declarator)?;
            }
        }
        Node::Assignment { target, value } => {
            sp(w, i)?;
            writeln!(w, "assignment {target}")?;
            if let Some(value) = value {
                print_node(w, i + 1, value)?;
            }
        }
        Node::If {
            condition,
            then_block,
            else_block,
        } => {
            sp(w, i)?;
            writeln!(w, "if")?;
            print_section(w, i + 1, "condition", std::slice::from_ref(condition.as_ref()))?;
            print_section(w, i + 1, "then", then_block)?;
            if let Some(else_block) = else_block {
                print_section(w, i + 1, "else", else_block)?;
            }
        }
        Node::While { condition, body } => {
            sp(w, i)?;
            writeln!(w, "while")?;
            print_section(w, i + 1, "condition", std::slice::from_ref(condition.as_ref()))?;
            print_section(w, i + 1, "body", body)?;
        }
        Node::Return(value) => {
            sp(w, i)?;
            writeln!(w, "return")?;
            if let Some(value) = value {
                print_node(w, i + 1, value)?;
            }
        }
        Node::Binary { op, lhs, rhs } => {
            sp(w, i)?;
            writeln!(w, "binary {op:?}")?;
            print_node(w, i + 1, lhs)?;
            print_node(w, i + 1, rhs)?;
        }
        Node::Unary {
            op,
            fixity,
            operand,
        } => {
            sp(w, i)?;
            let head = match fixity {
                Fixity::Prefix => "unary",
                Fixity::Postfix => "postfix",
            };
            writeln!(w, "{head} {op:?}")?;
            print_node(w, i + 1, operand)?;
        }
        Node::Identifier(name) => {
            sp(w, i)?;
            writeln!(w, "ident {name}")?;
        }
        Node::Literal { kind, text } => {
            sp(w, i)?;
            let head = match kind {
                LiteralKind::Number => "number",
                LiteralKind::String => "string",
            };
            // Literal text is printed verbatim; strings keep their quotes.
            writeln!(w, "{head} {text}")?;
        }
    }
    Ok(())
}

fn print_declarator(w: &mut impl Write, i: usize, declarator: &Declarator) -> std::io::Result<()> {
    sp(w, i)?;
    write!(w, "declarator {}", declarator.name)?;
    if let Some(ref initializer) = declarator.initializer {
        writeln!(w, " (initialized)")?;
        print_node(w, i + 1, initializer)?;
    } else {
        writeln!(w)?;
    }
    Ok(())
}

fn print_section(w: &mut impl Write, i: usize, name: &str, body: &[Node]) -> std::io::Result<()> {
    sp(w, i)?;
    writeln!(w, "{name}")?;
    for node in body {
        print_node(w, i + 1, node)?;
    }
    Ok(())
}

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}
