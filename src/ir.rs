use std::fmt;

use crate::ast::Node;

/// A three-address-code record: either an operation consuming up to two
/// operands, or a bare label marker. Jump operations (`goto`, `ifgoto`)
/// name their target label in `result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Op {
        op: Box<str>,
        arg1: Option<Box<str>>,
        arg2: Option<Box<str>>,
        result: Option<Box<str>>,
    },
    Label(Box<str>),
}

impl Instruction {
    pub fn op(&self) -> Option<&str> {
        match self {
            Instruction::Op { op, .. } => Some(op),
            Instruction::Label(_) => None,
        }
    }

    pub fn arg1(&self) -> Option<&str> {
        match self {
            Instruction::Op { arg1, .. } => arg1.as_deref(),
            Instruction::Label(_) => None,
        }
    }

    pub fn arg2(&self) -> Option<&str> {
        match self {
            Instruction::Op { arg2, .. } => arg2.as_deref(),
            Instruction::Label(_) => None,
        }
    }

    pub fn result(&self) -> Option<&str> {
        match self {
            Instruction::Op { result, .. } => result.as_deref(),
            Instruction::Label(_) => None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Instruction::Op { .. } => None,
            Instruction::Label(name) => Some(name),
        }
    }
}

/// Linearizes the parse tree into an ordered instruction sequence.
///
/// The temporary/label counters live in a generator constructed per call,
/// so the output for a given tree is deterministic and independent runs
/// cannot interfere with each other. Partial trees produced by parser
/// recovery simply under-generate; this function never fails.
pub fn generate(root: &Node) -> Vec<Instruction> {
    let mut generator = Generator::new();
    generator.visit(root);
    generator.instructions
}

struct Generator {
    instructions: Vec<Instruction>,
    temps: u32,
    labels: u32,
}

impl Generator {
    fn new() -> Generator {
        Generator {
            instructions: Vec::new(),
            temps: 0,
            labels: 0,
        }
    }

    fn visit(&mut self, node: &Node) {
        match node {
            Node::Program(body) | Node::Block(body) => {
                for stmt in body {
                    self.visit(stmt);
                }
            }
            Node::Declaration { declarators, .. } => {
                // Only initialized names produce code.
                for declarator in declarators {
                    if let Some(init) = &declarator.initializer {
                        if let Some(value) = self.eval(init) {
                            self.assign(&declarator.name, value);
                        }
                    }
                }
            }
            Node::Assignment { target, value } => {
                if let Some(value) = value.as_deref().and_then(|value| self.eval(value)) {
                    self.assign(target, value);
                }
            }
            Node::If {
                condition,
                then_block,
                else_block,
            } => {
                let cond = self.eval(condition);
                let then_label = self.new_label();
                let else_label = else_block.as_ref().map(|_| self.new_label());
                let end_label = self.new_label();

                self.jump_if(cond, &then_label);
                if let Some(else_label) = &else_label {
                    self.jump(else_label);
                }

                self.mark(&then_label);
                for stmt in then_block {
                    self.visit(stmt);
                }
                self.jump(&end_label);

                if let (Some(else_label), Some(else_block)) = (&else_label, else_block) {
                    self.mark(else_label);
                    for stmt in else_block {
                        self.visit(stmt);
                    }
                }

                self.mark(&end_label);
            }
            Node::While { condition, body } => {
                let start_label = self.new_label();
                let body_label = self.new_label();
                let end_label = self.new_label();

                self.mark(&start_label);
                let cond = self.eval(condition);
                self.jump_if(cond, &body_label);
                self.jump(&end_label);

                self.mark(&body_label);
                for stmt in body {
                    self.visit(stmt);
                }
                self.jump(&start_label);

                self.mark(&end_label);
            }
            Node::Return(value) => {
                let arg1 = value.as_deref().and_then(|value| self.eval(value));
                self.instructions.push(Instruction::Op {
                    op: "return".into(),
                    arg1,
                    arg2: None,
                    result: None,
                });
            }
            Node::Binary { .. } | Node::Unary { .. } | Node::Identifier(_) | Node::Literal { .. } => {
                self.eval(node);
            }
        }
    }

    /// Evaluates an expression subtree and returns the name holding its
    /// value: a literal's own text, an identifier's own name, or a freshly
    /// allocated temporary.
    fn eval(&mut self, node: &Node) -> Option<Box<str>> {
        match node {
            Node::Identifier(name) => Some(name.clone()),
            Node::Literal { text, .. } => Some(text.clone()),
            Node::Binary { op, lhs, rhs } => {
                let arg1 = self.eval(lhs)?;
                let arg2 = self.eval(rhs)?;
                let temp = self.new_temp();
                self.instructions.push(Instruction::Op {
                    op: op.symbol().into(),
                    arg1: Some(arg1),
                    arg2: Some(arg2),
                    result: Some(temp.clone()),
                });
                Some(temp)
            }
            Node::Unary { op, operand, .. } => {
                let arg1 = self.eval(operand)?;
                let temp = self.new_temp();
                self.instructions.push(Instruction::Op {
                    op: op.symbol().into(),
                    arg1: Some(arg1),
                    arg2: None,
                    result: Some(temp.clone()),
                });
                Some(temp)
            }
            _ => {
                // Statement-shaped nodes in expression position produce no
                // value; recurse without emitting anything extra.
                self.visit(node);
                None
            }
        }
    }

    fn assign(&mut self, target: &str, value: Box<str>) {
        self.instructions.push(Instruction::Op {
            op: "=".into(),
            arg1: Some(value),
            arg2: None,
            result: Some(target.into()),
        });
    }

    fn jump(&mut self, target: &str) {
        self.instructions.push(Instruction::Op {
            op: "goto".into(),
            arg1: None,
            arg2: None,
            result: Some(target.into()),
        });
    }

    fn jump_if(&mut self, cond: Option<Box<str>>, target: &str) {
        self.instructions.push(Instruction::Op {
            op: "ifgoto".into(),
            arg1: cond,
            arg2: None,
            result: Some(target.into()),
        });
    }

    fn mark(&mut self, label: &str) {
        self.instructions.push(Instruction::Label(label.into()));
    }

    fn new_temp(&mut self) -> Box<str> {
        let temp = format!("t{}", self.temps);
        self.temps += 1;
        temp.into()
    }

    fn new_label(&mut self) -> Box<str> {
        let label = format!("L{}", self.labels);
        self.labels += 1;
        label.into()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let some = |arg: &Option<Box<str>>| arg.as_deref().unwrap_or("_").to_owned();
        match self {
            Instruction::Label(name) => write!(f, "{name}:"),
            Instruction::Op {
                op,
                arg1,
                arg2,
                result,
            } => match (&**op, arg2) {
                ("=", _) => write!(f, "{} = {}", some(result), some(arg1)),
                ("goto", _) => write!(f, "goto {}", some(result)),
                ("ifgoto", _) => write!(f, "ifgoto {} {}", some(arg1), some(result)),
                ("return", _) => match arg1 {
                    Some(arg1) => write!(f, "return {arg1}"),
                    None => write!(f, "return"),
                },
                (op, Some(arg2)) => write!(f, "{} = {} {op} {arg2}", some(result), some(arg1)),
                (op, None) => write!(f, "{} = {op} {}", some(result), some(arg1)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lexer, parser, util::fmt::print_instructions_string};
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn lower(src: &str) -> Vec<Instruction> {
        let tokens = lexer::tokenize(src);
        let parse = parser::parse(&tokens);
        assert!(parse.errors.is_empty(), "unexpected syntax errors");
        generate(&parse.root)
    }

    fn listing(src: &str) -> String {
        print_instructions_string(&lower(src))
    }

    #[test]
    fn expression_temporaries_follow_precedence() {
        assert_eq!(
            listing("x = a + b * c;"),
            indoc! {"
                t0 = b * c
                t1 = a + t0
                x = t1
            "}
        );
    }

    #[test]
    fn unary_operators_allocate_temporaries() {
        assert_eq!(
            listing("x = -a; y = b++;"),
            indoc! {"
                t0 = - a
                x = t0
                t1 = ++ b
                y = t1
            "}
        );
    }

    #[test]
    fn declaration_initializers_lower_to_assignments() {
        assert_eq!(
            listing("int a = 1, b, c = a + 2;"),
            indoc! {"
                a = 1
                t0 = a + 2
                c = t0
            "}
        );
    }

    #[test]
    fn if_else_linearization_shape() {
        let instructions = lower("if (x) { y = 1; } else { y = 2; }");
        assert_eq!(
            print_instructions_string(&instructions),
            indoc! {"
                ifgoto x L0
                goto L1
                L0:
                y = 1
                goto L2
                L1:
                y = 2
                L2:
            "}
        );
        // Eight structural records around the two branch assignments.
        let structural = instructions
            .iter()
            .filter(|i| i.op() != Some("="))
            .count();
        assert_eq!(structural, 8);
    }

    #[test]
    fn if_without_else_falls_through() {
        assert_eq!(
            listing("if (x) { y = 1; }"),
            indoc! {"
                ifgoto x L0
                L0:
                y = 1
                goto L1
                L1:
            "}
        );
    }

    #[test]
    fn while_emits_a_single_back_edge() {
        let instructions = lower("while (x) { x = x - 1; }");
        assert_eq!(
            print_instructions_string(&instructions),
            indoc! {"
                L0:
                ifgoto x L1
                goto L2
                L1:
                t0 = x - 1
                x = t0
                goto L0
                L2:
            "}
        );

        let start = instructions
            .iter()
            .position(|i| i.label() == Some("L0"))
            .unwrap();
        let condition = instructions
            .iter()
            .position(|i| i.op() == Some("ifgoto"))
            .unwrap();
        assert!(start < condition, "start label must precede the condition");

        let back_edges = instructions
            .iter()
            .filter(|i| i.op() == Some("goto") && i.result() == Some("L0"))
            .count();
        assert_eq!(back_edges, 1);
    }

    #[test]
    fn return_with_and_without_value() {
        assert_eq!(
            listing("return x + 1; return;"),
            indoc! {"
                t0 = x + 1
                return t0
                return
            "}
        );
    }

    #[test]
    fn nested_control_flow_keeps_labels_unique() {
        let instructions = lower(
            "while (a) { if (b) { a = a - 1; } else { a = 0; } while (c) { c = c - 1; } }",
        );

        let mut defined = HashSet::new();
        for i in &instructions {
            if let Some(label) = i.label() {
                assert!(defined.insert(label), "label {label} defined twice");
            }
        }
        for i in &instructions {
            if matches!(i.op(), Some("goto" | "ifgoto")) {
                let target = i.result().unwrap();
                assert!(defined.contains(target), "jump to undefined {target}");
            }
        }
    }

    #[test]
    fn temporaries_are_unique_within_a_run() {
        let instructions = lower("x = a + b + c * d - e / f; y = -x;");
        let temps: Vec<_> = instructions
            .iter()
            .filter_map(Instruction::result)
            .filter(|r| r.starts_with('t'))
            .collect();
        let unique: HashSet<_> = temps.iter().copied().collect();
        assert_eq!(temps.len(), unique.len());
    }

    #[test]
    fn generation_is_deterministic_across_calls() {
        let tokens = lexer::tokenize("int i = 0; while (i) { i = i - 1; } return i;");
        let parse = parser::parse(&tokens);
        let first = generate(&parse.root);
        let second = generate(&parse.root);
        assert_eq!(first, second);
    }

    #[test]
    fn recovered_assignment_without_value_emits_nothing() {
        let tokens = lexer::tokenize("x = %;");
        let parse = parser::parse(&tokens);
        assert!(!parse.errors.is_empty());
        assert_eq!(generate(&parse.root), Vec::new());
    }
}
