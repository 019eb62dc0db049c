// program ::= statement*
// statement ::= declaration | assignment | if | while | return | block
// block ::= '{' statement* '}'
// declaration ::= type-keyword declarator (',' declarator)* ';'
// declarator ::= ID ['=' expr]
// assignment ::= ID '=' expr ';'
// if ::= if '(' expr ')' block [else block]
// while ::= while '(' expr ')' block
// return ::= return [expr] ';'
// expr ::= additive
// additive ::= multiplicative (('+' | '-') multiplicative)*
// multiplicative ::= unary (('*' | '/') unary)*
// unary ::= ('++' | '--' | '!' | '-') unary | postfix
// postfix ::= primary ['++' | '--']
// primary ::= '(' expr ')' | ID | number | string

/// A parse tree node. Each variant owns its children outright (a strict
/// tree, no sharing); the tree is immutable after construction and is
/// walked read-only by both the checker and the IR generator.
#[derive(Debug, PartialEq)]
pub enum Node {
    Program(Vec<Node>),
    Block(Vec<Node>),
    Declaration {
        ty: Box<str>,
        declarators: Vec<Declarator>,
    },
    Assignment {
        target: Box<str>,
        /// `None` when error recovery dropped the right-hand side.
        value: Option<Box<Node>>,
    },
    If {
        condition: Box<Node>,
        then_block: Vec<Node>,
        else_block: Option<Vec<Node>>,
    },
    While {
        condition: Box<Node>,
        body: Vec<Node>,
    },
    Return(Option<Box<Node>>),
    Binary {
        op: BinaryOperator,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Unary {
        op: UnaryOperator,
        fixity: Fixity,
        operand: Box<Node>,
    },
    Identifier(Box<str>),
    Literal {
        kind: LiteralKind,
        text: Box<str>,
    },
}

/// One declared name within a declaration statement.
#[derive(Debug, PartialEq)]
pub struct Declarator {
    pub name: Box<str>,
    pub initializer: Option<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Increment,
    Decrement,
    Not,
    Negate,
}

impl UnaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Increment => "++",
            UnaryOperator::Decrement => "--",
            UnaryOperator::Not => "!",
            UnaryOperator::Negate => "-",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixity {
    Prefix,
    Postfix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Number,
    String,
}
