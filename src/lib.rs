/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into a parse tree.
pub mod parser;

/// The checker walks the parse tree, builds the symbol table, and reports
/// semantic diagnostics.
pub mod checker;

/// The generator linearizes the parse tree into three-address code.
pub mod ir;

pub mod ast;
pub mod token;

pub mod util {
    pub mod fmt;
    #[cfg(test)]
    pub(crate) mod test_utils;
}
