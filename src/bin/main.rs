use std::{
    error::Error,
    io::{self, IsTerminal, Read, Write},
};

use codescope::{
    checker, ir, lexer, parser,
    util::fmt::{print_instructions_string, print_node_string},
};

fn main() {
    if let Err(error) = run() {
        println!("failed to run: {error}");
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    if !io::stdin().is_terminal() {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        analyze(&input);
        return Ok(());
    }

    let mut input = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        input.clear();
        let n = io::stdin().read_line(&mut input)?;

        if n == 0 {
            println!("^D");
            return Ok(());
        }

        analyze(&input);
    }
}

fn analyze(input: &str) {
    let tokens = lexer::tokenize(input);

    println!("tokens:");
    for token in tokens.iter().filter(|t| !t.is_trivia()) {
        println!("  {token:?}");
    }

    let parse = parser::parse(&tokens);
    println!("tree:");
    print!("{}", indent(&print_node_string(&parse.root)));
    for error in &parse.errors {
        println!("syntax error: {error}");
    }

    let analysis = checker::check(&parse.root);
    println!("symbols:");
    for symbol in analysis.symbols.iter() {
        println!(
            "  {} : {} in {}{}{}",
            symbol.name,
            symbol.ty,
            symbol.scope,
            if symbol.initialized { "" } else { " (uninitialized)" },
            if symbol.used { "" } else { " (unused)" },
        );
    }
    for diagnostic in &analysis.diagnostics {
        println!("{}: {diagnostic}", diagnostic.severity());
    }

    let instructions = ir::generate(&parse.root);
    println!("code:");
    print!("{}", indent(&print_instructions_string(&instructions)));
}

fn indent(text: &str) -> String {
    text.lines().fold(String::new(), |mut acc, line| {
        acc.push_str("  ");
        acc.push_str(line);
        acc.push('\n');
        acc
    })
}
