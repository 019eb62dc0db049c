use codescope::{
    lexer::{self, SUGGESTED_TOKENS_CAPACITY},
    token::Token,
};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

const SNIPPET: &str = "
int total = 0; // running sum
float scale = 1.5e2;
while (total) {
    if (scale) {
        total = total + scale * 2;
    } else {
        total = total - 1;
    }
    scale--;
}
return total;
";

fn lexer(input: &str, tokens: &mut Vec<Token<'_>>) {
    lexer::lex(input, tokens);
    black_box(tokens.len());
}

fn criterion_benchmark(c: &mut Criterion) {
    let input = SNIPPET.repeat(512);
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY * 2);

    c.bench_function("lexer", |b| {
        b.iter(|| {
            tokens.clear();
            black_box(lexer(black_box(&input), &mut tokens));
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
