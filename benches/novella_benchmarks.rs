use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use novella_core::designator::DesignatorInterpreter;
use novella_core::lexer::Lexer;
use novella_core::mangling;
use novella_core::novella::Novella;
use novella_core::parser::{MarkupParser, SourceParser};
use novella_core::treepath::Treepath;

// ============================================================================
// Test Data
// ============================================================================

const SMALL_NOVELLA: &str = "== Chapter @draft
\\\\chapter

Some text, with \"quoted words\" and a link http://novelang.sourceforge.net.

--- a list item
";

const MEDIUM_NOVELLA: &str = "== Introduction @intro
\\\\introduction

The first paragraph tells what this is about.
It spans two lines.

=== Details

A list follows:
 - first item
 - second item
   - nested item

<<< @quote
\"Quoted paragraph\", said someone.
>>>

=== More details @draft

--- item one

--- item two

== Conclusion

./images/end.png
";

/// A Novella of `chapters` levels, each holding a few paragraphs and a sub-level.
fn generate_novella(chapters: usize) -> String {
    let mut novella = String::new();
    for i in 0..chapters {
        novella.push_str(&format!("== Chapter {i} @tag{}\n\n", i % 5));
        novella.push_str(&format!("Paragraph of chapter {i}, with a few words.\n\n"));
        novella.push_str(" - embedded item\n - another item\n\n");
        novella.push_str(&format!("=== Section {i}\n\\\\section{i}\n\nSection text.\n\n"));
    }
    novella
}

// ============================================================================
// Reader Benchmarks
// ============================================================================

fn bench_lexer_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_sizes");
    let large = generate_novella(50);
    for (name, source) in [
        ("small", SMALL_NOVELLA),
        ("medium", MEDIUM_NOVELLA),
        ("large", large.as_str()),
    ] {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, src| {
            b.iter(|| {
                let mut lexer = Lexer::new(black_box(src));
                lexer.lex()
            })
        });
    }
    group.finish();
}

fn bench_parser_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_scaling");
    for chapters in [10, 100, 500] {
        let source = generate_novella(chapters);
        group.throughput(Throughput::Elements(chapters as u64));
        group.bench_with_input(BenchmarkId::from_parameter(chapters), &source, |b, src| {
            b.iter(|| MarkupParser.parse(black_box(src), "bench.novella"))
        });
    }
    group.finish();
}

// ============================================================================
// Mangling Benchmarks
// ============================================================================

fn bench_mangling_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("mangling_pipeline");
    for chapters in [10, 100, 500] {
        let raw = MarkupParser
            .parse(&generate_novella(chapters), "bench.novella")
            .expect("generated novella must parse");
        group.throughput(Throughput::Elements(chapters as u64));
        group.bench_with_input(BenchmarkId::from_parameter(chapters), &raw, |b, raw| {
            b.iter(|| mangling::mangle_novella(&Treepath::new(black_box(raw.clone()))))
        });
    }
    group.finish();
}

fn bench_designator_interpreter(c: &mut Criterion) {
    let novella = Novella::from_source(&generate_novella(200), "bench.novella")
        .expect("generated novella must mangle");
    let tree = novella
        .document_tree()
        .expect("generated novella has a tree")
        .clone();
    c.bench_function("designator_interpreter", |b| {
        b.iter(|| DesignatorInterpreter::new(&Treepath::new(black_box(tree.clone()))))
    });
}

// ============================================================================
// End-to-End Benchmarks
// ============================================================================

fn bench_novella_standalone(c: &mut Criterion) {
    let source = generate_novella(100);
    let tags = novella_core::designator::Tag::to_tag_set(["tag1", "tag3"]);
    c.bench_function("novella_standalone", |b| {
        b.iter(|| {
            Novella::from_source(black_box(&source), "bench.novella")
                .map(|novella| novella.make_standalone(&tags))
        })
    });
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(reader_benches, bench_lexer_sizes, bench_parser_scaling);

criterion_group!(
    mangling_benches,
    bench_mangling_pipeline,
    bench_designator_interpreter
);

criterion_group!(e2e_benches, bench_novella_standalone);

criterion_main!(reader_benches, mangling_benches, e2e_benches);
