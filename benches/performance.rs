use std::time::{Duration, Instant};

use verso::editor::{
    self, Document, DocumentEditor, DocumentVector, FormatKind, Paragraph, Span,
};
use verso::{export, render};

/// Performance benchmark suite for the document core
///
/// Run with: cargo test --release --bench performance -- --nocapture
///
/// This measures:
/// - Document rendering performance
/// - Caret navigation across leaves and paragraphs
/// - Text insertion and deletion through the editing context
/// - Format toggling and paragraph split/merge
/// - Snapshot and export serialization
const SMALL_DOC_PARAGRAPHS: usize = 10;
const MEDIUM_DOC_PARAGRAPHS: usize = 100;
const LARGE_DOC_PARAGRAPHS: usize = 1000;
const HUGE_DOC_PARAGRAPHS: usize = 10000;

const ITERATIONS: usize = 100;

const SAMPLE_WORDS: [&str; 24] = [
    "Lorem",
    "ipsum",
    "dolor",
    "sit",
    "amet",
    "consectetur",
    "adipiscing",
    "elit",
    "sed",
    "do",
    "eiusmod",
    "tempor",
    "incididunt",
    "ut",
    "labore",
    "et",
    "dolore",
    "magna",
    "aliqua",
    "Ut",
    "enim",
    "ad",
    "minim",
    "veniam",
];

fn sample_text(words: usize, offset: usize) -> String {
    let mut text = String::new();
    for j in 0..words {
        if j > 0 {
            text.push(' ');
        }
        text.push_str(SAMPLE_WORDS[(j + offset) % SAMPLE_WORDS.len()]);
    }
    text
}

/// Create a plain test document with the specified number of paragraphs
fn create_test_document(num_paragraphs: usize, avg_words_per_para: usize) -> Document {
    let paragraphs = (0..num_paragraphs)
        .map(|i| Paragraph::new(vec![Span::new_text(sample_text(avg_words_per_para, i))]))
        .collect();
    Document::from_paragraphs(paragraphs).unwrap()
}

/// Create a document with nested formats in every paragraph
fn create_styled_document(num_paragraphs: usize) -> Document {
    let paragraphs = (0..num_paragraphs)
        .map(|i| {
            let kind = FormatKind::ALL[i % FormatKind::ALL.len()];
            Paragraph::new(vec![
                Span::new_text(format!("This is paragraph {i} with some ")),
                Span::new_format(
                    kind,
                    vec![
                        Span::new_text("styled "),
                        Span::new_format(
                            FormatKind::Emphasis,
                            vec![Span::new_text("and nested")],
                        ),
                    ],
                ),
                Span::new_text(" text and a plain tail."),
            ])
        })
        .collect();
    Document::from_paragraphs(paragraphs).unwrap()
}

struct BenchmarkResult {
    name: String,
    iterations: usize,
    total_duration: Duration,
    avg_duration: Duration,
    min_duration: Duration,
    max_duration: Duration,
}

impl BenchmarkResult {
    fn print(&self) {
        println!("\n{}", "=".repeat(70));
        println!("Benchmark: {}", self.name);
        println!("{}", "=".repeat(70));
        println!("Iterations:     {}", self.iterations);
        println!("Total time:     {:?}", self.total_duration);
        println!("Average:        {:?}", self.avg_duration);
        println!("Min:            {:?}", self.min_duration);
        println!("Max:            {:?}", self.max_duration);
        println!(
            "Ops/sec:        {:.2}",
            1_000_000.0 / self.avg_duration.as_micros().max(1) as f64
        );

        if self.avg_duration.as_millis() > 100 {
            println!("\n⚠️  WARNING: Average duration > 100ms (user-perceptible lag)");
        } else if self.avg_duration.as_millis() > 16 {
            println!("\n⚠️  WARNING: Average duration > 16ms (may drop frames)");
        }
    }
}

fn benchmark<F>(name: &str, iterations: usize, mut f: F) -> BenchmarkResult
where
    F: FnMut(),
{
    let mut durations = Vec::with_capacity(iterations);

    // Warmup
    for _ in 0..10 {
        f();
    }

    for _ in 0..iterations {
        let start = Instant::now();
        f();
        durations.push(start.elapsed());
    }

    let total_duration: Duration = durations.iter().sum();
    let avg_duration = total_duration / iterations as u32;
    let min_duration = *durations.iter().min().unwrap();
    let max_duration = *durations.iter().max().unwrap();

    BenchmarkResult {
        name: name.to_string(),
        iterations,
        total_duration,
        avg_duration,
        min_duration,
        max_duration,
    }
}

fn document_sizes() -> Vec<(&'static str, usize)> {
    vec![
        ("Small (10 paras)", SMALL_DOC_PARAGRAPHS),
        ("Medium (100 paras)", MEDIUM_DOC_PARAGRAPHS),
        ("Large (1000 paras)", LARGE_DOC_PARAGRAPHS),
        ("Huge (10000 paras)", HUGE_DOC_PARAGRAPHS),
    ]
}

fn iterations_for(name: &str) -> usize {
    if name.contains("Huge") { 10 } else { ITERATIONS }
}

#[test]
fn bench_rendering_performance() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           RENDERING PERFORMANCE BENCHMARKS                     ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, size) in document_sizes() {
        let doc = create_test_document(size, 20);
        let cursor = doc.document_end().unwrap();
        let result = benchmark(
            &format!("render_document - {name}"),
            iterations_for(name),
            || {
                let _ = render::render_document(&doc, 80, Some(&cursor), None);
            },
        );
        result.print();
    }
}

#[test]
fn bench_rendering_with_styles() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║        RENDERING WITH NESTED FORMATS BENCHMARKS                ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, size) in document_sizes() {
        let doc = create_styled_document(size);
        let selection = editor::SelectionRange {
            start: doc.document_start().unwrap(),
            end: doc.document_end().unwrap(),
        };
        let result = benchmark(
            &format!("render_document (styled, fully selected) - {name}"),
            iterations_for(name),
            || {
                let _ = render::render_document(&doc, 80, None, Some(&selection));
            },
        );
        result.print();
    }
}

#[test]
fn bench_navigation_walk() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║              CARET NAVIGATION BENCHMARKS                       ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, size) in [
        ("Small (10 paras)", SMALL_DOC_PARAGRAPHS),
        ("Medium (100 paras)", MEDIUM_DOC_PARAGRAPHS),
    ] {
        let doc = create_styled_document(size);
        let mut steps = 0usize;
        let result = benchmark(&format!("next_vector full walk - {name}"), 20, || {
            let mut vector = doc.document_start().unwrap();
            steps = 0;
            while let Ok(next) = doc.next_vector(&vector) {
                vector = next;
                steps += 1;
            }
        });
        result.print();
        println!("\nSteps per walk: {steps}");

        let result = benchmark(&format!("previous_vector full walk - {name}"), 20, || {
            let mut vector = doc.document_end().unwrap();
            while let Ok(previous) = doc.previous_vector(&vector) {
                vector = previous;
            }
        });
        result.print();
    }
}

#[test]
fn bench_char_to_byte_conversion() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║         CHAR-TO-BYTE CONVERSION BENCHMARKS                     ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let text_samples = vec![
        ("Short ASCII (50 chars)", "a".repeat(50)),
        ("Medium ASCII (500 chars)", "a".repeat(500)),
        ("Long ASCII (5000 chars)", "a".repeat(5000)),
        ("Short Unicode (50 chars)", "🔥".repeat(50)),
        ("Medium Unicode (500 chars)", "🔥".repeat(500)),
    ];

    for (name, text) in text_samples {
        let char_count = text.chars().count();
        let mid_point = char_count / 2;

        let result = benchmark(
            &format!("char_to_byte_idx (middle of {char_count}) - {name}"),
            ITERATIONS * 10,
            || {
                let _ = editor::char_to_byte_idx(&text, mid_point);
            },
        );
        result.print();
    }
}

#[test]
fn bench_full_edit_cycle() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║              FULL EDIT CYCLE BENCHMARKS                        ║");
    println!("╚════════════════════════════════════════════════════════════════╝");
    println!("\nThis simulates the full cost of typing a character:");
    println!("  1. Insert text at the caret");
    println!("  2. Refresh the active formats");
    println!("  3. Re-render the document");

    for (name, size) in document_sizes() {
        let iterations = iterations_for(name);
        let template = create_test_document(size, 20);

        let result = benchmark(&format!("Full edit cycle - {name}"), iterations, || {
            let mut editor = DocumentEditor::new(template.clone());
            editor.move_to_document_end(false);
            for _ in 0..10 {
                editor.insert_text("x").unwrap();
                let _ = render::render_document(
                    editor.document(),
                    80,
                    Some(editor.cursor()),
                    editor.selection(),
                );
            }
        });
        result.print();

        let per_char = result.avg_duration / 10;
        println!("\nPer-character cost: {per_char:?}");

        if per_char.as_millis() > 16 {
            println!("⚠️  CRITICAL: Typing will feel laggy (>16ms per keystroke)");
        } else if per_char.as_millis() > 5 {
            println!("⚠️  WARNING: May feel sluggish on older hardware");
        }
    }
}

#[test]
fn bench_structural_edits() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║             STRUCTURAL EDIT BENCHMARKS                         ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, size) in document_sizes() {
        let template = create_styled_document(size);
        let middle = size / 2;
        let caret = DocumentVector::new(vec![middle, 1, 0], 3);

        let result = benchmark(
            &format!("paragraph break + merge - {name}"),
            iterations_for(name),
            || {
                let mut doc = template.clone();
                let split = doc.insert_paragraph_break(&caret).unwrap();
                doc.delete_single(&split).unwrap();
            },
        );
        result.print();

        let result = benchmark(
            &format!("toggle Strong twice - {name}"),
            iterations_for(name),
            || {
                let mut editor = DocumentEditor::new(template.clone());
                editor.move_to(caret.clone()).unwrap();
                editor.toggle_format(FormatKind::Strong).unwrap();
                editor.insert_text("bold").unwrap();
                editor.toggle_format(FormatKind::Strong).unwrap();
            },
        );
        result.print();
    }
}

#[test]
fn bench_serialization() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║               SERIALIZATION BENCHMARKS                         ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, size) in [
        ("Medium (100 paras)", MEDIUM_DOC_PARAGRAPHS),
        ("Large (1000 paras)", LARGE_DOC_PARAGRAPHS),
    ] {
        let doc = create_styled_document(size);
        let json = doc.to_json().unwrap();

        let result = benchmark(&format!("to_json - {name}"), ITERATIONS, || {
            let _ = doc.to_json().unwrap();
        });
        result.print();

        let result = benchmark(&format!("from_json - {name}"), ITERATIONS, || {
            let _ = Document::from_json(&json).unwrap();
        });
        result.print();

        let result = benchmark(&format!("write_markdown - {name}"), ITERATIONS, || {
            let _ = export::write_markdown(&doc).unwrap();
        });
        result.print();
    }
}
