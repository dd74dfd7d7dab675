mod common;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use vanction::backend::Backend;
use vanction::interpreter::Interpreter;
use vanction::transpiler::Transpiler;

fn bench_backends(c: &mut Criterion) {
    for (label, path) in common::workloads() {
        let program = common::load_program(&path);

        c.bench_function(&format!("backend_interpreter_{label}"), |b| {
            let interpreter = Interpreter::new();
            b.iter(|| {
                let output = interpreter.run(black_box(&program), "").expect("run");
                black_box(output);
            })
        });

        c.bench_function(&format!("backend_generate_cpp_{label}"), |b| {
            let transpiler = Transpiler::new();
            b.iter(|| {
                let source = transpiler.generate(black_box(&program));
                black_box(source);
            })
        });
    }
}

criterion_group!(benches, bench_backends);
criterion_main!(benches);
