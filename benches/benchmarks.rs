// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ecosystem_automation::{content_hash, parse_instrumentation_yaml, parse_metadata_str};

const RECEIVER_METADATA: &str = r"
type: otlp
status:
  class: receiver
  stability:
    beta: [logs]
    stable: [traces, metrics]
  distributions: [core, contrib, k8s]
  codeowners:
    active: [alice, bob]
attributes:
  transport:
    description: |
      Transport used to
      receive the data.
    type: string
metrics:
  otlp.receiver.accepted:
    enabled: true
    description: Number of accepted items.
    unit: '{items}'
    sum:
      value_type: int
      monotonic: true
";

fn benchmark_metadata_normalization(c: &mut Criterion,)
{
    c.bench_function("normalize_receiver_metadata", |b| {
        b.iter(|| parse_metadata_str(black_box(RECEIVER_METADATA,),).expect("parse failed",),)
    },);
}

fn instrumentation_list(libraries: usize,) -> String
{
    let mut yaml = String::from("libraries:\n",);
    for i in 0..libraries {
        yaml.push_str(&format!(
            "  - name: library-{i}\n    source_path: instrumentation/library-{i}\n    \
             scope:\n      name: io.opentelemetry.library-{i}\n    \
             target_versions:\n      javaagent:\n        - com.example:library-{i}:[1.0,)\n"
        ),);
    }
    yaml
}

fn benchmark_instrumentation_parse(c: &mut Criterion,)
{
    let yaml = instrumentation_list(200,);

    c.bench_function("parse_200_instrumentations", |b| {
        b.iter(|| parse_instrumentation_yaml(black_box(&yaml,), None,).expect("parse failed",),)
    },);
}

fn benchmark_content_hash(c: &mut Criterion,)
{
    let document = parse_instrumentation_yaml(&instrumentation_list(1,), None,).expect("parse failed",);
    let library = document
        .get("libraries",)
        .and_then(|value| value.as_sequence(),)
        .and_then(|libraries| libraries.first(),)
        .cloned()
        .expect("missing library",);

    c.bench_function("content_hash_library", |b| {
        b.iter(|| content_hash(black_box(&library,),).expect("hash failed",),)
    },);
}

criterion_group!(
    benches,
    benchmark_metadata_normalization,
    benchmark_instrumentation_parse,
    benchmark_content_hash
);
criterion_main!(benches);
