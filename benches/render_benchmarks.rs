use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use stacklint::Variables;
use stacklint::template::render_str;

/// Generate template content of different patterns for benchmarking
fn generate_template(resources: usize, pattern: &str) -> String {
    let mut content = String::from("AWSTemplateFormatVersion: '2010-09-09'\nResources:\n");

    match pattern {
        "plain" => {
            for i in 0..resources {
                content.push_str(&format!(
                    "  Bucket{}:\n    Type: AWS::S3::Bucket\n    Properties:\n      BucketName: bucket-{}\n",
                    i, i
                ));
            }
        }
        "substitution_heavy" => {
            for i in 0..resources {
                content.push_str(&format!(
                    "  Bucket{}:\n    Type: AWS::S3::Bucket\n    Properties:\n      BucketName: {{{{ var.env }}}}-{{{{ project | lower }}}}-{}\n",
                    i
                ));
            }
        }
        "dynamic_references" => {
            for i in 0..resources {
                content.push_str(&format!(
                    "  Db{}:\n    Type: AWS::RDS::DBInstance\n    Properties:\n      MasterUserPassword: '{{{{resolve:ssm:/{{{{ env }}}}/db{}}}}}'\n",
                    i, i
                ));
            }
        }
        "loops" => {
            content.push_str("{% for name in buckets %}\n");
            content.push_str(
                "  {{ name }}:\n    Type: AWS::S3::Bucket\n{% if versioned %}    Properties:\n      VersioningConfiguration:\n        Status: Enabled\n{% endif %}",
            );
            content.push_str("{% endfor %}\n");
        }
        _ => panic!("unknown pattern {}", pattern),
    }

    content
}

fn variables(resources: usize) -> Variables {
    let mut vars = Variables::new();
    vars.insert("env", serde_yaml::Value::String("prod".to_string()));
    vars.insert("project", serde_yaml::Value::String("Atlas".to_string()));
    vars.insert("versioned", serde_yaml::Value::Bool(true));
    vars.insert(
        "buckets",
        serde_yaml::Value::Sequence(
            (0..resources)
                .map(|i| serde_yaml::Value::String(format!("Bucket{}", i)))
                .collect(),
        ),
    );
    vars
}

fn bench_render_patterns(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let vars = variables(500);

    for pattern in ["plain", "substitution_heavy", "dynamic_references", "loops"] {
        let template = generate_template(500, pattern);
        group.throughput(Throughput::Bytes(template.len() as u64));
        group.bench_with_input(BenchmarkId::new("render", pattern), &template, |b, t| {
            b.iter(|| black_box(render_str(black_box(t), &vars)))
        });
    }

    group.finish();
}

fn bench_render_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_size");
    let vars = variables(0);

    for size in [10, 100, 1_000] {
        let template = generate_template(size, "substitution_heavy");
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &template, |b, t| {
            b.iter(|| black_box(render_str(black_box(t), &vars)))
        });
    }

    group.finish();
}

criterion_group!(render_benches, bench_render_patterns, bench_render_sizes);

criterion_main!(render_benches);
