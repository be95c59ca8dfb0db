use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use taskschema::{annotate, Schema, SchemaParser, Settings, Task};

#[derive(Parser)]
#[command(name = "taskschema", about = "Infer, validate and apply task-status schemas")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Infer a schema from a task document
    Generate {
        /// Task document to sample
        path: PathBuf,
        /// Label recorded as the schema's source (default: document path)
        #[arg(short, long)]
        source: Option<String>,
        /// Max lines to sample (default: from settings)
        #[arg(short = 'n', long)]
        sample_lines: Option<usize>,
        /// Write the schema here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Check a schema against a document
    Validate {
        /// Schema JSON file
        schema: PathBuf,
        /// Task document
        path: PathBuf,
        /// Expected task count (default: count task ids in the document)
        #[arg(short, long)]
        expected: Option<usize>,
        /// Write the annotated schema back to the schema file
        #[arg(short, long)]
        write: bool,
    },
    /// Parse a document into task records
    Parse {
        /// Task document
        path: PathBuf,
        /// Schema JSON file (default: builtin checklist schema)
        #[arg(short, long)]
        schema: Option<PathBuf>,
        /// Print tasks as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load().context("loading settings")?;

    let result = match cli.command {
        Commands::Generate {
            path,
            source,
            sample_lines,
            out,
        } => {
            let generator = match sample_lines {
                Some(n) => taskschema::SchemaGenerator::new(n),
                None => settings.generator(),
            };
            let schema = generator.generate(&path, source.as_deref())?;
            match out {
                Some(out) => {
                    schema.save(&out)?;
                    println!(
                        "Wrote {} schema to {} ({} tasks found, confidence {:.2})",
                        format_name(&schema),
                        out.display(),
                        schema.metadata.tasks_found,
                        schema.metadata.confidence
                    );
                }
                None => println!("{}", serde_json::to_string_pretty(&schema)?),
            }
            Ok(())
        }
        Commands::Validate {
            schema: schema_path,
            path,
            expected,
            write,
        } => {
            let schema = Schema::load(&schema_path)
                .with_context(|| format!("loading schema {}", schema_path.display()))?;
            let report = settings.validator().validate(&schema, &path, expected)?;

            println!("Matched:    {} / {}", report.matched, report.expected);
            println!("Match rate: {:.1}%", report.match_rate * 100.0);
            println!("Result:     {}", if report.passed { "PASS" } else { "FAIL" });
            for err in &report.errors {
                println!("  - {}", err);
            }

            if write {
                let annotated = annotate(&schema, &report);
                annotated.save(&schema_path)?;
                println!(
                    "Updated {} (confidence {:.2})",
                    schema_path.display(),
                    annotated.metadata.confidence
                );
            }

            if report.passed {
                Ok(())
            } else {
                Err(anyhow::anyhow!("schema failed validation"))
            }
        }
        Commands::Parse { path, schema, json } => {
            let parser = match schema {
                Some(schema_path) => SchemaParser::from_path(&schema_path)
                    .with_context(|| format!("loading schema {}", schema_path.display()))?,
                None => SchemaParser::builtin()?,
            };
            let report = parser.parse_report(&path)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            if report.tasks.is_empty() {
                println!("No tasks found in {}.", path.display());
            } else {
                print_tasks(parser.semantic_fields(), &report.tasks);
            }
            if !report.diagnostics.is_empty() {
                println!("\n--- Diagnostics ---");
                for d in &report.diagnostics {
                    println!("  {}", d);
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

fn format_name(schema: &Schema) -> &'static str {
    match schema.format_type {
        taskschema::FormatType::Checklist => "checklist",
        taskschema::FormatType::NumberedList => "numbered-list",
        taskschema::FormatType::Custom => "custom",
    }
}

fn print_tasks(fields: &[String], tasks: &[Task]) {
    let mut header = format!("{:>5} | {:<12} | {:<32}", "Line", "Task", "Description");
    for f in fields {
        header.push_str(&format!(" | {:<12}", truncate(f, 12)));
    }
    println!("{}", header);
    println!("{}", "-".repeat(header.chars().count()));

    for t in tasks {
        let mut row = format!(
            "{:>5} | {:<12} | {:<32}",
            t.line,
            truncate(&t.task_id, 12),
            truncate(&t.description, 32)
        );
        for f in fields {
            row.push_str(&format!(" | {:<12}", t.state(f).as_str()));
        }
        println!("{}", row);
    }

    let done = tasks.iter().filter(|t| t.is_complete()).count();
    println!("\n{} tasks | {} complete", tasks.len(), done);
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}
