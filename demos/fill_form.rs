//! Minimal program that lists a form's fields and fills them from `NAME=VALUE`
//! arguments.
//!
//! Usage:
//!   cargo run --example fill_form -- form.pdf
//!   cargo run --example fill_form -- form.pdf out.pdf Name=Alice Date=2024-01-01

use pdf_autofill::FormFiller;
use std::{env, process};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <form.pdf> [out.pdf NAME=VALUE...]", args[0]);
        process::exit(1);
    }

    let pdf_path = &args[1];

    let mut filler = FormFiller::from_path(pdf_path).unwrap_or_else(|e| {
        eprintln!("Error loading PDF: {e}");
        process::exit(1);
    });

    // 1. What can be filled?
    let fields = filler.fields();
    if fields.is_empty() {
        println!("  No form fields found.");
        process::exit(0);
    }
    for field in &fields {
        println!("  {:<30} {:?}", field.name, field.kind);
    }

    // 2. Fill them, if asked to.
    let Some(out_path) = args.get(2) else {
        return;
    };

    let values: Vec<(&str, &str)> = args[3..]
        .iter()
        .filter_map(|arg| arg.split_once('='))
        .collect();

    match filler.fill_to_path(out_path, values) {
        Ok(report) => {
            println!("✓ Wrote {out_path}: {} field(s) filled", report.updated.len());
            for name in &report.unknown {
                println!("⚠ No field named {name}");
            }
        }
        Err(e) => {
            eprintln!("✗ Fill failed: {e}");
            process::exit(1);
        }
    }
}
