//! Test driver emission and output parsing.
//!
//! The driver `#include`s the generated file unchanged, embeds the test
//! vectors as a `float` table, and prints one line per vector:
//!
//! - linear: `%.9g` of `predict`
//! - logistic: `%.9g %d`, the probability then the class
//! - tree: `%d`, the class

use crate::codegen::writer::CWriter;
use crate::codegen::{float_literal, GeneratedSource};
use crate::error::{Error, Result};
use crate::model::{ModelFamily, Prediction};

pub const DRIVER_FILE: &str = "driver.c";

/// C source of a driver running `source` over `vectors`.
pub fn emit_driver(source: &GeneratedSource, vectors: &[Vec<f64>]) -> Result<String> {
    let width = vectors
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0)
        .max(source.n_features)
        .max(1);

    let mut w = CWriter::new();
    w.line("/* Verification driver generated by modelc. */");
    w.line("#include <stdio.h>");
    w.line(&format!("#include \"{}\"", source.file_name));
    w.blank();
    w.open(&format!(
        "static const float vectors[{}][{}] = {{",
        vectors.len(),
        width
    ));
    for v in vectors {
        let mut row = v
            .iter()
            .map(|&x| float_literal(x))
            .collect::<Result<Vec<_>>>()?;
        row.resize(width, "0.0f".to_string());
        w.line(&format!("{{{}}},", row.join(", ")));
    }
    w.close("};");
    w.blank();

    w.open("int main(void) {");
    w.open(&format!("for (int i = 0; i < {}; i++) {{", vectors.len()));
    match source.family {
        ModelFamily::Linear => {
            w.line("printf(\"%.9g\\n\", (double)predict(vectors[i]));");
        }
        ModelFamily::Logistic => {
            w.line("float p = sigmoid(decision_function(vectors[i]));");
            w.line("printf(\"%.9g %d\\n\", (double)p, predict(vectors[i]));");
        }
        ModelFamily::Tree => {
            w.line("printf(\"%d\\n\", predict(vectors[i]));");
        }
    }
    w.close("}");
    w.line("return 0;");
    w.close("}");
    Ok(w.finish())
}

/// Parse driver stdout into one prediction per vector.
pub fn parse_output(family: ModelFamily, stdout: &str, expected: usize) -> Result<Vec<Prediction>> {
    let lines: Vec<&str> = stdout.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() != expected {
        return Err(bad_output(format!(
            "driver printed {} results for {} vectors",
            lines.len(),
            expected
        )));
    }
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| parse_line(family, line).map_err(|reason| {
            bad_output(format!("line {}: {} ({:?})", i + 1, reason, line))
        }))
        .collect()
}

fn parse_line(family: ModelFamily, line: &str) -> std::result::Result<Prediction, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    match (family, fields.as_slice()) {
        (ModelFamily::Linear, [value]) => Ok(Prediction::Value {
            value: parse_float(value)?,
        }),
        (ModelFamily::Logistic, [p, class]) => {
            let class = parse_class(class)?;
            if class != 0 && class != 1 {
                return Err(format!("class {} is not binary", class));
            }
            Ok(Prediction::Class {
                class,
                probability: Some(parse_float(p)?),
            })
        }
        (ModelFamily::Tree, [class]) => Ok(Prediction::Class {
            class: parse_class(class)?,
            probability: None,
        }),
        _ => Err("unexpected number of fields".to_string()),
    }
}

/// `%g` spells non-finite values as `nan`/`inf`, which Rust also accepts.
fn parse_float(text: &str) -> std::result::Result<f64, String> {
    text.parse::<f64>()
        .map_err(|_| format!("'{}' is not a number", text))
}

fn parse_class(text: &str) -> std::result::Result<i64, String> {
    text.parse::<i64>()
        .map_err(|_| format!("'{}' is not a class index", text))
}

fn bad_output(reason: String) -> Error {
    Error::ExecuteFailure {
        reason,
        stderr: String::new(),
    }
}
