//! # Schema Documentation
//!
//! Plain-text rendering of schemas for CLI help and generated reference
//! pages. [`Schema::summary`] is a one-line description used in error
//! messages; [`Schema::render_doc`] is the full block, with one entry per
//! struct field.

use std::fmt::Write;

use serde_json::Value;

use schemata_core::{DefaultVal, Special};

use crate::schema::{Schema, SchemaKind};

fn list(values: &[Value]) -> String {
    values
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Schema {
    /// One-line description, e.g. `int (min: 1, one of: 1, 2, 3)`.
    pub fn summary(&self) -> String {
        let base = match self.kind() {
            SchemaKind::Seq(c) => format!("seq of {}", c.item.summary()),
            SchemaKind::Map(c) => format!("map of {}", c.item.summary()),
            SchemaKind::Union(members) => format!(
                "union of ({})",
                members
                    .iter()
                    .map(Schema::summary)
                    .collect::<Vec<_>>()
                    .join(" | ")
            ),
            SchemaKind::Struct(def) => match &def.tag {
                Some(tag) => format!("struct `{}` [{}: {tag}]", def.name, def.tag_key),
                None => format!("struct `{}`", def.name),
            },
            SchemaKind::Declared(d) => format!("declared `{}`", d.tag()),
            other => other.family().to_string(),
        };
        let qualifiers = self.qualifiers();
        if qualifiers.is_empty() {
            base
        } else {
            format!("{base} ({})", qualifiers.join(", "))
        }
    }

    fn qualifiers(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(min) = self.min() {
            out.push(format!("min: {min}"));
        }
        if let Some(max) = self.max() {
            out.push(format!("max: {max}"));
        }
        if let Some(n) = self.min_len() {
            out.push(format!("min_len: {n}"));
        }
        if let Some(n) = self.max_len() {
            out.push(format!("max_len: {n}"));
        }
        if let SchemaKind::Str(opts) = self.kind() {
            if let Some(p) = &opts.pattern {
                out.push(format!("pattern: {}", p.as_str()));
            }
            if opts.strip {
                out.push("strip".to_string());
            }
            if let Some(case) = opts.char_case {
                out.push(format!("case: {case:?}").to_lowercase());
            }
        }
        if let Some(r) = self.restricted() {
            out.push(format!("one of: {}", list(r)));
        }
        match self.default_val() {
            DefaultVal::Special(Special::Required) => {}
            DefaultVal::Special(s) => out.push(s.to_string()),
            DefaultVal::Value(_) => {
                if let Some(v) = self.default_value() {
                    out.push(format!("default: {v}"));
                }
            }
        }
        if let Some(class) = self.evaluated() {
            let names: Vec<String> = class
                .names()
                .map(|n| format!("{}{n}", class.marker()))
                .collect();
            out.push(format!("evaluated: {}", names.join(" ")));
        }
        out
    }

    /// Multi-line documentation: the summary, the doc text, and for a
    /// struct its tagging and one indented entry per field.
    pub fn render_doc(&self) -> String {
        let mut out = String::new();
        match self.kind() {
            SchemaKind::Struct(def) => {
                let _ = writeln!(out, "{}", def.name);
                if !self.doc().is_empty() {
                    let _ = writeln!(out, "{}", self.doc().trim_end());
                }
                if let Some(tag) = &def.tag {
                    let _ = writeln!(out, "tag: {tag} (tag_key: {})", def.tag_key);
                }
                if let Some(proxy) = &def.proxy {
                    let _ = writeln!(out, "proxy: {proxy}");
                }
                if def.open {
                    let _ = writeln!(out, "open: unknown keys are kept");
                }
                let quals = self.qualifiers();
                if !quals.is_empty() {
                    let _ = writeln!(out, "{}", quals.join(", "));
                }
                if !def.fields.is_empty() {
                    let _ = writeln!(out, "fields:");
                }
                for (name, field) in &def.fields {
                    let _ = writeln!(out, "  {name}: {}", field.summary());
                    for line in field.doc().lines() {
                        let _ = writeln!(out, "      {line}");
                    }
                }
            }
            _ => {
                let _ = writeln!(out, "{}", self.summary());
                if !self.doc().is_empty() {
                    let _ = writeln!(out, "{}", self.doc().trim_end());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::prim::{IntPrim, SeqPrim, StrPrim};
    use crate::structure::StructSchema;
    use schemata_eval::EvaluatedClass;

    #[test]
    fn summary_lists_constraints() {
        let s = IntPrim::new()
            .min(1)
            .restricted([1, 2])
            .default_val(2)
            .build()
            .unwrap();
        assert_eq!(s.summary(), "int (min: 1, one of: 1, 2, default: 2)");
        let seq = SeqPrim::new(StrPrim::new().build().unwrap())
            .optional()
            .build()
            .unwrap();
        assert_eq!(seq.summary(), "seq of str (optional)");
    }

    #[test]
    fn summary_names_evaluators() {
        let s = IntPrim::new()
            .evaluated(EvaluatedClass::standard())
            .build()
            .unwrap();
        assert_eq!(s.summary(), "int (evaluated: $expr $tmpl)");
    }

    #[test]
    fn struct_doc_lists_fields() {
        let s = StructSchema::builder("Job")
            .doc("A unit of work.")
            .tag("job")
            .tag_key("kind")
            .field(
                "threads",
                IntPrim::new()
                    .min(1)
                    .default_val(1)
                    .doc("Worker threads.")
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        let doc = s.render_doc();
        assert!(doc.starts_with("Job\nA unit of work.\n"));
        assert!(doc.contains("tag: job (tag_key: kind)"));
        assert!(doc.contains("  threads: int (min: 1, default: 1)"));
        assert!(doc.contains("      Worker threads."));
    }
}
