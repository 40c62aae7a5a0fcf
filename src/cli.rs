//! CLI: resolve documents against a built-in union, or check they round-trip.
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::Value;

use json_union::path_de::{self, Reader};
use json_union::{EmptyObject, SingularOrPlural, StringOrInteger, Union, union};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// decode JSON documents through oneOf/anyOf/allOf unions and inspect the result
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print the populated branch and canonical encoding of each document
    Resolve(ResolveOut),
    /// check that decode → encode → decode is stable for each document
    Roundtrip(RoundtripOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum UnionKind {
    StringOrInteger,
    SingularOrPlural,
    EmptyObject,
}

#[derive(clap::Parser, Debug)]
struct ResolveOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// union every document is decoded as
    #[arg(long, value_enum)]
    union: UnionKind,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct RoundtripOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// union every document is decoded as
    #[arg(long, value_enum)]
    union: UnionKind,
}

/// One JSON value to decode, labelled with where it came from.
struct Document {
    origin: String,
    value: Value,
}

/// Empty fields mean the document resolved to nothing.
#[derive(Default)]
struct Resolution {
    branches: Vec<&'static str>,
    encoded: Option<Value>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut documents = Vec::new();
        for source_path in source_paths {
            let origin = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {origin}"))?;
            if self.ndjson {
                let lines = source.lines().enumerate();
                for (index, line) in lines.filter(|(_, line)| !line.trim().is_empty()) {
                    let origin = format!("{origin}:{}", index + 1);
                    let value = serde_json::from_str(line)
                        .with_context(|| format!("failed to parse JSON line ({origin})"))?;
                    self.select(origin, value, &mut documents)?;
                }
            } else {
                let value = serde_json::from_str(&source)
                    .with_context(|| format!("failed to parse JSON source file ({origin})"))?;
                self.select(origin, value, &mut documents)?;
            }
        }
        log::info!("loaded {} documents", documents.len());
        Ok(documents)
    }

    /// Applies the pointer, then the jq filter, to one parsed document.
    fn select(&self, origin: String, value: Value, documents: &mut Vec<Document>) -> Result<()> {
        let value = match self.json_pointer.as_deref() {
            None => value,
            Some(pointer) => match value.pointer(pointer) {
                Some(selected) => selected.clone(),
                None => bail!("JSON pointer {pointer} selects nothing in {origin}"),
            },
        };
        match self.jq_expr.as_deref() {
            None => documents.push(Document { origin, value }),
            Some(jq_expr) => {
                let outputs = crate::jq_exec::apply_filter(jq_expr, &value)
                    .with_context(|| format!("failed to apply jq expression to {origin}"))?;
                for (index, value) in outputs.into_iter().enumerate() {
                    documents.push(Document { origin: format!("{origin}#{index}"), value });
                }
            }
        }
        Ok(())
    }
}

impl UnionKind {
    fn resolve(self, value: &Value) -> json_union::Result<Resolution> {
        match self {
            UnionKind::StringOrInteger => resolve_union::<StringOrInteger>(value),
            UnionKind::SingularOrPlural => resolve_union::<SingularOrPlural<Value>>(value),
            UnionKind::EmptyObject => Ok(resolve_empty_object(value)),
        }
    }

    fn round_trips(self, value: &Value) -> json_union::Result<bool> {
        match self {
            UnionKind::StringOrInteger => round_trips::<StringOrInteger>(value),
            UnionKind::SingularOrPlural => round_trips::<SingularOrPlural<Value>>(value),
            UnionKind::EmptyObject => {
                let once = resolve_empty_object(value).encoded;
                let twice = once.as_ref().and_then(|encoded| resolve_empty_object(encoded).encoded);
                Ok(once == twice)
            }
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Resolve(target) => {
                let documents = target.input_settings.load_documents()?;
                let kind = target.union;
                let lines = documents
                    .par_iter()
                    .map(|doc| {
                        let resolution = kind
                            .resolve(&doc.value)
                            .with_context(|| format!("failed to resolve {}", doc.origin))?;
                        Ok(render(doc, &resolution, target.out.is_none()))
                    })
                    .collect::<Result<Vec<_>>>()?;
                let report = lines.join("\n");
                match target.out.as_ref() {
                    Some(out) => {
                        if let Some(parent) = out.parent() {
                            std::fs::create_dir_all(parent)?;
                        }
                        std::fs::write(out, report + "\n")
                            .with_context(|| format!("failed to write {}", out.display()))?;
                    }
                    None => println!("{report}"),
                }
                Ok(())
            }
            Command::Roundtrip(target) => {
                let documents = target.input_settings.load_documents()?;
                let kind = target.union;
                let failures = documents
                    .par_iter()
                    .map(|doc| {
                        let stable = kind
                            .round_trips(&doc.value)
                            .with_context(|| format!("failed to round-trip {}", doc.origin))?;
                        if !stable {
                            eprintln!("{} {}", "unstable".red().bold(), doc.origin);
                        }
                        Ok(usize::from(!stable))
                    })
                    .sum::<Result<usize>>()?;
                if failures > 0 {
                    bail!("{failures} of {} documents did not round-trip", documents.len());
                }
                println!("{} {} documents round-trip", "ok".green().bold(), documents.len());
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_union<U: Union>(value: &Value) -> json_union::Result<Resolution> {
    let Some(decoded) = union::decode::<U>(value)? else {
        return Ok(Resolution::default());
    };
    let branches = union::populated_branches(&decoded);
    let encoded = if branches.is_empty() {
        None
    } else {
        Some(union::encode(&decoded)?)
    };
    Ok(Resolution { branches, encoded })
}

fn resolve_empty_object(value: &Value) -> Resolution {
    match path_de::from_value_with_path::<EmptyObject>(value, Reader::Strict) {
        Ok(empty) => Resolution {
            branches: vec![std::any::type_name::<EmptyObject>()],
            encoded: serde_json::to_value(empty).ok(),
        },
        Err(err) => {
            log::debug!("not an empty object: {}", path_de::describe(&err));
            Resolution::default()
        }
    }
}

fn round_trips<U: Union + PartialEq>(value: &Value) -> json_union::Result<bool> {
    let once = union::decode::<U>(value)?;
    let twice = match &once {
        Some(decoded) => {
            let reencoded = union::encode(decoded)?;
            union::decode::<U>(&reencoded)?.or_else(|| Some(U::default()))
        }
        None => None,
    };
    Ok(once == twice)
}

fn render(doc: &Document, resolution: &Resolution, colorize: bool) -> String {
    let branches = resolution
        .branches
        .iter()
        .map(|name| short_type_name(name))
        .collect::<Vec<_>>()
        .join(", ");
    match (&resolution.encoded, colorize) {
        (Some(encoded), true) => format!("{} {} {encoded}", doc.origin.dimmed(), branches.green()),
        (Some(encoded), false) => format!("{} {branches} {encoded}", doc.origin),
        (None, true) => format!("{} {}", doc.origin.dimmed(), "unresolved".yellow()),
        (None, false) => format!("{} unresolved", doc.origin),
    }
}

/// `alloc::vec::Vec<serde_json::value::Value>` → `Vec<Value>`
fn short_type_name(name: &str) -> String {
    let mut short = String::with_capacity(name.len());
    let mut segment = String::new();
    for c in name.chars() {
        match c {
            ':' => segment.clear(),
            '<' | '>' | ',' | ' ' => {
                short.push_str(&segment);
                segment.clear();
                short.push(c);
            }
            _ => segment.push(c),
        }
    }
    short.push_str(&segment);
    short
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            let entries = glob::glob(pattern)
                .with_context(|| format!("invalid glob pattern {pattern}"))?;
            for entry in entries {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
