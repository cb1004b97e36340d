//! Thin CLI: compile a schema, then inspect it or load data files through it.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use schema_objects::{Category, SchemaDocument, SchemaObject, TypeRegistry};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile JSON-Schema documents into runtime types and load data through them
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// list compiled types with their categories and constructor signatures
    Inspect(InspectCmd),
    /// load each input as the chosen type and report failures
    Check(CheckCmd),
    /// load each input and write it back out as JSON
    Roundtrip(RoundtripCmd),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// schema document (.json)
    #[arg(long, short)]
    schema: PathBuf,

    /// type to use (defaults to the schema title)
    #[arg(long = "type", short = 't')]
    type_name: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct InspectCmd {
    #[command(flatten)]
    schema_settings: SchemaSettings,
}

#[derive(clap::Parser, Debug)]
struct CheckCmd {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct RoundtripCmd {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// output directory (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

/// Outcome of loading one input file.
struct Loaded {
    path: PathBuf,
    result: Result<SchemaObject>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    fn compile(&self) -> Result<TypeRegistry> {
        let document = SchemaDocument::from_path(&self.schema)
            .with_context(|| format!("failed to load schema {}", self.schema.display()))?;
        document
            .compile()
            .with_context(|| format!("failed to compile schema {}", self.schema.display()))
    }

    fn target<'a>(&'a self, registry: &'a TypeRegistry) -> Result<&'a str> {
        match self.type_name.as_deref().or(registry.root()) {
            Some(name) => Ok(name),
            None => bail!("schema has no title; pass --type"),
        }
    }
}

impl InputSettings {
    /// Load every input as `type_name`, in parallel, preserving input order.
    fn load_all(&self, registry: &TypeRegistry, type_name: &str) -> Result<Vec<Loaded>> {
        let class = registry.class(type_name)?;
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let loaded = source_paths
            .into_par_iter()
            .map(|path| {
                let result = class
                    .from_json_path(&path)
                    .with_context(|| format!("failed to load {} as {type_name}", path.display()));
                Loaded { path, result }
            })
            .collect();
        Ok(loaded)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// `Ok(false)` when at least one input failed.
    pub fn run(&self) -> Result<bool> {
        match &self.cmd {
            Command::Inspect(target) => {
                let registry = target.schema_settings.compile()?;
                match target.schema_settings.type_name.as_deref() {
                    Some(name) => print_entry(&registry, name)?,
                    None => print_listing(&registry),
                }
                Ok(true)
            }
            Command::Check(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(true);
                }
                let registry = target.schema_settings.compile()?;
                let type_name = target.schema_settings.target(&registry)?;
                let loaded = target.input_settings.load_all(&registry, type_name)?;
                Ok(report(&loaded))
            }
            Command::Roundtrip(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(true);
                }
                let registry = target.schema_settings.compile()?;
                let type_name = target.schema_settings.target(&registry)?;
                let loaded = target.input_settings.load_all(&registry, type_name)?;
                let all_loaded = report(&loaded);
                if let Some(out) = target.out.as_ref() {
                    std::fs::create_dir_all(out)
                        .with_context(|| format!("failed to create {}", out.display()))?;
                }
                for Loaded { path, result } in &loaded {
                    let Ok(object) = result else { continue };
                    match target.out.as_ref() {
                        Some(out) => {
                            let out_path = output_path(out, path)?;
                            object
                                .to_json_path(&out_path)
                                .with_context(|| format!("failed to write {}", out_path.display()))?;
                        }
                        None => println!("{}", object.to_json_string()?),
                    }
                }
                Ok(all_loaded)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn print_listing(registry: &TypeRegistry) {
    for entry in registry.entries() {
        let line = format!("{:<40} {:<18} {}", entry.name, entry.category.to_string(), entry.handle);
        if Some(entry.name.as_str()) == registry.root() {
            println!("{}", line.bold());
        } else {
            println!("{line}");
        }
    }
}

fn print_entry(registry: &TypeRegistry, name: &str) -> Result<()> {
    let entry = registry.entry(name)?;
    println!("{} ({})", entry.name.bold(), entry.category);
    println!("  type: {}", entry.handle);
    println!("  caster: {}", entry.caster);
    let composite_like = matches!(
        entry.category,
        Category::Custom | Category::Passthrough | Category::MultiInheritance
    );
    if composite_like {
        if let Ok(class) = registry.class(name) {
            println!("  {}", class.signature());
        }
    }
    let definition = serde_json::to_string_pretty(&entry.definition.to_value())?;
    println!("{definition}");
    Ok(())
}

fn report(loaded: &[Loaded]) -> bool {
    let mut failures = 0;
    for Loaded { path, result } in loaded {
        match result {
            Ok(object) => eprintln!("{} {} {}", "✅".green(), path.display(), object.type_name().dimmed()),
            Err(error) => {
                failures += 1;
                eprintln!("{} {}: {error:#}", "❌".red(), path.display());
            }
        }
    }
    eprintln!("{} of {} inputs loaded", loaded.len() - failures, loaded.len());
    failures == 0
}

fn output_path(out_dir: &Path, source: &Path) -> Result<PathBuf> {
    let file_name = source
        .file_name()
        .ok_or_else(|| anyhow!("input {} has no file name", source.display()))?;
    Ok(out_dir.join(file_name))
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
            for entry in glob::glob(pattern)? {
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
