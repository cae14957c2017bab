use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;

use py_entities::{ExtractorConfig, File, FileOutcome, ProjectExtractor, SymbolRef};

#[derive(Parser)]
#[command(name = "py-entities")]
#[command(about = "Extract files, classes, functions, calls and imports from Python sources")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Extract every Python file under the current directory
    py-entities extract

    # Extract one file, resolving imports against a project root
    py-entities extract app/service.py --root . --pretty

    # Show resolved and unresolved imports of a file
    py-entities imports app/service.py

    # List top-level functions and classes
    py-entities symbols app/service.py --name Service

    # Summary counts for a project
    py-entities stats ./src
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a py-entities.toml (defaults to the one in the source root)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract the entity graph of a file or directory as JSON
    Extract {
        /// File or directory to extract
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Source root used for import resolution
        #[arg(long)]
        root: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Show the import records of a file
    Imports {
        file: PathBuf,

        /// Source root used for import resolution
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// List top-level functions and classes of a file
    Symbols {
        file: PathBuf,

        /// Only show these names (repeatable)
        #[arg(long)]
        name: Vec<String>,
    },

    /// Show extraction statistics for a file or directory
    Stats {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

/// Directory imports are resolved against: `--root`, the directory itself,
/// or the parent of a single file.
fn source_root(path: &Path, root: Option<&Path>) -> PathBuf {
    match root {
        Some(root) => root.to_path_buf(),
        None if path.is_dir() => path.to_path_buf(),
        None => path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

fn load_config(config: Option<&Path>, root: &Path) -> anyhow::Result<ExtractorConfig> {
    let config = match config {
        Some(path) => ExtractorConfig::load(path)?,
        None => ExtractorConfig::discover(root)?,
    };
    Ok(config)
}

fn project(path: &Path, root: Option<&Path>, config: Option<&Path>) -> anyhow::Result<ProjectExtractor> {
    let root = source_root(path, root);
    let config = load_config(config, &root)?;
    Ok(ProjectExtractor::new(root, config))
}

/// Outcomes for `path`: every file under a directory, or the single file.
fn extract_outcomes(project: &ProjectExtractor, path: &Path) -> anyhow::Result<Vec<FileOutcome>> {
    if path.is_dir() {
        Ok(project.extract_dir(path)?)
    } else {
        Ok(project.extract_files(&[path.to_path_buf()]))
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

pub fn extract(path: &Path, root: Option<&Path>, config: Option<&Path>, pretty: bool) -> anyhow::Result<()> {
    let project = project(path, root, config)?;

    if !path.is_dir() {
        return print_json(&project.extract_file(path)?, pretty);
    }

    let files: Vec<File> = project
        .extract_dir(path)?
        .into_iter()
        .filter_map(|outcome| outcome.result.ok())
        .collect();
    print_json(&files, pretty)?;

    let errors = project.progress().snapshot().errors;
    if errors > 0 {
        eprintln!("{} file(s) could not be extracted", errors);
    }
    Ok(())
}

pub fn imports(file: &Path, root: Option<&Path>, config: Option<&Path>) -> anyhow::Result<()> {
    let project = project(file, root, config)?;
    let extracted = project.extract_file(file)?;
    print_json(&extracted.imports, true)
}

pub fn symbols(file: &Path, names: &[String], config: Option<&Path>) -> anyhow::Result<()> {
    let project = project(file, None, config)?;
    let extracted = project.extract_file(file)?;

    let filter: Vec<&str> = names.iter().map(String::as_str).collect();
    let symbols = if filter.is_empty() {
        extracted.all_symbols()
    } else {
        extracted.symbols(Some(filter.as_slice())).into_values().collect()
    };

    if symbols.is_empty() {
        println!("No symbols found");
        return Ok(());
    }

    for symbol in symbols {
        match symbol {
            SymbolRef::Function(f) => {
                println!("function {}({}) at line {}", f.name, f.inputs.join(", "), f.line);
            }
            SymbolRef::Class(c) => {
                println!("class {} at line {}", c.name, c.line);
                if !c.superclasses.is_empty() {
                    println!("  bases: {}", c.superclasses.join(", "));
                }
                if !c.attributes.is_empty() {
                    println!("  attributes: {}", c.attributes.join(", "));
                }
                for method in &c.methods {
                    println!("  method {}({}) at line {}", method.name, method.inputs.join(", "), method.line);
                }
            }
        }
    }
    Ok(())
}

pub fn stats(path: &Path, config: Option<&Path>) -> anyhow::Result<()> {
    let project = project(path, None, config)?;
    let files: Vec<File> = extract_outcomes(&project, path)?
        .into_iter()
        .filter_map(|outcome| outcome.result.ok())
        .collect();
    let progress = project.progress().snapshot();

    let functions: usize = files.iter().map(|f| f.functions.len()).sum();
    let classes: usize = files.iter().map(|f| f.classes.len()).sum();
    let methods: usize = files
        .iter()
        .flat_map(|f| f.classes.iter())
        .map(|c| c.methods.len())
        .sum();
    let (resolved, unresolved) = files
        .iter()
        .flat_map(|f| f.imports.iter())
        .fold((0, 0), |(r, u), i| if i.is_resolved() { (r + 1, u) } else { (r, u + 1) });
    let gaps: usize = files.iter().map(|f| f.gaps.len()).sum();

    println!("Extraction Statistics:");
    println!("  Files extracted: {}", progress.files_processed - progress.errors);
    println!("  Files failed: {}", progress.errors);
    println!("  Functions: {}", functions);
    println!("  Classes: {} ({} methods)", classes, methods);
    println!("  Entities: {}", progress.entities_extracted);
    println!("  Imports: {} resolved, {} unresolved", resolved, unresolved);
    if gaps > 0 {
        println!("  Coverage gaps: {}", gaps);
    }
    println!("  Elapsed: {} ms", progress.elapsed_ms);

    Ok(())
}
