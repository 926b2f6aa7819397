//! md2tex: CLI tool to convert Markdown to LaTeX

mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use config::{CONFIG_FILE_NAME, Config};
use md2tex_core::{
    Document, Token, WriterOptions, document_from_json, document_to_latex, lex, parse,
    tokens_from_json,
};

#[derive(Parser, Debug)]
#[command(name = "md2tex")]
#[command(about = "Convert Markdown to LaTeX")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
#[command(after_help = "Examples:
  md2tex notes.md                   # Convert single file to notes.tex
  md2tex notes.md -o out.tex        # Convert to specific output file
  cat notes.md | md2tex             # Read stdin, write stdout
  md2tex docs/ -o build/ -r -j4     # Convert a directory tree with 4 jobs
  md2tex notes.md --emit tokens     # Dump the token stream as JSON
  md2tex init                       # Write a sample _md2tex.toml")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    convert: ConvertArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a sample configuration file
    Init(InitArgs),
}

#[derive(Args, Debug)]
struct InitArgs {
    /// Output path (defaults to _md2tex.toml in the current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the JSON schema of the configuration instead
    #[arg(long)]
    schema: bool,

    /// Overwrite an existing file
    #[arg(short, long)]
    force: bool,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Input file or directory ("-" or absent reads stdin)
    input: Option<PathBuf>,

    /// Output file or directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of parallel jobs (defaults to number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Process directories recursively
    #[arg(short, long)]
    recursive: bool,

    /// Input format
    #[arg(long, value_enum, default_value_t = InputFormat::Markdown)]
    from: InputFormat,

    /// Output format
    #[arg(long, value_enum, default_value_t = EmitFormat::Latex)]
    emit: EmitFormat,

    /// Wrap the output in a complete LaTeX document
    #[arg(long)]
    standalone: bool,

    /// Fail on nodes that have no LaTeX rendering
    #[arg(long)]
    strict: bool,

    /// Configuration file (defaults to _md2tex.toml next to the input)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only show errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    /// Markdown source
    Markdown,
    /// JSON token stream
    Tokens,
    /// JSON document
    Ast,
}

impl InputFormat {
    fn extensions(self) -> &'static [&'static str] {
        match self {
            InputFormat::Markdown => &["md", "markdown"],
            InputFormat::Tokens | InputFormat::Ast => &["json"],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EmitFormat {
    /// LaTeX markup
    Latex,
    /// JSON token stream
    Tokens,
    /// JSON document
    Ast,
}

impl EmitFormat {
    /// Default output extension, kept apart from the JSON input extension
    fn extension(self) -> &'static str {
        match self {
            EmitFormat::Latex => "tex",
            EmitFormat::Tokens => "tokens.json",
            EmitFormat::Ast => "ast.json",
        }
    }
}

/// Everything a single conversion needs, shared across worker threads
#[derive(Debug, Clone)]
struct Settings {
    from: InputFormat,
    emit: EmitFormat,
    writer: WriterOptions,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Init(args)) => init(&args),
        None => run(&cli.convert),
    }
}

fn run(args: &ConvertArgs) -> Result<()> {
    let input = args.input.as_deref().filter(|p| *p != Path::new("-"));

    let config = load_config(args, input)?;
    let settings = Settings {
        from: args.from,
        emit: args.emit,
        writer: config.writer_options(args.standalone, args.strict),
    };

    match input {
        None => convert_stdin(args.output.as_deref(), &settings, args.verbose),
        Some(path) if path.is_file() => convert_file(path, args.output.as_deref(), &settings, args),
        Some(path) if path.is_dir() => convert_directory(path, &settings, args),
        Some(path) => anyhow::bail!("Input path does not exist: {}", path.display()),
    }
}

/// Resolve the configuration: `--config` wins, then `_md2tex.toml` beside the input
fn load_config(args: &ConvertArgs, input: Option<&Path>) -> Result<Config> {
    if let Some(path) = &args.config {
        if args.verbose {
            eprintln!("Using config: {}", path.display());
        }
        return Config::load(path);
    }

    let dir = match input {
        Some(path) if path.is_dir() => path.to_path_buf(),
        Some(path) => path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
        None => PathBuf::from("."),
    };

    match Config::load_from_dir(&dir)? {
        Some(config) => {
            if args.verbose {
                eprintln!("Using config: {}", dir.join(CONFIG_FILE_NAME).display());
            }
            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

/// Convert standard input, writing to stdout unless an output file is given
fn convert_stdin(output: Option<&Path>, settings: &Settings, verbose: bool) -> Result<()> {
    let mut source = String::new();
    io::stdin()
        .read_to_string(&mut source)
        .context("Failed to read stdin")?;

    if verbose {
        eprintln!("Converting: <stdin> ({} bytes)", source.len());
    }

    let converted = convert_source(&source, settings)?;

    match output {
        Some(path) => write_output(path, &converted),
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(converted.as_bytes())
                .context("Failed to write stdout")?;
            Ok(())
        }
    }
}

/// Convert a single file
fn convert_file(
    input: &Path,
    output: Option<&Path>,
    settings: &Settings,
    args: &ConvertArgs,
) -> Result<()> {
    let output_path = match output {
        Some(p) => p.to_path_buf(),
        None => input.with_extension(settings.emit.extension()),
    };

    if args.verbose {
        eprintln!(
            "Converting: {} -> {}",
            input.display(),
            output_path.display()
        );
    }

    convert_file_inner(input, &output_path, settings)?;

    if !args.quiet {
        println!("{}", output_path.display());
    }

    Ok(())
}

/// Convert every matching file of a directory
fn convert_directory(input: &Path, settings: &Settings, args: &ConvertArgs) -> Result<()> {
    let output_dir = args.output.as_deref().unwrap_or(input);
    let extensions = settings.from.extensions();

    let files = collect_input_files(input, extensions, args.recursive)?;

    if files.is_empty() {
        if !args.quiet {
            eprintln!(
                "No .{} files found in {}",
                extensions.join("/."),
                input.display()
            );
        }
        return Ok(());
    }

    if args.verbose {
        eprintln!("Found {} input files", files.len());
    }

    if let Some(n) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let success = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    let errors: Vec<_> = files
        .par_iter()
        .filter_map(|file| {
            let relative = file.strip_prefix(input).unwrap_or(file);
            let output_file = output_dir
                .join(relative)
                .with_extension(settings.emit.extension());

            if args.verbose {
                eprintln!("Converting: {} -> {}", file.display(), output_file.display());
            }

            match convert_file_inner(file, &output_file, settings) {
                Ok(()) => {
                    success.fetch_add(1, Ordering::Relaxed);
                    if !args.quiet {
                        println!("{}", output_file.display());
                    }
                    None
                }
                Err(e) => {
                    failed.fetch_add(1, Ordering::Relaxed);
                    Some((file.clone(), e))
                }
            }
        })
        .collect();

    for (file, e) in &errors {
        eprintln!("Error converting {}: {:#}", file.display(), e);
    }

    let success_count = success.load(Ordering::Relaxed);
    let failed_count = failed.load(Ordering::Relaxed);

    if !args.quiet {
        eprintln!("Converted {} files, {} failed", success_count, failed_count);
    }

    if failed_count > 0 {
        anyhow::bail!("{} files failed to convert", failed_count);
    }

    Ok(())
}

/// Read, convert and write one file without reporting (for parallel use)
fn convert_file_inner(input: &Path, output: &Path, settings: &Settings) -> Result<()> {
    if is_same_file(input, output) {
        anyhow::bail!(
            "Refusing to overwrite input file: {} (choose another output with -o)",
            input.display()
        );
    }

    let source = fs::read_to_string(input)
        .with_context(|| format!("Failed to read: {}", input.display()))?;

    let converted = convert_source(&source, settings)
        .with_context(|| format!("Failed to convert: {}", input.display()))?;

    write_output(output, &converted)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content).with_context(|| format!("Failed to write: {}", path.display()))
}

/// Collect input files with one of the given extensions
fn collect_input_files(dir: &Path, extensions: &[&str], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() {
            let matches = path.extension().is_some_and(|ext| {
                extensions.iter().any(|wanted| ext.eq_ignore_ascii_case(wanted))
            });
            if matches {
                files.push(path);
            }
        } else if path.is_dir() && recursive {
            files.extend(collect_input_files(&path, extensions, recursive)?);
        }
    }

    files.sort();
    Ok(files)
}

/// Run the pipeline on one source text, stopping at the requested stage
fn convert_source(source: &str, settings: &Settings) -> Result<String> {
    if settings.emit == EmitFormat::Tokens {
        let tokens = read_tokens(source, settings.from)?;
        return to_json(&tokens);
    }

    let doc: Document = match settings.from {
        InputFormat::Ast => document_from_json(source)?,
        from => parse(read_tokens(source, from)?)?,
    };

    if settings.emit == EmitFormat::Ast {
        return to_json(&doc);
    }

    let mut latex = document_to_latex(&doc, &settings.writer)?;
    if !latex.is_empty() && !latex.ends_with('\n') {
        latex.push('\n');
    }
    Ok(latex)
}

fn read_tokens(source: &str, from: InputFormat) -> Result<Vec<Token>> {
    match from {
        InputFormat::Markdown => Ok(lex(source)),
        InputFormat::Tokens => Ok(tokens_from_json(source)?),
        InputFormat::Ast => anyhow::bail!("Cannot emit tokens from an AST input"),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    Ok(json + "\n")
}

/// Write a sample configuration file or the configuration schema
fn init(args: &InitArgs) -> Result<()> {
    let (content, default_name) = if args.schema {
        (Config::json_schema_string()? + "\n", "md2tex.schema.json")
    } else {
        (Config::sample().to_toml_with_schema()?, CONFIG_FILE_NAME)
    };

    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_name));

    if path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    write_output(&path, &content)?;
    println!("{}", path.display());

    Ok(())
}
