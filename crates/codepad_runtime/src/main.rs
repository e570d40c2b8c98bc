//! Codepad Runtime
//!
//! Command-line front end: runs programs, assembles previews and watches
//! markup files for live re-rendering.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use codepad_core::{
    default_buffers, BufferRole, EngineConfig, LanguageId, PreviewViewport, RenderableDocument,
    SourceBuffers,
};
use codepad_engine::{Engine, ExecutionResult, PreviewTarget};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, SystemTime};
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser)]
#[command(name = "codepad", author, version, about, long_about = None)]
struct Cli {
    /// Engine settings (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    /// Log engine activity to stderr
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program file and print its console output
    Run {
        file: PathBuf,
        /// Language identifier; inferred from the extension when omitted
        #[arg(long)]
        language: Option<String>,
    },
    /// Assemble a markup document with its stylesheet and script inlined
    Preview {
        structure: PathBuf,
        #[arg(long)]
        style: Option<PathBuf>,
        #[arg(long)]
        behavior: Option<PathBuf>,
        /// Keep re-rendering as the files change
        #[arg(long)]
        watch: bool,
        /// Wrap the document in a sandboxed frame page (desktop, tablet or mobile)
        #[arg(long)]
        frame: Option<PreviewViewport>,
    },
    /// Print the starter buffers for a language
    Sample { language: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    tracing::debug!("Codepad v{}", codepad_core::VERSION);

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let engine = Engine::new(config)?;

    match cli.command {
        Commands::Run { file, language } => {
            let language = match language {
                Some(name) => name,
                None => infer_language(&file)?.id().to_string(),
            };
            let source = read(&file)?;
            let result = engine.run_declared(&language, &SourceBuffers::program(source));
            report(&result, cli.json)?;
            Ok(exit_code(&result))
        }
        Commands::Preview {
            structure,
            style,
            behavior,
            watch,
            frame,
        } => {
            let files = MarkupFiles {
                structure,
                style,
                behavior,
            };
            if watch {
                watch_markup(&engine, &files, frame).await?;
                return Ok(ExitCode::SUCCESS);
            }
            let result = engine.run(LanguageId::Html, &files.load()?);
            match (&result, frame) {
                (ExecutionResult::Document(document), Some(viewport)) if !cli.json => {
                    println!("{}", page(document, Some(viewport)));
                }
                _ => report(&result, cli.json)?,
            }
            Ok(exit_code(&result))
        }
        Commands::Sample { language } => {
            let language: LanguageId = language.parse()?;
            let buffers = default_buffers(language);
            for buffer in buffers.iter() {
                if buffers.len() > 1 {
                    println!("// {}", buffer.role.file_name());
                }
                println!("{}", buffer.text);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn infer_language(file: &Path) -> Result<LanguageId> {
    let extension = file
        .extension()
        .and_then(|extension| extension.to_str())
        .unwrap_or_default();
    match LanguageId::from_extension(extension) {
        Some(language) => Ok(language),
        None => bail!(
            "cannot infer the language of {}; pass --language",
            file.display()
        ),
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn report(result: &ExecutionResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else if result.is_failure() {
        eprintln!("{}", result.console_text());
    } else {
        println!("{}", result.console_text());
    }
    Ok(())
}

fn exit_code(result: &ExecutionResult) -> ExitCode {
    match result {
        ExecutionResult::Failure(_) | ExecutionResult::Unsupported { .. } => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}

fn page(document: &RenderableDocument, frame: Option<PreviewViewport>) -> String {
    match frame {
        Some(viewport) => document.framed(viewport),
        None => document.markup.clone(),
    }
}

struct MarkupFiles {
    structure: PathBuf,
    style: Option<PathBuf>,
    behavior: Option<PathBuf>,
}

impl MarkupFiles {
    fn paths(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.structure.as_path())
            .chain(self.style.as_deref())
            .chain(self.behavior.as_deref())
    }

    fn load(&self) -> Result<SourceBuffers> {
        let optional = |path: &Option<PathBuf>| match path {
            Some(path) => read(path),
            None => Ok(String::new()),
        };
        Ok(SourceBuffers::new()
            .with(BufferRole::Structure, read(&self.structure)?)
            .with(BufferRole::Style, optional(&self.style)?)
            .with(BufferRole::Behavior, optional(&self.behavior)?))
    }

    fn stamps(&self) -> Vec<Option<SystemTime>> {
        self.paths()
            .map(|path| {
                std::fs::metadata(path)
                    .and_then(|metadata| metadata.modified())
                    .ok()
            })
            .collect()
    }
}

/// Print a document now and again each time the files settle after a change.
async fn watch_markup(
    engine: &Engine,
    files: &MarkupFiles,
    frame: Option<PreviewViewport>,
) -> Result<()> {
    let target = PreviewTarget::new(files.structure.display().to_string());
    let mut updates = engine.subscribe();
    let mut poll = tokio::time::interval(Duration::from_millis(100));
    let mut stamps = files.stamps();

    println!("{}", page(&engine.preview_now(&files.load()?), frame));
    tracing::info!(preview = %target, "watching for changes");

    loop {
        tokio::select! {
            _ = poll.tick() => {
                let current = files.stamps();
                if current != stamps {
                    stamps = current;
                    match files.load() {
                        Ok(buffers) => {
                            engine.on_edit(&target, &buffers);
                        }
                        Err(error) => tracing::warn!("{error:#}"),
                    }
                }
            }
            update = updates.recv() => match update {
                Ok(update) if update.target == target => println!("{}", page(&update.document, frame)),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => tracing::warn!(skipped, "preview updates dropped"),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                engine.cancel_all(&target);
                break;
            }
        }
    }

    Ok(())
}
