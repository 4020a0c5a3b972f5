//! Command-line front end for lesson content.
//!
//! # Responsibility
//! - Render and normalize lesson JSON without a host editor.
//! - Import and list lessons in the configured store.
//! - Keep stdout limited to command output; diagnostics go to the log.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lessonkit_core::{
    core_version, init_logging_from_config, open_store, resolve_video, AllowlistSanitizer,
    CoreConfig, EditorSession, Lesson, LessonListQuery, LessonRepository, RenderContext,
    Renderer, SqliteLessonRepository,
};
use log::info;

#[derive(Parser)]
#[clap(name = "lessonkit", version)]
struct Opts {
    /// JSON config file; defaults apply when omitted.
    #[clap(short, long, env = "LESSONKIT_CONFIG")]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a lesson JSON file to HTML (`-` reads stdin).
    Render {
        input: PathBuf,
        #[clap(long, value_enum)]
        context: Option<ContextArg>,
        /// Emit code blocks as escaped source only.
        #[clap(long)]
        no_highlight: bool,
    },
    /// Print a lesson with repaired block ids and positions.
    Normalize { input: PathBuf },
    /// Store a lesson JSON file in the configured store.
    Import { input: PathBuf },
    /// List lessons in the configured store.
    List {
        #[clap(long)]
        published: bool,
        #[clap(long)]
        limit: Option<u32>,
    },
    /// Print the embed or direct URL for a video link.
    ResolveVideo { url: String },
    /// Print the core version.
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum ContextArg {
    Published,
    Editor,
}

impl From<ContextArg> for RenderContext {
    fn from(value: ContextArg) -> Self {
        match value {
            ContextArg::Published => RenderContext::Published,
            ContextArg::Editor => RenderContext::Editor,
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<CoreConfig> {
    match path {
        Some(path) => CoreConfig::from_file(path)
            .with_context(|| format!("load config from {}", path.display())),
        None => Ok(CoreConfig::default()),
    }
}

fn read_lesson(input: &Path) -> Result<Lesson> {
    let raw = if input == Path::new("-") {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("read lesson from stdin")?;
        raw
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("read lesson from {}", input.display()))?
    };
    serde_json::from_str(&raw).with_context(|| format!("parse lesson {}", input.display()))
}

fn run(opts: Opts) -> Result<()> {
    let config = load_config(opts.config.as_deref())?;
    if config.logging.dir.is_some() {
        init_logging_from_config(&config.logging).context("initialize logging")?;
    }

    match opts.command {
        Command::Render {
            input,
            context,
            no_highlight,
        } => {
            let lesson = read_lesson(&input)?;
            let mut options = config.render_options();
            if let Some(context) = context {
                options.context = context.into();
            }
            if no_highlight {
                options.highlight_code = false;
            }
            let renderer = Renderer::new(AllowlistSanitizer::default(), options);
            println!("{}", renderer.render_lesson(&lesson));
            info!(
                "event=cli_render module=cli status=ok lesson_id={} block_count={}",
                lesson.id,
                lesson.content_blocks.len()
            );
        }
        Command::Normalize { input } => {
            let lesson = EditorSession::new(read_lesson(&input)?)
                .with_config(&config.editor)
                .into_lesson();
            let json = serde_json::to_string_pretty(&lesson).context("encode lesson")?;
            println!("{json}");
        }
        Command::Import { input } => {
            if config.store.path.is_none() {
                anyhow::bail!("import needs `store.path` in the config");
            }
            let lesson = EditorSession::new(read_lesson(&input)?)
                .with_config(&config.editor)
                .into_lesson();
            let conn = open_store(&config.store).context("open lesson store")?;
            let repo = SqliteLessonRepository::new(&conn);
            let id = if repo.get_lesson(lesson.id)?.is_some() {
                repo.save_lesson(&lesson)?;
                lesson.id
            } else {
                repo.create_lesson(&lesson)?
            };
            println!("{id}");
        }
        Command::List { published, limit } => {
            let conn = open_store(&config.store).context("open lesson store")?;
            let repo = SqliteLessonRepository::new(&conn);
            let query = LessonListQuery {
                published_only: published,
                limit,
                offset: 0,
            };
            for lesson in repo.list_lessons(&query)? {
                let state = if lesson.is_published {
                    "published"
                } else {
                    "draft"
                };
                println!(
                    "{}\t{}\t{} block(s)\t{}",
                    lesson.id,
                    state,
                    lesson.content_blocks.len(),
                    lesson.title
                );
            }
        }
        Command::ResolveVideo { url } => {
            let resolved = resolve_video(&url);
            match resolved.provider() {
                Some(provider) => println!("{} {}", provider, resolved.url()),
                None => println!("direct {}", resolved.url()),
            }
        }
        Command::Version => {
            println!("lessonkit_core version={}", core_version());
        }
    }
    Ok(())
}

fn main() {
    let opts = Opts::parse();
    if let Err(err) = run(opts) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
