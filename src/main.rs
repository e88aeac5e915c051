use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use tracing::info;

use verbscope::compositor::{frame_digest, write_png};
use verbscope::content::ContentLibrary;
use verbscope::glyphs::GlyphCache;
use verbscope::host::RecordingHost;
use verbscope::logging;
use verbscope::params::{load_param_overrides, ParamOverride, Params};
use verbscope::scheduler::{Clock, FrameClock};
use verbscope::script::Script;
use verbscope::session::{Session, SessionOptions, DEFAULT_VIEW_H, DEFAULT_VIEW_W};
use verbscope::theme::{Theme, ThemeMode};

/// Frames simulated past the last script step when `--frames` is omitted.
const SCRIPT_TAIL_MS: u64 = 1_000;
const DEFAULT_FRAMES: u64 = 600;

#[derive(Debug, Parser)]
#[command(name = "verbscope")]
#[command(about = "Pseudo-3D CRT terminal animation engine")]
#[command(version = env!("VERBSCOPE_BUILD_VERSION"))]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate and summarise a content library.
    Check {
        #[arg(long)]
        library: PathBuf,
    },
    /// Drive a session headlessly and print its state transitions.
    Run {
        #[command(flatten)]
        session: SessionArgs,
        /// Print transitions as JSON lines.
        #[arg(long)]
        trace_json: bool,
    },
    /// Like `run`, but rasterise frames to PNG files.
    Render {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(short = 'o', long = "out")]
        out: PathBuf,
        /// Write every Nth frame.
        #[arg(long, default_value_t = 1)]
        every: u64,
    },
    /// Print the resolved parameter store.
    Params {
        #[command(flatten)]
        params: ParamArgs,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Args)]
struct ParamArgs {
    /// YAML or JSON file of parameter overrides.
    #[arg(long = "params")]
    params_file: Option<PathBuf>,
    /// Single override, e.g. `--set bloom_strength=1.2`. Repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,
    #[arg(long, default_value = "dark")]
    theme: ThemeMode,
}

#[derive(Debug, Args)]
struct SessionArgs {
    #[arg(long)]
    library: PathBuf,
    /// Input script (YAML or JSON).
    #[arg(long)]
    script: Option<PathBuf>,
    /// Number of frames to simulate.
    #[arg(long)]
    frames: Option<u64>,
    #[arg(long, default_value_t = 60.0)]
    fps: f64,
    #[arg(long, default_value = "en")]
    lang: String,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, default_value_t = DEFAULT_VIEW_W)]
    width: u32,
    #[arg(long, default_value_t = DEFAULT_VIEW_H)]
    height: u32,
    /// Force the compact (mobile) layout.
    #[arg(long)]
    mobile: bool,
    /// TrueType/OpenType face for text; the built-in block face otherwise.
    #[arg(long)]
    font: Option<PathBuf>,
    #[command(flatten)]
    params: ParamArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Check { library } => run_check(&library),
        Commands::Run {
            session,
            trace_json,
        } => run_session(&session, trace_json, None),
        Commands::Render {
            session,
            out,
            every,
        } => {
            if every == 0 {
                bail!("--every must be at least 1");
            }
            run_session(&session, false, Some((&out, every)))
        }
        Commands::Params { params, json } => run_params(&params, json),
    }
}

fn run_check(library_path: &Path) -> Result<()> {
    let library = ContentLibrary::load(library_path)?;
    println!(
        "OK: {} ({} languages, {} sets, {} authors)",
        library_path.display(),
        library.sets.len(),
        library.total_sets(),
        library.authors.len()
    );
    for (lang, sets) in &library.sets {
        let verbs: usize = sets.iter().map(|set| set.verb_count()).sum();
        println!("  {lang}: {} sets, {verbs} verbs", sets.len());
    }
    match library.find_fallback() {
        Some(fallback) => println!("Fallback: {}", fallback.name),
        None => println!("Fallback: none"),
    }
    Ok(())
}

fn run_params(args: &ParamArgs, json: bool) -> Result<()> {
    let params = resolve_params(args)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&params)?);
    } else {
        print!("{}", serde_yaml::to_string(&params)?);
    }
    Ok(())
}

fn resolve_params(args: &ParamArgs) -> Result<Params> {
    let theme = Theme::new(args.theme);
    let mut overrides: BTreeMap<String, Value> = match &args.params_file {
        Some(path) => load_param_overrides(path)?,
        None => BTreeMap::new(),
    };
    for raw in &args.overrides {
        let ParamOverride { key, value } = ParamOverride::parse(raw)?;
        overrides.insert(key, value);
    }
    let params = Params::for_theme(&theme).with_overrides(&overrides)?;
    params.validate()?;
    Ok(params)
}

fn run_session(args: &SessionArgs, trace_json: bool, render: Option<(&Path, u64)>) -> Result<()> {
    if !(args.fps.is_finite() && args.fps > 0.0) {
        bail!("--fps must be a positive number, got {}", args.fps);
    }
    let library = ContentLibrary::load(&args.library)?;
    let script = match &args.script {
        Some(path) => Script::load(path)?,
        None => Script::default(),
    };
    let glyphs = match &args.font {
        Some(path) => GlyphCache::from_font_file(path)?,
        None => GlyphCache::blocks(),
    };
    let options = SessionOptions {
        view_w: args.width,
        view_h: args.height,
        language: args.lang.clone(),
        seed: args.seed,
        theme: args.params.theme,
        params: Some(resolve_params(&args.params)?),
        mobile: args.mobile.then_some(true),
    };
    if let Some((out, _)) = render {
        fs::create_dir_all(out)
            .with_context(|| format!("failed to create output directory {}", out.display()))?;
    }

    let mut clock = FrameClock::new(args.fps);
    let frames = args.frames.unwrap_or_else(|| {
        if script.steps.is_empty() {
            DEFAULT_FRAMES
        } else {
            ((script.end_ms() + SCRIPT_TAIL_MS) as f64 / clock.frame_ms()).ceil() as u64
        }
    });

    let mut session = Session::new(&library, options, glyphs, RecordingHost::default())?;
    let mut player = script.player();
    session.start(0);
    info!(frames, fps = args.fps, "session started");

    while clock.frame() < frames {
        let index = clock.frame();
        let now = clock.now_ms();
        for step in player.due(now) {
            session.handle_input(step.event, now)?;
        }
        session.frame(now);
        for transition in session.take_transitions() {
            if trace_json {
                let line = json!({
                    "at_ms": transition.at_ms,
                    "from": transition.from.name(),
                    "to": transition.to.name(),
                });
                println!("{line}");
            } else {
                println!(
                    "{:>8}ms  {} -> {}",
                    transition.at_ms,
                    transition.from.name(),
                    transition.to.name()
                );
            }
        }
        if let Some((out, every)) = render {
            if index % every == 0 {
                let pixmap = session.render()?;
                let path = out.join(format!("frame_{index:05}.png"));
                write_png(pixmap, &path)?;
                println!("{} {}", path.display(), frame_digest(pixmap));
            }
        }
        clock.tick();
    }

    let host = session.host().clone();
    let final_state = session.state();
    let elapsed = session.now_ms();
    session.teardown();
    if trace_json {
        let summary = json!({
            "final_state": final_state.name(),
            "frames": frames,
            "elapsed_ms": elapsed,
            "clipboard": host.clipboard,
            "marketplace_visits": host.marketplace_visits,
        });
        println!("{summary}");
    } else {
        println!(
            "final: {} after {frames} frames ({elapsed}ms)",
            final_state.name()
        );
        for text in &host.clipboard {
            println!("clipboard: {text}");
        }
        if host.marketplace_visits > 0 {
            println!("marketplace visits: {}", host.marketplace_visits);
        }
    }
    Ok(())
}
