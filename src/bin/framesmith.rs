use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use framesmith::{MediaService, ServiceConfig, Tier};

#[derive(Parser, Debug)]
#[command(name = "framesmith", version)]
struct Cli {
    #[command(flatten)]
    opts: GlobalOpts,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct GlobalOpts {
    /// JSON configuration file (overridden by FRAMESMITH_* variables and flags).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root of the tiered image store.
    #[arg(long, global = true)]
    image_path: Option<PathBuf>,

    /// Directory holding `.ttf` fonts.
    #[arg(long, global = true)]
    font_path: Option<PathBuf>,

    /// Directory holding uploaded audio tracks.
    #[arg(long, global = true)]
    audio_path: Option<PathBuf>,

    /// Render worker threads.
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Log verbosity (error, warn, info, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a frame description into the store.
    Render(RenderArgs),
    /// Store an image and precompute its scaled tiers.
    Ingest(InArgs),
    /// Copy a stored artifact out of the store.
    Fetch(FetchArgs),
    /// Store an image with the play-button overlay.
    Overlay(InArgs),
    /// Manage uploaded audio tracks.
    #[command(subcommand)]
    Track(TrackCommand),
    /// Print the video id and thumbnail candidates for a video URL.
    TubeId(TubeArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Frame description JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Expected content key of the description.
    #[arg(long)]
    key: Option<String>,
}

#[derive(Parser, Debug)]
struct InArgs {
    /// Input file.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct FetchArgs {
    /// Tier name: F or s0..s9.
    #[arg(long, value_parser = parse_tier)]
    tier: Tier,

    /// Content key.
    #[arg(long)]
    key: String,

    /// Destination file; metadata only when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum TrackCommand {
    /// Upload an audio file.
    Add(InArgs),
    /// Show a stored track.
    Show(KeyArgs),
    /// Delete a stored track.
    Delete(KeyArgs),
}

#[derive(Parser, Debug)]
struct KeyArgs {
    /// Content key.
    #[arg(long)]
    key: String,
}

#[derive(Parser, Debug)]
struct TubeArgs {
    /// Watch URL, short link or bare id.
    #[arg(long)]
    url: String,
}

fn parse_tier(s: &str) -> Result<Tier, String> {
    s.parse::<Tier>().map_err(|e| e.to_string())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let opts = &cli.opts;

    match cli.cmd {
        Command::Render(args) => cmd_render(&open_service(opts)?, args),
        Command::Ingest(args) => {
            let service = open_service(opts)?;
            let key = service.ingest_image(&read_input(&args.in_path)?)?;
            print_json(&serde_json::json!({ "key": key }))
        }
        Command::Fetch(args) => cmd_fetch(&open_service(opts)?, args),
        Command::Overlay(args) => {
            let service = open_service(opts)?;
            let key = service.ingest_thumbnail_overlay(&read_input(&args.in_path)?)?;
            print_json(&serde_json::json!({ "key": key }))
        }
        Command::Track(cmd) => cmd_track(&open_service(opts)?, cmd),
        Command::TubeId(args) => cmd_tube_id(&args),
    }
}

fn open_service(opts: &GlobalOpts) -> anyhow::Result<MediaService> {
    let config = load_config(opts)?;
    init_logging(&config)?;
    Ok(MediaService::open(config)?)
}

fn load_config(opts: &GlobalOpts) -> anyhow::Result<ServiceConfig> {
    let mut config = ServiceConfig::load(opts.config.as_deref())?;
    if let Some(p) = &opts.image_path {
        config.image_path = p.clone();
    }
    if let Some(p) = &opts.font_path {
        config.font_path = p.clone();
    }
    if let Some(p) = &opts.audio_path {
        config.audio_path = p.clone();
    }
    if let Some(n) = opts.workers {
        config.worker_threads = Some(n);
    }
    if let Some(level) = &opts.log_level {
        config.log_level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

fn init_logging(config: &ServiceConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(config.log_filter()?)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install log subscriber: {e}"))
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read '{}'", path.display()))
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value).context("encode output JSON")?;
    println!("{s}");
    Ok(())
}

fn cmd_render(service: &MediaService, args: RenderArgs) -> anyhow::Result<()> {
    let body = read_input(&args.in_path)?;
    let key = service.submit_render(args.key.as_deref(), &body)?;
    let (meta, _file) = service.fetch_artifact(Tier::Full, key.as_str())?;
    print_json(&serde_json::json!({ "key": key, "meta": meta }))
}

fn cmd_fetch(service: &MediaService, args: FetchArgs) -> anyhow::Result<()> {
    let (meta, mut file) = service.fetch_artifact(args.tier, &args.key)?;
    if let Some(out) = &args.out {
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        let mut dst =
            File::create(out).with_context(|| format!("create '{}'", out.display()))?;
        std::io::copy(&mut file, &mut dst)
            .with_context(|| format!("write '{}'", out.display()))?;
    }
    print_json(&serde_json::json!({
        "tier": args.tier.to_string(),
        "key": args.key,
        "meta": meta,
        "out": args.out,
    }))
}

fn cmd_track(service: &MediaService, cmd: TrackCommand) -> anyhow::Result<()> {
    match cmd {
        TrackCommand::Add(args) => {
            let f = File::open(&args.in_path)
                .with_context(|| format!("open '{}'", args.in_path.display()))?;
            let track = service.ingest_track(BufReader::new(f))?;
            print_json(&serde_json::json!({ "track": track, "mime": track.kind.mime() }))
        }
        TrackCommand::Show(args) => {
            let track = service.track(&args.key)?;
            print_json(&serde_json::json!({ "track": track, "mime": track.kind.mime() }))
        }
        TrackCommand::Delete(args) => {
            service.delete_track(&args.key)?;
            print_json(&serde_json::json!({ "deleted": args.key }))
        }
    }
}

fn cmd_tube_id(args: &TubeArgs) -> anyhow::Result<()> {
    let id = framesmith::video_id_from_url(&args.url)?;
    let candidates = framesmith::thumbnail_urls(&id);
    print_json(&serde_json::json!({ "id": id, "thumbnails": candidates }))
}
