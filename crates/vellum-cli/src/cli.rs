//! Argument parsing, engine bootstrap, and subcommand dispatch.

use std::path::{Path, PathBuf};

use anyhow::anyhow;
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use uuid::Uuid;
use vellum_models::{ModelStatus, ModelType};
use vellum_storage::{empty_metadata, Media, Torrent, Transcription};
use vellum_transcription::{OutputFormat as EngineOutputFormat, TranscriptionSettings};

use crate::context::AppContext;
use crate::error::{CliError, CliResult};

/// Info hash under which every file transcribed directly by this CLI is
/// filed, since the storage schema's `media` table requires an owning
/// torrent row and this binary never runs a torrent engine of its own.
const LOCAL_TORRENT_HASH: &str = "0000000000000000000000000000000000000000";

/// Administrative CLI for driving the transcription core, media
/// pipeline, and storage layer from a terminal.
#[derive(Parser)]
#[command(name = "vellum", about = "Desktop media transcription pipeline")]
struct Cli {
    /// Path to a TOML configuration file; defaults are used if omitted.
    #[arg(long, global = true, env = "VELLUM_CONFIG")]
    config: Option<PathBuf>,
    /// Select output rendering for commands that print structured data.
    #[arg(long = "output", global = true, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transcribe an audio or video file.
    Transcribe(TranscribeArgs),
    /// Inspect and manage the model catalogue.
    #[command(subcommand)]
    Models(ModelsCommand),
    /// Placeholder for a future HTTP API host; not implemented.
    ServeApi(ServeApiArgs),
}

#[derive(Args)]
struct TranscribeArgs {
    /// Path to the audio or video file to transcribe.
    path: PathBuf,
    /// BCP-47 language code, or omit for auto-detection.
    #[arg(long)]
    language: Option<String>,
    /// Preferred model size; defaults to the best one already catalogued.
    #[arg(long, value_enum)]
    model: Option<ModelSizeArg>,
    /// Rendering for the transcription result.
    #[arg(long, value_enum, default_value_t = TranscriptFormat::Txt)]
    format: TranscriptFormat,
    /// Write the rendered transcript to this path instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ModelSizeArg {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
    LargeV2,
    LargeV3,
}

impl From<ModelSizeArg> for ModelType {
    fn from(value: ModelSizeArg) -> Self {
        match value {
            ModelSizeArg::Tiny => Self::Tiny,
            ModelSizeArg::Base => Self::Base,
            ModelSizeArg::Small => Self::Small,
            ModelSizeArg::Medium => Self::Medium,
            ModelSizeArg::Large => Self::Large,
            ModelSizeArg::LargeV2 => Self::LargeV2,
            ModelSizeArg::LargeV3 => Self::LargeV3,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum TranscriptFormat {
    Srt,
    Vtt,
    Txt,
    Json,
}

impl From<TranscriptFormat> for EngineOutputFormat {
    fn from(value: TranscriptFormat) -> Self {
        match value {
            TranscriptFormat::Srt => Self::Srt,
            TranscriptFormat::Vtt => Self::Vtt,
            TranscriptFormat::Txt => Self::Txt,
            TranscriptFormat::Json => Self::Json,
        }
    }
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// List every catalogued model and its download/load status.
    List,
    /// Download (without loading) a catalogued model.
    Download(ModelIdArgs),
    /// Download if needed, validate, and load a model into the STT wrapper.
    Load(ModelIdArgs),
    /// Unload the currently loaded model, if any.
    Unload(ModelIdArgs),
    /// Delete a model's local file and reset its catalogue entry.
    Delete(ModelIdArgs),
}

#[derive(Args)]
struct ModelIdArgs {
    /// Catalogue id, e.g. `whisper-base`.
    id: String,
}

#[derive(Args)]
struct ServeApiArgs {}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Transcribe(_) => "transcribe",
        Command::Models(ModelsCommand::List) => "models_list",
        Command::Models(ModelsCommand::Download(_)) => "models_download",
        Command::Models(ModelsCommand::Load(_)) => "models_load",
        Command::Models(ModelsCommand::Unload(_)) => "models_unload",
        Command::Models(ModelsCommand::Delete(_)) => "models_delete",
        Command::ServeApi(_) => "serve_api",
    }
}

/// Parses CLI arguments, bootstraps every engine, executes the requested
/// command, and returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();

    let logging = vellum_telemetry::LoggingConfig::default();
    if let Err(err) = vellum_telemetry::init_logging(&logging) {
        eprintln!("warning: failed to initialize logging: {err:#}");
    }

    let command_name = command_label(&cli.command);
    tracing::info!(command = command_name, "starting");

    let result = dispatch(cli).await;

    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let ctx = AppContext::bootstrap(cli.config.as_deref()).await?;

    match cli.command {
        Command::Transcribe(args) => handle_transcribe(&ctx, args).await,
        Command::Models(command) => handle_models(&ctx, command, cli.output).await,
        Command::ServeApi(_) => Err(CliError::validation(
            "serve-api is not implemented in this build; it is reserved for a future HTTP host",
        )),
    }
}

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "avi", "webm", "m4v"];

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| VIDEO_EXTENSIONS.iter().any(|video_ext| ext.eq_ignore_ascii_case(video_ext)))
}

async fn handle_transcribe(ctx: &AppContext, args: TranscribeArgs) -> CliResult<()> {
    if !args.path.is_file() {
        return Err(CliError::validation(format!(
            "{} does not exist or is not a regular file",
            args.path.display()
        )));
    }

    let model_type = args.model.map(ModelType::from);
    let model = match model_type {
        Some(model_type) => ctx
            .models
            .find_model(model_type, args.language.as_deref())
            .await
            .ok_or_else(|| CliError::validation("no catalogued model matches the requested size/language"))?,
        None => ctx
            .models
            .find_best_model(args.language.as_deref())
            .await
            .ok_or_else(|| CliError::validation("no catalogued model is available; run `models list`"))?,
    };
    if model.status != ModelStatus::Loaded {
        ctx.models.load_model(&model.id).await.map_err(CliError::failure)?;
    }

    let settings = TranscriptionSettings {
        language: args.language.clone(),
        output_format: args.format.into(),
        ..TranscriptionSettings::default()
    };

    let result = if is_video(&args.path) {
        ctx.transcription.transcribe_from_video(&args.path, &settings).await
    } else {
        ctx.transcription.transcribe_audio(&args.path, &settings).await
    }
    .map_err(CliError::failure)?;

    let rendered = vellum_transcription::TranscriptionEngine::convert_result(&result, settings.output_format)
        .map_err(CliError::failure)?;

    match &args.out {
        Some(out_path) => {
            tokio::fs::write(out_path, &rendered)
                .await
                .map_err(|err| CliError::failure(anyhow!("failed to write {}: {err}", out_path.display())))?;
        }
        None => println!("{rendered}"),
    }

    let transcription_id = persist_transcription(ctx, &args.path, &result).await?;
    eprintln!("saved transcription {transcription_id}");
    Ok(())
}

async fn persist_transcription(
    ctx: &AppContext,
    path: &Path,
    result: &vellum_subtitles::TranscriptionResult,
) -> CliResult<Uuid> {
    if ctx.storage.get_torrent(LOCAL_TORRENT_HASH).await.is_err() {
        let now = Utc::now();
        ctx.storage
            .add_torrent(&Torrent {
                info_hash: LOCAL_TORRENT_HASH.to_string(),
                name: "local files transcribed via the CLI".to_string(),
                magnet_uri: String::new(),
                size: 0,
                date_added: now,
                last_active: now,
                save_path: String::new(),
                progress: 1.0,
                status: "completed".to_string(),
                metadata: empty_metadata(),
                files: empty_metadata(),
                seeders: 0,
                leechers: 0,
                downloaded: 0,
                uploaded: 0,
                ratio: 0.0,
            })
            .await
            .map_err(CliError::failure)?;
    }

    let file_size = tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0);
    let media_id = Uuid::new_v4();
    ctx.storage
        .add_media(&Media {
            id: media_id,
            torrent_hash: LOCAL_TORRENT_HASH.to_string(),
            file_path: path.display().to_string(),
            original_name: path.file_name().map_or_else(String::new, |name| name.to_string_lossy().into_owned()),
            mime_type: if is_video(path) { "video/*".to_string() } else { "audio/*".to_string() },
            file_size: i64::try_from(file_size).unwrap_or(i64::MAX),
            duration: None,
            width: None,
            height: None,
            frame_rate: None,
            video_codec: None,
            audio_codec: None,
            has_transcription: true,
            date_added: Utc::now(),
            last_played: None,
            playback_position: 0.0,
            metadata: empty_metadata(),
        })
        .await
        .map_err(CliError::failure)?;

    let transcription_id = Uuid::new_v4();
    ctx.storage
        .add_transcription(&Transcription {
            id: transcription_id,
            media_id,
            language: result.language.clone(),
            model_used: result.model_used.clone(),
            full_text: result.full_text.clone(),
            timestamps: serde_json::to_value(&result.segments).unwrap_or_else(|_| empty_metadata()),
            confidence: result.avg_confidence,
            date_created: result.processed_at,
            processing_time: f64::from(u32::try_from(result.processing_time_ms).unwrap_or(u32::MAX)) / 1000.0,
            status: "completed".to_string(),
        })
        .await
        .map_err(CliError::failure)?;

    Ok(transcription_id)
}

async fn handle_models(ctx: &AppContext, command: ModelsCommand, output: OutputFormat) -> CliResult<()> {
    match command {
        ModelsCommand::List => {
            let models = ctx.models.available_models().await;
            render_models(&models, output)
        }
        ModelsCommand::Download(args) => ctx.models.download_model(&args.id).await.map_err(CliError::failure),
        ModelsCommand::Load(args) => ctx.models.load_model(&args.id).await.map_err(CliError::failure),
        ModelsCommand::Unload(args) => ctx.models.unload_model(&args.id).await.map_err(CliError::failure),
        ModelsCommand::Delete(args) => ctx.models.delete_model(&args.id).await.map_err(CliError::failure),
    }
}

fn render_models(models: &[vellum_models::ModelInfo], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(models)
                .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
            println!("{text}");
        }
        OutputFormat::Table => {
            println!("{:<20} {:<10} {:<14} LANGUAGE", "ID", "TYPE", "STATUS");
            for model in models {
                println!(
                    "{:<20} {:<10?} {:<14?} {}",
                    model.id,
                    model.model_type,
                    model.status,
                    model.language.as_deref().unwrap_or("multilingual"),
                );
            }
        }
    }
    Ok(())
}
