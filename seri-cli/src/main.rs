//! `seri` — classify the emotional content of audio files.
//!
//! ```text
//! seri [--config FILE] [--model FILE] [--labels FILE] [--jobs N] <audio>...
//! ```
//!
//! Loads the model and label encoder once, then classifies every file on a
//! pool of blocking workers sharing one `EmotionClassifier`. Each file yields
//! one JSON line on stdout; logs go to stderr.

#[cfg(feature = "onnx")]
mod settings;

#[cfg(not(feature = "onnx"))]
fn main() {
    eprintln!("seri requires the 'onnx' feature");
    std::process::exit(1);
}

#[cfg(feature = "onnx")]
fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("seri_cli=info,seri_core=info")
            }),
        )
        .init();

    let args = match cli::parse_args(std::env::args().skip(1)) {
        Ok(cli::Command::Run(args)) => args,
        Ok(cli::Command::Help) => {
            println!("{}", cli::USAGE);
            return;
        }
        Err(e) => {
            eprintln!("{e}\n\n{}", cli::USAGE);
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start runtime: {e}");
            std::process::exit(1);
        }
    };

    match runtime.block_on(cli::run(args)) {
        Ok(0) => {}
        Ok(failed) => {
            tracing::warn!(failed, "some files could not be classified");
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("seri failed: {e:#}");
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "onnx")]
mod cli {
    use std::path::PathBuf;
    use std::sync::Arc;

    use anyhow::Context;
    use serde::Serialize;
    use seri_core::{
        ClassificationResult, EmotionClassifier, LabelEncoder, ModelHandle, OnnxEmotionModel,
        OnnxModelConfig,
    };
    use tokio::sync::Semaphore;
    use tracing::info;

    use crate::settings::CliSettings;

    pub const USAGE: &str = "\
Usage: seri [--config <settings.json>] [--model <model.onnx>] [--labels <labels.json>]
            [--jobs <n>] <audio>...";

    #[derive(Debug, PartialEq)]
    pub struct Args {
        pub config: Option<PathBuf>,
        pub model: Option<PathBuf>,
        pub labels: Option<PathBuf>,
        pub jobs: usize,
        pub files: Vec<PathBuf>,
    }

    #[derive(Debug, PartialEq)]
    pub enum Command {
        Run(Args),
        Help,
    }

    pub fn parse_args(raw: impl IntoIterator<Item = String>) -> Result<Command, String> {
        let mut config = None;
        let mut model = None;
        let mut labels = None;
        let mut jobs = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        let mut files = Vec::new();

        let mut it = raw.into_iter();
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--config" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --config".into());
                    };
                    config = Some(PathBuf::from(v));
                }
                "--model" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --model".into());
                    };
                    model = Some(PathBuf::from(v));
                }
                "--labels" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --labels".into());
                    };
                    labels = Some(PathBuf::from(v));
                }
                "--jobs" | "-j" => {
                    let Some(v) = it.next() else {
                        return Err("missing value for --jobs".into());
                    };
                    jobs = v
                        .parse::<usize>()
                        .map_err(|_| "invalid value for --jobs".to_string())?
                        .clamp(1, 64);
                }
                "--help" | "-h" => return Ok(Command::Help),
                other if other.starts_with('-') => {
                    return Err(format!("unknown argument: {other}"));
                }
                file => files.push(PathBuf::from(file)),
            }
        }

        if files.is_empty() {
            return Err("no audio files given".into());
        }
        Ok(Command::Run(Args {
            config,
            model,
            labels,
            jobs,
            files,
        }))
    }

    #[derive(Serialize)]
    struct FileReport {
        file: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<ClassificationResult>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    }

    /// Build the classifier, classify every file, return the failure count.
    pub async fn run(args: Args) -> anyhow::Result<usize> {
        let settings = match &args.config {
            Some(path) => CliSettings::load(path)?,
            None => CliSettings::default(),
        };

        let defaults = OnnxModelConfig::default();
        let model_config = OnnxModelConfig {
            model_path: args
                .model
                .or(settings.model_path)
                .unwrap_or(defaults.model_path),
            labels_path: args
                .labels
                .or(settings.labels_path)
                .unwrap_or(defaults.labels_path),
        };

        let labels = LabelEncoder::from_file(&model_config.labels_path)
            .context("loading label encoder")?;
        let model = OnnxEmotionModel::new(&model_config).context("loading emotion model")?;
        let classifier = Arc::new(EmotionClassifier::new(
            settings.classifier,
            ModelHandle::new(model),
            Arc::new(labels),
        ));
        classifier.warm_up().context("warming up classifier")?;

        info!(files = args.files.len(), jobs = args.jobs, "classifying");
        let permits = Arc::new(Semaphore::new(args.jobs));
        let mut tasks = Vec::with_capacity(args.files.len());
        for file in args.files {
            let classifier = Arc::clone(&classifier);
            let permits = Arc::clone(&permits);
            tasks.push(tokio::spawn(async move {
                let _permit = permits.acquire_owned().await;
                let path = file.clone();
                let outcome =
                    tokio::task::spawn_blocking(move || classifier.classify_file(&path)).await;
                (file, outcome)
            }));
        }

        let mut failed = 0usize;
        for task in tasks {
            let (file, outcome) = task.await.context("classification task died")?;
            let report = match outcome {
                Ok(Ok(result)) => FileReport {
                    file: file.display().to_string(),
                    result: Some(result),
                    error: None,
                },
                Ok(Err(e)) => {
                    failed += 1;
                    FileReport {
                        file: file.display().to_string(),
                        result: None,
                        error: Some(e.to_string()),
                    }
                }
                Err(join) => {
                    failed += 1;
                    FileReport {
                        file: file.display().to_string(),
                        result: None,
                        error: Some(format!("worker panicked: {join}")),
                    }
                }
            };
            println!("{}", serde_json::to_string(&report)?);
        }
        Ok(failed)
    }

}
