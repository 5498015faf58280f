mod cli;

use anyhow::Context;
use atlas_tf::ConvertError;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("ATLAS_TF_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::ClusterToAdvancedCluster(command) => {
            let include_moved = command.include_moved;
            run(&command.files, |input| {
                atlas_tf::cluster_to_advanced_cluster(input, include_moved)
            })
        }
        cli::Command::AdvancedClusterToV2(files) => run(&files, atlas_tf::advanced_cluster_to_v2),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

fn run<F>(files: &cli::FileArgs, convert: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Result<String, ConvertError>,
{
    anyhow::ensure!(
        files.file.is_file(),
        "file must exist: {}",
        files.file.display()
    );
    anyhow::ensure!(
        files.replace_output || !files.output.exists(),
        "file must not exist: {}",
        files.output.display()
    );

    convert_file(files, &convert)?;
    if files.watch {
        watch(files, &convert)?;
    }
    Ok(())
}

/// Converts the input file once
///
/// In watch mode a failed conversion is written to the output file instead of being returned.
fn convert_file<F>(files: &cli::FileArgs, convert: &F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Result<String, ConvertError>,
{
    let input = std::fs::read_to_string(&files.file)
        .with_context(|| format!("failed to read {}", files.file.display()))?;

    let output = match convert(&input) {
        Ok(output) => output,
        Err(err) if files.watch => {
            let err = anyhow::Error::from(err);
            let message = format!("{err:#}");
            tracing::warn!(error = %message, "conversion failed");
            error_output(&err, &input)
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to convert {}", files.file.display()))
        }
    };

    std::fs::write(&files.output, output)
        .with_context(|| format!("failed to write {}", files.output.display()))?;
    tracing::info!(file = %files.file.display(), output = %files.output.display(), "converted");
    Ok(())
}

fn watch<F>(files: &cli::FileArgs, convert: &F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Result<String, ConvertError>,
{
    use notify::Watcher;

    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("failed to create file watcher")?;
    watcher
        .watch(&files.file, notify::RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {}", files.file.display()))?;
    tracing::info!(file = %files.file.display(), "watching for changes");

    for event in rx {
        let event = event.context("file watcher failed")?;
        if !matches!(event.kind, notify::EventKind::Modify(_)) {
            continue;
        }

        tracing::info!(file = %files.file.display(), "input changed");
        convert_file(files, convert)?;
    }
    Ok(())
}

/// Unmodified input preceded by the error as a comment
fn error_output(err: &anyhow::Error, input: &str) -> String {
    let message = format!("{err:#}");
    let mut lines = message.lines();
    let mut output = format!("# CONVERT ERROR: {}\n", lines.next().unwrap_or_default());
    for line in lines {
        output.push_str(&format!("# {line}\n"));
    }
    output.push('\n');
    output.push_str(input);
    output
}
