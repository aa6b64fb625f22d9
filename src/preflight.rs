use std::path::{Path, PathBuf};

use rand::{distributions::Alphanumeric, Rng as _};

use crate::error::ContextError;

/// The default external preflight command, expected on the `PATH` in local mode.
pub const DEFAULT_PREFLIGHT_COMMAND: &str = "press-ready";

/// The default container image carrying the preflight tool.
pub const DEFAULT_PREFLIGHT_IMAGE: &str = "ghcr.io/vibranthq/press-ready:latest";

/// Where the external preflight tool runs: as a local command, or inside a
/// managed container with the input and output directories bind-mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preflight {
    Local,
    Docker { image: String },
}

/// The saving options of a finishing run: whether to run the external
/// preflight pass, and the generic option strings forwarded to it.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    pub preflight: Option<Preflight>,
    /// Generic option names translated to the kebab-case flag convention of
    /// the external tool; a `no-` prefix toggles the boolean flag off.
    pub preflight_options: Vec<String>,
}

/// Writes the finished document bytes to the destination path, optionally
/// running the external preflight tool over them first.
///
/// Without preflight the bytes are written directly. With preflight the bytes
/// go to a private temporary path, the tool writes to an intermediate `.swp`
/// path next to the destination, and only a successful run renames the
/// intermediate over the destination. A failed run therefore leaves the
/// destination untouched, with the temporary input behind as the only
/// evidence. The external invocation is the single long-latency suspension
/// point of the pipeline; no timeout is applied here, callers wrap their own
/// cancellation around it.
pub fn save(bytes: &[u8], destination: &Path, options: &SaveOptions) -> Result<(), ContextError> {
    let Some(preflight) = &options.preflight else {
        return std::fs::write(destination, bytes).map_err(|error| {
            ContextError::with_error(
                format!("Failed to write the document to {:?}", destination),
                &error,
            )
        });
    };

    let input_path = temporary_input_path();
    std::fs::write(&input_path, bytes).map_err(|error| {
        ContextError::with_error(
            format!("Failed to stage the document at {:?} for preflight", input_path),
            &error,
        )
    })?;
    let staged_path = PathBuf::from(format!("{}.swp", destination.display()));

    let flags = translate_options(&options.preflight_options);
    let run = match preflight {
        Preflight::Local => run_local_preflight(&input_path, &staged_path, &flags),
        Preflight::Docker { image } => {
            run_containerized_preflight(image, &input_path, &staged_path, &flags)
        }
    };
    if let Err(error) = run {
        // Leave the staged input behind as the only evidence of the failure
        let _ = std::fs::remove_file(&staged_path);
        return Err(error);
    }

    std::fs::rename(&staged_path, destination).map_err(|error| {
        ContextError::with_error("Failed to rename the preflighted document", &error)
    })?;
    // The staged input is only useful as evidence of a failed run
    let _ = std::fs::remove_file(&input_path);

    Ok(())
}

/// Runs the preflight command locally:
///
/// ```bash
/// $ press-ready build --input input.pdf --output output.pdf [--flag ...]
/// ```
fn run_local_preflight(
    input_path: &Path,
    output_path: &Path,
    flags: &[String],
) -> Result<(), ContextError> {
    let child = std::process::Command::new(DEFAULT_PREFLIGHT_COMMAND)
        .arg("build")
        .arg("--input")
        .arg(input_path)
        .arg("--output")
        .arg(output_path)
        .args(flags)
        .spawn();
    wait_for_preflight(child, DEFAULT_PREFLIGHT_COMMAND)
}

/// Runs the preflight command inside a container, bind-mounting the
/// directories holding the input and output paths:
///
/// ```bash
/// $ docker run --rm -v /tmp:/input -v /books:/output <image> build --input /input/staged.pdf --output /output/final.pdf.swp [--flag ...]
/// ```
fn run_containerized_preflight(
    image: &str,
    input_path: &Path,
    output_path: &Path,
    flags: &[String],
) -> Result<(), ContextError> {
    let input_directory = input_path.parent().ok_or(ContextError::with_context(
        "The preflight input path has no parent directory to mount",
    ))?;
    let output_directory = output_path.parent().ok_or(ContextError::with_context(
        "The preflight output path has no parent directory to mount",
    ))?;
    let input_name = input_path.file_name().ok_or(ContextError::with_context(
        "The preflight input path has no file name",
    ))?;
    let output_name = output_path.file_name().ok_or(ContextError::with_context(
        "The preflight output path has no file name",
    ))?;

    let child = std::process::Command::new("docker")
        .arg("run")
        .arg("--rm")
        .arg("-v")
        .arg(format!("{}:/input", input_directory.display()))
        .arg("-v")
        .arg(format!("{}:/output", output_directory.display()))
        .arg(image)
        .arg("build")
        .arg("--input")
        .arg(Path::new("/input").join(input_name))
        .arg("--output")
        .arg(Path::new("/output").join(output_name))
        .args(flags)
        .spawn();
    wait_for_preflight(child, "docker")
}

/// Waits for a spawned preflight process and turns a spawn failure or a
/// non-zero exit into an error, without retrying.
fn wait_for_preflight(
    child: std::io::Result<std::process::Child>,
    command: &str,
) -> Result<(), ContextError> {
    match child {
        Ok(mut child) => {
            let status = child.wait().map_err(|error| {
                ContextError::with_error(
                    format!("Unable to wait for the {} command execution", command),
                    &error,
                )
            })?;
            if !status.success() {
                return Err(ContextError::with_context(format!(
                    "{} failed with status {:?}",
                    command, status
                )));
            }
            Ok(())
        }
        Err(error) => Err(ContextError::with_error(
            format!("Unable to run the {} command", command),
            &error,
        )),
    }
}

/// Translates the generic option names to the flag convention of the external
/// tool: kebab-case with a `--` prefix, with a `no-` prefix kept in place so
/// that the corresponding boolean flag is toggled off.
pub fn translate_options(options: &[String]) -> Vec<String> {
    options
        .iter()
        .map(|option| format!("--{}", to_kebab_case(option)))
        .collect()
}

/// Lowers a camelCase or snake_case option name to kebab-case.
fn to_kebab_case(name: &str) -> String {
    let mut kebab = String::with_capacity(name.len());
    for character in name.chars() {
        if character.is_ascii_uppercase() {
            kebab.push('-');
            kebab.push(character.to_ascii_lowercase());
        } else if character == '_' {
            kebab.push('-');
        } else {
            kebab.push(character);
        }
    }

    kebab
}

/// A private temporary path for staging the preflight input, unique enough
/// through a random alphanumeric suffix.
fn temporary_input_path() -> PathBuf {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .map(char::from)
        .take(12)
        .collect();
    std::env::temp_dir().join(format!("pressproof-{}.pdf", suffix))
}
