use clap::Parser;
use std::path::PathBuf;

use pressproof::document::{finish, FinishOptions, FinishingInstructions};
use pressproof::error::ContextError;
use pressproof::preflight::{save, Preflight, SaveOptions, DEFAULT_PREFLIGHT_IMAGE};
use pressproof::recolor::ColorTable;

#[derive(Parser, Debug)]
#[command(version, long_about = None)]
struct CliArguments {
    /// The freshly rendered PDF to finish.
    #[arg(short = 'p', long = "pdf", value_name = "pdf_file")]
    pdf_path: PathBuf,
    /// The finishing sidecar produced by the renderer.
    #[arg(short = 'i', long = "instructions", value_name = "json_file")]
    instructions_path: PathBuf,
    /// The print-color lookup table; without it no color is rewritten.
    #[arg(short = 'c', long = "color-table", value_name = "json_file")]
    color_table_path: Option<PathBuf>,
    #[arg(short = 'o', long = "output", value_name = "file_path")]
    output_path: PathBuf,
    /// Run the external preflight tool over the output: "local" or "docker".
    #[arg(long = "preflight", value_name = "mode")]
    preflight: Option<String>,
    /// An option forwarded to the preflight tool, may be repeated.
    #[arg(long = "preflight-option", value_name = "option")]
    preflight_options: Vec<String>,
    /// The container image used in the "docker" preflight mode.
    #[arg(long = "docker-image", value_name = "image", default_value = DEFAULT_PREFLIGHT_IMAGE)]
    docker_image: String,
    /// Do not warn about colors absent from the table.
    #[arg(long = "no-warn-unmapped")]
    no_warn_unmapped: bool,
    /// Stamp the bare tool name instead of the versioned creator string.
    #[arg(long = "no-creator-metadata")]
    no_creator_metadata: bool,
}

fn main() {
    if let Err(error) = fallible_main() {
        log::error!("{}", error);
        std::process::exit(1);
    }
}

fn fallible_main() -> Result<(), ContextError> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
    let arguments = CliArguments::parse();
    log::debug!("{:?}", arguments);

    let pdf_bytes = std::fs::read(&arguments.pdf_path).map_err(|error| {
        ContextError::with_error(
            format!("Unable to read the PDF document {:?}", arguments.pdf_path),
            &error,
        )
    })?;
    let instructions = FinishingInstructions::from_path(&arguments.instructions_path)?;

    let color_table: ColorTable = match &arguments.color_table_path {
        Some(color_table_path) => {
            let color_table_content =
                std::fs::read_to_string(color_table_path).map_err(|error| {
                    ContextError::with_error(
                        format!("Unable to read the color table {:?}", color_table_path),
                        &error,
                    )
                })?;
            serde_json::from_str(&color_table_content).map_err(|error| {
                ContextError::with_error(
                    format!("Unable to parse the color table {:?}", color_table_path),
                    &error,
                )
            })?
        }
        None => ColorTable::new(),
    };

    let options = FinishOptions {
        color_table,
        warn_on_unmapped: !arguments.no_warn_unmapped,
        disable_creator_metadata: arguments.no_creator_metadata,
    };
    let finished_bytes = finish(&pdf_bytes, &instructions, &options)?;

    let preflight = match arguments.preflight.as_deref() {
        None => None,
        Some("local") => Some(Preflight::Local),
        Some("docker") => Some(Preflight::Docker {
            image: arguments.docker_image.clone(),
        }),
        Some(other) => {
            return Err(ContextError::with_context(format!(
                "Unknown preflight mode {:?}, expected \"local\" or \"docker\"",
                other
            )))
        }
    };
    save(
        &finished_bytes,
        &arguments.output_path,
        &SaveOptions {
            preflight,
            preflight_options: arguments.preflight_options.clone(),
        },
    )?;
    log::info!(
        "Saved the finished document to the path: {:?}",
        arguments.output_path
    );

    Ok(())
}
