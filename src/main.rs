#[cfg(not(feature = "cli"))]
compile_error!("The `oedit` binary requires the `cli` feature. Build with `--features cli`.");

use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::process;

use omega_edit::cli;
use omega_edit::cli::app::{Cli, ColorMode, Commands};
use omega_edit::OmegaError;

fn main() {
    let cli = Cli::parse();

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {} // colored auto-detects tty
    }

    let writer_result: Result<Box<dyn Write>, OmegaError> = match &cli.output {
        Some(path) => File::create(path)
            .map(|f| Box::new(f) as Box<dyn Write>)
            .map_err(|e| OmegaError::Io(format!("cannot create {}: {}", path, e))),
        None => Ok(Box::new(std::io::stdout()) as Box<dyn Write>),
    };

    let mut writer = match writer_result {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Apply {
            file,
            script,
            author,
            save,
            json,
        } => cli::apply::execute(
            &cli::apply::ApplyOptions {
                file,
                script,
                author,
                save,
                json,
            },
            &mut writer,
        ),

        Commands::View {
            file,
            offset,
            length,
            bit_offset,
            raw,
        } => cli::view::execute(
            &cli::view::ViewOptions {
                file,
                offset,
                length,
                bit_offset,
                raw,
            },
            &mut writer,
        ),

        Commands::Find {
            file,
            needle,
            hex,
            start,
            end,
            json,
        } => cli::find::execute(
            &cli::find::FindOptions {
                file,
                needle,
                hex,
                start,
                end,
                json,
            },
            &mut writer,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
