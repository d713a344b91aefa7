use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "oedit")]
#[command(about = "Non-destructive byte-stream editor")]
#[command(version)]
pub struct Cli {
    /// Control colored output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Write textual output to a file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply a JSON edit script to a file and save the result
    Apply {
        /// Path to the file to edit
        #[arg(short, long)]
        file: String,

        /// Path to a JSON array of edit operations
        #[arg(short, long)]
        script: String,

        /// Author name attributed to every change in the script
        #[arg(short, long, default_value = "oedit")]
        author: String,

        /// Destination path (defaults to editing `file` in place)
        #[arg(long)]
        save: Option<String>,

        /// Report the applied edits as JSON
        #[arg(long)]
        json: bool,
    },

    /// Render a viewport window as a hex dump
    View {
        /// Path to the file to view
        #[arg(short, long)]
        file: String,

        /// Byte offset of the viewport
        #[arg(long, default_value_t = 0)]
        offset: i64,

        /// Maximum number of bytes to materialise
        #[arg(short, long, default_value_t = 256)]
        length: i64,

        /// Sub-byte left-shift applied to the viewport (0-7)
        #[arg(short, long, default_value_t = 0)]
        bit_offset: u8,

        /// Write the raw viewport bytes instead of a formatted hex dump
        #[arg(long)]
        raw: bool,
    },

    /// Search a file for a literal byte pattern
    Find {
        /// Path to the file to search
        #[arg(short, long)]
        file: String,

        /// The pattern to search for
        #[arg(short, long)]
        needle: String,

        /// Interpret `needle` as a hex string (e.g. "deadbeef") instead of UTF-8 text
        #[arg(long)]
        hex: bool,

        /// Start offset of the search range
        #[arg(long, default_value_t = 0)]
        start: i64,

        /// End offset of the search range (defaults to the end of the file)
        #[arg(long)]
        end: Option<i64>,

        /// Report matches as JSON
        #[arg(long)]
        json: bool,
    },
}
