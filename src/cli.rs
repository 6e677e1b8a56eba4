use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::DocumentType;

#[derive(Parser, Debug)]
#[command(
    name = "claimmark",
    version,
    about = "Highlight billing conditions in medical-insurance claim report PDFs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register one or more report PDFs as a bundle.
    Upload(UploadArgs),
    /// List stored documents.
    Documents(DocumentsArgs),
    /// Parse a PDF and print its rows as JSON.
    Rows(RowsArgs),
    /// Write an annotated copy of a bundle document for one condition.
    Highlight(HighlightArgs),
    /// Write the rows matching one condition as CSV.
    Export(ExportArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct UploadArgs {
    #[arg(long, default_value = ".cache/claimmark")]
    pub data_dir: PathBuf,

    #[arg(long, env = "PDFIUM_DYNAMIC_LIB_PATH")]
    pub pdfium_lib: Option<PathBuf>,

    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct DocumentsArgs {
    #[arg(long, default_value = ".cache/claimmark")]
    pub data_dir: PathBuf,

    #[arg(long)]
    pub bundle: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RowsArgs {
    #[arg(long, env = "PDFIUM_DYNAMIC_LIB_PATH")]
    pub pdfium_lib: Option<PathBuf>,

    #[arg(long)]
    pub pdf: PathBuf,

    /// Overrides detection from the first-page title.
    #[arg(long, value_enum)]
    pub document_type: Option<DocumentType>,

    #[arg(long, allow_negative_numbers = true)]
    pub condition: Option<i64>,

    #[arg(long, default_value_t = false)]
    pub marked_only: bool,
}

#[derive(Args, Debug, Clone)]
pub struct HighlightArgs {
    #[arg(long, default_value = ".cache/claimmark")]
    pub data_dir: PathBuf,

    #[arg(long, env = "PDFIUM_DYNAMIC_LIB_PATH")]
    pub pdfium_lib: Option<PathBuf>,

    #[arg(long)]
    pub document_id: String,

    /// 0 = visits 7d+, 1 = drug 30d+, 2 = hospitalization, 3 = surgery.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub condition: i64,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub no_hospitalization_fallback: bool,

    #[arg(long, default_value_t = 0.35)]
    pub highlight_opacity: f32,

    #[arg(long, default_value_t = 10.0)]
    pub min_bar_height: f32,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[arg(long, default_value = ".cache/claimmark")]
    pub data_dir: PathBuf,

    #[arg(long, env = "PDFIUM_DYNAMIC_LIB_PATH")]
    pub pdfium_lib: Option<PathBuf>,

    #[arg(long)]
    pub document_id: String,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub condition: i64,

    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/claimmark")]
    pub data_dir: PathBuf,
}
