use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use submission_pdf::{FontSource, PageSetup, RenderOptions};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PageSize {
    A4,
    Letter,
}

/// Export a form submission (JSON) to a paginated PDF.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Submission JSON: {title, submissionId, submittedAt, data, fieldLabels?}
    input: PathBuf,
    /// Output PDF path
    output: PathBuf,
    #[arg(long, value_enum, default_value = "a4")]
    page: PageSize,
    /// TrueType/OpenType font to embed instead of Helvetica
    #[arg(long)]
    font: Option<PathBuf>,
    /// Bold face for labels and headings (defaults to --font)
    #[arg(long, requires = "font")]
    bold_font: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let options = RenderOptions {
        page: match args.page {
            PageSize::A4 => PageSetup::a4(),
            PageSize::Letter => PageSetup::letter(),
        },
        fonts: match args.font {
            Some(regular) => FontSource::TrueType {
                regular,
                bold: args.bold_font,
            },
            None => FontSource::Builtin,
        },
    };

    match submission_pdf::convert_json_to_pdf(&args.input, &args.output, &options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
