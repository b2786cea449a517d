use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;

use cv_export::document::render_text_pdf;
use cv_export::export::{write_file, ExportError, Exporter};
use cv_export::fonts::FontBytes;
use cv_export::loader::{DataSource, FileSource, Session};
use cv_export::raster::RasterOptions;
use cv_export::view::{self, CvView, Labels, DEFAULT_FILENAME};

/// Renders the CV stored under `data/sample.json` and exports it as a PDF.
///
/// Fonts are looked up in `--fonts-dir`, then `CV_EXPORT_FONTS_DIR`, then `assets/fonts` next to
/// the executable and finally `assets/fonts` in the crate root.  A CJK fallback face comes from
/// `--cjk-font`, then `CV_EXPORT_CJK_FONT`, then `NotoSansTC-Regular.otf` in the fonts directory.
#[derive(Parser)]
#[command(author, version, about = "Render a CV record and export it as a PDF")]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    /// Language of the section titles and punctuation.
    #[arg(long, value_enum, default_value_t = Locale::En, global = true)]
    locale: Locale,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Directory that contains `data/sample.json`.
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Fetch `data/sample.json` from this base URL instead of the filesystem.
    #[cfg(feature = "remote")]
    #[arg(long, global = true)]
    url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a plain-text preview of the rendered page.
    Preview,

    /// Export the rendered page as a PDF.
    Export(ExportArgs),
}

#[derive(Args)]
struct ExportArgs {
    /// Output directory.
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// File name of the PDF.
    #[arg(long, default_value = DEFAULT_FILENAME)]
    filename: String,

    #[arg(long, value_enum, default_value_t = Mode::Snapshot)]
    mode: Mode,

    /// Oversampling factor of the snapshot.
    #[arg(long, default_value_t = RasterOptions::default().scale, value_parser = positive_scale)]
    scale: f32,

    /// Also write the PNG snapshot next to the PDF.
    #[arg(long)]
    png: bool,

    /// Directory holding the Roboto font files.
    #[arg(long)]
    fonts_dir: Option<PathBuf>,

    /// Font file used for characters Roboto lacks, such as CJK names.
    #[arg(long)]
    cjk_font: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Locale {
    En,
    ZhTw,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Rasterized single page, clipped at the bottom edge.
    Snapshot,
    /// Paginated, selectable text.
    Text,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let labels = match cli.locale {
        Locale::En => Labels::english(),
        Locale::ZhTw => Labels::traditional_chinese(),
    };

    let source = data_source(&cli.source);
    let session = Session::load(source.as_ref());
    let view = view::render(session.state(), &labels);

    match cli.command {
        Commands::Preview => {
            print!("{}", view);
            Ok(())
        }
        Commands::Export(args) => export(&view, &args),
    }
}

fn data_source(args: &SourceArgs) -> Box<dyn DataSource> {
    #[cfg(feature = "remote")]
    {
        if let Some(url) = &args.url {
            return Box::new(cv_export::loader::HttpSource::new(url.clone()));
        }
    }
    Box::new(FileSource::new(args.root.clone()))
}

fn export(view: &CvView, args: &ExportArgs) -> Result<(), Box<dyn Error>> {
    // The download action only exists once the record has loaded.
    let action = view.toolbar.action.as_ref().ok_or(ExportError::NotReady)?;
    let page = view.page().ok_or(ExportError::NotReady)?;
    let mut fonts = FontBytes::discover(args.fonts_dir.as_deref())?;
    if let Some(path) = &args.cjk_font {
        fonts = fonts.with_fallback_file(path)?;
    }

    let path = match args.mode {
        Mode::Snapshot => {
            let artifact = Exporter::snapshot(fonts)
                .with_scale(args.scale)
                .export(page)?;
            let path = artifact.save(&args.out, &args.filename)?;
            if args.png {
                let png_name = Path::new(&args.filename).with_extension("png");
                artifact.save_png(&args.out, &png_name.to_string_lossy())?;
            }
            path
        }
        Mode::Text => {
            let bytes = render_text_pdf(page, &fonts, &view.toolbar.title)?;
            write_file(&args.out, &args.filename, &bytes)?
        }
    };

    info!("{} saved to {}", action.label, path.display());
    Ok(())
}

fn positive_scale(value: &str) -> Result<f32, String> {
    let scale: f32 = value
        .parse()
        .map_err(|_| format!("`{}` is not a number", value))?;
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        Err(format!("scale must be a positive number, got {}", value))
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
