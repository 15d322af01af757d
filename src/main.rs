use anyhow::Context;
use clap::Parser;
use pagemark::config::Config;
use pagemark::error::JobError;
use pagemark::job::{bind_and_run_job, JobRequest};
use pagemark::pipeline::{process_document, FailurePolicy};
use pagemark::render::{PdfiumRasterizer, Rasterizer, RenderError};
use std::path::{Path, PathBuf};

/// Pagemark - render PDF pages to images with a tiled logo watermark
#[derive(Parser, Debug)]
#[command(name = "pagemark")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for page images
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Rasterization resolution (overrides config)
    #[arg(long)]
    dpi: Option<u32>,

    /// Output format: png or jpeg (overrides config)
    #[arg(short, long)]
    format: Option<String>,

    /// Page failure policy: abort or skip (overrides config)
    #[arg(long)]
    on_page_error: Option<FailurePolicy>,

    /// Job identifier for logs and JSON output (default: random UUID)
    #[arg(long)]
    job_id: Option<String>,

    /// Print a JSON job response with base64 pages instead of writing files
    #[arg(long)]
    json: bool,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,

    /// Input PDF file
    input: Option<PathBuf>,
}

fn main() {
    // Initialize logging subsystem
    if let Err(e) = pagemark::logging::init_subscriber() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });

    if args.test {
        println!("Configuration OK");
        return;
    }

    let input = match &args.input {
        Some(input) => input.clone(),
        None => {
            eprintln!("No input PDF given");
            std::process::exit(2);
        }
    };

    if args.json {
        std::process::exit(print_job_response(&args, &config, &input));
    }

    if let Err(e) = write_pages(&args, &config, &input) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<Config, String> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(policy) = args.on_page_error {
        config.pipeline.on_page_error = policy;
    }
    config.validate()?;

    tracing::info!(
        config_file = %args.config.as_deref().map(|p| p.display().to_string()).unwrap_or_default(),
        dpi = config.render.dpi,
        format = %config.render.format,
        logo = %config.watermark.logo.display(),
        on_page_error = config.pipeline.on_page_error.as_str(),
        "Configuration loaded successfully"
    );
    Ok(config)
}

fn build_request(args: &Args, document: Vec<u8>) -> JobRequest {
    let mut request = JobRequest::new(document);
    if let Some(job_id) = &args.job_id {
        request.job_id = job_id.clone();
    }
    request.dpi = args.dpi;
    request.format = args.format.clone();
    request
}

fn bind_rasterizer(config: &Config) -> Result<PdfiumRasterizer, JobError> {
    PdfiumRasterizer::bind(config.render.pdfium_library_path.as_deref()).map_err(|e| match e {
        RenderError::Unavailable(message) => JobError::RasterizerUnavailable(message),
        other => JobError::RasterizerUnavailable(other.to_string()),
    })
}

/// Run the whole document as one job and print the JSON response.
///
/// Returns the process exit code.
fn print_job_response(args: &Args, config: &Config, input: &Path) -> i32 {
    let document = match std::fs::read(input) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("Failed to read {}: {}", input.display(), e);
            return 1;
        }
    };
    let request = build_request(args, document);

    let result = bind_and_run_job(|| bind_rasterizer(config), &request, &config.pipeline_options());

    let (json, code) = match result {
        Ok(response) => (serde_json::to_string_pretty(&response), 0),
        Err(e) => {
            tracing::error!(
                job_id = %request.job_id,
                error = %e,
                error_code = e.error_code(),
                "Job failed"
            );
            (serde_json::to_string_pretty(&e.to_response(&request.job_id)), 1)
        }
    };

    match json {
        Ok(json) => {
            println!("{}", json);
            code
        }
        Err(e) => {
            eprintln!("Failed to serialize response: {}", e);
            1
        }
    }
}

/// Stream pages to `page_{n}.{ext}` files as they are produced.
fn write_pages(args: &Args, config: &Config, input: &Path) -> anyhow::Result<()> {
    let document = std::fs::read(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let request = build_request(args, document);
    let options = request.resolve(&config.pipeline_options())?;

    let rasterizer = bind_rasterizer(config)?;
    let document = rasterizer
        .open(&request.document)
        .with_context(|| format!("Failed to open {}", input.display()))?;

    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            args.output_dir.display()
        )
    })?;

    let mut stream = process_document(document, options)?;
    let mut written = 0u32;
    for result in stream.by_ref() {
        let page = result?;
        let path = args.output_dir.join(format!(
            "page_{}.{}",
            page.page_number,
            page.format.extension()
        ));
        std::fs::write(&path, &page.data)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written += 1;

        tracing::info!(
            job_id = %request.job_id,
            page = page.page_number,
            path = %path.display(),
            size_bytes = page.size_bytes,
            "Page written"
        );
    }

    tracing::info!(
        job_id = %request.job_id,
        pages_written = written,
        skipped_pages = ?stream.skipped_pages(),
        "Document complete"
    );
    Ok(())
}
