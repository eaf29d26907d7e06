use clap::{Parser, Subcommand};
use gallery_ingest::gallery::{Gallery, ProductImages};
use gallery_ingest::validate::{ValidationPolicy, partition};
use gallery_ingest::{candidates, config, ingest, output};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gallery-ingest")]
#[command(about = "Validate, compress and upload product images into an ordered gallery")]
#[command(long_about = "\
Validate, compress and upload product images into an ordered gallery

A product is a JSON file. Its gallery lives in the `images` array; the first
entry is the primary (listing) image and is mirrored into `image` for older
readers. Records that only have `image` are read as a one-image gallery.

Pipeline, per file:

  validate   size and type policy (rejected files are reported, not uploaded)
  compress   fit within max dimension, re-encode to the byte budget
             (on any problem the original is uploaded instead)
  upload     unsigned multipart POST to the asset host
  merge      new URLs are appended in the order the files were given

Credentials come from the config file or from CLOUDINARY_CLOUD_NAME and
CLOUDINARY_UPLOAD_PRESET. Set RUST_LOG=debug for detailed logs.

Run 'gallery-ingest gen-config' to generate a documented gallery-ingest.toml.")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Config file (missing file means stock defaults)
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Where to write the updated product record.
#[derive(clap::Args, Clone)]
struct OutputArgs {
    /// Write the updated product here instead of overwriting the input
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Upload images and append them to a product's gallery
    Ingest {
        /// Product JSON file
        product: PathBuf,
        /// Image files or directories, in gallery order
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Remove one image from a product's gallery by 1-based position
    Remove {
        product: PathBuf,
        /// Position as shown in the gallery listing (001 is the primary)
        position: usize,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Rewrite a legacy single-image product in the gallery shape
    Normalize {
        product: PathBuf,
        #[command(flatten)]
        out: OutputArgs,
    },
    /// Validate files against the policy without compressing or uploading
    Check {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print a stock gallery-ingest.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Ingest {
            product,
            paths,
            out,
        } => {
            let config = config::load_config(&cli.config)?;
            init_thread_pool(&config.processing);

            let mut record = read_product(&product)?;
            let current = Gallery::normalize(&ProductImages::from_product(&record)?);
            let policy = ValidationPolicy::from_config(&config.validation);
            let files = candidates::collect_candidates(&paths, &policy)?;

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_ingest_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = ingest::ingest(&config, &current, files, Some(&tx));
            drop(tx);
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let outcome = result?;

            println!();
            output::print_ingest_summary(&outcome);
            if outcome.uploaded > 0 {
                write_gallery(&mut record, &outcome.gallery, out.output.as_deref().unwrap_or(&product))?;
            }
            output::print_gallery(&outcome.gallery, &config.gallery.placeholder_image);
        }
        Command::Remove {
            product,
            position,
            out,
        } => {
            let config = config::load_config(&cli.config)?;
            let mut record = read_product(&product)?;
            let current = Gallery::normalize(&ProductImages::from_product(&record)?);
            let index = position
                .checked_sub(1)
                .ok_or("positions start at 1")?;
            let next = current.remove_at(index)?;
            write_gallery(&mut record, &next, out.output.as_deref().unwrap_or(&product))?;
            output::print_gallery(&next, &config.gallery.placeholder_image);
        }
        Command::Normalize { product, out } => {
            let config = config::load_config(&cli.config)?;
            let mut record = read_product(&product)?;
            let images = ProductImages::from_product(&record)?;
            let gallery = Gallery::normalize(&images);
            if images.is_normalized() && out.output.is_none() {
                println!("{}: already normalized", product.display());
            } else {
                write_gallery(&mut record, &gallery, out.output.as_deref().unwrap_or(&product))?;
            }
            output::print_gallery(&gallery, &config.gallery.placeholder_image);
        }
        Command::Check { paths } => {
            let config = config::load_config(&cli.config)?;
            let policy = ValidationPolicy::from_config(&config.validation);
            let files = candidates::collect_candidates(&paths, &policy)?;
            let split = partition(files, &policy);
            output::print_check_output(&split);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr so stdout stays the command's output. `RUST_LOG` overrides
/// the default `warn` level.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn read_product(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let record: Value = serde_json::from_str(&content)?;
    if !record.is_object() {
        return Err(format!("{}: product record must be a JSON object", path.display()).into());
    }
    Ok(record)
}

fn write_gallery(
    record: &mut Value,
    gallery: &Gallery,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let fields = record
        .as_object_mut()
        .ok_or("product record must be a JSON object")?;
    gallery.to_record().write_into(fields);
    let json = serde_json::to_string_pretty(record)?;
    std::fs::write(path, json + "\n")?;
    tracing::info!(path = %path.display(), images = gallery.len(), "product updated");
    Ok(())
}
