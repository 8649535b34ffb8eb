use clap::{Parser, Subcommand};
use postmill::types::PostRecord;
use postmill::{
    POSTS_DIR, RECORDS_FILE, STATIC_DIR, TEMPLATES_DIR, assets, config, ingest, output, pages,
    record, search,
};
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "postmill")]
#[command(about = "Static site builder for markdown blogs")]
#[command(long_about = "\
Static site builder for markdown blogs

Posts are markdown files. The first '# ' line is the title, the first
'Date: YYYY-MM-DD' line is the date, the file name is the post id.

Content structure:

  content/
  ├── config.toml                  # Site config (optional)
  ├── posts/
  │   └── hello-world.md           # → public/p/hello-world.html
  ├── templates/                   # Optional; built-in defaults otherwise
  │   ├── post.html.template
  │   ├── index.html.template
  │   └── archive.html.template
  └── static/                      # Copied to the output root
      ├── css/style.css            # CSS/JS are minified
      └── js/search.js.source      # '.source' is dropped on copy

Stages pass posts as one record per line, so they compose:

  postmill ingest content/posts/*.md | postmill pages

Run 'postmill gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "public", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (record stream)
    #[arg(long, default_value = ".postmill-temp", global = true)]
    temp_dir: PathBuf,

    /// Log debug diagnostics to stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Where a stage reads its records from.
#[derive(clap::Args, Clone)]
struct RecordsArgs {
    /// Record file to read (stdin when omitted)
    #[arg(long)]
    records: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Remove the output directory and recreate its skeleton
    Clean,
    /// Copy static assets into the output, minifying CSS and JS
    Static,
    /// Convert markdown posts to records on stdout
    Ingest {
        /// Markdown files to ingest
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Render post, home and archive pages from records
    Pages(RecordsArgs),
    /// Build the client-side search index from records
    Search(RecordsArgs),
    /// Run the full pipeline: clean → static → ingest → pages → search
    Build,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Clean => {
            assets::clean_output(&cli.output)?;
            println!("Cleaned {}", cli.output.display());
        }
        Command::Static => {
            let site = config::load_config(&cli.source)?;
            let report =
                assets::copy_static(&cli.source.join(STATIC_DIR), &cli.output, &site.compression)?;
            output::print_static_output(&report, &cli.output);
        }
        Command::Ingest { files } => {
            let site = config::load_config(&cli.source)?;
            init_thread_pool(&site.processing);
            let ingested = ingest::ingest_files(&files);
            record::write_records(io::stdout().lock(), &ingested.records)?;
            if !ingested.is_complete() {
                return Err(failed_posts(&ingested).into());
            }
        }
        Command::Pages(args) => {
            let site = config::load_config(&cli.source)?;
            init_thread_pool(&site.processing);
            let posts = load_records(args.records.as_deref())?;
            let templates = pages::Templates::load(&cli.source.join(TEMPLATES_DIR))?;
            let report = pages::generate_pages(&posts, &templates, &site, &cli.output)?;
            output::print_pages_output(&report, &cli.output);
        }
        Command::Search(args) => {
            let site = config::load_config(&cli.source)?;
            init_thread_pool(&site.processing);
            let posts = load_records(args.records.as_deref())?;
            let report = search::generate_search(&posts, &cli.output, &site.compression)?;
            output::print_search_output(&report, &cli.output);
        }
        Command::Build => {
            let site = config::load_config(&cli.source)?;
            init_thread_pool(&site.processing);

            println!("==> Stage 1: Cleaning {}", cli.output.display());
            assets::clean_output(&cli.output)?;

            println!("==> Stage 2: Copying static assets");
            let report =
                assets::copy_static(&cli.source.join(STATIC_DIR), &cli.output, &site.compression)?;
            output::print_static_output(&report, &cli.output);

            println!("==> Stage 3: Ingesting posts");
            let ingested = ingest::ingest_dir(&cli.source.join(POSTS_DIR))?;
            output::print_ingest_output(&ingested);
            std::fs::create_dir_all(&cli.temp_dir)?;
            let records_path = cli.temp_dir.join(RECORDS_FILE);
            record::write_records(
                BufWriter::new(File::create(&records_path)?),
                &ingested.records,
            )?;

            println!("==> Stage 4: Generating pages");
            let posts = load_records(Some(records_path.as_path()))?;
            let templates = pages::Templates::load(&cli.source.join(TEMPLATES_DIR))?;
            let report = pages::generate_pages(&posts, &templates, &site, &cli.output)?;
            output::print_pages_output(&report, &cli.output);

            println!("==> Stage 5: Building search index");
            let report = search::generate_search(&posts, &cli.output, &site.compression)?;
            output::print_search_output(&report, &cli.output);

            if !ingested.is_complete() {
                return Err(failed_posts(&ingested).into());
            }
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Install the stderr diagnostics subscriber.
///
/// `RUST_LOG` is honoured unless `--verbose` is given; the default is `warn`.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Read records from a file, or from stdin when no file is given.
fn load_records(path: Option<&Path>) -> io::Result<Vec<PostRecord>> {
    match path {
        Some(path) => record::read_records(BufReader::new(File::open(path)?)),
        None => record::read_records(io::stdin().lock()),
    }
}

fn failed_posts(ingested: &ingest::Ingested) -> String {
    format!(
        "{} post(s) could not be ingested; the rest of the site was written",
        ingested.failures.len()
    )
}
