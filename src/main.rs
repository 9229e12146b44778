use bracketless::compiler::Lessc;
use bracketless::config::{self, CONFIG_FILENAME};
use bracketless::fs::LocalFs;
use bracketless::pipeline::{self, OutputTarget, Settings, SourceFile};
use bracketless::watch::{self, WatchOptions};
use bracketless::{output, scan};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Parser)]
#[command(name = "bracketless")]
#[command(about = "Compile LESS stylesheets to CSS")]
#[command(long_about = "\
Compile LESS stylesheets to CSS

LESS compilation is done by the lessc executable (npm install -g less).
bracketless decides where the CSS goes, post-processes it and reports
errors in plain words.

Output location:

  project/
  ├── less/site.less      → project/css/site.css  (css/ exists next to less/)
  └── styles/print.less   → project/styles/print.css

Post-processing (each step can be turned off in bracketless.toml):
  line endings removed → comments removed → whitespace collapsed
  and a one-line banner comment at the top of every written file.

Run 'bracketless gen-config' to generate a documented bracketless.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing = stock defaults)
    #[arg(long, default_value = CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a single .less file
    Compile {
        file: PathBuf,
        /// Write the CSS here instead of the resolved location
        #[arg(long, conflicts_with = "stdout")]
        output: Option<PathBuf>,
        /// Print the CSS instead of writing a file
        #[arg(long)]
        stdout: bool,
    },
    /// Compile every .less file under a directory
    Build {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Recompile .less files whenever they are saved
    Watch {
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Emit one JSON event per line
        #[arg(long)]
        json: bool,
        /// Compile everything once before waiting for changes
        #[arg(long)]
        initial: bool,
    },
    /// Print a stock bracketless.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Compile {
            file,
            output: output_path,
            stdout,
        } => {
            let config = config::load_config(&cli.config)?;
            let compiler = Lessc::from_config(&config.compiler);
            let settings = Settings::from_config(&config);
            let target = match (output_path, stdout) {
                (_, true) => OutputTarget::Discard,
                (Some(path), false) => OutputTarget::Path(path),
                (None, false) => OutputTarget::Resolve,
            };

            let source = SourceFile::new(&file);
            let result = pipeline::compile_file(&LocalFs, &compiler, &source, &target, &settings);
            match &result {
                Ok(compiled) if stdout => println!("{}", compiled.css),
                _ => output::print_compile_result(&file, &result, &std::env::current_dir()?),
            }
            if result.is_err() {
                std::process::exit(1);
            }
        }
        Command::Build { dir } => {
            let config = config::load_config(&cli.config)?;
            let compiler = Lessc::from_config(&config.compiler);
            let settings = Settings::from_config(&config);

            let sources = scan::discover_sources(&dir)?;
            let report = pipeline::compile_all(&LocalFs, &compiler, sources, &settings);
            output::print_batch_report(&report, &dir);
            if !report.is_success() {
                std::process::exit(1);
            }
        }
        Command::Watch { dir, json, initial } => {
            let config = config::load_config(&cli.config)?;

            let running = Arc::new(AtomicBool::new(true));
            let running_clone = running.clone();
            ctrlc::set_handler(move || {
                running_clone.store(false, Ordering::SeqCst);
            })?;

            let options = WatchOptions {
                root: dir.clone(),
                config_path: cli.config.clone(),
                initial_build: initial,
            };
            let base = std::fs::canonicalize(&dir).unwrap_or(dir);
            watch::watch(&LocalFs, &options, config, running, |event| {
                if json {
                    match event.to_json() {
                        Ok(line) => println!("{}", line),
                        Err(e) => tracing::error!(error = %e, "cannot serialize watch event"),
                    }
                } else {
                    output::print_watch_event(&event, &base);
                }
            })?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
