use chrono::Local;
use clap::{Parser, Subcommand};
use detecta::analyzing::StepStatus;
use detecta::report::{self, AnalysisReport};
use detecta::upload::file::has_accepted_extension;
use detecta::upload::UploadStatus;
use detecta::{dashboard, FileSpec, Flow, FlowError, Route, Settings};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "detecta")]
#[command(author, version, about = "Walk through uploading, analyzing and reviewing documents for AI-generated content")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Settings file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Seed for the simulated progress (default: random)
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Log state transitions
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload files, run the analysis and show the report in the terminal
    Simulate {
        /// Files or directories to upload (optional in GUI mode)
        paths: Vec<PathBuf>,

        /// Launch GUI file picker
        #[arg(long)]
        gui: bool,

        /// Output report file (.html, .json, .csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for auto-generated reports
        #[arg(long, default_value = "detecta-reports")]
        report_dir: PathBuf,

        /// Don't auto-generate an HTML report
        #[arg(long)]
        no_report: bool,

        /// Don't prompt to open report
        #[arg(long)]
        no_open: bool,

        /// Run on simulated time only, without waiting between ticks
        #[arg(long)]
        instant: bool,

        /// Only show the summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// Start the web UI
    Serve {
        /// Port to listen on (default: 3001)
        #[arg(short, long)]
        port: Option<u16>,

        /// Don't open a browser
        #[arg(long)]
        no_open: bool,
    },

    /// Print the sample analysis report
    Report {
        /// Also write it to a file (.html, .json, .csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List previously analyzed documents
    Dashboard {
        /// Only show documents whose name contains this text
        #[arg(short, long, default_value = "")]
        search: String,
    },
}

struct SimulateOpts {
    paths: Vec<PathBuf>,
    gui: bool,
    output: Option<PathBuf>,
    report_dir: PathBuf,
    no_report: bool,
    no_open: bool,
    instant: bool,
    quiet: bool,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    let mut settings = match Settings::load(args.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to load settings: {}", e);
            std::process::exit(1);
        }
    };
    if args.seed.is_some() {
        settings.seed = args.seed;
    }

    // With the GUI feature, no subcommand means "pick files and simulate",
    // so double-clicking the binary does something useful.
    let command = match args.command {
        Some(cmd) => cmd,
        None if cfg!(feature = "gui") => Command::Simulate {
            paths: vec![],
            gui: true,
            output: None,
            report_dir: PathBuf::from("detecta-reports"),
            no_report: false,
            no_open: false,
            instant: false,
            quiet: false,
        },
        None => {
            eprintln!("Usage: detecta <COMMAND>");
            eprintln!("Run 'detecta --help' for more options.");
            eprintln!("Note: GUI mode not available in this build.");
            std::process::exit(1);
        }
    };

    match command {
        Command::Simulate {
            paths,
            gui,
            output,
            report_dir,
            no_report,
            no_open,
            instant,
            quiet,
        } => {
            let opts = SimulateOpts {
                paths,
                gui,
                output,
                report_dir,
                no_report,
                no_open,
                instant,
                quiet,
            };
            if let Err(e) = simulate(&settings, opts) {
                eprintln!("\x1b[31mError:\x1b[0m {}", e);
                std::process::exit(1);
            }
        }
        Command::Serve { port, no_open } => {
            if let Some(port) = port {
                settings.serve.port = port;
            }
            if no_open {
                settings.serve.open_browser = false;
            }
            if let Err(e) = detecta::serve::start(&settings) {
                eprintln!("Server error: {}", e);
                std::process::exit(1);
            }
        }
        Command::Report { output } => {
            let report = report::sample_report();
            print_report(&report, false);
            if let Some(path) = output {
                if let Err(e) = report::generate(&path, &report) {
                    eprintln!("Failed to write report: {}", e);
                    std::process::exit(1);
                }
                eprintln!("\n\x1b[32mReport saved: {}\x1b[0m", path.display());
            }
        }
        Command::Dashboard { search } => print_dashboard(&search),
    }
}

fn simulate(settings: &Settings, opts: SimulateOpts) -> Result<(), FlowError> {
    #[cfg(feature = "gui")]
    let paths = if opts.gui || opts.paths.is_empty() {
        match pick_files_gui() {
            Some(p) => p,
            None => {
                eprintln!("No files selected.");
                return Ok(());
            }
        }
    } else {
        opts.paths.clone()
    };

    #[cfg(not(feature = "gui"))]
    let paths = if opts.paths.is_empty() {
        eprintln!("Usage: detecta simulate <PATH>...");
        eprintln!("Note: GUI mode not available in this build.");
        std::process::exit(1);
    } else {
        opts.paths.clone()
    };

    let files = collect_files(&paths);
    if files.is_empty() {
        eprintln!("No documents found (supported: pdf, docx)");
        std::process::exit(1);
    }

    let specs = files
        .iter()
        .map(FileSpec::from_path)
        .collect::<io::Result<Vec<_>>>()?;

    if !opts.quiet {
        eprintln!("\x1b[1mdetecta - AI Content Detection\x1b[0m");
        eprintln!("{}", "─".repeat(70));
        eprintln!("Found {} document(s)\n", specs.len());
    }

    let mut flow = Flow::new(settings.upload.clone(), settings.analyzing.clone(), settings.seed);
    flow.navigate(Route::Upload)?;
    flow.enqueue(specs)?;

    run_uploads(&mut flow, settings, &opts)?;

    if let Err(e) = flow.analyze() {
        if e.is_notice() {
            eprintln!("\n\x1b[33m{}\x1b[0m", e);
            std::process::exit(1);
        }
        return Err(e);
    }

    let route = run_sequencer(&mut flow, &opts)?;
    let report = match route {
        Route::Analysis { id } => report::find_report(&id)
            .ok_or_else(|| FlowError::InvalidState(format!("no report {}", id)))?,
        other => return Err(FlowError::InvalidState(format!("ended on {}", other))),
    };

    print_report(&report, opts.quiet);

    let report_path = if let Some(ref output) = opts.output {
        Some(output.clone())
    } else if !opts.no_report {
        std::fs::create_dir_all(&opts.report_dir)?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("detecta_report_{}.html", timestamp);
        Some(opts.report_dir.join(filename))
    } else {
        None
    };

    if let Some(ref output_path) = report_path {
        report::generate(output_path, &report)?;
        if !opts.quiet {
            eprintln!("\n\x1b[32mReport saved: {}\x1b[0m", output_path.display());
        }
        if !opts.no_open {
            offer_to_open(output_path, opts.gui, opts.quiet);
        }
    }

    if !opts.quiet {
        eprintln!("\n\x1b[90mAnalysis complete.\x1b[0m");
    }
    Ok(())
}

fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(
                WalkDir::new(path)
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file() && has_accepted_extension(e.path()))
                    .map(|e| e.path().to_path_buf()),
            );
        } else {
            // Named files go through validation even with the wrong extension
            files.push(path.clone());
        }
    }
    files
}

/// Tick the upload screen until every file has finished or failed, with one
/// bar per file.
fn run_uploads(flow: &mut Flow, settings: &Settings, opts: &SimulateOpts) -> Result<(), FlowError> {
    let tick = Duration::from_millis(settings.upload.tick_ms.max(1));
    let multi = MultiProgress::new();
    if opts.quiet {
        multi.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");

    let mut bars = HashMap::new();
    for f in flow.tracker()?.files() {
        match f.status {
            UploadStatus::Error => {
                if !opts.quiet {
                    let reason = f.error.as_deref().unwrap_or_default();
                    eprintln!("\x1b[31m✗ {}\x1b[0m  {}", f.file.name, reason);
                }
            }
            _ => {
                let pb = multi.add(ProgressBar::new(100));
                pb.set_style(style.clone());
                pb.set_message(format!("{} ({})", f.file.name, f.file.size_label()));
                bars.insert(f.id.clone(), pb);
            }
        }
    }

    loop {
        let tracker = flow.tracker()?;
        for f in tracker.files() {
            if let Some(pb) = bars.get(&f.id) {
                pb.set_position(f.progress as u64);
                if f.status == UploadStatus::Complete && !pb.is_finished() {
                    pb.finish();
                }
            }
        }
        if tracker.is_settled() {
            break;
        }
        pace(tick, opts.instant);
        flow.advance(tick);
    }

    if !opts.quiet {
        eprintln!("\n{}\n", flow.tracker()?.summary_line());
    }
    Ok(())
}

/// Tick the analyzing screen until it navigates away.
fn run_sequencer(flow: &mut Flow, opts: &SimulateOpts) -> Result<Route, FlowError> {
    let seq = flow.sequencer()?;
    let tick = seq.config().progress_period().max(Duration::from_millis(1));
    let headline = seq.headline();

    let pb = if opts.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(100)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    pb.set_prefix(headline);

    let mut announced = 0;
    loop {
        pace(tick, opts.instant);
        if let Some(route) = flow.advance(tick) {
            pb.finish_and_clear();
            return Ok(route);
        }

        let seq = flow.sequencer()?;
        pb.set_position(seq.progress() as u64);
        pb.set_message(seq.phase().to_string());

        let done = seq
            .steps()
            .iter()
            .take_while(|s| s.status == StepStatus::Complete)
            .count();
        for step in &seq.steps()[announced..done] {
            pb.println(format!("  \x1b[32m✓\x1b[0m {}", step.label));
        }
        announced = done;
    }
}

fn pace(tick: Duration, instant: bool) {
    if !instant {
        std::thread::sleep(tick);
    }
}

fn print_report(report: &AnalysisReport, quiet: bool) {
    let reset = "\x1b[0m";
    let doc = &report.document;

    println!(
        "\x1b[1m{}\x1b[0m  {} pages, {} words, {} images",
        doc.name, doc.pages, doc.words, doc.images
    );
    println!("{}", "─".repeat(70));

    for (label, score, sev) in [
        ("Text", report.text_score, report.text_severity()),
        ("Images", report.image_score, report.image_severity()),
    ] {
        println!("{:<8}{}{:>3}%  {}{}", label, sev.ansi(), score, sev.label(), reset);
    }

    if quiet {
        return;
    }

    println!("\n\x1b[1mKey Findings:\x1b[0m");
    for finding in &report.findings {
        println!("  • {}", finding);
    }

    println!("\n\x1b[1mText Sections:\x1b[0m");
    for s in &report.sections {
        let sev = s.severity();
        println!(
            "{}{:<10}{} {:>3}%  p.{:<3} {}",
            sev.ansi(),
            format!("[{}]", sev),
            reset,
            s.ai_score,
            s.page,
            truncate(&s.content, 48)
        );
    }

    println!("\n\x1b[1mImages:\x1b[0m");
    for img in &report.images {
        let sev = img.severity();
        println!(
            "{}{:<10}{} {:>3}%  p.{:<3} {:<20} {}",
            sev.ansi(),
            format!("[{}]", sev),
            reset,
            img.ai_score,
            img.page,
            img.name,
            img.generator.as_deref().unwrap_or("-")
        );
    }

    let summary = report.summary();
    eprintln!("\n{}", "─".repeat(70));
    eprintln!("\x1b[1mSummary:\x1b[0m");
    eprintln!("  \x1b[31m✗ High:\x1b[0m      {}", summary.high);
    eprintln!("  \x1b[33m? Moderate:\x1b[0m  {}", summary.moderate);
    eprintln!("  \x1b[32m✓ Low:\x1b[0m       {}", summary.low);
}

fn print_dashboard(search: &str) {
    let view = dashboard::view(search);
    let stats = &view.stats;

    println!(
        "Total: {}  Completed: {}  Processing: {}  High risk: {}",
        stats.total, stats.completed, stats.processing, stats.high_risk
    );
    println!();

    if view.documents.is_empty() {
        println!("No documents match \"{}\".", search);
        return;
    }

    println!(
        "{:<4} {:<28} {:<11} {:>5} {:>7} {:<10}",
        "ID", "NAME", "STATUS", "TEXT", "IMAGES", "UPLOADED"
    );
    println!("{}", "-".repeat(70));
    for d in &view.documents {
        let color = d.worst_severity().ansi();
        println!(
            "{:<4} {:<28} {:<11} {}{:>4}%{} {}{:>6}%{} {}",
            d.id,
            truncate(&d.name, 28),
            d.status.to_string(),
            detecta::severity(d.text_score).ansi(),
            d.text_score,
            "\x1b[0m",
            color,
            d.image_score,
            "\x1b[0m",
            d.upload_date.format("%Y-%m-%d")
        );
    }
}

fn offer_to_open(path: &Path, gui: bool, quiet: bool) {
    if gui {
        // In GUI mode, auto-open the report (no prompt)
        let _ = open::that(path);
        return;
    }
    if quiet {
        return;
    }

    eprint!("\nOpen report in browser? [Y/n] ");
    io::stderr().flush().ok();

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_ok() {
        let input = input.trim().to_lowercase();
        if input.is_empty() || input == "y" || input == "yes" {
            if let Err(e) = open::that(path) {
                eprintln!("Failed to open report: {}", e);
            }
        }
    }
}

#[cfg(feature = "gui")]
fn pick_files_gui() -> Option<Vec<PathBuf>> {
    rfd::FileDialog::new()
        .set_title("Select documents to analyze")
        .add_filter("Documents", &["pdf", "docx"])
        .pick_files()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
