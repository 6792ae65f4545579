use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use difference_matting::{default_output_path, AlphaCombine, MatteEngine, MatteOptions, MatteResult};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Combine {
    /// Mean of the three channel estimates
    Mean,
    /// Euclidean distance between the two renders
    Distance,
    /// Most transparent channel
    Min,
    /// Most opaque channel
    Max,
}

impl From<Combine> for AlphaCombine {
    fn from(c: Combine) -> Self {
        match c {
            Combine::Mean => Self::Mean,
            Combine::Distance => Self::Distance,
            Combine::Min => Self::Min,
            Combine::Max => Self::Max,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "difference-matte",
    about = "Recover a true alpha channel from white- and black-background renders",
    version,
    after_help = "Single pair:  difference-matte logo_white.png logo_black.png\n\
                  Directory:    difference-matte renders/ -o out/\n\n\
                  In directory mode, <stem>_white.<ext> is paired with <stem>_black.<ext>\n\
                  and written to <out>/<stem>_transparent.png."
)]
struct Cli {
    /// Render on a pure white background, or a directory of pairs
    white: PathBuf,

    /// Same subject rendered on a pure black background
    black: Option<PathBuf>,

    /// Output file or directory (default: {stem}_transparent.png)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// How per-channel alpha estimates are combined
    #[arg(short, long, value_enum, default_value = "mean")]
    combine: Combine,

    /// Alpha below which colour recovery is skipped (0.0-1.0)
    #[arg(long, default_value = "0.01")]
    min_alpha: f32,

    /// Reject pairs whose corners are not pure white / pure black
    #[arg(long)]
    verify_backgrounds: bool,

    /// Corner tolerance for --verify-backgrounds (0-255)
    #[arg(long, default_value = "20")]
    tolerance: u8,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("difference_matting={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if !(0.0..1.0).contains(&cli.min_alpha) {
        eprintln!("Error: --min-alpha must be in [0.0, 1.0)");
        process::exit(1);
    }

    let opts = MatteOptions {
        combine: cli.combine.into(),
        min_alpha: cli.min_alpha,
        verify_backgrounds: cli.verify_backgrounds,
        background_tolerance: cli.tolerance,
    };
    let engine = MatteEngine::new(opts);

    if !cli.white.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.white.display());
        process::exit(1);
    }

    let results = if cli.white.is_dir() {
        if cli.black.is_some() {
            eprintln!("Error: A black render cannot be given with a directory input");
            process::exit(1);
        }
        let Some(output_dir) = &cli.output else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: difference-matte <input_dir> -o <output_dir>");
            process::exit(1);
        };
        engine.process_directory(&cli.white, output_dir)
    } else {
        let Some(black) = &cli.black else {
            eprintln!("Error: A black-background render is required");
            eprintln!("Usage: difference-matte <white> <black> [-o <output>]");
            process::exit(1);
        };
        let output = cli
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&cli.white));
        vec![engine.process_pair(&cli.white, black, &output)]
    };

    if results.is_empty() {
        eprintln!("Error: No <stem>_white / <stem>_black pairs found");
        process::exit(1);
    }

    let mut success_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &cli);
        if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !cli.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &MatteResult, cli: &Cli) {
    if cli.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.success {
        let target = result
            .output
            .as_ref()
            .map_or_else(String::new, |p| format!(" -> {}", p.display()));
        eprintln!(
            "[OK] {filename}{target} ({:.0}% transparent)",
            result.transparent_fraction * 100.0
        );
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if cli.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
