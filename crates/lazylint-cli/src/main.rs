use anyhow::{Context, Result, bail};
use clap::Parser;
use lazylint_config::Config;
use lazylint_engine::tokens::dump::dump_tree;
use lazylint_engine::{LazyContinuationLines, Rule, RuleConfig, Violation, apply_fixes, io, lint};
use std::path::{Path, PathBuf};
use std::process;

const EXIT_CLEAN: i32 = 0;
const EXIT_VIOLATIONS: i32 = 1;
const EXIT_ERROR: i32 = 2;

#[derive(Parser)]
#[command(name = "lazylint")]
#[command(about = "Find lazy continuation lines in Markdown list items")]
struct Cli {
    /// Markdown files or directories to lint
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Config file (defaults to the nearest .lazylint.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Apply fixes in place, then report what remains
    #[arg(long)]
    fix: bool,

    /// Accept `!!!` callout bodies at their own indentation
    #[arg(long)]
    admonitions: bool,

    /// Print each file's token tree instead of linting
    #[arg(long)]
    dump_tokens: bool,
}

struct Report {
    path: String,
    violation: Violation,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(EXIT_ERROR);
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let config = load_config(cli, &cwd)?;
    let files = collect_files(&cli.paths, &config, &cwd)?;

    if cli.dump_tokens {
        for file in &files {
            let text = io::read_file(file)?;
            let tree = lazylint_engine::parse_tokens(&text);
            println!("{}:", io::display_path(file, &cwd));
            print!("{}", dump_tree(&tree, tree.roots()));
        }
        return Ok(EXIT_CLEAN);
    }

    println!("Linting: {} file(s)", files.len());

    let setting = config.lazy_continuation_lines;
    let rule = LazyContinuationLines::new(RuleConfig {
        admonitions: cli.admonitions || setting.options().admonitions,
    });
    let name = rule.names()[0];

    let mut reports = Vec::new();
    if setting.is_enabled() {
        for file in &files {
            let violations = lint_file(file, &rule.config, cli.fix)?;
            let path = io::display_path(file, &cwd);
            reports.extend(violations.into_iter().map(|violation| Report {
                path: path.clone(),
                violation,
            }));
        }
    } else {
        log::info!("{name} is disabled by config");
    }

    reports.sort_by(|a, b| {
        a.path
            .cmp(&b.path)
            .then(a.violation.line_number.cmp(&b.violation.line_number))
            .then(a.violation.range.0.cmp(&b.violation.range.0))
    });

    for report in &reports {
        eprintln!(
            "{}:{}:{} {} {} [{}]",
            report.path,
            report.violation.line_number,
            report.violation.range.0,
            name,
            rule.description(),
            report.violation.detail
        );
    }

    println!("Summary: {} error(s)", reports.len());

    Ok(if reports.is_empty() {
        EXIT_CLEAN
    } else {
        EXIT_VIOLATIONS
    })
}

fn load_config(cli: &Cli, cwd: &Path) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => match Config::load_from_path(path)? {
            Some(config) => Some(config),
            None => bail!("Config file not found: {}", path.display()),
        },
        None => Config::discover(cwd)?,
    };
    Ok(config.unwrap_or_default())
}

fn collect_files(paths: &[PathBuf], config: &Config, cwd: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths.iter().map(|path| cwd.join(path)) {
        if path.is_dir() {
            files.extend(io::scan_markdown_files(&path)?);
        } else if path.exists() {
            files.push(path);
        } else {
            bail!("No such file or directory: {}", path.display());
        }
    }

    files.retain(|file| {
        let ignored = config.is_ignored(file);
        if ignored {
            log::debug!("skipping ignored file {}", file.display());
        }
        !ignored
    });
    files.sort();
    files.dedup();
    Ok(files)
}

/// Lints one file, fixing it first when `fix` is set. Returns the violations
/// left in the file.
fn lint_file(file: &Path, config: &RuleConfig, fix: bool) -> Result<Vec<Violation>> {
    let text = io::read_file(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let violations = lint(&text, config);
    if !fix || violations.is_empty() {
        return Ok(violations);
    }

    let fixes: Vec<_> = violations.into_iter().map(|v| v.fix_info).collect();
    let fixed = apply_fixes(&text, &fixes);
    if fixed != text {
        io::write_file(file, &fixed)
            .with_context(|| format!("Failed to write {}", file.display()))?;
        log::info!("fixed {}", file.display());
    }
    Ok(lint(&fixed, config))
}
