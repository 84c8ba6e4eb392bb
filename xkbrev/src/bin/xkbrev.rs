use anyhow::Context;
use clap::Parser;
use env_logger::{Builder, Env};
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use xkbrev::database::{DEFAULT_KEYSYMDEF, DEFAULT_RULES, DEFAULT_XKB_ROOT};
use xkbrev::{generate, layout_request, DatabasePaths, OutputFormat, XkbError};

// setxkbmap spells its long options with a single dash
const SETXKBMAP_OPTIONS: [&str; 5] = ["-model", "-layout", "-variant", "-option", "-rules"];

#[derive(Parser, Debug)]
#[command(author, version, about = "Convert an Xkb keyboard layout to other keymap formats", long_about = None)]
struct Args {
    /// Keyboard model (defaults to pc105)
    #[arg(long)]
    model: Option<String>,

    /// Layout name
    #[arg(long, default_value = "us")]
    layout: String,

    /// Layout variant
    #[arg(long)]
    variant: Option<String>,

    /// Layout option; may be repeated or comma-separated, an empty value clears
    #[arg(long = "option", value_name = "OPTION")]
    options: Vec<String>,

    /// Rules file name, or a path to one
    #[arg(long, default_value = DEFAULT_RULES)]
    rules: String,

    /// Output format (xrdp, dump)
    #[arg(long, value_name = "FORMAT")]
    generate: String,

    /// Output file, `-` for standard output
    #[arg(long, default_value = "-")]
    output: String,

    /// Root of the Xkb database
    #[arg(long, env = "XKB_CONFIG_ROOT", default_value = DEFAULT_XKB_ROOT)]
    xkb_root: PathBuf,

    /// Path to keysymdef.h
    #[arg(long, env = "XKBREV_KEYSYMDEF", default_value = DEFAULT_KEYSYMDEF)]
    keysymdef: PathBuf,

    /// Enable debug output
    #[arg(short, long)]
    verbose: bool,

    /// Only report warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn normalize_setxkbmap_args<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some(s)
                if SETXKBMAP_OPTIONS
                    .iter()
                    .any(|opt| s == *opt || s.strip_prefix(*opt).is_some_and(|rest| rest.starts_with('='))) =>
            {
                OsString::from(format!("-{}", s))
            }
            _ => arg,
        })
        .collect()
}

fn init_logging(args: &Args) {
    let level = if args.verbose {
        log::LevelFilter::Debug
    } else if args.quiet {
        log::LevelFilter::Warn
    } else {
        log::LevelFilter::Info
    };

    Builder::new()
        .format(|buf, record| writeln!(buf, "{}: {}", &record.level().as_str()[..1], record.args()))
        .filter_level(level)
        .parse_env(Env::default())
        .init();
}

fn run(args: &Args) -> anyhow::Result<()> {
    // Checked before the database is touched
    let format: OutputFormat = args.generate.parse()?;

    let request = layout_request(
        args.model.as_deref(),
        &args.layout,
        args.variant.as_deref(),
        &args.options,
    )?;
    let paths = DatabasePaths::new(&args.xkb_root, &args.keysymdef).with_rules(&args.rules);

    let document = generate(&paths, &request, format)?;

    if args.output == "-" {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&document).map_err(XkbError::from)?;
        stdout.flush().map_err(XkbError::from)?;
    } else {
        fs::write(&args.output, &document)
            .map_err(XkbError::from)
            .with_context(|| format!("Cannot write {}", args.output))?;
        log::debug!("Wrote {} bytes to {}", document.len(), args.output);
    }

    Ok(())
}

fn main() {
    let args = Args::parse_from(normalize_setxkbmap_args(std::env::args_os()));
    init_logging(&args);

    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        let code = e.downcast_ref::<XkbError>().map_or(1, XkbError::exit_code);
        std::process::exit(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let args = normalize_setxkbmap_args(args.iter().map(OsString::from));
        Args::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_setxkbmap_style_args() {
        let args = parse(&[
            "xkbrev",
            "-model",
            "pc104",
            "-layout",
            "us",
            "-variant=dvp",
            "-option",
            "ctrl:nocaps",
            "-option",
            "",
            "--generate=xrdp",
        ]);
        assert_eq!(args.model.as_deref(), Some("pc104"));
        assert_eq!(args.layout, "us");
        assert_eq!(args.variant.as_deref(), Some("dvp"));
        assert_eq!(args.options, vec!["ctrl:nocaps", ""]);
        assert_eq!(args.generate, "xrdp");
        assert_eq!(args.output, "-");
    }

    #[test]
    fn test_short_flags_untouched() {
        let args = parse(&["xkbrev", "-v", "--layout", "de", "--generate", "dump"]);
        assert!(args.verbose);
        assert_eq!(args.layout, "de");
    }

    #[test]
    fn test_generate_required() {
        let args = normalize_setxkbmap_args(["xkbrev", "-layout", "us"].iter().map(OsString::from));
        assert!(Args::try_parse_from(args).is_err());
    }
}
