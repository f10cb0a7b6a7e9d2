///
/// vela CLI - run the builtin fast paths from the command line
///
/// - vela lower <text>: String.prototype.toLowerCase
/// - vela format <items>...: Intl.ListFormat.prototype.format / formatToParts
/// - vela match <pattern> <subject>: compile and execute a pattern
///

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vela_std_core::{ListKind, ListStyle, Value, VelaArray, VelaString};
use velac::{read_parts, read_string, Engine, VelaConfig};

#[derive(Parser)]
#[command(name = "vela")]
#[command(author, version, about = "vela builtin fast paths", long_about = None)]
struct Cli {
    /// Path to a vela.toml configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lowercase a string
    Lower {
        text: String,

        /// Store the input as a two-byte string
        #[arg(long)]
        wide: bool,
    },

    /// Format a list of items
    Format {
        /// Requested locale
        #[arg(long)]
        locale: Option<String>,

        /// conjunction, disjunction or unit
        #[arg(long = "type", default_value = "conjunction")]
        kind: ListKind,

        /// long, short or narrow
        #[arg(long, default_value = "long")]
        style: ListStyle,

        /// Print the parts as JSON instead of the joined string
        #[arg(long)]
        parts: bool,

        items: Vec<String>,
    },

    /// Match a pattern against a subject
    Match {
        pattern: String,
        subject: String,

        #[arg(long, default_value = "")]
        flags: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => VelaConfig::load(path).unwrap_or_else(|e| fail(e)),
        None => VelaConfig::default(),
    };
    init_tracing(&config);

    match cli.command {
        Commands::Lower { text, wide } => lower(config, &text, wide),
        Commands::Format { locale, kind, style, parts, items } => {
            format_list(config, locale.as_deref(), kind, style, parts, &items)
        }
        Commands::Match { pattern, subject, flags } => match_pattern(config, &pattern, &subject, &flags),
    }
}

fn init_tracing(config: &VelaConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.filter));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();
}

fn fail(error: impl std::fmt::Display) -> ! {
    eprintln!("error: {}", error);
    process::exit(1);
}

fn engine(config: VelaConfig) -> Engine {
    Engine::new(config).unwrap_or_else(|e| fail(e))
}

fn lower(config: VelaConfig, text: &str, wide: bool) {
    let mut engine = engine(config);
    let input = if wide {
        VelaString::two_byte(&text.encode_utf16().collect::<Vec<_>>())
    } else {
        VelaString::new(text)
    };
    let result = engine.to_lower_case(input.value()).unwrap_or_else(|e| fail(e));
    println!("{}", read_string(&result).unwrap_or_default());
}

fn format_list(
    config: VelaConfig,
    locale: Option<&str>,
    kind: ListKind,
    style: ListStyle,
    parts: bool,
    items: &[String],
) {
    let mut engine = engine(config);
    let list_format = engine.list_format(locale, kind, style).unwrap_or_else(|e| fail(e));
    let list = VelaArray::from_values(items.iter().map(|s| VelaString::new(s)));
    if parts {
        let result = engine
            .format_to_parts(list_format.value(), &[list.value()])
            .unwrap_or_else(|e| fail(e));
        let parts = read_parts(&result).unwrap_or_default();
        match serde_json::to_string_pretty(&parts) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(e),
        }
    } else {
        let result = engine.format(list_format.value(), &[list.value()]).unwrap_or_else(|e| fail(e));
        println!("{}", read_string(&result).unwrap_or_default());
    }
}

fn match_pattern(config: VelaConfig, pattern: &str, subject: &str, flags: &str) {
    let engine = engine(config);
    let re = engine.compile_pattern(pattern, flags).unwrap_or_else(|e| fail(e));
    let re_value: Value = re.value();
    let Some(cell) = vela_std_regexp::pattern_object(&re_value) else {
        fail("pattern object has the wrong heap tag")
    };
    let subject = VelaString::new(subject);
    let Some(subject) = subject.as_string() else {
        fail("subject is not a string")
    };
    let found = cell.borrow_mut().exec(subject).unwrap_or_else(|e| fail(e));
    let captures: Vec<Option<[usize; 2]>> = found
        .map(|m| m.captures.iter().map(|c| c.as_ref().map(|r| [r.start, r.end])).collect())
        .unwrap_or_default();
    match serde_json::to_string(&captures) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(e),
    }
}
