mod msg;

use arch::{Directive, Error, MemoryConfig};
use asm::{layout, Stmt};
use color_print::cprintln;
use msg::Msg;

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    #[clap(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, clap::Subcommand)]
enum Cmd {
    /// List assembler directives
    Directives {
        /// Only directives starting with this prefix
        prefix: Option<String>,
    },

    /// Place a tokenized statement list into memory segments
    Layout {
        /// Memory configuration file (YAML)
        #[clap(short, long)]
        config: Option<String>,

        /// Built-in memory configuration
        #[clap(short, long, default_value = "default")]
        preset: String,

        /// Statement list (YAML)
        #[clap(default_value = "main.yaml")]
        input: String,
    },
}

fn main() {
    use clap::Parser;

    let args: Args = Args::parse();
    let ok = match args.cmd {
        Cmd::Directives { prefix } => directives(prefix),
        Cmd::Layout {
            config,
            preset,
            input,
        } => run_layout(config, &preset, &input),
    };
    if !ok {
        std::process::exit(1);
    }
}

fn directives(prefix: Option<String>) -> bool {
    let list = match &prefix {
        Some(p) => Directive::prefix_match(&p.to_lowercase()),
        None => Directive::all().iter().collect(),
    };
    if list.is_empty() {
        Msg::Warn(format!("No directive matches `{}`", prefix.unwrap_or_default())).print();
    }
    for d in list {
        cprintln!("<green>{:<11}</> {}", d.name(), d.description());
    }
    true
}

fn load_config(config: Option<String>, preset: &str) -> Result<MemoryConfig, String> {
    match config {
        Some(path) => MemoryConfig::load(&path).map_err(|e| e.to_string()),
        None => MemoryConfig::preset(preset)
            .ok_or_else(|| format!("Unknown memory configuration: `{}`", preset)),
    }
}

fn run_layout(config: Option<String>, preset: &str, input: &str) -> bool {
    println!("MIPS Segment Layout");

    let config = match load_config(config, preset) {
        Ok(cfg) => cfg,
        Err(e) => {
            Msg::Error(e).print();
            return false;
        }
    };
    println!("  * config: {}", config.name);

    println!("  < {}", input);
    let stmts = match std::fs::read_to_string(input)
        .map_err(|e| Error::ConfigRead(input.to_string(), e))
        .and_then(|src| Stmt::parse_yaml(&src))
    {
        Ok(stmts) => stmts,
        Err(e) => {
            Msg::Error(e.to_string()).print();
            return false;
        }
    };

    let out = match layout(config, &stmts) {
        Ok(out) => out,
        Err((idx, e)) => {
            Msg::Error(e.to_string()).diag(input, idx, &stmts[idx].to_string());
            if let Error::AllocationOverflow { .. } = e {
                Msg::Note("Assembly of this unit was aborted".to_string()).print();
            }
            return false;
        }
    };

    for name in &out.redefined {
        Msg::Warn(format!("Re-defined label: `{}`", name)).print();
    }

    println!("-------------+-------+------+----------------------------------");
    for (name, item) in &out.symbols {
        cprintln!(
            " <c>0x{:08x}</> | {:<5} | {:>4} | {}",
            item.address,
            item.segment.to_string(),
            item.size,
            name
        );
    }
    println!("-------------+-------+------+----------------------------------");
    true
}
