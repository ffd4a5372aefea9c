use arch::{AccessKind, Error, MemoryConfig, Width};
use clap::Parser;
use color_print::cprintln;

use emu::Machine;

#[derive(Parser, Debug)]
#[clap(
    name = "MIPS Address Probe",
    version = "v0.1.0",
    about = "Checks simulated MIPS loads and stores against the memory map"
)]
struct Args {
    /// Memory configuration file (YAML)
    #[arg(short, long)]
    config: Option<String>,

    /// Built-in memory configuration
    #[arg(short, long, default_value = "default")]
    preset: String,

    /// load or store
    #[arg(short, long, default_value = "load")]
    kind: AccessKind,

    /// Access width in bytes (1, 2, 4 or 8)
    #[arg(short, long, default_value_t = 4)]
    width: u32,

    /// Addresses, decimal or 0x-prefixed hex
    addrs: Vec<String>,
}

fn parse_addr(s: &str) -> Option<u32> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => MemoryConfig::load(path).map_err(|e| e.to_string()),
        None => MemoryConfig::preset(&args.preset)
            .ok_or_else(|| format!("Unknown memory configuration: `{}`", args.preset)),
    };
    let config = match config {
        Ok(cfg) => cfg,
        Err(e) => {
            cprintln!("<red,bold>error</>: {}", e);
            std::process::exit(1);
        }
    };
    let width = match Width::from_bytes(args.width) {
        Ok(w) => w,
        Err(e) => {
            cprintln!("<red,bold>error</>: {}", e);
            std::process::exit(1);
        }
    };

    let machine = Machine::new(&config);
    println!("+-----------------------------------------------+");
    println!("| {:<45} |", format!("{} {} ({})", args.kind, width, config.name));
    println!("+-----------------------------------------------+");

    let mut faults = 0;
    for raw in &args.addrs {
        let Some(addr) = parse_addr(raw) else {
            cprintln!("<yellow,bold>warn</>: Cannot parse `{}` as address", raw);
            continue;
        };
        match machine.probe(addr, args.kind, width) {
            Ok(addr) => cprintln!(" <g>ok</>    {}", arch::addr::hex(addr)),
            Err(Error::Address(e)) => {
                faults += 1;
                cprintln!(" <r,s>cause {}</> {}", e.kind().cause(), e);
            }
            Err(e) => cprintln!("<red,bold>error</>: {}", e),
        }
    }

    println!("=================================================");
    if faults > 0 {
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::parse_addr;

    #[test]
    fn addresses() {
        assert_eq!(parse_addr("0x10010000"), Some(0x1001_0000));
        assert_eq!(parse_addr("16"), Some(16));
        assert_eq!(parse_addr("0xzz"), None);
    }
}
