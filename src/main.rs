//! Bus Architecture Simulator - CLI Entry Point
//!
//! Commands:
//! - `busarch run <image>` - Run a program image until it halts
//! - `busarch disasm <image>` - List a program image

use busarch::cpu::{ConsoleTracer, Cpu, JsonTracer, NoTrace, TraceObserver, Word};
use busarch::{disassemble, load_image, MachineConfig};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "busarch")]
#[command(version = "0.1.0")]
#[command(about = "A register-transfer level simulator of a small bus-wired CPU")]
struct Cli {
    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the program image (one integer per line)
        image: PathBuf,
        /// Machine configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Stop after this many instructions
        #[arg(short, long)]
        max_cycles: Option<u64>,
        /// Print registers and buses around every instruction
        #[arg(short, long)]
        trace: bool,
        /// Print one JSON object per trace event
        #[arg(long, conflicts_with = "trace")]
        trace_json: bool,
        /// Print the final machine state as JSON
        #[arg(long)]
        dump_state: bool,
    },
    /// Disassemble a program image
    Disasm {
        /// Path to the program image
        image: PathBuf,
    },
}

struct RunOptions {
    config: Option<PathBuf>,
    max_cycles: Option<u64>,
    trace: bool,
    trace_json: bool,
    dump_state: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run { image, config, max_cycles, trace, trace_json, dump_state } => {
            let options = RunOptions { config, max_cycles, trace, trace_json, dump_state };
            run_program(&image, options);
        }
        Commands::Disasm { image } => {
            disassemble_file(&image);
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("❌ {}", message);
    std::process::exit(1);
}

fn load_words(path: &Path) -> Vec<Word> {
    match load_image(path) {
        Ok(words) => words,
        Err(e) => fail(format!("Failed to load image: {}", e)),
    }
}

fn run_program(path: &Path, options: RunOptions) {
    let mut config = match &options.config {
        Some(file) => MachineConfig::load(file).unwrap_or_else(|e| fail(e)),
        None => MachineConfig::default(),
    };
    if options.max_cycles.is_some() {
        config.max_cycles = options.max_cycles;
    }
    let mut cpu = Cpu::with_config(config).unwrap_or_else(|e| fail(e));

    let quiet = options.trace_json || options.dump_state;
    if !quiet {
        println!("🔧 Running: {}", path.display());
    }

    let words = load_words(path);
    if let Err(e) = cpu.load_program(&words) {
        fail(format!("Failed to load program: {}", e));
    }
    if !quiet {
        println!("📂 Loaded {} cells", words.len());
        println!();
        println!("━━━ Execution ━━━");
    }

    let limit = cpu.config().max_cycles;
    let stdout = std::io::stdout();
    let mut observer: Box<dyn TraceObserver> = if options.trace {
        Box::new(ConsoleTracer::new(stdout.lock()))
    } else if options.trace_json {
        Box::new(JsonTracer::new(stdout.lock()))
    } else {
        Box::new(NoTrace)
    };

    let result = cpu.run_with(observer.as_mut(), limit);
    drop(observer);

    if let Err(e) = result {
        print_result(&cpu, options.dump_state);
        fail(format!("CPU error: {}", e));
    }
    print_result(&cpu, options.dump_state);

    if cpu.is_running() {
        if let Some(max) = limit {
            eprintln!();
            eprintln!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", max);
        }
    }
}

fn print_result(cpu: &Cpu, dump_state: bool) {
    if dump_state {
        match serde_json::to_string_pretty(cpu) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(format!("Failed to serialize state: {}", e)),
        }
        return;
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Cycles: {}", cpu.cycles);
    println!("State: {:?}", cpu.state);
    for register in cpu.dp.registers.iter() {
        println!("{:<6} {}", format!("{}:", register.name()), register.value());
    }
    let buses = cpu.buses();
    println!("Buses: external={} internal_a={} internal_b={}", buses.external, buses.internal_a, buses.internal_b);
}

fn disassemble_file(path: &Path) {
    println!("📖 Disassembling: {}", path.display());
    println!();

    let words = load_words(path);
    println!("{}", disassemble(&words));
}
