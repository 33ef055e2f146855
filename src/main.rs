//! trivm - CLI Entry Point
//!
//! Commands:
//! - `trivm run <program>` - Run a `.tim` image or `.asm` source
//! - `trivm asm <source>` - Assemble to a `.tim` image
//! - `trivm disasm <image>` - Disassemble a `.tim` image

use clap::{ArgAction, Parser, Subcommand};
use std::path::Path;
use std::process;
use tracing::Level;
use trivm::{assemble, load_image, save_image, Assembly, ImageFile, Memory, Register, Vm};

#[derive(Parser)]
#[command(name = "trivm")]
#[command(version)]
#[command(about = "A balanced ternary virtual machine and assembler")]
struct Cli {
    /// Raise the log level (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program for a bounded number of steps
    Run {
        /// Path to the .tim image or .asm source to execute
        program: String,
        /// Maximum number of instructions to execute
        #[arg(short, long, default_value = "10000")]
        max_steps: u64,
        /// Log every executed instruction
        #[arg(short, long)]
        trace: bool,
    },
    /// Assemble source to a .tim image
    Asm {
        /// Path to the source file
        source: String,
        /// Output image file (default: source with a .tim extension)
        #[arg(short, long)]
        output: Option<String>,
        /// Also write the debug info (labels, instruction map) as JSON
        #[arg(long)]
        debug_json: Option<String>,
    },
    /// Disassemble a .tim image to readable text
    Disasm {
        /// Path to the image file
        image: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let trace = matches!(cli.command, Commands::Run { trace: true, .. });
    init_tracing(log_level(cli.verbose, trace));

    match cli.command {
        Commands::Run { program, max_steps, trace } => {
            run_program(&program, max_steps, trace);
        }
        Commands::Asm { source, output, debug_json } => {
            assemble_file(&source, output, debug_json);
        }
        Commands::Disasm { image } => {
            disassemble_file(&image);
        }
    }
}

fn log_level(verbose: u8, trace: bool) -> Level {
    match verbose {
        0 if trace => Level::DEBUG,
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn init_tracing(level: Level) {
    let _ = tracing_subscriber::fmt()
        .without_time()
        .with_target(false)
        .with_max_level(level)
        .try_init();
}

fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("❌ {}: {}", context, err);
    process::exit(1);
}

fn assemble_source(path: &str) -> Assembly {
    let source = std::fs::read_to_string(path).unwrap_or_else(|e| fail("Failed to read file", e));
    let assembly = assemble(&source).unwrap_or_else(|e| fail("Assembly error", e));

    for warning in &assembly.debug.warnings {
        eprintln!("⚠️  {}", warning);
    }
    assembly
}

fn load_program(path: &str) -> Memory {
    if path.ends_with(".asm") {
        let assembly = assemble_source(path);
        println!("📝 Assembled {} words", assembly.debug.len);
        assembly.image
    } else {
        let image = load_image(path).unwrap_or_else(|e| fail("Failed to load image", e));
        println!("📂 Loaded {} words", image.len());
        image
            .to_memory()
            .unwrap_or_else(|e| fail("Failed to load program", e))
    }
}

fn run_program(path: &str, max_steps: u64, trace: bool) {
    println!("🔧 Running: {}", path);

    let mut vm = Vm::with_image(&load_program(path));

    let mut steps = 0u64;
    while steps < max_steps {
        let pc = vm.pc().to_i32();
        match vm.step() {
            Ok(instr) => {
                if trace {
                    tracing::debug!("{:05}: {}", pc, instr);
                }
                steps += 1;
            }
            Err(e) => fail(&format!("VM error at PC={}", pc), e),
        }
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Steps: {}", steps);
    println!("PC:    {} ({})", vm.pc(), vm.pc().to_i32());
    println!("Flag:  {}   Carry: {}", vm.regs.flag, vm.regs.carry);
    for reg in Register::ALL {
        let value = vm.register(reg);
        println!("{:<5}  {} ({})", reg.name(), value, value.to_i32());
    }
}

fn assemble_file(source_path: &str, output: Option<String>, debug_json: Option<String>) {
    let out_path = output.unwrap_or_else(|| {
        Path::new(source_path)
            .with_extension("tim")
            .to_string_lossy()
            .into_owned()
    });

    println!("📝 Assembling: {} → {}", source_path, out_path);

    let assembly = assemble_source(source_path);
    println!("✓ Assembled {} words", assembly.debug.len);

    let image = ImageFile::from_memory(&assembly.image, assembly.debug.len);
    if let Err(e) = save_image(&out_path, &image) {
        fail("Failed to save image", e);
    }
    println!("✓ Saved to {}", out_path);

    if let Some(json_path) = debug_json {
        let json = serde_json::to_string_pretty(&assembly.debug)
            .unwrap_or_else(|e| fail("Failed to serialize debug info", e));
        if let Err(e) = std::fs::write(&json_path, json) {
            fail("Failed to write debug info", e);
        }
        println!("✓ Debug info written to {}", json_path);
    }
}

fn disassemble_file(image_path: &str) {
    let image = load_image(image_path).unwrap_or_else(|e| fail("Failed to load image", e));
    print!("{}", trivm::disassemble(&image.words));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run_defaults() {
        let cli = Cli::parse_from(["trivm", "run", "prog.asm"]);
        match cli.command {
            Commands::Run { program, max_steps, trace } => {
                assert_eq!(program, "prog.asm");
                assert_eq!(max_steps, 10000);
                assert!(!trace);
            }
            _ => panic!("expected run"),
        }
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn parse_asm_with_outputs() {
        let cli = Cli::parse_from([
            "trivm", "-vv", "asm", "prog.asm", "-o", "out.tim", "--debug-json", "dbg.json",
        ]);
        match cli.command {
            Commands::Asm { source, output, debug_json } => {
                assert_eq!(source, "prog.asm");
                assert_eq!(output.as_deref(), Some("out.tim"));
                assert_eq!(debug_json.as_deref(), Some("dbg.json"));
            }
            _ => panic!("expected asm"),
        }
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn log_levels() {
        assert_eq!(log_level(0, false), Level::WARN);
        assert_eq!(log_level(0, true), Level::DEBUG);
        assert_eq!(log_level(2, false), Level::TRACE);
    }
}
