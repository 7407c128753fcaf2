//! Reports the accelerators the server would see.
//!
//! Exits 0 when acceleration is available, 1 otherwise.

use std::env;
use std::process::ExitCode;

use todo_ai_server::{logging, probe, Config};

const BYTES_PER_MIB: u64 = 1024 * 1024;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("gpu-check {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init("warn");

    let snapshot = probe::probe_system(&config.gpu);

    println!("GPU check ({})", config.gpu.smi_binary);
    println!("{}", "=".repeat(50));

    if !snapshot.accelerated() {
        println!("GPU acceleration not available");
        println!("Consider using CPU-only models or cloud GPU instances");
        return ExitCode::FAILURE;
    }

    println!("Devices: {}", snapshot.device_count());
    for (index, (name, memory)) in snapshot
        .device_names()
        .iter()
        .zip(snapshot.device_memory())
        .enumerate()
    {
        println!(
            "  [{}] {}: {} MiB total, {} MiB reserved, {} MiB allocated",
            index,
            name,
            memory.total_bytes / BYTES_PER_MIB,
            memory.reserved_bytes / BYTES_PER_MIB,
            memory.allocated_bytes / BYTES_PER_MIB
        );
    }

    println!("{}", "=".repeat(50));
    println!("GPU acceleration is available");
    ExitCode::SUCCESS
}
