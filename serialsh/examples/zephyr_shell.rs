//! Zephyr shell example: synchronize with a board and run commands
//!
//! Connects to a Zephyr shell exported over TCP, waits for the prompt,
//! runs a few commands and optionally reboots the board.
//!
//! # Prerequisites
//!
//! A console reachable over TCP, for example:
//!
//! - QEMU: `west build -t run` with `-serial tcp::5555,server`
//! - A board on a serial port exported by ser2net
//!
//! # Usage
//!
//! ```bash
//! cargo run --example zephyr_shell -- --addr 127.0.0.1:5555
//! cargo run --example zephyr_shell -- --addr 127.0.0.1:5555 --reset
//! ```

use std::env;
use std::time::Duration;

use serialsh::transport::{StreamConfig, StreamConsole};
use serialsh::{CommandRunner, ResettableBootTarget, ShellDriverBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (set RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("Connecting to {}...", args.addr);
    let console = StreamConsole::connect(&args.addr, StreamConfig::default()).await?;

    let mut shell = ShellDriverBuilder::new(&args.prompt)
        .login_timeout(Duration::from_secs(args.login_timeout))
        .build(console)?;

    println!("Waiting for the shell...");
    shell.activate().await?;
    println!("Shell is ready ({})", shell.status());

    for command in ["kernel version", "kernel uptime", "device list"] {
        println!("\nExecuting: {}", command);
        println!("{}", "-".repeat(50));
        let result = shell.run(command).await?;
        if result.is_success() {
            println!("{}", result);
        } else {
            eprintln!("Command failed: {:?}", result.failure_message);
        }
        println!("{}", "-".repeat(50));
        println!("Command completed in {:?}", result.elapsed);
    }

    if args.reset {
        println!("\nRebooting...");
        shell.reset().await?;
        shell.activate().await?;
        let result = shell.run("kernel uptime").await?;
        println!("Back after reboot: {}", result);
    }

    shell.deactivate();
    println!("Done!");
    Ok(())
}

/// Simple argument parser (avoiding external dependencies)
struct Args {
    addr: String,
    prompt: String,
    login_timeout: u64,
    reset: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut addr = "127.0.0.1:5555".to_string();
        let mut prompt = "uart:~$ ".to_string();
        let mut login_timeout = 60u64;
        let mut reset = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--addr" | "-a" => {
                    i += 1;
                    if i < args.len() {
                        addr = args[i].clone();
                    }
                }
                "--prompt" | "-p" => {
                    i += 1;
                    if i < args.len() {
                        prompt = args[i].clone();
                    }
                }
                "--login-timeout" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        login_timeout = args[i].parse().unwrap_or(60);
                    }
                }
                "--reset" => reset = true,
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                }
            }
            i += 1;
        }

        Self {
            addr,
            prompt,
            login_timeout,
            reset,
        }
    }

    fn print_help() {
        println!(
            r#"serialsh zephyr_shell example

USAGE:
    cargo run --example zephyr_shell -- [OPTIONS]

OPTIONS:
    -a, --addr <ADDR>           Console address [default: 127.0.0.1:5555]
    -p, --prompt <PROMPT>       Shell prompt [default: "uart:~$ "]
    -t, --login-timeout <SECS>  Time allowed to find the prompt [default: 60]
    --reset                     Reboot the board and wait for it again
    --help                      Print this help message
"#
        );
    }
}
