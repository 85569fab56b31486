use anyhow::bail;
use caffeine::{Identity, KeepAwakeSwitch, NativeInhibitor};
use clap::Parser;
use colored::Colorize;
use std::{process, thread, time::Duration};
use sysinfo::System;

mod signal;

type Pid = u32;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(e) = run(Args::parse()) {
        eprintln!("{} {}", "error:".red().bold(), e);
        process::exit(1);
    }
}

/// Keep your computer awake until a certain process exits, or until interrupted.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// The process id to wait on. Sleep will be blocked until this process exits.
    #[arg(short = 'p', long = "pid", group = "pid group")]
    pid: Option<Pid>,
    /// Block sleep until the first process in the group has exited.
    #[arg(short = 'f', long = "first", num_args = 1.., value_name = "PID", group = "pid group")]
    pid_first: Option<Vec<Pid>>,
    /// Block sleep until all the given processes in the group have exited.
    #[arg(short = 'a', long = "all", num_args = 1.., value_name = "PID", group = "pid group")]
    pid_all: Option<Vec<Pid>>,
    /// Reason shown to the system for keeping it awake.
    #[arg(long = "reason")]
    reason: Option<String>,
}

/// What ends the sleep block.
#[derive(Debug, PartialEq, Eq)]
enum Until {
    Exit(Pid),
    FirstExit(Vec<Pid>),
    AllExit(Vec<Pid>),
    Interrupted,
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Exited(Option<Pid>),
    Interrupted,
}

impl Until {
    fn from_args(args: &Args) -> Self {
        if let Some(pid) = args.pid {
            Until::Exit(pid)
        } else if let Some(pids) = &args.pid_first {
            Until::FirstExit(pids.clone())
        } else if let Some(pids) = &args.pid_all {
            Until::AllExit(pids.clone())
        } else {
            Until::Interrupted
        }
    }

    /// Check the pids before blocking anything, to produce a better error message.
    fn validate(&self, processes: &mut Processes) -> anyhow::Result<()> {
        match self {
            Until::Exit(pid) => ensure_running(*pid, processes),
            Until::FirstExit(pids) => pids
                .iter()
                .try_for_each(|pid| ensure_running(*pid, processes)),
            // Only warn here as we're waiting for all of them to exit anyway.
            Until::AllExit(pids) => {
                for pid in pids {
                    if !processes.is_running(*pid) {
                        println!(
                            "{warn} No such process with pid {pid} was running. Continuing.",
                            warn = "warn:".yellow().bold()
                        );
                    }
                }
                Ok(())
            }
            Until::Interrupted => Ok(()),
        }
    }

    fn describe(&self) -> String {
        match self {
            Until::Interrupted => "indefinitely. Press CTRL-C to exit".into(),
            Until::Exit(pid) => format!("until pid {pid} exits"),
            Until::FirstExit(_) => "until the first process exits".into(),
            Until::AllExit(_) => "until all processes exit".into(),
        }
    }

    fn finished(&self, processes: &mut Processes) -> Option<Outcome> {
        match self {
            Until::Exit(pid) => (!processes.is_running(*pid)).then_some(Outcome::Exited(Some(*pid))),
            Until::FirstExit(pids) => pids
                .iter()
                .find(|pid| !processes.is_running(**pid))
                .map(|pid| Outcome::Exited(Some(*pid))),
            Until::AllExit(pids) => {
                (!pids.iter().any(|pid| processes.is_running(*pid))).then_some(Outcome::Exited(None))
            }
            Until::Interrupted => None,
        }
    }
}

fn report(outcome: &Outcome) {
    match outcome {
        Outcome::Interrupted => println!("Interrupted, letting the system sleep again."),
        Outcome::Exited(Some(pid)) => println!("Process with pid {pid} exited."),
        Outcome::Exited(None) => println!("All processes exited."),
    }
}

fn ensure_running(pid: Pid, processes: &mut Processes) -> anyhow::Result<()> {
    if !processes.is_running(pid) {
        bail!("No such process with pid {pid} was running");
    }
    Ok(())
}

/// Process liveness lookups.
struct Processes {
    system: System,
}

impl Processes {
    fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    fn is_running(&mut self, pid: Pid) -> bool {
        self.system.refresh_process(sysinfo::Pid::from_u32(pid))
    }
}

fn wait(until: &Until, processes: &mut Processes) -> Outcome {
    loop {
        if signal::interrupted() {
            return Outcome::Interrupted;
        }
        if let Some(outcome) = until.finished(processes) {
            return outcome;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let until = Until::from_args(&args);
    let mut processes = Processes::new();
    until.validate(&mut processes)?;

    signal::install_handlers();
    let identity = match args.reason {
        Some(reason) => Identity {
            reason,
            ..Identity::default()
        },
        None => Identity::default(),
    };
    let mut inhibitor = NativeInhibitor::native(identity);
    let mut switch = KeepAwakeSwitch::new();

    switch.set(true);
    if switch.sync(&mut inhibitor) != Some(true) {
        bail!(
            "could not block sleep on {} (run with RUST_LOG=debug for details)",
            inhibitor.platform_name()
        );
    }
    println!(
        "{} Sleep blocked {} [{}]",
        "active:".green().bold(),
        until.describe(),
        inhibitor.platform_name()
    );

    let outcome = wait(&until, &mut processes);
    report(&outcome);

    switch.set(false);
    if switch.sync(&mut inhibitor) == Some(false) || inhibitor.is_active() {
        println!(
            "{} sleep inhibition could not be confirmed as released",
            "warn:".yellow().bold()
        );
    }
    Ok(())
}
