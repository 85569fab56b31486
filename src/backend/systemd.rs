use std::io::ErrorKind;
use std::process::{Child, Command, Stdio};

use log::{debug, info};

use super::session::IdleHelper;
use super::Identity;
use crate::InhibitError;

const PROGRAM: &str = "systemd-inhibit";

/// Falls back to `systemd-inhibit` holding an idle lock around `sleep infinity`.
#[derive(Debug, Default)]
pub struct SystemdInhibit {
    children: Vec<Child>,
}

impl SystemdInhibit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command(identity: &Identity) -> Command {
        let mut cmd = Command::new(PROGRAM);
        cmd.arg("--what=idle")
            .arg(format!("--who={}", identity.app_name))
            .arg(format!("--why={}", identity.reason))
            .arg("--mode=block")
            .args(["sleep", "infinity"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }

    /// `pkill -f` pattern matching helpers launched for `identity`, including ones
    /// left behind by an earlier run. The app name is matched literally and in
    /// full, up to the space before `--why`.
    pub fn kill_pattern(identity: &Identity) -> String {
        format!("{PROGRAM}.*--who={} ", escape_regex(&identity.app_name))
    }
}

/// Backslash every character that is special in a POSIX extended regex.
fn escape_regex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if r"\.^$|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl IdleHelper for SystemdInhibit {
    fn spawn(&mut self, identity: &Identity) -> Result<(), InhibitError> {
        let child = Self::command(identity)
            .spawn()
            .map_err(|source| InhibitError::Spawn {
                program: PROGRAM,
                source,
            })?;
        info!("launched {PROGRAM} (pid {})", child.id());
        self.children.push(child);
        Ok(())
    }

    fn terminate(&mut self, identity: &Identity) {
        match Command::new("pkill")
            .arg("-f")
            .arg(Self::kill_pattern(identity))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) => debug!("pkill exited with {status}"),
            Err(e) => debug!("could not run pkill: {e}"),
        }
        for mut child in self.children.drain(..) {
            match child.kill() {
                Ok(()) => {}
                // Already exited
                Err(e) if e.kind() == ErrorKind::InvalidInput => {}
                Err(e) => debug!("failed to kill {PROGRAM} (pid {}): {e}", child.id()),
            }
            if let Err(e) = child.wait() {
                debug!("failed to reap {PROGRAM} (pid {}): {e}", child.id());
            }
        }
    }
}
