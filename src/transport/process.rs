// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Subprocess transport: the child's stdout is read, its stdin is written.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::stream::StreamTransport;
use super::{Transport, TransportResult};
use crate::error::TransportError;

/// How long a child may take to exit after its stdin is closed.
const EXIT_GRACE: Duration = Duration::from_secs(2);

/// Transport to a spawned child process.
///
/// The child's stderr is inherited so its logs stay visible. The child is
/// killed if it outlives the transport.
pub struct ProcessTransport {
    io: StreamTransport<ChildStdout, ChildStdin>,
    child: Mutex<Child>,
}

impl ProcessTransport {
    /// Spawns `argv[0]` with the remaining arguments.
    pub fn spawn<S: AsRef<str>>(argv: &[S]) -> TransportResult<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| TransportError::Spawn("empty command line".to_string()))?;

        let mut child = Command::new(program.as_ref())
            .args(args.iter().map(AsRef::as_ref))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TransportError::Spawn(format!("{}: {e}", program.as_ref())))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::Spawn("child stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::Spawn("child stdout unavailable".to_string()))?;

        let peer = match child.id() {
            Some(pid) => format!("process:{} (pid {pid})", program.as_ref()),
            None => format!("process:{}", program.as_ref()),
        };
        debug!(%peer, "Spawned child process");

        Ok(Self {
            io: StreamTransport::new(stdout, stdin, peer),
            child: Mutex::new(child),
        })
    }
}

#[async_trait]
impl Transport for ProcessTransport {
    async fn send(&self, bytes: &[u8]) -> TransportResult<()> {
        self.io.send(bytes).await
    }

    async fn recv(&self) -> TransportResult<Option<Vec<u8>>> {
        self.io.recv().await
    }

    async fn close(&self) -> TransportResult<()> {
        self.io.close().await?;

        let mut child = self.child.lock().await;
        match tokio::time::timeout(EXIT_GRACE, child.wait()).await {
            Ok(Ok(status)) => debug!(peer = %self.io.peer(), %status, "Child exited"),
            Ok(Err(err)) => return Err(TransportError::Io(err)),
            Err(_) => {
                warn!(peer = %self.io.peer(), "Child did not exit after stdin closed, killing");
                child.kill().await.map_err(TransportError::Io)?;
            }
        }
        Ok(())
    }

    fn peer(&self) -> String {
        self.io.peer()
    }
}
