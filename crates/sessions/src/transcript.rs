//! Append-only JSONL persistence for a session's event log.
//!
//! Each session key gets a `<sessionKey>.jsonl` file. Every appended event
//! is one JSON line; trimming rewrites the file to a new, shorter suffix
//! rather than mutating lines in place, matching the "never rewritten,
//! only replaced atomically" invariant on `Session`.

use std::path::{Path, PathBuf};

use agentrt_domain::error::{Error, Result};
use agentrt_domain::event::Event;
use agentrt_domain::trace::TraceEvent;

pub struct TranscriptWriter {
    base_dir: PathBuf,
}

impl TranscriptWriter {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
        }
    }

    fn path(&self, session_key: &str) -> PathBuf {
        self.base_dir.join(format!("{session_key}.jsonl"))
    }

    pub fn append(&self, session_key: &str, events: &[Event]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.base_dir).map_err(Error::Io)?;

        let mut buf = String::new();
        for event in events {
            buf.push_str(&serde_json::to_string(event)?);
            buf.push('\n');
        }

        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(session_key))
            .map_err(Error::Io)?;
        file.write_all(buf.as_bytes()).map_err(Error::Io)?;

        TraceEvent::TranscriptAppend {
            session_key: session_key.to_owned(),
            events: events.len(),
        }
        .emit();

        Ok(())
    }

    pub fn read(&self, session_key: &str) -> Result<Vec<Event>> {
        let path = self.path(session_key);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&path).map_err(Error::Io)?;
        let mut events = Vec::new();
        for line in raw.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Event>(line) {
                Ok(event) => events.push(event),
                Err(e) => {
                    tracing::warn!(session_key, error = %e, "skipping malformed event line");
                }
            }
        }
        Ok(events)
    }

    /// Atomically replace the transcript with the trimmed suffix: write to a
    /// temp file, then rename over the original so readers never observe a
    /// partially-written file.
    pub fn replace(&self, session_key: &str, events: &[Event]) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir).map_err(Error::Io)?;
        let path = self.path(session_key);
        let tmp_path = self.base_dir.join(format!("{session_key}.jsonl.tmp"));

        let mut buf = String::new();
        for event in events {
            buf.push_str(&serde_json::to_string(event)?);
            buf.push('\n');
        }
        std::fs::write(&tmp_path, buf).map_err(Error::Io)?;
        std::fs::rename(&tmp_path, &path).map_err(Error::Io)?;
        Ok(())
    }

    pub fn delete(&self, session_key: &str) -> Result<()> {
        let path = self.path(session_key);
        if path.exists() {
            std::fs::remove_file(path).map_err(Error::Io)?;
        }
        Ok(())
    }
}
