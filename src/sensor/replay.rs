//! Playback of recorded scans.
//!
//! A recording is a JSON-lines file, one [`ScanFrame`] per line
//! (`{"points":[{"x":..,"y":..},..]}`). A reader thread parses the file and
//! hands frames over a bounded channel; the tick loop takes at most one frame
//! per tick, so playback is paced by the consumer.

use super::{Direction, ScanFrame, ScanParameters, ScanSource, SourceError};
use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Frames buffered ahead of the consumer.
const FRAME_QUEUE_DEPTH: usize = 4;

/// Plays a recorded session back as a live source.
pub struct ReplaySource {
    path: PathBuf,
    looping: bool,
    direction: Direction,
    params: ScanParameters,
    receiver: Option<Receiver<ScanFrame>>,
    worker: Option<JoinHandle<()>>,
    finished: bool,
}

impl ReplaySource {
    /// Open a recording and start playback.
    pub fn open(
        path: impl AsRef<Path>,
        looping: bool,
        direction: Direction,
        params: ScanParameters,
    ) -> Result<Self, SourceError> {
        let mut source = Self {
            path: path.as_ref().to_path_buf(),
            looping,
            direction,
            params,
            receiver: None,
            worker: None,
            finished: false,
        };
        source.start()?;
        Ok(source)
    }

    fn start(&mut self) -> Result<(), SourceError> {
        if self.receiver.is_some() {
            return Err(SourceError::AlreadyRunning);
        }

        let file = File::open(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;

        let (sender, receiver) = bounded(FRAME_QUEUE_DEPTH);
        let path = self.path.clone();
        let looping = self.looping;
        let worker = thread::Builder::new()
            .name("scan-replay".to_string())
            .spawn(move || read_recording(file, &path, looping, sender))
            .map_err(SourceError::Spawn)?;

        info!(path = ?self.path, looping, "replay started");
        self.receiver = Some(receiver);
        self.worker = Some(worker);
        self.finished = false;
        Ok(())
    }

    fn stop(&mut self) {
        // Dropping the receiver makes the reader's next send fail, which ends it.
        self.receiver = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("replay reader thread panicked");
            }
        }
    }
}

impl ScanSource for ReplaySource {
    fn update(&mut self) -> ScanFrame {
        let Some(receiver) = &self.receiver else {
            return ScanFrame::empty();
        };

        match receiver.try_recv() {
            Ok(frame) => self.params.apply(frame, self.direction),
            Err(TryRecvError::Empty) => {
                debug!("no recorded frame ready this tick");
                ScanFrame::empty()
            }
            Err(TryRecvError::Disconnected) => {
                if !self.finished {
                    info!(path = ?self.path, "replay finished");
                    self.finished = true;
                }
                ScanFrame::empty()
            }
        }
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    fn restart(&mut self, params: ScanParameters) -> Result<(), SourceError> {
        self.stop();
        self.params = params;
        self.start()
    }

    fn is_connected(&self) -> bool {
        self.receiver.is_some() && !self.finished
    }
}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Reader thread body: parse frames and push them to the consumer.
fn read_recording(mut file: File, path: &Path, looping: bool, sender: Sender<ScanFrame>) {
    loop {
        let mut delivered = 0usize;

        for (index, line) in BufReader::new(&file).lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(?path, error = %e, "failed to read recording");
                    return;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ScanFrame>(&line) {
                Ok(frame) => {
                    if sender.send(frame).is_err() {
                        return;
                    }
                    delivered += 1;
                }
                Err(e) => warn!(line = index + 1, error = %e, "skipping malformed frame"),
            }
        }

        if !looping || delivered == 0 {
            return;
        }
        if let Err(e) = file.seek(SeekFrom::Start(0)) {
            warn!(?path, error = %e, "failed to rewind recording");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::Point2D;
    use std::io::Write;
    use std::time::Duration;

    fn write_recording(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn next_frame(source: &mut ReplaySource) -> ScanFrame {
        for _ in 0..200 {
            let frame = source.update();
            if !frame.is_empty() {
                return frame;
            }
            thread::sleep(Duration::from_millis(5));
        }
        ScanFrame::empty()
    }

    #[test]
    fn test_replay_delivers_frames_in_order() {
        let file = write_recording(&[
            r#"{"points":[{"x":0.0,"y":100.0}]}"#,
            "",
            "not json",
            r#"{"points":[{"x":1.0,"y":200.0},{"x":2.0,"y":300.0}]}"#,
        ]);
        let mut source =
            ReplaySource::open(file.path(), false, Direction::Down, ScanParameters::default())
                .unwrap();

        let first = next_frame(&mut source);
        assert_eq!(first.points, vec![Point2D::new(0.0, 100.0)]);

        let second = next_frame(&mut source);
        assert_eq!(second.len(), 2);

        // Recording exhausted
        assert!(next_frame(&mut source).is_empty());
        assert!(!source.is_connected());
    }

    #[test]
    fn test_replay_loops() {
        let file = write_recording(&[r#"{"points":[{"x":5.0,"y":50.0}]}"#]);
        let mut source =
            ReplaySource::open(file.path(), true, Direction::Down, ScanParameters::default())
                .unwrap();

        for _ in 0..3 {
            assert_eq!(next_frame(&mut source).len(), 1);
        }
        assert!(source.is_connected());
    }

    #[test]
    fn test_restart_applies_new_step() {
        let file = write_recording(&[
            r#"{"points":[{"x":0.0,"y":100.0},{"x":1.0,"y":100.0},{"x":2.0,"y":100.0},{"x":3.0,"y":100.0}]}"#,
        ]);
        let mut source =
            ReplaySource::open(file.path(), true, Direction::Down, ScanParameters::default())
                .unwrap();
        assert_eq!(next_frame(&mut source).len(), 4);

        source
            .restart(ScanParameters {
                step: 2,
                ..ScanParameters::default()
            })
            .unwrap();
        assert_eq!(next_frame(&mut source).len(), 2);
    }

    #[test]
    fn test_missing_recording_is_an_error() {
        let result = ReplaySource::open(
            "/nonexistent/recording.jsonl",
            false,
            Direction::Down,
            ScanParameters::default(),
        );
        assert!(matches!(result, Err(SourceError::Io { .. })));
    }
}
