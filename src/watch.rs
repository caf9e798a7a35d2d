//! # Typings Watcher
//!
//! Watches the source tree and regenerates declarations for style files that
//! are added or changed. Events are drained in short windows and deduplicated
//! per path, so within a batch each file is regenerated once; different files
//! regenerate in parallel.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rayon::prelude::*;

use crate::discovery::is_style_file;
use crate::error::WatchError;
use crate::typings::TypingsGenerator;

pub const BATCH_WINDOW: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Changed,
    Removed,
}

pub struct TypingsWatcher {
    // Dropping the watcher closes the channel.
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    root: PathBuf,
}

impl TypingsWatcher {
    /// Start watching `search_dir` recursively.
    pub fn new(search_dir: &Path) -> Result<Self, WatchError> {
        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = tx.send(res);
            },
            Config::default(),
        )
        .map_err(|source| WatchError {
            path: search_dir.to_path_buf(),
            source,
        })?;

        watcher
            .watch(search_dir, RecursiveMode::Recursive)
            .map_err(|source| WatchError {
                path: search_dir.to_path_buf(),
                source,
            })?;

        Ok(Self {
            _watcher: watcher,
            rx,
            root: search_dir.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Block until at least one event arrives, then drain for `window`.
    /// Returns `None` once the event source is gone.
    pub fn next_batch(&self, window: Duration) -> Option<Vec<(PathBuf, ChangeKind)>> {
        let mut events = Vec::new();
        let first = self.rx.recv().ok()?;
        events.push(first);

        loop {
            match self.rx.recv_timeout(window) {
                Ok(res) => events.push(res),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let events = events.into_iter().filter_map(|res| match res {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::error!("watch error under {}: {}", self.root.display(), e);
                None
            }
        });
        Some(collect_changes(events))
    }

    /// Regenerate typings for every batch until the process stops.
    pub fn run(self, generator: &TypingsGenerator) {
        tracing::info!("Watching {} for style changes", self.root.display());
        while let Some(changes) = self.next_batch(BATCH_WINDOW) {
            apply_changes(generator, changes);
        }
    }
}

/// Reduce raw events to one change per style file; the last event wins.
pub fn collect_changes(events: impl IntoIterator<Item = Event>) -> Vec<(PathBuf, ChangeKind)> {
    let mut order: Vec<PathBuf> = Vec::new();
    let mut latest: HashMap<PathBuf, ChangeKind> = HashMap::new();

    for event in events {
        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Added,
            EventKind::Modify(_) => ChangeKind::Changed,
            EventKind::Remove(_) => ChangeKind::Removed,
            _ => continue,
        };
        for path in event.paths {
            if !is_style_file(&path) {
                continue;
            }
            if latest.insert(path.clone(), kind).is_none() {
                order.push(path);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|path| latest.remove(&path).map(|kind| (path, kind)))
        .collect()
}

/// Regenerate added and changed files, forget removed ones.
pub fn apply_changes(generator: &TypingsGenerator, changes: Vec<(PathBuf, ChangeKind)>) {
    changes.par_iter().for_each(|(path, kind)| match kind {
        ChangeKind::Added | ChangeKind::Changed => {
            generator.generate_and_report(path, true);
        }
        ChangeKind::Removed => generator.forget(path),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, ModifyKind, RemoveKind};
    use std::fs;

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_collect_filters_and_dedupes() {
        let changes = collect_changes(vec![
            event(EventKind::Create(CreateKind::File), "/s/a.css"),
            event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), "/s/a.css"),
            event(EventKind::Create(CreateKind::File), "/s/a.css.d.ts"),
            event(EventKind::Modify(ModifyKind::Any), "/s/main.ts"),
            event(EventKind::Remove(RemoveKind::File), "/s/b.css"),
            event(EventKind::Access(notify::event::AccessKind::Any), "/s/c.css"),
        ]);
        assert_eq!(
            changes,
            vec![
                (PathBuf::from("/s/a.css"), ChangeKind::Changed),
                (PathBuf::from("/s/b.css"), ChangeKind::Removed),
            ]
        );
    }

    #[test]
    fn test_apply_regenerates_changed_files() {
        let dir = tempfile::tempdir().unwrap();
        let style = dir.path().join("card.css");
        fs::write(&style, ".card { }").unwrap();

        let generator = TypingsGenerator::new();
        apply_changes(&generator, vec![(style.clone(), ChangeKind::Added)]);
        let declaration = dir.path().join("card.css.d.ts");
        assert_eq!(
            fs::read_to_string(&declaration).unwrap(),
            "export const card: string;\n"
        );

        fs::write(&style, ".card { }\n.title { }").unwrap();
        apply_changes(&generator, vec![(style, ChangeKind::Changed)]);
        assert_eq!(
            fs::read_to_string(&declaration).unwrap(),
            "export const card: string;\nexport const title: string;\n"
        );
    }

    #[test]
    fn test_missing_file_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let generator = TypingsGenerator::new();
        apply_changes(
            &generator,
            vec![(dir.path().join("gone.css"), ChangeKind::Changed)],
        );
        assert!(!dir.path().join("gone.css.d.ts").exists());
    }
}
