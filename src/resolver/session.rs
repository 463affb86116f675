use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tracing::{info, warn};

use crate::{
    graph::association_graph::AssociationGraph,
    resolver::{
        key_source::{InputToken, KeySource},
        view::{Prompt, SessionView},
    },
    store::resolution_store::ResolutionStore,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub resolved: usize,
    pub skipped: usize,
    pub total_ambiguous: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    Completed,
    Quit,
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub exit: SessionExit,
    pub total_resolved_entries: usize,
    pub progress: Progress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousEntry {
    pub word: String,
    pub candidates: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Confirm(usize),
    Skip,
    Quit,
    Interrupt,
}

#[derive(Debug)]
pub struct Presentation<'a> {
    entry: &'a AmbiguousEntry,
    cursor: usize,
}

impl<'a> Presentation<'a> {
    pub(crate) fn new(entry: &'a AmbiguousEntry) -> Self {
        Self { entry, cursor: 0 }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn prompt(&self, progress: Progress) -> Prompt<'a> {
        Prompt {
            word: &self.entry.word,
            candidates: &self.entry.candidates,
            cursor: self.cursor,
            progress,
        }
    }

    // None keeps the entry on screen
    pub fn apply(&mut self, token: InputToken) -> Option<Decision> {
        let count = self.entry.candidates.len();
        if count == 0 {
            return match token {
                InputToken::Char('q' | 'Q') | InputToken::Eof => Some(Decision::Quit),
                InputToken::Interrupt => Some(Decision::Interrupt),
                _ => Some(Decision::Skip),
            };
        }
        match token {
            InputToken::Up | InputToken::Char('k') => {
                self.cursor = (self.cursor + count - 1) % count;
                None
            }
            InputToken::Down | InputToken::Char('j') => {
                self.cursor = (self.cursor + 1) % count;
                None
            }
            InputToken::Enter => Some(Decision::Confirm(self.cursor)),
            InputToken::Char('s' | 'S') => Some(Decision::Skip),
            InputToken::Char('q' | 'Q') | InputToken::Eof => Some(Decision::Quit),
            InputToken::Interrupt => Some(Decision::Interrupt),
            InputToken::Char(c) => {
                if let Some(index) = c.to_digit(10).map(|d| d as usize) {
                    if (1..=count).contains(&index) {
                        self.cursor = index - 1;
                    }
                }
                None
            }
        }
    }
}

/// One review session over a reduced graph. The session owns the resolution
/// store and writes it to disk after every confirmed choice.
pub struct DisambiguationSession {
    graph: AssociationGraph,
    store: ResolutionStore,
    progress: Progress,
    cancel: Option<Arc<AtomicBool>>,
    bootstrapped: bool,
}

impl DisambiguationSession {
    pub fn new(graph: AssociationGraph, store: ResolutionStore) -> Self {
        Self {
            graph,
            store,
            progress: Progress::default(),
            cancel: None,
            bootstrapped: false,
        }
    }

    /// Raising the flag stops the session at its next check point, after
    /// any save in progress has finished.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn store(&self) -> &ResolutionStore {
        &self.store
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    pub fn bootstrap(&mut self, view: &mut dyn SessionView) -> usize {
        self.bootstrapped = true;
        let mut inserted = 0;
        for (word, lemma) in self.graph.unambiguous() {
            if self.store.get(word) != Some(lemma) {
                self.store.insert(word.to_string(), lemma.to_string());
                inserted += 1;
            }
        }
        info!("{} unambiguous words recorded without review", inserted);
        if inserted > 0 {
            self.persist(view);
        }
        inserted
    }

    pub fn ambiguous_entries(&self) -> Vec<AmbiguousEntry> {
        self.graph
            .ambiguous()
            .into_iter()
            .filter(|(word, _)| !self.store.contains(word))
            .map(|(word, candidates)| AmbiguousEntry {
                word: word.to_string(),
                candidates: candidates.into_iter().map(str::to_string).collect(),
            })
            .collect()
    }

    pub fn run<K: KeySource, V: SessionView>(
        &mut self,
        keys: &mut K,
        view: &mut V,
    ) -> SessionSummary {
        if !self.bootstrapped {
            self.bootstrap(view);
        }
        // fixed for the whole session, decisions made below do not reshape it
        let entries = self.ambiguous_entries();
        self.progress = Progress {
            resolved: 0,
            skipped: 0,
            total_ambiguous: entries.len(),
        };
        view.show_start(entries.len());

        let mut exit = SessionExit::Completed;
        for entry in &entries {
            if self.is_cancelled() {
                exit = SessionExit::Interrupted;
                break;
            }
            match self.present(entry, keys, view) {
                Decision::Confirm(index) => {
                    let lemma = &entry.candidates[index];
                    self.confirm(&entry.word, lemma, view);
                }
                Decision::Skip => {
                    self.progress.skipped += 1;
                    view.show_skipped(&entry.word);
                }
                Decision::Quit => {
                    exit = SessionExit::Quit;
                    break;
                }
                Decision::Interrupt => {
                    exit = SessionExit::Interrupted;
                    break;
                }
            }
        }

        let summary = SessionSummary {
            exit,
            total_resolved_entries: self.store.len(),
            progress: self.progress,
        };
        info!(
            "session ended ({:?}): {}/{} ambiguous entries resolved, {} skipped",
            summary.exit,
            summary.progress.resolved,
            summary.progress.total_ambiguous,
            summary.progress.skipped
        );
        view.show_summary(&summary);
        summary
    }

    fn present<K: KeySource, V: SessionView>(
        &self,
        entry: &AmbiguousEntry,
        keys: &mut K,
        view: &mut V,
    ) -> Decision {
        let mut presentation = Presentation::new(entry);
        loop {
            view.show_prompt(&presentation.prompt(self.progress));
            if self.is_cancelled() {
                return Decision::Interrupt;
            }
            if let Some(decision) = presentation.apply(keys.next_token()) {
                return decision;
            }
        }
    }

    fn confirm(&mut self, word: &str, lemma: &str, view: &mut dyn SessionView) {
        self.store.insert(word.to_string(), lemma.to_string());
        self.progress.resolved += 1;
        self.persist(view);
        view.show_resolved(word, lemma);
    }

    // A failed save leaves the in-memory store intact; the next successful
    // save writes everything.
    fn persist(&self, view: &mut dyn SessionView) {
        if let Err(e) = self.store.save() {
            warn!("{}", e);
            view.show_warning(&format!("{}; progress is kept in memory", e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::key_source::{InputToken::*, ScriptedKeySource};
    use std::path::Path;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingView {
        prompts: Vec<(String, usize)>,
        resolved: Vec<(String, String)>,
        skipped: Vec<String>,
        warnings: Vec<String>,
        summaries: Vec<SessionSummary>,
    }

    impl SessionView for RecordingView {
        fn show_start(&mut self, _total_ambiguous: usize) {}

        fn show_prompt(&mut self, prompt: &Prompt<'_>) {
            self.prompts.push((prompt.word.to_string(), prompt.cursor));
        }

        fn show_resolved(&mut self, word: &str, lemma: &str) {
            self.resolved.push((word.to_string(), lemma.to_string()));
        }

        fn show_skipped(&mut self, word: &str) {
            self.skipped.push(word.to_string());
        }

        fn show_warning(&mut self, message: &str) {
            self.warnings.push(message.to_string());
        }

        fn show_summary(&mut self, summary: &SessionSummary) {
            self.summaries.push(summary.clone());
        }
    }

    impl RecordingView {
        fn presented_words(&self) -> Vec<&str> {
            let mut words: Vec<&str> = self.prompts.iter().map(|(w, _)| w.as_str()).collect();
            words.dedup();
            words
        }
    }

    fn graph(pairs: &[(&str, &str)]) -> AssociationGraph {
        AssociationGraph::from_pairs(
            pairs
                .iter()
                .map(|(w, l)| (w.to_string(), l.to_string())),
        )
    }

    fn sample_graph() -> AssociationGraph {
        graph(&[
            ("baux", "bail"),
            ("chiens", "chien"),
            ("chiens", "chienne"),
            ("suis", "suivre"),
            ("suis", "être"),
            ("vers", "ver"),
            ("vers", "verre"),
            ("vers", "vers-là"),
        ])
    }

    fn store_in(dir: &Path) -> ResolutionStore {
        ResolutionStore::open(dir.join("fr_resolved.json")).0
    }

    fn entry(word: &str, candidates: &[&str]) -> AmbiguousEntry {
        AmbiguousEntry {
            word: word.to_string(),
            candidates: candidates.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_cursor_wraps_both_ways() {
        let entry = entry("vers", &["ver", "verre", "vers-là"]);
        let mut presentation = Presentation::new(&entry);
        assert_eq!(presentation.apply(Up), None);
        assert_eq!(presentation.cursor(), 2);
        assert_eq!(presentation.apply(Down), None);
        assert_eq!(presentation.cursor(), 0);
        presentation.apply(Char('j'));
        presentation.apply(Char('j'));
        presentation.apply(Char('j'));
        assert_eq!(presentation.cursor(), 0);
        presentation.apply(Char('k'));
        assert_eq!(presentation.apply(Enter), Some(Decision::Confirm(2)));
    }

    #[test]
    fn test_digits_jump_and_unknown_keys_are_ignored() {
        let entry = entry("chiens", &["chien", "chienne"]);
        let mut presentation = Presentation::new(&entry);
        assert_eq!(presentation.apply(Char('2')), None);
        assert_eq!(presentation.cursor(), 1);
        assert_eq!(presentation.apply(Char('9')), None);
        assert_eq!(presentation.apply(Char('0')), None);
        assert_eq!(presentation.apply(Char('x')), None);
        assert_eq!(presentation.cursor(), 1);
    }

    #[test]
    fn test_control_keys() {
        let entry = entry("chiens", &["chien", "chienne"]);
        let mut presentation = Presentation::new(&entry);
        assert_eq!(presentation.apply(Char('S')), Some(Decision::Skip));
        assert_eq!(presentation.apply(Char('q')), Some(Decision::Quit));
        assert_eq!(presentation.apply(Eof), Some(Decision::Quit));
        assert_eq!(presentation.apply(Interrupt), Some(Decision::Interrupt));
    }

    #[test]
    fn test_entry_without_candidates_is_skipped() {
        let entry = entry("vers", &[]);
        let mut presentation = Presentation::new(&entry);
        assert_eq!(presentation.apply(Up), Some(Decision::Skip));
        assert_eq!(presentation.apply(Char('j')), Some(Decision::Skip));
        assert_eq!(presentation.apply(Enter), Some(Decision::Skip));
        assert_eq!(presentation.apply(Char('q')), Some(Decision::Quit));
        assert_eq!(presentation.apply(Interrupt), Some(Decision::Interrupt));
    }

    #[test]
    fn test_unambiguous_words_are_resolved_without_review() {
        let dir = TempDir::new().unwrap();
        let mut session = DisambiguationSession::new(sample_graph(), store_in(dir.path()));
        let mut keys = ScriptedKeySource::new([Char('q')]);
        let mut view = RecordingView::default();

        session.run(&mut keys, &mut view);

        assert_eq!(session.store().get("baux"), Some("bail"));
        assert!(!view.presented_words().contains(&"baux"));
        // bootstrap results reach the disk even though nothing was confirmed
        let on_disk = ResolutionStore::load(&dir.path().join("fr_resolved.json")).unwrap();
        assert_eq!(on_disk.get("baux").map(String::as_str), Some("bail"));
    }

    #[test]
    fn test_full_session_in_word_order() {
        let dir = TempDir::new().unwrap();
        let mut session = DisambiguationSession::new(sample_graph(), store_in(dir.path()));
        let mut keys = ScriptedKeySource::new([Down, Enter, Enter, Up, Enter]);
        let mut view = RecordingView::default();

        let summary = session.run(&mut keys, &mut view);

        assert_eq!(view.presented_words(), vec!["chiens", "suis", "vers"]);
        assert_eq!(session.store().get("chiens"), Some("chienne"));
        assert_eq!(session.store().get("suis"), Some("suivre"));
        assert_eq!(session.store().get("vers"), Some("vers-là"));
        assert_eq!(summary.exit, SessionExit::Completed);
        assert_eq!(
            summary.progress,
            Progress {
                resolved: 3,
                skipped: 0,
                total_ambiguous: 3,
            }
        );
        assert_eq!(summary.total_resolved_entries, 4);
        assert_eq!(view.summaries, vec![summary]);
    }

    #[test]
    fn test_every_confirm_is_on_disk_immediately() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fr_resolved.json");
        let mut session = DisambiguationSession::new(sample_graph(), store_in(dir.path()));
        let mut keys = ScriptedKeySource::new([Enter, Interrupt]);
        let mut view = RecordingView::default();

        let summary = session.run(&mut keys, &mut view);
        assert_eq!(summary.exit, SessionExit::Interrupted);
        // the process dies here without any further save
        drop(session);

        let on_disk = ResolutionStore::load(&path).unwrap();
        assert_eq!(on_disk.get("chiens").map(String::as_str), Some("chien"));
        assert!(!on_disk.contains_key("suis"));
    }

    #[test]
    fn test_resume_skips_resolved_and_repeats_skipped() {
        let dir = TempDir::new().unwrap();

        let mut first = DisambiguationSession::new(sample_graph(), store_in(dir.path()));
        let mut keys = ScriptedKeySource::new([Char('s'), Enter, Interrupt]);
        let mut view = RecordingView::default();
        let summary = first.run(&mut keys, &mut view);
        assert_eq!(view.skipped, vec!["chiens"]);
        assert_eq!(summary.progress.resolved, 1);
        assert_eq!(summary.progress.skipped, 1);
        drop(first);

        let mut second = DisambiguationSession::new(sample_graph(), store_in(dir.path()));
        let remaining: Vec<String> = second
            .ambiguous_entries()
            .into_iter()
            .map(|entry| entry.word)
            .collect();
        assert_eq!(remaining, vec!["chiens", "vers"]);

        let mut keys = ScriptedKeySource::new([Enter, Enter]);
        let mut view = RecordingView::default();
        let summary = second.run(&mut keys, &mut view);
        assert_eq!(view.presented_words(), vec!["chiens", "vers"]);
        assert!(!view.presented_words().contains(&"suis"));
        assert_eq!(summary.exit, SessionExit::Completed);
        assert_eq!(summary.progress.total_ambiguous, 2);
        assert_eq!(second.store().get("suis"), Some("suivre"));
    }

    #[test]
    fn test_quit_stops_the_loop() {
        let dir = TempDir::new().unwrap();
        let mut session = DisambiguationSession::new(sample_graph(), store_in(dir.path()));
        let mut keys = ScriptedKeySource::new([Enter, Char('q'), Enter]);
        let mut view = RecordingView::default();

        let summary = session.run(&mut keys, &mut view);

        assert_eq!(summary.exit, SessionExit::Quit);
        assert_eq!(summary.progress.resolved, 1);
        assert_eq!(summary.progress.total_ambiguous, 3);
        assert_eq!(keys.remaining(), 1);
        assert!(!session.store().contains("suis"));
        assert_eq!(view.summaries.len(), 1);
    }

    #[test]
    fn test_cancel_flag_stops_before_next_word() {
        let dir = TempDir::new().unwrap();
        let flag = Arc::new(AtomicBool::new(true));
        let mut session = DisambiguationSession::new(sample_graph(), store_in(dir.path()))
            .with_cancel_flag(Arc::clone(&flag));
        let mut keys = ScriptedKeySource::new([Enter]);
        let mut view = RecordingView::default();

        let summary = session.run(&mut keys, &mut view);

        assert_eq!(summary.exit, SessionExit::Interrupted);
        assert!(view.prompts.is_empty());
        assert_eq!(keys.remaining(), 1);
        assert_eq!(session.store().get("baux"), Some("bail"));
        assert_eq!(view.summaries.len(), 1);
    }

    #[test]
    fn test_failed_save_is_reported_and_session_continues() {
        let dir = TempDir::new().unwrap();
        let store = ResolutionStore::empty(dir.path().join("missing").join("fr_resolved.json"));
        let mut session = DisambiguationSession::new(sample_graph(), store);
        let mut keys = ScriptedKeySource::new([Enter, Enter, Enter]);
        let mut view = RecordingView::default();

        let summary = session.run(&mut keys, &mut view);

        assert_eq!(summary.exit, SessionExit::Completed);
        assert_eq!(summary.progress.resolved, 3);
        // bootstrap plus one per confirm
        assert_eq!(view.warnings.len(), 4);
        assert_eq!(session.store().get("vers"), Some("ver"));
    }

    #[test]
    fn test_word_pointing_into_cycle_needs_review() {
        use crate::graph::reduction::{ReductionConfig, ReductionEngine};

        let dir = TempDir::new().unwrap();
        let raw = graph(&[
            ("chiens", "chien"),
            ("chien", "chienne"),
            ("chienne", "chien"),
        ]);
        let (reduced, _) = ReductionEngine::new(ReductionConfig::default()).reduce(raw);
        let mut session = DisambiguationSession::new(reduced, store_in(dir.path()));
        let mut keys = ScriptedKeySource::new([Char('2'), Enter]);
        let mut view = RecordingView::default();

        session.run(&mut keys, &mut view);

        assert_eq!(view.presented_words(), vec!["chiens"]);
        assert_eq!(session.store().get("chiens"), Some("chienne"));
        assert_eq!(session.store().get("chien"), Some("chienne"));
        assert_eq!(session.store().get("chienne"), Some("chien"));
    }

    #[test]
    fn test_nothing_to_review() {
        let dir = TempDir::new().unwrap();
        let mut session =
            DisambiguationSession::new(graph(&[("baux", "bail")]), store_in(dir.path()));
        let mut keys = ScriptedKeySource::default();
        let mut view = RecordingView::default();

        let summary = session.run(&mut keys, &mut view);

        assert_eq!(summary.exit, SessionExit::Completed);
        assert_eq!(summary.progress.total_ambiguous, 0);
        assert_eq!(summary.total_resolved_entries, 1);
    }
}
