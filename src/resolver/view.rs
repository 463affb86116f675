use std::io::{self, Write};

use crate::{
    graph::association_graph::GraphStatistics,
    resolver::session::{Progress, SessionExit, SessionSummary},
};

#[derive(Debug, Clone, Copy)]
pub struct Prompt<'a> {
    pub word: &'a str,
    pub candidates: &'a [String],
    pub cursor: usize,
    pub progress: Progress,
}

pub trait SessionView {
    fn show_start(&mut self, total_ambiguous: usize);
    fn show_prompt(&mut self, prompt: &Prompt<'_>);
    fn show_resolved(&mut self, word: &str, lemma: &str);
    fn show_skipped(&mut self, word: &str);
    fn show_warning(&mut self, message: &str);
    fn show_summary(&mut self, summary: &SessionSummary);
}

const RULE: &str = "============================================================";

pub struct TerminalView<W: Write> {
    out: W,
    clear_screen: bool,
}

impl TerminalView<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), true)
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W, clear_screen: bool) -> Self {
        Self { out, clear_screen }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn clear(&mut self) {
        if self.clear_screen {
            let _ = write!(self.out, "\x1b[2J\x1b[H");
        }
    }

    // the terminal is the reviewer's only channel; losing a frame is not
    // worth aborting a session over
    fn emit(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }
}

pub fn render_prompt(prompt: &Prompt<'_>) -> String {
    let mut text = String::new();
    text.push_str(RULE);
    text.push('\n');
    text.push_str(&format!(
        "LEMMA DISAMBIGUATION - Progress: {}/{}\n",
        prompt.progress.resolved, prompt.progress.total_ambiguous
    ));
    text.push_str(RULE);
    text.push_str("\n\n");
    text.push_str(&format!("Word: '{}'\n", prompt.word));
    text.push_str("Choose the correct lemma:\n\n");
    for (i, lemma) in prompt.candidates.iter().enumerate() {
        if i == prompt.cursor {
            text.push_str(&format!("  → \x1b[7m {}. {} \x1b[0m\n", i + 1, lemma));
        } else {
            text.push_str(&format!("    {}. {}\n", i + 1, lemma));
        }
    }
    text.push_str("\nControls:\n");
    text.push_str("  k/j or ↑/↓, then Return : Navigate\n");
    text.push_str("  1-9 : Jump to a lemma\n");
    text.push_str("  Enter (empty line) : Select\n");
    text.push_str("  's' : Skip\n");
    text.push_str("  'q' : Quit and save\n");
    text
}

pub fn render_summary(summary: &SessionSummary) -> String {
    let heading = match summary.exit {
        SessionExit::Completed => "DISAMBIGUATION COMPLETE",
        SessionExit::Quit => "DISAMBIGUATION STOPPED",
        SessionExit::Interrupted => "DISAMBIGUATION INTERRUPTED",
    };
    format!(
        "{RULE}\n{heading}\n{RULE}\nTotal resolved entries: {}\nAmbiguous entries processed: {}/{}\nSkipped: {}\n",
        summary.total_resolved_entries,
        summary.progress.resolved,
        summary.progress.total_ambiguous,
        summary.progress.skipped,
    )
}

pub fn render_statistics(stats: &GraphStatistics) -> String {
    let rule = "========================================";
    format!(
        "{rule}\nDATA STATISTICS\n{rule}\nTotal entries: {}\nUnambiguous: {}\nAmbiguous: {}\nAmbiguity rate: {:.1}%\n{rule}\n",
        stats.total,
        stats.unambiguous,
        stats.ambiguous,
        stats.ambiguity_rate(),
    )
}

impl<W: Write> SessionView for TerminalView<W> {
    fn show_start(&mut self, total_ambiguous: usize) {
        if total_ambiguous == 0 {
            self.emit("No ambiguous entries to resolve!\n");
        } else {
            self.emit(&format!(
                "Found {} ambiguous entries to resolve.\n",
                total_ambiguous
            ));
        }
    }

    fn show_prompt(&mut self, prompt: &Prompt<'_>) {
        self.clear();
        self.emit(&render_prompt(prompt));
    }

    fn show_resolved(&mut self, word: &str, lemma: &str) {
        self.clear();
        self.emit(&format!("✓ '{}' → '{}'\n", word, lemma));
    }

    fn show_skipped(&mut self, word: &str) {
        self.emit(&format!("Skipped '{}'\n", word));
    }

    fn show_warning(&mut self, message: &str) {
        self.emit(&format!("⚠ {}\n", message));
    }

    fn show_summary(&mut self, summary: &SessionSummary) {
        self.clear();
        self.emit(&render_summary(summary));
    }
}
