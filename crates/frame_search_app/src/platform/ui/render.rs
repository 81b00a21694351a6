use std::io::{self, Write};

use frame_search_core::{
    AppViewModel, DisplayState, FrameDownload, FrameItemView, SelectionView, Severity, StatusLine,
};

use super::input::HELP_TEXT;

const PROGRESS_BAR_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Alert,
    Selection,
    Upload,
    Search,
}

/// Text lines of each screen section for one view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    pub alert: Vec<String>,
    pub selection: Vec<String>,
    pub upload: Vec<String>,
    pub search: Vec<String>,
    notices: u64,
}

impl Frame {
    fn section(&self, section: Section) -> &[String] {
        match section {
            Section::Alert => &self.alert,
            Section::Selection => &self.selection,
            Section::Upload => &self.upload,
            Section::Search => &self.search,
        }
    }
}

const SECTIONS: [Section; 4] = [
    Section::Alert,
    Section::Selection,
    Section::Upload,
    Section::Search,
];

pub fn build_frame(view: &AppViewModel) -> Frame {
    Frame {
        alert: view
            .alert
            .iter()
            .map(|alert| format!("!! {alert}"))
            .collect(),
        selection: vec![selection_line(view)],
        upload: upload_lines(view),
        search: search_lines(view),
        notices: view.notices,
    }
}

fn selection_line(view: &AppViewModel) -> String {
    let title = if view.title.trim().is_empty() {
        "(no title)".to_string()
    } else {
        format!("\"{}\"", view.title)
    };
    match &view.selection {
        SelectionView::Empty => format!("Video: (none)  Title: {title}"),
        SelectionView::Probing { file_name } => {
            format!("Video: {file_name} (reading metadata...)  Title: {title}")
        }
        SelectionView::Ready {
            file_name,
            duration_secs,
        } => format!("Video: {file_name} ({duration_secs:.1}s)  Title: {title}"),
    }
}

fn upload_lines(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    if view.upload_progress > 0 {
        lines.push(format!("Upload {}", progress_bar(view.upload_progress)));
    }
    if let Some(status) = &view.upload_status {
        lines.push(status_line(status));
    }
    lines
}

pub fn progress_bar(percent: u8) -> String {
    let percent = percent.min(100);
    let filled = usize::from(percent) * PROGRESS_BAR_WIDTH / 100;
    format!(
        "[{}{}] {percent}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled)
    )
}

fn status_line(status: &StatusLine) -> String {
    let tag = match status.severity {
        Severity::Info => "[ok]",
        Severity::Error => "[error]",
    };
    format!("{tag} {}", status.text)
}

fn search_lines(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    if view.searching {
        lines.push(format!("Searching for \"{}\"...", view.query.trim()));
    }
    match &view.results {
        DisplayState::Items(items) => lines.extend(items.iter().map(item_line)),
        DisplayState::NoResults(message) => lines.push(message.clone()),
        DisplayState::Error(message) => lines.push(format!("[error] {message}")),
    }
    lines
}

fn item_line(item: &FrameItemView) -> String {
    let mut line = format!(
        "#{:<3} Similarity: {}  {}  {}",
        item.rank, item.similarity_text, item.frame, item.image_url
    );
    match &item.download {
        None => {}
        Some(FrameDownload::Pending) => line.push_str("  (saving...)"),
        Some(FrameDownload::Saved(path)) => {
            line.push_str(&format!("  -> {}", path.display()));
        }
        Some(FrameDownload::Failed(reason)) => {
            line.push_str(&format!("  (save failed: {reason})"));
        }
    }
    line
}

/// Prints views to a terminal, repeating only the sections that changed
/// since the previous frame.
pub struct TerminalRenderer<W: Write> {
    out: W,
    last: Option<Frame>,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, last: None }
    }

    pub fn render(&mut self, view: &AppViewModel) -> io::Result<()> {
        let frame = build_frame(view);
        let changed: Vec<Section> = match &self.last {
            None => SECTIONS.to_vec(),
            Some(last) => {
                let renotified = last.notices != frame.notices;
                SECTIONS
                    .into_iter()
                    .filter(|section| {
                        last.section(*section) != frame.section(*section)
                            || (renotified && matches!(section, Section::Alert | Section::Upload))
                    })
                    .collect()
            }
        };
        for section in changed {
            // An alert that went away needs no output.
            for line in frame.section(section) {
                writeln!(self.out, "{line}")?;
            }
        }
        self.out.flush()?;
        self.last = Some(frame);
        Ok(())
    }

    pub fn present_full(&mut self, view: &AppViewModel) -> io::Result<()> {
        self.last = None;
        writeln!(self.out, "Service: {}", view.service_url)?;
        self.render(view)
    }

    pub fn help(&mut self) -> io::Result<()> {
        writeln!(self.out, "{HELP_TEXT}")?;
        self.out.flush()
    }

    pub fn line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
