//! Top header: CPU/RAM readouts and the state of the metrics feed.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme::{CPU_TEXT, FALLBACK, MUTED, RAM_TEXT};
use crate::mapper::format_value;
use crate::types::{Sample, SampleSource};

/// Latest live readouts plus the state of the feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Readout {
    pub cpu: Option<f32>,
    pub ram: Option<f32>,
    pub source: Option<SampleSource>,
    pub failure: Option<String>,
}

impl Readout {
    /// Live samples update the numbers; synthetic ones only flag the fallback.
    pub fn record(&mut self, sample: &Sample, failure: Option<String>) {
        if sample.source == SampleSource::Live {
            self.cpu = Some(sample.cpu);
            self.ram = Some(sample.ram);
        }
        self.source = Some(sample.source);
        self.failure = failure;
    }

    pub fn cpu_text(&self) -> String {
        self.cpu.map(format_value).unwrap_or_else(|| "--".into())
    }

    pub fn ram_text(&self) -> String {
        self.ram.map(format_value).unwrap_or_else(|| "--".into())
    }

    pub fn feed_text(&self) -> String {
        match (self.source, self.failure.as_deref()) {
            (None, _) => "waiting for metrics".into(),
            (Some(SampleSource::Live), _) => "live".into(),
            (Some(SampleSource::Synthetic), Some(why)) => format!("synthetic ({why})"),
            (Some(SampleSource::Synthetic), None) => "synthetic".into(),
        }
    }
}

pub fn draw_header(f: &mut ratatui::Frame<'_>, area: Rect, r: &Readout) {
    let bold = Modifier::BOLD;
    let feed_style = match r.source {
        Some(SampleSource::Synthetic) => Style::default().fg(FALLBACK),
        _ => Style::default().fg(MUTED),
    };
    let line = Line::from(vec![
        Span::styled("rackviz | ", Style::default().fg(MUTED)),
        Span::styled("CPU: ", Style::default().fg(CPU_TEXT)),
        Span::styled(r.cpu_text(), Style::default().fg(CPU_TEXT).add_modifier(bold)),
        Span::raw("  "),
        Span::styled("RAM: ", Style::default().fg(RAM_TEXT)),
        Span::styled(r.ram_text(), Style::default().fg(RAM_TEXT).add_modifier(bold)),
        Span::styled(format!("  | feed: {}", r.feed_text()), feed_style),
        Span::styled("  (press 'q' to quit)", Style::default().fg(MUTED)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_samples_leave_numbers_alone() {
        let mut r = Readout::default();
        assert_eq!(r.cpu_text(), "--");
        r.record(
            &Sample {
                cpu: 12.34,
                ram: 56.78,
                source: SampleSource::Live,
            },
            None,
        );
        assert_eq!(r.cpu_text(), "12.3%");
        assert_eq!(r.ram_text(), "56.8%");
        assert_eq!(r.feed_text(), "live");

        r.record(&Sample::synthetic(0.0), Some("connection refused".into()));
        assert_eq!(r.cpu_text(), "12.3%");
        assert_eq!(r.feed_text(), "synthetic (connection refused)");
    }
}
