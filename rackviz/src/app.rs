//! App state and main loop: input handling, applying samples, resize rebuilds, and drawing.

use std::{
    io,
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    Terminal,
};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::VizConfig;
use crate::error::SurfaceError;
use crate::mapper;
use crate::poller::{spawn_poller, wall_clock_ms, MetricsSource, PollReport};
use crate::scene::builder::{build_data_center, SceneHandles};
use crate::scene::Scene;
use crate::types::Sample;
use crate::ui::header::{draw_header, Readout};
use crate::ui::scene_view::draw_scene;
use crate::viewport::{Bounds, ResizeDebouncer, Viewport, HEADER_ROWS};

/// Everything the render loop, the mapper and the resize handler share.
pub struct VizContext {
    pub scene: Scene,
    pub handles: SceneHandles,
    pub viewport: Viewport,
    pub readout: Readout,
    rng: StdRng,
}

impl VizContext {
    /// Build the scene and a surface for `bounds`. Fails only when the surface
    /// can't be created.
    pub fn new(cfg: &VizConfig, bounds: Bounds) -> Result<Self, SurfaceError> {
        let mut rng = StdRng::from_entropy();
        let (scene, handles) = build_data_center(&cfg.layout(), &mut rng);
        let target = scene.node(handles.assembly).transform.position;
        let viewport = Viewport::build(bounds, target)?;
        Ok(Self {
            scene,
            handles,
            viewport,
            readout: Readout::default(),
            rng,
        })
    }

    /// Feed one poll tick into the readout and the scene.
    pub fn apply_report(&mut self, report: &PollReport, now_ms: f64) {
        self.readout.record(&report.sample, report.failure.clone());
        self.apply_sample(&report.sample, now_ms);
    }

    pub fn apply_sample(&mut self, sample: &Sample, now_ms: f64) {
        mapper::apply(&mut self.scene, &self.handles, sample, now_ms, &mut self.rng);
    }

    /// Rebuild the viewport and let `resize` fit the terminal to it. If the
    /// terminal can't follow, the previous viewport is restored.
    pub fn resize_surface<F>(&mut self, bounds: Bounds, resize: F) -> Result<(), SurfaceError>
    where
        F: FnOnce(Rect) -> io::Result<()>,
    {
        let previous = self.viewport.clone();
        self.viewport.rebuild(bounds)?;
        if let Err(e) = resize(Rect::new(0, 0, bounds.width, bounds.height)) {
            self.viewport = previous;
            return Err(e.into());
        }
        Ok(())
    }

    pub fn draw(&self, f: &mut ratatui::Frame<'_>) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(HEADER_ROWS), Constraint::Min(1)])
            .split(f.area());
        draw_header(f, rows[0], &self.readout);
        draw_scene(f, rows[1], &self.scene, &self.viewport);
    }
}

pub struct App {
    cfg: VizConfig,
    debounce: ResizeDebouncer,
    should_quit: bool,
}

impl App {
    pub fn new(cfg: VizConfig) -> Self {
        Self {
            debounce: ResizeDebouncer::new(cfg.resize_quiet()),
            cfg,
            should_quit: false,
        }
    }

    pub async fn run(&mut self, source: MetricsSource) -> Result<(), Box<dyn std::error::Error>> {
        // Terminal setup
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let res = match surface_bounds(&terminal).and_then(|b| VizContext::new(&self.cfg, b)) {
            Ok(mut ctx) => {
                info!(url = %source.url(), "starting visualization");
                self.event_loop(&mut terminal, &mut ctx, source).await
            }
            Err(e) => {
                warn!(error = %e, "cannot initialize render surface");
                Err(e.into())
            }
        };

        // Teardown
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }

    async fn event_loop<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        ctx: &mut VizContext,
        source: MetricsSource,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let (tx, mut rx) = watch::channel::<Option<PollReport>>(None);
        let poller = spawn_poller(source, self.cfg.poll_interval(), tx);

        let mut frames = interval(self.cfg.frame_interval());
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let res = loop {
            tokio::select! {
                _ = frames.tick() => {
                    if let Err(e) = self.drain_input() {
                        break Err(e.into());
                    }
                    if self.should_quit {
                        break Ok(());
                    }
                    if let Some(bounds) = self.debounce.take_due(Instant::now()) {
                        self.rebuild_surface(terminal, ctx, bounds);
                    }
                    if let Err(e) = terminal.draw(|f| ctx.draw(f)) {
                        break Err(e.into());
                    }
                }
                changed = rx.changed() => {
                    if changed.is_err() {
                        break Err("metrics poller stopped".into());
                    }
                    let report = rx.borrow_and_update().clone();
                    if let Some(report) = report {
                        ctx.apply_report(&report, wall_clock_ms());
                    }
                }
                _ = tokio::signal::ctrl_c() => break Ok(()),
            }
        };

        poller.abort();
        res
    }

    // Input (non-blocking)
    fn drain_input(&mut self) -> io::Result<()> {
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(k) if k.kind == KeyEventKind::Press => {
                    let ctrl_c = k.code == KeyCode::Char('c')
                        && k.modifiers.contains(KeyModifiers::CONTROL);
                    if ctrl_c
                        || matches!(
                            k.code,
                            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc
                        )
                    {
                        self.should_quit = true;
                    }
                }
                Event::Resize(w, h) => self.debounce.note(Bounds::new(w, h), Instant::now()),
                _ => {}
            }
        }
        Ok(())
    }

    fn rebuild_surface<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        ctx: &mut VizContext,
        bounds: Bounds,
    ) {
        let res = ctx.resize_surface(bounds, |area| {
            terminal.resize(area)?;
            terminal.clear()
        });
        if let Err(e) = res {
            warn!(error = %e, "resize ignored; keeping the previous surface");
            return;
        }
        info!(
            width = bounds.width,
            height = bounds.height,
            generation = ctx.viewport.generation,
            "render surface rebuilt"
        );
    }
}

fn surface_bounds<B: Backend>(terminal: &Terminal<B>) -> Result<Bounds, SurfaceError> {
    let size = terminal.size()?;
    Ok(Bounds::new(size.width, size.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SampleSource;
    use ratatui::backend::TestBackend;

    fn ctx() -> VizContext {
        VizContext::new(&VizConfig::default(), Bounds::new(100, 30)).unwrap()
    }

    #[test]
    fn context_refuses_empty_surface() {
        assert!(VizContext::new(&VizConfig::default(), Bounds::new(0, 0)).is_err());
    }

    #[test]
    fn live_report_reaches_readout_and_scene() {
        let mut c = ctx();
        let report = PollReport {
            sample: Sample {
                cpu: 90.0,
                ram: 40.0,
                source: SampleSource::Live,
            },
            failure: None,
        };
        c.apply_report(&report, 1_000.0);
        assert_eq!(c.readout.cpu_text(), "90.0%");
        let first_light = c.handles.servers[0].lights[2];
        assert_eq!(c.scene.material(first_light).unwrap().opacity, mapper::LIGHT_FULL);
    }

    #[test]
    fn failed_rebuild_keeps_drawing_old_surface() {
        let mut c = ctx();
        let before = c.viewport.clone();
        assert!(c.resize_surface(Bounds::new(0, 10), |_| Ok(())).is_err());
        assert_eq!(c.viewport, before);
    }

    #[test]
    fn terminal_resize_failure_restores_viewport() {
        let mut c = ctx();
        let before = c.viewport.clone();
        let res = c.resize_surface(Bounds::new(140, 40), |_| {
            Err(io::Error::new(io::ErrorKind::Other, "backend gone"))
        });
        assert!(matches!(res, Err(SurfaceError::Io(_))));
        assert_eq!(c.viewport, before);
    }

    #[test]
    fn resize_surface_passes_full_area_to_terminal() {
        let mut c = ctx();
        let mut seen = None;
        c.resize_surface(Bounds::new(140, 40), |area| {
            seen = Some(area);
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, Some(Rect::new(0, 0, 140, 40)));
        assert_eq!(c.viewport.bounds, Bounds::new(140, 40));
        assert_eq!(c.viewport.generation, 1);
    }

    #[test]
    fn cell_buffer_follows_terminal_before_camera_rebuild() {
        let c = ctx();
        let mut term = Terminal::new(TestBackend::new(100, 30)).unwrap();
        term.draw(|f| c.draw(f)).unwrap();
        term.backend_mut().resize(120, 40);
        let frame = term.draw(|f| c.draw(f)).unwrap();
        assert_eq!(frame.area, Rect::new(0, 0, 120, 40));
        // camera stays on the old bounds until the debounced rebuild
        assert_eq!(c.viewport.bounds, Bounds::new(100, 30));
    }

    #[test]
    fn header_shows_readouts() {
        let mut c = ctx();
        c.apply_report(
            &PollReport {
                sample: Sample {
                    cpu: 12.0,
                    ram: 34.5,
                    source: SampleSource::Live,
                },
                failure: None,
            },
            0.0,
        );
        let mut term = Terminal::new(TestBackend::new(100, 30)).unwrap();
        term.draw(|f| c.draw(f)).unwrap();
        let buf = term.backend().buffer();
        let top: String = buf.content()[..100].iter().map(|c| c.symbol()).collect();
        assert!(top.contains("CPU: 12.0%"), "{top}");
        assert!(top.contains("RAM: 34.5%"), "{top}");
    }
}
