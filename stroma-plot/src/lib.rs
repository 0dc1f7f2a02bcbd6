//! A live chart of a running Stroma simulation.

mod window;

use std::path::PathBuf;

use eframe::egui;
use egui_plot::{Legend, Line, Plot, VLine};
use stroma_sim::{
    ResponseConfig,
    export::export_csv,
    shared::{LoopHandle, SharedEngine, SharedInputs},
};
use uom::si::time::second;

pub use window::{CHARTED, ChartMode, ChartWindow, FOLLOW_POINTS, visible_range};

/// A runnable egui application charting a simulation as it runs.
///
/// The app edits the shared control inputs and reads history snapshots. The
/// simulation itself ticks on its own thread, owned through a [`LoopHandle`]
/// that is cancelled when the app closes.
pub struct ChartApp {
    engine: SharedEngine,
    inputs: SharedInputs,
    defaults: ResponseConfig,
    limits: [f64; 2],
    mode: ChartMode,
    export_dir: PathBuf,
    status: Option<String>,
    simulation: Option<LoopHandle>,
}

impl ChartApp {
    #[must_use]
    pub fn new(engine: SharedEngine, inputs: SharedInputs) -> Self {
        let (defaults, limits) = engine.read(|engine| {
            let config = engine.config();
            (config.response, [config.light_max, config.co2_max])
        });

        Self {
            engine,
            inputs,
            defaults,
            limits,
            mode: ChartMode::default(),
            export_dir: PathBuf::from("."),
            status: None,
            simulation: None,
        }
    }

    /// Keeps the simulation loop alive for as long as the app runs.
    #[must_use]
    pub fn with_loop(mut self, simulation: LoopHandle) -> Self {
        self.simulation = Some(simulation);
        self
    }

    /// Sets the directory CSV exports are written to.
    #[must_use]
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    #[allow(clippy::missing_errors_doc)]
    pub fn run(self, name: &str) -> Result<(), eframe::Error> {
        eframe::run_native(
            name,
            eframe::NativeOptions::default(),
            Box::new(|_cc| Ok(Box::new(self))),
        )
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        let [light_max, co2_max] = self.limits;
        let mut inputs = self.inputs.get();
        let before = inputs;
        let mut export = false;

        ui.horizontal(|ui| {
            ui.add(
                egui::Slider::new(&mut inputs.light_intensity, 0.0..=light_max).text("Light (lx)"),
            );
            ui.add(egui::Slider::new(&mut inputs.co2_level, 0.0..=co2_max).text("CO₂ (µL/L)"));

            let toggle = if inputs.light_on { "Light off" } else { "Light on" };
            if ui.button(toggle).clicked() {
                inputs.toggle_light(&mut self.engine);
            }
            ui.checkbox(&mut inputs.paused, "Pause");
            if ui.button("Reset").clicked() {
                inputs.restore_defaults(&self.defaults, &mut self.engine);
            }

            ui.separator();
            ui.selectable_value(&mut self.mode, ChartMode::Follow, "Follow");
            ui.selectable_value(&mut self.mode, ChartMode::Global, "Global");

            ui.separator();
            export = ui.button("Export CSV").clicked();
        });

        if inputs != before {
            self.inputs.set(inputs);
        }
        if export {
            self.export();
        }
    }

    fn export(&mut self) {
        let history = self.engine.read(|engine| engine.history().clone());
        self.status = Some(match export_csv(&history, &self.export_dir) {
            Ok(path) => format!("Saved {}", path.display()),
            Err(error) => {
                log::error!("CSV export failed: {error}");
                format!("Export failed: {error}")
            }
        });
    }
}

impl eframe::App for ChartApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            self.controls(ui);
        });

        let history = self.engine.history_snapshot();
        let time = self.engine.simulated_time().get::<second>();

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("t = {time:.1} s"));
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status);
                }
            });
        });

        let window = ChartWindow::new(&history, self.mode);
        egui::CentralPanel::default().show(ctx, |ui| {
            Plot::new("history")
                .legend(Legend::default())
                .show(ui, |plot_ui| {
                    for (series, points) in window.lines {
                        plot_ui.line(Line::new(points).name(series.label()));
                    }
                    for (time, label) in window.markers {
                        plot_ui.vline(VLine::new(time).name(label));
                    }
                });
        });

        ctx.request_repaint();
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(summary) = self.simulation.take().and_then(LoopHandle::stop) {
            log::info!("simulation stopped after {} ticks", summary.iterations);
        }
    }
}
