use std::time::Duration;

use client_core::DEFAULT_SERVER_URL;
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{err_label, UiError, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub server_url: String,
    pub call_timeout: Option<Duration>,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            call_timeout: None,
        }
    }
}

pub struct DesktopGuiApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    server_url: String,
    name_input: String,
    /// The `greeting` region. Only `UiEvent::Greeting` writes it.
    greeting: String,
    submit_enabled: bool,
    status: String,
    last_error: Option<UiError>,
}

impl DesktopGuiApp {
    pub fn bootstrap(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        startup: &StartupConfig,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            server_url: startup.server_url.clone(),
            name_input: String::new(),
            greeting: String::new(),
            submit_enabled: true,
            status: "Connecting to backend worker".to_string(),
            last_error: None,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            self.apply_ui_event(event);
        }
    }

    fn apply_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Info(message) => {
                self.status = message;
            }
            UiEvent::SubmitEnabled(enabled) => {
                self.submit_enabled = enabled;
                if !enabled {
                    self.status = "Waiting for the greeting service...".to_string();
                }
            }
            UiEvent::Greeting(text) => {
                self.greeting = text;
                self.status = "Ready".to_string();
                self.last_error = None;
            }
            UiEvent::Error(err) => {
                tracing::warn!(context = ?err.context(), "{}", err.message());
                self.status = format!("{} error: {}", err_label(err.category()), err.message());
                self.last_error = Some(err);
            }
        }
    }

    fn request_submit(&mut self) {
        if !self.submit_enabled {
            return;
        }
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::Submit {
                name: self.name_input.clone(),
            },
            &mut self.status,
        );
    }

    fn form(&mut self, ui: &mut egui::Ui) {
        let mut submit = false;
        ui.horizontal(|ui| {
            ui.label("Enter your name:");
            let field = ui.add(
                egui::TextEdit::singleline(&mut self.name_input)
                    .id_salt("name")
                    .desired_width(220.0),
            );
            if field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                submit = true;
            }
            if ui
                .add_enabled(self.submit_enabled, egui::Button::new("Click Me!"))
                .clicked()
            {
                submit = true;
            }
        });
        if submit {
            self.request_submit();
        }
    }
}

impl eframe::App for DesktopGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            let color = if self.last_error.is_some() {
                ui.visuals().error_fg_color
            } else {
                ui.visuals().weak_text_color()
            };
            ui.colored_label(color, &self.status);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Greeter");
            ui.small(format!("Service: {}", self.server_url));
            ui.add_space(8.0);
            self.form(ui);
            ui.separator();
            ui.label(egui::RichText::new(&self.greeting).size(18.0).strong());
        });

        if self.submit_enabled {
            ctx.request_repaint_after(Duration::from_millis(100));
        } else {
            ctx.request_repaint_after(Duration::from_millis(16));
        }
    }
}

impl Drop for DesktopGuiApp {
    fn drop(&mut self) {
        let _ = self.cmd_tx.try_send(BackendCommand::Shutdown);
    }
}
