// SPDX-License-Identifier: MIT OR Apache-2.0
//! Main editor application setup and event loop.

use crate::panels::{toolbar, InspectorPanel, ToolbarCommand};
use crate::settings::EditorSettings;
use egui_wgpu::wgpu;
use process_editor_graph::ui::GraphEditorState;
use process_editor_graph::{DocumentError, GraphDocument, GraphError, ProcessEditor};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

/// Editor application errors
#[derive(Debug, Error)]
pub enum EditorError {
    /// Window creation failed
    #[error("Failed to create window: {0}")]
    WindowCreation(#[from] winit::error::OsError),

    /// Renderer initialization failed
    #[error("Failed to initialize renderer: {0}")]
    RendererInit(String),

    /// Event loop error
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Process document error
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// The editor refused the change
    #[error("{0}")]
    Graph(#[from] GraphError),
}

/// Result type for editor operations
pub type Result<T> = std::result::Result<T, EditorError>;

/// Colour behind the egui panels
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.1,
    b: 0.1,
    a: 1.0,
};

fn renderer_error(e: impl std::fmt::Display) -> EditorError {
    EditorError::RendererInit(e.to_string())
}

/// Surface, device and the egui renderer drawing into them
struct GraphicsState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    egui_renderer: egui_wgpu::Renderer,
}

impl GraphicsState {
    fn new(window: Arc<Window>) -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone()).map_err(renderer_error)?;

        let options = wgpu::RequestAdapterOptions {
            compatible_surface: Some(&surface),
            ..Default::default()
        };
        let adapter = pollster::block_on(instance.request_adapter(&options))
            .ok_or_else(|| renderer_error("no GPU adapter can present to the window"))?;
        tracing::info!("Rendering with {}", adapter.get_info().name);

        let descriptor = wgpu::DeviceDescriptor {
            label: Some("process_editor"),
            ..Default::default()
        };
        let (device, queue) =
            pollster::block_on(adapter.request_device(&descriptor, None)).map_err(renderer_error)?;

        let config = surface_config(&surface.get_capabilities(&adapter), window.inner_size())?;
        surface.configure(&device, &config);

        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, None, 1, false);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            egui_renderer,
        })
    }

    fn resize(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
    }

    /// Tessellate one egui frame and present it
    fn render(
        &mut self,
        egui_ctx: &egui::Context,
        full_output: egui::FullOutput,
        window: &Window,
    ) -> std::result::Result<(), wgpu::SurfaceError> {
        let frame = self.surface.get_current_texture()?;
        let target = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };
        let primitives = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let textures = full_output.textures_delta;

        for (id, delta) in &textures.set {
            self.egui_renderer.update_texture(&self.device, &self.queue, *id, delta);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("egui") });
        let callbacks =
            self.egui_renderer
                .update_buffers(&self.device, &self.queue, &mut encoder, &primitives, &screen);

        let attachment = wgpu::RenderPassColorAttachment {
            view: &target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                store: wgpu::StoreOp::Store,
            },
        };
        let mut pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui"),
                color_attachments: &[Some(attachment)],
                ..Default::default()
            })
            .forget_lifetime();
        self.egui_renderer.render(&mut pass, &primitives, &screen);
        drop(pass);

        self.queue
            .submit(callbacks.into_iter().chain(std::iter::once(encoder.finish())));
        frame.present();

        for id in &textures.free {
            self.egui_renderer.free_texture(id);
        }
        Ok(())
    }
}

/// Surface configuration preferring an sRGB format
fn surface_config(
    caps: &wgpu::SurfaceCapabilities,
    size: winit::dpi::PhysicalSize<u32>,
) -> Result<wgpu::SurfaceConfiguration> {
    let format = caps
        .formats
        .iter()
        .copied()
        .find(wgpu::TextureFormat::is_srgb)
        .or_else(|| caps.formats.first().copied())
        .ok_or_else(|| renderer_error("surface reports no texture formats"))?;

    Ok(wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: wgpu::PresentMode::AutoVsync,
        alpha_mode: caps.alpha_modes.first().copied().unwrap_or(wgpu::CompositeAlphaMode::Auto),
        view_formats: Vec::new(),
        desired_maximum_frame_latency: 2,
    })
}

/// Live window, renderer and editor
struct EditorRunning {
    window: Arc<Window>,
    graphics: GraphicsState,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    editor: EditorInner,
}

/// Editor state independent of the window
struct EditorInner {
    settings: EditorSettings,
    editor: ProcessEditor,
    canvas: GraphEditorState,
    inspector: InspectorPanel,
    status: Option<String>,
}

impl EditorInner {
    fn new(settings: EditorSettings) -> Self {
        let editor = ProcessEditor::new(settings.graph.new_graph()).with_layout(settings.graph.layout());
        let mut canvas = GraphEditorState::new();
        canvas.snap_to_grid = settings.graph.snap_to_grid;

        Self {
            settings,
            editor,
            canvas,
            inspector: InspectorPanel::new(),
            status: None,
        }
    }

    fn update(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            if let Some(command) = toolbar(ui, &mut self.editor, &self.canvas) {
                self.run_command(command);
            }
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(self.status.as_deref().unwrap_or("Double-click the canvas to add a step"));
        });

        egui::SidePanel::right("inspector")
            .default_width(240.0)
            .show(ctx, |ui| {
                self.inspector.ui(ui, &mut self.editor, &self.canvas);
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                self.canvas.ui(ui, &mut self.editor);
            });
    }

    fn run_command(&mut self, command: ToolbarCommand) {
        let path = self.settings.document_path.clone();
        let result = match command {
            ToolbarCommand::Export => export_document(&self.editor, &path).map(|()| format!("Exported to {}", path.display())),
            ToolbarCommand::Import => self.import_document(&path).map(|()| format!("Imported {}", path.display())),
            ToolbarCommand::Clear => self.clear().map(|()| "Cleared process".to_string()),
        };

        match result {
            Ok(message) => {
                tracing::info!("{message}");
                self.status = Some(message);
            }
            Err(e) => {
                tracing::error!("{command:?} failed: {e}");
                self.status = Some(format!("{command:?} failed: {e}"));
            }
        }
    }

    fn import_document(&mut self, path: &Path) -> Result<()> {
        if self.editor.is_locked() {
            return Err(GraphError::Locked.into());
        }
        let content = std::fs::read_to_string(path)?;
        let graph = GraphDocument::from_json(&content)?.into_graph(self.settings.graph.new_graph())?;
        self.editor.replace_graph(graph)?;
        self.canvas.clear_selection();
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.editor.replace_graph(self.settings.graph.new_graph())?;
        self.canvas.clear_selection();
        Ok(())
    }
}

fn export_document(editor: &ProcessEditor, path: &Path) -> Result<()> {
    let json = GraphDocument::from_graph(editor.graph()).to_json()?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Main editor application
pub struct EditorApp {
    running: Option<EditorRunning>,
    settings: EditorSettings,
    /// First fatal error raised inside the event loop
    error: Option<EditorError>,
}

impl EditorApp {
    /// Create a new editor application
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            running: None,
            settings,
            error: None,
        }
    }

    /// Run the editor until the window closes
    pub fn run(settings: EditorSettings) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let mut app = EditorApp::new(settings);
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<EditorRunning> {
        tracing::info!("Creating editor window...");

        let window_attrs = Window::default_attributes()
            .with_title("Process Flow Editor")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.settings.window.width,
                self.settings.window.height,
            ))
            .with_min_inner_size(winit::dpi::LogicalSize::new(640, 480));

        let window = Arc::new(event_loop.create_window(window_attrs)?);

        tracing::info!("Initializing graphics...");
        let graphics = GraphicsState::new(window.clone())?;

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2 * 1024),
        );

        let editor = EditorInner::new(self.settings.clone());

        tracing::info!("Editor initialized, window size {:?}", window.inner_size());

        Ok(EditorRunning {
            window,
            graphics,
            egui_ctx,
            egui_state,
            editor,
        })
    }
}

impl ApplicationHandler for EditorApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }

        match self.start(event_loop) {
            Ok(running) => self.running = Some(running),
            Err(e) => {
                tracing::error!("Startup failed: {e}");
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(running) = &mut self.running else {
            return;
        };

        let response = running.egui_state.on_window_event(&running.window, &event);
        if response.repaint {
            running.window.request_redraw();
        }
        if response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Close requested, exiting...");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                tracing::debug!("Window resized to {:?}", new_size);
                running.graphics.resize(new_size);
                running.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                let raw_input = running.egui_state.take_egui_input(&running.window);
                let full_output = running.egui_ctx.run(raw_input, |ctx| {
                    running.editor.update(ctx);
                });

                running
                    .egui_state
                    .handle_platform_output(&running.window, full_output.platform_output.clone());

                let repaint = full_output
                    .viewport_output
                    .values()
                    .any(|v| v.repaint_delay.is_zero());

                match running.graphics.render(&running.egui_ctx, full_output, &running.window) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = running.window.inner_size();
                        running.graphics.resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        tracing::error!("Out of GPU memory!");
                        event_loop.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        tracing::warn!("Surface timeout");
                    }
                }

                if repaint {
                    running.window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
