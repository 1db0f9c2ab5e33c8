//! Application shell and event loop.
//!
//! [`run`] builds the winit event loop and drives [`App`]:
//!
//! 1. `resumed` creates the window and starts initialisation: the GPU
//!    [`Context`] first, then the loading pipeline filling the [`Scene`]
//! 2. natively the initialisation future is blocked on; on the web it is
//!    spawned and its result comes back as [`FlowEvent::Initialized`]
//! 3. on success the scene is uploaded and the [`RenderLoop`] started; on
//!    failure the window stays up showing only the background
//! 4. every `RedrawRequested` ticks the loop and asks for the next frame

use std::{fmt::Debug, sync::Arc};

use instant::Duration;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    config::SceneConfig,
    context::Context,
    data_structures::scene::Scene,
    loading::build_scene,
    render::{self, GpuScene, RenderLoop, Stage},
    resources::FileSource,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub(crate) struct AppState {
    pub(crate) ctx: Context,
    scene: Scene,
    gpu_scene: Option<GpuScene>,
}

impl AppState {
    async fn new(window: Arc<Window>, config: &SceneConfig) -> anyhow::Result<Self> {
        let ctx = Context::new(window, config).await?;
        Ok(Self {
            ctx,
            scene: Scene::new(config.lights, config.background),
            gpu_scene: None,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
    }

    /// Upload the populated scene; fails if no environment was published.
    fn upload(&mut self) -> anyhow::Result<()> {
        let gpu_scene = GpuScene::upload(&self.ctx, &self.scene)?;
        self.gpu_scene = Some(gpu_scene);
        Ok(())
    }

    fn present_background(&self) {
        match render::present_background(&self.ctx, self.scene.background()) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface changed, background will be presented on the next redraw")
            }
            Err(e) => log::error!("Unable to present background {}", e),
        }
    }

    fn dispose(&mut self) {
        if let Some(gpu_scene) = self.gpu_scene.take() {
            log::info!("Releasing {} panels", gpu_scene.len());
        }
    }
}

impl Stage for AppState {
    fn advance(&mut self, _dt: Duration) {
        self.ctx
            .camera
            .update(&self.ctx.queue, &self.ctx.projection);
    }

    fn draw(&mut self) -> Result<(), wgpu::SurfaceError> {
        match &self.gpu_scene {
            Some(gpu_scene) => gpu_scene.draw(&self.ctx),
            None => Ok(()),
        }
    }
}

pub(crate) enum FlowEvent {
    #[allow(dead_code)]
    Initialized {
        state: AppState,
        outcome: anyhow::Result<usize>,
    },
    #[allow(dead_code)]
    Failed(anyhow::Error),
}

impl Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized { state: _, outcome } => f
                .debug_struct("Initialized")
                .field("outcome", outcome)
                .finish(),
            Self::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
        }
    }
}

/// Holds the configuration until the first `resumed` claims it. Later
/// resumes, including ones arriving while the web initialisation is still
/// pending, find it empty and start nothing.
#[derive(Debug)]
pub(crate) struct Startup(Option<SceneConfig>);

impl Startup {
    pub(crate) fn new(config: SceneConfig) -> Self {
        Self(Some(config))
    }

    pub(crate) fn claim(&mut self) -> Option<SceneConfig> {
        self.0.take()
    }
}

pub(crate) struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    startup: Startup,
    source: FileSource,
    state: Option<AppState>,
    render_loop: RenderLoop,
}

impl App {
    fn new(
        event_loop: &EventLoop<FlowEvent>,
        config: SceneConfig,
        source: FileSource,
    ) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            startup: Startup::new(config),
            source,
            state: None,
            render_loop: RenderLoop::new(),
        })
    }

    fn initialized(&mut self, mut state: AppState, outcome: anyhow::Result<usize>) {
        let size = state.ctx.window.inner_size();
        state.resize(size.width, size.height);

        match outcome {
            Ok(_) => match state.upload() {
                Ok(()) => {
                    self.render_loop.start();
                }
                Err(e) => log::error!("GPU upload failed: {e:#}"),
            },
            Err(_) => log::warn!("Scene is incomplete, only the background will be shown"),
        }

        state.ctx.window.request_redraw();
        self.state = Some(state);
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(config) = self.startup.claim() else {
            log::debug!("Already initialised, ignoring resume");
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title(&config.title);

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = match document.get_element_by_id(CANVAS_ID) {
                Some(canvas) => canvas,
                None => {
                    let canvas = document.create_element("canvas").unwrap_throw();
                    canvas.set_id(CANVAS_ID);
                    document
                        .body()
                        .unwrap_throw()
                        .append_child(&canvas)
                        .unwrap_throw();
                    canvas
                }
            };
            window_attributes = window_attributes.with_canvas(Some(canvas.unchecked_into()));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let source = self.source.clone();
        let init_future = async move {
            let mut state = AppState::new(window, &config).await?;
            let mut config = config;
            let max_dimension = state.ctx.device.limits().max_texture_dimension_2d;
            config.prefilter = config.prefilter.within(max_dimension);
            let outcome = build_scene(&source, &config, &mut state.scene).await;
            anyhow::Ok((state, outcome))
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok((state, outcome)) => self.initialized(state, outcome),
                Err(e) => {
                    log::error!("App initialization failed: {e:#}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match init_future.await {
                    Ok((state, outcome)) => FlowEvent::Initialized { state, outcome },
                    Err(e) => FlowEvent::Failed(e),
                };
                if proxy.send_event(event).is_err() {
                    log::error!("Event loop closed before initialization finished");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            FlowEvent::Initialized { state, outcome } => self.initialized(state, outcome),
            FlowEvent::Failed(e) => {
                log::error!("App initialization failed: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.ctx.camera.controls.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => {
                state.dispose();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                state.resize(size.width, size.height);
                if !self.render_loop.is_running() {
                    state.ctx.window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested if !self.render_loop.is_running() => {
                state.present_background();
            }
            WindowEvent::RedrawRequested => {
                match self.render_loop.tick(state) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
                if self.render_loop.is_running() {
                    state.ctx.window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Open a window and show the glass grid described by `config`.
pub fn run(config: SceneConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config, FileSource::default())?;

    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_is_claimed_once() {
        let config = SceneConfig::default().with_environment("/textures/night.hdr");
        let mut startup = Startup::new(config);
        let first = startup.claim().unwrap();
        assert_eq!(first.environment, "/textures/night.hdr");
        // A resume that arrives before initialisation has finished.
        assert!(startup.claim().is_none());
        assert!(startup.claim().is_none());
    }
}
