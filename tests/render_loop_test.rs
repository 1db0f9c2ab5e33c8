use glass_grid::render::{LoopState, RenderLoop, Stage};
use instant::Duration;

#[derive(Default)]
struct ScriptedStage {
    log: Vec<String>,
    fail_next_draw: Option<wgpu::SurfaceError>,
}

impl Stage for ScriptedStage {
    fn advance(&mut self, _dt: Duration) {
        self.log.push("advance".into());
    }

    fn draw(&mut self) -> Result<(), wgpu::SurfaceError> {
        if let Some(e) = self.fail_next_draw.take() {
            self.log.push("draw failed".into());
            return Err(e);
        }
        self.log.push("draw".into());
        Ok(())
    }
}

#[test]
fn starting_twice_keeps_a_single_loop() {
    let mut render_loop = RenderLoop::new();
    let mut stage = ScriptedStage::default();

    assert!(render_loop.start());
    assert!(!render_loop.start());
    assert_eq!(render_loop.state(), LoopState::Running);

    for _ in 0..3 {
        assert!(render_loop.tick(&mut stage).unwrap());
    }
    // One draw per tick, not one per start call.
    assert_eq!(render_loop.frames(), 3);
    assert_eq!(stage.log.iter().filter(|entry| *entry == "draw").count(), 3);
}

#[test]
fn nothing_is_drawn_before_start() {
    let mut render_loop = RenderLoop::new();
    let mut stage = ScriptedStage::default();

    assert!(!render_loop.tick(&mut stage).unwrap());
    assert!(!render_loop.is_running());
    assert!(stage.log.is_empty());
}

#[test]
fn each_tick_advances_before_drawing() {
    let mut render_loop = RenderLoop::new();
    let mut stage = ScriptedStage::default();
    render_loop.start();

    render_loop.tick(&mut stage).unwrap();
    render_loop.tick(&mut stage).unwrap();

    assert_eq!(stage.log, ["advance", "draw", "advance", "draw"]);
}

#[test]
fn surface_errors_surface_and_skip_the_frame_count() {
    let mut render_loop = RenderLoop::new();
    let mut stage = ScriptedStage {
        fail_next_draw: Some(wgpu::SurfaceError::Outdated),
        ..Default::default()
    };
    render_loop.start();

    assert!(matches!(
        render_loop.tick(&mut stage),
        Err(wgpu::SurfaceError::Outdated)
    ));
    assert_eq!(render_loop.frames(), 0);

    // The loop keeps running; the next frame goes through.
    assert!(render_loop.tick(&mut stage).unwrap());
    assert_eq!(render_loop.frames(), 1);
    assert!(render_loop.is_running());
}
