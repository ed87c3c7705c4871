use anyhow::Result;

use crate::event::OsEvent;
use crate::frame::DeviceCtx;

/// The game side of the runtime. The device owns the loop and the
/// subsystems; the game gets called back with a [`DeviceCtx`] window into
/// them. All hooks default to no-ops so a game implements only what it
/// needs.
pub trait Game: Send {
    /// Short name used in logs and error reports.
    fn name(&self) -> &'static str {
        "game"
    }

    /// Runs once after the boot package is resident, before the first
    /// frame.
    fn init(&mut self, _ctx: &mut DeviceCtx<'_>) -> Result<()> {
        Ok(())
    }

    /// One host event, in arrival order, before `update` of the same
    /// frame.
    fn event(&mut self, _ctx: &mut DeviceCtx<'_>, _ev: &OsEvent) {}

    /// One simulation step. Skipped while the device is paused.
    fn update(&mut self, _ctx: &mut DeviceCtx<'_>, _dt: f32) -> Result<()> {
        Ok(())
    }

    /// Runs once during device shutdown, before subsystems go away.
    fn shutdown(&mut self, _ctx: &mut DeviceCtx<'_>) {}
}

/// Stand-in used when the embedder installs no game. Keeps the runtime
/// bootable on its own, which is all the tests and the desktop runner
/// need.
pub struct NullGame;

impl Game for NullGame {
    fn name(&self) -> &'static str {
        "null"
    }
}
