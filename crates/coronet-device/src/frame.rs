use coronet_resource::ResourceManager;

use crate::time::FrameTime;

/// The slice of the device a game callback may touch. Lives only for the
/// duration of one callback.
pub struct DeviceCtx<'a> {
    pub resources: &'a ResourceManager,
    pub time: FrameTime,
    pub resolution: (u32, u32),
    pub(crate) exit_requested: &'a mut bool,
}

impl DeviceCtx<'_> {
    /// Asks the device to stop after the current frame.
    #[inline]
    pub fn request_exit(&mut self) {
        *self.exit_requested = true;
    }
}
