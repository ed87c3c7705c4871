use std::sync::Arc;

use log::{error, info};

use coronet_console::ConsoleServer;
use coronet_fs::BundleFs;
use coronet_resource::{ResourceManager, ResourcePackage};

use crate::boot::BootConfig;
use crate::error::{DeviceError, DeviceResult};
use crate::event::{EventQueue, EventWriter, OsEvent};
use crate::frame::DeviceCtx;
use crate::game::Game;
use crate::time::FrameClock;

/// The engine device: owns the bundle source, the resource manager, the
/// console server and the game, and runs the frame loop that ties them
/// together. Construction is initialization; dropping or calling
/// [`Device::shutdown`] tears everything down.
pub struct Device {
    config: BootConfig,
    resources: Arc<ResourceManager>,
    console: Option<ConsoleServer>,
    boot_package: Option<ResourcePackage>,
    game: Box<dyn Game>,

    events: EventQueue,
    event_batch: Vec<OsEvent>,

    clock: FrameClock,
    resolution: (u32, u32),

    running: bool,
    paused: bool,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device").finish_non_exhaustive()
    }
}

impl Device {
    /// Boots a device against the given bundle source: reads the boot
    /// config, starts the subsystems, makes the boot package resident and
    /// runs the game's `init` hook. On error nothing stays half-built;
    /// every started subsystem stops when the partial device drops.
    pub fn init(fs: Arc<dyn BundleFs>, game: Box<dyn Game>) -> DeviceResult<Self> {
        let config = BootConfig::load_or_default(fs.as_ref())?;
        Self::init_with_config(fs, game, config)
    }

    /// [`Device::init`] with the boot config supplied by the caller
    /// instead of read from the bundle. The desktop runner uses this to
    /// apply command-line overrides.
    pub fn init_with_config(
        fs: Arc<dyn BundleFs>,
        game: Box<dyn Game>,
        config: BootConfig,
    ) -> DeviceResult<Self> {
        info!(
            target: "device",
            "device.init boot_package='{}' console={}",
            config.boot_package,
            config.console.enabled
        );

        let resources = Arc::new(ResourceManager::new(Arc::clone(&fs))?);
        let events = EventQueue::new();

        let console = if config.console.enabled {
            let mut server = ConsoleServer::new();
            register_commands(&mut server, &resources, events.writer());
            server.listen(config.console.port, config.console.wait)?;
            Some(server)
        } else {
            None
        };

        let boot_package = if config.boot_package.is_empty() {
            None
        } else {
            let mut package = ResourcePackage::open(fs.as_ref(), &config.boot_package)?;
            package.load(&resources)?;
            package.flush(&resources);
            Some(package)
        };

        let mut device = Self {
            config,
            resources,
            console,
            boot_package,
            game,
            events,
            event_batch: Vec::new(),
            clock: FrameClock::new(),
            resolution: (0, 0),
            running: true,
            paused: false,
        };

        let name = device.game.name();
        device
            .with_ctx(|game, ctx| game.init(ctx))
            .map_err(|source| DeviceError::Game { game: name, source })?;

        info!(target: "device", "device.ready game='{}'", name);
        Ok(device)
    }

    /// Runs one frame: drains host events, pumps the console, completes
    /// resource requests and steps the game. The frame counter advances
    /// whether or not the device is paused. Returns `false` once the
    /// device has stopped; the loop owner should then call
    /// [`Device::shutdown`].
    pub fn frame(&mut self) -> bool {
        if !self.running {
            return false;
        }

        let time = self.clock.tick();
        self.pump_events();

        if let Some(console) = self.console.as_mut() {
            console.update();
        }

        if self.running && !self.paused {
            self.resources.complete_requests();

            let name = self.game.name();
            if let Err(e) = self.with_ctx(|game, ctx| game.update(ctx, time.dt_sec)) {
                error!(target: "device", "game.update failed [{}]: {:#}", name, e);
                self.running = false;
            }
        }

        self.clock.advance_frame();
        self.running
    }

    /// Pauses the simulation: updates stop, the frame loop and its
    /// counter keep going. Idempotent.
    pub fn pause(&mut self) {
        self.paused = true;
        info!(target: "device", "device.pause");
    }

    /// Undoes [`Device::pause`]. Idempotent.
    pub fn unpause(&mut self) {
        self.paused = false;
        info!(target: "device", "device.unpause");
    }

    /// Requests exit; the next `frame()` reports stopped.
    pub fn quit(&mut self) {
        info!(target: "device", "device.quit");
        self.running = false;
    }

    /// Tears the device down: game shutdown hook, boot package unload,
    /// console stop. Consuming `self` makes a second shutdown
    /// unrepresentable; the resource loader stops when its last handle
    /// drops.
    pub fn shutdown(mut self) {
        info!(target: "device", "device.shutdown");

        self.with_ctx(|game, ctx| game.shutdown(ctx));

        if let Some(mut package) = self.boot_package.take() {
            package.unload(&self.resources);
        }

        if let Some(mut console) = self.console.take() {
            console.stop();
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Completed frames since boot.
    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.clock.time().frame_index
    }

    #[inline]
    pub fn last_delta_time(&self) -> f32 {
        self.clock.time().dt_sec
    }

    #[inline]
    pub fn time_since_start(&self) -> f64 {
        self.clock.time().t_sec
    }

    /// Last metrics reported by the host; `(0, 0)` until the first
    /// `Metrics` event arrives.
    #[inline]
    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    /// Producer handle for host events. Cheap to clone, safe on any
    /// thread.
    pub fn event_writer(&self) -> EventWriter {
        self.events.writer()
    }

    pub fn resources(&self) -> &Arc<ResourceManager> {
        &self.resources
    }

    pub fn config(&self) -> &BootConfig {
        &self.config
    }

    /// Port the console actually bound (`port = 0` lets the OS pick).
    /// `None` when the console is disabled.
    pub fn console_port(&self) -> Option<u16> {
        self.console.as_ref().and_then(|c| c.port())
    }

    fn pump_events(&mut self) {
        let mut batch = std::mem::take(&mut self.event_batch);
        self.events.drain_into(&mut batch);

        for ev in batch.drain(..) {
            match ev {
                OsEvent::Pause => self.pause(),
                OsEvent::Resume => self.unpause(),
                OsEvent::Exit => {
                    info!(target: "device", "device.exit requested");
                    self.running = false;
                }
                OsEvent::Metrics { width, height } => {
                    self.resolution = (width, height);
                    self.with_ctx(|game, ctx| game.event(ctx, &ev));
                }
                other => {
                    self.with_ctx(|game, ctx| game.event(ctx, &other));
                }
            }
        }

        self.event_batch = batch;
    }

    /// Builds a [`DeviceCtx`] over disjoint fields and runs one game
    /// callback with it, folding a `request_exit` back into the running
    /// flag afterwards.
    fn with_ctx<R>(&mut self, f: impl FnOnce(&mut dyn Game, &mut DeviceCtx<'_>) -> R) -> R {
        let mut exit = false;
        let mut ctx = DeviceCtx {
            resources: self.resources.as_ref(),
            time: self.clock.time(),
            resolution: self.resolution,
            exit_requested: &mut exit,
        };
        let r = f(self.game.as_mut(), &mut ctx);
        drop(ctx);
        if exit {
            self.running = false;
        }
        r
    }
}

/// Wires the built-in console commands. Control commands go through the
/// event queue so every state change happens on the frame loop; `reload`
/// talks to the resource manager directly, which is safe from any thread.
fn register_commands(
    server: &mut ConsoleServer,
    resources: &Arc<ResourceManager>,
    events: EventWriter,
) {
    let w = events.clone();
    server.register(
        "pause",
        "Pause the simulation",
        Box::new(move |_args| {
            if w.push(OsEvent::Pause) {
                Ok("pausing".to_string())
            } else {
                Err("event queue full".to_string())
            }
        }),
    );

    let w = events.clone();
    server.register(
        "unpause",
        "Resume the simulation",
        Box::new(move |_args| {
            if w.push(OsEvent::Resume) {
                Ok("resuming".to_string())
            } else {
                Err("event queue full".to_string())
            }
        }),
    );

    let w = events;
    server.register(
        "quit",
        "Stop the device",
        Box::new(move |_args| {
            if w.push(OsEvent::Exit) {
                Ok("quitting".to_string())
            } else {
                Err("event queue full".to_string())
            }
        }),
    );

    let rm = Arc::clone(resources);
    server.register(
        "reload",
        "Re-read a loaded resource from the bundle: reload path=<path>",
        Box::new(move |args| {
            let path = args
                .get("path")
                .and_then(|v| v.as_str())
                .ok_or_else(|| "missing 'path' argument".to_string())?;
            match rm.reload(path) {
                Ok(size) => Ok(format!("reloaded '{}' ({} bytes)", path, size)),
                Err(e) => Err(e.to_string()),
            }
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boot::BOOT_CONFIG_PATH;
    use crate::game::NullGame;
    use coronet_fs::MemoryFs;
    use coronet_resource::ResourceId;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpStream;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    const NO_CONSOLE: &str = "[console]\nenabled = false\n";
    const PICK_PORT: &str = "[console]\nport = 0\n";

    fn bundle(config: &str, files: &[(&str, &str)]) -> Arc<MemoryFs> {
        let fs = MemoryFs::new();
        fs.insert(BOOT_CONFIG_PATH, config.as_bytes().to_vec())
            .unwrap();
        for (path, contents) in files {
            fs.insert(*path, contents.as_bytes().to_vec()).unwrap();
        }
        Arc::new(fs)
    }

    #[derive(Default)]
    struct Shared {
        inits: AtomicUsize,
        updates: AtomicUsize,
        shutdowns: AtomicUsize,
        boot_resident_at_init: AtomicBool,
        events: Mutex<Vec<OsEvent>>,
    }

    struct TestGame {
        shared: Arc<Shared>,
        fail_init: bool,
    }

    impl TestGame {
        fn new(shared: &Arc<Shared>) -> Box<Self> {
            Box::new(Self {
                shared: Arc::clone(shared),
                fail_init: false,
            })
        }
    }

    impl Game for TestGame {
        fn name(&self) -> &'static str {
            "test"
        }

        fn init(&mut self, ctx: &mut DeviceCtx<'_>) -> anyhow::Result<()> {
            self.shared.inits.fetch_add(1, Ordering::SeqCst);
            let resident = ctx.resources.has(ResourceId::from_path("data/a.txt"));
            self.shared
                .boot_resident_at_init
                .store(resident, Ordering::SeqCst);
            if self.fail_init {
                anyhow::bail!("refused to start");
            }
            Ok(())
        }

        fn event(&mut self, _ctx: &mut DeviceCtx<'_>, ev: &OsEvent) {
            self.shared.events.lock().unwrap().push(*ev);
        }

        fn update(&mut self, _ctx: &mut DeviceCtx<'_>, _dt: f32) -> anyhow::Result<()> {
            self.shared.updates.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn shutdown(&mut self, _ctx: &mut DeviceCtx<'_>) {
            self.shared.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn boots_runs_frames_and_shuts_down() {
        let shared = Arc::new(Shared::default());
        let mut device =
            Device::init(bundle(NO_CONSOLE, &[]), TestGame::new(&shared)).unwrap();

        assert!(device.is_running());
        assert!(!device.is_paused());
        assert_eq!(device.frame_count(), 0);

        for _ in 0..3 {
            assert!(device.frame());
        }
        assert_eq!(device.frame_count(), 3);
        assert_eq!(shared.updates.load(Ordering::SeqCst), 3);

        device.shutdown();
        assert_eq!(shared.inits.load(Ordering::SeqCst), 1);
        assert_eq!(shared.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn pause_stops_updates_but_not_the_frame_counter() {
        let shared = Arc::new(Shared::default());
        let mut device =
            Device::init(bundle(NO_CONSOLE, &[]), TestGame::new(&shared)).unwrap();
        let writer = device.event_writer();

        assert!(device.frame());
        assert_eq!(shared.updates.load(Ordering::SeqCst), 1);

        writer.push(OsEvent::Pause);
        assert!(device.frame());
        assert!(device.is_paused());
        assert_eq!(shared.updates.load(Ordering::SeqCst), 1);
        assert_eq!(device.frame_count(), 2);

        assert!(device.frame());
        assert_eq!(shared.updates.load(Ordering::SeqCst), 1);
        assert_eq!(device.frame_count(), 3);

        writer.push(OsEvent::Resume);
        assert!(device.frame());
        assert!(!device.is_paused());
        assert_eq!(shared.updates.load(Ordering::SeqCst), 2);

        device.shutdown();
    }

    #[test]
    fn exit_event_stops_the_loop() {
        let shared = Arc::new(Shared::default());
        let mut device =
            Device::init(bundle(NO_CONSOLE, &[]), TestGame::new(&shared)).unwrap();

        device.event_writer().push(OsEvent::Exit);
        assert!(!device.frame());
        assert!(!device.is_running());
        assert!(!device.frame());

        device.shutdown();
    }

    #[test]
    fn quit_stops_the_loop() {
        let mut device =
            Device::init(bundle(NO_CONSOLE, &[]), Box::new(NullGame)).unwrap();
        device.quit();
        assert!(!device.frame());
        device.shutdown();
    }

    #[test]
    fn input_events_reach_the_game_in_order() {
        let shared = Arc::new(Shared::default());
        let mut device =
            Device::init(bundle(NO_CONSOLE, &[]), TestGame::new(&shared)).unwrap();
        let writer = device.event_writer();

        writer.push(OsEvent::Key { code: 7, pressed: true });
        writer.push(OsEvent::Metrics { width: 800, height: 600 });
        writer.push(OsEvent::Touch { pointer: 0, x: 1.0, y: 2.0, pressed: true });
        assert!(device.frame());

        assert_eq!(device.resolution(), (800, 600));
        let seen = shared.events.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                OsEvent::Key { code: 7, pressed: true },
                OsEvent::Metrics { width: 800, height: 600 },
                OsEvent::Touch { pointer: 0, x: 1.0, y: 2.0, pressed: true },
            ]
        );
        drop(seen);

        device.shutdown();
    }

    #[test]
    fn request_exit_from_update_stops_the_loop() {
        struct Quitter;
        impl Game for Quitter {
            fn update(&mut self, ctx: &mut DeviceCtx<'_>, _dt: f32) -> anyhow::Result<()> {
                ctx.request_exit();
                Ok(())
            }
        }

        let mut device =
            Device::init(bundle(NO_CONSOLE, &[]), Box::new(Quitter)).unwrap();
        assert!(!device.frame());
        device.shutdown();
    }

    #[test]
    fn boot_package_is_resident_before_game_init() {
        let shared = Arc::new(Shared::default());
        let config = "boot_package = \"boot\"\n[console]\nenabled = false\n";
        let fs = bundle(
            config,
            &[
                ("packages/boot.package", "resources = [\"data/a.txt\"]\n"),
                ("data/a.txt", "alpha"),
            ],
        );

        let device = Device::init(fs, TestGame::new(&shared)).unwrap();
        assert!(shared.boot_resident_at_init.load(Ordering::SeqCst));
        assert!(device
            .resources()
            .get(ResourceId::from_path("data/a.txt"))
            .is_some());
        device.shutdown();
    }

    #[test]
    fn missing_named_boot_package_fails_init() {
        let config = "boot_package = \"boot\"\n[console]\nenabled = false\n";
        let err = Device::init(bundle(config, &[]), Box::new(NullGame)).unwrap_err();
        assert!(matches!(err, DeviceError::Resource(_)));
    }

    #[test]
    fn failing_game_init_surfaces_as_device_error() {
        let shared = Arc::new(Shared::default());
        let game = Box::new(TestGame {
            shared: Arc::clone(&shared),
            fail_init: true,
        });

        let err = Device::init(bundle(NO_CONSOLE, &[]), game).unwrap_err();
        match err {
            DeviceError::Game { game, .. } => assert_eq!(game, "test"),
            other => panic!("unexpected error: {other}"),
        }
    }

    fn console_request(device: &mut Device, stream: &TcpStream, line: &str) -> String {
        let mut tx = stream.try_clone().unwrap();
        writeln!(tx, "{line}").unwrap();
        tx.flush().unwrap();

        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut response = String::new();
        loop {
            device.frame();
            match reader.read_line(&mut response) {
                Ok(0) => panic!("console closed the connection"),
                Ok(_) => return response.trim_end().to_string(),
                Err(e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    if Instant::now() > deadline {
                        panic!("no console response");
                    }
                }
                Err(e) => panic!("console read failed: {e}"),
            }
        }
    }

    fn connect(device: &Device) -> TcpStream {
        let port = device.console_port().unwrap();
        let stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(20)))
            .unwrap();
        stream
    }

    #[test]
    fn console_pause_command_drives_the_device() {
        let mut device =
            Device::init(bundle(PICK_PORT, &[]), Box::new(NullGame)).unwrap();
        let stream = connect(&device);

        let response =
            console_request(&mut device, &stream, r#"{"type":"command","command":"pause"}"#);
        assert!(response.contains("success"), "got: {response}");

        device.frame();
        assert!(device.is_paused());

        device.shutdown();
    }

    #[test]
    fn console_reload_command_republishes_new_bytes() {
        let fs = bundle(PICK_PORT, &[("data/a.txt", "old")]);
        let mut device =
            Device::init(Arc::clone(&fs) as Arc<dyn BundleFs>, Box::new(NullGame)).unwrap();

        let id = device.resources().load("data/a.txt").unwrap();
        device.resources().flush();
        assert_eq!(
            device.resources().get(id).as_deref(),
            Some(b"old".as_slice())
        );

        fs.insert("data/a.txt", b"new".to_vec()).unwrap();

        let stream = connect(&device);
        let response = console_request(
            &mut device,
            &stream,
            r#"{"type":"command","command":"reload","path":"data/a.txt"}"#,
        );
        assert!(response.contains("success"), "got: {response}");
        assert_eq!(
            device.resources().get(id).as_deref(),
            Some(b"new".as_slice())
        );

        device.shutdown();
    }
}
