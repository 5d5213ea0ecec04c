//! The [`Easel`] facade: public window operations over one renderer process.
//!
//! A window moves through Unopened → Open → Closed; an unexpected renderer
//! death moves every open window to Invalid at once and fires the registered
//! termination callback exactly once. Renderer death is never surfaced as an
//! error from ordinary calls: operations degrade to a "no response" result
//! so long-running loops keep executing safely.

use std::ops::ControlFlow;

use image::RgbImage;

use easel_protocol::{
    is_ack, parse_checksums, parse_geometry, parse_window_id, Request, WindowGeometry, WindowId,
};

use crate::channel::{SyncChannel, Transport};
use crate::config::LaunchConfig;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::registry::WindowRegistry;
use crate::supervisor::Supervisor;

// ---------------------------------------------------------------------------
// WindowOptions
// ---------------------------------------------------------------------------

/// Parameters for opening a window.
#[derive(Debug, Clone, Copy)]
pub struct WindowOptions {
    pub width: i32,
    pub height: i32,
    /// Number of image slots laid out in a grid. Defaults to 1.
    pub image_count: i32,
    /// Initial screen position. Negative coordinates let the renderer choose.
    pub pos_x: i32,
    pub pos_y: i32,
}

impl WindowOptions {
    pub fn sized(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            image_count: 1,
            pos_x: -1,
            pos_y: -1,
        }
    }

    pub fn image_count(mut self, count: i32) -> Self {
        self.image_count = count;
        self
    }

    pub fn position(mut self, x: i32, y: i32) -> Self {
        self.pos_x = x;
        self.pos_y = y;
        self
    }
}

// ---------------------------------------------------------------------------
// Easel
// ---------------------------------------------------------------------------

/// Controller for one renderer process and its windows.
///
/// Generic over [`Transport`] so controller behavior can be exercised
/// against a scripted transport; production code uses the default
/// [`SyncChannel`] via [`Easel::launch`].
pub struct Easel<T: Transport = SyncChannel> {
    transport: T,
    registry: WindowRegistry,
    testing: bool,
    on_exit: Option<Box<dyn FnMut()>>,
    exit_seen: bool,
}

impl Easel<SyncChannel> {
    /// Spawn the renderer described by `config` and wrap it in a controller.
    pub fn launch(config: LaunchConfig) -> Result<Self> {
        let testing = config.is_testing();
        let supervisor = Supervisor::spawn(&config)?;
        Ok(Self::with_transport(SyncChannel::new(supervisor), testing))
    }

    /// OS process ID of the renderer while it is running.
    pub fn renderer_pid(&self) -> Option<u32> {
        self.transport.supervisor().pid()
    }
}

impl<T: Transport> Easel<T> {
    /// Build a controller over an arbitrary transport. `testing` is carried
    /// in every OPEN payload.
    pub fn with_transport(transport: T, testing: bool) -> Self {
        Self {
            transport,
            registry: WindowRegistry::new(),
            testing,
            on_exit: None,
            exit_seen: false,
        }
    }

    /// Register the callback invoked exactly once when renderer death is
    /// first observed. Explicit [`terminate`](Easel::terminate) does not
    /// count as a death.
    pub fn on_termination<F: FnMut() + 'static>(&mut self, callback: F) {
        self.on_exit = Some(Box::new(callback));
    }

    /// Whether the renderer process is still running.
    pub fn is_alive(&mut self) -> bool {
        let alive = self.transport.is_alive();
        if !alive {
            self.note_death();
        }
        alive
    }

    /// Open a new window. Returns the renderer-assigned ID, or `Ok(None)`
    /// when the renderer is not alive.
    pub fn open(&mut self, title: &str, opts: WindowOptions) -> Result<Option<WindowId>> {
        let request = Request::Open {
            width: opts.width,
            height: opts.height,
            image_count: opts.image_count,
            pos_x: opts.pos_x,
            pos_y: opts.pos_y,
            testing: self.testing,
            title,
        };
        match self.roundtrip(&request) {
            None => Ok(None),
            Some(reply) => {
                let id = parse_window_id(&reply)?;
                self.registry.register(id);
                log::debug!("opened window {id} ({}x{})", opts.width, opts.height);
                Ok(Some(id))
            }
        }
    }

    /// Close a window, releasing its renderer-side resources. Returns whether
    /// the renderer acknowledged; the ID is unregistered either way.
    pub fn close(&mut self, id: WindowId) -> Result<bool> {
        self.registry.verify(id)?;
        let reply = self.roundtrip(&Request::Close { window: id });
        self.registry.forget(id);
        Ok(reply.is_some_and(|r| is_ack(&r)))
    }

    /// Query a window's dimensions, position and image slot count. `Ok(None)`
    /// when the renderer is not alive.
    pub fn info(&mut self, id: WindowId) -> Result<Option<WindowGeometry>> {
        self.registry.verify(id)?;
        match self.roundtrip(&Request::WindowInfo { window: id }) {
            None => Ok(None),
            Some(reply) => Ok(Some(parse_geometry(&reply)?)),
        }
    }

    /// Push a set of images to a window, one per slot in slot order. The
    /// count should match the window's configured slot count; a mismatch is
    /// a protocol violation whose handling is renderer-defined.
    pub fn update(&mut self, id: WindowId, frames: &[Frame]) -> Result<()> {
        self.registry.verify(id)?;
        if frames.is_empty() {
            return Err(Error::NoImages);
        }
        let images = frames
            .iter()
            .map(Frame::to_encoded)
            .collect::<Result<Vec<_>>>()?;
        let request = Request::UpdateImages {
            window: id,
            images: &images,
        };
        // The ack keeps the channel half-duplex; its content is irrelevant,
        // and a dead renderer degrades to no response.
        let _ = self.roundtrip(&request);
        Ok(())
    }

    /// Testing-only: per-slot content hashes of the window's last update, in
    /// slot order. `Ok(None)` when the renderer is not alive.
    pub fn checksums(&mut self, id: WindowId) -> Result<Option<Vec<String>>> {
        self.registry.verify(id)?;
        match self.roundtrip(&Request::Checksums { window: id }) {
            None => Ok(None),
            Some(reply) => Ok(Some(parse_checksums(&reply))),
        }
    }

    /// Open a window and run a frame loop over it: each iteration hands the
    /// caller a fresh bitmap to draw into, then pushes it to the window.
    ///
    /// `frames == 0` runs unboundedly; otherwise exactly `frames` iterations.
    /// The closure can end the loop early by returning
    /// [`ControlFlow::Break`], in which case that bitmap is not pushed. The
    /// loop also ends when the renderer dies (the termination callback still
    /// fires). Returns the window ID, or `Ok(None)` when the renderer was
    /// not alive to open one.
    pub fn animate<F>(
        &mut self,
        title: &str,
        opts: WindowOptions,
        frames: u32,
        mut draw: F,
    ) -> Result<Option<WindowId>>
    where
        F: FnMut(u32, &mut RgbImage) -> ControlFlow<()>,
    {
        let opts = WindowOptions {
            image_count: 1,
            ..opts
        };
        let Some(id) = self.open(title, opts)? else {
            return Ok(None);
        };

        let width = opts.width.max(0) as u32;
        let height = opts.height.max(0) as u32;
        let mut i = 0;
        while frames == 0 || i < frames {
            let mut bitmap = RgbImage::new(width, height);
            if draw(i, &mut bitmap).is_break() {
                break;
            }
            self.update(id, &[Frame::Bitmap(bitmap)])?;
            if self.exit_seen {
                break;
            }
            i += 1;
        }
        Ok(Some(id))
    }

    /// Tear down the renderer and its streams. Idempotent; also runs on
    /// drop, so every exit path releases the process.
    pub fn terminate(&mut self) {
        self.on_exit = None;
        self.transport.shutdown();
    }

    /// One encode-send-receive cycle plus death bookkeeping.
    fn roundtrip(&mut self, request: &Request<'_>) -> Option<Vec<u8>> {
        let reply = self.transport.exchange(&request.encode(), true);
        if reply.is_none() {
            self.note_death();
        }
        reply
    }

    /// Invalidate all windows and fire the termination callback, exactly
    /// once, when the renderer has died on its own.
    fn note_death(&mut self) {
        if self.exit_seen || !self.transport.exited_unexpectedly() {
            return;
        }
        self.exit_seen = true;
        self.registry.clear();
        log::warn!("renderer exited unexpectedly; all windows invalidated");
        if let Some(mut callback) = self.on_exit.take() {
            callback();
        }
    }
}

impl<T: Transport> Drop for Easel<T> {
    fn drop(&mut self) {
        self.terminate();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Scripted transport: pops one canned reply per exchange and records
    /// every request it was asked to send.
    struct FakeTransport {
        replies: VecDeque<Vec<u8>>,
        sent: Vec<Vec<u8>>,
        alive: bool,
        exited: bool,
    }

    impl FakeTransport {
        fn with_replies<const N: usize>(replies: [&[u8]; N]) -> Self {
            Self {
                replies: replies.iter().map(|r| r.to_vec()).collect(),
                sent: Vec::new(),
                alive: true,
                exited: false,
            }
        }

        fn dead() -> Self {
            Self {
                replies: VecDeque::new(),
                sent: Vec::new(),
                alive: false,
                exited: true,
            }
        }
    }

    impl Transport for FakeTransport {
        fn exchange(&mut self, request: &[u8], expect_reply: bool) -> Option<Vec<u8>> {
            if !self.alive {
                return None;
            }
            self.sent.push(request.to_vec());
            if !expect_reply {
                return Some(Vec::new());
            }
            self.replies.pop_front()
        }

        fn is_alive(&mut self) -> bool {
            self.alive
        }

        fn exited_unexpectedly(&self) -> bool {
            self.exited
        }

        fn shutdown(&mut self) {
            self.alive = false;
        }
    }

    fn opts() -> WindowOptions {
        WindowOptions::sized(300, 300).position(20, 50)
    }

    #[test]
    fn open_registers_renderer_assigned_id() {
        let mut easel = Easel::with_transport(FakeTransport::with_replies([b"1"]), false);
        let id = easel.open("test", opts()).unwrap().unwrap();
        assert_eq!(id, WindowId(1));
        assert!(easel.registry.contains(id));
    }

    #[test]
    fn open_sends_testing_flag_from_config() {
        let mut easel = Easel::with_transport(FakeTransport::with_replies([b"1"]), true);
        easel.open("test", opts()).unwrap();
        let sent = &easel.transport.sent[0];
        let expect = Request::Open {
            width: 300,
            height: 300,
            image_count: 1,
            pos_x: 20,
            pos_y: 50,
            testing: true,
            title: "test",
        }
        .encode();
        assert_eq!(*sent, expect);
    }

    #[test]
    fn open_on_dead_renderer_returns_none() {
        let mut easel = Easel::with_transport(FakeTransport::dead(), false);
        assert!(easel.open("test", opts()).unwrap().is_none());
    }

    #[test]
    fn open_with_malformed_id_reply_errors() {
        let mut easel = Easel::with_transport(FakeTransport::with_replies([b"not an id"]), false);
        assert!(matches!(
            easel.open("test", opts()),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn close_verifies_before_any_io() {
        let mut easel = Easel::with_transport(FakeTransport::with_replies([]), false);
        assert!(matches!(
            easel.close(WindowId(1)),
            Err(Error::UnknownWindow(WindowId(1)))
        ));
        assert!(easel.transport.sent.is_empty());
    }

    #[test]
    fn close_unregisters_the_window() {
        let mut easel = Easel::with_transport(FakeTransport::with_replies([b"1", b"true"]), false);
        let id = easel.open("test", opts()).unwrap().unwrap();
        assert!(easel.close(id).unwrap());
        assert!(matches!(easel.info(id), Err(Error::UnknownWindow(_))));
    }

    #[test]
    fn info_parses_geometry_reply() {
        let mut easel =
            Easel::with_transport(FakeTransport::with_replies([b"1", b"300|300|20|50|1"]), false);
        let id = easel.open("test", opts()).unwrap().unwrap();
        let geometry = easel.info(id).unwrap().unwrap();
        assert_eq!(
            geometry,
            WindowGeometry {
                width: 300,
                height: 300,
                pos_x: 20,
                pos_y: 50,
                image_count: 1,
            }
        );
    }

    #[test]
    fn info_with_wrong_field_count_errors() {
        let mut easel =
            Easel::with_transport(FakeTransport::with_replies([b"1", b"300|300|20"]), false);
        let id = easel.open("test", opts()).unwrap().unwrap();
        assert!(matches!(
            easel.info(id),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn update_with_no_images_fails_before_io() {
        let mut easel = Easel::with_transport(FakeTransport::with_replies([b"1"]), false);
        let id = easel.open("test", opts()).unwrap().unwrap();
        assert!(matches!(easel.update(id, &[]), Err(Error::NoImages)));
        assert_eq!(easel.transport.sent.len(), 1); // only the OPEN
    }

    #[test]
    fn update_sends_length_prefixed_images_in_order() {
        let mut easel = Easel::with_transport(FakeTransport::with_replies([b"1", b"true"]), false);
        let id = easel.open("test", opts()).unwrap().unwrap();
        easel
            .update(id, &[Frame::from(b"first".as_slice()), Frame::from(b"second".as_slice())])
            .unwrap();

        let images = vec![b"first".to_vec(), b"second".to_vec()];
        let expect = Request::UpdateImages {
            window: id,
            images: &images,
        }
        .encode();
        assert_eq!(easel.transport.sent[1], expect);
    }

    #[test]
    fn checksums_split_reply_per_slot() {
        let mut easel =
            Easel::with_transport(FakeTransport::with_replies([b"1", b"aa|bb"]), false);
        let id = easel.open("test", opts()).unwrap().unwrap();
        assert_eq!(easel.checksums(id).unwrap().unwrap(), ["aa", "bb"]);
    }

    #[test]
    fn termination_callback_fires_exactly_once() {
        let fired = Rc::new(Cell::new(0u32));
        let observer = Rc::clone(&fired);

        let mut easel = Easel::with_transport(FakeTransport::with_replies([b"1"]), false);
        easel.on_termination(move || observer.set(observer.get() + 1));
        let id = easel.open("test", opts()).unwrap().unwrap();

        easel.transport.alive = false;
        easel.transport.exited = true;

        // First dead operation: callback fires, windows are invalidated.
        assert!(easel.info(id).unwrap().is_none());
        assert_eq!(fired.get(), 1);
        assert!(easel.registry.is_empty());

        // Subsequent operations stay quiet.
        assert!(easel.open("again", opts()).unwrap().is_none());
        assert!(!easel.is_alive());
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn explicit_terminate_does_not_fire_callback() {
        let fired = Rc::new(Cell::new(0u32));
        let observer = Rc::clone(&fired);

        let mut easel = Easel::with_transport(FakeTransport::with_replies([]), false);
        easel.on_termination(move || observer.set(observer.get() + 1));
        easel.terminate();
        easel.terminate();

        assert!(easel.open("test", opts()).unwrap().is_none());
        assert_eq!(fired.get(), 0);
    }

    #[test]
    fn animate_pushes_one_update_per_frame() {
        let mut easel = Easel::with_transport(
            FakeTransport::with_replies([b"1", b"true", b"true", b"true"]),
            false,
        );
        let mut drawn = Vec::new();
        let id = easel
            .animate("loop", WindowOptions::sized(32, 32), 3, |i, bitmap| {
                drawn.push(i);
                bitmap.put_pixel(0, 0, image::Rgb([255, 255, 255]));
                ControlFlow::Continue(())
            })
            .unwrap();

        assert_eq!(id, Some(WindowId(1)));
        assert_eq!(drawn, [0, 1, 2]);
        // One OPEN plus exactly three UPDATE_IMG requests, in order.
        assert_eq!(easel.transport.sent.len(), 4);
        for update in &easel.transport.sent[1..] {
            assert_eq!(&update[..4], &3i32.to_be_bytes());
        }
    }

    #[test]
    fn animate_break_skips_the_final_push() {
        let mut easel =
            Easel::with_transport(FakeTransport::with_replies([b"1", b"true"]), false);
        let mut calls = 0;
        easel
            .animate("loop", WindowOptions::sized(8, 8), 0, |i, _| {
                calls += 1;
                if i == 1 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();

        assert_eq!(calls, 2);
        assert_eq!(easel.transport.sent.len(), 2); // OPEN + one update
    }
}
