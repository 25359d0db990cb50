//! Global mouse button monitoring through a macOS CGEventTap.
//!
//! The tap runs on its own thread with a CFRunLoop and forwards left/right
//! button down and up events through a channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use core_foundation::runloop::{
    kCFRunLoopCommonModes, kCFRunLoopDefaultMode, CFRunLoop, CFRunLoopRunResult,
};
use core_graphics::event::{
    CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement, CGEventType,
};
use crossbeam_channel::{Receiver, Sender};

use super::click_event::{ButtonTransition, ListenerError, MouseButton, PointerEventSource};

/// A passive listener for global mouse button transitions.
pub struct ClickListener {
    running: Arc<AtomicBool>,
    run_loop: Arc<Mutex<Option<CFRunLoop>>>,
    handle: Option<JoinHandle<()>>,
}

impl ClickListener {
    /// Create the event tap on a background thread and wait for it to be
    /// installed. Fails without accessibility permission.
    pub fn start() -> Result<(Self, Receiver<ButtonTransition>), ListenerError> {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = Arc::clone(&running);
        let (tx, rx) = crossbeam_channel::unbounded::<ButtonTransition>();
        let (setup_tx, setup_rx) = crossbeam_channel::bounded::<Result<(), ListenerError>>(1);
        let run_loop_holder: Arc<Mutex<Option<CFRunLoop>>> = Arc::new(Mutex::new(None));
        let run_loop_clone = Arc::clone(&run_loop_holder);

        let handle = thread::Builder::new()
            .name("pointer-event-tap".to_string())
            .spawn(move || {
                Self::run_event_loop(running_clone, tx, setup_tx, run_loop_clone);
            })?;

        let listener = Self {
            running,
            run_loop: run_loop_holder,
            handle: Some(handle),
        };

        match setup_rx.recv_timeout(Duration::from_secs(5)) {
            Ok(Ok(())) => Ok((listener, rx)),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(ListenerError::SetupTimeout),
        }
    }

    fn run_event_loop(
        running: Arc<AtomicBool>,
        tx: Sender<ButtonTransition>,
        setup_tx: Sender<Result<(), ListenerError>>,
        run_loop_holder: Arc<Mutex<Option<CFRunLoop>>>,
    ) {
        let events_of_interest = vec![
            CGEventType::LeftMouseDown,
            CGEventType::LeftMouseUp,
            CGEventType::RightMouseDown,
            CGEventType::RightMouseUp,
        ];

        let tap_result = CGEventTap::new(
            CGEventTapLocation::HID,
            CGEventTapPlacement::HeadInsertEventTap,
            CGEventTapOptions::ListenOnly,
            events_of_interest,
            move |_proxy, event_type, event| {
                let (button, pressed) = match event_type {
                    CGEventType::LeftMouseDown => (MouseButton::Left, true),
                    CGEventType::LeftMouseUp => (MouseButton::Left, false),
                    CGEventType::RightMouseDown => (MouseButton::Right, true),
                    CGEventType::RightMouseUp => (MouseButton::Right, false),
                    _ => return None,
                };
                let location = event.location();
                let transition =
                    ButtonTransition::new(button, pressed, location.x as i32, location.y as i32);

                // Receiver gone means the session is over.
                let _ = tx.send(transition);

                // Passive tap: pass the event through unchanged.
                None
            },
        );

        let tap = match tap_result {
            Ok(tap) => tap,
            Err(()) => {
                let _ = setup_tx.send(Err(ListenerError::EventTap));
                return;
            }
        };

        let loop_source = match tap.mach_port.create_runloop_source(0) {
            Ok(source) => source,
            Err(()) => {
                let _ = setup_tx.send(Err(ListenerError::RunLoopSource));
                return;
            }
        };

        let current_run_loop = CFRunLoop::get_current();
        *run_loop_holder.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(current_run_loop.clone());

        unsafe {
            current_run_loop.add_source(&loop_source, kCFRunLoopCommonModes);
        }
        tap.enable();
        let _ = setup_tx.send(Ok(()));

        // kCFRunLoopCommonModes is only valid for adding sources; run in the
        // default mode with a timeout so the running flag is rechecked.
        while running.load(Ordering::SeqCst) {
            let result = unsafe {
                CFRunLoop::run_in_mode(kCFRunLoopDefaultMode, Duration::from_millis(100), true)
            };
            if result == CFRunLoopRunResult::Stopped {
                break;
            }
        }

        unsafe {
            current_run_loop.remove_source(&loop_source, kCFRunLoopCommonModes);
        }
    }

    /// Stop the run loop and wait for the tap thread to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(run_loop) = self
            .run_loop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            run_loop.stop();
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    #[cfg(test)]
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for ClickListener {
    fn drop(&mut self) {
        self.stop();
    }
}

/// [`PointerEventSource`] backed by a [`ClickListener`] per session.
#[derive(Default)]
pub struct EventTapSource {
    listener: Option<ClickListener>,
}

impl EventTapSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PointerEventSource for EventTapSource {
    fn start(&mut self) -> Result<Receiver<ButtonTransition>, ListenerError> {
        self.stop();
        let (listener, events) = ClickListener::start()?;
        self.listener = Some(listener);
        Ok(events)
    }

    fn stop(&mut self) {
        if let Some(mut listener) = self.listener.take() {
            listener.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_listener_starts_and_stops() {
        // Without accessibility permission this returns an error instead of panicking.
        match ClickListener::start() {
            Ok((mut listener, _events)) => {
                assert!(listener.is_running());
                listener.stop();
                assert!(!listener.is_running());
            }
            Err(e) => {
                println!("Click listener could not start (expected without permissions): {e}");
                let message = e.to_string();
                assert!(message.contains("accessibility") || message.contains("event tap") || message.contains("run loop"));
            }
        }
    }

    #[test]
    fn event_tap_source_stop_is_idempotent() {
        let mut source = EventTapSource::new();
        source.stop();
        if let Ok(events) = source.start() {
            assert!(events.recv_timeout(Duration::from_millis(10)).is_err());
        }
        source.stop();
        source.stop();
    }
}
