use std::{fmt::Display, str::FromStr, time::Duration};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use global_hotkey::{
    hotkey::{Code, HotKey, Modifiers},
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};
use miette::{miette, Context, IntoDiagnostic};
use tracing::{debug, info};

use crate::result::{bail, Result};

use super::{CycleTrigger, Trigger};

/// How long to wait for a hotkey before handling window messages again
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Key names accepted in a combo. The first name of a key is the one displayed.
const KEYS: &[(&str, Code)] = &[
    ("a", Code::KeyA),
    ("b", Code::KeyB),
    ("c", Code::KeyC),
    ("d", Code::KeyD),
    ("e", Code::KeyE),
    ("f", Code::KeyF),
    ("g", Code::KeyG),
    ("h", Code::KeyH),
    ("i", Code::KeyI),
    ("j", Code::KeyJ),
    ("k", Code::KeyK),
    ("l", Code::KeyL),
    ("m", Code::KeyM),
    ("n", Code::KeyN),
    ("o", Code::KeyO),
    ("p", Code::KeyP),
    ("q", Code::KeyQ),
    ("r", Code::KeyR),
    ("s", Code::KeyS),
    ("t", Code::KeyT),
    ("u", Code::KeyU),
    ("v", Code::KeyV),
    ("w", Code::KeyW),
    ("x", Code::KeyX),
    ("y", Code::KeyY),
    ("z", Code::KeyZ),
    ("0", Code::Digit0),
    ("1", Code::Digit1),
    ("2", Code::Digit2),
    ("3", Code::Digit3),
    ("4", Code::Digit4),
    ("5", Code::Digit5),
    ("6", Code::Digit6),
    ("7", Code::Digit7),
    ("8", Code::Digit8),
    ("9", Code::Digit9),
    ("f1", Code::F1),
    ("f2", Code::F2),
    ("f3", Code::F3),
    ("f4", Code::F4),
    ("f5", Code::F5),
    ("f6", Code::F6),
    ("f7", Code::F7),
    ("f8", Code::F8),
    ("f9", Code::F9),
    ("f10", Code::F10),
    ("f11", Code::F11),
    ("f12", Code::F12),
    ("esc", Code::Escape),
    ("escape", Code::Escape),
    ("enter", Code::Enter),
    ("return", Code::Enter),
    ("space", Code::Space),
    ("tab", Code::Tab),
];

const MODIFIER_NAMES: [(Modifiers, &str); 4] = [
    (Modifiers::CONTROL, "ctrl"),
    (Modifiers::ALT, "alt"),
    (Modifiers::SHIFT, "shift"),
    (Modifiers::SUPER, "super"),
];

/// A key with its modifiers, e.g. `ctrl+g` or `alt+shift+f5`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCombo {
    code: Code,
    modifiers: Modifiers,
}

impl KeyCombo {
    /// The system-wide hotkey for this combo
    pub fn hotkey(&self) -> HotKey {
        let modifiers = (!self.modifiers.is_empty()).then_some(self.modifiers);
        HotKey::new(modifiers, self.code)
    }
}

impl FromStr for KeyCombo {
    type Err = miette::Report;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut modifiers = Modifiers::empty();
        let mut code = None;

        for part in s.split('+').map(|p| p.trim().to_lowercase()) {
            if code.is_some() {
                return Err(miette!("'{s}': the key must come after the modifiers"));
            }

            match part.as_str() {
                "ctrl" | "control" => modifiers |= Modifiers::CONTROL,
                "alt" | "option" => modifiers |= Modifiers::ALT,
                "shift" => modifiers |= Modifiers::SHIFT,
                "super" | "cmd" | "win" => modifiers |= Modifiers::SUPER,
                key => {
                    let found = KEYS.iter().find(|(name, _)| *name == key);
                    match found {
                        Some((_, key_code)) => code = Some(*key_code),
                        None => return Err(miette!("'{s}': unknown key '{key}'")),
                    }
                }
            }
        }

        let code = code.ok_or_else(|| miette!("'{s}': no key given"))?;
        Ok(Self { code, modifiers })
    }
}

impl Display for KeyCombo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (flag, name) in MODIFIER_NAMES {
            if self.modifiers.contains(flag) {
                write!(f, "{name}+")?;
            }
        }

        match KEYS.iter().find(|(_, code)| *code == self.code) {
            Some((name, _)) => f.write_str(name),
            None => write!(f, "{:?}", self.code),
        }
    }
}

/// Identifiers of the registered hotkeys, used to route OS events
#[derive(Debug, Clone, Copy)]
struct HotkeyIds {
    make: u32,
    quit: u32,
}

impl HotkeyIds {
    /// Map a hotkey event to a trigger, if it is a press of one of ours
    fn trigger_for(&self, id: u32, state: HotKeyState) -> Option<Trigger> {
        if state != HotKeyState::Pressed {
            None
        } else if id == self.make {
            Some(Trigger::MakeGif)
        } else if id == self.quit {
            Some(Trigger::Quit)
        } else {
            None
        }
    }
}

/// Wait for system-wide key combinations, whatever window has the focus.
///
/// The OS hook forwards presses to a channel. Presses made during a cycle
/// stay in the channel and are handled after it, in order.
pub struct HotkeyTrigger {
    _manager: GlobalHotKeyManager,
    events: Receiver<Trigger>,
    make: KeyCombo,
    quit: KeyCombo,
    announced: bool,
}

impl HotkeyTrigger {
    /// Register both combos with the OS.
    ///
    /// Must be called on the thread that then calls [`CycleTrigger::next_event`].
    pub fn new(make: KeyCombo, quit: KeyCombo) -> Result<Self> {
        if make == quit {
            return Err(miette!("The GIF and quit hotkeys must be different ({make})").into());
        }
        if cfg!(target_os = "macos") {
            // Hotkey events are only delivered to a running application event loop
            return bail("Global hotkeys are not supported on macOS, use the prompt trigger");
        }

        let manager = GlobalHotKeyManager::new()
            .into_diagnostic()
            .wrap_err("Could not listen to global hotkeys")?;
        for combo in [make, quit] {
            manager
                .register(combo.hotkey())
                .into_diagnostic()
                .wrap_err_with(|| format!("Could not register the {combo} hotkey"))?;
        }

        let ids = HotkeyIds {
            make: make.hotkey().id(),
            quit: quit.hotkey().id(),
        };
        let (sender, events) = unbounded();
        GlobalHotKeyEvent::set_event_handler(Some(move |event: GlobalHotKeyEvent| {
            debug!("Hotkey event: {event:?}");
            if let Some(trigger) = ids.trigger_for(event.id(), event.state()) {
                // The receiver only goes away when the program stops
                let _ = sender.send(trigger);
            }
        }));

        Ok(Self {
            _manager: manager,
            events,
            make,
            quit,
            announced: false,
        })
    }
}

impl CycleTrigger for HotkeyTrigger {
    fn next_event(&mut self) -> Result<Trigger> {
        if !self.announced {
            info!("Press {} to create a gif, {} to quit", self.make, self.quit);
            self.announced = true;
        }

        wait_for_trigger(&self.events)
    }
}

fn wait_for_trigger(events: &Receiver<Trigger>) -> Result<Trigger> {
    loop {
        pump_messages();
        match events.recv_timeout(POLL_INTERVAL) {
            Ok(trigger) => return Ok(trigger),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return bail("The hotkey listener stopped"),
        }
    }
}

/// Windows delivers hotkeys as messages to the thread that registered them
#[cfg(windows)]
fn pump_messages() {
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, PeekMessageW, TranslateMessage, MSG, PM_REMOVE,
    };

    // SAFETY: MSG is plain data, and the pointers given to the calls live for the whole loop
    unsafe {
        let mut msg: MSG = std::mem::zeroed();
        while PeekMessageW(&mut msg, std::ptr::null_mut(), 0, 0, PM_REMOVE) != 0 {
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}

#[cfg(not(windows))]
fn pump_messages() {}
