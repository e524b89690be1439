//! System-wide shortcuts.
//!
//! Ctrl+Alt+C shows or hides the window, Ctrl+Alt+V puts the most recent
//! entry back on the clipboard.

use anyhow::Context;
use clipring::ClipboardManager;
use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager};
use log::{debug, info, warn};
use std::sync::Arc;

/// Whatever can show and hide the history window.
pub trait WindowToggle: Send + Sync {
    fn toggle_visibility(&self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShortcutAction {
    ToggleWindow,
    PasteRecent,
}

pub struct Bindings {
    toggle: HotKey,
    paste: HotKey,
}

impl Default for Bindings {
    fn default() -> Self {
        let modifiers = Some(Modifiers::CONTROL | Modifiers::ALT);
        Self {
            toggle: HotKey::new(modifiers, Code::KeyC),
            paste: HotKey::new(modifiers, Code::KeyV),
        }
    }
}

impl Bindings {
    pub fn action_for(&self, id: u32) -> Option<ShortcutAction> {
        if id == self.toggle.id() {
            Some(ShortcutAction::ToggleWindow)
        } else if id == self.paste.id() {
            Some(ShortcutAction::PasteRecent)
        } else {
            None
        }
    }
}

#[derive(Clone)]
pub struct Shortcuts {
    manager: Arc<ClipboardManager>,
    window: Arc<dyn WindowToggle>,
}

impl Shortcuts {
    pub fn new(manager: Arc<ClipboardManager>, window: Arc<dyn WindowToggle>) -> Self {
        Self { manager, window }
    }

    pub fn dispatch(&self, action: ShortcutAction) {
        debug!("shortcut: {:?}", action);
        match action {
            ShortcutAction::ToggleWindow => self.window.toggle_visibility(),
            ShortcutAction::PasteRecent => {
                if self.manager.entry_count() == 0 {
                    return;
                }
                if let Err(e) = self.manager.copy_to_clipboard(0) {
                    warn!("could not copy most recent entry: {}", e);
                }
            }
        }
    }

    /// Register both shortcuts and start the thread that dispatches them.
    ///
    /// The returned manager owns the OS registrations; dropping it
    /// unregisters them.
    pub fn register(self) -> anyhow::Result<GlobalHotKeyManager> {
        let hotkeys =
            GlobalHotKeyManager::new().context("global shortcuts are unavailable")?;
        let bindings = Bindings::default();

        hotkeys
            .register(bindings.toggle)
            .context("failed to register Ctrl+Alt+C")?;
        hotkeys
            .register(bindings.paste)
            .context("failed to register Ctrl+Alt+V")?;

        std::thread::Builder::new()
            .name("shortcuts".into())
            .spawn(move || {
                let receiver = GlobalHotKeyEvent::receiver();
                while let Ok(event) = receiver.recv() {
                    if let Some(action) = bindings.action_for(event.id) {
                        self.dispatch(action);
                    }
                }
            })
            .context("failed to start shortcut thread")?;

        info!("global shortcuts registered (Ctrl+Alt+C, Ctrl+Alt+V)");
        Ok(hotkeys)
    }
}
