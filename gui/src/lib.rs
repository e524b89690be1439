// gui/src/lib.rs
//! Window state for the clipboard history, kept free of any toolkit so the
//! egui shell in `main.rs` only draws `Model` and runs the returned `Effect`.

pub mod daemon;
pub mod shortcuts;

use clipring::{format_size, Entry};

const QUICK_LABEL_LEN: usize = 15;

#[derive(Clone, Debug, PartialEq)]
pub struct ClipRow {
    /// Position in the history, which is what the session APIs take.
    pub index: usize,
    pub text: String,
    pub preview: String,
    pub quick_label: String,
    pub time: String,
    pub size_str: Option<String>,
}

impl ClipRow {
    pub fn from_entry(index: usize, entry: &Entry, preview_len: usize) -> Self {
        Self {
            index,
            text: entry.text().to_string(),
            preview: entry.preview(preview_len).replace(['\n', '\t'], " "),
            quick_label: entry.preview(QUICK_LABEL_LEN).replace(['\n', '\t'], " "),
            time: entry.formatted_time(),
            size_str: if entry.size() > 1024 {
                Some(format_size(entry.size()))
            } else {
                None
            },
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Model {
    pub clips: Vec<ClipRow>,
    pub search_query: String,
    /// Index into `filtered()`.
    pub selected_index: usize,
    pub quick_access_count: usize,
    pub confirm_clear: bool,
    pub status: Option<String>,
}

impl Model {
    pub fn new(quick_access_count: usize) -> Self {
        Self {
            quick_access_count,
            ..Self::default()
        }
    }

    /// Rows whose full text contains the search query (case-sensitive).
    pub fn filtered(&self) -> Vec<&ClipRow> {
        self.clips
            .iter()
            .filter(|clip| clip.text.contains(&self.search_query))
            .collect()
    }

    /// The most recent rows, regardless of the search query.
    pub fn quick_access(&self) -> &[ClipRow] {
        let count = self.quick_access_count.min(self.clips.len());
        &self.clips[..count]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    ClipsLoaded(Vec<ClipRow>),
    UpdateSearch(String),
    SelectIndex(usize),
    /// Position in the filtered list.
    CopyClip(usize),
    /// Position in the quick access strip.
    CopyQuick(usize),
    Copied,
    CopyFailed(String),
    /// Position in the filtered list.
    DeleteClip(usize),
    RequestClear,
    ConfirmClear,
    CancelClear,
    DismissStatus,
    KeyPress(Key),
    /// The window manager asked to close the window.
    CloseRequested,
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Enter,
    Escape,
}

/// Work for the shell. Indices are history positions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    None,
    Copy(usize),
    Remove(usize),
    Clear,
    Hide,
    /// Stop polling and exit the application.
    Quit,
}

pub fn update(model: &mut Model, event: Event) -> Effect {
    match event {
        Event::ClipsLoaded(clips) => {
            model.clips = clips;
            let max = model.filtered().len().saturating_sub(1);
            model.selected_index = model.selected_index.min(max);
            Effect::None
        }
        Event::UpdateSearch(query) => {
            model.search_query = query;
            model.selected_index = 0;
            Effect::None
        }
        Event::SelectIndex(index) => {
            if index < model.filtered().len() {
                model.selected_index = index;
            }
            Effect::None
        }
        Event::CopyClip(position) => match model.filtered().get(position) {
            Some(clip) => Effect::Copy(clip.index),
            None => Effect::None,
        },
        Event::CopyQuick(position) => match model.quick_access().get(position) {
            Some(clip) => Effect::Copy(clip.index),
            None => Effect::None,
        },
        Event::Copied => {
            model.status = None;
            model.selected_index = 0;
            Effect::Hide
        }
        Event::CopyFailed(message) => {
            model.status = Some(message);
            Effect::None
        }
        Event::DeleteClip(position) => match model.filtered().get(position) {
            Some(clip) => Effect::Remove(clip.index),
            None => Effect::None,
        },
        Event::RequestClear => {
            model.confirm_clear = !model.clips.is_empty();
            Effect::None
        }
        Event::ConfirmClear => {
            if model.confirm_clear {
                model.confirm_clear = false;
                model.selected_index = 0;
                Effect::Clear
            } else {
                Effect::None
            }
        }
        Event::CancelClear => {
            model.confirm_clear = false;
            Effect::None
        }
        Event::DismissStatus => {
            model.status = None;
            Effect::None
        }
        // closing only hides; the session keeps recording in the background
        Event::CloseRequested => {
            model.confirm_clear = false;
            Effect::Hide
        }
        Event::Quit => Effect::Quit,
        Event::KeyPress(key) => match key {
            Key::Up => {
                model.selected_index = model.selected_index.saturating_sub(1);
                Effect::None
            }
            Key::Down => {
                let max = model.filtered().len().saturating_sub(1);
                if model.selected_index < max {
                    model.selected_index += 1;
                }
                Effect::None
            }
            Key::Enter => update(model, Event::CopyClip(model.selected_index)),
            Key::Escape => {
                if model.confirm_clear {
                    model.confirm_clear = false;
                    Effect::None
                } else {
                    Effect::Hide
                }
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(texts: &[&str]) -> Vec<ClipRow> {
        texts
            .iter()
            .enumerate()
            .map(|(index, text)| ClipRow::from_entry(index, &Entry::new(*text).unwrap(), 50))
            .collect()
    }

    fn loaded(texts: &[&str]) -> Model {
        let mut model = Model::new(5);
        update(&mut model, Event::ClipsLoaded(rows(texts)));
        model
    }

    #[test]
    fn test_row_preview_is_single_line() {
        let row = ClipRow::from_entry(0, &Entry::new("a\nb\tc").unwrap(), 50);
        assert_eq!(row.preview, "a b c");
        assert_eq!(row.text, "a\nb\tc");
        assert!(row.size_str.is_none());
    }

    #[test]
    fn test_quick_label_is_short() {
        let row = ClipRow::from_entry(0, &Entry::new("a rather long clipboard entry").unwrap(), 50);
        assert_eq!(row.quick_label, "a rather lon...");
    }

    #[test]
    fn test_search_is_case_sensitive_substring() {
        let mut model = loaded(&["Rust book", "rustc flags", "python"]);
        update(&mut model, Event::UpdateSearch("rust".into()));

        let hits: Vec<usize> = model.filtered().iter().map(|clip| clip.index).collect();
        assert_eq!(hits, vec![1]);
    }

    #[test]
    fn test_copy_maps_filtered_position_to_history_index() {
        let mut model = loaded(&["alpha", "beta", "alphabet"]);
        update(&mut model, Event::UpdateSearch("alpha".into()));

        assert_eq!(update(&mut model, Event::CopyClip(1)), Effect::Copy(2));
        assert_eq!(update(&mut model, Event::CopyClip(2)), Effect::None);
    }

    #[test]
    fn test_quick_access_ignores_search() {
        let mut model = loaded(&["1", "2", "3", "4", "5", "6", "7"]);
        update(&mut model, Event::UpdateSearch("7".into()));

        assert_eq!(model.quick_access().len(), 5);
        assert_eq!(update(&mut model, Event::CopyQuick(4)), Effect::Copy(4));
        assert_eq!(update(&mut model, Event::CopyQuick(5)), Effect::None);
    }

    #[test]
    fn test_keyboard_navigation() {
        let mut model = loaded(&["a", "b", "c"]);

        update(&mut model, Event::KeyPress(Key::Up));
        assert_eq!(model.selected_index, 0);
        update(&mut model, Event::KeyPress(Key::Down));
        update(&mut model, Event::KeyPress(Key::Down));
        update(&mut model, Event::KeyPress(Key::Down));
        assert_eq!(model.selected_index, 2);

        assert_eq!(update(&mut model, Event::KeyPress(Key::Enter)), Effect::Copy(2));
        assert_eq!(update(&mut model, Event::KeyPress(Key::Escape)), Effect::Hide);
    }

    #[test]
    fn test_reload_clamps_selection() {
        let mut model = loaded(&["a", "b", "c"]);
        update(&mut model, Event::SelectIndex(2));
        update(&mut model, Event::ClipsLoaded(rows(&["a"])));

        assert_eq!(model.selected_index, 0);
    }

    #[test]
    fn test_clear_requires_confirmation() {
        let mut model = loaded(&["a", "b"]);

        assert_eq!(update(&mut model, Event::ConfirmClear), Effect::None);
        update(&mut model, Event::RequestClear);
        assert!(model.confirm_clear);
        assert_eq!(update(&mut model, Event::KeyPress(Key::Escape)), Effect::None);
        assert!(!model.confirm_clear);

        update(&mut model, Event::RequestClear);
        assert_eq!(update(&mut model, Event::ConfirmClear), Effect::Clear);
        assert!(!model.confirm_clear);
    }

    #[test]
    fn test_clear_on_empty_history_does_not_prompt() {
        let mut model = loaded(&[]);
        update(&mut model, Event::RequestClear);
        assert!(!model.confirm_clear);
    }

    #[test]
    fn test_delete_maps_to_history_index() {
        let mut model = loaded(&["keep", "drop me", "keep too"]);
        update(&mut model, Event::UpdateSearch("drop".into()));

        assert_eq!(update(&mut model, Event::DeleteClip(0)), Effect::Remove(1));
    }

    #[test]
    fn test_copy_failure_sets_status_and_success_hides() {
        let mut model = loaded(&["a"]);

        assert_eq!(
            update(&mut model, Event::CopyFailed("clipboard busy".into())),
            Effect::None
        );
        assert_eq!(model.status.as_deref(), Some("clipboard busy"));

        assert_eq!(update(&mut model, Event::Copied), Effect::Hide);
        assert!(model.status.is_none());
    }

    #[test]
    fn test_close_request_hides_instead_of_quitting() {
        let mut model = loaded(&["a", "b"]);
        update(&mut model, Event::RequestClear);

        assert_eq!(update(&mut model, Event::CloseRequested), Effect::Hide);
        assert!(!model.confirm_clear);
        assert_eq!(model.clips.len(), 2);
    }

    #[test]
    fn test_quit_is_explicit() {
        let mut model = loaded(&["a"]);
        assert_eq!(update(&mut model, Event::Quit), Effect::Quit);
    }
}
