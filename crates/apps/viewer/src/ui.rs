use crate::fields::FieldOptions;

/// User-facing side of the viewer: dialogs, the status line and the field picker.
pub trait ViewerUi {
    /// Blocking problem; the table was not loaded.
    fn show_error(&mut self, message: &str);
    /// Non-fatal problem; the table still renders.
    fn show_warning(&mut self, message: &str);
    /// Tile path of the viewport center, or `None` to clear the display.
    fn set_status(&mut self, status: Option<&str>);
    fn show_fields(&mut self, options: &FieldOptions);
    fn clear_fields(&mut self);
    fn set_loading(&mut self, loading: bool);
}

/// `ViewerUi` that keeps everything it is told, for tests and headless runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingUi {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub status: Option<String>,
    pub fields: Option<FieldOptions>,
    pub loading: bool,
    pub loading_transitions: Vec<bool>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ViewerUi for RecordingUi {
    fn show_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn show_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    fn set_status(&mut self, status: Option<&str>) {
        self.status = status.map(str::to_string);
    }

    fn show_fields(&mut self, options: &FieldOptions) {
        self.fields = Some(options.clone());
    }

    fn clear_fields(&mut self) {
        self.fields = None;
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
        self.loading_transitions.push(loading);
    }
}
