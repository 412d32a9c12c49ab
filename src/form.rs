/*!
 * The trim form: validated fields, path pickers and the submit action.
 *
 * Fields are composed from a text value and a [`Validator`] instead of one
 * widget type per kind of input. The same [`PathPicker`] serves the video,
 * subtitle and output entries, configured by its [`PickMode`] and name
 * filters. The directory new picks start from is held in an explicit
 * [`SessionConfig`] handed in by the caller.
 */

use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::app_config::SessionConfig;
use crate::app_controller::TrimRequest;
use crate::errors::TrimError;
use crate::time_field::{TimeOfDay, TimeRange, TimeValidator};

/// Live validity of a field's text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Can never become valid
    Invalid,
    /// Not valid yet, but typing more could make it valid
    Intermediate,
    /// Ready to be used
    Acceptable,
}

impl Validity {
    /// Background colour used for live feedback
    pub fn color(&self) -> &'static str {
        match self {
            Self::Acceptable => "#c4df9b",
            Self::Intermediate => "#fff79a",
            Self::Invalid => "#f6989d",
        }
    }

    /// Terminal escape sequence matching [`Validity::color`]
    pub fn ansi(&self) -> &'static str {
        match self {
            Self::Acceptable => "\x1B[1;32m",
            Self::Intermediate => "\x1B[1;33m",
            Self::Invalid => "\x1B[1;31m",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Acceptable => "acceptable",
            Self::Intermediate => "incomplete",
            Self::Invalid => "invalid",
        }
    }
}

/// Decides the validity of a field's text
pub trait Validator {
    fn validate(&self, text: &str) -> Validity;

    /// Replacement for text left `Intermediate` when editing ends
    fn fixup(&self, _text: &str) -> Option<String> {
        None
    }
}

impl<V: Validator + ?Sized> Validator for Box<V> {
    fn validate(&self, text: &str) -> Validity {
        (**self).validate(text)
    }

    fn fixup(&self, text: &str) -> Option<String> {
        (**self).fixup(text)
    }
}

/// Accepts paths of existing files; anything else is still being typed
#[derive(Debug, Clone, Copy, Default)]
pub struct FileValidator;

impl Validator for FileValidator {
    fn validate(&self, text: &str) -> Validity {
        if !text.is_empty() && Path::new(text).is_file() {
            Validity::Acceptable
        } else {
            Validity::Intermediate
        }
    }
}

/// Accepts any text
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyText;

impl Validator for AnyText {
    fn validate(&self, _text: &str) -> Validity {
        Validity::Acceptable
    }
}

/// A text entry checked by a validator on every change
#[derive(Debug, Clone)]
pub struct ValidatedField<V> {
    text: String,
    validity: Option<Validity>,
    validator: V,
}

impl<V: Validator> ValidatedField<V> {
    pub fn new(validator: V) -> Self {
        let mut field = Self {
            text: String::new(),
            validity: None,
            validator,
        };
        // Initial text gets checked like any other
        field.set_text("");
        field
    }

    pub fn with_text(validator: V, text: &str) -> Self {
        let mut field = Self::new(validator);
        field.set_text(text);
        field
    }

    /// Replace the text and refresh the live validity
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.validity = Some(self.validator.validate(&self.text));
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Editing is over: let the validator complete an `Intermediate` entry
    pub fn finish_editing(&mut self) {
        if self.validity() != Validity::Intermediate {
            return;
        }
        if let Some(fixed) = self.validator.fixup(&self.text) {
            self.set_text(&fixed);
        }
    }

    pub fn validity(&self) -> Validity {
        self.validity.unwrap_or(Validity::Intermediate)
    }

    /// Submit-time check: only `Acceptable` counts as ready
    pub fn is_ready(&self) -> bool {
        self.validity() == Validity::Acceptable
    }
}

/// Entry for an `HH:MM:SS`-ish time
pub type TimeField = ValidatedField<TimeValidator>;

impl ValidatedField<TimeValidator> {
    /// Parsed value, ready or not
    pub fn time(&self) -> Result<TimeOfDay, TrimError> {
        TimeOfDay::parse(&self.text)
    }

    /// Parsed value, rejecting entries still being typed
    pub fn submit(&self, field: &str) -> Result<TimeOfDay, TrimError> {
        if !self.is_ready() {
            return Err(TrimError::invalid_format(field, &self.text));
        }
        TimeOfDay::parse_field(field, &self.text)
    }
}

/// Whether a picker opens an existing file or names a new one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickMode {
    Open,
    Save,
}

/// Named list of file name patterns, like "Videos (*.mp4 *.mpg *.avi)"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

impl FileFilter {
    pub fn new(name: &str, extensions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    /// Filters matching everything
    pub fn all_files() -> Self {
        Self::new("All files", &["*"])
    }

    pub fn matches(&self, path: &Path) -> bool {
        if self.extensions.iter().any(|e| e == "*") {
            return true;
        }
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.extensions.contains(&ext))
    }
}

impl std::fmt::Display for FileFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let patterns: Vec<String> = self.extensions.iter().map(|e| format!("*.{}", e)).collect();
        write!(f, "{} ({})", self.name, patterns.join(" "))
    }
}

/// A path entry with a picking action
pub struct PathPicker {
    pub title: String,
    pub mode: PickMode,
    pub filters: Vec<FileFilter>,
    field: ValidatedField<Box<dyn Validator + Send + Sync>>,
}

impl std::fmt::Debug for PathPicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathPicker")
            .field("title", &self.title)
            .field("mode", &self.mode)
            .field("text", &self.field.text())
            .finish()
    }
}

impl PathPicker {
    /// Picker for an existing file, validated against the file system
    pub fn open(title: &str, filters: Vec<FileFilter>) -> Self {
        Self::with_validator(title, PickMode::Open, filters, Box::new(FileValidator))
    }

    /// Picker naming a file that may not exist yet
    pub fn save(title: &str) -> Self {
        Self::with_validator(title, PickMode::Save, vec![FileFilter::all_files()], Box::new(AnyText))
    }

    pub fn with_validator(
        title: &str,
        mode: PickMode,
        filters: Vec<FileFilter>,
        validator: Box<dyn Validator + Send + Sync>,
    ) -> Self {
        Self {
            title: title.to_string(),
            mode,
            filters,
            field: ValidatedField::new(validator),
        }
    }

    /// Take a chosen path, resolving relative entries against the session
    /// directory, and remember where it was picked from.
    pub fn pick<P: AsRef<Path>>(&mut self, chosen: P, session: &mut SessionConfig) {
        let chosen = chosen.as_ref();
        let resolved = if chosen.is_absolute() {
            chosen.to_path_buf()
        } else {
            session.start_dir().join(chosen)
        };

        if self.mode == PickMode::Open && !self.filters.iter().any(|f| f.matches(&resolved)) {
            let names: Vec<String> = self.filters.iter().map(|f| f.to_string()).collect();
            warn!("{}: {:?} does not match {}", self.title, resolved, names.join(", "));
        }

        if let Some(parent) = resolved.parent().filter(|p| !p.as_os_str().is_empty()) {
            session.remember(parent);
        }
        debug!("{}: picked {:?}", self.title, resolved);
        self.set_text(&resolved.to_string_lossy());
    }

    pub fn set_text(&mut self, text: &str) {
        self.field.set_text(text);
    }

    pub fn text(&self) -> &str {
        self.field.text()
    }

    pub fn path(&self) -> Option<PathBuf> {
        if self.text().is_empty() {
            None
        } else {
            Some(PathBuf::from(self.text()))
        }
    }

    pub fn validity(&self) -> Validity {
        self.field.validity()
    }

    pub fn has_acceptable_input(&self) -> bool {
        self.field.is_ready()
    }
}

/// The whole trim form
#[derive(Debug)]
pub struct TrimForm {
    pub video: PathPicker,
    pub subtitles: PathPicker,
    pub output: PathPicker,
    pub start: TimeField,
    pub stop: TimeField,
}

impl Default for TrimForm {
    fn default() -> Self {
        Self::new()
    }
}

impl TrimForm {
    pub fn new() -> Self {
        Self {
            video: PathPicker::open(
                "Open video",
                vec![FileFilter::new("Videos", &["mp4", "mpg", "avi"]), FileFilter::all_files()],
            ),
            subtitles: PathPicker::open(
                "Open subtitle",
                vec![FileFilter::new("SubRip Subtitles", &["srt"]), FileFilter::all_files()],
            ),
            output: PathPicker::save("Save as"),
            start: TimeField::new(TimeValidator),
            stop: TimeField::new(TimeValidator),
        }
    }

    /// Pick the video; the subtitle entry follows with the same stem and `.srt`
    pub fn pick_video<P: AsRef<Path>>(&mut self, chosen: P, session: &mut SessionConfig) {
        self.video.pick(chosen, session);
        self.video_changed();
    }

    fn video_changed(&mut self) {
        if let Some(video) = self.video.path() {
            let subtitles = video.with_extension("srt");
            self.subtitles.set_text(&subtitles.to_string_lossy());
        }
    }

    /// Collapse the form into a request; every field must be ready
    pub fn submit(&self) -> Result<TrimRequest, TrimError> {
        let input_video_path = self.video.path().ok_or_else(|| TrimError::InputNotFound(PathBuf::new()))?;
        if !self.video.has_acceptable_input() {
            return Err(TrimError::InputNotFound(input_video_path));
        }

        let output_base_path = self.output.path().ok_or(TrimError::MissingOutput)?;

        let start = self.start.submit("start")?;
        let stop = self.stop.submit("stop")?;

        Ok(TrimRequest {
            input_video_path,
            input_subtitle_path: self.subtitles.path(),
            output_base_path,
            range: TimeRange::new(start, stop),
        })
    }
}
