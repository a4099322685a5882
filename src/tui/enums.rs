//! Enumerations for TUI state management.

/// Which screen the interactive UI is showing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppState {
    TaskList,
    AddTask,
    EditReminder,
    Help,
}

/// Field focused in the add-task form.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FormField {
    Text,
    Reminder,
}

impl FormField {
    /// The other field; the form only has two.
    pub fn toggle(self) -> Self {
        match self {
            FormField::Text => FormField::Reminder,
            FormField::Reminder => FormField::Text,
        }
    }
}
