pub mod alerts;
pub mod diagnostics;
pub mod editor;

pub use alerts::{Alert, AlertSummary, AlertsDashboard};
pub use diagnostics::{DiagnosticTest, DiagnosticTestInput};
pub use editor::{DiagnosticTestEditor, EditorAction, EditorSnapshot};
