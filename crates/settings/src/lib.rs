pub mod preferences;
pub mod snippets;
pub mod storage;

pub use preferences::{
    EditorPreferences, LoggingPreferences, Preferences, PreferencesError, PreferencesStore,
};
pub use snippets::{SnippetDefinition, SnippetExpansion, SnippetStore};
pub use storage::BookmarkStore;
