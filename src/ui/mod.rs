//! Page shell served to the browser client: layout, theme persistence, session hydration,
//! and the legacy route redirect.

pub mod shell;
pub mod theme;

pub use shell::{Hydration, QueryClientConfig, SessionHint, render_shell};
pub use theme::{MemoryStorage, THEME_STORAGE_KEY, ThemeMode, ThemeStorage, ThemeToggle};
