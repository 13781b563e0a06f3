//! Key hint definitions for the help bar.

/// The input context a key hint line is shown for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyContext {
    /// Browsing the issue list.
    IssueList,
    /// Typing a search term in the issue list.
    IssueSearch,
    /// The issue list failed to load.
    IssueListError,
    /// Filling in the create issue form.
    CreateIssue,
}

/// Get the hint line for a context.
///
/// Keys are written in brackets so the help bar can style them.
pub fn get_context_hints(context: KeyContext) -> &'static str {
    match context {
        KeyContext::IssueList => {
            "[j/k] move  [/] search  [Enter] open  [c] comments  [n] new issue  [r] reload  [q] quit"
        }
        KeyContext::IssueSearch => "[type] filter  [Enter] done  [Esc] clear search",
        KeyContext::IssueListError => "[r] retry  [q] quit",
        KeyContext::CreateIssue => {
            "[Tab/Shift+Tab] next/prev field  [←/→] change option  [Enter] submit  [Esc] cancel"
        }
    }
}
