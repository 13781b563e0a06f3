//! Main application state and event loop.
//!
//! This module implements The Elm Architecture (TEA) pattern for predictable
//! state management in the TUI application. `update` and
//! `handle_api_message` never perform I/O: work that needs the network or
//! the browser is queued as an `Effect` and executed by the main loop.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tracing::{debug, info, trace, warn};

use crate::api::auth::{AuthContext, Session};
use crate::api::error::ApiError;
use crate::api::types::IssueDraft;
use crate::events::{Event, KeyContext};
use crate::tasks::{ApiMessage, RequestId};
use crate::ui::theme::theme;
use crate::ui::{
    render_context_help, CreateIssueAction, CreateIssueView, ListAction, ListView,
    NotificationManager,
};

/// A location in the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`: the issue list.
    List,
    /// `/create`: the create issue form.
    Create,
    /// `/issue/:id`: an issue's detail page.
    Issue(String),
    /// `/issue/:id#comments`: the comments section of an issue.
    Comments(String),
}

impl Route {
    /// The path of this route.
    pub fn path(&self) -> String {
        match self {
            Route::List => "/".to_string(),
            Route::Create => "/create".to_string(),
            Route::Issue(id) => format!("/issue/{}", id),
            Route::Comments(id) => format!("/issue/{}#comments", id),
        }
    }

    /// Parse a path into a route.
    pub fn parse(path: &str) -> Option<Route> {
        match path {
            "/" => return Some(Route::List),
            "/create" => return Some(Route::Create),
            _ => {}
        }

        let rest = path.strip_prefix("/issue/")?;
        let (id, comments) = match rest.split_once('#') {
            Some((id, "comments")) => (id, true),
            Some(_) => return None,
            None => (rest, false),
        };

        if id.is_empty() || id.contains('/') {
            return None;
        }

        Some(if comments {
            Route::Comments(id.to_string())
        } else {
            Route::Issue(id.to_string())
        })
    }

    /// Whether the route is served by the web application rather than this client.
    pub fn is_external(&self) -> bool {
        matches!(self, Route::Issue(_) | Route::Comments(_))
    }
}

/// Work requested by the app and carried out by the main loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the issue list.
    FetchIssues {
        request_id: RequestId,
        session: Session,
    },
    /// Create an issue.
    CreateIssue {
        request_id: RequestId,
        session: Session,
        draft: IssueDraft,
    },
    /// Open a URL in the user's browser.
    OpenUrl(String),
}

/// The main application struct that holds all state.
///
/// This implements the Model part of The Elm Architecture (TEA).
pub struct App {
    /// The screen on display. Always `List` or `Create`.
    route: Route,
    should_quit: bool,
    auth: AuthContext,
    list_view: ListView,
    /// Present while the create route is mounted.
    create_view: Option<CreateIssueView>,
    notifications: NotificationManager,
    /// Base URL of the web application, for routes opened in the browser.
    web_url: String,
    date_format: String,
    next_request_id: RequestId,
    /// The fetch the mounted list view is waiting for.
    list_request: Option<RequestId>,
    /// The submission the mounted create view is waiting for.
    create_request: Option<RequestId>,
    effects: Vec<Effect>,
}

impl App {
    /// Create the application on the list route.
    ///
    /// If the context already holds a session, a fetch is queued right away.
    pub fn new(auth: AuthContext, web_url: impl Into<String>, date_format: impl Into<String>) -> Self {
        let date_format = date_format.into();
        let web_url: String = web_url.into();
        let mut app = Self {
            route: Route::List,
            should_quit: false,
            auth,
            list_view: ListView::new(date_format.clone()),
            create_view: None,
            notifications: NotificationManager::new(),
            web_url: web_url.trim_end_matches('/').to_string(),
            date_format,
            next_request_id: 0,
            list_request: None,
            create_request: None,
            effects: Vec::new(),
        };
        app.mount_list();
        app
    }

    /// Get the current route.
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Check if the application should quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Get the session context.
    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    /// Get the issue list view.
    pub fn list_view(&self) -> &ListView {
        &self.list_view
    }

    /// Get the create issue view, if the create route is mounted.
    pub fn create_view(&self) -> Option<&CreateIssueView> {
        self.create_view.as_ref()
    }

    /// Get the notification queue.
    pub fn notifications(&self) -> &NotificationManager {
        &self.notifications
    }

    /// Take every queued effect.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Show an error toast.
    pub fn notify_error(&mut self, message: impl Into<String>) {
        self.notifications.error(message);
    }

    /// Sign in with a new session.
    pub fn set_session(&mut self, session: Session) {
        self.auth.login(session);
        self.on_session_changed();
    }

    /// Sign out.
    pub fn clear_session(&mut self) {
        self.auth.logout();
        self.on_session_changed();
    }

    fn on_session_changed(&mut self) {
        if self.route != Route::List {
            return;
        }
        if !self.auth.is_signed_in() {
            self.list_request = None;
        }
        if let Some(action) = self.list_view.on_session_changed(&self.auth) {
            self.handle_list_action(action);
        }
    }

    /// Go to a route.
    ///
    /// The list and create routes remount their view. Detail and comment
    /// routes are opened in the browser and the current screen stays.
    pub fn navigate(&mut self, route: Route) {
        debug!(path = %route.path(), "Navigating");

        if route.is_external() {
            let url = format!("{}{}", self.web_url, route.path());
            info!(%url, "Opening in browser");
            self.effects.push(Effect::OpenUrl(url));
            return;
        }

        match route {
            Route::Create => {
                self.list_request = None;
                self.create_view = Some(CreateIssueView::new());
                self.route = Route::Create;
            }
            _ => {
                self.create_view = None;
                self.create_request = None;
                self.route = Route::List;
                self.mount_list();
            }
        }
    }

    fn mount_list(&mut self) {
        self.list_view = ListView::new(self.date_format.clone());
        self.list_request = None;
        if let Some(action) = self.list_view.on_session_changed(&self.auth) {
            self.handle_list_action(action);
        }
    }

    fn allocate_request_id(&mut self) -> RequestId {
        self.next_request_id += 1;
        self.next_request_id
    }

    /// Handle an event.
    ///
    /// This implements the Update part of The Elm Architecture (TEA).
    pub fn update(&mut self, event: Event) {
        match event {
            Event::Quit => {
                info!("Quit event received");
                self.should_quit = true;
            }
            Event::Key(key_event) => {
                trace!(key = ?key_event.code, modifiers = ?key_event.modifiers, "Key event");
                self.handle_key_event(key_event);
            }
            Event::Resize(width, height) => {
                trace!(width, height, "Terminal resize event");
            }
            Event::Tick => {
                self.list_view.tick();
                self.notifications.tick();
            }
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            info!("Ctrl+C pressed, quitting");
            self.should_quit = true;
            return;
        }

        match self.route {
            Route::List => {
                if let Some(action) = self.list_view.handle_input(key) {
                    self.handle_list_action(action);
                }
            }
            Route::Create => {
                let signed_in = self.auth.is_signed_in();
                let action = self
                    .create_view
                    .as_mut()
                    .and_then(|view| view.handle_input(key, signed_in));
                if let Some(action) = action {
                    self.handle_create_action(action);
                }
            }
            Route::Issue(_) | Route::Comments(_) => {}
        }
    }

    fn handle_list_action(&mut self, action: ListAction) {
        match action {
            ListAction::Fetch => {
                let Some(session) = self.auth.session().cloned() else {
                    return;
                };
                let request_id = self.allocate_request_id();
                self.list_request = Some(request_id);
                self.effects.push(Effect::FetchIssues {
                    request_id,
                    session,
                });
            }
            ListAction::Retry => {
                debug!("Reloading issue list");
                self.mount_list();
            }
            ListAction::OpenIssue(id) => self.navigate(Route::Issue(id)),
            ListAction::OpenComments(id) => self.navigate(Route::Comments(id)),
            ListAction::CreateIssue => self.navigate(Route::Create),
            ListAction::Quit => {
                info!("Quit requested from issue list");
                self.should_quit = true;
            }
        }
    }

    fn handle_create_action(&mut self, action: CreateIssueAction) {
        match action {
            CreateIssueAction::Submit(draft) => {
                let Some(session) = self.auth.session().cloned() else {
                    warn!("Create submitted without a session");
                    return;
                };
                let request_id = self.allocate_request_id();
                self.create_request = Some(request_id);
                self.effects.push(Effect::CreateIssue {
                    request_id,
                    session,
                    draft,
                });
            }
            CreateIssueAction::Cancel => self.navigate(Route::List),
            CreateIssueAction::Created => {
                self.notifications.success("Issue created");
                self.navigate(Route::List);
            }
        }
    }

    /// Handle the result of a background request.
    ///
    /// Results for a view that has since been left or remounted are dropped.
    pub fn handle_api_message(&mut self, message: ApiMessage) {
        let request_id = message.request_id();
        let pending = match message {
            ApiMessage::IssuesFetched { .. } => &mut self.list_request,
            ApiMessage::IssueCreated { .. } => &mut self.create_request,
        };
        if *pending != Some(request_id) {
            debug!(request_id, "Dropping stale API result");
            return;
        }
        *pending = None;

        match message {
            ApiMessage::IssuesFetched { result, .. } => {
                if matches!(result, Err(ApiError::Unauthorized)) {
                    warn!("Issue list rejected the session token");
                    self.auth.expire();
                    self.notifications
                        .error("Session expired. Sign in again with `lazyissues auth login`");
                    self.on_session_changed();
                    return;
                }
                self.list_view.handle_fetch_result(result);
            }
            ApiMessage::IssueCreated { result, .. } => {
                let action = self
                    .create_view
                    .as_mut()
                    .and_then(|view| view.handle_submit_result(result));
                if let Some(action) = action {
                    self.handle_create_action(action);
                }
            }
        }
    }

    /// The help bar context for the current screen.
    pub fn key_context(&self) -> KeyContext {
        match self.route {
            Route::Create => KeyContext::CreateIssue,
            _ => self.list_view.key_context(),
        }
    }

    /// Render the application.
    ///
    /// This implements the View part of The Elm Architecture (TEA).
    pub fn view(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Header
                Constraint::Min(1),    // Content
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        self.render_header(frame, chunks[0]);

        match (&self.route, &self.create_view) {
            (Route::Create, Some(view)) => view.render(frame, chunks[1]),
            _ => self.list_view.render(frame, chunks[1]),
        }

        render_context_help(frame, chunks[2], self.key_context());
        self.notifications.render(frame, area);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let t = theme();

        let user = match self.auth.session() {
            Some(session) => format!(
                "Signed in as {}",
                session.user_name().unwrap_or("unknown user")
            ),
            None => "Not signed in".to_string(),
        };

        let line = Line::from(vec![
            Span::styled(
                "lazyissues",
                Style::default().fg(t.accent).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {}", self.route.path()), Style::default().fg(t.muted)),
            Span::raw("  "),
            Span::styled(user, Style::default().fg(t.fg)),
        ]);

        let header = Paragraph::new(line).block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(t.border)),
        );
        frame.render_widget(header, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{Issue, IssuePriority, IssueStatus};
    use crate::ui::views::{LoadState, CREATE_FAILED_MESSAGE, SIGN_IN_REQUIRED_MESSAGE};

    const WEB: &str = "http://localhost:5173";

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.update(key(KeyCode::Char(c)));
        }
    }

    fn issue(id: &str, status: IssueStatus) -> Issue {
        Issue {
            id: id.to_string(),
            title: format!("Issue {}", id),
            description: None,
            status,
            priority: IssuePriority::Low,
            assignee: None,
            author: None,
            category: None,
            comment_count: None,
            created_at: None,
        }
    }

    fn signed_in_app() -> App {
        App::new(
            AuthContext::with_session(Session::new("tok").with_user("Dana")),
            WEB,
            "%Y",
        )
    }

    fn fetch_id(effects: &[Effect]) -> RequestId {
        match effects {
            [Effect::FetchIssues { request_id, .. }] => *request_id,
            other => panic!("expected one fetch, got {:?}", other),
        }
    }

    fn loaded_app() -> App {
        let mut app = signed_in_app();
        let id = fetch_id(&app.take_effects());
        app.handle_api_message(ApiMessage::IssuesFetched {
            request_id: id,
            result: Ok(vec![issue("a", IssueStatus::Open), issue("b", IssueStatus::Closed)]),
        });
        app
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::List.path(), "/");
        assert_eq!(Route::Create.path(), "/create");
        assert_eq!(Route::Issue("42".into()).path(), "/issue/42");
        assert_eq!(Route::Comments("42".into()).path(), "/issue/42#comments");
    }

    #[test]
    fn test_route_parse() {
        assert_eq!(Route::parse("/"), Some(Route::List));
        assert_eq!(Route::parse("/create"), Some(Route::Create));
        assert_eq!(Route::parse("/issue/42"), Some(Route::Issue("42".into())));
        assert_eq!(
            Route::parse("/issue/42#comments"),
            Some(Route::Comments("42".into()))
        );
        assert_eq!(Route::parse("/issue/"), None);
        assert_eq!(Route::parse("/issue/42#history"), None);
        assert_eq!(Route::parse("/issue/4/2"), None);
        assert_eq!(Route::parse("/settings"), None);
    }

    #[test]
    fn test_signed_in_start_fetches() {
        let mut app = signed_in_app();
        let effects = app.take_effects();

        assert_eq!(effects.len(), 1);
        assert!(matches!(
            &effects[0],
            Effect::FetchIssues { session, .. } if session.token() == "tok"
        ));
        assert_eq!(app.list_view().load_state(), &LoadState::Loading);
    }

    #[test]
    fn test_signed_out_start_makes_no_request() {
        let mut app = App::new(AuthContext::new(), WEB, "%Y");

        assert!(app.take_effects().is_empty());
        assert_eq!(app.list_view().load_state(), &LoadState::Idle);
    }

    #[test]
    fn test_login_later_fetches() {
        let mut app = App::new(AuthContext::new(), WEB, "%Y");
        app.set_session(Session::new("fresh"));

        fetch_id(&app.take_effects());
        assert!(app.auth().is_signed_in());
    }

    #[test]
    fn test_stale_fetch_result_is_ignored() {
        let mut app = signed_in_app();
        let first = fetch_id(&app.take_effects());

        app.set_session(Session::new("rotated"));
        let second = fetch_id(&app.take_effects());
        assert_ne!(first, second);

        app.handle_api_message(ApiMessage::IssuesFetched {
            request_id: first,
            result: Ok(vec![issue("old", IssueStatus::Open)]),
        });
        assert_eq!(app.list_view().load_state(), &LoadState::Loading);

        app.handle_api_message(ApiMessage::IssuesFetched {
            request_id: second,
            result: Ok(vec![issue("new", IssueStatus::Open)]),
        });
        assert_eq!(app.list_view().load_state(), &LoadState::Loaded);
        assert_eq!(app.list_view().issues()[0].id, "new");
    }

    #[test]
    fn test_unauthorized_expires_session() {
        let mut app = signed_in_app();
        let id = fetch_id(&app.take_effects());

        app.handle_api_message(ApiMessage::IssuesFetched {
            request_id: id,
            result: Err(ApiError::Unauthorized),
        });

        assert!(!app.auth().is_signed_in());
        assert_eq!(app.list_view().load_state(), &LoadState::Idle);
        assert_eq!(app.notifications().len(), 1);
        assert!(app.take_effects().is_empty());
    }

    #[test]
    fn test_logout_drops_in_flight_fetch() {
        let mut app = signed_in_app();
        let id = fetch_id(&app.take_effects());
        app.clear_session();

        app.handle_api_message(ApiMessage::IssuesFetched {
            request_id: id,
            result: Ok(vec![issue("a", IssueStatus::Open)]),
        });
        assert_eq!(app.list_view().load_state(), &LoadState::Idle);
    }

    #[test]
    fn test_retry_remounts_and_fetches() {
        let mut app = signed_in_app();
        let id = fetch_id(&app.take_effects());
        app.handle_api_message(ApiMessage::IssuesFetched {
            request_id: id,
            result: Err(ApiError::ServerError("down".into())),
        });

        app.update(key(KeyCode::Char('r')));
        let retry = fetch_id(&app.take_effects());
        assert_ne!(id, retry);
        assert_eq!(app.list_view().load_state(), &LoadState::Loading);
    }

    #[test]
    fn test_open_issue_and_comments_in_browser() {
        let mut app = loaded_app();

        app.update(key(KeyCode::Enter));
        app.update(key(KeyCode::Char('j')));
        app.update(key(KeyCode::Char('c')));

        assert_eq!(
            app.take_effects(),
            vec![
                Effect::OpenUrl(format!("{}/issue/a", WEB)),
                Effect::OpenUrl(format!("{}/issue/b#comments", WEB)),
            ]
        );
        assert_eq!(app.route(), &Route::List);
    }

    #[test]
    fn test_create_success_returns_to_list_and_refetches() {
        let mut app = loaded_app();
        app.update(key(KeyCode::Char('n')));
        assert_eq!(app.route(), &Route::Create);

        type_str(&mut app, "Login broken");
        app.update(key(KeyCode::Enter));

        let effects = app.take_effects();
        let create_id = match effects.as_slice() {
            [Effect::CreateIssue {
                request_id, draft, ..
            }] => {
                assert_eq!(
                    draft,
                    &IssueDraft {
                        title: "Login broken".to_string(),
                        ..IssueDraft::default()
                    }
                );
                *request_id
            }
            other => panic!("expected one create, got {:?}", other),
        };

        app.handle_api_message(ApiMessage::IssueCreated {
            request_id: create_id,
            result: Ok(()),
        });

        assert_eq!(app.route(), &Route::List);
        assert!(app.create_view().is_none());
        assert_eq!(app.notifications().len(), 1);
        fetch_id(&app.take_effects());
        assert_eq!(app.list_view().load_state(), &LoadState::Loading);
    }

    #[test]
    fn test_create_rejection_stays_on_form() {
        let mut app = loaded_app();
        app.update(key(KeyCode::Char('n')));
        type_str(&mut app, "Dup");
        app.update(key(KeyCode::Enter));
        let create_id = match app.take_effects().as_slice() {
            [Effect::CreateIssue { request_id, .. }] => *request_id,
            other => panic!("expected one create, got {:?}", other),
        };

        app.handle_api_message(ApiMessage::IssueCreated {
            request_id: create_id,
            result: Err(ApiError::Rejected {
                status: 400,
                message: None,
            }),
        });

        assert_eq!(app.route(), &Route::Create);
        assert_eq!(
            app.create_view().and_then(CreateIssueView::error),
            Some(CREATE_FAILED_MESSAGE)
        );
        assert_eq!(
            app.create_view().map(|v| v.draft().title),
            Some("Dup".to_string())
        );
        assert!(app.take_effects().is_empty());
    }

    #[test]
    fn test_create_without_session_sends_nothing() {
        let mut app = App::new(AuthContext::new(), WEB, "%Y");
        app.update(key(KeyCode::Char('n')));
        type_str(&mut app, "Offline");
        app.update(key(KeyCode::Enter));

        assert!(app.take_effects().is_empty());
        assert_eq!(
            app.create_view().and_then(CreateIssueView::error),
            Some(SIGN_IN_REQUIRED_MESSAGE)
        );
    }

    #[test]
    fn test_cancel_returns_to_list() {
        let mut app = loaded_app();
        app.update(key(KeyCode::Char('n')));
        app.take_effects();

        app.update(key(KeyCode::Esc));

        assert_eq!(app.route(), &Route::List);
        fetch_id(&app.take_effects());
    }

    #[test]
    fn test_fetch_result_after_leaving_list_is_ignored() {
        let mut app = signed_in_app();
        let id = fetch_id(&app.take_effects());
        app.update(key(KeyCode::Char('n')));

        app.handle_api_message(ApiMessage::IssuesFetched {
            request_id: id,
            result: Ok(vec![issue("a", IssueStatus::Open)]),
        });
        assert!(app.list_view().issues().is_empty());
    }

    #[test]
    fn test_quit_keys() {
        let mut app = loaded_app();
        app.update(key(KeyCode::Char('q')));
        assert!(app.should_quit());

        let mut app = loaded_app();
        app.update(Event::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert!(app.should_quit());

        let mut app = loaded_app();
        app.update(Event::Quit);
        assert!(app.should_quit());
    }

    #[test]
    fn test_q_types_into_create_form() {
        let mut app = loaded_app();
        app.update(key(KeyCode::Char('n')));
        app.update(key(KeyCode::Char('q')));

        assert!(!app.should_quit());
        assert_eq!(
            app.create_view().map(|v| v.draft().title),
            Some("q".to_string())
        );
    }

    #[test]
    fn test_key_context_follows_route() {
        let mut app = loaded_app();
        assert_eq!(app.key_context(), KeyContext::IssueList);
        app.update(key(KeyCode::Char('n')));
        assert_eq!(app.key_context(), KeyContext::CreateIssue);
    }
}
