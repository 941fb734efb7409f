//! In-memory Task Manager Plus device.
//!
//! [`MockDevice`] implements [`AutomationDriver`] by rendering the screen the
//! simulated app is on into a flat list of nodes and resolving selectors
//! against it. Clicking a node applies the same transition the real app
//! performs, so page objects can be exercised end to end without an
//! emulator. Every command is recorded in a call history for verification.

use crate::driver::{AutomationDriver, ElementRef};
use crate::locator::{Selector, BUTTON_CLASS, IMAGE_BUTTON_CLASS, TEXT_VIEW_CLASS};
use crate::locators::{
    ids, APP_PACKAGE, NAVIGATION_MENU_CONTENT_DESC, TASK_MANAGER_MENU_ITEM_TEXT,
};
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Text the simulated home fragment shows
pub const DEFAULT_HOME_TEXT: &str = "This is home Fragment";

const EDIT_TEXT_CLASS: &str = "android.widget.EditText";
const CHECK_BOX_CLASS: &str = "android.widget.CheckBox";
const RECYCLER_VIEW_CLASS: &str = "androidx.recyclerview.widget.RecyclerView";
const DIALOG_NEGATIVE_BUTTON: &str = "android:id/button2";

/// Screens of the simulated app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    /// Launch screen with the home text
    Home,
    /// Task list with search, filters and rows
    TaskList,
    /// Add task form
    AddTask,
    /// Edit task form
    EditTask,
    /// Read-only task details
    TaskDetails,
    /// Delete confirmation dialog over the task list
    DeleteDialog,
}

/// A task stored by the simulated app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTask {
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Completion flag
    pub completed: bool,
}

impl MockTask {
    /// Create a task
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>, completed: bool) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            completed,
        }
    }

    /// Status label shown on the details screen
    #[must_use]
    pub const fn status(&self) -> &'static str {
        if self.completed {
            "Completed"
        } else {
            "Pending"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Search,
    Title,
    Description,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    None,
    OpenDrawer,
    OpenTaskManager,
    OpenAddForm,
    OpenEditForm(usize),
    OpenDeleteDialog(usize),
    OpenDetails(usize),
    ToggleCompletedFilter,
    TogglePendingFilter,
    ToggleFormCompleted,
    Save,
    ConfirmDelete,
    CancelDelete,
}

#[derive(Debug, Clone)]
struct Node {
    key: String,
    id: String,
    class: &'static str,
    text: String,
    content_desc: String,
    selected: bool,
    displayed: bool,
    enabled: bool,
    parent: Option<String>,
    field: Option<Field>,
    action: Action,
}

impl Node {
    fn new(key: impl Into<String>, id: &str, class: &'static str) -> Self {
        Self {
            key: key.into(),
            id: id.to_string(),
            class,
            text: String::new(),
            content_desc: String::new(),
            selected: false,
            displayed: true,
            enabled: true,
            parent: None,
            field: None,
            action: Action::None,
        }
    }

    fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    fn parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    fn field(mut self, field: Field) -> Self {
        self.field = Some(field);
        self
    }

    fn action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    fn resource_id(&self) -> String {
        if self.id.contains(':') || self.id.is_empty() {
            self.id.clone()
        } else {
            format!("{APP_PACKAGE}:id/{}", self.id)
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "text" => Some(self.text.clone()),
            "content-desc" => Some(self.content_desc.clone()),
            "resource-id" => Some(self.resource_id()),
            _ => None,
        }
    }

    fn matches(&self, selector: &Selector) -> ProbeResult<bool> {
        Ok(match selector {
            Selector::Id(id) => {
                !self.id.is_empty() && (*id == self.id || *id == self.resource_id())
            }
            Selector::AccessibilityId(label) => {
                !label.is_empty() && *label == self.content_desc
            }
            Selector::ClassName(class) => class == self.class,
            Selector::XPath(expr) => {
                let (class, attr, value) = parse_xpath(expr)?;
                (class == "*" || class == self.class)
                    && self.attribute(&attr).as_deref() == Some(value.as_str())
            }
        })
    }
}

/// Parse the `//Class[@attr='value']` form the suite generates.
fn parse_xpath(expr: &str) -> ProbeResult<(String, String, String)> {
    let invalid = || ProbeError::WebDriver {
        command: "find element".to_string(),
        error: "invalid selector".to_string(),
        message: format!("mock device cannot evaluate xpath {expr}"),
    };

    let body = expr.strip_prefix("//").ok_or_else(invalid)?;
    let (class, rest) = body.split_once("[@").ok_or_else(invalid)?;
    let rest = rest.strip_suffix(']').ok_or_else(invalid)?;
    let (attr, literal) = rest.split_once('=').ok_or_else(invalid)?;
    let value = literal
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .or_else(|| literal.strip_prefix('"').and_then(|v| v.strip_suffix('"')))
        .ok_or_else(invalid)?;
    Ok((class.to_string(), attr.to_string(), value.to_string()))
}

#[derive(Debug, Default, Clone)]
struct Form {
    title: String,
    description: String,
    completed: bool,
}

#[derive(Debug)]
struct DeviceState {
    screen: Screen,
    drawer_open: bool,
    home_text: String,
    tasks: Vec<MockTask>,
    search: String,
    completed_filter: bool,
    pending_filter: bool,
    form: Form,
    current: Option<usize>,
    render_delay: u32,
    find_calls: u32,
    hidden: HashSet<String>,
    disabled: HashSet<String>,
    history: Vec<String>,
    quit: bool,
}

impl DeviceState {
    fn visible_tasks(&self) -> Vec<usize> {
        let needle = self.search.to_lowercase();
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| needle.is_empty() || t.title.to_lowercase().contains(&needle))
            .filter(|(_, t)| match (self.completed_filter, self.pending_filter) {
                (true, false) => t.completed,
                (false, true) => !t.completed,
                _ => true,
            })
            .map(|(i, _)| i)
            .collect()
    }

    fn render(&self) -> Vec<Node> {
        let mut nodes = Vec::new();

        if matches!(self.screen, Screen::Home | Screen::TaskList) {
            let mut toggle =
                Node::new("nav_button", "", IMAGE_BUTTON_CLASS).action(Action::OpenDrawer);
            toggle.content_desc = NAVIGATION_MENU_CONTENT_DESC.to_string();
            nodes.push(toggle);
        }

        match self.screen {
            Screen::Home => {
                nodes.push(
                    Node::new(ids::TEXT_HOME, ids::TEXT_HOME, TEXT_VIEW_CLASS)
                        .text(&self.home_text),
                );
            }
            Screen::TaskList | Screen::DeleteDialog => self.render_list(&mut nodes),
            Screen::AddTask => self.render_form(
                &mut nodes,
                ids::ADD_TASK_TITLE,
                ids::ADD_TASK_DESCRIPTION,
                ids::ADD_TASK_COMPLETED_CHECKBOX,
            ),
            Screen::EditTask => self.render_form(
                &mut nodes,
                ids::EDIT_TASK_TITLE,
                ids::EDIT_TASK_DESCRIPTION,
                ids::EDIT_TASK_COMPLETED_CHECKBOX,
            ),
            Screen::TaskDetails => {
                if let Some(task) = self.current.and_then(|i| self.tasks.get(i)) {
                    let details = [
                        ("detail:title", ids::TASK_DETAIL_TITLE, task.title.as_str()),
                        (
                            "detail:description",
                            ids::TASK_DETAIL_DESCRIPTION,
                            task.description.as_str(),
                        ),
                        ("detail:status", ids::TASK_DETAIL_STATUS, task.status()),
                    ];
                    for (key, id, text) in details {
                        nodes.push(Node::new(key, id, TEXT_VIEW_CLASS).text(text));
                    }
                }
            }
        }

        if self.screen == Screen::DeleteDialog {
            nodes.push(
                Node::new("dialog:confirm", ids::DIALOG_POSITIVE_BUTTON, BUTTON_CLASS)
                    .text("DELETE")
                    .action(Action::ConfirmDelete),
            );
            nodes.push(
                Node::new("dialog:cancel", DIALOG_NEGATIVE_BUTTON, BUTTON_CLASS)
                    .text("CANCEL")
                    .action(Action::CancelDelete),
            );
        }

        if self.drawer_open {
            nodes.push(
                Node::new(ids::TASK_MENU_ITEM, ids::TASK_MENU_ITEM, TEXT_VIEW_CLASS)
                    .text(TASK_MANAGER_MENU_ITEM_TEXT)
                    .action(Action::OpenTaskManager),
            );
        }

        for node in &mut nodes {
            node.displayed = !self.hidden.contains(&node.id);
            node.enabled = !self.disabled.contains(&node.id);
        }
        nodes
    }

    fn render_list(&self, nodes: &mut Vec<Node>) {
        nodes.push(
            Node::new(ids::SEARCH_TASK, ids::SEARCH_TASK, EDIT_TEXT_CLASS)
                .text(&self.search)
                .field(Field::Search),
        );
        nodes.push(
            Node::new(ids::ADD_TASK_BUTTON, ids::ADD_TASK_BUTTON, IMAGE_BUTTON_CLASS)
                .action(Action::OpenAddForm),
        );
        let completed = ids::COMPLETED_FILTER_CHECKBOX;
        nodes.push(
            Node::new(completed, completed, CHECK_BOX_CLASS)
                .text("Completed")
                .selected(self.completed_filter)
                .action(Action::ToggleCompletedFilter),
        );
        let pending = ids::PENDING_FILTER_CHECKBOX;
        nodes.push(
            Node::new(pending, pending, CHECK_BOX_CLASS)
                .text("Pending")
                .selected(self.pending_filter)
                .action(Action::TogglePendingFilter),
        );
        nodes.push(Node::new(ids::TASK_LIST, ids::TASK_LIST, RECYCLER_VIEW_CLASS));

        for i in self.visible_tasks() {
            let task = &self.tasks[i];
            nodes.push(
                Node::new(format!("row{i}:title"), ids::TASK_ROW_TITLE, TEXT_VIEW_CLASS)
                    .text(&task.title)
                    .parent(ids::TASK_LIST)
                    .action(Action::OpenDetails(i)),
            );
            nodes.push(
                Node::new(format!("row{i}:edit"), ids::EDIT_TASK_BUTTON, IMAGE_BUTTON_CLASS)
                    .parent(ids::TASK_LIST)
                    .action(Action::OpenEditForm(i)),
            );
            nodes.push(
                Node::new(format!("row{i}:delete"), ids::DELETE_TASK_BUTTON, IMAGE_BUTTON_CLASS)
                    .parent(ids::TASK_LIST)
                    .action(Action::OpenDeleteDialog(i)),
            );
        }
    }

    fn render_form(&self, nodes: &mut Vec<Node>, title: &str, description: &str, completed: &str) {
        nodes.push(
            Node::new(title, title, EDIT_TEXT_CLASS)
                .text(&self.form.title)
                .field(Field::Title),
        );
        nodes.push(
            Node::new(description, description, EDIT_TEXT_CLASS)
                .text(&self.form.description)
                .field(Field::Description),
        );
        nodes.push(
            Node::new(completed, completed, CHECK_BOX_CLASS)
                .selected(self.form.completed)
                .action(Action::ToggleFormCompleted),
        );
        nodes.push(
            Node::new(ids::SAVE_TASK_BUTTON, ids::SAVE_TASK_BUTTON, BUTTON_CLASS)
                .text("Save")
                .action(Action::Save),
        );
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::OpenDrawer => self.drawer_open = true,
            Action::OpenTaskManager => {
                self.drawer_open = false;
                self.screen = Screen::TaskList;
            }
            Action::OpenAddForm => {
                self.form = Form::default();
                self.current = None;
                self.screen = Screen::AddTask;
            }
            Action::OpenEditForm(i) => {
                if let Some(task) = self.tasks.get(i) {
                    self.form = Form {
                        title: task.title.clone(),
                        description: task.description.clone(),
                        completed: task.completed,
                    };
                    self.current = Some(i);
                    self.screen = Screen::EditTask;
                }
            }
            Action::OpenDeleteDialog(i) => {
                self.current = Some(i);
                self.screen = Screen::DeleteDialog;
            }
            Action::OpenDetails(i) => {
                self.current = Some(i);
                self.screen = Screen::TaskDetails;
            }
            Action::ToggleCompletedFilter => self.completed_filter = !self.completed_filter,
            Action::TogglePendingFilter => self.pending_filter = !self.pending_filter,
            Action::ToggleFormCompleted => self.form.completed = !self.form.completed,
            Action::Save => {
                let task = MockTask::new(
                    self.form.title.clone(),
                    self.form.description.clone(),
                    self.form.completed,
                );
                match (self.screen, self.current) {
                    (Screen::EditTask, Some(i)) if i < self.tasks.len() => self.tasks[i] = task,
                    _ if !task.title.is_empty() => self.tasks.push(task),
                    _ => {}
                }
                self.current = None;
                self.screen = Screen::TaskList;
            }
            Action::ConfirmDelete => {
                if let Some(i) = self.current.take() {
                    if i < self.tasks.len() {
                        let _ = self.tasks.remove(i);
                    }
                }
                self.screen = Screen::TaskList;
            }
            Action::CancelDelete => {
                self.current = None;
                self.screen = Screen::TaskList;
            }
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Search => &mut self.search,
            Field::Title => &mut self.form.title,
            Field::Description => &mut self.form.description,
        }
    }
}

/// Simulated Task Manager Plus device
#[derive(Debug)]
pub struct MockDevice {
    state: Mutex<DeviceState>,
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDevice {
    /// Create a device showing the home screen with no tasks
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DeviceState {
                screen: Screen::Home,
                drawer_open: false,
                home_text: DEFAULT_HOME_TEXT.to_string(),
                tasks: Vec::new(),
                search: String::new(),
                completed_filter: false,
                pending_filter: false,
                form: Form::default(),
                current: None,
                render_delay: 0,
                find_calls: 0,
                hidden: HashSet::new(),
                disabled: HashSet::new(),
                history: Vec::new(),
                quit: false,
            }),
        }
    }

    /// Replace the home screen text
    #[must_use]
    pub fn with_home_text(self, text: impl Into<String>) -> Self {
        self.lock().home_text = text.into();
        self
    }

    /// Seed the stored tasks
    #[must_use]
    pub fn with_tasks(self, tasks: Vec<MockTask>) -> Self {
        self.lock().tasks = tasks;
        self
    }

    fn lock(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Jump straight to a screen
    pub fn set_screen(&self, screen: Screen) {
        self.lock().screen = screen;
    }

    /// Set the filter checkboxes
    pub fn set_filters(&self, completed: bool, pending: bool) {
        let mut state = self.lock();
        state.completed_filter = completed;
        state.pending_filter = pending;
    }

    /// Make the next `lookups` find commands see an empty screen
    pub fn delay_rendering(&self, lookups: u32) {
        self.lock().render_delay = lookups;
    }

    /// Report every view with the given resource id as not displayed.
    ///
    /// The views stay in the hierarchy, the way Android keeps `GONE` and
    /// `INVISIBLE` views findable.
    pub fn hide(&self, id: &str) {
        let _ = self.lock().hidden.insert(id.to_string());
    }

    /// Undo [`MockDevice::hide`]
    pub fn show(&self, id: &str) {
        let _ = self.lock().hidden.remove(id);
    }

    /// Report every view with the given resource id as disabled. Clicks on
    /// a disabled view are recorded but do nothing.
    pub fn disable(&self, id: &str) {
        let _ = self.lock().disabled.insert(id.to_string());
    }

    /// Current screen
    #[must_use]
    pub fn screen(&self) -> Screen {
        self.lock().screen
    }

    /// Stored tasks
    #[must_use]
    pub fn tasks(&self) -> Vec<MockTask> {
        self.lock().tasks.clone()
    }

    /// (completed, pending) filter state
    #[must_use]
    pub fn filters(&self) -> (bool, bool) {
        let state = self.lock();
        (state.completed_filter, state.pending_filter)
    }

    /// Number of find commands received
    #[must_use]
    pub fn find_calls(&self) -> u32 {
        self.lock().find_calls
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Check if a command was recorded
    #[must_use]
    pub fn was_called(&self, command: &str) -> bool {
        self.lock().history.iter().any(|c| c.starts_with(command))
    }

    /// Number of clicks on elements with the given resource id
    #[must_use]
    pub fn clicks_on(&self, id: &str) -> usize {
        let entry = format!("click:{id}");
        self.lock().history.iter().filter(|c| **c == entry).count()
    }

    /// Whether the session was quit
    #[must_use]
    pub fn is_quit(&self) -> bool {
        self.lock().quit
    }

    fn session(&self) -> ProbeResult<MutexGuard<'_, DeviceState>> {
        let state = self.lock();
        if state.quit {
            return Err(ProbeError::WebDriver {
                command: "mock".to_string(),
                error: "invalid session id".to_string(),
                message: "session was quit".to_string(),
            });
        }
        Ok(state)
    }

    fn lookup(&self, selector: &Selector) -> ProbeResult<Vec<ElementRef>> {
        let mut state = self.session()?;
        state.find_calls += 1;
        state.history.push(format!("find:{selector}"));
        if state.render_delay > 0 {
            state.render_delay -= 1;
            return Ok(Vec::new());
        }
        let mut found = Vec::new();
        for node in state.render() {
            if node.matches(selector)? {
                found.push(ElementRef::new(node.key));
            }
        }
        Ok(found)
    }

    fn node(state: &DeviceState, element: &ElementRef) -> ProbeResult<Node> {
        state
            .render()
            .into_iter()
            .find(|n| n.key == element.id())
            .ok_or_else(|| ProbeError::StaleElement {
                element: element.id().to_string(),
            })
    }

    fn editable(state: &DeviceState, element: &ElementRef) -> ProbeResult<Field> {
        Self::node(state, element)?
            .field
            .ok_or_else(|| ProbeError::WebDriver {
                command: "mock".to_string(),
                error: "invalid element state".to_string(),
                message: format!("{element} is not editable"),
            })
    }
}

#[async_trait]
impl AutomationDriver for MockDevice {
    async fn find_element(&self, selector: &Selector) -> ProbeResult<ElementRef> {
        self.lookup(selector)?
            .into_iter()
            .next()
            .ok_or_else(|| ProbeError::NoSuchElement {
                locator: selector.to_string(),
            })
    }

    async fn find_elements(&self, selector: &Selector) -> ProbeResult<Vec<ElementRef>> {
        self.lookup(selector)
    }

    async fn find_child_elements(
        &self,
        parent: &ElementRef,
        selector: &Selector,
    ) -> ProbeResult<Vec<ElementRef>> {
        let mut state = self.session()?;
        state.history.push(format!("find_children:{parent}:{selector}"));
        let parent_node = Self::node(&state, parent)?;
        let mut found = Vec::new();
        for node in state.render() {
            if node.parent.as_deref() == Some(parent_node.id.as_str()) && node.matches(selector)? {
                found.push(ElementRef::new(node.key));
            }
        }
        Ok(found)
    }

    async fn text(&self, element: &ElementRef) -> ProbeResult<String> {
        let state = self.session()?;
        Ok(Self::node(&state, element)?.text)
    }

    async fn is_displayed(&self, element: &ElementRef) -> ProbeResult<bool> {
        let state = self.session()?;
        Ok(Self::node(&state, element)?.displayed)
    }

    async fn is_enabled(&self, element: &ElementRef) -> ProbeResult<bool> {
        let state = self.session()?;
        Ok(Self::node(&state, element)?.enabled)
    }

    async fn is_selected(&self, element: &ElementRef) -> ProbeResult<bool> {
        let state = self.session()?;
        Ok(Self::node(&state, element)?.selected)
    }

    async fn click(&self, element: &ElementRef) -> ProbeResult<()> {
        let mut state = self.session()?;
        let node = Self::node(&state, element)?;
        let entry = if node.id.is_empty() {
            format!("click:{}", node.key)
        } else {
            format!("click:{}", node.id)
        };
        state.history.push(entry);
        if node.enabled && node.displayed {
            state.apply(node.action);
        }
        Ok(())
    }

    async fn clear(&self, element: &ElementRef) -> ProbeResult<()> {
        let mut state = self.session()?;
        let field = Self::editable(&state, element)?;
        state.history.push(format!("clear:{element}"));
        state.field_mut(field).clear();
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> ProbeResult<()> {
        let mut state = self.session()?;
        let field = Self::editable(&state, element)?;
        state.history.push(format!("send_keys:{element}:{text}"));
        state.field_mut(field).push_str(text);
        Ok(())
    }

    async fn quit(&self) -> ProbeResult<()> {
        let mut state = self.session()?;
        state.history.push("quit".to_string());
        state.quit = true;
        Ok(())
    }
}
