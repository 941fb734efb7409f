//! Element identifiers exposed by the Task Manager Plus app.
//!
//! These must match the resource ids and labels of the application under
//! test; a rename there breaks the suite here.

use crate::locator::{Locator, Selector, BUTTON_CLASS, IMAGE_BUTTON_CLASS};

/// Package of the application under test. Short resource ids resolve
/// against it.
pub const APP_PACKAGE: &str = "maif.taskmanagerplus";

/// Resource ids, without the `package:id/` prefix.
#[allow(missing_docs)]
pub mod ids {
    // Home screen
    pub const TEXT_HOME: &str = "text_home";

    // Task list screen
    pub const SEARCH_TASK: &str = "et_search_task";
    pub const ADD_TASK_BUTTON: &str = "btn_add_task";
    pub const EDIT_TASK_BUTTON: &str = "btn_edit_task";
    pub const DELETE_TASK_BUTTON: &str = "btn_delete_task";
    pub const COMPLETED_FILTER_CHECKBOX: &str = "cb_completed";
    pub const PENDING_FILTER_CHECKBOX: &str = "cb_pending";
    pub const TASK_LIST: &str = "rv_task_list";
    pub const TASK_ROW_TITLE: &str = "tv_task_title";

    // Add task screen
    pub const ADD_TASK_TITLE: &str = "et_task_title";
    pub const ADD_TASK_DESCRIPTION: &str = "et_task_description";
    pub const ADD_TASK_COMPLETED_CHECKBOX: &str = "cb_task_completed";

    // Shared by add and edit screens
    pub const SAVE_TASK_BUTTON: &str = "btn_save_task";

    // Edit task screen
    pub const EDIT_TASK_TITLE: &str = "et_edit_task_title";
    pub const EDIT_TASK_DESCRIPTION: &str = "et_edit_task_description";
    pub const EDIT_TASK_COMPLETED_CHECKBOX: &str = "cb_edit_task_completed";

    // Task details screen
    pub const TASK_DETAIL_TITLE: &str = "tv_task_title";
    pub const TASK_DETAIL_DESCRIPTION: &str = "tv_task_description";
    pub const TASK_DETAIL_STATUS: &str = "tv_task_status";

    // Navigation drawer
    pub const TASK_MENU_ITEM: &str = "nav_task";

    // Platform alert dialog positive button
    pub const DIALOG_POSITIVE_BUTTON: &str = "android:id/button1";
}

/// Accessibility label of the toolbar's drawer toggle
pub const NAVIGATION_MENU_CONTENT_DESC: &str = "Open navigation drawer";

/// Text of the drawer entry leading to the task list
pub const TASK_MANAGER_MENU_ITEM_TEXT: &str = "Task Manager";

/// Text of the confirm button in the delete dialog
pub const DELETE_CONFIRMATION_TEXT: &str = "DELETE";

fn by_id(name: &str, id: &str) -> Locator {
    Locator::new(name, Selector::id(id))
}

/// Home screen text view
#[must_use]
pub fn home_text() -> Locator {
    by_id("home text", ids::TEXT_HOME)
}

/// Drawer toggle in the toolbar
#[must_use]
pub fn navigation_menu_button() -> Locator {
    Locator::new(
        "navigation menu button",
        Selector::attribute_equals(
            IMAGE_BUTTON_CLASS,
            "content-desc",
            NAVIGATION_MENU_CONTENT_DESC,
        ),
    )
}

/// "Task Manager" drawer entry
#[must_use]
pub fn task_manager_menu_item() -> Locator {
    by_id("task manager menu item", ids::TASK_MENU_ITEM)
}

/// Search field above the task list
#[must_use]
pub fn search_field() -> Locator {
    by_id("search field", ids::SEARCH_TASK)
}

/// Add task button
#[must_use]
pub fn add_task_button() -> Locator {
    by_id("add task button", ids::ADD_TASK_BUTTON)
}

/// Edit task button
#[must_use]
pub fn edit_task_button() -> Locator {
    by_id("edit task button", ids::EDIT_TASK_BUTTON)
}

/// Delete task button
#[must_use]
pub fn delete_task_button() -> Locator {
    by_id("delete task button", ids::DELETE_TASK_BUTTON)
}

/// Completed filter checkbox
#[must_use]
pub fn completed_filter() -> Locator {
    by_id("completed filter", ids::COMPLETED_FILTER_CHECKBOX)
}

/// Pending filter checkbox
#[must_use]
pub fn pending_filter() -> Locator {
    by_id("pending filter", ids::PENDING_FILTER_CHECKBOX)
}

/// Task list container
#[must_use]
pub fn task_list() -> Locator {
    by_id("task list", ids::TASK_LIST)
}

/// Title view inside each task row
#[must_use]
pub fn task_row_title() -> Locator {
    by_id("task row title", ids::TASK_ROW_TITLE)
}

/// Title field on the add screen
#[must_use]
pub fn add_title_field() -> Locator {
    by_id("add title field", ids::ADD_TASK_TITLE)
}

/// Description field on the add screen
#[must_use]
pub fn add_description_field() -> Locator {
    by_id("add description field", ids::ADD_TASK_DESCRIPTION)
}

/// Completed checkbox on the add screen
#[must_use]
pub fn add_completed_checkbox() -> Locator {
    by_id("add completed checkbox", ids::ADD_TASK_COMPLETED_CHECKBOX)
}

/// Save button on add and edit screens
#[must_use]
pub fn save_task_button() -> Locator {
    by_id("save task button", ids::SAVE_TASK_BUTTON)
}

/// Title field on the edit screen
#[must_use]
pub fn edit_title_field() -> Locator {
    by_id("edit title field", ids::EDIT_TASK_TITLE)
}

/// Description field on the edit screen
#[must_use]
pub fn edit_description_field() -> Locator {
    by_id("edit description field", ids::EDIT_TASK_DESCRIPTION)
}

/// Completed checkbox on the edit screen
#[must_use]
pub fn edit_completed_checkbox() -> Locator {
    by_id("edit completed checkbox", ids::EDIT_TASK_COMPLETED_CHECKBOX)
}

/// Title on the details screen
#[must_use]
pub fn detail_title() -> Locator {
    by_id("detail title", ids::TASK_DETAIL_TITLE)
}

/// Description on the details screen
#[must_use]
pub fn detail_description() -> Locator {
    by_id("detail description", ids::TASK_DETAIL_DESCRIPTION)
}

/// Status on the details screen
#[must_use]
pub fn detail_status() -> Locator {
    by_id("detail status", ids::TASK_DETAIL_STATUS)
}

/// Positive button of the delete confirmation dialog
#[must_use]
pub fn dialog_positive_button() -> Locator {
    by_id("dialog confirm button", ids::DIALOG_POSITIVE_BUTTON)
}

/// Confirmation dialog button labelled "DELETE"
#[must_use]
pub fn delete_confirmation_button() -> Locator {
    Locator::new(
        "delete confirmation button",
        Selector::attribute_equals(BUTTON_CLASS, "text", DELETE_CONFIRMATION_TEXT),
    )
}

/// Text view whose text equals `title`
#[must_use]
pub fn task_with_title(title: &str) -> Locator {
    Locator::new(format!("task '{title}'"), Selector::text_view_with_text(title))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_button_xpath() {
        assert_eq!(
            navigation_menu_button().selector().value(),
            "//android.widget.ImageButton[@content-desc='Open navigation drawer']"
        );
    }

    #[test]
    fn test_delete_confirmation_xpath() {
        assert_eq!(
            delete_confirmation_button().selector().value(),
            "//android.widget.Button[@text='DELETE']"
        );
    }

    #[test]
    fn test_task_with_title() {
        let locator = task_with_title("Buy milk");
        assert_eq!(
            locator.selector().value(),
            "//android.widget.TextView[@text='Buy milk']"
        );
        assert_eq!(locator.name(), "task 'Buy milk'");
    }

    #[test]
    fn test_app_ids_are_unqualified() {
        for id in [ids::TEXT_HOME, ids::TASK_LIST, ids::SAVE_TASK_BUTTON, ids::TASK_MENU_ITEM] {
            assert!(!id.contains(':'), "{id} should resolve against {APP_PACKAGE}");
        }
        assert!(ids::DIALOG_POSITIVE_BUTTON.starts_with("android:id/"));
    }

    #[test]
    fn test_add_form_uses_its_own_checkbox() {
        assert_eq!(
            add_completed_checkbox().selector(),
            &Selector::id("cb_task_completed")
        );
        assert_ne!(add_completed_checkbox(), completed_filter());
    }
}
