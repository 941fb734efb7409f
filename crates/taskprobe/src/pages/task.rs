//! Task list screen together with its add, edit, details and delete
//! confirmation screens.

use super::{log_step, PageObject};
use crate::driver::{AutomationDriver, ElementRef};
use crate::locator::Locator;
use crate::locators;
use crate::result::ProbeResult;
use crate::wait::{WaitPolicy, Waiter};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

/// Task fields as shown on the details screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskDetails {
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Status label (e.g. "Pending")
    pub status: String,
}

impl TaskDetails {
    /// Fields keyed by name
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("title", self.title.clone()),
            ("description", self.description.clone()),
            ("status", self.status.clone()),
        ])
    }
}

/// Page object for the task manager screens.
///
/// Screen flow: the list opens the add form, the edit form, the details
/// screen or the delete dialog; saving or confirming returns to the list.
/// Each transition is confirmed by waiting for a landmark of the target
/// screen.
#[derive(Debug)]
pub struct TaskPage<'a, D: ?Sized> {
    driver: &'a D,
    wait: WaitPolicy,
}

impl<'a, D: AutomationDriver + ?Sized> TaskPage<'a, D> {
    /// Create the page over a driver
    pub const fn new(driver: &'a D, wait: WaitPolicy) -> Self {
        Self { driver, wait }
    }

    const fn waiter(&self) -> Waiter<'a, D> {
        Waiter::new(self.driver, self.wait)
    }

    async fn tap(&self, locator: &Locator) -> ProbeResult<()> {
        let element = self.waiter().clickable(locator).await?;
        self.driver.click(&element).await
    }

    async fn fill(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
        let element = self.waiter().visible(locator).await?;
        self.driver.clear(&element).await?;
        self.driver.send_keys(&element, text).await
    }

    async fn read(&self, locator: &Locator) -> ProbeResult<String> {
        let element = self.waiter().visible(locator).await?;
        self.driver.text(&element).await
    }

    /// Click a checkbox only when its state differs from `checked`
    async fn set_checkbox(&self, locator: &Locator, checked: bool) -> ProbeResult<bool> {
        let element = self.waiter().clickable(locator).await?;
        let current = self.driver.is_selected(&element).await?;
        if current == checked {
            tracing::debug!(checkbox = %locator, checked, "checkbox already in state");
            return Ok(false);
        }
        self.driver.click(&element).await?;
        Ok(true)
    }

    async fn wait_for_list(&self) -> ProbeResult<ElementRef> {
        self.waiter().visible(&locators::task_list()).await
    }

    /// Open the drawer and select the task manager entry
    pub async fn navigate_to_task_manager(&self) -> ProbeResult<()> {
        let result = async {
            self.tap(&locators::navigation_menu_button()).await?;
            self.tap(&locators::task_manager_menu_item()).await?;
            self.wait_for_list().await.map(|_| ())
        }
        .await;
        log_step("navigate to task manager", result)
    }

    /// Replace the search field's text
    pub async fn enter_search_text(&self, text: &str) -> ProbeResult<()> {
        let result = self.fill(&locators::search_field(), text).await;
        log_step("enter search text", result)
    }

    /// Tap the add task button
    pub async fn click_add_task_button(&self) -> ProbeResult<()> {
        let result = self.tap(&locators::add_task_button()).await;
        log_step("click add task button", result)
    }

    /// Tap the edit button of the first visible row
    pub async fn click_edit_task_button(&self) -> ProbeResult<()> {
        let result = self.tap(&locators::edit_task_button()).await;
        log_step("click edit task button", result)
    }

    /// Tap the delete button of the first visible row
    pub async fn click_delete_task_button(&self) -> ProbeResult<()> {
        let result = self.tap(&locators::delete_task_button()).await;
        log_step("click delete task button", result)
    }

    /// Tap the dialog button labelled "DELETE"
    pub async fn click_delete_confirmation_button(&self) -> ProbeResult<()> {
        let result = self.tap(&locators::delete_confirmation_button()).await;
        log_step("click delete confirmation button", result)
    }

    /// Bring the completed filter to `checked`
    pub async fn set_completed_filter(&self, checked: bool) -> ProbeResult<()> {
        let result = self
            .set_checkbox(&locators::completed_filter(), checked)
            .await
            .map(|_| ());
        log_step("set completed filter", result)
    }

    /// Bring the pending filter to `checked`
    pub async fn set_pending_filter(&self, checked: bool) -> ProbeResult<()> {
        let result = self
            .set_checkbox(&locators::pending_filter(), checked)
            .await
            .map(|_| ());
        log_step("set pending filter", result)
    }

    /// Titles of the rows currently rendered, in on-screen order.
    ///
    /// Rows scrolled out of the recycler are not materialized and so are
    /// not returned.
    pub async fn task_list(&self) -> ProbeResult<Vec<String>> {
        let result = async {
            let list = self.waiter().present(&locators::task_list()).await?;
            let rows = self
                .driver
                .find_child_elements(&list, locators::task_row_title().selector())
                .await?;
            let mut titles = Vec::with_capacity(rows.len());
            for row in &rows {
                titles.push(self.driver.text(row).await?);
            }
            tracing::debug!(count = titles.len(), "task list read");
            Ok(titles)
        }
        .await;
        log_step("read task list", result)
    }

    /// Whether the task list container is visible within the wait bound
    pub async fn is_task_list_displayed(&self) -> ProbeResult<bool> {
        match self.wait_for_list().await {
            Ok(_) => Ok(true),
            Err(e) if e.is_timeout() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Tap the first text view whose text is exactly `title`
    pub async fn click_on_task(&self, title: &str) -> ProbeResult<()> {
        let result = self.tap(&locators::task_with_title(title)).await;
        log_step("click on task", result)
    }

    /// Create a task through the add form and return to the list
    pub async fn add_new_task(
        &self,
        title: &str,
        description: &str,
        completed: bool,
    ) -> ProbeResult<()> {
        let result = async {
            self.tap(&locators::add_task_button()).await?;
            self.fill(&locators::add_title_field(), title).await?;
            self.fill(&locators::add_description_field(), description).await?;
            if completed {
                let checkbox = locators::add_completed_checkbox();
                self.set_checkbox(&checkbox, true).await?;
            }
            self.tap(&locators::save_task_button()).await?;
            self.wait_for_list().await.map(|_| ())
        }
        .await;
        if result.is_ok() {
            tracing::info!(title, completed, "task added");
        }
        log_step("add new task", result)
    }

    /// Overwrite the task open in the edit form and return to the list
    pub async fn edit_task(
        &self,
        new_title: &str,
        new_description: &str,
        completed: bool,
    ) -> ProbeResult<()> {
        let result = async {
            self.fill(&locators::edit_title_field(), new_title).await?;
            let description = locators::edit_description_field();
            self.fill(&description, new_description).await?;
            let checkbox = locators::edit_completed_checkbox();
            self.set_checkbox(&checkbox, completed).await?;
            self.tap(&locators::save_task_button()).await?;
            self.wait_for_list().await.map(|_| ())
        }
        .await;
        log_step("edit task", result)
    }

    /// Confirm the open delete dialog and wait for `title` to disappear.
    ///
    /// The row's delete button must already have been tapped.
    pub async fn delete_task(&self, title: &str) -> ProbeResult<()> {
        let result = async {
            self.tap(&locators::dialog_positive_button()).await?;
            self.waiter()
                .invisible(&locators::task_with_title(title))
                .await
                .map(|_| ())
        }
        .await;
        log_step("delete task", result)
    }

    /// Same as [`TaskPage::delete_task`]
    pub async fn delete_task_with_confirmation(&self, title: &str) -> ProbeResult<()> {
        tracing::debug!(title, "deleting task with confirmation");
        self.delete_task(title).await
    }

    /// Open the task and read its details screen
    pub async fn task_details(&self, title: &str) -> ProbeResult<TaskDetails> {
        let result = async {
            self.tap(&locators::task_with_title(title)).await?;
            let details = TaskDetails {
                title: self.read(&locators::detail_title()).await?,
                description: self.read(&locators::detail_description()).await?,
                status: self.read(&locators::detail_status()).await?,
            };
            tracing::debug!(?details, "task details read");
            Ok(details)
        }
        .await;
        log_step("read task details", result)
    }
}

#[async_trait]
impl<D: AutomationDriver + ?Sized> PageObject for TaskPage<'_, D> {
    type Driver = D;

    fn driver(&self) -> &D {
        self.driver
    }

    fn wait_policy(&self) -> WaitPolicy {
        self.wait
    }

    fn landmark(&self) -> Locator {
        locators::task_list()
    }

    fn page_name(&self) -> &str {
        "task manager"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::locators::ids;
    use crate::mock::{MockDevice, MockTask, Screen};
    use proptest::prelude::*;

    fn fast() -> WaitPolicy {
        WaitPolicy::new().with_timeout(1_000).with_poll_interval(100)
    }

    fn seeded() -> MockDevice {
        let device = MockDevice::new().with_tasks(vec![
            MockTask::new("Buy milk", "Two litres", false),
            MockTask::new("File taxes", "Before April", true),
            MockTask::new("Call mom", "Sunday", false),
        ]);
        device.set_screen(Screen::TaskList);
        device
    }

    mod navigation_tests {
        use super::*;

        #[tokio::test]
        async fn test_navigate_from_home() {
            let device = MockDevice::new();
            let page = TaskPage::new(&device, fast());

            page.navigate_to_task_manager().await.unwrap();
            assert_eq!(device.screen(), Screen::TaskList);
            assert!(page.is_task_list_displayed().await.unwrap());
            assert!(page.wait_until_loaded().await.is_ok());
            assert_eq!(page.page_name(), "task manager");
        }

        #[tokio::test(start_paused = true)]
        async fn test_task_list_not_displayed_on_home() {
            let device = MockDevice::new();
            let page = TaskPage::new(&device, fast());
            assert!(!page.is_task_list_displayed().await.unwrap());
        }
    }

    mod list_tests {
        use super::*;

        #[tokio::test]
        async fn test_task_list_in_order() {
            let device = seeded();
            let page = TaskPage::new(&device, fast());
            assert_eq!(
                page.task_list().await.unwrap(),
                vec!["Buy milk", "File taxes", "Call mom"]
            );
        }

        #[tokio::test]
        async fn test_empty_list() {
            let device = MockDevice::new();
            device.set_screen(Screen::TaskList);
            let page = TaskPage::new(&device, fast());
            assert!(page.task_list().await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_search_narrows_list() {
            let device = seeded();
            let page = TaskPage::new(&device, fast());

            page.enter_search_text("milk").await.unwrap();
            assert_eq!(page.task_list().await.unwrap(), vec!["Buy milk"]);

            page.enter_search_text("").await.unwrap();
            assert_eq!(page.task_list().await.unwrap().len(), 3);
        }
    }

    mod filter_tests {
        use super::*;

        #[tokio::test]
        async fn test_completed_filter() {
            let device = seeded();
            let page = TaskPage::new(&device, fast());

            page.set_completed_filter(true).await.unwrap();
            assert_eq!(device.filters(), (true, false));
            assert_eq!(page.task_list().await.unwrap(), vec!["File taxes"]);
        }

        #[tokio::test]
        async fn test_pending_filter() {
            let device = seeded();
            let page = TaskPage::new(&device, fast());

            page.set_pending_filter(true).await.unwrap();
            assert_eq!(page.task_list().await.unwrap(), vec!["Buy milk", "Call mom"]);

            page.set_pending_filter(false).await.unwrap();
            assert_eq!(device.filters(), (false, false));
        }

        #[tokio::test]
        async fn test_no_click_when_state_matches() {
            let device = seeded();
            device.set_filters(true, false);
            let page = TaskPage::new(&device, fast());

            page.set_completed_filter(true).await.unwrap();
            page.set_pending_filter(false).await.unwrap();
            assert_eq!(device.clicks_on(ids::COMPLETED_FILTER_CHECKBOX), 0);
            assert_eq!(device.clicks_on(ids::PENDING_FILTER_CHECKBOX), 0);
        }

        proptest! {
            #[test]
            fn prop_filter_clicks_only_on_change(initial: bool, desired: bool) {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .unwrap();
                let device = seeded();
                device.set_filters(initial, false);
                let page = TaskPage::new(&device, fast());

                rt.block_on(page.set_completed_filter(desired)).unwrap();

                let expected = usize::from(initial != desired);
                prop_assert_eq!(device.clicks_on(ids::COMPLETED_FILTER_CHECKBOX), expected);
                prop_assert_eq!(device.filters().0, desired);
            }
        }
    }

    mod add_tests {
        use super::*;

        #[tokio::test]
        async fn test_add_new_task() {
            let device = seeded();
            let page = TaskPage::new(&device, fast());

            page.add_new_task("Water plants", "Balcony only", false).await.unwrap();

            let titles = page.task_list().await.unwrap();
            assert_eq!(titles.iter().filter(|t| *t == "Water plants").count(), 1);
            assert_eq!(device.screen(), Screen::TaskList);
            assert!(!device.tasks()[3].completed);
        }

        #[tokio::test]
        async fn test_add_completed_task_uses_form_checkbox() {
            let device = seeded();
            let page = TaskPage::new(&device, fast());

            page.add_new_task("Done already", "", true).await.unwrap();

            assert_eq!(device.clicks_on(ids::ADD_TASK_COMPLETED_CHECKBOX), 1);
            assert_eq!(device.clicks_on(ids::COMPLETED_FILTER_CHECKBOX), 0);
            let added = device.tasks().pop().unwrap();
            assert_eq!(added, MockTask::new("Done already", "", true));
        }

        #[tokio::test(start_paused = true)]
        async fn test_add_from_wrong_screen_times_out() {
            let device = MockDevice::new();
            let page = TaskPage::new(&device, fast());

            let err = page.add_new_task("x", "y", false).await.unwrap_err();
            assert!(err.is_timeout());
            assert!(err.to_string().contains("add task button"));
        }
    }

    mod edit_tests {
        use super::*;

        #[tokio::test]
        async fn test_edit_first_task() {
            let device = seeded();
            let page = TaskPage::new(&device, fast());

            page.click_edit_task_button().await.unwrap();
            assert_eq!(device.screen(), Screen::EditTask);
            page.edit_task("Buy oat milk", "One carton", true).await.unwrap();

            assert_eq!(
                device.tasks()[0],
                MockTask::new("Buy oat milk", "One carton", true)
            );
            assert_eq!(device.clicks_on(ids::EDIT_TASK_COMPLETED_CHECKBOX), 1);
        }

        #[tokio::test]
        async fn test_edit_keeps_matching_state() {
            let device = seeded();
            let page = TaskPage::new(&device, fast());

            page.click_edit_task_button().await.unwrap();
            page.edit_task("Buy milk", "Three litres", false).await.unwrap();
            assert_eq!(device.clicks_on(ids::EDIT_TASK_COMPLETED_CHECKBOX), 0);
            assert_eq!(device.tasks()[0].description, "Three litres");
        }
    }

    mod delete_tests {
        use super::*;

        #[tokio::test]
        async fn test_delete_task() {
            let device = seeded();
            let page = TaskPage::new(&device, fast());

            page.click_delete_task_button().await.unwrap();
            assert_eq!(device.screen(), Screen::DeleteDialog);
            page.delete_task_with_confirmation("Buy milk").await.unwrap();

            assert_eq!(page.task_list().await.unwrap(), vec!["File taxes", "Call mom"]);
        }

        #[tokio::test]
        async fn test_delete_via_labelled_button() {
            let device = seeded();
            let page = TaskPage::new(&device, fast());

            page.click_delete_task_button().await.unwrap();
            page.click_delete_confirmation_button().await.unwrap();
            assert_eq!(device.tasks().len(), 2);
        }

        #[tokio::test(start_paused = true)]
        async fn test_delete_without_dialog_times_out() {
            let device = seeded();
            let page = TaskPage::new(&device, fast());
            assert!(page.delete_task("Buy milk").await.unwrap_err().is_timeout());
            assert_eq!(device.tasks().len(), 3);
        }
    }

    mod details_tests {
        use super::*;

        #[tokio::test]
        async fn test_task_details() {
            let device = seeded();
            let page = TaskPage::new(&device, fast());

            let details = page.task_details("File taxes").await.unwrap();
            assert_eq!(
                details,
                TaskDetails {
                    title: "File taxes".to_string(),
                    description: "Before April".to_string(),
                    status: "Completed".to_string(),
                }
            );
            assert_eq!(device.screen(), Screen::TaskDetails);
        }

        #[tokio::test]
        async fn test_click_on_task_opens_details() {
            let device = seeded();
            let page = TaskPage::new(&device, fast());
            page.click_on_task("Call mom").await.unwrap();
            assert_eq!(device.screen(), Screen::TaskDetails);
        }

        #[test]
        fn test_details_map_and_json() {
            let details = TaskDetails {
                title: "t".to_string(),
                description: "d".to_string(),
                status: "Pending".to_string(),
            };
            let map = details.to_map();
            assert_eq!(map["status"], "Pending");
            assert_eq!(map.len(), 3);

            let json = serde_json::to_value(&details).unwrap();
            assert_eq!(json["description"], "d");
        }
    }
}
