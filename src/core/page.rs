//! Booking list pages.
//!
//! A [`BookingPage`] is one instantiation of the live list pattern: it opens a
//! subscription scoped by its [`PageConfig`], keeps a [`LiveCache`] of the
//! results, holds the filter inputs and hands out editors, forms and reports
//! for what it shows.

use crate::{
    config::app::ReportConfig,
    core::{
        cache::LiveCache,
        editor::RecordEditor,
        filter::{DateWindow, SearchScope, StatusFilter, ViewFilter},
        form::BookingForm,
        notify::Notifier,
        record::{BookingRecord, RecordQuery},
        report::{Letterhead, ReportDocument, ReportSummary, build_list_report},
        session::Actor,
        store::Store,
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

/// Whose records a page lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerScope {
    /// Only records created by the acting staff member
    OwnedBy,
    /// Every record in the collection
    Everyone,
}

/// Static description of a list page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageConfig {
    /// Page heading
    pub title: &'static str,
    /// Owner restriction applied to the standing query
    pub scope: OwnerScope,
    /// Collapse records sharing a natural key to the newest
    pub dedup: bool,
    /// Fields the search box looks at
    pub search: SearchScope,
    /// Date windows offered in the window menu
    pub windows: &'static [DateWindow],
}

const ROLLING_WINDOWS: &[DateWindow] = &[
    DateWindow::AllTime,
    DateWindow::Today,
    DateWindow::Yesterday,
    DateWindow::Last7Days,
    DateWindow::Last30Days,
];

const CALENDAR_WINDOWS: &[DateWindow] = &[
    DateWindow::AllTime,
    DateWindow::ThisWeek,
    DateWindow::ThisMonth,
    DateWindow::ThisYear,
];

/// Staff member's own visa applications.
pub const VISA_PAGE: PageConfig = PageConfig {
    title: "Visa Applications",
    scope: OwnerScope::OwnedBy,
    dedup: true,
    search: SearchScope::FixedFields,
    windows: ROLLING_WINDOWS,
};

/// Staff member's own Umrah bookings.
pub const UMRAH_PAGE: PageConfig = PageConfig {
    title: "Umrah Bookings",
    scope: OwnerScope::OwnedBy,
    dedup: false,
    search: SearchScope::FixedFields,
    windows: ROLLING_WINDOWS,
};

/// Staff member's own hotel bookings.
pub const HOTEL_PAGE: PageConfig = PageConfig {
    title: "Hotel Bookings",
    scope: OwnerScope::OwnedBy,
    dedup: false,
    search: SearchScope::FixedFields,
    windows: ROLLING_WINDOWS,
};

/// Every Umrah booking in the agency.
pub const UMRAH_VIEW_ALL: PageConfig = PageConfig {
    title: "All Umrah Bookings",
    scope: OwnerScope::Everyone,
    dedup: false,
    search: SearchScope::AllStringFields,
    windows: CALENDAR_WINDOWS,
};

/// Every hotel booking in the agency.
pub const HOTEL_VIEW_ALL: PageConfig = PageConfig {
    title: "All Hotel Bookings",
    scope: OwnerScope::Everyone,
    dedup: false,
    search: SearchScope::AllStringFields,
    windows: CALENDAR_WINDOWS,
};

/// Aggregate reports over the staff member's own bookings.
pub const REPORTS_PAGE: PageConfig = PageConfig {
    title: "Reports",
    scope: OwnerScope::OwnedBy,
    dedup: false,
    search: SearchScope::FixedFields,
    windows: &DateWindow::ALL,
};

/// A live, filterable list of one booking type.
#[derive(Debug)]
pub struct BookingPage<R> {
    config: PageConfig,
    store: Store,
    actor: Actor,
    notifier: Arc<dyn Notifier>,
    cache: LiveCache<R>,
    filter: ViewFilter,
    search_input: String,
}

impl<R: BookingRecord> BookingPage<R> {
    /// Subscribes to the page's query and starts the cache.
    pub fn open(store: &Store, actor: &Actor, config: PageConfig, notifier: Arc<dyn Notifier>) -> Self {
        let query = match config.scope {
            OwnerScope::OwnedBy => RecordQuery::owned_by(actor.uid.clone()),
            OwnerScope::Everyone => RecordQuery::everyone(),
        };
        info!(kind = %R::KIND, page = config.title, actor = %actor.uid, "Opening page");
        let subscription = store.subscribe::<R>(query);
        let cache = LiveCache::attach(subscription, config.dedup, Arc::clone(&notifier));
        Self {
            config,
            store: store.clone(),
            actor: actor.clone(),
            notifier,
            cache,
            filter: ViewFilter {
                scope: config.search,
                ..ViewFilter::default()
            },
            search_input: String::new(),
        }
    }

    /// Page description.
    #[must_use]
    pub const fn config(&self) -> &PageConfig {
        &self.config
    }

    /// Filter inputs currently applied.
    #[must_use]
    pub const fn filter(&self) -> &ViewFilter {
        &self.filter
    }

    /// Whether the first snapshot is still outstanding.
    pub async fn is_loading(&self) -> bool {
        self.cache.is_loading().await
    }

    /// Failure that stopped the page's cache, if any.
    pub async fn last_error(&self) -> Option<String> {
        self.cache.last_error().await
    }

    /// Waits for the cached list to change.
    pub async fn changed(&mut self) -> Result<()> {
        self.cache.changed().await
    }

    /// Picks a status from the status menu.
    pub fn set_status(&mut self, choice: &str) {
        self.filter.status = StatusFilter::from_choice(choice);
    }

    /// Picks a date window; only windows the page offers are accepted.
    pub fn set_window(&mut self, window: DateWindow) -> Result<()> {
        if !self.config.windows.contains(&window) {
            return Err(Error::UnsupportedWindow {
                window: window.to_string(),
            });
        }
        self.filter.window = window;
        Ok(())
    }

    /// Updates the search box without applying it.
    pub fn set_search(&mut self, text: &str) {
        self.search_input = text.to_string();
    }

    /// Applies the search box.
    ///
    /// A blank box posts an informational notice and leaves the filter as it
    /// was. Returns whether the filter changed.
    pub fn submit_search(&mut self) -> bool {
        let term = self.search_input.trim();
        if term.is_empty() {
            self.notifier.info("Enter a search term first".to_string());
            return false;
        }
        debug!(kind = %R::KIND, term, "Applying search");
        self.filter.search = term.to_string();
        true
    }

    /// Display list: the cache run through the filters.
    pub async fn visible(&self, today: NaiveDate) -> Vec<R> {
        self.filter.apply(&self.cache.records().await, today)
    }

    /// Editor with a draft of the cached record `id`.
    pub async fn edit(&self, id: i64) -> Result<RecordEditor<R>> {
        let record = self
            .cache
            .get(id)
            .await
            .ok_or(Error::RecordNotFound { kind: R::KIND, id })?;
        let mut editor = RecordEditor::new();
        editor.begin(&record)?;
        Ok(editor)
    }

    /// Saves an editor opened from this page as the page's actor.
    pub async fn save(&self, editor: &mut RecordEditor<R>) -> Result<R> {
        editor.save(&self.store, &self.actor, self.notifier.as_ref()).await
    }

    /// Blank creation form owned by the page's actor.
    #[must_use]
    pub fn new_form(&self) -> BookingForm<R> {
        BookingForm::new(&self.actor)
    }

    /// Submits a creation form as the page's actor.
    pub async fn submit(&self, form: &BookingForm<R>) -> Result<R> {
        form.submit(&self.store, self.notifier.as_ref()).await
    }

    /// Totals over the display list.
    pub async fn summary(&self, today: NaiveDate, currency_prefix: &str) -> ReportSummary {
        ReportSummary::from_records(&self.visible(today).await, currency_prefix)
    }

    /// Report over the display list, named after the current window.
    pub async fn list_report(&self, letterhead: &Letterhead, config: &ReportConfig, today: NaiveDate) -> ReportDocument {
        let records = self.visible(today).await;
        build_list_report(&records, &self.filter.window.to_string(), letterhead, config, today)
    }

    /// Stops the subscription.
    pub fn close(self) {
        info!(kind = %R::KIND, page = self.config.title, "Closing page");
        self.cache.close();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::notify::NoticeLevel;
    use crate::entities::{hotel_booking, umrah_booking, visa_booking};
    use crate::test_utils::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
    }

    // The first revision is always the initial snapshot.
    async fn loaded<R: BookingRecord>(page: &mut BookingPage<R>) {
        page.changed().await.unwrap();
        assert!(!page.is_loading().await);
    }

    #[tokio::test]
    async fn test_owned_page_hides_other_staff_records() -> Result<()> {
        let store = setup_test_store().await?;
        store
            .insert(&sample_umrah("staff-1", "Bilal Ahmed", "2024-05-10"))
            .await?;
        store
            .insert(&sample_umrah("staff-2", "Zainab Ali", "2024-05-11"))
            .await?;

        let notifier = Arc::new(RecordingNotifier::default());
        let actor = Actor::new("staff-1");
        let mut own = BookingPage::<umrah_booking::Model>::open(&store, &actor, UMRAH_PAGE, notifier.clone());
        let mut all = BookingPage::<umrah_booking::Model>::open(&store, &actor, UMRAH_VIEW_ALL, notifier);
        loaded(&mut own).await;
        loaded(&mut all).await;

        let mine = own.visible(today()).await;
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].passenger_name, "Bilal Ahmed");
        assert_eq!(all.visible(today()).await.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_search_posts_info_and_keeps_filter() -> Result<()> {
        let store = setup_test_store().await?;
        let notifier = Arc::new(RecordingNotifier::default());
        let mut page = BookingPage::<visa_booking::Model>::open(
            &store,
            &Actor::new("staff-1"),
            VISA_PAGE,
            notifier.clone(),
        );

        page.set_search("ab1");
        assert!(page.submit_search());
        page.set_search("   ");
        assert!(!page.submit_search());
        assert_eq!(page.filter().search, "ab1");

        let notices = notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Info);
        Ok(())
    }

    #[tokio::test]
    async fn test_window_must_be_offered_by_page() -> Result<()> {
        let store = setup_test_store().await?;
        let notifier = Arc::new(RecordingNotifier::default());
        let mut page = BookingPage::<hotel_booking::Model>::open(
            &store,
            &Actor::new("staff-1"),
            HOTEL_VIEW_ALL,
            notifier,
        );
        assert!(page.set_window(DateWindow::ThisMonth).is_ok());
        assert!(matches!(
            page.set_window(DateWindow::Yesterday),
            Err(Error::UnsupportedWindow { .. })
        ));
        assert_eq!(page.filter().window, DateWindow::ThisMonth);
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_and_save_through_page() -> Result<()> {
        let store = setup_test_store().await?;
        let saved = store
            .insert(&sample_hotel("staff-1", "Sara Khan", "2024-05-10", "2024-05-12"))
            .await?;
        let notifier = Arc::new(RecordingNotifier::default());
        let mut page = BookingPage::<hotel_booking::Model>::open(
            &store,
            &Actor::new("staff-1"),
            HOTEL_PAGE,
            notifier.clone(),
        );
        loaded(&mut page).await;

        let mut editor = page.edit(saved.id).await?;
        editor.set_field("received", "90000")?;
        let updated = page.save(&mut editor).await?;
        assert_eq!(updated.profit, 30000.0);

        page.changed().await?;
        let shown = page.visible(today()).await;
        assert_eq!(shown[0].received, Some(90000.0));

        assert!(matches!(
            page.edit(9999).await,
            Err(Error::RecordNotFound { id: 9999, .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_summary_follows_filters() -> Result<()> {
        let store = setup_test_store().await?;
        store
            .insert(&sample_umrah("staff-1", "Bilal Ahmed", "2024-05-14"))
            .await?;
        store
            .insert(&sample_umrah("staff-1", "Omar Farooq", "2024-01-03"))
            .await?;
        let notifier = Arc::new(RecordingNotifier::default());
        let mut page = BookingPage::<umrah_booking::Model>::open(
            &store,
            &Actor::new("staff-1"),
            REPORTS_PAGE,
            notifier,
        );
        loaded(&mut page).await;

        assert_eq!(page.summary(today(), "PKR").await.count, 2);
        page.set_window(DateWindow::ThisMonth)?;
        let summary = page.summary(today(), "PKR").await;
        assert_eq!(summary.count, 1);
        assert_eq!(summary.profit, 40000.0);

        let letterhead = Letterhead {
            name: "Desk".to_string(),
            lines: Vec::new(),
        };
        let report = page
            .list_report(&letterhead, &ReportConfig::default(), today())
            .await;
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.file_stem, "UmrahReport_List_this-month_2024-05-15");
        Ok(())
    }

    #[tokio::test]
    async fn test_form_from_page_is_owned_by_actor() -> Result<()> {
        let store = setup_test_store().await?;
        let notifier = Arc::new(RecordingNotifier::default());
        let mut page = BookingPage::<visa_booking::Model>::open(
            &store,
            &Actor::new("staff-7"),
            VISA_PAGE,
            notifier,
        );
        loaded(&mut page).await;

        let mut form = page.new_form();
        form.fill([
            ("passport", "XY987"),
            ("fullName", "Hamza Yousaf"),
            ("visaType", "Tourist"),
            ("country", "Turkey"),
            ("date", "2024-05-15"),
            ("totalFee", "1500"),
            ("receivedFee", "900"),
            ("paymentStatus", "partial"),
            ("visaStatus", "pending"),
        ])?;
        let saved = page.submit(&form).await?;
        assert_eq!(saved.user_id, "staff-7");

        page.changed().await?;
        assert_eq!(page.visible(today()).await.len(), 1);
        page.close();
        Ok(())
    }

    #[tokio::test]
    async fn test_unmatched_search_hides_list_but_keeps_cache() -> Result<()> {
        let store = setup_test_store().await?;
        let sara = store
            .insert(&sample_hotel("staff-1", "Sara Khan", "2024-05-10", "2024-05-12"))
            .await?;
        let ali = store
            .insert(&sample_hotel("staff-1", "Ali Raza", "2024-05-11", "2024-05-13"))
            .await?;
        let notifier = Arc::new(RecordingNotifier::default());
        let mut page = BookingPage::<hotel_booking::Model>::open(
            &store,
            &Actor::new("staff-1"),
            HOTEL_PAGE,
            notifier.clone(),
        );
        loaded(&mut page).await;

        page.set_search("Nobody Here");
        assert!(page.submit_search());
        assert!(page.visible(today()).await.is_empty());

        // Hidden records are still cached and editable.
        assert!(page.edit(sara.id).await.is_ok());
        assert!(page.edit(ali.id).await.is_ok());

        page.set_search("raza");
        assert!(page.submit_search());
        let shown = page.visible(today()).await;
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].id, ali.id);
        assert!(notifier.notices().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_command_line_assignments_create_and_edit() -> Result<()> {
        let store = setup_test_store().await?;
        let notifier = Arc::new(RecordingNotifier::default());
        let mut page = BookingPage::<umrah_booking::Model>::open(
            &store,
            &Actor::new("staff-2"),
            UMRAH_PAGE,
            notifier,
        );
        loaded(&mut page).await;

        let mut form = page.new_form();
        let args = [
            "passengerName=Bilal Ahmed",
            "passportNumber=PK7654321",
            "packageName=Economy 15 Days",
            "bookingDate=2024-05-12",
            "received=250000",
            "payable=210000",
            "paymentStatus=paid",
        ];
        form.fill(
            args.iter()
                .map(|text| crate::core::fields::assignment(text))
                .collect::<Result<Vec<_>>>()?,
        )?;
        let created = page.submit(&form).await?;
        assert_eq!(created.profit, 40000.0);
        page.changed().await?;

        let mut editor = page.edit(created.id).await?;
        let (field, value) = crate::core::fields::assignment("payable=200000")?;
        assert_eq!(editor.set_field(field, value)?, vec!["profit"]);
        let updated = page.save(&mut editor).await?;
        assert_eq!(updated.profit, 50000.0);
        page.close();
        Ok(())
    }
}
