//! Favorites list controller.
//!
//! Owns the authoritative list, the inline edit session and transient notices.
//! Writes go to the backend through `preferences_service`; completions are
//! applied in `handle_message`. Each write registers an [`OpKey`] so a second
//! write against the same entry is refused until the first completes. A star
//! removal holds both the city key and the key of the local entry it matches,
//! and deletes or renames are refused while their city is busy.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use skyfav_core::{normalize, same_city, AppError, FavoritesError, InFlight, ValidationError};
use skyfav_services::{FavoriteCity, FavoriteId};

use crate::app_services::AppServices;
use crate::error_mapping::favorites_failure;
use crate::models::edit_session::{EditSession, InteractionTarget};
pub use crate::services::preferences_service::AddOrigin;
use crate::services::preferences_service::{
    self as svc, PreferencesError, PreferencesServiceMessage,
};

const ADDED: &str = "تمت إضافة المدينة إلى المفضلة!";
const UPDATED: &str = "تم تحديث المدينة بنجاح!";
const DELETED: &str = "تم حذف المدينة بنجاح.";
const EMPTY_LIST: &str = "لا توجد مدن مفضلة حتى الآن";

/// What an in-flight write is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OpKey {
    /// Rename or delete of an existing entry
    Entry(FavoriteId),
    /// Add or star toggle, by normalized city name
    City(String),
}

/// Success message shown until its expiry fires or a newer notice replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: &'static str,
    generation: u64,
}

impl Notice {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

pub struct FavoritesModel {
    services: Arc<AppServices>,
    tx: Sender<PreferencesServiceMessage>,
    rx: Receiver<PreferencesServiceMessage>,
    favorites: Vec<FavoriteCity>,
    loading: bool,
    in_flight: InFlight<OpKey>,
    /// Optimistically removed entries and their former positions
    pending_deletes: HashMap<FavoriteId, (usize, FavoriteCity)>,
    /// Local entry held by each star removal, by normalized city
    star_removals: HashMap<String, FavoriteId>,
    /// Bumped on every confirmed write
    write_seq: u64,
    /// `write_seq` when the outstanding load was issued
    load_mark: u64,
    edit: Option<EditSession>,
    new_city: String,
    error: Option<AppError>,
    notice: Option<Notice>,
    notice_generation: u64,
    auth_failed: bool,
}

impl FavoritesModel {
    pub fn new(services: Arc<AppServices>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            services,
            tx,
            rx,
            favorites: Vec::new(),
            loading: false,
            in_flight: InFlight::new(),
            pending_deletes: HashMap::new(),
            star_removals: HashMap::new(),
            write_seq: 0,
            load_mark: 0,
            edit: None,
            new_city: String::new(),
            error: None,
            notice: None,
            notice_generation: 0,
            auth_failed: false,
        }
    }

    // ---- Reads ----

    pub fn list(&self) -> &[FavoriteCity] {
        &self.favorites
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(AppError::user_message)
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn edit_session(&self) -> Option<&EditSession> {
        self.edit.as_ref()
    }

    pub fn new_city_input(&self) -> &str {
        &self.new_city
    }

    /// Placeholder text when the settled list is empty.
    pub fn empty_message(&self) -> Option<&'static str> {
        (!self.loading && self.favorites.is_empty()).then_some(EMPTY_LIST)
    }

    pub fn is_entry_busy(&self, id: &str) -> bool {
        self.in_flight.is_busy(&OpKey::Entry(id.to_string()))
    }

    pub fn is_city_busy(&self, city: &str) -> bool {
        self.in_flight.is_busy(&OpKey::City(normalize(city)))
    }

    /// True while a load or any write is outstanding.
    pub fn is_busy(&self) -> bool {
        self.loading || !self.in_flight.is_idle()
    }

    /// Whether the save control of the open editor is enabled.
    pub fn can_commit(&self) -> bool {
        self.edit
            .as_ref()
            .is_some_and(|s| s.can_commit() && !self.is_entry_busy(s.target_id()))
    }

    /// Returns (and clears) whether a request failed for lack of a session.
    pub fn take_auth_failure(&mut self) -> bool {
        std::mem::take(&mut self.auth_failed)
    }

    // ---- Operations ----

    /// Replace the list with the backend's.
    pub fn load(&mut self) {
        if self.loading {
            tracing::debug!("Favorites load already in flight");
            return;
        }
        self.loading = true;
        self.request_load();
    }

    fn request_load(&mut self) {
        self.load_mark = self.write_seq;
        svc::request_load(&self.tx, &self.services.runtime, self.services.preferences.clone());
    }

    pub fn set_new_city_input(&mut self, text: impl Into<String>) {
        self.new_city = text.into();
    }

    /// Add whatever is in the form input.
    pub fn submit_new_city(&mut self) -> Result<(), ValidationError> {
        let city = self.new_city.clone();
        self.add(&city, AddOrigin::Form)
    }

    /// Add `city_name`. Blank names are rejected without a request.
    pub fn add(&mut self, city_name: &str, origin: AddOrigin) -> Result<(), ValidationError> {
        let trimmed = city_name.trim();
        if trimmed.is_empty() {
            self.error = Some(ValidationError::EmptyCityName.into());
            return Err(ValidationError::EmptyCityName);
        }

        let city = normalize(trimmed);
        if !self.in_flight.try_start(OpKey::City(city.clone())) {
            tracing::warn!("Add of {} already in flight, ignoring", city);
            return Ok(());
        }

        tracing::debug!(%city, ?origin, "Adding favorite");
        svc::request_add(
            &self.tx,
            &self.services.runtime,
            self.services.preferences.clone(),
            city,
            origin,
        );
        Ok(())
    }

    /// Remove `city` by looking up its current id on the backend.
    ///
    /// Refused while the local entry for `city` has a delete or rename in
    /// flight; otherwise that entry stays locked until the removal completes.
    pub fn remove_city(&mut self, city_name: &str) {
        let city = normalize(city_name.trim());
        let local = self
            .favorites
            .iter()
            .chain(self.pending_deletes.values().map(|(_, f)| f))
            .find(|f| same_city(&f.city, &city))
            .map(|f| f.id.clone());
        if let Some(id) = &local {
            if self.is_entry_busy(id) {
                tracing::warn!(id = %id, "Write already in flight for favorite, ignoring removal");
                return;
            }
        }
        if !self.in_flight.try_start(OpKey::City(city.clone())) {
            tracing::warn!("Removal of {} already in flight, ignoring", city);
            return;
        }
        if let Some(id) = local {
            self.in_flight.try_start(OpKey::Entry(id.clone()));
            self.star_removals.insert(city.clone(), id);
        }

        tracing::debug!(%city, "Removing favorite by name");
        svc::request_remove_city(
            &self.tx,
            &self.services.runtime,
            self.services.preferences.clone(),
            city,
        );
    }

    /// Open the inline editor on `id`, discarding any other open editor.
    pub fn start_edit(&mut self, id: &str) -> bool {
        let Some(favorite) = self.favorites.iter().find(|f| f.id == id) else {
            tracing::warn!(id = %id, "Cannot edit unknown favorite");
            return false;
        };
        if let Some(previous) = &self.edit {
            tracing::debug!(previous = previous.target_id(), "Replacing open edit session");
        }
        self.edit = Some(EditSession::new(favorite.id.clone(), &favorite.city));
        true
    }

    pub fn set_edit_value(&mut self, value: impl Into<String>) {
        if let Some(session) = self.edit.as_mut() {
            session.set_value(value);
        }
    }

    /// Send the edited name.
    ///
    /// Empty or unchanged values are refused without a request; the session
    /// stays open either way until the rename succeeds.
    pub fn commit_edit(&mut self) -> Result<(), ValidationError> {
        let Some(session) = self.edit.as_ref() else {
            tracing::debug!("Commit without an open edit session");
            return Ok(());
        };
        let new_city = normalize(session.validate()?);
        let id = session.target_id().to_string();

        if self.is_city_of_entry_busy(&id) {
            tracing::warn!(id = %id, "Removal in flight for favorite's city, ignoring commit");
            return Ok(());
        }
        if !self.in_flight.try_start(OpKey::Entry(id.clone())) {
            tracing::warn!(id = %id, "Write already in flight for favorite, ignoring commit");
            return Ok(());
        }

        svc::request_rename(
            &self.tx,
            &self.services.runtime,
            self.services.preferences.clone(),
            id,
            new_city,
        );
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        if self.edit.take().is_some() {
            tracing::debug!("Edit session cancelled");
        }
    }

    /// Route a pointer/focus event; cancels the editor when it lands outside.
    pub fn interaction(&mut self, target: InteractionTarget) {
        if self.edit.is_some() && target.cancels_edit() {
            self.cancel_edit();
        }
    }

    /// City to navigate to when a favorite is opened. `None` while editing.
    pub fn navigation_target(&self, id: &str) -> Option<String> {
        if self.edit.is_some() {
            return None;
        }
        self.favorites
            .iter()
            .find(|f| f.id == id)
            .map(|f| f.city.clone())
    }

    /// Remove `id` locally right away, then on the backend. Restored if the
    /// backend refuses.
    pub fn delete(&mut self, id: &str) {
        let Some(index) = self.favorites.iter().position(|f| f.id == id) else {
            tracing::warn!(id = %id, "Cannot delete unknown favorite");
            return;
        };
        if self.is_city_of_entry_busy(id) {
            tracing::warn!(id = %id, "Removal in flight for favorite's city, ignoring delete");
            return;
        }
        if !self.in_flight.try_start(OpKey::Entry(id.to_string())) {
            tracing::warn!(id = %id, "Write already in flight for favorite, ignoring delete");
            return;
        }

        let removed = self.favorites.remove(index);
        if self.edit.as_ref().is_some_and(|s| s.target_id() == id) {
            self.edit = None;
        }
        self.pending_deletes.insert(removed.id.clone(), (index, removed));

        svc::request_delete(
            &self.tx,
            &self.services.runtime,
            self.services.preferences.clone(),
            id.to_string(),
        );
    }

    fn is_city_of_entry_busy(&self, id: &str) -> bool {
        self.favorites
            .iter()
            .find(|f| f.id == id)
            .is_some_and(|f| self.is_city_busy(&f.city))
    }

    /// Drop all user state (logout). Completions of requests still in flight
    /// go to the old channel and are never applied.
    pub fn clear(&mut self) {
        let (tx, rx) = mpsc::channel();
        self.tx = tx;
        self.rx = rx;
        self.favorites.clear();
        self.loading = false;
        self.in_flight.clear();
        self.pending_deletes.clear();
        self.star_removals.clear();
        self.edit = None;
        self.new_city.clear();
        self.error = None;
        self.notice = None;
        self.auth_failed = false;
    }

    // ---- Completions ----

    /// Apply every completion waiting on the channel.
    pub fn poll_channel(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            self.handle_message(msg);
        }
    }

    pub fn handle_message(&mut self, msg: PreferencesServiceMessage) {
        match msg {
            PreferencesServiceMessage::LoadDone(result) => self.on_load_done(result),
            PreferencesServiceMessage::AddDone {
                city,
                origin,
                result,
            } => self.on_add_done(city, origin, result),
            PreferencesServiceMessage::RenameDone {
                id,
                new_city,
                result,
            } => self.on_rename_done(id, new_city, result),
            PreferencesServiceMessage::DeleteDone { id, result } => self.on_delete_done(id, result),
            PreferencesServiceMessage::RemoveCityDone { city, result } => {
                self.on_remove_city_done(city, result)
            }
            PreferencesServiceMessage::NoticeExpired { generation } => {
                if self.notice.as_ref().is_some_and(|n| n.generation == generation) {
                    self.notice = None;
                }
            }
        }
    }

    fn on_load_done(&mut self, result: Result<Vec<FavoriteCity>, PreferencesError>) {
        if result.is_ok() && self.write_seq != self.load_mark {
            tracing::debug!("Favorites changed while loading, reloading");
            self.request_load();
            return;
        }
        self.loading = false;
        match result {
            Ok(records) => {
                let mut favorites: Vec<FavoriteCity> = Vec::with_capacity(records.len());
                for record in records {
                    if self.pending_deletes.contains_key(&record.id)
                        || favorites.iter().any(|f| f.id == record.id)
                    {
                        continue;
                    }
                    favorites.push(record.normalized());
                }
                tracing::info!("Loaded {} favorites", favorites.len());
                self.favorites = favorites;

                if let Some(session) = &self.edit {
                    if !self.favorites.iter().any(|f| f.id == session.target_id()) {
                        self.edit = None;
                    }
                }
                if matches!(
                    self.error,
                    Some(AppError::Favorites(FavoritesError::LoadFailed(_)))
                ) {
                    self.error = None;
                }
            }
            Err(e) => {
                tracing::warn!("Failed to load favorites: {}", e);
                self.fail(e, FavoritesError::LoadFailed);
            }
        }
    }

    fn on_add_done(
        &mut self,
        city: String,
        origin: AddOrigin,
        result: Result<FavoriteCity, PreferencesError>,
    ) {
        self.in_flight.finish(&OpKey::City(city));
        match result {
            Ok(record) => {
                let record = record.normalized();
                match self.favorites.iter_mut().find(|f| f.id == record.id) {
                    Some(existing) => *existing = record,
                    None => self.favorites.push(record),
                }
                if origin == AddOrigin::Form {
                    self.new_city.clear();
                }
                self.write_seq += 1;
                self.error = None;
                self.show_notice(ADDED);
            }
            Err(e) => {
                tracing::warn!("Failed to add favorite: {}", e);
                let op: fn(String) -> FavoritesError = match origin {
                    AddOrigin::Form => FavoritesError::AddFailed,
                    AddOrigin::Star => FavoritesError::StarAddFailed,
                };
                self.fail(e, op);
            }
        }
    }

    fn on_rename_done(
        &mut self,
        id: FavoriteId,
        new_city: String,
        result: Result<(), PreferencesError>,
    ) {
        self.in_flight.finish(&OpKey::Entry(id.clone()));
        match result {
            Ok(()) => {
                if let Some(entry) = self.favorites.iter_mut().find(|f| f.id == id) {
                    entry.city = new_city;
                }
                self.write_seq += 1;
                if self.edit.as_ref().is_some_and(|s| s.target_id() == id) {
                    self.edit = None;
                }
                self.error = None;
                self.show_notice(UPDATED);
            }
            Err(e) => {
                tracing::warn!(id = %id, "Failed to rename favorite: {}", e);
                self.fail(e, FavoritesError::UpdateFailed);
            }
        }
    }

    fn on_delete_done(&mut self, id: FavoriteId, result: Result<(), PreferencesError>) {
        self.in_flight.finish(&OpKey::Entry(id.clone()));
        let pending = self.pending_deletes.remove(&id);
        match result {
            Ok(()) => {
                self.write_seq += 1;
                self.error = None;
                self.show_notice(DELETED);
            }
            Err(e) => {
                tracing::warn!(id = %id, "Failed to delete favorite, restoring: {}", e);
                if let Some((index, entry)) = pending {
                    if !self.favorites.iter().any(|f| f.id == entry.id) {
                        let at = index.min(self.favorites.len());
                        self.favorites.insert(at, entry);
                    }
                }
                self.fail(e, FavoritesError::DeleteFailed);
            }
        }
    }

    fn on_remove_city_done(
        &mut self,
        city: String,
        result: Result<Option<FavoriteId>, PreferencesError>,
    ) {
        self.in_flight.finish(&OpKey::City(city.clone()));
        if let Some(held) = self.star_removals.remove(&city) {
            self.in_flight.finish(&OpKey::Entry(held));
        }
        match result {
            Ok(Some(id)) => {
                self.write_seq += 1;
                self.favorites.retain(|f| f.id != id);
                if self.edit.as_ref().is_some_and(|s| s.target_id() == id) {
                    self.edit = None;
                }
                self.error = None;
                self.show_notice(DELETED);
            }
            Ok(None) => {
                tracing::debug!(%city, "City was not a favorite on the backend");
                self.favorites.retain(|f| !same_city(&f.city, &city));
            }
            Err(e) => {
                tracing::warn!(%city, "Failed to remove favorite: {}", e);
                self.fail(e, FavoritesError::StarRemoveFailed);
            }
        }
    }

    fn fail(&mut self, e: PreferencesError, op: fn(String) -> FavoritesError) {
        let err = favorites_failure(e, op);
        if err.is_auth_error() {
            self.auth_failed = true;
        }
        self.error = Some(err);
    }

    fn show_notice(&mut self, message: &'static str) {
        self.notice_generation += 1;
        let generation = self.notice_generation;
        self.notice = Some(Notice {
            message,
            generation,
        });
        svc::schedule_notice_expiry(
            &self.tx,
            &self.services.runtime,
            generation,
            self.services.notice_duration,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyfav_core::Config;
    use skyfav_weather::NoGeolocation;

    /// Services pointing at a closed port; tests drive completions by hand.
    fn model() -> FavoritesModel {
        let mut config = Config::default();
        config.backend.base_url = "http://127.0.0.1:9/api".into();
        let services = AppServices::new(
            &config,
            tokio::runtime::Handle::current(),
            Arc::new(NoGeolocation),
        )
        .unwrap();
        FavoritesModel::new(Arc::new(services))
    }

    fn fav(id: &str, city: &str) -> FavoriteCity {
        FavoriteCity {
            id: id.into(),
            city: city.into(),
        }
    }

    fn loaded(cities: &[(&str, &str)]) -> FavoritesModel {
        let mut m = model();
        m.load();
        m.handle_message(PreferencesServiceMessage::LoadDone(Ok(cities
            .iter()
            .map(|(id, c)| fav(id, c))
            .collect())));
        m
    }

    fn network(msg: &str) -> PreferencesError {
        PreferencesError::Network(msg.into())
    }

    #[tokio::test]
    async fn load_normalizes_and_dedupes() {
        let m = loaded(&[("1", "Café"), ("2", "Giza"), ("1", "Cafe again")]);
        assert_eq!(m.list(), &[fav("1", "Cafe"), fav("2", "Giza")]);
        assert!(!m.is_loading());
    }

    #[tokio::test]
    async fn load_failure_keeps_list() {
        let mut m = loaded(&[("1", "Cairo")]);
        m.load();
        m.handle_message(PreferencesServiceMessage::LoadDone(Err(network("down"))));
        assert_eq!(m.list().len(), 1);
        assert_eq!(m.error_message().as_deref(), Some("فشل في جلب المدن المفضلة"));
    }

    #[tokio::test]
    async fn load_failure_leaves_write_guards_alone() {
        let mut m = loaded(&[("1", "Cairo")]);
        m.delete("1");
        m.load();
        m.handle_message(PreferencesServiceMessage::LoadDone(Err(network("down"))));
        assert!(m.is_entry_busy("1"));
    }

    #[tokio::test]
    async fn blank_add_is_validation_error() {
        let mut m = model();
        assert_eq!(m.add("   ", AddOrigin::Form), Err(ValidationError::EmptyCityName));
        assert_eq!(m.add("", AddOrigin::Form), Err(ValidationError::EmptyCityName));
        assert!(!m.is_busy());
        assert_eq!(m.error_message().as_deref(), Some("الرجاء إدخال اسم المدينة."));
    }

    #[tokio::test]
    async fn add_appends_backend_record_and_clears_input() {
        let mut m = loaded(&[("1", "Cairo")]);
        m.set_new_city_input(" Giza ");
        m.submit_new_city().unwrap();
        assert!(m.is_city_busy("Giza"));

        m.handle_message(PreferencesServiceMessage::AddDone {
            city: "Giza".into(),
            origin: AddOrigin::Form,
            result: Ok(fav("2", "Giza")),
        });

        assert_eq!(m.list().len(), 2);
        assert_eq!(m.list()[1], fav("2", "Giza"));
        assert_eq!(m.new_city_input(), "");
        assert_eq!(m.notice().map(|n| n.message), Some(ADDED));
        assert!(!m.is_city_busy("Giza"));
    }

    #[tokio::test]
    async fn add_failure_leaves_list() {
        let mut m = loaded(&[("1", "Cairo")]);
        m.add("Giza", AddOrigin::Form).unwrap();
        m.handle_message(PreferencesServiceMessage::AddDone {
            city: "Giza".into(),
            origin: AddOrigin::Form,
            result: Err(network("500")),
        });
        assert_eq!(m.list().len(), 1);
        assert_eq!(m.error_message().as_deref(), Some("فشل في إضافة المدينة المفضلة"));
    }

    #[tokio::test]
    async fn star_add_failure_has_own_message() {
        let mut m = model();
        m.add("Giza", AddOrigin::Star).unwrap();
        m.handle_message(PreferencesServiceMessage::AddDone {
            city: "Giza".into(),
            origin: AddOrigin::Star,
            result: Err(network("500")),
        });
        assert_eq!(
            m.error_message().as_deref(),
            Some("فشل في إضافة المدينة إلى المفضلة")
        );
    }

    #[tokio::test]
    async fn duplicate_add_while_in_flight_is_refused() {
        let mut m = model();
        m.add("Giza", AddOrigin::Form).unwrap();
        m.add("Giza", AddOrigin::Star).unwrap();
        m.handle_message(PreferencesServiceMessage::AddDone {
            city: "Giza".into(),
            origin: AddOrigin::Form,
            result: Ok(fav("2", "Giza")),
        });
        assert!(!m.is_busy());
        assert_eq!(m.list().len(), 1);
    }

    #[tokio::test]
    async fn new_edit_replaces_previous() {
        let mut m = loaded(&[("1", "Cairo"), ("2", "Giza")]);
        assert!(m.start_edit("1"));
        m.set_edit_value("Alexandria");
        assert!(m.start_edit("2"));

        let session = m.edit_session().unwrap();
        assert_eq!(session.target_id(), "2");
        assert_eq!(session.editing_value(), "Giza");
        assert_eq!(m.list()[0].city, "Cairo");
    }

    #[tokio::test]
    async fn commit_disabled_when_unchanged_or_blank() {
        let mut m = loaded(&[("1", "Cairo")]);
        m.start_edit("1");
        assert!(!m.can_commit());
        assert_eq!(m.commit_edit(), Err(ValidationError::UnchangedCityName));

        m.set_edit_value("  ");
        assert!(!m.can_commit());
        assert_eq!(m.commit_edit(), Err(ValidationError::EmptyCityName));
        assert!(!m.is_entry_busy("1"));
        assert!(m.edit_session().is_some());
    }

    #[tokio::test]
    async fn commit_success_renames_and_closes() {
        let mut m = loaded(&[("1", "Cairo")]);
        m.start_edit("1");
        m.set_edit_value("Luxor");
        assert!(m.can_commit());
        m.commit_edit().unwrap();
        assert!(m.is_entry_busy("1"));
        assert!(!m.can_commit());

        m.handle_message(PreferencesServiceMessage::RenameDone {
            id: "1".into(),
            new_city: "Luxor".into(),
            result: Ok(()),
        });

        assert_eq!(m.list()[0].city, "Luxor");
        assert!(m.edit_session().is_none());
        assert_eq!(m.notice().map(|n| n.message), Some(UPDATED));
    }

    #[tokio::test]
    async fn commit_failure_keeps_session_open() {
        let mut m = loaded(&[("1", "Cairo")]);
        m.start_edit("1");
        m.set_edit_value("Luxor");
        m.commit_edit().unwrap();
        m.handle_message(PreferencesServiceMessage::RenameDone {
            id: "1".into(),
            new_city: "Luxor".into(),
            result: Err(network("500")),
        });

        assert_eq!(m.list()[0].city, "Cairo");
        assert_eq!(m.edit_session().map(|s| s.editing_value()), Some("Luxor"));
        assert_eq!(m.error_message().as_deref(), Some("فشل في تحديث المدينة المفضلة"));
        assert!(m.can_commit());
    }

    #[tokio::test]
    async fn outside_interaction_cancels_edit() {
        let mut m = loaded(&[("1", "Cairo")]);
        m.start_edit("1");
        m.interaction(InteractionTarget::control());
        assert!(m.edit_session().is_some());
        m.interaction(InteractionTarget::inside_editor());
        assert!(m.edit_session().is_some());
        m.interaction(InteractionTarget::outside());
        assert!(m.edit_session().is_none());
    }

    #[tokio::test]
    async fn navigation_blocked_while_editing() {
        let mut m = loaded(&[("1", "Cairo")]);
        assert_eq!(m.navigation_target("1").as_deref(), Some("Cairo"));
        m.start_edit("1");
        assert!(m.navigation_target("1").is_none());
        m.cancel_edit();
        assert_eq!(m.navigation_target("1").as_deref(), Some("Cairo"));
    }

    #[tokio::test]
    async fn delete_is_optimistic() {
        let mut m = loaded(&[("1", "Cairo"), ("2", "Giza")]);
        m.delete("1");
        assert_eq!(m.list(), &[fav("2", "Giza")]);

        m.handle_message(PreferencesServiceMessage::DeleteDone {
            id: "1".into(),
            result: Ok(()),
        });
        assert_eq!(m.list(), &[fav("2", "Giza")]);
        assert_eq!(m.notice().map(|n| n.message), Some(DELETED));
    }

    #[tokio::test]
    async fn delete_failure_restores_position_and_reports() {
        let mut m = loaded(&[("1", "Cairo"), ("2", "Giza"), ("3", "Luxor")]);
        m.delete("2");
        m.handle_message(PreferencesServiceMessage::DeleteDone {
            id: "2".into(),
            result: Err(network("500")),
        });

        let ids: Vec<_> = m.list().iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
        assert_eq!(m.error_message().as_deref(), Some("فشل في حذف المدينة."));
    }

    #[tokio::test]
    async fn second_delete_while_pending_is_ignored() {
        let mut m = loaded(&[("1", "Cairo")]);
        m.delete("1");
        m.delete("1");
        assert!(m.is_entry_busy("1"));
        assert!(m.list().is_empty());
    }

    #[tokio::test]
    async fn deleting_edited_entry_closes_editor() {
        let mut m = loaded(&[("1", "Cairo")]);
        m.start_edit("1");
        m.delete("1");
        assert!(m.edit_session().is_none());
    }

    #[tokio::test]
    async fn reload_during_pending_delete_keeps_entry_hidden() {
        let mut m = loaded(&[("1", "Cairo"), ("2", "Giza")]);
        m.delete("1");
        m.load();
        m.handle_message(PreferencesServiceMessage::LoadDone(Ok(vec![
            fav("1", "Cairo"),
            fav("2", "Giza"),
        ])));
        assert_eq!(m.list(), &[fav("2", "Giza")]);
    }

    #[tokio::test]
    async fn remove_city_drops_matching_entry() {
        let mut m = loaded(&[("1", "Cairo"), ("2", "Giza")]);
        m.remove_city("Cairo");
        assert!(m.is_city_busy("Cairo"));
        m.handle_message(PreferencesServiceMessage::RemoveCityDone {
            city: "Cairo".into(),
            result: Ok(Some("1".into())),
        });
        assert_eq!(m.list(), &[fav("2", "Giza")]);
        assert!(!m.is_city_busy("Cairo"));
    }

    #[tokio::test]
    async fn remove_city_failure_has_own_message() {
        let mut m = loaded(&[("1", "Cairo")]);
        m.remove_city("Cairo");
        m.handle_message(PreferencesServiceMessage::RemoveCityDone {
            city: "Cairo".into(),
            result: Err(network("500")),
        });
        assert_eq!(m.list().len(), 1);
        assert_eq!(
            m.error_message().as_deref(),
            Some("فشل في إزالة المدينة من المفضلة")
        );
    }

    #[tokio::test]
    async fn city_removal_locks_its_entry() {
        let mut m = loaded(&[("1", "Cairo"), ("2", "Giza")]);
        m.start_edit("1");
        m.set_edit_value("Luxor");
        m.remove_city("Cairo");
        assert!(m.is_entry_busy("1"));

        m.delete("1");
        assert_eq!(m.list().len(), 2);
        assert_eq!(m.commit_edit(), Ok(()));
        assert!(!m.can_commit());

        m.handle_message(PreferencesServiceMessage::RemoveCityDone {
            city: "Cairo".into(),
            result: Ok(Some("1".into())),
        });
        assert!(!m.is_busy());
        assert_eq!(m.list(), &[fav("2", "Giza")]);
        assert!(m.edit_session().is_none());
    }

    #[tokio::test]
    async fn city_removal_refused_while_entry_write_in_flight() {
        let mut m = loaded(&[("1", "Cairo"), ("2", "Giza")]);
        m.delete("1");
        m.remove_city("Cairo");
        assert!(!m.is_city_busy("Cairo"));

        m.start_edit("2");
        m.set_edit_value("Luxor");
        m.commit_edit().unwrap();
        m.remove_city("Giza");
        assert!(!m.is_city_busy("Giza"));
    }

    #[tokio::test]
    async fn failed_city_removal_releases_entry() {
        let mut m = loaded(&[("1", "Cairo")]);
        m.remove_city("Cairo");
        m.handle_message(PreferencesServiceMessage::RemoveCityDone {
            city: "Cairo".into(),
            result: Err(network("500")),
        });
        assert!(!m.is_entry_busy("1"));
        m.delete("1");
        assert!(m.list().is_empty());
    }

    #[tokio::test]
    async fn load_answered_before_add_confirmed_is_reissued() {
        let mut m = loaded(&[("1", "Cairo")]);
        m.load();
        m.add("Giza", AddOrigin::Form).unwrap();
        m.handle_message(PreferencesServiceMessage::AddDone {
            city: "Giza".into(),
            origin: AddOrigin::Form,
            result: Ok(fav("2", "Giza")),
        });

        m.handle_message(PreferencesServiceMessage::LoadDone(Ok(vec![fav("1", "Cairo")])));
        assert_eq!(m.list(), &[fav("1", "Cairo"), fav("2", "Giza")]);
        assert!(m.is_loading());

        m.handle_message(PreferencesServiceMessage::LoadDone(Ok(vec![
            fav("1", "Cairo"),
            fav("2", "Giza"),
        ])));
        assert_eq!(m.list().len(), 2);
        assert!(!m.is_loading());
    }

    #[tokio::test]
    async fn load_answered_before_rename_confirmed_is_reissued() {
        let mut m = loaded(&[("1", "Cairo")]);
        m.load();
        m.start_edit("1");
        m.set_edit_value("Luxor");
        m.commit_edit().unwrap();
        m.handle_message(PreferencesServiceMessage::RenameDone {
            id: "1".into(),
            new_city: "Luxor".into(),
            result: Ok(()),
        });

        m.handle_message(PreferencesServiceMessage::LoadDone(Ok(vec![fav("1", "Cairo")])));
        assert_eq!(m.list(), &[fav("1", "Luxor")]);
        assert!(m.is_loading());
    }

    #[tokio::test]
    async fn accent_only_edit_counts_as_unchanged() {
        let mut m = loaded(&[("1", "cafe")]);
        m.start_edit("1");
        m.set_edit_value("café");
        assert!(!m.can_commit());
        assert_eq!(m.commit_edit(), Err(ValidationError::UnchangedCityName));
        assert!(!m.is_entry_busy("1"));
    }

    #[tokio::test]
    async fn newer_notice_survives_older_expiry() {
        let mut m = loaded(&[("1", "Cairo"), ("2", "Giza")]);
        m.delete("1");
        m.handle_message(PreferencesServiceMessage::DeleteDone {
            id: "1".into(),
            result: Ok(()),
        });
        let first = m.notice().unwrap().generation();

        m.delete("2");
        m.handle_message(PreferencesServiceMessage::DeleteDone {
            id: "2".into(),
            result: Ok(()),
        });
        let second = m.notice().unwrap().generation();
        assert!(second > first);

        m.handle_message(PreferencesServiceMessage::NoticeExpired { generation: first });
        assert!(m.notice().is_some());
        m.handle_message(PreferencesServiceMessage::NoticeExpired { generation: second });
        assert!(m.notice().is_none());
    }

    #[tokio::test]
    async fn unauthorized_is_reported_once() {
        let mut m = model();
        m.load();
        m.handle_message(PreferencesServiceMessage::LoadDone(Err(
            PreferencesError::Unauthorized,
        )));
        assert!(m.take_auth_failure());
        assert!(!m.take_auth_failure());
    }

    #[tokio::test]
    async fn empty_message_only_when_settled() {
        let mut m = model();
        m.load();
        assert!(m.empty_message().is_none());
        m.handle_message(PreferencesServiceMessage::LoadDone(Ok(vec![])));
        assert_eq!(m.empty_message(), Some(EMPTY_LIST));
    }

    #[tokio::test]
    async fn clear_resets_everything() {
        let mut m = loaded(&[("1", "Cairo")]);
        m.start_edit("1");
        m.delete("1");
        m.clear();
        assert!(m.list().is_empty());
        assert!(!m.is_busy());
        assert!(m.edit_session().is_none());
    }
}
