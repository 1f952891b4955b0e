//! Cached reads and invalidating mutations for every Launchpad resource.
//!
//! This is the layer the UI talks to. Reads go through the [`QueryCache`],
//! writes go through the [`MutationCoordinator`] with the key groups each
//! write may have changed.

use std::sync::Arc;

use launchpad_core::{
    Analysis, Domain, NewStartup, Notification, Question, Startup, UnreadCount, UploadedArtifact,
    keys,
};
use launchpad_fetch::{LaunchpadApi, UploadFile};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::RefreshConfig;
use crate::error::StoreError;
use crate::mutation::{MutationCoordinator, MutationDescriptor};
use crate::query_cache::{QueryCache, Subscription};
use crate::refresh::BackgroundRefresher;

/// Cached read and mutation facade over [`LaunchpadApi`].
#[derive(Debug, Clone)]
pub struct Queries {
    api: LaunchpadApi,
    cache: QueryCache,
    mutations: MutationCoordinator,
}

impl Queries {
    /// Creates the facade around a shared cache.
    pub fn new(api: LaunchpadApi, cache: QueryCache) -> Self {
        let mutations = MutationCoordinator::new(cache.clone());
        Self {
            api,
            cache,
            mutations,
        }
    }

    /// The shared cache.
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// The underlying API.
    pub fn api(&self) -> &LaunchpadApi {
        &self.api
    }

    /// The mutation coordinator.
    pub fn mutations(&self) -> &MutationCoordinator {
        &self.mutations
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// All startups of the current user.
    pub async fn startups(&self) -> Result<Arc<Vec<Startup>>, StoreError> {
        let api = self.api.clone();
        self.cache
            .read(&keys::startups(), move || {
                let api = api.clone();
                async move { api.list_startups().await }
            })
            .await
    }

    /// One startup.
    pub async fn startup(&self, id: &str) -> Result<Arc<Startup>, StoreError> {
        let api = self.api.clone();
        let id = id.to_string();
        self.cache
            .read(&keys::startup(&id), move || {
                let api = api.clone();
                let id = id.clone();
                async move { api.get_startup(&id).await }
            })
            .await
    }

    /// Analyses of a startup.
    pub async fn analyses(&self, startup_id: &str) -> Result<Arc<Vec<Analysis>>, StoreError> {
        let api = self.api.clone();
        let id = startup_id.to_string();
        self.cache
            .read(&keys::analyses(startup_id), move || {
                let api = api.clone();
                let id = id.clone();
                async move { api.list_analyses(&id).await }
            })
            .await
    }

    /// Follow-up questions for a startup.
    pub async fn questions(&self, startup_id: &str) -> Result<Arc<Vec<Question>>, StoreError> {
        let api = self.api.clone();
        let id = startup_id.to_string();
        self.cache
            .read(&keys::questions(startup_id), move || {
                let api = api.clone();
                let id = id.clone();
                async move { api.list_questions(&id).await }
            })
            .await
    }

    /// Notifications, optionally only unread ones.
    pub async fn notifications(
        &self,
        unread_only: bool,
    ) -> Result<Arc<Vec<Notification>>, StoreError> {
        let api = self.api.clone();
        self.cache
            .read(&keys::notifications(unread_only), move || {
                let api = api.clone();
                async move { api.list_notifications(unread_only).await }
            })
            .await
    }

    /// Unread notification count.
    pub async fn unread_count(&self) -> Result<Arc<UnreadCount>, StoreError> {
        let api = self.api.clone();
        self.cache
            .read(&keys::unread_count(), move || {
                let api = api.clone();
                async move { api.unread_count().await }
            })
            .await
    }

    /// Subscribes to the unread count and makes sure it can be refetched.
    pub fn watch_unread_count(&self) -> Subscription {
        self.register_unread_count();
        self.cache.subscribe(&keys::unread_count())
    }

    fn register_unread_count(&self) {
        let api = self.api.clone();
        self.cache.register(&keys::unread_count(), move || {
            let api = api.clone();
            async move { api.unread_count().await }
        });
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Creates a startup.
    pub async fn create_startup(&self, startup: &NewStartup) -> Result<Startup, StoreError> {
        self.mutations
            .mutate(
                MutationDescriptor::new("create_startup", self.api.create_startup(startup))
                    .invalidates(keys::startups()),
            )
            .await
    }

    /// Deletes a startup and everything listed under it.
    pub async fn delete_startup(&self, id: &str) -> Result<(), StoreError> {
        self.mutations
            .mutate(
                MutationDescriptor::new("delete_startup", self.api.delete_startup(id))
                    .invalidates_all([
                        keys::startups(),
                        keys::startup(id),
                        keys::analyses(id),
                        keys::questions(id),
                    ])
                    .serialize_on(id),
            )
            .await
    }

    /// Starts an analysis run.
    pub async fn run_analysis(&self, startup_id: &str) -> Result<Analysis, StoreError> {
        self.mutations
            .mutate(
                MutationDescriptor::new("run_analysis", self.api.run_analysis(startup_id))
                    .invalidates_all([
                        keys::analyses(startup_id),
                        keys::startup(startup_id),
                        Domain::Notifications.key(),
                    ])
                    .serialize_on(startup_id),
            )
            .await
    }

    /// Answers a question of a startup.
    pub async fn answer_question(
        &self,
        startup_id: &str,
        question_id: &str,
        answer: &str,
    ) -> Result<Question, StoreError> {
        self.mutations
            .mutate(
                MutationDescriptor::new(
                    "answer_question",
                    self.api.answer_question(question_id, answer),
                )
                .invalidates(keys::questions(startup_id))
                .serialize_on(startup_id),
            )
            .await
    }

    /// Marks one notification read.
    pub async fn mark_notification_read(&self, notification_id: &str) -> Result<(), StoreError> {
        self.mutations
            .mutate(
                MutationDescriptor::new("mark_notification_read", self.api.mark_read(notification_id))
                    .invalidates(Domain::Notifications.key()),
            )
            .await
    }

    /// Marks every notification read.
    pub async fn mark_all_notifications_read(&self) -> Result<(), StoreError> {
        self.mutations
            .mutate(
                MutationDescriptor::new("mark_all_notifications_read", self.api.mark_all_read())
                    .invalidates(Domain::Notifications.key()),
            )
            .await
    }

    /// Uploads a document for a startup.
    pub async fn upload_document(
        &self,
        startup_id: &str,
        file: UploadFile,
    ) -> Result<UploadedArtifact, StoreError> {
        self.mutations
            .mutate(
                MutationDescriptor::new("upload_document", self.api.upload_document(startup_id, file))
                    .invalidates(keys::startup(startup_id))
                    .serialize_on(startup_id),
            )
            .await
    }

    // ========================================================================
    // Background Refresh
    // ========================================================================

    /// Starts polling the unread count, unless disabled in `config`.
    pub fn start_background_refresh(
        &self,
        config: &RefreshConfig,
        cancel: CancellationToken,
    ) -> Option<JoinHandle<()>> {
        if !config.enabled {
            info!("Background refresh disabled");
            return None;
        }
        self.register_unread_count();
        let refresher = BackgroundRefresher::from_config(self.cache.clone(), config)
            .with_key(keys::unread_count());
        Some(refresher.spawn(cancel))
    }
}
