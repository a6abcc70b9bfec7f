//! Paginated, de-duplicated, sortable feed of catalog entries.
//!
//! The controller is Idle, Loading or Exhausted. A load is split in two
//! halves: [`FeedController::begin_load`] hands out a [`LoadTicket`] and
//! [`FeedController::complete_load`] applies the page fetched for it. Every
//! reset bumps the generation, so a page fetched for an earlier generation
//! is dropped when it completes.

use super::source::FeedSource;
use super::view::{Affordance, CatalogStats, FeedCard, FeedMode, LoadTrigger};
use crate::catalog_store::{MusicPage, SortOrder};
use crate::resolver::TitleResolver;
use crate::service::{CreateMusicRequest, DEFAULT_PAGE_LIMIT};
use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Parameters of an in-flight page load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    pub page: usize,
    pub limit: usize,
    pub sort: SortOrder,
    pub generation: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The trigger arrived while loading, exhausted or searching.
    Ignored,
    /// The ticket belongs to an earlier generation.
    Stale,
    Loaded { added: usize },
    Exhausted,
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted(FeedCard),
    /// No title was given and none could be resolved.
    TitleRequired,
    Failed(String),
}

pub struct FeedController {
    source: Arc<dyn FeedSource>,
    resolver: Arc<dyn TitleResolver>,
    page_limit: usize,

    current_page: usize,
    is_loading: bool,
    has_more: bool,
    seen_urls: HashSet<String>,
    current_sort: SortOrder,
    generation: u64,

    cards: Vec<FeedCard>,
    affordance: Affordance,
    mode: FeedMode,
}

impl FeedController {
    pub fn new(source: Arc<dyn FeedSource>, resolver: Arc<dyn TitleResolver>) -> Self {
        Self::with_page_limit(source, resolver, DEFAULT_PAGE_LIMIT)
    }

    pub fn with_page_limit(
        source: Arc<dyn FeedSource>,
        resolver: Arc<dyn TitleResolver>,
        page_limit: usize,
    ) -> Self {
        FeedController {
            source,
            resolver,
            page_limit: page_limit.max(1),
            current_page: 1,
            is_loading: false,
            has_more: true,
            seen_urls: HashSet::new(),
            current_sort: SortOrder::Newest,
            generation: 0,
            cards: vec![],
            affordance: Affordance::None,
            mode: FeedMode::Browse,
        }
    }

    pub fn cards(&self) -> &[FeedCard] {
        &self.cards
    }

    pub fn affordance(&self) -> &Affordance {
        &self.affordance
    }

    pub fn mode(&self) -> &FeedMode {
        &self.mode
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn current_sort(&self) -> SortOrder {
        self.current_sort
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a page load unless one is running or the feed is exhausted.
    pub fn begin_load(&mut self, trigger: LoadTrigger) -> Option<LoadTicket> {
        if self.is_loading || !self.has_more || self.mode != FeedMode::Browse {
            debug!(
                "Ignoring {:?}: loading={} has_more={} mode={:?}",
                trigger, self.is_loading, self.has_more, self.mode
            );
            return None;
        }
        self.is_loading = true;
        let ticket = LoadTicket {
            page: self.current_page,
            limit: self.page_limit,
            sort: self.current_sort,
            generation: self.generation,
        };
        debug!("{:?} -> loading {:?}", trigger, ticket);
        Some(ticket)
    }

    /// Applies the result of the page fetched for `ticket`.
    pub fn complete_load(&mut self, ticket: LoadTicket, result: Result<MusicPage>) -> LoadOutcome {
        if ticket.generation != self.generation {
            debug!(
                "Dropping page {} of generation {}, current generation is {}",
                ticket.page, ticket.generation, self.generation
            );
            return LoadOutcome::Stale;
        }
        self.is_loading = false;

        let page = match result {
            Ok(page) => page,
            Err(err) => {
                let message = format!("{:#}", err);
                warn!("Loading page {} failed: {}", ticket.page, message);
                self.affordance = Affordance::Retry(message.clone());
                return LoadOutcome::Failed(message);
            }
        };

        let new_cards: Vec<FeedCard> = page
            .music
            .iter()
            .filter(|entry| self.seen_urls.insert(entry.url.clone()))
            .map(FeedCard::from)
            .collect();

        if new_cards.is_empty() {
            debug!("Feed exhausted at page {}", ticket.page);
            self.has_more = false;
            self.affordance = Affordance::None;
            return LoadOutcome::Exhausted;
        }

        let added = new_cards.len();
        self.cards.extend(new_cards);
        self.current_page += 1;
        self.has_more = self.current_page <= page.total_pages;
        self.affordance = if self.has_more {
            Affordance::ShowMore
        } else {
            Affordance::None
        };
        LoadOutcome::Loaded { added }
    }

    /// Runs a full load for `trigger`.
    pub async fn load(&mut self, trigger: LoadTrigger) -> LoadOutcome {
        let Some(ticket) = self.begin_load(trigger) else {
            return LoadOutcome::Ignored;
        };
        let result = self
            .source
            .list_page(ticket.page, ticket.limit, ticket.sort)
            .await;
        self.complete_load(ticket, result)
    }

    /// Retries after a failed load: the active search is re-run, otherwise
    /// it is the same as a "show more" click.
    pub async fn retry(&mut self) -> LoadOutcome {
        match &self.mode {
            FeedMode::Search(query) => {
                let query = query.clone();
                self.search(&query).await
            }
            FeedMode::Browse => self.load(LoadTrigger::ShowMoreClick).await,
        }
    }

    /// Clears the rendered list and every pagination field.
    pub fn reset(&mut self) {
        self.seen_urls.clear();
        self.current_page = 1;
        self.has_more = true;
        self.is_loading = false;
        self.cards.clear();
        self.affordance = Affordance::None;
        self.mode = FeedMode::Browse;
        self.generation += 1;
        debug!("Feed reset, generation {}", self.generation);
    }

    pub async fn toggle_sort(&mut self) -> LoadOutcome {
        self.current_sort = self.current_sort.toggled();
        self.reset();
        self.load(LoadTrigger::SortToggle).await
    }

    /// Replaces the list with search results; an empty query goes back to browsing.
    pub async fn search(&mut self, query: &str) -> LoadOutcome {
        let query = query.trim();
        if query.is_empty() {
            self.reset();
            return self.load(LoadTrigger::SearchClear).await;
        }

        self.generation += 1;
        self.is_loading = false;
        self.mode = FeedMode::Search(query.to_string());
        let generation = self.generation;

        let result = self.source.search(query, self.current_sort).await;
        if generation != self.generation {
            return LoadOutcome::Stale;
        }
        match result {
            Ok(entries) => {
                self.seen_urls = entries.iter().map(|e| e.url.clone()).collect();
                self.cards = entries.iter().map(FeedCard::from).collect();
                self.affordance = Affordance::None;
                LoadOutcome::Loaded {
                    added: self.cards.len(),
                }
            }
            Err(err) => {
                let message = format!("{:#}", err);
                warn!("Search for {:?} failed: {}", query, message);
                self.affordance = Affordance::Retry(message.clone());
                LoadOutcome::Failed(message)
            }
        }
    }

    /// Creates an entry, resolving the title when none is given, then reloads.
    pub async fn submit(
        &mut self,
        url: &str,
        title: Option<&str>,
        shared_by: Option<&str>,
    ) -> SubmitOutcome {
        let url = url.trim();
        let title = match title.map(str::trim).filter(|t| !t.is_empty()) {
            Some(title) => title.to_string(),
            None => match self.resolver.resolve_title(url).await {
                Some(title) => title,
                None => return SubmitOutcome::TitleRequired,
            },
        };

        let request = CreateMusicRequest {
            url: Some(url.to_string()),
            title: Some(title),
            shared_by: shared_by.map(str::to_string),
            shared_at: None,
        };
        match self.source.create(request).await {
            Ok(entry) => {
                self.reset();
                self.load(LoadTrigger::NewSubmission).await;
                SubmitOutcome::Submitted(FeedCard::from(&entry))
            }
            Err(err) => {
                let message = format!("{:#}", err);
                warn!("Saving {} failed: {}", url, message);
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// A random entry to play, `None` when the catalog is empty.
    pub async fn play_random(&self) -> Result<Option<FeedCard>> {
        let entry = self.source.random_one().await?;
        Ok(entry.as_ref().map(FeedCard::from))
    }

    pub async fn stats(&self) -> Result<CatalogStats> {
        let entries = self.source.list_all().await?;
        Ok(CatalogStats::from_entries(&entries))
    }
}
