//! The session orchestrator.
//!
//! One loop owns every piece of view state: the tile board, the personality
//! tracker and the rotation controller. Network work runs in spawned tasks
//! that report back over a channel, tagged with the load generation so that
//! results for a previous user are cached but never shown.

use std::sync::Arc;

use aura_cache::SessionCaches;
use aura_core::{Artist, Config, ImageProvider, PersonalitySample, ProviderPriority, Result};
use aura_personality::{session_seed, ColorUpdate, PersonalityTracker};
use aura_reveal::{RotationController, TileBoard, TileChange};
use aura_sources::headline_or_fallback;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::presenter::Presenter;
use crate::services::{Backends, ImagePipeline};

const EVENT_BUFFER: usize = 256;

/// Input from the user.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Replace the wall with another user's artists.
    Load(String),
    /// Reorder providers; the first becomes primary.
    SetPriority(ProviderPriority),
    /// Show one provider. Stops rotation.
    SelectProvider(ImageProvider),
    Shutdown,
}

/// Results reported by background tasks.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    Image {
        generation: u64,
        artist: String,
        provider: ImageProvider,
        url: Option<String>,
    },
    Luminance {
        generation: u64,
        artist: String,
        provider: ImageProvider,
        light: bool,
    },
    Personality {
        generation: u64,
        sample: PersonalitySample,
    },
    Headline {
        generation: u64,
        text: String,
    },
}

impl PipelineEvent {
    pub const fn generation(&self) -> u64 {
        match self {
            Self::Image { generation, .. }
            | Self::Luminance { generation, .. }
            | Self::Personality { generation, .. }
            | Self::Headline { generation, .. } => *generation,
        }
    }
}

/// Per-load state, dropped when another user is loaded.
struct LoadState {
    username: String,
    board: TileBoard,
    tracker: PersonalityTracker,
    pending_probes: usize,
    headline: Option<String>,
}

impl LoadState {
    fn is_complete(&self) -> bool {
        self.headline.is_some()
            && self.pending_probes == 0
            && ImageProvider::ALL
                .into_iter()
                .all(|p| self.board.is_fully_loaded(p))
    }
}

pub struct Session<P: Presenter> {
    config: Config,
    backends: Backends,
    pipeline: ImagePipeline,
    presenter: P,
    priority: ProviderPriority,
    rotation: RotationController,
    generation: u64,
    current: Option<LoadState>,
    events_tx: mpsc::Sender<PipelineEvent>,
    events_rx: mpsc::Receiver<PipelineEvent>,
}

impl<P: Presenter> Session<P> {
    pub fn new(config: Config, backends: Backends, presenter: P) -> Self {
        let caches = SessionCaches::new();
        let pipeline = ImagePipeline::new(caches, Arc::clone(&backends.metadata), &backends.images);
        let rotation = RotationController::new(
            config.rotation_delay(),
            config.rotation_interval(),
            config.reduced_motion,
        );
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        Self {
            priority: config.priority.clone(),
            config,
            backends,
            pipeline,
            presenter,
            rotation,
            generation: 0,
            current: None,
            events_tx,
            events_rx,
        }
    }

    pub fn caches(&self) -> &Arc<SessionCaches> {
        self.pipeline.caches()
    }

    pub fn username(&self) -> Option<&str> {
        self.current.as_ref().map(|l| l.username.as_str())
    }

    /// Everything for the current load has arrived: every provider has
    /// attempted every artist and the headline is in. True when nothing is
    /// loaded.
    pub fn is_complete(&self) -> bool {
        self.current.as_ref().map_or(true, LoadState::is_complete)
    }

    /// Fetch `username`'s top artists and start revealing them.
    ///
    /// Caches survive; the wall, rotation and personality start over. A
    /// failed artist list is shown to the user and returned.
    pub async fn load(&mut self, username: &str) -> Result<()> {
        self.generation += 1;
        self.current = None;
        self.rotation.reset();
        info!(username, generation = self.generation, "Loading top artists");

        let artists = match self
            .backends
            .artists
            .top_artists(username, self.config.period, self.config.limit)
            .await
        {
            Ok(artists) => artists,
            Err(e) => {
                warn!(username, "Could not load artists: {e}");
                self.presenter.error(&e);
                return Err(e);
            }
        };

        let board = TileBoard::new(&artists, self.priority.clone());
        let artists: Vec<Artist> = board.tiles().iter().map(|t| t.artist.clone()).collect();
        let seed = session_seed(username, &artists);
        debug!(seed, count = artists.len(), "Session seed");
        let tracker = PersonalityTracker::new(
            artists.len(),
            seed,
            self.config.progressive_every,
            self.config.neutral_saturation,
        );

        self.presenter.wall(username, board.tiles());
        self.presenter.provider(board.priority().primary(), false);
        self.current = Some(LoadState {
            username: username.to_string(),
            board,
            tracker,
            pending_probes: 0,
            headline: None,
        });
        self.spawn_fetches(artists);
        Ok(())
    }

    /// Start every provider fetch for the batch.
    ///
    /// Independent providers get one sequential chain across the batch.
    /// Dependent providers get one task per artist and provider, waiting only
    /// on that artist's metadata, so a slow provider never holds back another
    /// provider's result for the same artist.
    fn spawn_fetches(&self, artists: Vec<Artist>) {
        let generation = self.generation;
        let artists = Arc::new(artists);

        for provider in ImageProvider::ALL.into_iter().filter(|p| p.is_independent()) {
            let pipeline = self.pipeline.clone();
            let tx = self.events_tx.clone();
            let artists = Arc::clone(&artists);
            tokio::spawn(async move {
                for artist in artists.iter() {
                    let url = pipeline.fetch(artist, provider).await;
                    let event = PipelineEvent::Image {
                        generation,
                        artist: artist.name.clone(),
                        provider,
                        url,
                    };
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
                debug!(%provider, "Provider chain finished");
            });
        }

        // Preferred providers are spawned first and reach their limiters first.
        let dependent = self
            .priority
            .iter()
            .chain(ImageProvider::ALL)
            .filter(|p| !p.is_independent())
            .fold(Vec::new(), |mut order, p| {
                if !order.contains(&p) {
                    order.push(p);
                }
                order
            });
        for provider in dependent {
            for artist in artists.iter() {
                let pipeline = self.pipeline.clone();
                let tx = self.events_tx.clone();
                let artist = artist.clone();
                tokio::spawn(async move {
                    let url = pipeline.fetch(&artist, provider).await;
                    let image = PipelineEvent::Image {
                        generation,
                        artist: artist.name.clone(),
                        provider,
                        url,
                    };
                    if tx.send(image).await.is_err() {
                        return;
                    }
                    if provider == ImageProvider::TheAudioDb {
                        let sample = pipeline.personality(&artist).await;
                        let _ = tx.send(PipelineEvent::Personality { generation, sample }).await;
                    }
                });
            }
        }
    }

    /// Apply one background result to the view.
    pub fn handle_event(&mut self, event: PipelineEvent) {
        if event.generation() != self.generation {
            debug!(generation = event.generation(), "Ignoring result from an earlier load");
            return;
        }
        let Some(load) = self.current.as_mut() else {
            return;
        };

        match event {
            PipelineEvent::Image {
                artist,
                provider,
                url,
                ..
            } => {
                let sample_url = url.clone().filter(|_| provider.supports_pixel_sampling());
                let outcome = load.board.record(&artist, provider, url);
                present(&mut self.presenter, &outcome.changes);
                if let Some(done) = outcome.completed {
                    info!(provider = %done, "Provider fully loaded");
                    self.rotation.mark_available(done, Instant::now().into_std());
                }
                if let Some(url) = sample_url {
                    self.probe_luminance(artist, provider, url);
                }
            }
            PipelineEvent::Luminance {
                artist,
                provider,
                light,
                ..
            } => {
                load.pending_probes = load.pending_probes.saturating_sub(1);
                if let Some(change) = load.board.set_light(&artist, provider, light) {
                    self.presenter.tile(&change);
                }
            }
            PipelineEvent::Personality { sample, .. } => {
                let settled = load.board.is_settled();
                if let Some(update) = load.tracker.record(sample, settled) {
                    self.apply_color(update);
                }
            }
            PipelineEvent::Headline { text, .. } => {
                info!(headline = %text, "Headline ready");
                self.presenter.headline(&text);
                load.headline = Some(text);
            }
        }
    }

    /// Classify an image's overlay region, from cache when possible.
    fn probe_luminance(&mut self, artist: String, provider: ImageProvider, url: String) {
        let Some(load) = self.current.as_mut() else {
            return;
        };
        if let Some(light) = self.pipeline.caches().luminance.get(&artist, provider) {
            if let Some(change) = load.board.set_light(&artist, provider, light) {
                self.presenter.tile(&change);
            }
            return;
        }

        load.pending_probes += 1;
        let generation = self.generation;
        let probe = Arc::clone(&self.backends.luminance);
        let caches = Arc::clone(self.pipeline.caches());
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let light = match probe.is_light(&url).await {
                Ok(light) => {
                    caches.luminance.insert(&artist, provider, light);
                    light
                }
                Err(e) => {
                    debug!(artist = %artist, "Luminance sampling failed, assuming dark: {e}");
                    false
                }
            };
            let _ = tx
                .send(PipelineEvent::Luminance {
                    generation,
                    artist,
                    provider,
                    light,
                })
                .await;
        });
    }

    /// Show a color update; the final one also requests the headline.
    fn apply_color(&mut self, update: ColorUpdate) {
        self.presenter.color(&update);
        let ColorUpdate::Final { request, .. } = update else {
            return;
        };

        let generation = self.generation;
        let source = Arc::clone(&self.backends.headline);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let text = headline_or_fallback(source.as_ref(), &request).await;
            let _ = tx.send(PipelineEvent::Headline { generation, text }).await;
        });
    }

    pub async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Load(username) => {
                if let Err(e) = self.load(&username).await {
                    debug!("Load failed: {e}");
                }
            }
            SessionCommand::SetPriority(priority) => {
                self.rotation.manual_select();
                self.priority = priority.clone();
                if let Some(load) = self.current.as_mut() {
                    let changes = load.board.set_priority(priority);
                    self.presenter.provider(load.board.priority().primary(), false);
                    present(&mut self.presenter, &changes);
                }
            }
            SessionCommand::SelectProvider(provider) => {
                self.rotation.manual_select();
                self.priority.promote(provider);
                if let Some(load) = self.current.as_mut() {
                    let changes = load.board.promote(provider);
                    self.presenter.provider(provider, false);
                    present(&mut self.presenter, &changes);
                }
            }
            SessionCommand::Shutdown => {}
        }
    }

    /// Advance rotation if it is due.
    fn rotate(&mut self) {
        let Some(load) = self.current.as_mut() else {
            return;
        };
        let current = load.board.priority().primary();
        if let Some(next) = self.rotation.poll(Instant::now().into_std(), current) {
            debug!(from = %current, to = %next, "Rotating provider");
            let changes = load.board.promote(next);
            self.presenter.provider(next, true);
            present(&mut self.presenter, &changes);
        }
    }

    /// Drive the session until shutdown.
    ///
    /// With `until_complete` set, also return once the current load has
    /// fully finished. Otherwise keep running (and rotating) until a
    /// `Shutdown` command or the command channel closes.
    pub async fn run(
        &mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        until_complete: bool,
    ) {
        let mut commands_open = true;
        loop {
            if until_complete && self.is_complete() {
                break;
            }
            if !commands_open && !until_complete {
                break;
            }
            let due = self.rotation.next_due().map(Instant::from_std);

            tokio::select! {
                command = commands.recv(), if commands_open => match command {
                    Some(SessionCommand::Shutdown) => break,
                    Some(command) => self.handle_command(command).await,
                    None => commands_open = false,
                },
                Some(event) = self.events_rx.recv() => self.handle_event(event),
                () = wait_until(due) => self.rotate(),
            }
        }
        debug!(user = ?self.username(), stats = ?self.caches().stats(), "Session loop finished");
    }
}

fn present<P: Presenter>(presenter: &mut P, changes: &[TileChange]) {
    for change in changes {
        presenter.tile(change);
    }
}

async fn wait_until(due: Option<Instant>) {
    match due {
        Some(due) => sleep_until(due).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use aura_core::Error;
    use aura_personality::FALLBACK_HEADLINE;
    use aura_reveal::{Tile, TileState};
    use parking_lot::Mutex;

    use super::*;
    use crate::services::fakes::{FakeBackends, FakeImages};
    use ImageProvider::{Discogs, Itunes, TheAudioDb};

    #[derive(Default)]
    struct Recorded {
        walls: Vec<String>,
        tiles: HashMap<String, TileChange>,
        changes: Vec<TileChange>,
        providers: Vec<(ImageProvider, bool)>,
        colors: Vec<ColorUpdate>,
        headlines: Vec<String>,
        errors: Vec<String>,
    }

    #[derive(Clone, Default)]
    struct RecordingPresenter(Arc<Mutex<Recorded>>);

    impl Presenter for RecordingPresenter {
        fn wall(&mut self, username: &str, _tiles: &[Tile]) {
            let mut r = self.0.lock();
            r.walls.push(username.to_string());
            r.tiles.clear();
            r.changes.clear();
        }

        fn tile(&mut self, change: &TileChange) {
            let mut r = self.0.lock();
            r.tiles.insert(change.artist.clone(), change.clone());
            r.changes.push(change.clone());
        }

        fn provider(&mut self, provider: ImageProvider, automatic: bool) {
            self.0.lock().providers.push((provider, automatic));
        }

        fn color(&mut self, update: &ColorUpdate) {
            self.0.lock().colors.push(update.clone());
        }

        fn headline(&mut self, text: &str) {
            self.0.lock().headlines.push(text.to_string());
        }

        fn error(&mut self, error: &Error) {
            self.0.lock().errors.push(error.to_string());
        }
    }

    fn artists() -> Vec<Artist> {
        vec![
            Artist::new("Portishead", 100),
            Artist::new("Massive Attack", 50),
            Artist::new("Low", 20),
        ]
    }

    fn fakes() -> FakeBackends {
        let mut fakes = FakeBackends::new(
            FakeImages::new(Itunes)
                .with("Portishead", "it-portishead.jpg")
                .with("Massive Attack", "it-massive.jpg"),
            FakeImages::new(Discogs).with("Low", "dc-low.jpg"),
            FakeImages::new(TheAudioDb)
                .with("Portishead", "adb-portishead.jpg")
                .with_mood("Portishead", "Sad")
                .with_mood("Massive Attack", "Dark"),
        );
        fakes.artists = fakes.artists.with("alice", artists());
        fakes
    }

    fn session(
        config: Config,
        fakes: FakeBackends,
    ) -> (Session<RecordingPresenter>, Arc<Mutex<Recorded>>) {
        let presenter = RecordingPresenter::default();
        let recorded = Arc::clone(&presenter.0);
        (Session::new(config, fakes.backends(), presenter), recorded)
    }

    fn idle_commands() -> (mpsc::Sender<SessionCommand>, mpsc::Receiver<SessionCommand>) {
        mpsc::channel(8)
    }

    fn state(recorded: &Arc<Mutex<Recorded>>, artist: &str) -> TileState {
        recorded.lock().tiles[artist].state.clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_reveals_every_tile() {
        let (mut session, recorded) = session(Config::default(), fakes());
        let (_tx, rx) = idle_commands();
        session.load("alice").await.unwrap();
        session.run(rx, true).await;

        // Default priority puts TheAudioDB first, then Discogs, then iTunes.
        assert_eq!(state(&recorded, "Portishead").provider(), Some(TheAudioDb));
        assert_eq!(state(&recorded, "Massive Attack").provider(), Some(Itunes));
        assert_eq!(state(&recorded, "Low").provider(), Some(Discogs));

        let r = recorded.lock();
        assert_eq!(r.walls, vec!["alice"]);
        assert_eq!(r.headlines.len(), 1);
        assert!(r.headlines[0].starts_with("Moody #"));
        let finals = r
            .colors
            .iter()
            .filter(|c| matches!(c, ColorUpdate::Final { .. }))
            .count();
        assert_eq!(finals, 1);
        assert!(matches!(r.colors.last(), Some(ColorUpdate::Final { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tiles_wait_for_primary_provider() {
        let mut fakes = fakes();
        fakes.audiodb = Arc::new(
            FakeImages::new(TheAudioDb)
                .with("Portishead", "adb-portishead.jpg")
                .with_delay(Duration::from_secs(5)),
        );
        let (mut session, recorded) = session(Config::default(), fakes);
        let (_tx, rx) = idle_commands();
        session.load("alice").await.unwrap();
        session.run(rx, true).await;

        // No tile showed a fallback before TheAudioDB finished its pass.
        let r = recorded.lock();
        let first_reveal = r
            .changes
            .iter()
            .position(|c| !c.state.is_loading())
            .unwrap();
        assert_eq!(r.changes[first_reveal].state.provider(), Some(TheAudioDb));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_does_not_wait_for_slow_provider() {
        let mut fakes = FakeBackends::new(
            FakeImages::new(Itunes)
                .with("Slint", "it-slint.jpg")
                .with("Codeine", "it-codeine.jpg"),
            FakeImages::new(Discogs)
                .with("Slint", "dc-slint.jpg")
                .with_delay(Duration::from_secs(30)),
            FakeImages::new(TheAudioDb).with("Codeine", "adb-codeine.jpg"),
        );
        fakes.artists = fakes
            .artists
            .with("carol", vec![Artist::new("Slint", 10), Artist::new("Codeine", 5)]);
        let config = Config::default().with_reduced_motion(true);
        let (session, recorded) = session(config, fakes);
        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(async move {
            let mut session = session;
            session.run(rx, false).await;
        });

        tx.send(SessionCommand::Load("carol".into())).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        {
            // TheAudioDB has tried everyone; Discogs is still busy with Slint.
            let r = recorded.lock();
            assert_eq!(r.tiles["Codeine"].state.provider(), Some(TheAudioDb));
            assert_eq!(r.tiles.get("Slint").and_then(|c| c.state.provider()), Some(Itunes));
        }

        // Discogs outranks iTunes once it answers.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(state(&recorded, "Slint").provider(), Some(Discogs));

        tx.send(SessionCommand::Shutdown).await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_upstream_failure_is_shown() {
        let (mut session, recorded) = session(Config::default(), fakes());
        assert!(session.load("nobody").await.is_err());
        assert!(session.is_complete());
        assert_eq!(session.username(), None);
        assert_eq!(recorded.lock().errors.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_headline_failure_uses_fallback() {
        let mut fakes = fakes();
        fakes.headline = None;
        let (mut session, recorded) = session(Config::default(), fakes);
        let (_tx, rx) = idle_commands();
        session.load("alice").await.unwrap();
        session.run(rx, true).await;
        assert_eq!(recorded.lock().headlines, vec![FALLBACK_HEADLINE]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_user_same_color_and_headline() {
        let mut results = Vec::new();
        for _ in 0..2 {
            let (mut session, recorded) = session(Config::default(), fakes());
            let (_tx, rx) = idle_commands();
            session.load("alice").await.unwrap();
            session.run(rx, true).await;
            let r = recorded.lock();
            results.push((r.colors.last().map(ColorUpdate::color), r.headlines.clone()));
        }
        assert_eq!(results[0], results[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_light_itunes_image_flags_tile() {
        let mut fakes = fakes();
        fakes.luminance = fakes.luminance.with_light("it-massive.jpg");
        let priority = ProviderPriority::new(vec![Itunes, Discogs, TheAudioDb]).unwrap();
        let (mut session, recorded) = session(Config::default().with_priority(priority), fakes);
        let (_tx, rx) = idle_commands();
        session.load("alice").await.unwrap();
        session.run(rx, true).await;

        let r = recorded.lock();
        assert!(r.tiles["Massive Attack"].light);
        assert!(!r.tiles["Portishead"].light);
        assert!(session.caches().luminance.is_light("massive attack", Itunes));
    }

    #[tokio::test(start_paused = true)]
    async fn test_caches_survive_user_switch() {
        let mut fakes = fakes();
        fakes.artists = fakes
            .artists
            .with("bob", vec![Artist::new("Low", 9), Artist::new("Can", 4)]);
        let itunes = Arc::clone(&fakes.itunes);
        let (mut session, recorded) = session(Config::default(), fakes);

        for user in ["alice", "bob"] {
            let (_tx, rx) = idle_commands();
            session.load(user).await.unwrap();
            session.run(rx, true).await;
        }

        // Low was fetched for alice; only Can is new for bob.
        assert_eq!(itunes.calls(), 4);
        assert_eq!(session.username(), Some("bob"));
        let r = recorded.lock();
        assert_eq!(r.walls, vec!["alice", "bob"]);
        assert!(r.changes.iter().all(|c| c.artist == "Low" || c.artist == "Can"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotation_then_manual_stop() {
        let (session, recorded) = session(Config::default(), fakes());
        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(async move {
            let mut session = session;
            session.run(rx, false).await;
            session
        });

        tx.send(SessionCommand::Load("alice".into())).await.unwrap();
        tokio::time::sleep(Duration::from_secs(20)).await;
        let automatic = recorded.lock().providers.iter().filter(|(_, auto)| *auto).count();
        assert!(automatic >= 2);

        tx.send(SessionCommand::SelectProvider(Discogs)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        let seen = recorded.lock().providers.len();
        tokio::time::sleep(Duration::from_secs(60)).await;
        {
            let r = recorded.lock();
            assert_eq!(r.providers.len(), seen);
            assert_eq!(r.providers.last(), Some(&(Discogs, false)));
        }

        tx.send(SessionCommand::Shutdown).await.unwrap();
        let session = handle.await.unwrap();
        assert_eq!(session.priority.primary(), Discogs);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reduced_motion_never_rotates() {
        let config = Config::default().with_reduced_motion(true);
        let (session, recorded) = session(config, fakes());
        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(async move {
            let mut session = session;
            session.run(rx, false).await;
        });

        tx.send(SessionCommand::Load("alice".into())).await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(recorded.lock().providers.iter().all(|(_, auto)| !auto));

        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_priority_reorders_tiles() {
        let (mut session, recorded) = session(Config::default(), fakes());
        let (_tx, rx) = idle_commands();
        session.load("alice").await.unwrap();
        session.run(rx, true).await;

        let priority = ProviderPriority::new(vec![Itunes, TheAudioDb, Discogs]).unwrap();
        session
            .handle_command(SessionCommand::SetPriority(priority))
            .await;
        assert_eq!(state(&recorded, "Portishead").provider(), Some(Itunes));
        assert_eq!(state(&recorded, "Low").provider(), Some(Discogs));
    }
}
