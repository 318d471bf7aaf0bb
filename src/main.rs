use std::future::Future;
use std::io::Write as _;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::sync::mpsc;
use tracing::{info, warn};

use danci_study_client::api::{AccountType, UnitLock};
use danci_study_client::audio::{AudioPlayer, ProcessAudioPlayer, ProcessSynthesizer};
use danci_study_client::auth;
use danci_study_client::dashboard::DashboardView;
use danci_study_client::engine::{EngineEvent, EngineState, Notice, StudyEngine};
use danci_study_client::logging::init_tracing;
use danci_study_client::model::UnitProgress;
use danci_study_client::router::ScreenTransition;
use danci_study_client::shortcuts::{parse_terminal_input, StudyAction};
use danci_study_client::store::{ClientStore, JsonFileStore};
use danci_study_client::{AccountApi, ClientConfig, HttpGateway, Screen, ScreenRouter};

type Engine = StudyEngine<HttpGateway, AudioPlayer<ProcessAudioPlayer, ProcessSynthesizer>>;
type Lines = mpsc::Receiver<String>;

struct App {
    engine: Engine,
    gateway: HttpGateway,
    store: ClientStore,
    router: Arc<ScreenRouter>,
    dashboard: DashboardView,
    events: broadcast::Receiver<EngineEvent>,
    transitions: broadcast::Receiver<ScreenTransition>,
    lines: Lines,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = ClientConfig::from_env();
    let _log_guard = init_tracing(&config.log_level);

    let file_store = JsonFileStore::open(&config.store_path).expect("open client store");
    let store = ClientStore::new(Arc::new(file_store));
    let gateway = HttpGateway::new(&config, store.clone());
    let playback = Arc::new(AudioPlayer::new(
        ProcessAudioPlayer::new(config.audio_player_program.clone()),
        ProcessSynthesizer::new(config.tts_program.clone()),
    ));
    let router = Arc::new(ScreenRouter::new(Screen::Landing));
    let engine = StudyEngine::new(
        gateway.clone(),
        playback,
        store.clone(),
        Arc::clone(&router),
        config.study.clone(),
    );

    info!(
        api_url = %config.api_url,
        store = %config.store_path.display(),
        "study client started"
    );

    let mut app = App {
        events: engine.subscribe(),
        transitions: router.subscribe(),
        engine,
        gateway,
        store,
        router,
        dashboard: DashboardView::new(),
        lines: spawn_line_reader(),
    };

    if let Some(identity) = auth::restore_identity(&app.store) {
        info!(user_id = identity.id, "restored sign-in");
        app.router.show(Screen::Dashboard);
    }

    loop {
        let keep_going = match app.router.current() {
            Screen::Landing => app.landing().await,
            Screen::Dashboard => app.dashboard_menu().await,
            Screen::Study | Screen::Loading => app.study().await,
        };
        if !keep_going {
            break;
        }
    }

    info!("study client stopped");
}

impl App {
    async fn landing(&mut self) -> bool {
        println!("\nSign in (\"register\" creates an account, an empty username quits)");
        prompt("username: ");
        let Some(username) = self.lines.recv().await else {
            return false;
        };
        if username.trim().is_empty() {
            return false;
        }
        if username.trim() == "register" {
            return self.register().await;
        }
        prompt("password: ");
        let Some(password) = self.lines.recv().await else {
            return false;
        };

        match auth::login(&self.gateway, &self.store, &username, &password).await {
            Ok(identity) => {
                println!("Welcome, {}!", identity.username);
                self.router.show(Screen::Dashboard);
            }
            Err(err) => println!("Sign-in failed: {err}"),
        }
        true
    }

    async fn register(&mut self) -> bool {
        let mut answers = Vec::with_capacity(3);
        for question in ["username: ", "password: ", "teacher account? [y/N]: "] {
            prompt(question);
            let Some(answer) = self.lines.recv().await else {
                return false;
            };
            answers.push(answer);
        }
        let account_type = if answers[2].trim().eq_ignore_ascii_case("y") {
            AccountType::Teacher
        } else {
            AccountType::Student
        };
        let teacher_id = match account_type {
            AccountType::Student => {
                prompt("teacher id (optional): ");
                let Some(answer) = self.lines.recv().await else {
                    return false;
                };
                Some(answer)
            }
            AccountType::Teacher => None,
        };

        match auth::register(
            &self.gateway,
            &answers[0],
            &answers[1],
            account_type,
            teacher_id.as_deref(),
        )
        .await
        {
            Ok(message) => println!("{message} You can sign in now."),
            Err(err) => println!("Registration failed: {err}"),
        }
        true
    }

    async fn dashboard_menu(&mut self) -> bool {
        let mut refresh = self.dashboard.is_stale() || self.dashboard.course_id().is_none();
        loop {
            match self.transitions.try_recv() {
                Ok(transition) => refresh |= self.dashboard.wants_refresh(&transition),
                Err(TryRecvError::Lagged(_)) => refresh = true,
                Err(_) => break,
            }
        }
        if refresh {
            if let Err(err) = self.dashboard.refresh(&self.gateway, &self.store).await {
                println!("Could not load progress: {err}");
                if err.is_unauthorized() {
                    if let Err(err) = auth::logout(&self.store, &self.router) {
                        warn!(error = %err, "failed to clear sign-in");
                    }
                    return true;
                }
            }
        }

        self.print_dashboard();
        prompt("> ");
        let Some(line) = self.lines.recv().await else {
            return false;
        };
        let mut words = line.split_whitespace();
        match (words.next(), words.next()) {
            (Some("s"), unit) => {
                let unit = unit
                    .and_then(|raw| raw.parse().ok())
                    .or_else(|| self.dashboard.next_unit());
                let outcome = drive(self.engine.start(unit), &self.router, &mut self.lines).await;
                info!(?outcome, "start finished");
                self.render_events();
            }
            (Some("m"), _) => {
                let mode = self.engine.mode().toggled();
                if self.engine.set_mode(mode) {
                    println!("Study mode: {}", mode.as_str());
                }
            }
            (Some("g"), Some(raw)) => match raw.parse::<u32>() {
                Ok(goal) => {
                    if let Err(err) = self.store.set_daily_goal(goal) {
                        println!("Could not save goal: {err}");
                    }
                }
                Err(_) => println!("The daily goal is a whole number (0 turns it off)."),
            },
            (Some("c"), Some(raw)) => match raw.parse() {
                Ok(course_id) => {
                    if let Err(err) = self.store.set_course_id(course_id) {
                        println!("Could not switch course: {err}");
                    }
                    self.reload_dashboard().await;
                }
                Err(_) => println!("Unknown course id."),
            },
            (Some("reset"), _) => self.reset_progress().await,
            (Some("logout"), _) => {
                if let Err(err) = auth::logout(&self.store, &self.router) {
                    println!("Could not sign out: {err}");
                }
            }
            (Some("q"), _) => return false,
            _ => println!(
                "s [unit]: study   m: switch mode   g <n>: daily goal   c <id>: course   reset   logout   q: quit"
            ),
        }
        true
    }

    async fn study(&mut self) -> bool {
        self.render_events();
        let Some(line) = self.lines.recv().await else {
            return false;
        };

        match parse_terminal_input(self.router.current(), &line) {
            Some(StudyAction::Advance) if self.engine.last_failure().is_some() => {
                self.engine.acknowledge_failure();
            }
            Some(StudyAction::Advance) => {
                drive(self.engine.advance(), &self.router, &mut self.lines).await;
            }
            Some(StudyAction::ReplayAudio) => {
                self.engine.replay_audio();
            }
            Some(StudyAction::RetrySubmit) if self.engine.state() == EngineState::BatchSubmitting => {
                drive(self.engine.submit_batch(), &self.router, &mut self.lines).await;
            }
            Some(StudyAction::Exit) => self.engine.exit(),
            _ => println!("Enter: reveal / next   a: audio   r: retry saving   q: dashboard"),
        }
        self.render_events();
        true
    }

    async fn reset_progress(&mut self) {
        let Some(course_id) = self.dashboard.course_id() else {
            println!("No active course.");
            return;
        };
        prompt("password: ");
        let Some(password) = self.lines.recv().await else {
            return;
        };
        match self.gateway.reset_progress(course_id, &password).await {
            Ok(()) => {
                println!("Progress reset.");
                self.reload_dashboard().await;
            }
            Err(err) => println!("{}", err.message()),
        }
    }

    async fn reload_dashboard(&mut self) {
        if let Err(err) = self.dashboard.refresh(&self.gateway, &self.store).await {
            println!("Could not load progress: {err}");
        }
    }

    fn print_dashboard(&self) {
        let course = self.dashboard.course_name().unwrap_or("no course");
        println!(
            "\n== {course} ==  mode: {}  today: {}/{} new words",
            self.engine.mode().as_str(),
            self.dashboard.daily_new_count(),
            self.store.daily_goal()
        );
        for unit in self.dashboard.units() {
            println!(
                "  [{}] {:<24} {:>4} words  {:>5.1}% seen{}",
                unit.unit_id,
                unit.name,
                unit.total_words,
                unit.seen_percentage,
                if unit.lock == UnitLock::Locked {
                    "  (locked)"
                } else {
                    ""
                }
            );
        }
        println!(
            "  {} words in course, {:.1}% average progress",
            self.dashboard.total_words(),
            self.dashboard.average_progress()
        );
        let repetition = self.dashboard.repetition();
        println!(
            "  repetition: {} new, {} in progress, {} mastered",
            repetition.new_seen, repetition.mid_level, repetition.mastered
        );
    }

    fn render_events(&mut self) {
        loop {
            let event = match self.events.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "engine events dropped");
                    continue;
                }
                Err(_) => break,
            };
            self.dashboard.apply_engine_event(&event);
            self.render(&event);
        }
    }

    fn render(&self, event: &EngineEvent) {
        let show_images = self.engine.settings().show_images;
        match event {
            EngineEvent::CardShown { index, total, card } => {
                println!("\n[{}/{}] {}", index + 1, total, card.front_text);
                if let Some(image) = card.visible_image(show_images) {
                    println!("    image: {image}");
                }
            }
            EngineEvent::CardRevealed { .. } => {
                if let Some(card) = self.engine.session().and_then(|s| s.current_card()) {
                    println!("    = {}", card.back_text);
                }
            }
            EngineEvent::BatchSubmitted { word_ids } => {
                println!("Saved {} words.", word_ids.len());
            }
            EngineEvent::ProgressUpdated(progress) => print_progress(progress),
            EngineEvent::Notice(notice) => print_notice(notice),
            _ => {}
        }
    }
}

fn print_progress(progress: &UnitProgress) {
    match progress.percent() {
        Some(percent) => println!(
            "Unit progress: {}/{} ({percent}%)",
            progress.new_words_in_unit, progress.total_words_in_unit
        ),
        None => println!("Unit progress: {} new words", progress.new_words_in_unit),
    }
}

fn print_notice(notice: &Notice) {
    match notice {
        Notice::AuthenticationRequired => println!("Please sign in again."),
        Notice::NoActiveCourse => println!("Pick a course first (c <id>)."),
        Notice::NothingToStudy { mode } => {
            println!("Nothing to study in {} mode right now.", mode.as_str())
        }
        Notice::InsufficientVocabulary { message } => println!("{message}"),
        Notice::FetchFailed { message } => println!("Could not load cards: {message}"),
        Notice::SubmitFailed { message } => {
            println!("Could not save your progress: {message}\n  r: retry   Enter: dismiss (kept for later)")
        }
        Notice::DailyGoalReached { count, .. } => {
            println!("*** Daily goal reached: {count} new words today! ***")
        }
    }
}

/// Runs an engine operation while still listening for the exit key, so the
/// learner can leave while a request is in flight.
async fn drive<F: Future>(operation: F, router: &ScreenRouter, lines: &mut Lines) -> F::Output {
    tokio::pin!(operation);
    loop {
        tokio::select! {
            output = &mut operation => return output,
            Some(line) = lines.recv() => {
                if parse_terminal_input(router.current(), &line) == Some(StudyAction::Exit) {
                    println!("Leaving study...");
                    router.show(Screen::Dashboard);
                }
            }
        }
    }
}

fn spawn_line_reader() -> Lines {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
    rx
}

fn prompt(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
}
