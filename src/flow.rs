//! Screen-to-screen navigation
//!
//! A [`Flow`] owns whichever screen is live and nothing else. Leaving a
//! screen shuts its timers down before the next one is built, so nothing
//! scheduled by a screen can fire after the user has left it.
//!
//! Upload → Analyzing carries only file names; Analyzing → Analysis carries
//! only the fixed report id.

use crate::analyzing::{PhaseSequencer, SequencerConfig};
use crate::auth::{PasswordChange, SignUp};
use crate::error::{FlowError, Result};
use crate::upload::{FileId, FileSpec, Handoff, UploadConfig, UploadTracker};
use log::info;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    ChangePassword,
    Upload,
    Analyzing,
    Analysis { id: String },
    Dashboard,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::Login => write!(f, "/login"),
            Route::Register => write!(f, "/register"),
            Route::ChangePassword => write!(f, "/change-password"),
            Route::Upload => write!(f, "/upload"),
            Route::Analyzing => write!(f, "/analyzing"),
            Route::Analysis { id } => write!(f, "/analysis/{}", id),
            Route::Dashboard => write!(f, "/dashboard"),
        }
    }
}

impl FromStr for Route {
    type Err = FlowError;

    fn from_str(path: &str) -> Result<Self> {
        let path = path.split('?').next().unwrap_or("/");
        let path = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };

        let route = match path {
            "/" | "" => Route::Home,
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/change-password" => Route::ChangePassword,
            "/upload" => Route::Upload,
            "/analyzing" => Route::Analyzing,
            "/dashboard" => Route::Dashboard,
            other => match other.strip_prefix("/analysis/") {
                Some(id) if !id.is_empty() && !id.contains('/') => Route::Analysis {
                    id: id.to_string(),
                },
                _ => return Err(FlowError::InvalidState(format!("no such page: {}", other))),
            },
        };
        Ok(route)
    }
}

enum Stage {
    Static,
    Upload(UploadTracker<StdRng>),
    Analyzing(PhaseSequencer<StdRng>),
    Register(SignUp),
    ChangePassword(PasswordChange),
}

impl Stage {
    fn shutdown(&mut self) {
        match self {
            Stage::Static => {}
            Stage::Upload(t) => t.shutdown(),
            Stage::Analyzing(s) => s.shutdown(),
            Stage::Register(s) => s.shutdown(),
            Stage::ChangePassword(p) => p.shutdown(),
        }
    }
}

pub struct Flow {
    route: Route,
    stage: Stage,
    upload_config: UploadConfig,
    sequencer_config: SequencerConfig,
    rng: StdRng,
}

impl Flow {
    /// A seed makes every upload and metric tick reproducible.
    pub fn new(
        upload_config: UploadConfig,
        sequencer_config: SequencerConfig,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            route: Route::Home,
            stage: Stage::Static,
            upload_config,
            sequencer_config,
            rng,
        }
    }

    fn child_rng(&mut self) -> StdRng {
        StdRng::seed_from_u64(self.rng.next_u64())
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Leave the current screen and enter `route`. Entering the analyzing
    /// screen this way forwards no files.
    pub fn navigate(&mut self, route: Route) -> Result<()> {
        if route == Route::Analyzing {
            return self.enter_analyzing(Handoff { files: vec![] });
        }
        let stage = match route {
            Route::Upload => {
                Stage::Upload(UploadTracker::with_config(self.upload_config.clone(), self.child_rng()))
            }
            Route::Register => Stage::Register(SignUp::new()),
            Route::ChangePassword => Stage::ChangePassword(PasswordChange::new()),
            _ => Stage::Static,
        };
        self.replace(route, stage);
        Ok(())
    }

    fn replace(&mut self, route: Route, stage: Stage) {
        self.stage.shutdown();
        info!("{} -> {}", self.route, route);
        self.stage = stage;
        self.route = route;
    }

    fn enter_analyzing(&mut self, handoff: Handoff) -> Result<()> {
        let rng = self.child_rng();
        let sequencer = PhaseSequencer::start(handoff.files, self.sequencer_config.clone(), rng)?;
        self.replace(Route::Analyzing, Stage::Analyzing(sequencer));
        Ok(())
    }

    /// Add files on the upload screen.
    pub fn enqueue<I>(&mut self, files: I) -> Result<Vec<FileId>>
    where
        I: IntoIterator<Item = FileSpec>,
    {
        Ok(self.tracker_mut()?.enqueue(files))
    }

    pub fn remove(&mut self, id: &FileId) -> Result<()> {
        if self.tracker_mut()?.remove(id) {
            Ok(())
        } else {
            Err(FlowError::UnknownFile(id.to_string()))
        }
    }

    /// "Analyze": move to the analyzing screen with the completed files, or
    /// stay put with a notice when none are ready.
    pub fn analyze(&mut self) -> Result<&Route> {
        let handoff = self.tracker()?.proceed()?;
        self.enter_analyzing(handoff)?;
        Ok(&self.route)
    }

    /// Let time pass on the live screen. Returns the new route if the screen
    /// navigated on its own.
    pub fn advance(&mut self, dt: Duration) -> Option<Route> {
        let next = match &mut self.stage {
            Stage::Static => None,
            Stage::Upload(t) => {
                t.advance(dt);
                None
            }
            Stage::Analyzing(s) => s.advance(dt),
            Stage::Register(s) => s.advance(dt),
            Stage::ChangePassword(p) => {
                p.advance(dt);
                None
            }
        };

        if let Some(ref route) = next {
            self.replace(route.clone(), Stage::Static);
        }
        next
    }

    pub fn tracker(&self) -> Result<&UploadTracker<StdRng>> {
        match &self.stage {
            Stage::Upload(t) => Ok(t),
            _ => Err(wrong_screen("upload", &self.route)),
        }
    }

    pub fn tracker_mut(&mut self) -> Result<&mut UploadTracker<StdRng>> {
        match &mut self.stage {
            Stage::Upload(t) => Ok(t),
            _ => Err(wrong_screen("upload", &self.route)),
        }
    }

    pub fn sequencer(&self) -> Result<&PhaseSequencer<StdRng>> {
        match &self.stage {
            Stage::Analyzing(s) => Ok(s),
            _ => Err(wrong_screen("analyzing", &self.route)),
        }
    }

    pub fn sign_up_mut(&mut self) -> Result<&mut SignUp> {
        match &mut self.stage {
            Stage::Register(s) => Ok(s),
            _ => Err(wrong_screen("register", &self.route)),
        }
    }

    pub fn password_mut(&mut self) -> Result<&mut PasswordChange> {
        match &mut self.stage {
            Stage::ChangePassword(p) => Ok(p),
            _ => Err(wrong_screen("change-password", &self.route)),
        }
    }
}

fn wrong_screen(wanted: &str, at: &Route) -> FlowError {
    FlowError::InvalidState(format!("not on the {} screen (at {})", wanted, at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzing::StepStatus;
    use crate::upload::file::MIME_PDF;
    use crate::upload::MAX_FILE_SIZE;

    fn flow() -> Flow {
        Flow::new(UploadConfig::default(), SequencerConfig::default(), Some(2024))
    }

    // ==========================================================================
    // ROUTES
    // ==========================================================================

    #[test]
    fn test_route_round_trip_paths() {
        for path in ["/", "/upload", "/analyzing", "/analysis/1", "/dashboard", "/change-password"] {
            let route: Route = path.parse().unwrap();
            assert_eq!(route.to_string(), path);
        }
        assert_eq!("/upload/".parse::<Route>().unwrap(), Route::Upload);
        assert_eq!("/dashboard?q=x".parse::<Route>().unwrap(), Route::Dashboard);
        assert!("/analysis/".parse::<Route>().is_err());
        assert!("/nope".parse::<Route>().is_err());
    }

    // ==========================================================================
    // END TO END
    // ==========================================================================
    //
    // Upload one valid PDF, wait for its ticker, analyze, and land on the
    // fixed report once the sequencer's deadline passes.
    // ==========================================================================

    #[test]
    fn test_valid_pdf_reaches_report() {
        let mut f = flow();
        f.navigate(Route::Upload).unwrap();
        f.enqueue(vec![FileSpec::new("paper.pdf", MIME_PDF, 1024 * 1024)]).unwrap();

        // 15% at most per 200ms tick; a minute is plenty
        f.advance(Duration::from_secs(60));
        assert_eq!(f.tracker().unwrap().ready_count(), 1);

        assert_eq!(f.analyze().unwrap(), &Route::Analyzing);
        let seq = f.sequencer().unwrap();
        assert!(seq.steps().iter().all(|s| s.status == StepStatus::Pending));
        assert_eq!(seq.files(), ["paper.pdf".to_string()]);

        assert_eq!(f.advance(Duration::from_millis(5499)), None);
        let next = f.advance(Duration::from_millis(1));
        assert_eq!(next, Some(Route::Analysis { id: "1".into() }));
        assert_eq!(f.route().to_string(), "/analysis/1");
        assert!(f.sequencer().is_err());
    }

    #[test]
    fn test_oversized_file_blocks_analysis() {
        let mut f = flow();
        f.navigate(Route::Upload).unwrap();
        let ids = f
            .enqueue(vec![FileSpec::new("huge.pdf", MIME_PDF, MAX_FILE_SIZE + 1)])
            .unwrap();

        let tracker = f.tracker().unwrap();
        let entry = tracker.get(&ids[0]).unwrap();
        assert_eq!(entry.error.as_deref(), Some("File size must be less than 50MB"));
        assert_eq!(tracker.ready_count(), 0);

        let err = f.analyze().unwrap_err();
        assert!(matches!(err, FlowError::NoFilesReady));
        assert_eq!(f.route(), &Route::Upload);
        assert_eq!(f.tracker().unwrap().files().len(), 1);
    }

    #[test]
    fn test_leaving_analyzing_cancels_redirect() {
        let mut f = flow();
        f.navigate(Route::Analyzing).unwrap();
        f.advance(Duration::from_millis(1000));
        f.navigate(Route::Dashboard).unwrap();
        assert_eq!(f.advance(Duration::from_secs(30)), None);
        assert_eq!(f.route(), &Route::Dashboard);
    }

    #[test]
    fn test_direct_entry_uses_fallback_file() {
        let mut f = flow();
        f.navigate(Route::Analyzing).unwrap();
        assert_eq!(f.sequencer().unwrap().headline(), "Processing document.pdf...");
    }

    #[test]
    fn test_upload_actions_need_upload_screen() {
        let mut f = flow();
        assert!(f.enqueue(vec![]).is_err());
        assert!(f.analyze().is_err());
    }

    #[test]
    fn test_remove_unknown_file() {
        let mut f = flow();
        f.navigate(Route::Upload).unwrap();
        assert!(matches!(
            f.remove(&FileId::from("missing")),
            Err(FlowError::UnknownFile(_))
        ));
    }

    #[test]
    fn test_register_lands_on_login() {
        let mut f = flow();
        f.navigate(Route::Register).unwrap();
        let form = crate::auth::RegistrationForm {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "Secret123".into(),
            confirm_password: "Secret123".into(),
        };
        f.sign_up_mut().unwrap().submit(&form).unwrap();
        assert_eq!(f.advance(Duration::from_secs(2)), Some(Route::Login));
    }

    #[test]
    fn test_same_seed_same_upload_timing() {
        fn ticks(seed: u64) -> u32 {
            let mut f = Flow::new(UploadConfig::default(), SequencerConfig::default(), Some(seed));
            f.navigate(Route::Upload).unwrap();
            f.enqueue(vec![FileSpec::new("a.pdf", MIME_PDF, 1)]).unwrap();
            let mut n = 0;
            while f.tracker().unwrap().ready_count() == 0 {
                f.advance(Duration::from_millis(200));
                n += 1;
            }
            n
        }
        assert_eq!(ticks(5), ticks(5));
    }
}
