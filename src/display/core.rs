use std::fmt;

/// Widths at and above this many pixels are classified as TV.
pub const TV_MIN_WIDTH: u32 = 1920;

/// Aspect ratio typical of TV panels.
pub const TV_ASPECT_RATIO: f64 = 16. / 9.;

/// Maximum distance from [`TV_ASPECT_RATIO`] still classified as TV.
///
/// Tight enough that common 16:9-ish laptop resolutions such as 1366x768 stay on the desktop
/// layout.
pub const ASPECT_RATIO_TOLERANCE: f64 = 0.0005;

/// Device signals complementing the viewport size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceHints {
    user_agent: Option<String>,
    television: bool,
}

impl DeviceHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hints carrying the client's user agent string.
    pub fn from_user_agent(user_agent: impl Into<String>) -> Self {
        Self::default().with_user_agent(user_agent)
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Marks the device as a television regardless of its user agent, e.g. when the kiosk is
    /// configured as such.
    pub fn with_television(mut self, television: bool) -> Self {
        self.television = television;
        self
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Returns `true` if the signals identify a television.
    pub fn indicates_tv(&self) -> bool {
        self.television
            || self
                .user_agent
                .as_deref()
                .is_some_and(|ua| ua.to_ascii_lowercase().contains("tv"))
    }
}

/// Layout family selected for the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayMode {
    Tv,
    Desktop,
}

impl DisplayMode {
    pub fn is_tv(&self) -> bool {
        matches!(self, Self::Tv)
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tv => write!(f, "tv"),
            Self::Desktop => write!(f, "desktop"),
        }
    }
}

/// Classifies a viewport. Any one of these is enough for [`DisplayMode::Tv`]:
///
/// - `width` is at least [`TV_MIN_WIDTH`];
/// - `hints` indicate a television;
/// - the aspect ratio is within [`ASPECT_RATIO_TOLERANCE`] of 16:9.
///
/// A zero `height` has no aspect ratio and only the other criteria apply.
///
/// ```
/// use lobbyboard::display::{DeviceHints, DisplayMode, classify};
///
/// let hints = DeviceHints::new();
/// assert_eq!(classify(1920, 1200, &hints), DisplayMode::Tv);
/// assert_eq!(classify(1280, 720, &hints), DisplayMode::Tv);
/// assert_eq!(classify(1366, 768, &hints), DisplayMode::Desktop);
/// assert_eq!(
///     classify(1024, 768, &DeviceHints::from_user_agent("Mozilla/5.0 (SMART-TV; Linux)")),
///     DisplayMode::Tv
/// );
/// ```
pub fn classify(width: u32, height: u32, hints: &DeviceHints) -> DisplayMode {
    let wide = width >= TV_MIN_WIDTH;

    let tv_ratio = height > 0
        && (width as f64 / height as f64 - TV_ASPECT_RATIO).abs() < ASPECT_RATIO_TOLERANCE;

    if wide || hints.indicates_tv() || tv_ratio {
        DisplayMode::Tv
    } else {
        DisplayMode::Desktop
    }
}

/// Layout variant of the sales goal view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SalesLayout {
    /// Large display with the per-team ranking.
    TvWithTeams,
    /// Large display with the overall goal only.
    TvSingle,
    Standard,
}

impl SalesLayout {
    pub fn select(mode: DisplayMode, has_team_goals: bool) -> Self {
        match (mode, has_team_goals) {
            (DisplayMode::Tv, true) => Self::TvWithTeams,
            (DisplayMode::Tv, false) => Self::TvSingle,
            (DisplayMode::Desktop, _) => Self::Standard,
        }
    }
}
