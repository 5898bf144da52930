//! Boot sequencing: animate, wait for the network with a bounded budget, then show
//! either the assigned address and a check mark or a timeout banner and a cross.
//!
//! The networking stack lives elsewhere. It reports back through a [`NetworkLink`]:
//! one "connected" flag, set once per boot, plus the address string.
//!
//! See [`ConnectivityStateMachine`] for usage.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use heapless::String;
use portable_atomic::{AtomicBool, Ordering};

use crate::animation::{Breathing, FrameScheduler, Icon, ScrollText, SolidFill, StartupSweep};
use crate::led2d::MATRIX_LEN;
use crate::led_strip::{Rgb, StripWriter};
use crate::matrix::MatrixRenderer;
use crate::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Bytes reserved for the published address (a dotted IPv4 address is at most 15).
pub const ADDRESS_CAPACITY: usize = 16;

/// Text scrolled once at boot, before any network activity.
pub const BANNER_DEFAULT: &str = "Matrix Envoy";
/// Banner color.
pub const BANNER_COLOR_DEFAULT: Rgb = Rgb::new(15, 15, 15);
/// Dark pause between the startup sweep and the banner.
pub const BANNER_PAUSE_DEFAULT: Duration = Duration::from_millis(500);
/// Frame period for the banner and the address.
pub const TEXT_FRAME_DEFAULT: Duration = Duration::from_millis(60);

/// Total time to wait for the network before giving up.
pub const CONNECT_TIMEOUT_DEFAULT: Duration = Duration::from_millis(10_000);
/// Wait-loop tick; one breathing frame per tick.
pub const CONNECT_TICK_DEFAULT: Duration = Duration::from_millis(50);

/// Full-panel flash shown the moment the link comes up.
pub const CONNECTED_FLASH_COLOR_DEFAULT: Rgb = Rgb::new(0, 15, 0);
/// How long the connected flash stays up.
pub const CONNECTED_FLASH_DEFAULT: Duration = Duration::from_millis(700);
/// Color of the scrolled address.
pub const ADDRESS_COLOR_DEFAULT: Rgb = Rgb::new(0, 15, 15);

/// Banner scrolled when the wait budget runs out.
pub const TIMEOUT_BANNER: &str = "TIMEOUT";
/// Timeout banner color.
pub const TIMEOUT_COLOR_DEFAULT: Rgb = Rgb::new(20, 0, 0);
/// Frame period for the timeout banner.
pub const TIMEOUT_TEXT_FRAME_DEFAULT: Duration = Duration::from_millis(100);

/// Hold-loop tick once connected.
pub const CONNECTED_HOLD_TICK_DEFAULT: Duration = Duration::from_millis(1_000);
/// Hold-loop tick after a timeout.
pub const TIMED_OUT_HOLD_TICK_DEFAULT: Duration = Duration::from_millis(5_000);

// ============================================================================
// ConnectionState
// ============================================================================

/// Where the boot sequence stands.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    /// Nothing has happened yet.
    Idle,
    /// Waiting for the network.
    Connecting,
    /// The link came up. Terminal.
    Connected,
    /// The wait budget ran out. Terminal.
    TimedOut,
}

impl ConnectionState {
    /// Whether `next` may follow `self`. Only `Connecting` may repeat.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Connecting)
                | (
                    Self::Connecting,
                    Self::Connecting | Self::Connected | Self::TimedOut
                )
        )
    }

    /// `Connected` and `TimedOut` are final for the life of the process.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Connected | Self::TimedOut)
    }
}

// ============================================================================
// NetworkLink
// ============================================================================

/// Shared between the networking task and the boot sequence.
///
/// The networking side calls [`publish`](Self::publish) once, with the assigned address,
/// when the link is up. The boot sequence polls [`is_connected`](Self::is_connected).
///
/// ```rust
/// use matrix_envoy::connectivity::NetworkLink;
///
/// static LINK: NetworkLink = NetworkLink::new();
///
/// assert!(!LINK.is_connected());
/// LINK.publish("192.168.1.42")?;
/// assert!(LINK.is_connected());
/// assert_eq!(LINK.address().as_deref(), Some("192.168.1.42"));
/// assert!(LINK.publish("10.0.0.1").is_err());
/// # Ok::<(), matrix_envoy::Error>(())
/// ```
pub struct NetworkLink {
    connected: AtomicBool,
    address: Mutex<CriticalSectionRawMutex, RefCell<String<ADDRESS_CAPACITY>>>,
}

impl NetworkLink {
    /// A link that is not connected yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            address: Mutex::new(RefCell::new(String::new())),
        }
    }

    /// Record the address and raise the connected flag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressTooLong`] if `address` does not fit, or
    /// [`Error::LinkAlreadyPublished`] on a second call.
    pub fn publish(&self, address: &str) -> Result<()> {
        self.address.lock(|cell| {
            if self.connected.load(Ordering::Acquire) {
                return Err(Error::LinkAlreadyPublished);
            }
            let mut stored = cell.borrow_mut();
            stored.clear();
            stored
                .push_str(address)
                .map_err(|()| Error::AddressTooLong(ADDRESS_CAPACITY))?;
            self.connected.store(true, Ordering::Release);
            Ok(())
        })?;
        info!("network link up at {}", address);
        Ok(())
    }

    /// Whether [`publish`](Self::publish) has happened.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// The published address, once connected.
    #[must_use]
    pub fn address(&self) -> Option<String<ADDRESS_CAPACITY>> {
        if !self.is_connected() {
            return None;
        }
        Some(self.address.lock(|cell| cell.borrow().clone()))
    }
}

impl Default for NetworkLink {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// What to do once the boot sequence has timed out.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TimeoutPolicy {
    /// Keep showing the failure icon forever.
    #[default]
    Hold,
    /// Ask the application to restart after this long.
    RestartAfter(Duration),
}

/// Returned by [`ConnectivityStateMachine::hold`] when the device should reboot.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[must_use = "the application must perform the restart"]
pub struct RestartRequest {
    /// How long the failure icon was held before asking.
    pub after: Duration,
}

/// Timings, colors and texts for the boot sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootConfig {
    /// Scrolled once after the startup sweep.
    pub banner: &'static str,
    /// Banner color.
    pub banner_color: Rgb,
    /// Dark pause between the sweep and the banner.
    pub banner_pause: Duration,
    /// Frame period for the banner and the address.
    pub text_frame: Duration,
    /// Total wait for the network.
    pub connect_timeout: Duration,
    /// Wait-loop tick.
    pub connect_tick: Duration,
    /// Flash color when the link comes up.
    pub connected_flash_color: Rgb,
    /// Flash duration when the link comes up.
    pub connected_flash: Duration,
    /// Color of the scrolled address.
    pub address_color: Rgb,
    /// Timeout banner color.
    pub timeout_color: Rgb,
    /// Frame period for the timeout banner.
    pub timeout_text_frame: Duration,
    /// Hold-loop tick once connected.
    pub connected_hold_tick: Duration,
    /// Hold-loop tick after a timeout.
    pub timed_out_hold_tick: Duration,
    /// Restart policy after a timeout.
    pub timeout_policy: TimeoutPolicy,
}

impl BootConfig {
    /// The defaults listed in this module's constants.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            banner: BANNER_DEFAULT,
            banner_color: BANNER_COLOR_DEFAULT,
            banner_pause: BANNER_PAUSE_DEFAULT,
            text_frame: TEXT_FRAME_DEFAULT,
            connect_timeout: CONNECT_TIMEOUT_DEFAULT,
            connect_tick: CONNECT_TICK_DEFAULT,
            connected_flash_color: CONNECTED_FLASH_COLOR_DEFAULT,
            connected_flash: CONNECTED_FLASH_DEFAULT,
            address_color: ADDRESS_COLOR_DEFAULT,
            timeout_color: TIMEOUT_COLOR_DEFAULT,
            timeout_text_frame: TIMEOUT_TEXT_FRAME_DEFAULT,
            connected_hold_tick: CONNECTED_HOLD_TICK_DEFAULT,
            timed_out_hold_tick: TIMED_OUT_HOLD_TICK_DEFAULT,
            timeout_policy: TimeoutPolicy::Hold,
        }
    }

    /// Replace the boot banner.
    #[must_use]
    pub const fn with_banner(mut self, banner: &'static str) -> Self {
        self.banner = banner;
        self
    }

    /// Replace the network wait budget.
    #[must_use]
    pub const fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Replace the restart policy.
    #[must_use]
    pub const fn with_timeout_policy(mut self, timeout_policy: TimeoutPolicy) -> Self {
        self.timeout_policy = timeout_policy;
        self
    }

    /// Wait-loop iterations: `connect_timeout / connect_tick`, zero for a zero tick.
    #[must_use]
    pub fn connect_budget(&self) -> usize {
        self.connect_timeout
            .as_ticks()
            .checked_div(self.connect_tick.as_ticks())
            .and_then(|budget| usize::try_from(budget).ok())
            .unwrap_or(0)
    }
}

impl Default for BootConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// ConnectivityStateMachine
// ============================================================================

/// Drives the boot visuals from [`ConnectionState::Idle`] to a terminal state.
///
/// [`run_boot`](Self::run_boot) plays, in order: the startup sweep, a dark pause, the
/// banner, then up to [`BootConfig::connect_budget`] wait ticks. Each tick checks the
/// [`NetworkLink`]; if it is still down, one breathing frame is drawn and held for a tick.
///
/// - Link up: green flash, scrolled address, success icon → [`ConnectionState::Connected`].
/// - Budget spent: `TIMEOUT` banner, failure icon → [`ConnectionState::TimedOut`].
///
/// [`hold`](Self::hold) then idles, and returns only when [`TimeoutPolicy::RestartAfter`]
/// asks for a reboot.
pub struct ConnectivityStateMachine<'a, S, D> {
    renderer: &'a MatrixRenderer<S>,
    link: &'a NetworkLink,
    scheduler: FrameScheduler<D>,
    config: BootConfig,
    state: ConnectionState,
}

impl<'a, S, D> ConnectivityStateMachine<'a, S, D>
where
    S: StripWriter<MATRIX_LEN>,
    D: DelayNs,
{
    /// Create a state machine in [`ConnectionState::Idle`].
    #[must_use]
    pub const fn new(
        renderer: &'a MatrixRenderer<S>,
        link: &'a NetworkLink,
        delay: D,
        config: BootConfig,
    ) -> Self {
        Self {
            renderer,
            link,
            scheduler: FrameScheduler::new(delay),
            config,
            state: ConnectionState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// The scheduler, for inspecting how many frames have played.
    #[must_use]
    pub const fn scheduler(&self) -> &FrameScheduler<D> {
        &self.scheduler
    }

    /// Run the boot sequence to a terminal state. A second call returns that state at once.
    ///
    /// # Errors
    ///
    /// Returns an error if the strip rejects a frame.
    pub async fn run_boot(&mut self) -> Result<ConnectionState> {
        if self.state.is_terminal() {
            return Ok(self.state);
        }
        let renderer = self.renderer;

        info!("boot: startup sweep");
        self.scheduler.play(renderer, &StartupSweep).await?;
        self.scheduler.pause(self.config.banner_pause).await;
        let banner = ScrollText::new(
            self.config.banner,
            self.config.banner_color,
            self.config.text_frame,
        );
        self.scheduler.play(renderer, &banner).await?;

        self.transition(ConnectionState::Connecting);
        let budget = self.config.connect_budget();
        let breathing = Breathing::new(budget).with_frame_duration(self.config.connect_tick);
        for frame_index in 0..budget {
            if self.link.is_connected() {
                return self.show_connected().await;
            }
            self.scheduler
                .play_frame(renderer, &breathing, frame_index)
                .await?;
        }
        self.show_timed_out().await
    }

    /// Idle after boot. Returns only for [`TimeoutPolicy::RestartAfter`] in the timed-out state.
    pub async fn hold(&mut self) -> RestartRequest {
        if self.state != ConnectionState::TimedOut {
            loop {
                self.scheduler.pause(self.config.connected_hold_tick).await;
            }
        }
        let tick = self.config.timed_out_hold_tick;
        match self.config.timeout_policy {
            TimeoutPolicy::Hold => loop {
                self.scheduler.pause(tick).await;
            },
            TimeoutPolicy::RestartAfter(after) => {
                let mut held = Duration::from_ticks(0);
                while held < after {
                    let step = if tick.as_ticks() == 0 { after } else { tick.min(after - held) };
                    self.scheduler.pause(step).await;
                    held += step;
                }
                warn!("restart requested after {} ms", after.as_millis());
                RestartRequest { after }
            }
        }
    }

    async fn show_connected(&mut self) -> Result<ConnectionState> {
        self.transition(ConnectionState::Connected);
        let renderer = self.renderer;
        let flash = SolidFill::new(self.config.connected_flash_color, self.config.connected_flash);
        self.scheduler.play(renderer, &flash).await?;

        let address = self.link.address().unwrap_or_default();
        let address_text =
            ScrollText::new(&address, self.config.address_color, self.config.text_frame);
        self.scheduler.play(renderer, &address_text).await?;

        self.scheduler.show(renderer, Icon::Success).await?;
        info!("system ready");
        Ok(self.state)
    }

    async fn show_timed_out(&mut self) -> Result<ConnectionState> {
        self.transition(ConnectionState::TimedOut);
        warn!(
            "network not up after {} ms",
            self.config.connect_timeout.as_millis()
        );
        let renderer = self.renderer;
        let banner = ScrollText::new(
            TIMEOUT_BANNER,
            self.config.timeout_color,
            self.config.timeout_text_frame,
        );
        self.scheduler.play(renderer, &banner).await?;
        self.scheduler.show(renderer, Icon::Failure).await?;
        Ok(self.state)
    }

    fn transition(&mut self, next: ConnectionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal connectivity transition"
        );
        info!("connectivity {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_is_two_hundred_ticks() {
        assert_eq!(BootConfig::new().connect_budget(), 200);
    }

    #[test]
    fn zero_tick_means_no_wait() {
        let mut config = BootConfig::new();
        config.connect_tick = Duration::from_ticks(0);
        assert_eq!(config.connect_budget(), 0);
    }

    #[test]
    fn terminal_states_do_not_move() {
        use super::ConnectionState::{Connected, Connecting, Idle, TimedOut};
        assert!(Idle.can_transition_to(Connecting));
        assert!(Connecting.can_transition_to(Connecting));
        assert!(Connecting.can_transition_to(TimedOut));
        assert!(!Idle.can_transition_to(Connected));
        assert!(!Connected.can_transition_to(Connecting));
        assert!(!TimedOut.can_transition_to(Connected));
    }

    #[test]
    fn long_address_is_rejected() {
        let link = NetworkLink::new();
        assert!(matches!(
            link.publish("this-address-is-far-too-long"),
            Err(Error::AddressTooLong(ADDRESS_CAPACITY))
        ));
        assert!(!link.is_connected());
        assert_eq!(link.address(), None);
    }
}
