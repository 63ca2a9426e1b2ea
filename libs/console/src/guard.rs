//! Route guard for protected surfaces
//!
//! [`GuardMachine`] holds the decision logic and is purely synchronous.
//! [`RouteGuard::mount`] drives it from the identity provider: it fetches the
//! session, listens to session changes, runs role lookups in the background
//! and publishes every settled state on a watch channel.
//!
//! Every session fetch and role lookup is tagged with the generation that
//! issued it. A session change starts a new generation, so a result that
//! arrives late is recognised and dropped instead of overwriting a newer
//! decision.

use tokio::sync::{oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::identity::{IdentityError, Notification, Session, Subscription};
use crate::nav::AdminSection;
use crate::role::{Role, RoleResolver};
use crate::session::SessionResolver;

/// Where the guard stands for the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    Authorized,
    Unauthorized,
    InsufficientRole,
}

/// Action offered on the access-denied view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeniedAction {
    SignOut,
    ReturnHome { to: String },
}

/// What the protected surface should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardView {
    Loading,
    Render,
    Redirect { to: String },
    AccessDenied { actions: Vec<DeniedAction> },
}

/// Per-surface guard settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Role the surface demands; `None` admits any signed-in user
    pub required_role: Option<Role>,
    pub login_path: String,
    pub home_path: String,
}

impl GuardConfig {
    pub fn new(required_role: Option<Role>) -> Self {
        Self {
            required_role,
            login_path: "/login".to_string(),
            home_path: "/".to_string(),
        }
    }

    pub fn for_section(section: AdminSection) -> Self {
        Self::new(Some(section.required_role()))
    }
}

impl GuardState {
    pub fn view(self, config: &GuardConfig) -> GuardView {
        match self {
            GuardState::Checking => GuardView::Loading,
            GuardState::Authorized => GuardView::Render,
            GuardState::Unauthorized => GuardView::Redirect {
                to: config.login_path.clone(),
            },
            GuardState::InsufficientRole => GuardView::AccessDenied {
                actions: vec![
                    DeniedAction::SignOut,
                    DeniedAction::ReturnHome {
                        to: config.home_path.clone(),
                    },
                ],
            },
        }
    }
}

/// Identity of an in-flight role lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    pub generation: u64,
    pub user_id: String,
}

/// Result of feeding an input to the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The machine reached a state that needs no further input
    Settled(GuardState),
    /// A role lookup has to run for the ticket's user
    LookupRole(LookupTicket),
    /// The input belonged to an older generation and was ignored
    Stale,
}

#[derive(Debug, Clone)]
pub struct GuardMachine {
    required_role: Option<Role>,
    state: GuardState,
    generation: u64,
    user_id: Option<String>,
}

impl GuardMachine {
    pub fn new(required_role: Option<Role>) -> Self {
        Self {
            required_role,
            state: GuardState::Checking,
            generation: 0,
            user_id: None,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Enter `Checking` under a fresh generation
    pub fn restart(&mut self) -> u64 {
        self.generation += 1;
        self.state = GuardState::Checking;
        self.user_id = None;
        self.generation
    }

    /// Apply the outcome of a session fetch issued under `generation`
    pub fn apply_session(&mut self, generation: u64, session: Option<&Session>) -> Transition {
        if generation != self.generation {
            return Transition::Stale;
        }

        match session {
            None => {
                self.user_id = None;
                self.settle(GuardState::Unauthorized)
            }
            Some(session) => {
                self.user_id = Some(session.user_id.clone());
                match self.required_role {
                    None => self.settle(GuardState::Authorized),
                    Some(_) => {
                        self.state = GuardState::Checking;
                        Transition::LookupRole(LookupTicket {
                            generation,
                            user_id: session.user_id.clone(),
                        })
                    }
                }
            }
        }
    }

    /// Apply a session delivered by a change notification
    pub fn session_changed(&mut self, session: Option<&Session>) -> Transition {
        let generation = self.restart();
        self.apply_session(generation, session)
    }

    /// Apply the outcome of the role lookup identified by `ticket`
    pub fn apply_role(&mut self, ticket: &LookupTicket, role: Option<Role>) -> Transition {
        if ticket.generation != self.generation
            || self.state != GuardState::Checking
            || self.user_id.as_deref() != Some(ticket.user_id.as_str())
        {
            return Transition::Stale;
        }

        let granted = match (self.required_role, role) {
            (None, _) => true,
            (Some(required), Some(role)) => role.satisfies(required),
            (Some(_), None) => false,
        };

        if granted {
            self.settle(GuardState::Authorized)
        } else {
            self.settle(GuardState::InsufficientRole)
        }
    }

    fn settle(&mut self, state: GuardState) -> Transition {
        self.state = state;
        Transition::Settled(state)
    }
}

/// Guard factory for one protected surface
#[derive(Clone)]
pub struct RouteGuard {
    sessions: SessionResolver,
    roles: RoleResolver,
    config: GuardConfig,
}

impl RouteGuard {
    pub fn new(sessions: SessionResolver, roles: RoleResolver, config: GuardConfig) -> Self {
        Self {
            sessions,
            roles,
            config,
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Start guarding; must be called from within a tokio runtime
    ///
    /// The subscription is taken before the first session fetch so no change
    /// can slip in between.
    pub fn mount(&self) -> GuardHandle {
        let (state_tx, state_rx) = watch::channel(GuardState::Checking);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let driver = GuardDriver {
            machine: GuardMachine::new(self.config.required_role),
            sessions: self.sessions.clone(),
            roles: self.roles.clone(),
            subscription: Some(self.sessions.on_session_change()),
            state: state_tx,
            fetches: JoinSet::new(),
            lookups: JoinSet::new(),
        };
        let task = tokio::spawn(driver.run(shutdown_rx));

        GuardHandle {
            config: self.config.clone(),
            sessions: self.sessions.clone(),
            state: state_rx,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

struct GuardDriver {
    machine: GuardMachine,
    sessions: SessionResolver,
    roles: RoleResolver,
    subscription: Option<Subscription>,
    state: watch::Sender<GuardState>,
    fetches: JoinSet<(u64, Option<Session>)>,
    lookups: JoinSet<(LookupTicket, Option<Role>)>,
}

impl GuardDriver {
    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        self.fetch_session();

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => break,

                notification = recv(&mut self.subscription), if self.subscription.is_some() => {
                    self.on_notification(notification).await;
                }

                Some(joined) = self.fetches.join_next(), if !self.fetches.is_empty() => {
                    if let Ok((generation, session)) = joined {
                        let transition = self.machine.apply_session(generation, session.as_ref());
                        if transition != Transition::Stale {
                            self.sessions.remember(session).await;
                        }
                        self.apply(transition);
                    }
                }

                Some(joined) = self.lookups.join_next(), if !self.lookups.is_empty() => {
                    if let Ok((ticket, role)) = joined {
                        let transition = self.machine.apply_role(&ticket, role);
                        self.apply(transition);
                    }
                }
            }
        }

        debug!("Route guard unmounted");
        // Dropping `self` releases the subscription and aborts pending work.
    }

    async fn on_notification(&mut self, notification: Notification) {
        match notification {
            Notification::Changed(change) => {
                info!("Session change: {:?}", change.event);
                self.sessions.remember(change.session.clone()).await;
                let transition = self.machine.session_changed(change.session.as_ref());
                self.apply(transition);
            }
            Notification::Missed => {
                warn!("Missed session changes, re-querying the session");
                self.fetch_session();
            }
            Notification::Closed => {
                warn!("Identity provider closed the session stream");
                self.subscription = None;
                let transition = self.machine.session_changed(None);
                self.apply(transition);
            }
        }
    }

    fn fetch_session(&mut self) {
        let generation = self.machine.restart();
        self.publish(GuardState::Checking);

        let sessions = self.sessions.clone();
        self.fetches
            .spawn(async move { (generation, sessions.fetch().await) });
    }

    fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::Settled(state) => self.publish(state),
            Transition::LookupRole(ticket) => {
                self.publish(GuardState::Checking);
                let roles = self.roles.clone();
                self.lookups.spawn(async move {
                    let role = roles.get_role(&ticket.user_id).await;
                    (ticket, role)
                });
            }
            Transition::Stale => debug!("Discarding stale guard input"),
        }
    }

    fn publish(&self, state: GuardState) {
        self.state.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                info!("Route guard: {:?} -> {:?}", *current, state);
                *current = state;
                true
            }
        });
    }
}

async fn recv(subscription: &mut Option<Subscription>) -> Notification {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => Notification::Closed,
    }
}

/// A mounted guard
///
/// Dropping the handle stops the guard as well; [`GuardHandle::unmount`]
/// additionally waits for it to finish.
pub struct GuardHandle {
    config: GuardConfig,
    sessions: SessionResolver,
    state: watch::Receiver<GuardState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl GuardHandle {
    pub fn state(&self) -> GuardState {
        *self.state.borrow()
    }

    pub fn view(&self) -> GuardView {
        self.state().view(&self.config)
    }

    /// A receiver of every published state
    pub fn watch(&self) -> watch::Receiver<GuardState> {
        self.state.clone()
    }

    /// Wait until the guard leaves `Checking`
    ///
    /// A guard that stopped without settling counts as `Unauthorized`.
    pub async fn settled(&mut self) -> GuardState {
        match self
            .state
            .wait_for(|state| *state != GuardState::Checking)
            .await
        {
            Ok(state) => *state,
            Err(_) => GuardState::Unauthorized,
        }
    }

    /// Wait for the next published state
    pub async fn changed(&mut self) -> GuardState {
        match self.state.changed().await {
            Ok(()) => *self.state.borrow_and_update(),
            Err(_) => GuardState::Unauthorized,
        }
    }

    /// Sign-out action of the access-denied view
    pub async fn sign_out(&self) -> Result<(), IdentityError> {
        self.sessions.sign_out().await
    }

    /// Stop guarding and wait for the driver to wind down
    pub async fn unmount(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

impl Drop for GuardHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
