//! Admin console core
//!
//! Everything the site's admin surfaces and contact page decide on their own:
//! who may see a protected surface, whether a contact form may be sent, and
//! where a login attempt leads. Authentication itself is delegated to an
//! [`IdentityProvider`]; profile roles and leads live in a [`common::RowStore`].

pub mod form;
pub mod guard;
pub mod http;
pub mod identity;
pub mod leads;
pub mod login;
pub mod memory;
pub mod nav;
pub mod role;
pub mod session;
pub mod validation;

pub use form::{
    ContactForm, ContactSubmission, FieldState, FormController, LeadSink, SubmissionState,
    SubmitError, SubmitOutcome, SubmitRejected,
};
pub use guard::{
    DeniedAction, GuardConfig, GuardHandle, GuardMachine, GuardState, GuardView, RouteGuard,
};
pub use http::{HttpIdentityConfig, HttpIdentityProvider};
pub use identity::{
    AuthEvent, IdentityError, IdentityProvider, Notification, Session, SessionBroadcaster,
    SessionChange, Subscription,
};
pub use leads::{Lead, LeadFilter, LeadStatus, LeadStore};
pub use login::{LoginController, LoginOutcome};
pub use memory::InMemoryIdentityProvider;
pub use nav::AdminSection;
pub use role::{Role, RoleResolver};
pub use session::SessionResolver;
pub use validation::{BusinessType, Field, ValidationError, ValidationErrorKind, validate_field};
