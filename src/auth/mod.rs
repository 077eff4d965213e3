// ============================================================================
// Ownership Authorization
// ============================================================================
//
// A principal acting on a model is either a model itself (a user record) or
// an opaque identity that answers capability checks.
//
// - Same model type: allowed iff both identity keys are equal.
// - Other model type: allowed iff the target's owner key equals the
//   principal's identity key.
// - Non-model principal: allowed iff a task is named and the principal can
//   perform it.
//
// ============================================================================

pub mod guard;

pub use guard::{AuthGuard, ServicePrincipal, WILDCARD_ABILITY};

use crate::core::{ModelError, Result, Value};
use crate::model::{Model, Record};
use log::warn;
use std::sync::Arc;

/// An authenticated identity.
pub trait Principal: Send + Sync {
    /// The principal's own record, when it is a model.
    fn as_model(&self) -> Option<&dyn Model> {
        None
    }

    /// Capability check for non-model principals.
    fn can(&self, task: &str) -> bool {
        let _ = task;
        false
    }
}

impl Principal for Record {
    fn as_model(&self) -> Option<&dyn Model> {
        Some(self)
    }
}

/// Resolves the currently authenticated principal.
pub trait AuthResolver: Send + Sync {
    fn current_principal(&self) -> Result<Option<Arc<dyn Principal>>>;
}

/// Pure ownership/capability predicate for an already resolved principal.
pub fn principal_can_perform_task_on(
    model: &dyn Model,
    task: Option<&str>,
    principal: &dyn Principal,
) -> bool {
    match principal.as_model() {
        Some(user) if user.model_type() == model.model_type() => {
            keys_match(&user.key(), &model.key())
        }
        Some(user) => match model.owner_key() {
            Some(owner) => keys_match(&user.key(), &owner),
            None => false,
        },
        None => match task {
            Some(task) if !task.is_empty() => principal.can(task),
            _ => false,
        },
    }
}

fn keys_match(left: &Value, right: &Value) -> bool {
    !left.is_null() && !right.is_null() && left == right
}

/// Authorization checks against the current principal of an `AuthResolver`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use model_concerns::auth::{AuthGuard, Authorizer};
/// use model_concerns::model::Record;
///
/// let guard = Arc::new(AuthGuard::new());
/// guard.login(Arc::new(Record::new("users").with("id", 7))).unwrap();
///
/// let authorizer = Authorizer::new(guard);
/// let post = Record::new("posts").with("id", 1).with("user_id", 7);
/// assert!(authorizer.user_can_perform_task_on(&post, Some("update"), None));
/// ```
#[derive(Clone)]
pub struct Authorizer {
    resolver: Arc<dyn AuthResolver>,
}

impl Authorizer {
    pub fn new(resolver: Arc<dyn AuthResolver>) -> Self {
        Self { resolver }
    }

    /// Whether `user` (or the current principal when `None`) may perform
    /// `task` on `model`. A request without any principal is never allowed.
    ///
    /// A resolver failure is logged and denies the request.
    pub fn user_can_perform_task_on(
        &self,
        model: &dyn Model,
        task: Option<&str>,
        user: Option<&dyn Principal>,
    ) -> bool {
        self.evaluate(model, task, user).unwrap_or_else(|err| {
            warn!("Cannot resolve principal for {}: {}", describe(model), err);
            false
        })
    }

    /// Like [`Self::user_can_perform_task_on`], failing with
    /// `ModelError::AuthorizationError` when the check does not hold.
    pub fn authorize_user_to_perform_task_on(
        &self,
        model: &dyn Model,
        task: Option<&str>,
        user: Option<&dyn Principal>,
    ) -> Result<()> {
        if self.evaluate(model, task, user)? {
            return Ok(());
        }
        Err(ModelError::AuthorizationError {
            task: task.unwrap_or_default().to_string(),
            model: describe(model),
        })
    }

    fn evaluate(
        &self,
        model: &dyn Model,
        task: Option<&str>,
        user: Option<&dyn Principal>,
    ) -> Result<bool> {
        if let Some(user) = user {
            return Ok(principal_can_perform_task_on(model, task, user));
        }
        Ok(match self.resolver.current_principal()? {
            Some(current) => principal_can_perform_task_on(model, task, current.as_ref()),
            None => false,
        })
    }
}

fn describe(model: &dyn Model) -> String {
    let key = model.key();
    if key.is_null() {
        model.model_type().to_string()
    } else {
        format!("{} #{}", model.model_type(), key)
    }
}
