use super::{AuthResolver, Principal};
use crate::core::Result;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

/// Ability that grants every task.
pub const WILDCARD_ABILITY: &str = "*";

/// A non-model principal (API client, background worker, ...) holding a set
/// of named abilities.
#[derive(Debug, Clone)]
pub struct ServicePrincipal {
    name: String,
    abilities: HashSet<String>,
}

impl ServicePrincipal {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            abilities: HashSet::new(),
        }
    }

    /// Grants an ability (builder form)
    pub fn with_ability(mut self, ability: &str) -> Self {
        self.abilities.insert(ability.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Checks if the principal holds every ability
    #[inline]
    pub fn is_unrestricted(&self) -> bool {
        self.abilities.contains(WILDCARD_ABILITY)
    }
}

impl Principal for ServicePrincipal {
    fn can(&self, task: &str) -> bool {
        self.is_unrestricted() || self.abilities.contains(task)
    }
}

/// Holds the principal authenticated for the current unit of work.
#[derive(Default)]
pub struct AuthGuard {
    current: RwLock<Option<Arc<dyn Principal>>>,
}

impl AuthGuard {
    /// Creates a guard with nobody logged in
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login(&self, principal: Arc<dyn Principal>) -> Result<()> {
        let mut current = self.current.write()?;
        *current = Some(principal);
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        let mut current = self.current.write()?;
        *current = None;
        Ok(())
    }

    pub fn user(&self) -> Result<Option<Arc<dyn Principal>>> {
        let current = self.current.read()?;
        Ok(current.clone())
    }

    /// Whether somebody is logged in
    pub fn check(&self) -> Result<bool> {
        Ok(self.user()?.is_some())
    }
}

impl AuthResolver for AuthGuard {
    fn current_principal(&self) -> Result<Option<Arc<dyn Principal>>> {
        self.user()
    }
}
