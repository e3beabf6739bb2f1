//! Who is annotating. The editor only needs to know whether anyone is
//! signed in before it is shown.

pub trait IdentityProvider {
    fn current_user(&self) -> Option<&str>;

    fn sign_out(&mut self);

    fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }
}

/// Identity taken from settings or typed in at the sign-in screen.
#[derive(Debug, Clone, Default)]
pub struct LocalIdentity {
    user: Option<String>,
}

impl LocalIdentity {
    pub fn new(user: Option<String>) -> Self {
        let mut identity = Self::default();
        if let Some(user) = user {
            identity.sign_in(&user);
        }
        identity
    }

    /// Blank user ids are rejected.
    pub fn sign_in(&mut self, user: &str) -> bool {
        let user = user.trim();
        if user.is_empty() {
            return false;
        }
        log::info!("identity: signed in as {user}");
        self.user = Some(user.to_owned());
        true
    }
}

impl IdentityProvider for LocalIdentity {
    fn current_user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    fn sign_out(&mut self) {
        if let Some(user) = self.user.take() {
            log::info!("identity: {user} signed out");
        }
    }
}
